//! 函数值检查
//!
//! 文本中恰好有一个 `$f(x) = ...$` 定义（`f(x)` 位于公式开头）且能完整解析为
//! 整系数多项式时，才核对 `$f(k) = v$` 形式的陈述。其余情况一律跳过。

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Finding, FindingKind};

static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*f\(x\)\s*=\s*([^$]+)\$").expect("function definition pattern")
});

static VALUE_CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*f\(\s*(-?\d+)\s*\)\s*=\s*(-?\d+)\s*\$").expect("function value pattern")
});

const MAX_EXPONENT: u32 = 64;
/// 定义式的最大长度（字节），同时限制了表达式树的深度
const MAX_SOURCE_LEN: usize = 256;
/// 解析器的最大递归深度
const MAX_DEPTH: usize = 64;

/// 关于 `x` 的整系数多项式表达式
#[derive(Debug, Clone, PartialEq)]
pub enum Polynomial {
    Const(i128),
    X,
    Neg(Box<Polynomial>),
    Add(Box<Polynomial>, Box<Polynomial>),
    Sub(Box<Polynomial>, Box<Polynomial>),
    Mul(Box<Polynomial>, Box<Polynomial>),
    Pow(Box<Polynomial>, u32),
}

impl Polynomial {
    /// 解析 `x^2 - 4x + 3` 这类写法，支持隐式乘法、括号、`\cdot`、`\times` 和 `x^{2}`
    ///
    /// 任何无法识别的记号、过长的输入或过深的嵌套都返回 `None`
    pub fn parse(source: &str) -> Option<Self> {
        if source.len() > MAX_SOURCE_LEN {
            return None;
        }
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.expr()?;
        (parser.pos == parser.tokens.len()).then_some(expr)
    }

    /// 精确求值，溢出时返回 `None`
    pub fn eval(&self, x: i128) -> Option<i128> {
        match self {
            Polynomial::Const(c) => Some(*c),
            Polynomial::X => Some(x),
            Polynomial::Neg(inner) => inner.eval(x)?.checked_neg(),
            Polynomial::Add(a, b) => a.eval(x)?.checked_add(b.eval(x)?),
            Polynomial::Sub(a, b) => a.eval(x)?.checked_sub(b.eval(x)?),
            Polynomial::Mul(a, b) => a.eval(x)?.checked_mul(b.eval(x)?),
            Polynomial::Pow(base, exp) => base.eval(x)?.checked_pow(*exp),
        }
    }

    fn contains_x(&self) -> bool {
        match self {
            Polynomial::Const(_) => false,
            Polynomial::X => true,
            Polynomial::Neg(inner) | Polynomial::Pow(inner, _) => inner.contains_x(),
            Polynomial::Add(a, b) | Polynomial::Sub(a, b) | Polynomial::Mul(a, b) => {
                a.contains_x() || b.contains_x()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Num(i128),
    X,
    Plus,
    Minus,
    Star,
    Caret,
    Open,
    Close,
}

fn tokenize(source: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source.trim();
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if let Some(after) = rest
            .strip_prefix("\\cdot")
            .or_else(|| rest.strip_prefix("\\times"))
        {
            tokens.push(Token::Star);
            rest = after;
            continue;
        }
        if c.is_ascii_digit() {
            let end = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            tokens.push(Token::Num(rest[..end].parse().ok()?));
            rest = &rest[end..];
            continue;
        }
        let token = match c {
            'x' => Token::X,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '^' => Token::Caret,
            '(' | '{' => Token::Open,
            ')' | '}' => Token::Close,
            _ => return None,
        };
        tokens.push(token);
        rest = &rest[1..];
    }
    Some(tokens)
}

/// 递归下降：
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := unary (['*'] unary)*
/// unary  := ('+' | '-') unary | power
/// power  := atom ['^' exponent]
/// atom   := NUM | 'x' | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Option<Polynomial> {
        let mut lhs = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = Box::new(self.term()?);
            lhs = match op {
                Token::Plus => Polynomial::Add(Box::new(lhs), rhs),
                _ => Polynomial::Sub(Box::new(lhs), rhs),
            };
        }
        Some(lhs)
    }

    fn term(&mut self) -> Option<Polynomial> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => self.pos += 1,
                // 隐式乘法：4x、2(x+1)、x(x-1)
                Some(Token::Num(_) | Token::X | Token::Open) => {}
                _ => break,
            }
            lhs = Polynomial::Mul(Box::new(lhs), Box::new(self.unary()?));
        }
        Some(lhs)
    }

    /// 所有递归都经过这里，超过 `MAX_DEPTH` 即放弃
    fn unary(&mut self) -> Option<Polynomial> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    fn signed(&mut self) -> Option<Polynomial> {
        match self.peek()? {
            Token::Minus => {
                self.pos += 1;
                Some(Polynomial::Neg(Box::new(self.unary()?)))
            }
            Token::Plus => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Option<Polynomial> {
        let base = self.atom()?;
        if self.peek() != Some(Token::Caret) {
            return Some(base);
        }
        self.pos += 1;
        let exponent = self.exponent()?;
        Some(Polynomial::Pow(Box::new(base), exponent))
    }

    /// 指数只接受非负整数常量，`x^{2}` 的花括号按括号处理
    fn exponent(&mut self) -> Option<u32> {
        let value = match self.bump()? {
            Token::Num(n) => n,
            Token::Open => {
                let inner = self.expr()?;
                if self.bump()? != Token::Close || inner.contains_x() {
                    return None;
                }
                inner.eval(0)?
            }
            _ => return None,
        };
        u32::try_from(value).ok().filter(|e| *e <= MAX_EXPONENT)
    }

    fn atom(&mut self) -> Option<Polynomial> {
        match self.bump()? {
            Token::Num(n) => Some(Polynomial::Const(n)),
            Token::X => Some(Polynomial::X),
            Token::Open => {
                let inner = self.expr()?;
                (self.bump()? == Token::Close).then_some(inner)
            }
            _ => None,
        }
    }
}

/// 找出唯一的函数定义
///
/// 不含 `x` 的右侧（如 `f(x) = 0`）视为方程而非定义。
/// 出现两个不同定义时无法判断指的是哪个，返回 `None`。
fn unique_definition(text: &str) -> Option<Polynomial> {
    let mut found: Option<(String, Polynomial)> = None;
    for caps in DEFINITION.captures_iter(text) {
        let source = caps[1].trim();
        let Some(poly) = Polynomial::parse(source) else {
            if source.contains('x') {
                return None;
            }
            continue;
        };
        if !poly.contains_x() {
            continue;
        }
        match &found {
            Some((seen, _)) if seen != source => return None,
            Some(_) => {}
            None => found = Some((source.to_string(), poly)),
        }
    }
    found.map(|(_, poly)| poly)
}

pub(crate) fn audit_function_values(text: &str) -> Vec<Finding> {
    if !VALUE_CLAIM.is_match(text) {
        return Vec::new();
    }
    let Some(poly) = unique_definition(text) else {
        return Vec::new();
    };

    VALUE_CLAIM
        .captures_iter(text)
        .filter_map(|caps| {
            let argument: i64 = caps[1].parse().ok()?;
            let asserted: i64 = caps[2].parse().ok()?;
            let expected = poly.eval(argument as i128)?;
            (expected != asserted as i128).then(|| Finding {
                claim: caps[0].to_string(),
                kind: FindingKind::FunctionValue {
                    argument,
                    expected: expected as f64,
                    actual: asserted as f64,
                },
            })
        })
        .collect()
}
