use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Finding, FindingKind};

/// `$a op b = c$`：a、b 为非负整数，c 可为负，允许 `\times`、`\cdot`、`\div`
static CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\s*(\d+)\s*([+\-*/]|\\times|\\cdot|\\div)\s*(\d+)\s*=\s*(-?\d+)\s*\$",
    )
    .expect("arithmetic claim pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" | "\\times" | "\\cdot" => Some(Operator::Mul),
            "/" | "\\div" => Some(Operator::Div),
            _ => None,
        }
    }
}

/// 从文本中提取出的一条算式陈述，只在一次审查中短暂存在
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticClaim {
    pub lhs: i64,
    pub op: Operator,
    pub rhs: i64,
    pub asserted: i64,
}

impl ArithmeticClaim {
    /// 核对陈述，正确时返回 `None`
    ///
    /// 运算在 `i128` 上精确进行。除法是真除法、不截断：
    /// `a / b = c` 成立当且仅当 `b * c == a`，否则期望值为 `a / b` 的浮点结果，
    /// 因此 `7 / 2 = 3` 会被标记（期望 3.5）。除数为 0 时不求值。
    pub fn check(&self) -> Option<FindingKind> {
        let (a, b, c) = (self.lhs as i128, self.rhs as i128, self.asserted as i128);
        let actual = self.asserted as f64;
        let expected = match self.op {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => {
                if b == 0 {
                    return Some(FindingKind::DivisionByZero);
                }
                if b * c == a {
                    return None;
                }
                return Some(FindingKind::Mismatch {
                    expected: a as f64 / b as f64,
                    actual,
                });
            }
        };
        (expected != c).then(|| FindingKind::Mismatch {
            expected: expected as f64,
            actual,
        })
    }
}

/// 提取文本中所有可完整解析的算式陈述，连同原文片段
///
/// 数字超出 `i64` 范围的算式直接忽略
pub fn extract_claims(text: &str) -> Vec<(String, ArithmeticClaim)> {
    CLAIM
        .captures_iter(text)
        .filter_map(|caps| {
            let claim = ArithmeticClaim {
                lhs: caps[1].parse().ok()?,
                op: Operator::parse(&caps[2])?,
                rhs: caps[3].parse().ok()?,
                asserted: caps[4].parse().ok()?,
            };
            Some((caps[0].to_string(), claim))
        })
        .collect()
}

pub(crate) fn audit_arithmetic(text: &str) -> Vec<Finding> {
    extract_claims(text)
        .into_iter()
        .filter_map(|(claim, parsed)| parsed.check().map(|kind| Finding { claim, kind }))
        .collect()
}
