//! 大纲片段树
//!
//! 二级子列表只能挂在一级题目下面，这一点由类型本身保证；
//! 重建完成后得到的树中不存在"未关闭"的列表。

use serde::{Deserialize, Serialize};

/// 一级题目（编号 `1.`、`2.`…）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 第一行为题目正文，其余为续行
    pub lines: Vec<String>,
    /// 二级列表；为空表示从未打开
    pub sub_questions: Vec<SubQuestion>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            sub_questions: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }
}

/// 二级小问（`a)`、`(ii)`…）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub lines: Vec<String>,
}

impl SubQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
        }
    }

    pub fn text(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutlineNode {
    /// 加粗的独立标题
    Title(String),
    Paragraph(String),
    /// 一个已关闭的一级列表
    Questions(Vec<Question>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineFragment {
    pub nodes: Vec<OutlineNode>,
}

impl OutlineFragment {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.nodes.iter().flat_map(|node| match node {
            OutlineNode::Questions(qs) => qs.iter(),
            _ => [].iter(),
        })
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    /// 展平为文本行，编号从 1 重新开始
    ///
    /// 对结构良好的树，`reconstruct(to_lines())` 会得到等价的树
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for node in &self.nodes {
            match node {
                OutlineNode::Title(text) | OutlineNode::Paragraph(text) => out.push(text.clone()),
                OutlineNode::Questions(questions) => {
                    for (i, question) in questions.iter().enumerate() {
                        push_item(&mut out, &format!("{}.", i + 1), &question.lines);
                        for (j, sub) in question.sub_questions.iter().enumerate() {
                            push_item(&mut out, &format!("{})", sub_label(j + 1)), &sub.lines);
                        }
                    }
                }
            }
        }
        out
    }
}

fn push_item(out: &mut Vec<String>, marker: &str, lines: &[String]) {
    let first = lines.first().map(String::as_str).unwrap_or_default();
    if first.is_empty() {
        out.push(marker.to_string());
    } else {
        out.push(format!("{} {}", marker, first));
    }
    out.extend(lines.iter().skip(1).cloned());
}

/// 小问标签：a–z，超过 26 个后使用小写罗马数字
fn sub_label(n: usize) -> String {
    if n <= 26 {
        char::from(b'a' + (n - 1) as u8).to_string()
    } else {
        to_roman(n)
    }
}

fn to_roman(mut n: usize) -> String {
    const TABLE: [(usize, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}
