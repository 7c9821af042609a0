use std::sync::LazyLock;

use regex::Regex;

use crate::config::MarkerVocabulary;
use crate::outline::machine::OutlineState;

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").expect("numbered marker pattern"));

static LETTERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\(?([a-z]|[ivxlcdm]+)\)\s*(.*)$").expect("lettered marker pattern")
});

static TITLE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#]+").expect("title noise pattern"));

/// 单行的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// 空行或注释，不产生输出
    Skip,
    /// 独立标题（已去掉 `*`、`#`）
    Title(String),
    /// 一级题目，携带编号后的正文
    Numbered(String),
    /// 二级小问，携带标签后的正文
    Lettered(String),
    /// 普通文本
    Text(String),
}

type MatchFn = fn(&MarkerMatchers, &str, OutlineState) -> Option<LineKind>;

/// 按固定优先级排列的命名匹配器
///
/// 顺序：skip → title → numbered → lettered → text。
/// 一行同时满足数字和字母编号时按数字处理。
pub struct MarkerMatchers {
    vocabulary: MarkerVocabulary,
    ordered: [(&'static str, MatchFn); 5],
}

impl MarkerMatchers {
    pub fn new(vocabulary: &MarkerVocabulary) -> Self {
        let vocabulary = MarkerVocabulary {
            title_keywords: vocabulary
                .title_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            section_keywords: vocabulary.section_keywords.clone(),
            comment_prefixes: vocabulary
                .comment_prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
        };
        Self {
            vocabulary,
            ordered: [
                ("skip", match_skip),
                ("title", match_title),
                ("numbered", match_numbered),
                ("lettered", match_lettered),
                ("text", match_text),
            ],
        }
    }

    /// 按优先级尝试每个匹配器，返回第一个命中的名称和结果
    ///
    /// `line` 应已去除首尾空白
    pub fn classify(&self, line: &str, state: OutlineState) -> (&'static str, LineKind) {
        for (name, matcher) in &self.ordered {
            if let Some(kind) = matcher(self, line, state) {
                return (name, kind);
            }
        }
        ("text", LineKind::Text(line.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ordered.iter().map(|(name, _)| *name)
    }
}

fn match_skip(m: &MarkerMatchers, line: &str, _: OutlineState) -> Option<LineKind> {
    let is_comment = m
        .vocabulary
        .comment_prefixes
        .iter()
        .any(|p| line.starts_with(p.as_str()));
    (line.is_empty() || is_comment).then_some(LineKind::Skip)
}

fn match_title(m: &MarkerMatchers, line: &str, state: OutlineState) -> Option<LineKind> {
    if state.in_level1() {
        return None;
    }
    let lower = line.to_lowercase();
    m.vocabulary
        .title_keywords
        .iter()
        .any(|k| lower.starts_with(k.as_str()))
        .then(|| LineKind::Title(TITLE_NOISE.replace_all(line, "").trim().to_string()))
}

fn match_numbered(_: &MarkerMatchers, line: &str, _: OutlineState) -> Option<LineKind> {
    NUMBERED
        .captures(line)
        .map(|caps| LineKind::Numbered(caps[2].trim().to_string()))
}

fn match_lettered(_: &MarkerMatchers, line: &str, state: OutlineState) -> Option<LineKind> {
    if !state.in_level1() {
        return None;
    }
    LETTERED
        .captures(line)
        .map(|caps| LineKind::Lettered(caps[2].trim().to_string()))
}

fn match_text(_: &MarkerMatchers, line: &str, _: OutlineState) -> Option<LineKind> {
    Some(LineKind::Text(line.to_string()))
}
