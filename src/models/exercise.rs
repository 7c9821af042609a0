//! 练习块数据模型

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// 练习键名
///
/// 在一次切分中唯一，由标题行和序号确定性推导，下游存储以它为路径
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ExerciseKey(String);

impl ExerciseKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 作为存储目录/文件名使用的形式
    ///
    /// 只保留字母、数字、`_` 和 `-`，其余字符（空格、`/`、`\`、`.` 等）都替换为 `_`，
    /// 因此结果总是单个路径分量，不会以 `.` 开头
    pub fn storage_name(&self) -> String {
        self.0
            .trim()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for ExerciseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExerciseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 一个练习块：从起始行到下一个章节之前的连续行
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExerciseBlock {
    pub key: ExerciseKey,
    /// 起始行在原文档中的下标
    pub start: usize,
    pub lines: Vec<String>,
}

impl ExerciseBlock {
    /// 标题行（块的第一行）
    pub fn title(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    /// 最后一行的下标（含）
    pub fn end(&self) -> usize {
        self.start + self.lines.len().saturating_sub(1)
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// 一次切分的结果：按起始行升序排列的练习块
///
/// 序列化为 `{ key: [lines...] }` 形式的 JSON 对象，保持顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseSet {
    blocks: Vec<ExerciseBlock>,
}

impl ExerciseSet {
    pub(crate) fn from_blocks(blocks: Vec<ExerciseBlock>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ExerciseBlock> {
        self.blocks.iter().find(|b| b.key.as_str() == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ExerciseKey> {
        self.blocks.iter().map(|b| &b.key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExerciseBlock> {
        self.blocks.iter()
    }

    pub fn blocks(&self) -> &[ExerciseBlock] {
        &self.blocks
    }

    /// 文档结构：每个块的标题行
    pub fn structure(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.title().to_string()).collect()
    }
}

impl IntoIterator for ExerciseSet {
    type Item = ExerciseBlock;
    type IntoIter = std::vec::IntoIter<ExerciseBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExerciseSet {
    type Item = &'a ExerciseBlock;
    type IntoIter = std::slice::Iter<'a, ExerciseBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl Serialize for ExerciseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.blocks.len()))?;
        for block in &self.blocks {
            map.serialize_entry(block.key.as_str(), &block.lines)?;
        }
        map.end()
    }
}
