use std::collections::HashSet;
use std::num::NonZeroUsize;

use tracing::debug;

use crate::extraction::key::key_for;
use crate::models::{ExerciseBlock, ExerciseKey, ExerciseSet};

/// 规范化候选下标：去掉越界值（`< 0` 或 `>= line_count`），去重并升序排列
pub fn normalize_indices(indices: &[i64], line_count: usize) -> Vec<usize> {
    let mut normalized: Vec<usize> = indices
        .iter()
        .filter_map(|&i| usize::try_from(i).ok())
        .filter(|&i| i < line_count)
        .collect();
    normalized.sort_unstable();
    normalized.dedup();
    normalized
}

/// 按章节起始下标切分行序列
///
/// 第 `i` 块覆盖 `[idx[i], idx[i+1]-1]`，最后一块覆盖到文档末尾；
/// 第一个起始下标之前的行被丢弃。下标集合为空时返回空结果。
///
/// 键名冲突时追加序号（`{键名} {序号}`）。
pub fn partition<S: AsRef<str>>(lines: &[S], indices: &[i64]) -> ExerciseSet {
    let starts = normalize_indices(indices, lines.len());
    if starts.len() != indices.len() {
        debug!(
            "章节下标规范化: 输入 {} 个，保留 {} 个",
            indices.len(),
            starts.len()
        );
    }

    let mut used: HashSet<ExerciseKey> = HashSet::with_capacity(starts.len());
    let mut blocks = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = match starts.get(i + 1) {
            Some(&next) => next.saturating_sub(1),
            None => lines.len() - 1,
        }
        .max(start);

        let ordinal = NonZeroUsize::MIN.saturating_add(i);
        let key = unique_key(key_for(lines[start].as_ref(), ordinal), ordinal, &used);
        used.insert(key.clone());

        blocks.push(ExerciseBlock {
            key,
            start,
            lines: lines[start..=end]
                .iter()
                .map(|l| l.as_ref().to_string())
                .collect(),
        });
    }

    debug!("切分完成: {} 个练习块", blocks.len());
    ExerciseSet::from_blocks(blocks)
}

/// 推导出的键名恰好两个单词，追加本块序号后的三词形式在同一次切分中不会再冲突
fn unique_key(key: ExerciseKey, ordinal: NonZeroUsize, used: &HashSet<ExerciseKey>) -> ExerciseKey {
    if used.contains(&key) {
        ExerciseKey::new(format!("{} {}", key, ordinal))
    } else {
        key
    }
}
