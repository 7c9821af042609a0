use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::config::Config;
use crate::error::FileError;

/// 剔除规则
#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    /// 需要剔除的标记（如 `---SECTION---`）
    pub markers: Vec<String>,
    /// true: 行中包含标记即剔除；false: 去空白后与标记完全相等才剔除
    pub partial: bool,
    pub ignore_case: bool,
}

impl LineFilter {
    pub fn exact(markers: &[String]) -> Self {
        Self {
            markers: markers.to_vec(),
            partial: false,
            ignore_case: false,
        }
    }

    /// 按配置的标记与匹配方式构造
    pub fn from_config(config: &Config) -> Self {
        Self {
            partial: config.exclude_partial_match,
            ignore_case: config.exclude_ignore_case,
            ..Self::exact(&config.excluded_line_markers)
        }
    }

    fn excludes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.markers.iter().any(|marker| {
            let (candidate, marker) = if self.ignore_case {
                (trimmed.to_lowercase(), marker.to_lowercase())
            } else {
                (trimmed.to_string(), marker.clone())
            };
            if self.partial {
                candidate.contains(&marker)
            } else {
                candidate == marker
            }
        })
    }

    /// 按规则过滤文本，保留原始行（不去空白）
    pub fn apply(&self, content: &str) -> Vec<String> {
        content
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !self.excludes(line))
            .map(str::to_string)
            .collect()
    }
}

/// 将字节解码为文本：先尝试 UTF-8，失败则按 Latin-1 逐字节映射
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!("UTF-8 解码失败，改用 Latin-1: {}", err);
            err.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

/// 读取文本文件并返回过滤后的行序列
pub async fn load_lines(path: &Path, filter: &LineFilter) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    if !path.is_file() {
        return Err(FileError::NotAFile {
            path: path.display().to_string(),
        }
        .into());
    }

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let lines = filter.apply(&decode_text(bytes));
    tracing::info!(
        "已读取 {}: {} 行",
        path.file_name().unwrap_or_default().to_string_lossy(),
        lines.len()
    );

    Ok(lines)
}
