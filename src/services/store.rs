//! 练习存储能力
//!
//! 每个练习块写入 `<root>/<key>/<key>_<YYYYmmdd_HHMMSS>.json`
//! （key 中字母、数字、`_`、`-` 以外的字符都换为 `_`，路径不会越出 root），
//! 文档结构写入 `<root>/structure/structure_<YYYYmmdd_HHMMSS>.json`。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use tracing::debug;

use crate::error::AppError;
use crate::models::{ExerciseBlock, ExerciseKey};

const STRUCTURE_FOLDER: &str = "structure";

#[async_trait]
pub trait ExerciseStore: Send + Sync {
    /// 保存一个练习块的内容行，返回写入位置
    async fn save_block(&self, block: &ExerciseBlock) -> Result<PathBuf>;

    /// 保存文档结构（各块的标题行）
    async fn save_structure(&self, structure: &[String]) -> Result<PathBuf>;
}

/// 本地文件系统存储
pub struct FsExerciseStore {
    root: PathBuf,
}

impl FsExerciseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 读取某个 key 最近一次保存的内容
    pub async fn load_latest(&self, key: &ExerciseKey) -> Result<Option<Vec<String>>> {
        let folder = self.root.join(key.storage_name());
        if !tokio::fs::try_exists(&folder).await.unwrap_or(false) {
            return Ok(None);
        }

        let mut latest: Option<PathBuf> = None;
        let mut entries = tokio::fs::read_dir(&folder)
            .await
            .with_context(|| format!("无法读取目录: {}", folder.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && latest.as_ref().map_or(true, |current| path > *current)
            {
                latest = Some(path);
            }
        }

        let Some(path) = latest else {
            return Ok(None);
        };
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let lines = serde_json::from_str(&content)
            .with_context(|| format!("无法解析 JSON: {}", path.display()))?;
        Ok(Some(lines))
    }

    async fn write_json(&self, folder: &str, stem: &str, json: String) -> Result<PathBuf> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("无法创建目录: {}", dir.display()))?;

        let path = unused_path(&dir, stem, &timestamp()).await;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        debug!("已保存: {}", path.display());
        Ok(path)
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// 同一秒内重复保存时追加序号，避免覆盖
async fn unused_path(dir: &Path, stem: &str, stamp: &str) -> PathBuf {
    let mut path = dir.join(format!("{}_{}.json", stem, stamp));
    let mut n = 1;
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        path = dir.join(format!("{}_{}_{}.json", stem, stamp, n));
        n += 1;
    }
    path
}

#[async_trait]
impl ExerciseStore for FsExerciseStore {
    async fn save_block(&self, block: &ExerciseBlock) -> Result<PathBuf> {
        let name = block.key.storage_name();
        let json = serde_json::to_string_pretty(&block.lines)?;
        self.write_json(&name, &name, json).await
    }

    async fn save_structure(&self, structure: &[String]) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(structure)?;
        self.write_json(STRUCTURE_FOLDER, STRUCTURE_FOLDER, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::partition;

    #[tokio::test]
    async fn test_save_block_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsExerciseStore::new(dir.path());
        let set = partition(&["Exercice 1", "Soit $x$.", "1. a"], &[0]);
        let block = &set.blocks()[0];

        let path = store.save_block(block).await.unwrap();
        assert_eq!(path.parent().unwrap(), dir.path().join("exercice_1"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("exercice_1_"), "{}", name);
        assert!(name.ends_with(".json"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<String> = serde_json::from_str(&content).unwrap();
        assert_eq!(lines, block.lines);
        // pretty JSON
        assert!(content.contains("\n  \"Exercice 1\""));
    }

    #[tokio::test]
    async fn test_repeated_saves_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsExerciseStore::new(dir.path());
        let set = partition(&["Exercice 1"], &[0]);
        let first = store.save_block(&set.blocks()[0]).await.unwrap();
        let second = store.save_block(&set.blocks()[0]).await.unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }

    #[tokio::test]
    async fn test_load_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsExerciseStore::new(dir.path());
        let set = partition(&["Partie A", "x", "Partie B", "y"], &[0, 2]);

        assert_eq!(store.load_latest(&set.blocks()[0].key).await.unwrap(), None);
        store.save_block(&set.blocks()[0]).await.unwrap();
        assert_eq!(
            store.load_latest(&set.blocks()[0].key).await.unwrap(),
            Some(vec!["Partie A".to_string(), "x".to_string()])
        );
    }

    #[tokio::test]
    async fn test_path_like_titles_stay_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let store = FsExerciseStore::new(&root);

        let absolute = format!("{}/escaped x", dir.path().display());
        let titles = [absolute.as_str(), "../../dehors y", "..\\..\\dehors z"];
        let set = partition(&titles, &[0, 1, 2]);
        for block in &set {
            let path = store.save_block(block).await.unwrap();
            assert!(path.starts_with(&root), "{}", path.display());
            assert_eq!(
                store.load_latest(&block.key).await.unwrap(),
                Some(block.lines.clone())
            );
        }
    }

    #[tokio::test]
    async fn test_save_structure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsExerciseStore::new(dir.path());
        let path = store
            .save_structure(&["Exercice 1".to_string(), "Partie A".to_string()])
            .await
            .unwrap();
        assert!(path.starts_with(dir.path().join("structure")));
        let stored: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(stored, vec!["Exercice 1", "Partie A"]);
    }
}
