//! 警告写入服务 - 业务能力层
//!
//! 只负责把"需要人工复查的练习"追加到日志文件，不关心流程

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::services::verifier::VerificationReport;

/// 警告写入服务
///
/// 职责：
/// - 将生成失败或校验未通过的练习写入日志文件
/// - 只处理单个练习
/// - 不关心流程顺序
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 记录一个生成失败的练习
    pub async fn write_failure(&self, key: &str, error: &str) -> Result<()> {
        self.append(format!("❌ 练习 {} | 生成失败: {}\n", key, error))
            .await
    }

    /// 记录一个校验未通过的练习，逐条列出问题
    ///
    /// # 参数
    /// - `key`: 练习键名
    /// - `report`: 合并后的校验报告
    pub async fn write_report(&self, key: &str, report: &VerificationReport) -> Result<()> {
        let mut msg = format!(
            "⚠️ 练习 {} | 置信度 {:.0}% | {} 个错误, {} 个警告\n",
            key,
            report.confidence * 100.0,
            report.errors.len(),
            report.warnings.len()
        );
        for issue in report.errors.iter().chain(&report.warnings) {
            msg.push_str(&format!("    - [{:?}] {}", issue.source, issue.message));
            if !issue.location.is_empty() {
                msg.push_str(&format!(" ({})", issue.location));
            }
            msg.push('\n');
        }
        self.append(msg).await
    }

    async fn append(&self, msg: String) -> Result<()> {
        debug!("写入警告: {}", msg.lines().next().unwrap_or_default());

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .with_context(|| format!("无法打开日志文件: {}", self.warn_file_path))?;

        file.write_all(msg.as_bytes()).await?;
        Ok(())
    }
}
