//! 练习处理流程 - 流程层
//!
//! 核心职责：定义"一个练习"的完整处理流程
//!
//! 流程顺序：
//! 1. 生成新练习
//! 2. 算式审查 → 有错误时定点修正一次
//! 3. 大纲重建
//! 4. 语义校验 → 合并报告
//! 5. 未通过时写入警告日志（兜底）

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::audit::audit;
use crate::config::Config;
use crate::models::{ExerciseBlock, ExerciseKey, Finding, OutlineFragment};
use crate::outline::OutlineReconstructor;
use crate::services::{
    ExerciseGenerator, Generated, LevelIndication, MathVerifier, TokenUsage, VerificationReport,
    WarnWriter,
};
use crate::utils::truncate_text;
use crate::workflow::exercise_ctx::ExerciseCtx;

/// 练习处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessResult {
    /// 生成并通过校验
    Generated,
    /// 已生成，但需要人工复查
    Flagged,
    /// 生成失败
    Failed,
}

/// 一个练习的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseOutcome {
    pub key: ExerciseKey,
    pub original: Vec<String>,
    pub generated: Option<Vec<String>>,
    pub outline: Option<OutlineFragment>,
    /// 最终文本的算式审查结果
    pub findings: Vec<Finding>,
    pub report: Option<VerificationReport>,
    /// 是否经过了定点修正
    pub corrected: bool,
    pub usage: Option<TokenUsage>,
    pub error: Option<String>,
}

impl ExerciseOutcome {
    pub(crate) fn failed(block: &ExerciseBlock, error: String) -> Self {
        Self {
            key: block.key.clone(),
            original: block.lines.clone(),
            generated: None,
            outline: None,
            findings: Vec::new(),
            report: None,
            corrected: false,
            usage: None,
            error: Some(error),
        }
    }

    pub fn status(&self) -> ProcessResult {
        match (&self.generated, &self.report) {
            (None, _) => ProcessResult::Failed,
            (Some(_), Some(report)) if report.is_valid => ProcessResult::Generated,
            (Some(_), _) => ProcessResult::Flagged,
        }
    }
}

/// 练习处理流程
///
/// - 编排单个练习的处理流程
/// - 决定何时修正、何时兜底
/// - 只依赖业务能力（services）
/// - 任何一步失败都记录在结果中，不中断整个文档
pub struct ExerciseFlow {
    generator: Arc<dyn ExerciseGenerator>,
    verifier: Arc<dyn MathVerifier>,
    warn_writer: WarnWriter,
    reconstructor: OutlineReconstructor,
    level: LevelIndication,
    verbose_logging: bool,
}

impl ExerciseFlow {
    /// 创建新的练习处理流程
    pub fn new(
        config: &Config,
        generator: Arc<dyn ExerciseGenerator>,
        verifier: Arc<dyn MathVerifier>,
    ) -> Self {
        Self {
            generator,
            verifier,
            warn_writer: WarnWriter::with_path(&config.output_log_file),
            reconstructor: OutlineReconstructor::new(&config.markers),
            level: LevelIndication::from_config(config),
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, block: &ExerciseBlock, ctx: &ExerciseCtx) -> ExerciseOutcome {
        // ========== 1. 生成 ==========
        info!("{} 🎨 正在生成新练习...", ctx);
        let generated = match self.generator.generate(block, &self.level).await {
            Ok(generated) => generated,
            Err(e) => {
                let message = format!("{:#}", e);
                error!("{} ❌ 生成失败: {}", ctx, message);
                if let Err(e) = self.warn_writer.write_failure(&ctx.key, &message).await {
                    warn!("{} 写入警告日志失败: {}", ctx, e);
                }
                return ExerciseOutcome::failed(block, message);
            }
        };
        info!("{} ✓ 生成 {} 行", ctx, generated.lines.len());
        if self.verbose_logging {
            info!("{} 预览: {}", ctx, truncate_text(&generated.text(), 120));
        }

        // ========== 2. 算式审查与修正 ==========
        let (generated, findings, corrected) = self.audit_and_correct(generated, ctx).await;

        // ========== 3. 大纲重建 ==========
        let outline = self.reconstructor.reconstruct(&generated.lines);
        info!(
            "{} ✓ 大纲重建完成: {} 个节点, {} 道题",
            ctx,
            outline.nodes.len(),
            outline.question_count()
        );

        // ========== 4. 语义校验 ==========
        let review = self
            .verifier
            .verify(&generated.text(), &self.level.level, &self.level.subject)
            .await;
        if let Err(e) = &review {
            warn!("{} ⚠️ 语义校验失败: {:#}", ctx, e);
        }
        let report = VerificationReport::merge(&findings, review);

        // ========== 5. 兜底 ==========
        if report.is_valid {
            info!("{} ✅ 校验通过 (置信度 {:.0}%)", ctx, report.confidence * 100.0);
        } else {
            warn!(
                "{} ⚠️ 校验未通过 (置信度 {:.0}%, {} 个错误)，写入 {}",
                ctx,
                report.confidence * 100.0,
                report.errors.len(),
                self.warn_writer.path()
            );
            if let Err(e) = self.warn_writer.write_report(&ctx.key, &report).await {
                warn!("{} 写入警告日志失败: {}", ctx, e);
            }
        }

        ExerciseOutcome {
            key: block.key.clone(),
            original: block.lines.clone(),
            generated: Some(generated.lines),
            outline: Some(outline),
            findings,
            report: Some(report),
            corrected,
            usage: generated.usage,
            error: None,
        }
    }

    /// 审查生成文本；发现错误时请求一次定点修正，并审查修正后的文本
    ///
    /// 修正失败时保留原文本
    async fn audit_and_correct(
        &self,
        generated: Generated,
        ctx: &ExerciseCtx,
    ) -> (Generated, Vec<Finding>, bool) {
        let findings = audit(&generated.text());
        if findings.is_empty() {
            info!("{} ✓ 算式审查未发现错误", ctx);
            return (generated, findings, false);
        }

        warn!("{} ⚠️ 发现 {} 处算式错误，正在修正...", ctx, findings.len());
        for finding in &findings {
            info!("{}    - {}", ctx, finding);
        }

        match self.generator.correct(&generated, &findings).await {
            Ok(fixed) => {
                let usage = match (generated.usage, fixed.usage) {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                };
                let fixed = Generated { usage, ..fixed };
                let remaining = audit(&fixed.text());
                info!("{} ✓ 修正完成，剩余 {} 处", ctx, remaining.len());
                (fixed, remaining, true)
            }
            Err(e) => {
                warn!("{} ⚠️ 修正失败，保留原文本: {:#}", ctx, e);
                (generated, findings, false)
            }
        }
    }
}
