//! 文档处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **读取文档**：按配置剔除分隔行，得到行序列
//! 2. **章节识别**：交给 `SectionClassifier` 给出候选下标
//! 3. **切分**：得到有序的练习集合，并（可选）写入本地存储
//! 4. **并发控制**：使用 Semaphore 限制同时处理的练习数
//! 5. **输出**：汇总为一份 LaTeX 文档和一份 JSON 报告
//!
//! 单个练习的失败只记录在结果里，不会中断整个文档。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::{ClassifierKind, Config};
use crate::extraction::partition;
use crate::models::{load_lines, ExerciseSet, LineFilter};
use crate::outline::{render_document, DocumentOptions, RenderedExercise};
use crate::services::{
    ExerciseStore, FsExerciseStore, KeywordClassifier, LlmExerciseGenerator, LlmMathVerifier,
    LlmSectionClassifier, LlmService, SectionClassifier, TokenUsage,
};
use crate::utils::logging;
use crate::workflow::{ExerciseCtx, ExerciseFlow, ExerciseOutcome, ProcessResult};

/// 一次文档处理的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub total_lines: usize,
    /// 文档结构（各练习的标题行）
    pub structure: Vec<String>,
    pub generated: usize,
    pub flagged: usize,
    pub failed: usize,
    pub usage: TokenUsage,
    pub tex_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub outcomes: Vec<ExerciseOutcome>,
}

impl PipelineSummary {
    fn tally(&mut self, outcomes: Vec<ExerciseOutcome>) {
        for outcome in &outcomes {
            match outcome.status() {
                ProcessResult::Generated => self.generated += 1,
                ProcessResult::Flagged => self.flagged += 1,
                ProcessResult::Failed => self.failed += 1,
            }
            if let Some(usage) = outcome.usage {
                self.usage = self.usage + usage;
            }
        }
        self.outcomes = outcomes;
    }
}

/// 文档处理器
pub struct DocumentPipeline {
    config: Config,
    classifier: Arc<dyn SectionClassifier>,
    flow: Arc<ExerciseFlow>,
    store: Option<Arc<dyn ExerciseStore>>,
}

impl DocumentPipeline {
    pub fn new(
        config: Config,
        classifier: Arc<dyn SectionClassifier>,
        flow: ExerciseFlow,
        store: Option<Arc<dyn ExerciseStore>>,
    ) -> Self {
        Self {
            config,
            classifier,
            flow: Arc::new(flow),
            store,
        }
    }

    /// 按配置组装协作者；`store_dir` 为空时不存储
    pub fn from_config(config: Config) -> Self {
        let llm = Arc::new(LlmService::new(&config));
        let classifier: Arc<dyn SectionClassifier> = match config.section_classifier {
            ClassifierKind::Llm => Arc::new(LlmSectionClassifier::new(llm.clone(), &config)),
            ClassifierKind::Keyword => Arc::new(KeywordClassifier::new(&config.markers)),
        };
        let flow = ExerciseFlow::new(
            &config,
            Arc::new(LlmExerciseGenerator::new(llm.clone(), &config)),
            Arc::new(LlmMathVerifier::new(llm, &config)),
        );
        let store = config
            .store_dir
            .as_ref()
            .map(|dir| Arc::new(FsExerciseStore::new(dir)) as Arc<dyn ExerciseStore>);
        Self::new(config, classifier, flow, store)
    }

    /// 处理一份文档
    pub async fn run(&self, path: &Path) -> Result<PipelineSummary> {
        logging::log_startup(&path.display().to_string(), self.config.max_concurrent_exercises);

        // 读取
        let filter = LineFilter::from_config(&self.config);
        let lines = load_lines(path, &filter).await?;

        // 识别章节
        info!("🔍 正在识别章节...");
        let indices = self
            .classifier
            .section_indices(&lines)
            .await
            .context("章节识别失败")?;

        // 切分
        let set = partition(&lines, &indices);
        let mut summary = PipelineSummary {
            total_lines: lines.len(),
            structure: set.structure(),
            ..Default::default()
        };
        if set.is_empty() {
            warn!("⚠️ 没有识别到任何练习，程序结束");
            return Ok(summary);
        }
        let keys: Vec<&str> = set.keys().map(|k| k.as_str()).collect();
        logging::log_blocks_found(lines.len(), &keys);

        self.store_blocks(&set).await;

        // 并发处理
        let outcomes = self.process_all(&set).await?;
        summary.tally(outcomes);

        // 输出
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let (tex_path, report_path) = self.write_outputs(&stem, &summary).await?;
        summary.tex_path = Some(tex_path);
        summary.report_path = Some(report_path);

        logging::print_final_stats(
            summary.generated,
            summary.failed,
            summary.flagged,
            &summary
                .tex_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        info!(
            "📊 Tokens: {} → {} (总计 {})",
            summary.usage.prompt_tokens, summary.usage.completion_tokens, summary.usage.total_tokens
        );

        Ok(summary)
    }

    /// 保存练习块与文档结构；存储失败只记录警告
    async fn store_blocks(&self, set: &ExerciseSet) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save_structure(&set.structure()).await {
            warn!("⚠️ 保存文档结构失败: {:#}", e);
        }
        for block in set {
            match store.save_block(block).await {
                Ok(path) => info!("💾 {} -> {}", block.key, path.display()),
                Err(e) => warn!("⚠️ 保存 {} 失败: {:#}", block.key, e),
            }
        }
    }

    /// 处理全部练习，最多 `max_concurrent_exercises` 个同时进行
    ///
    /// 结果顺序与练习顺序一致
    pub async fn process_all(&self, set: &ExerciseSet) -> Result<Vec<ExerciseOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_exercises));
        let total = set.len();
        let mut handles = Vec::with_capacity(total);

        for (i, block) in set.iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let ctx = ExerciseCtx::new(i + 1, total, block.key.as_str());
            let flow = self.flow.clone();
            let block = block.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                logging::log_exercise_start(ctx.index, ctx.total, &ctx.key);
                flow.run(&block, &ctx).await
            });
            handles.push((i, handle));
        }

        let blocks = set.blocks();
        let mut outcomes = Vec::with_capacity(total);
        for (i, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("[练习 {}] 任务执行失败: {}", i + 1, e);
                    outcomes.push(ExerciseOutcome::failed(&blocks[i], e.to_string()));
                }
            }
        }
        Ok(outcomes)
    }

    /// 写出 `<output_dir>/<stem>.tex` 与 `<output_dir>/<stem>_report.json`
    async fn write_outputs(
        &self,
        stem: &str,
        summary: &PipelineSummary,
    ) -> Result<(PathBuf, PathBuf)> {
        let dir = PathBuf::from(&self.config.output_dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;

        let exercises: Vec<RenderedExercise> = summary
            .outcomes
            .iter()
            .map(|o| RenderedExercise {
                key: o.key.to_string(),
                fragment: o.outline.clone(),
            })
            .collect();
        let options = DocumentOptions {
            title: self.config.document_title.clone(),
            subtitle: self.config.document_subtitle.clone(),
            header: self.config.document_header.clone(),
        };
        let tex_path = dir.join(format!("{}.tex", stem));
        tokio::fs::write(&tex_path, render_document(&exercises, &options))
            .await
            .with_context(|| format!("无法写入: {}", tex_path.display()))?;

        let report_path = dir.join(format!("{}_report.json", stem));
        let report = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(&report_path, report)
            .await
            .with_context(|| format!("无法写入: {}", report_path.display()))?;

        info!("📝 LaTeX 已写入 {}", tex_path.display());
        Ok((tex_path, report_path))
    }
}
