//! # Exercise Forge
//!
//! 从文档中切分练习、生成新练习、重建大纲并审查算式的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 纯函数核心
//! - `extraction/` - 章节下标 → 有序练习集合（稳定键名）
//! - `outline/` - 生成文本 → 两级大纲 → LaTeX
//! - `audit/` - 文本 → 可证伪的算式错误
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个练习
//! - `SectionClassifier` - 章节识别能力（模型 / 关键词）
//! - `ExerciseGenerator` - 生成与定点修正能力
//! - `MathVerifier` - 语义校验能力
//! - `ExerciseStore` - 本地存储能力
//! - `WarnWriter` - 写复查日志能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个练习"的完整处理流程
//! - `ExerciseCtx` - 上下文封装（序号 + 键名）
//! - `ExerciseFlow` - 流程编排（generate → audit → reconstruct → verify → warn）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/document_pipeline` - 文档处理器，管理并发与输出
//!
//! ## 模块结构

pub mod audit;
pub mod config;
pub mod error;
pub mod extraction;
pub mod models;
pub mod orchestrator;
pub mod outline;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use audit::audit;
pub use config::{ClassifierKind, Config, MarkerVocabulary};
pub use error::{AppError, AppResult};
pub use extraction::{derive_key, partition};
pub use models::{ExerciseBlock, ExerciseKey, ExerciseSet, Finding, FindingKind, OutlineFragment};
pub use orchestrator::{DocumentPipeline, PipelineSummary};
pub use outline::{reconstruct, render_document, render_fragment};
pub use workflow::{ExerciseCtx, ExerciseFlow, ExerciseOutcome, ProcessResult};
