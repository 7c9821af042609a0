//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整份文档的处理和调度，是整个系统的"指挥中心"。
//!
//! ### `document_pipeline` - 文档处理器
//! - 读取文档、识别章节、切分练习
//! - 控制并发数量（Semaphore）
//! - 汇总 LaTeX 文档与统计信息
//!
//! ## 层次关系
//!
//! ```text
//! document_pipeline (处理 ExerciseSet)
//!     ↓
//! workflow::ExerciseFlow (处理单个 ExerciseBlock)
//!     ↓
//! services (能力层：classify / generate / verify / store / warn)
//!     ↓
//! extraction / outline / audit (纯函数核心)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → 核心
//! 2. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod document_pipeline;

pub use document_pipeline::{DocumentPipeline, PipelineSummary};
