//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，只处理单个练习或单个文档，不关心流程顺序。
//! 需要外部协作者的能力以 trait 暴露，便于在流程层替换实现。

pub mod classifier;
pub mod generator;
pub mod llm_service;
pub mod store;
pub mod verifier;
pub mod warn_writer;

pub use classifier::{KeywordClassifier, LlmSectionClassifier, SectionClassifier};
pub use generator::{ExerciseGenerator, Generated, LevelIndication, LlmExerciseGenerator};
pub use llm_service::{LlmReply, LlmService, TokenUsage};
pub use store::{ExerciseStore, FsExerciseStore};
pub use verifier::{
    Issue, IssueSource, LlmMathVerifier, MathVerifier, SemanticReview, Verdict, VerificationReport,
};
pub use warn_writer::WarnWriter;
