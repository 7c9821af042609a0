pub mod exercise_ctx;
pub mod exercise_flow;

pub use exercise_ctx::ExerciseCtx;
pub use exercise_flow::{ExerciseFlow, ExerciseOutcome, ProcessResult};
