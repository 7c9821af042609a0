pub mod exercise;
pub mod finding;
pub mod loaders;
pub mod outline;

pub use exercise::{ExerciseBlock, ExerciseKey, ExerciseSet};
pub use finding::{Finding, FindingKind};
pub use loaders::{load_lines, LineFilter};
pub use outline::{OutlineFragment, OutlineNode, Question, SubQuestion};
