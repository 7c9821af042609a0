//! 大纲重建
//!
//! 把生成的自由文本（混有 `1.`、`a)` 之类编号）重建为两级嵌套的大纲树，
//! 并可输出为 LaTeX。任何输入都不会报错，最坏情况下退化为全部段落。

pub mod latex;
pub mod machine;
pub mod matchers;

pub use latex::{render_document, render_fragment, DocumentOptions, RenderedExercise};
pub use machine::{reconstruct, OutlineReconstructor, OutlineState};
pub use matchers::{LineKind, MarkerMatchers};
