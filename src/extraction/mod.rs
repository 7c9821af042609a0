//! 练习切分
//!
//! 把行序列和候选章节起始下标切分为带稳定键名的练习块。
//! 纯函数，无 I/O，可并发调用。

pub mod key;
pub mod partition;

pub use key::derive_key;
pub use partition::{normalize_indices, partition};
