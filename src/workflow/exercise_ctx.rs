//! 练习处理上下文
//!
//! 封装"我正在处理文档里的第几个练习"这一信息

use std::fmt::Display;

/// 练习处理上下文
#[derive(Debug, Clone)]
pub struct ExerciseCtx {
    /// 练习序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 文档中的练习总数
    pub total: usize,

    /// 练习键名
    pub key: String,
}

impl ExerciseCtx {
    pub fn new(index: usize, total: usize, key: impl Into<String>) -> Self {
        Self {
            index,
            total,
            key: key.into(),
        }
    }
}

impl Display for ExerciseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[练习 {}/{} {}]", self.index, self.total, self.key)
    }
}
