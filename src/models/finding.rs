//! 算式审查结果

use std::fmt;

use serde::{Deserialize, Serialize};

/// 一条可验证为错误的数值陈述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// 原文中的算式（含 `$` 定界符）
    pub claim: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    /// `a op b = c` 左右两边不相等
    Mismatch { expected: f64, actual: f64 },
    /// 除数为 0，不求值
    DivisionByZero,
    /// `f(k) = v` 与 `f(x)` 的定义不符
    FunctionValue {
        argument: i64,
        expected: f64,
        actual: f64,
    },
}

impl Finding {
    pub fn expected(&self) -> Option<f64> {
        match self.kind {
            FindingKind::Mismatch { expected, .. } | FindingKind::FunctionValue { expected, .. } => {
                Some(expected)
            }
            FindingKind::DivisionByZero => None,
        }
    }

    pub fn actual(&self) -> Option<f64> {
        match self.kind {
            FindingKind::Mismatch { actual, .. } | FindingKind::FunctionValue { actual, .. } => {
                Some(actual)
            }
            FindingKind::DivisionByZero => None,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FindingKind::Mismatch { expected, actual } => {
                write!(f, "计算错误: {} (给出 {}，应为 {})", self.claim, actual, expected)
            }
            FindingKind::DivisionByZero => write!(f, "除数为零: {}", self.claim),
            FindingKind::FunctionValue {
                argument,
                expected,
                actual,
            } => write!(
                f,
                "函数值错误: {} (f({}) 给出 {}，应为 {})",
                self.claim, argument, actual, expected
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_json_shape() {
        let finding = Finding {
            claim: "$2 + 3 = 6$".to_string(),
            kind: FindingKind::Mismatch {
                expected: 5.0,
                actual: 6.0,
            },
        };
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["type"], "MISMATCH");
        assert_eq!(value["expected"], 5.0);
        assert_eq!(value["claim"], "$2 + 3 = 6$");
        assert_eq!(finding.to_string(), "计算错误: $2 + 3 = 6$ (给出 6，应为 5)");
    }
}
