//! 算式审查
//!
//! 窄而准的词法检查：只标记能被完整解析、且可证伪的数值陈述。
//! 解析不了的内容一律放过，永不报错。

pub mod arithmetic;
pub mod polynomial;

pub use arithmetic::{extract_claims, ArithmeticClaim, Operator};
pub use polynomial::Polynomial;

use crate::models::Finding;

/// 审查一段文本，按出现顺序返回算式错误，随后是函数值错误
pub fn audit(text: &str) -> Vec<Finding> {
    let mut findings = arithmetic::audit_arithmetic(text);
    findings.extend(polynomial::audit_function_values(text));
    if !findings.is_empty() {
        tracing::debug!("算式审查发现 {} 处可疑", findings.len());
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FindingKind;

    #[test]
    fn test_audit_soundness_examples() {
        let findings = audit("$2 + 3 = 6$");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].expected(), Some(5.0));
        assert_eq!(findings[0].actual(), Some(6.0));

        assert!(audit("$2 + 3 = 5$").is_empty());

        let findings = audit("$2 / 0 = 1$");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DivisionByZero);

        assert!(audit("no math here").is_empty());
    }

    #[test]
    fn test_audit_mixed_text() {
        let text = "Soit $f(x) = x^2 - 4x + 3$.\n\
                    1) Vérifier que $f(2) = -1$.\n\
                    2) On a aussi $2 + 3 = 6$ et $f(0) = 4$.";
        let findings = audit(text);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].claim, "$2 + 3 = 6$");
        assert_eq!(
            findings[1].kind,
            FindingKind::FunctionValue {
                argument: 0,
                expected: 3.0,
                actual: 4.0
            }
        );
    }
}
