use std::num::NonZeroUsize;

use crate::error::KeyError;
use crate::models::ExerciseKey;

/// 由标题行和序号推导练习键名
///
/// - 无单词：`Section {序号}`
/// - 一个单词：`{单词} {序号}`
/// - 多个单词：第二个单词只含字母数字（含 À–ÿ）时为 `{首词小写} {第二词}`，
///   否则（含 `$`、`\`、`{`、`^` 等标记字符）为 `{首词小写} {序号}`
///
/// 结果末尾的 `.` `,` `;` `:` 会被去掉。相同输入总是得到相同键名。
///
/// # 错误
/// 序号从 1 开始，传入 0 属于调用方误用，返回 [`KeyError::InvalidOrdinal`]
pub fn derive_key(title_line: &str, ordinal: usize) -> Result<ExerciseKey, KeyError> {
    let ordinal = NonZeroUsize::new(ordinal).ok_or(KeyError::InvalidOrdinal { ordinal })?;
    Ok(key_for(title_line, ordinal))
}

pub(crate) fn key_for(title_line: &str, ordinal: NonZeroUsize) -> ExerciseKey {
    let mut words = title_line.split_whitespace();
    let raw = match (words.next(), words.next()) {
        (None, _) => format!("Section {}", ordinal),
        (Some(only), None) => format!("{} {}", only, ordinal),
        (Some(first), Some(second)) => {
            if second.chars().all(is_plain_word_char) {
                format!("{} {}", first.to_lowercase(), second)
            } else {
                format!("{} {}", first.to_lowercase(), ordinal)
            }
        }
    };
    ExerciseKey::new(raw.trim_end_matches(['.', ',', ';', ':']).to_string())
}

/// `[A-Za-z0-9]` 加上 Latin-1 重音字母区间
fn is_plain_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{C0}'..='\u{FF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(title: &str, ordinal: usize) -> String {
        derive_key(title, ordinal).unwrap().to_string()
    }

    #[test]
    fn test_plain_second_word_is_kept() {
        assert_eq!(key("Exercice 1", 1), "exercice 1");
        assert_eq!(key("Partie A", 4), "partie A");
        assert_eq!(key("PROBLÈME Général", 2), "problème Général");
    }

    #[test]
    fn test_markup_second_word_falls_back_to_ordinal() {
        assert_eq!(key("Exercice $n^2$", 3), "exercice 3");
        assert_eq!(key(r"Exercice \textbf{2}", 5), "exercice 5");
        assert_eq!(key("Exercice n°1", 7), "exercice 7");
        assert_eq!(key("Exercice 1.", 2), "exercice 2");
    }

    #[test]
    fn test_single_and_empty_titles() {
        assert_eq!(key("Problème", 2), "Problème 2");
        assert_eq!(key("   ", 6), "Section 6");
        assert_eq!(key("", 1), "Section 1");
    }

    #[test]
    fn test_key_never_ends_with_punctuation() {
        assert_eq!(key("Exo:", 1), "Exo: 1");
        assert_eq!(key("Annexe.", 9), "Annexe. 9");
        for title in ["Exercice 1;", "Partie, A", "Question:", "  :  "] {
            let k = key(title, 2);
            assert!(!k.ends_with(['.', ',', ';', ':']), "{}", k);
        }
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(key("Exercice $x$", 4), key("Exercice $x$", 4));
        }
    }

    #[test]
    fn test_zero_ordinal_is_misuse() {
        assert_eq!(
            derive_key("Exercice 1", 0),
            Err(KeyError::InvalidOrdinal { ordinal: 0 })
        );
    }
}
