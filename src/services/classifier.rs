//! 章节识别能力
//!
//! 给出一份行序列中"哪些行是章节起始行"的候选下标。
//! 返回的下标可能无序、重复或越界，由分块器统一规整。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{Config, MarkerVocabulary};
use crate::services::llm_service::{strip_code_fence, LlmService};

/// 判断为章节起始行的最大词数
const MAX_SECTION_LINE_WORDS: usize = 12;

#[async_trait]
pub trait SectionClassifier: Send + Sync {
    async fn section_indices(&self, lines: &[String]) -> Result<Vec<i64>>;
}

/// 基于关键词的离线分类器
///
/// 短行且首个词（去掉尾部标点、小写比较）属于 `section_keywords` 时视为章节起始
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(vocabulary: &MarkerVocabulary) -> Self {
        Self {
            keywords: vocabulary
                .section_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_section_start(&self, line: &str) -> bool {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return false;
        };
        if words.count() + 1 > MAX_SECTION_LINE_WORDS {
            return false;
        }
        let first = first
            .trim_start_matches(['*', '#'])
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        self.keywords.iter().any(|k| *k == first)
    }

    pub fn classify(&self, lines: &[String]) -> Vec<i64> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.is_section_start(line))
            .map(|(i, _)| i as i64)
            .collect()
    }
}

#[async_trait]
impl SectionClassifier for KeywordClassifier {
    async fn section_indices(&self, lines: &[String]) -> Result<Vec<i64>> {
        Ok(self.classify(lines))
    }
}

/// 由模型识别章节起始行
pub struct LlmSectionClassifier {
    llm: Arc<LlmService>,
    keywords: Vec<String>,
}

impl LlmSectionClassifier {
    pub fn new(llm: Arc<LlmService>, config: &Config) -> Self {
        Self {
            llm,
            keywords: config.markers.section_keywords.clone(),
        }
    }

    fn build_prompt(&self, lines: &[String]) -> String {
        let numbered: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {}", i, line))
            .collect();
        let keywords: Vec<String> = self.keywords.iter().map(|k| format!("\"{}\"", k)).collect();

        format!(
            r#"Analyse ce document ligne par ligne et retourne UNIQUEMENT les indices (numéros) des lignes qui marquent le début d'une section.

CRITÈRES D'UNE LIGNE DE SECTION :
- Contient l'un de ces mots-clés : {}
- Généralement courte (moins de 4 phrases)
- Souvent suivie d'un numéro (ex: "Exercice 1", "Partie A")

DOCUMENT À ANALYSER :
{}

INSTRUCTIONS :
1. Identifie chaque ligne qui correspond aux critères ci-dessus
2. Retourne UNIQUEMENT un tableau JSON d'indices (nombres entiers)
3. Format attendu : [12, 45, 78, 156]
4. Ne retourne AUCUN texte explicatif, juste le JSON

Réponse :"#,
            keywords.join(", "),
            numbered.join("\n")
        )
    }
}

/// 解析模型返回的下标数组，无法解析时返回空集合
pub fn parse_indices(response: &str) -> Vec<i64> {
    match serde_json::from_str::<Vec<i64>>(strip_code_fence(response)) {
        Ok(indices) => indices,
        Err(e) => {
            warn!("无法解析章节下标: {} (回复: {})", e, crate::utils::truncate_text(response, 80));
            Vec::new()
        }
    }
}

#[async_trait]
impl SectionClassifier for LlmSectionClassifier {
    async fn section_indices(&self, lines: &[String]) -> Result<Vec<i64>> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = self.build_prompt(lines);
        let reply = self.llm.send_to_llm(&prompt, None, 0.0, 1000).await?;
        let indices = parse_indices(&reply.content);
        debug!("模型识别出 {} 个章节起始行", indices.len());
        Ok(indices)
    }
}
