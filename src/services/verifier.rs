//! 语义校验能力
//!
//! 由独立的模型调用复核练习的数学正确性，结果与算式审查合并为一份报告。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::Finding;
use crate::services::llm_service::{extract_json_object, LlmService};

const VERIFICATION_MAX_TOKENS: u32 = 2000;
const VALID_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Valide,
    Invalide,
    Douteux,
}

/// 校验者指出的一个问题
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "localisation")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
}

/// 校验者的 JSON 回复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticReview {
    pub verdict: Verdict,
    #[serde(default, rename = "erreurs_critiques")]
    pub critical: Vec<ReviewItem>,
    #[serde(default, rename = "avertissements")]
    pub warnings: Vec<ReviewItem>,
    #[serde(default, rename = "score_confiance")]
    pub confidence: Option<f64>,
    #[serde(default, rename = "commentaire_general")]
    pub comment: String,
}

impl SemanticReview {
    /// 从回复中截取第一个 JSON 对象并解析
    pub fn parse(response: &str) -> Result<Self, LlmError> {
        let unparsable = || LlmError::UnparsableResponse {
            what: "semantic review".to_string(),
            response: crate::utils::truncate_text(response, 120),
        };
        let json = extract_json_object(response).ok_or_else(unparsable)?;
        serde_json::from_str(json).map_err(|_| unparsable())
    }
}

#[async_trait]
pub trait MathVerifier: Send + Sync {
    async fn verify(&self, text: &str, level: &str, subject: &str) -> Result<SemanticReview>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSource {
    /// 算式审查
    Audit,
    AgentCritical,
    AgentWarning,
    /// 校验者本身调用失败
    AgentError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub source: IssueSource,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
}

impl Issue {
    fn from_review(source: IssueSource, item: ReviewItem) -> Self {
        Self {
            source,
            message: item.description,
            location: item.location,
            correction: item.correction,
        }
    }
}

/// 合并后的校验报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub is_valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl VerificationReport {
    /// 合并审查结果与校验者回复
    ///
    /// 置信度 = max(0, 1 - 0.1 * (错误数 + 0.5 * 警告数))；
    /// 没有错误且置信度不低于 0.7 时有效。校验失败记为一条警告。
    pub fn merge(findings: &[Finding], review: Result<SemanticReview>) -> Self {
        let mut errors: Vec<Issue> = findings
            .iter()
            .map(|finding| Issue {
                source: IssueSource::Audit,
                message: finding.to_string(),
                location: String::new(),
                correction: None,
            })
            .collect();
        let mut warnings = Vec::new();

        let verdict = match review {
            Ok(review) => {
                errors.extend(
                    review
                        .critical
                        .into_iter()
                        .map(|item| Issue::from_review(IssueSource::AgentCritical, item)),
                );
                warnings.extend(
                    review
                        .warnings
                        .into_iter()
                        .map(|item| Issue::from_review(IssueSource::AgentWarning, item)),
                );
                Some(review.verdict)
            }
            Err(e) => {
                warnings.push(Issue {
                    source: IssueSource::AgentError,
                    message: format!("语义校验失败: {:#}", e),
                    location: String::new(),
                    correction: None,
                });
                None
            }
        };

        let issues = errors.len() as f64 + warnings.len() as f64 * 0.5;
        let confidence = (1.0 - issues * 0.1).max(0.0);
        let is_valid = errors.is_empty() && confidence >= VALID_CONFIDENCE;

        Self {
            is_valid,
            errors,
            warnings,
            confidence,
            verdict,
        }
    }
}

/// 基于 LLM 的校验者
pub struct LlmMathVerifier {
    llm: Arc<LlmService>,
    temperature: f32,
}

impl LlmMathVerifier {
    pub fn new(llm: Arc<LlmService>, config: &Config) -> Self {
        Self {
            llm,
            temperature: config.verification_temperature,
        }
    }
}

pub fn build_verification_prompt(text: &str, level: &str, subject: &str) -> String {
    format!(
        r#"Tu es un VÉRIFICATEUR MATHÉMATIQUE EXPERT, spécialisé en {subject} niveau {level}.

Ta mission est de vérifier RIGOUREUSEMENT l'exactitude mathématique de l'exercice ci-dessous.

EXERCICE À VÉRIFIER :
{text}

INSTRUCTIONS DE VÉRIFICATION :
1. Vérifier TOUTES les égalités numériques (f(2) = 7, 2 + 3 = 5, limites, dérivées, intégrales)
2. Vérifier la cohérence des données, des paramètres et des domaines de définition
3. Vérifier que chaque question a une solution faisable au niveau {level}
4. Identifier les erreurs de signe, de dérivée, de paramètres

FORMAT DE RÉPONSE :
Réponds UNIQUEMENT en JSON avec cette structure exacte :

{{
  "verdict": "VALIDE" ou "INVALIDE" ou "DOUTEUX",
  "erreurs_critiques": [
    {{"description": "...", "localisation": "question 1", "correction": "..."}}
  ],
  "avertissements": [
    {{"description": "...", "localisation": "question 2"}}
  ],
  "score_confiance": 0.95,
  "commentaire_general": "..."
}}

SOIS TRÈS RIGOUREUX. Ne laisse passer AUCUNE erreur mathématique."#
    )
}

#[async_trait]
impl MathVerifier for LlmMathVerifier {
    async fn verify(&self, text: &str, level: &str, subject: &str) -> Result<SemanticReview> {
        let prompt = build_verification_prompt(text, level, subject);
        let reply = self
            .llm
            .send_to_llm(&prompt, None, self.temperature, VERIFICATION_MAX_TOKENS)
            .await?;
        let review = SemanticReview::parse(&reply.content)?;

        match review.verdict {
            Verdict::Invalide => warn!(
                "⚠️ 校验结论: INVALIDE (score: {:.2})",
                review.confidence.unwrap_or_default()
            ),
            verdict => info!(
                "✅ 校验结论: {:?} (score: {:.2})",
                verdict,
                review.confidence.unwrap_or_default()
            ),
        }
        debug!("校验意见: {}", review.comment);
        Ok(review)
    }
}
