//! 练习生成能力
//!
//! 以一个参考练习为灵感生成全新的练习文本，并可根据审查结果做定点修正。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::models::{ExerciseBlock, Finding};
use crate::services::llm_service::{LlmService, TokenUsage};

const GENERATION_MAX_TOKENS: u32 = 4000;
const CORRECTION_TEMPERATURE: f32 = 0.5;

/// 学科、层级以及可选的改写示例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelIndication {
    pub subject: String,
    pub level: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl LevelIndication {
    pub fn new(subject: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            level: level.into(),
            examples: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            examples: config.rewrite_examples.clone(),
            ..Self::new(&config.subject, &config.level)
        }
    }
}

/// 生成结果，按行拆分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub lines: Vec<String>,
    pub usage: Option<TokenUsage>,
}

impl Generated {
    pub fn from_text(text: &str, usage: Option<TokenUsage>) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            usage,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[async_trait]
pub trait ExerciseGenerator: Send + Sync {
    async fn generate(&self, block: &ExerciseBlock, level: &LevelIndication) -> Result<Generated>;

    /// 只修正列出的错误，其余内容保持不变
    async fn correct(&self, generated: &Generated, findings: &[Finding]) -> Result<Generated>;
}

/// 基于 LLM 的生成器
pub struct LlmExerciseGenerator {
    llm: Arc<LlmService>,
    temperature: f32,
}

impl LlmExerciseGenerator {
    pub fn new(llm: Arc<LlmService>, config: &Config) -> Self {
        Self {
            llm,
            temperature: config.generation_temperature,
        }
    }
}

/// 标题行：`exercice 1` -> `Exercice 1`
fn display_title(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn build_generation_prompt(block: &ExerciseBlock, level: &LevelIndication) -> String {
    let examples = if level.examples.is_empty() {
        "Transformer les concepts tout en gardant le niveau".to_string()
    } else {
        level.examples.join("\n - ")
    };

    format!(
        r#"Tu es un concepteur d'exercices "{subject}" créatif et rigoureux, spécialisé dans la conception de sujets de niveau "{lvl}".

EXERCICE DE RÉFÉRENCE (POUR INSPIRATION UNIQUEMENT) :
{reference}

MISSION :
Créer un NOUVEL exercice TOTALEMENT DIFFÉRENT, de niveau "{lvl}", qui évalue les mêmes compétences fondamentales en "{subject}".

CE QUE TU DOIS CONSERVER :
1. Le niveau de difficulté "{lvl}", sans dépasser ce cadre
2. Le domaine général (analyse, algèbre, probabilités, selon le cas)
3. Environ le même nombre de questions (±2 acceptable)

CE QUE TU DOIS CHANGER :
1. Aucune reformulation : l'exercice doit être entièrement nouveau
2. Pas les mêmes objets mathématiques ni le même contexte
3. Pas la même structure de questions

EXEMPLES DE TRANSFORMATION :
{examples}

ERREURS FRÉQUENTES À ÉVITER :
- Écrire "f(2) = 7" sans calculer : si f(x) = x^2 - 3x + 2, alors f(2) = 4 - 6 + 2 = 0
- Affirmer une égalité fausse comme 2 + 3 = 6
- Utiliser "a = 3" puis "a = 5" dans le même exercice
- Poser une question sans solution

CONTRAINTES :
- Privilégier des entiers de -10 à 10 et des fractions simples
- Vérifier chaque égalité avant de l'écrire

FORMAT STRICT :
1. Titre de l'exercice sur une seule ligne : {title}
2. Paragraphe introductif optionnel, formules inline $expression$, display \[expression\]
3. Questions principales numérotées "1. ", "2. ", ...
4. Sous-questions étiquetées "a) ", "b) ", ...
5. Pas de commandes \textbf, \emph ni d'environnements LaTeX

GÉNÈRE MAINTENANT L'EXERCICE (UNIQUEMENT L'ÉNONCÉ, AUCUNE SOLUTION)."#,
        subject = level.subject,
        lvl = level.level,
        reference = block.text(),
        examples = examples,
        title = display_title(block.key.as_str()),
    )
}

pub fn build_correction_prompt(generated: &Generated, findings: &[Finding]) -> String {
    let errors: Vec<String> = findings.iter().map(|f| format!("- {}", f)).collect();
    format!(
        r#"L'exercice suivant contient des erreurs mathématiques.
CORRIGE-LES en gardant le reste identique.

EXERCICE:
{}

ERREURS À CORRIGER:
{}

RÈGLES DE CORRECTION:
1. Corrige UNIQUEMENT les erreurs listées
2. Garde la structure, les questions, le contexte
3. Assure-toi que les corrections sont mathématiquement EXACTES
4. Ne change rien d'autre

Réponds avec l'exercice CORRIGÉ complet (même format)."#,
        generated.text(),
        errors.join("\n")
    )
}

#[async_trait]
impl ExerciseGenerator for LlmExerciseGenerator {
    async fn generate(&self, block: &ExerciseBlock, level: &LevelIndication) -> Result<Generated> {
        let prompt = build_generation_prompt(block, level);
        let reply = self
            .llm
            .send_to_llm(&prompt, None, self.temperature, GENERATION_MAX_TOKENS)
            .await?;
        debug!("练习 {} 生成完成，{} 字符", block.key, reply.content.len());
        Ok(Generated::from_text(&reply.content, reply.usage))
    }

    async fn correct(&self, generated: &Generated, findings: &[Finding]) -> Result<Generated> {
        let prompt = build_correction_prompt(generated, findings);
        let reply = self
            .llm
            .send_to_llm(&prompt, None, CORRECTION_TEMPERATURE, GENERATION_MAX_TOKENS)
            .await?;
        Ok(Generated::from_text(&reply.content, reply.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::partition;
    use crate::models::FindingKind;

    fn block() -> ExerciseBlock {
        let lines = ["Exercice 1", "Soit $f(x) = x^2$.", "1. Calculer $f(2)$."];
        let set = partition(&lines, &[0]);
        set.blocks()[0].clone()
    }

    #[test]
    fn test_generation_prompt_carries_reference_and_level() {
        let mut level = LevelIndication::new("Mathématiques", "Terminale");
        level.examples = vec!["suite -> intégrale".to_string(), "ln -> exp".to_string()];
        let prompt = build_generation_prompt(&block(), &level);

        assert!(prompt.contains("Soit $f(x) = x^2$.\n1. Calculer $f(2)$."));
        assert!(prompt.contains("niveau \"Terminale\""));
        assert!(prompt.contains("suite -> intégrale\n - ln -> exp"));
        assert!(prompt.contains("sur une seule ligne : Exercice 1"));
    }

    #[test]
    fn test_level_from_config_carries_examples() {
        let config = Config {
            level: "Première".to_string(),
            rewrite_examples: vec!["ln -> exp".to_string()],
            ..Config::default()
        };
        let level = LevelIndication::from_config(&config);
        assert_eq!(level.level, "Première");
        assert_eq!(level.examples, vec!["ln -> exp"]);
        assert!(build_generation_prompt(&block(), &level).contains("ln -> exp"));
    }

    #[test]
    fn test_correction_prompt_lists_findings() {
        let generated = Generated::from_text("Exercice 1\nOn a $2 + 3 = 6$.", None);
        let findings = vec![Finding {
            claim: "$2 + 3 = 6$".to_string(),
            kind: FindingKind::Mismatch {
                expected: 5.0,
                actual: 6.0,
            },
        }];
        let prompt = build_correction_prompt(&generated, &findings);
        assert!(prompt.contains("Exercice 1\nOn a $2 + 3 = 6$."));
        assert!(prompt.contains("- 计算错误: $2 + 3 = 6$"));
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("exercice 1"), "Exercice 1");
        assert_eq!(display_title("épreuve 2"), "Épreuve 2");
        assert_eq!(display_title(""), "");
    }

    #[tokio::test]
    #[ignore] // 需要真实的 API 密钥
    async fn test_generate_live() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = Config::from_env();
        let generator = LlmExerciseGenerator::new(Arc::new(LlmService::new(&config)), &config);
        let generated = generator
            .generate(&block(), &LevelIndication::from_config(&config))
            .await
            .unwrap();
        assert!(!generated.lines.is_empty());
    }
}
