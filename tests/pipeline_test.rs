//! 文档处理器端到端测试（使用替身协作者，不访问网络）

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use exercise_forge::models::{ExerciseBlock, Finding};
use exercise_forge::services::{
    ExerciseGenerator, ExerciseStore, FsExerciseStore, Generated, KeywordClassifier,
    LevelIndication, MathVerifier, SemanticReview, TokenUsage, Verdict,
};
use exercise_forge::utils::logging;
use exercise_forge::{Config, DocumentPipeline, ExerciseFlow, ProcessResult};

const DOCUMENT: &str = "\
Lycée Victor Hugo
---SECTION---
Exercice 1
Soit $f(x) = x^2 - 4x + 3$.
1. Calculer $f(2)$.
Exercice 2
a) Étudier la suite.
Partie B
1. Conclure.
";

/// 按练习键名返回预设文本；"partie B" 模拟失败
struct FakeGenerator;

#[async_trait]
impl ExerciseGenerator for FakeGenerator {
    async fn generate(&self, block: &ExerciseBlock, level: &LevelIndication) -> Result<Generated> {
        let usage = Some(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        match block.key.as_str() {
            "exercice 1" => Ok(Generated::from_text(
                &format!(
                    "Exercice 1 ({})\nSoit $g(x) = 2x + 1$.\n1. Montrer que $2 + 3 = 5$.\na) En déduire $g(1)$.",
                    level.level
                ),
                usage,
            )),
            "exercice 2" => Ok(Generated::from_text("1. On a $3 * 4 = 11$.", usage)),
            other => anyhow::bail!("模型拒绝生成 {}", other),
        }
    }

    async fn correct(&self, generated: &Generated, _: &[Finding]) -> Result<Generated> {
        // 修正没有生效
        Ok(Generated::from_text(&generated.text(), None))
    }
}

struct FakeVerifier;

#[async_trait]
impl MathVerifier for FakeVerifier {
    async fn verify(&self, _: &str, _: &str, _: &str) -> Result<SemanticReview> {
        Ok(SemanticReview {
            verdict: Verdict::Valide,
            critical: Vec::new(),
            warnings: Vec::new(),
            confidence: Some(1.0),
            comment: "ok".to_string(),
        })
    }
}

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        max_concurrent_exercises: 2,
        output_dir: dir.join("tex").to_string_lossy().into_owned(),
        output_log_file: dir.join("output.txt").to_string_lossy().into_owned(),
        store_dir: Some(dir.join("store").to_string_lossy().into_owned()),
        document_subtitle: Some("Durée: 1h".to_string()),
        ..Config::default()
    }
}

fn pipeline(config: &Config) -> DocumentPipeline {
    let flow = ExerciseFlow::new(config, Arc::new(FakeGenerator), Arc::new(FakeVerifier));
    let store = config
        .store_dir
        .as_ref()
        .map(|dir| Arc::new(FsExerciseStore::new(dir)) as Arc<dyn ExerciseStore>);
    DocumentPipeline::new(
        config.clone(),
        Arc::new(KeywordClassifier::new(&config.markers)),
        flow,
        store,
    )
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    logging::init(false);
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("devoir.txt");
    std::fs::write(&input, DOCUMENT).unwrap();

    let config = test_config(dir.path());
    logging::init_log_file(&config.output_log_file).unwrap();
    let summary = pipeline(&config).run(&input).await.unwrap();

    // 切分
    assert_eq!(summary.total_lines, 9);
    assert_eq!(summary.structure, vec!["Exercice 1", "Exercice 2", "Partie B"]);
    let keys: Vec<&str> = summary.outcomes.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["exercice 1", "exercice 2", "partie B"]);

    // 状态
    let statuses: Vec<ProcessResult> = summary.outcomes.iter().map(|o| o.status()).collect();
    assert_eq!(
        statuses,
        vec![ProcessResult::Generated, ProcessResult::Flagged, ProcessResult::Failed]
    );
    assert_eq!((summary.generated, summary.flagged, summary.failed), (1, 1, 1));
    assert!(summary.outcomes[1].corrected);
    assert_eq!(summary.outcomes[1].findings.len(), 1);
    assert_eq!(summary.usage.total_tokens, 30);

    // LaTeX：失败的练习被跳过
    let tex = std::fs::read_to_string(summary.tex_path.as_ref().unwrap()).unwrap();
    assert!(summary.tex_path.as_ref().unwrap().ends_with("tex/devoir.tex"));
    assert_eq!(tex.matches("\\begin{exercice}").count(), 2);
    assert!(tex.contains("\\textbf{Exercice 1 (Terminale)}"));
    assert!(tex.contains("\\item En déduire $g(1)$."));
    assert!(tex.contains("{\\large Durée: 1h}"));

    // JSON 报告
    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(summary.report_path.as_ref().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(report["outcomes"][1]["findings"][0]["type"], "MISMATCH");
    assert_eq!(report["outcomes"][2]["generated"], serde_json::Value::Null);

    // 存储
    let store = dir.path().join("store");
    assert!(store.join("exercice_1").is_dir());
    assert!(store.join("partie_B").is_dir());
    assert!(store.join("structure").is_dir());

    // 复查日志
    let log = std::fs::read_to_string(&config.output_log_file).unwrap();
    assert!(log.contains("练习生成日志"));
    assert!(log.contains("⚠️ 练习 exercice 2"));
    assert!(log.contains("❌ 练习 partie B"));
}

#[tokio::test]
async fn test_pipeline_without_sections_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("vide.txt");
    std::fs::write(&input, "pas de titre\nrien ici\n").unwrap();

    let config = test_config(dir.path());
    let summary = pipeline(&config).run(&input).await.unwrap();

    assert!(summary.outcomes.is_empty());
    assert_eq!(summary.tex_path, None);
    assert!(!dir.path().join("tex").exists());
}

#[tokio::test]
async fn test_pipeline_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let result = pipeline(&config).run(&dir.path().join("absent.txt")).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore] // 需要真实的 API 密钥：cargo test -- --ignored
async fn test_live_pipeline() {
    logging::init(true);
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("devoir.txt");
    std::fs::write(&input, DOCUMENT).unwrap();

    let config = Config {
        output_dir: dir.path().to_string_lossy().into_owned(),
        output_log_file: dir.path().join("output.txt").to_string_lossy().into_owned(),
        ..Config::from_env()
    };
    let summary = DocumentPipeline::from_config(config).run(&input).await.unwrap();
    assert!(summary.generated + summary.flagged > 0);
}
