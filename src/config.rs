use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ConfigError, FileError};

/// 可识别的标记词汇表
///
/// 大纲重建器和关键词分类器都从这里读取词汇，不使用硬编码常量
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerVocabulary {
    /// 独立标题行的开头关键词（小写比较）
    pub title_keywords: Vec<String>,
    /// 章节起始行的开头关键词（关键词分类器使用）
    pub section_keywords: Vec<String>,
    /// 注释行前缀，命中后整行跳过
    pub comment_prefixes: Vec<String>,
}

impl Default for MarkerVocabulary {
    fn default() -> Self {
        Self {
            title_keywords: vec!["exercice".to_string()],
            section_keywords: [
                "exercice", "exo", "partie", "problème", "probleme", "problem", "question",
                "chapitre", "section",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            comment_prefixes: vec!["#".to_string()],
        }
    }
}

/// 章节识别方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// 由模型识别
    #[default]
    Llm,
    /// 按关键词离线识别
    Keyword,
}

impl std::str::FromStr for ClassifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llm" => Ok(ClassifierKind::Llm),
            "keyword" => Ok(ClassifierKind::Keyword),
            other => Err(ConfigError::InvalidValue {
                field: "section_classifier".to_string(),
                reason: format!("未知的识别方式: {}", other),
            }),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时生成的练习数量
    pub max_concurrent_exercises: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// LaTeX 输出目录
    pub output_dir: String,
    /// 提取结果的本地存储目录（为空则不存储）
    pub store_dir: Option<String>,
    /// 读取文档时需要剔除的分隔行
    pub excluded_line_markers: Vec<String>,
    /// 行中包含分隔标记即剔除（默认要求去空白后完全相等）
    pub exclude_partial_match: bool,
    /// 分隔标记比较时忽略大小写
    pub exclude_ignore_case: bool,
    pub section_classifier: ClassifierKind,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub generation_temperature: f32,
    pub verification_temperature: f32,
    // --- 生成内容配置 ---
    /// 学科（如 "Mathématiques"）
    pub subject: String,
    /// 难度层级（如 "Terminale"）
    pub level: String,
    /// 改写示例（如 "suite -> intégrale"），写入生成提示词
    pub rewrite_examples: Vec<String>,
    pub document_title: String,
    pub document_subtitle: Option<String>,
    pub document_header: Option<String>,
    /// 标记词汇表
    pub markers: MarkerVocabulary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_exercises: 4,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            output_dir: "output_tex".to_string(),
            store_dir: None,
            excluded_line_markers: vec!["---SECTION---".to_string()],
            exclude_partial_match: false,
            exclude_ignore_case: false,
            section_classifier: ClassifierKind::Llm,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            generation_temperature: 0.6,
            verification_temperature: 0.3,
            subject: "Mathématiques".to_string(),
            level: "Terminale".to_string(),
            rewrite_examples: Vec::new(),
            document_title: "Devoir de Mathématiques".to_string(),
            document_subtitle: None,
            document_header: None,
            markers: MarkerVocabulary::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺省字段取默认值，随后应用环境变量覆盖
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            max_concurrent_exercises: env_parse("MAX_CONCURRENT_EXERCISES").unwrap_or(self.max_concurrent_exercises),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(self.output_dir),
            store_dir: std::env::var("STORE_DIR").ok().or(self.store_dir),
            section_classifier: env_parse("SECTION_CLASSIFIER").unwrap_or(self.section_classifier),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            generation_temperature: env_parse("GENERATION_TEMPERATURE").unwrap_or(self.generation_temperature),
            verification_temperature: env_parse("VERIFICATION_TEMPERATURE").unwrap_or(self.verification_temperature),
            subject: std::env::var("EXERCISE_SUBJECT").unwrap_or(self.subject),
            level: std::env::var("EXERCISE_LEVEL").unwrap_or(self.level),
            ..self
        }
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_exercises == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_exercises".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        for (field, value) in [
            ("generation_temperature", self.generation_temperature),
            ("verification_temperature", self.verification_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("应在 [0, 2] 之间，实际为 {}", value),
                });
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_vocabulary() {
        let vocab = MarkerVocabulary::default();
        assert_eq!(vocab.title_keywords, vec!["exercice"]);
        assert!(vocab.section_keywords.iter().any(|k| k == "partie"));
        assert_eq!(vocab.comment_prefixes, vec!["#"]);
    }

    #[test]
    fn test_from_toml_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
max_concurrent_exercises = 2
level = "Prépa"

[markers]
title_keywords = ["exercise", "problem"]
"#
        )
        .unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.max_concurrent_exercises, 2);
        assert_eq!(config.level, "Prépa");
        assert_eq!(config.markers.title_keywords, vec!["exercise", "problem"]);
        // 未写出的字段取默认值
        assert_eq!(config.markers.comment_prefixes, vec!["#"]);
        assert_eq!(config.document_title, "Devoir de Mathématiques");
    }

    #[test]
    fn test_from_toml_rejects_zero_concurrency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent_exercises = 0").unwrap();
        assert!(Config::from_toml_file(file.path()).is_err());
    }

    #[test]
    fn test_classifier_kind() {
        assert_eq!("Keyword".parse::<ClassifierKind>().unwrap(), ClassifierKind::Keyword);
        assert!("regex".parse::<ClassifierKind>().is_err());
        let config: Config = toml::from_str("section_classifier = \"keyword\"").unwrap();
        assert_eq!(config.section_classifier, ClassifierKind::Keyword);
    }

    #[test]
    fn test_filter_and_example_fields_from_toml() {
        let config: Config = toml::from_str(
            r#"
exclude_partial_match = true
exclude_ignore_case = true
rewrite_examples = ["suite -> intégrale"]
"#,
        )
        .unwrap();
        assert!(config.exclude_partial_match && config.exclude_ignore_case);
        assert_eq!(config.rewrite_examples, vec!["suite -> intégrale"]);

        let defaults = Config::default();
        assert!(!defaults.exclude_partial_match && !defaults.exclude_ignore_case);
        assert!(defaults.rewrite_examples.is_empty());
    }

    #[test]
    fn test_from_toml_missing_file() {
        let err = Config::from_toml_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, crate::error::AppError::File(FileError::ReadFailed { .. })));
    }
}
