/*!
common/src/lib.rs

Shared configuration types for newsbrief.

This file provides:
- Config data structures (deserialized from JSON, or TOML by file extension)
- An async loader that layers an override document over a default document
- Validation of the few constraints the pipeline relies on
*/

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Largest accepted `days_back`: ten years of news.
pub const MAX_DAYS_BACK: u32 = 3650;

/// Errors raised while loading or validating the configuration document.
/// Always fatal: the run aborts before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Search / completion API section. Only the *name* of the environment
/// variable holding the key lives here, never the key itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the API, e.g. "https://api.perplexity.ai"
    pub base_url: String,
    pub api_key_env: String,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Outbound email section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    /// Environment variable holding the SMTP password for `sender`
    pub password_env: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender: None,
            recipient: None,
            password_env: "EMAIL_PASSWORD".to_string(),
        }
    }
}

/// Top-level application configuration (deserialized from config.json)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub topics: Vec<String>,
    pub articles_per_topic: usize,
    pub days_back: u32,
    pub max_tokens: usize,
    pub model: String,
    /// Instruction placed before each article in the summarization prompt
    pub summary_prompt: String,
    /// Appended to every topic to form the search query ("" disables it)
    pub query_suffix: String,
    /// strftime pattern for human-readable dates in rendered briefs
    pub date_format: String,
    pub output_directory: String,
    pub auto_save: bool,
    pub api: ApiConfig,
    pub email: EmailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topics: vec!["general news".to_string()],
            articles_per_topic: 5,
            days_back: 1,
            max_tokens: 200,
            model: "sonar".to_string(),
            summary_prompt: "Summarize the following news article in 2-3 concise sentences. \
                             Focus on the key facts and main points:"
                .to_string(),
            query_suffix: "today".to_string(),
            date_format: "%B %d, %Y".to_string(),
            output_directory: "briefs".to_string(),
            auto_save: false,
            api: ApiConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a single file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.json").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let value = read_document(path.as_ref()).await?;
        Self::from_value(value, path.as_ref())
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Files that do
    /// not exist are skipped; with neither present the built-in defaults apply.
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut merged = serde_json::Value::Object(serde_json::Map::new());
        let mut loaded_any = false;
        let mut origin = PathBuf::from("<defaults>");

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let value = read_document(path).await?;
            merge_json(&mut merged, value);
            loaded_any = true;
            origin = path.to_path_buf();
        }

        if !loaded_any {
            info!("no config file found, using built-in defaults");
        }

        Self::from_value(merged, &origin)
    }

    fn from_value(value: serde_json::Value, path: &Path) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topics.is_empty() {
            return Err(ConfigError::Invalid("topics must not be empty".into()));
        }
        if self.articles_per_topic < 1 {
            return Err(ConfigError::Invalid(
                "articles_per_topic must be at least 1".into(),
            ));
        }
        if self.days_back > MAX_DAYS_BACK {
            return Err(ConfigError::Invalid(format!(
                "days_back must be at most {}",
                MAX_DAYS_BACK
            )));
        }
        if !is_valid_date_format(&self.date_format) {
            return Err(ConfigError::Invalid(format!(
                "date_format '{}' is not a valid strftime pattern",
                self.date_format
            )));
        }
        if self.email.enabled {
            if self.email.sender.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "email.sender is required when email is enabled".into(),
                ));
            }
            if self.email.recipient.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "email.recipient is required when email is enabled".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Read a config document into a JSON value. `.toml` files are parsed as TOML,
/// anything else as JSON.
async fn read_document(path: &Path) -> Result<serde_json::Value, ConfigError> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("toml"));

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    if is_toml {
        let val: toml::Value = toml::from_str(&data).map_err(|e| parse_err(e.to_string()))?;
        serde_json::to_value(val).map_err(|e| parse_err(e.to_string()))
    } else {
        serde_json::from_str(&data).map_err(|e| parse_err(e.to_string()))
    }
}

fn merge_json(a: &mut serde_json::Value, b: serde_json::Value) {
    match (a, b) {
        (serde_json::Value::Object(a_map), serde_json::Value::Object(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_json(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

fn is_valid_date_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn empty_document_yields_documented_defaults() {
        let cfg: Config = serde_json::from_str("{}").expect("parse config");
        assert_eq!(cfg.topics, vec!["general news".to_string()]);
        assert_eq!(cfg.articles_per_topic, 5);
        assert_eq!(cfg.days_back, 1);
        assert_eq!(cfg.max_tokens, 200);
        assert_eq!(cfg.model, "sonar");
        assert!(!cfg.email.enabled);
        assert!(!cfg.auto_save);
        assert!(cfg.validate().is_ok());
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.json");
        let override_path = dir.path().join("config.json");

        fs::write(
            &default_path,
            r#"{"topics": ["ai", "space"], "max_tokens": 300, "email": {"sender": "me@example.com"}}"#,
        )
        .expect("write default");
        fs::write(
            &override_path,
            r#"{"topics": ["rust"], "email": {"recipient": "you@example.com"}}"#,
        )
        .expect("write override");

        let cfg = Config::load_with_defaults(
            Some(default_path.as_path()),
            Some(override_path.as_path()),
        )
        .await
        .expect("load config");

        assert_eq!(cfg.topics, vec!["rust".to_string()]);
        assert_eq!(cfg.max_tokens, 300);
        assert_eq!(cfg.email.sender.as_deref(), Some("me@example.com"));
        assert_eq!(cfg.email.recipient.as_deref(), Some("you@example.com"));
    }

    #[tokio::test]
    async fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.json");

        let cfg = Config::load_with_defaults(None, Some(missing.as_path()))
            .await
            .expect("load config");
        assert_eq!(cfg, Config::default());
    }

    #[tokio::test]
    async fn toml_documents_are_accepted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            topics = ["climate"]
            articles_per_topic = 2

            [email]
            enabled = true
            sender = "me@example.com"
            recipient = "you@example.com"
            "#,
        )
        .expect("write toml");

        let cfg = Config::from_file(&path).await.expect("load toml");
        assert_eq!(cfg.topics, vec!["climate".to_string()]);
        assert_eq!(cfg.articles_per_topic, 2);
        assert!(cfg.email.enabled);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ topics: ").expect("write");

        let err = Config::from_file(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.articles_per_topic = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.days_back = 4_000_000_000;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.days_back = MAX_DAYS_BACK;
        assert!(cfg.validate().is_ok());

        let mut cfg = Config::default();
        cfg.date_format = "%Q".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.email.enabled = true;
        cfg.email.sender = Some("me@example.com".into());
        assert!(cfg.validate().is_err());
    }
}
