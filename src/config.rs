use crate::group::AllowList;
use crate::i18n::Language;
use crate::TdigestError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct TdigestConfig {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub categories: CategoryConfig,
    #[serde(default)]
    pub todoist: TodoistConfig,
    #[serde(default)]
    pub summarization: SummarizationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Project-name prefixes for the three categories. All three must be set.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CategoryConfig {
    pub work: Option<String>,
    pub personal: Option<String>,
    pub tinker: Option<String>,
}

impl CategoryConfig {
    pub fn resolve(&self) -> Result<AllowList, TdigestError> {
        fn required(v: &Option<String>, name: &str) -> Result<String, TdigestError> {
            match v.as_deref() {
                Some(s) if !s.is_empty() => Ok(s.to_owned()),
                _ => Err(TdigestError::Config(format!(
                    "categories.{name} is not set (or set {}_PREFIX)",
                    name.to_ascii_uppercase()
                ))),
            }
        }
        Ok(AllowList {
            work: required(&self.work, "work")?,
            personal: required(&self.personal, "personal")?,
            tinker: required(&self.tinker, "tinker")?,
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TodoistConfig {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_sync_url")]
    pub sync_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            rest_url: default_rest_url(),
            sync_url: default_sync_url(),
            timeout_secs: default_http_timeout(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

fn default_rest_url() -> String {
    "https://api.todoist.com/rest/v2".into()
}

fn default_sync_url() -> String {
    "https://api.todoist.com/sync/v9".into()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizationConfig {
    #[serde(default = "default_summarization_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_summarization_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_summarization_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_weeks_of_context")]
    pub weeks_of_context: usize,
    #[serde(default = "default_summarization_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_summarization_endpoint(),
            model: default_summarization_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_summarization_timeout(),
            weeks_of_context: default_weeks_of_context(),
            max_retries: default_summarization_retries(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

fn default_summarization_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}

fn default_summarization_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_summarization_timeout() -> u64 {
    120
}

fn default_weeks_of_context() -> usize {
    4
}

fn default_summarization_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StorageConfig {
    /// Summary directory (default: ~/.tdigest/summaries).
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from: Option<String>,
    pub to: Option<String>,
    pub password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            from: None,
            to: None,
            password: None,
        }
    }
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".into()
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    /// When set, each run also writes execution_<timestamp>.log here.
    pub dir: Option<PathBuf>,
}

fn tdigest_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".tdigest")
}

impl TdigestConfig {
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(|| tdigest_home().join("summaries"))
    }
}

/// Load config from an explicit path, TDIGEST_CONFIG, ~/.tdigest/config.toml,
/// or defaults, then apply environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<TdigestConfig, TdigestError> {
    let mut config = match config_path(explicit) {
        Some(p) if p.exists() => {
            let content = std::fs::read_to_string(&p)?;
            toml::from_str(&content)
                .map_err(|e| TdigestError::Config(format!("{}: {e}", p.display())))?
        }
        Some(p) if explicit.is_some() => {
            return Err(TdigestError::Config(format!("{}: no such file", p.display())));
        }
        _ => TdigestConfig::default(),
    };
    apply_env(&mut config, |k| std::env::var(k).ok())?;
    Ok(config)
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("TDIGEST_CONFIG") {
        return Some(PathBuf::from(p));
    }
    Some(tdigest_home().join("config.toml"))
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Overlay environment variables. `lookup` is injectable for tests.
pub fn apply_env(
    config: &mut TdigestConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), TdigestError> {
    let get = |k: &str| lookup(k).filter(|v| !v.is_empty());

    if let Some(v) = get("TDIGEST_LANGUAGE") {
        config.language = Language::parse(&v)
            .ok_or_else(|| TdigestError::Config(format!("TDIGEST_LANGUAGE: unsupported {v:?}")))?;
    }
    if let Some(v) = get("WORK_PREFIX") {
        config.categories.work = Some(v);
    }
    if let Some(v) = get("PERSONAL_PREFIX") {
        config.categories.personal = Some(v);
    }
    if let Some(v) = get("TINKER_PREFIX") {
        config.categories.tinker = Some(v);
    }
    if let Some(v) = get("TODOIST_API_TOKEN") {
        config.todoist.api_token = Some(v);
    }
    if let Some(v) = get("OPENAI_API_KEY") {
        config.summarization.api_key = Some(v);
    }
    if let Some(v) = get("OPENAI_MODEL") {
        config.summarization.model = v;
    }
    if let Some(v) = get("WEEKS_OF_CONTEXT") {
        config.summarization.weeks_of_context = v
            .parse()
            .map_err(|e| TdigestError::Config(format!("WEEKS_OF_CONTEXT: {e}")))?;
    }
    if let Some(v) = get("SMTP_SERVER") {
        config.email.smtp_server = v;
    }
    if let Some(v) = get("SMTP_PORT") {
        config.email.smtp_port = v
            .parse()
            .map_err(|e| TdigestError::Config(format!("SMTP_PORT: {e}")))?;
    }
    if let Some(v) = get("EMAIL_FROM") {
        config.email.from = Some(v);
    }
    if let Some(v) = get("EMAIL_TO") {
        config.email.to = Some(v);
    }
    if let Some(v) = get("SMTP_PASSWORD") {
        config.email.password = Some(v);
    }
    if let Some(v) = get("EMAIL_SEND") {
        config.email.enabled = parse_bool(&v);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn default_config_when_no_file() {
        let config = TdigestConfig::default();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.summarization.model, "gpt-4o-mini");
        assert_eq!(config.summarization.weeks_of_context, 4);
        assert_eq!(config.todoist.max_retries, 3);
        assert_eq!(config.email.smtp_port, 587);
        assert!(!config.email.enabled);
        assert!(config.categories.resolve().is_err());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
language = "fr"

[categories]
work = "ECL"
personal = "Perso"
tinker = "Tinker"

[todoist]
api_token = "tok"
max_retries = 5

[summarization]
model = "gpt-4o"
temperature = 0.2
weeks_of_context = 2
max_retries = 0

[storage]
dir = "/var/lib/tdigest"

[email]
enabled = true
from = "me@example.com"
to = "me@example.com"

[logging]
dir = "/var/log/tdigest"
"#;
        let config: TdigestConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.language, Language::Fr);
        let allow = config.categories.resolve().unwrap();
        assert!(allow.contains("ECL"));
        assert!(allow.contains("Perso"));
        assert!(!allow.contains("Other"));
        assert_eq!(config.todoist.api_token.as_deref(), Some("tok"));
        assert_eq!(config.todoist.max_retries, 5);
        assert_eq!(config.todoist.backoff_secs, 1);
        assert_eq!(config.summarization.model, "gpt-4o");
        assert_eq!(config.summarization.max_tokens, 2000);
        assert_eq!(config.summarization.max_retries, 0);
        assert_eq!(config.summarization.backoff_secs, 1);
        assert_eq!(config.storage_dir(), PathBuf::from("/var/lib/tdigest"));
        assert!(config.email.enabled);
        assert_eq!(config.email.smtp_server, "smtp.gmail.com");
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/tdigest")));
    }

    #[test]
    fn partial_categories_fail_fast() {
        let config: TdigestConfig = toml::from_str(
            r#"
[categories]
work = "Work"
personal = "Personal"
"#,
        )
        .unwrap();
        let err = config.categories.resolve().unwrap_err();
        assert!(err.to_string().contains("tinker"), "{err}");
    }

    #[test]
    fn empty_category_is_missing() {
        let categories = CategoryConfig {
            work: Some("Work".into()),
            personal: Some(String::new()),
            tinker: Some("Tinker".into()),
        };
        assert!(categories.resolve().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: TdigestConfig = toml::from_str(
            r#"
[categories]
work = "FromFile"

[summarization]
model = "file-model"
"#,
        )
        .unwrap();
        apply_env(
            &mut config,
            env(&[
                ("WORK_PREFIX", "Work"),
                ("PERSONAL_PREFIX", "Personal"),
                ("TINKER_PREFIX", "Tinker"),
                ("OPENAI_MODEL", "env-model"),
                ("WEEKS_OF_CONTEXT", "6"),
                ("EMAIL_SEND", "true"),
                ("SMTP_PORT", "2525"),
                ("TDIGEST_LANGUAGE", "fr"),
            ]),
        )
        .unwrap();
        let allow = config.categories.resolve().unwrap();
        assert_eq!(allow.work, "Work");
        assert_eq!(config.summarization.model, "env-model");
        assert_eq!(config.summarization.weeks_of_context, 6);
        assert!(config.email.enabled);
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.language, Language::Fr);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = TdigestConfig::default();
        config.categories.work = Some("Work".into());
        apply_env(&mut config, env(&[("WORK_PREFIX", "")])).unwrap();
        assert_eq!(config.categories.work.as_deref(), Some("Work"));
    }

    #[test]
    fn bad_env_numbers_are_config_errors() {
        let mut config = TdigestConfig::default();
        let err = apply_env(&mut config, env(&[("SMTP_PORT", "abc")])).unwrap_err();
        assert!(matches!(err, TdigestError::Config(_)));
        let err = apply_env(&mut config, env(&[("TDIGEST_LANGUAGE", "klingon")])).unwrap_err();
        assert!(matches!(err, TdigestError::Config(_)));
    }

    #[test]
    fn email_send_falsey_values() {
        let mut config = TdigestConfig::default();
        config.email.enabled = true;
        apply_env(&mut config, env(&[("EMAIL_SEND", "0")])).unwrap();
        assert!(!config.email.enabled);
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/tdigest.toml"))).unwrap_err();
        assert!(err.to_string().contains("no such file"), "{err}");
    }
}
