//! Configuration loading and provider settings resolution.
//!
//! Config files (`.json`, `.yaml`/`.yml`, `.toml`) deserialize into
//! [`AppConfig`]. Provider settings are resolved once per provider from the
//! raw [`ApiConfig`], then the environment, then built-in defaults, in that
//! order. This module is the only place the process environment is read.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use deepcision_core::llm::manager::ConfigSource;
use deepcision_core::llm::params::{GenerationLimits, clamp_temperature, validate_max_tokens};
use deepcision_types::config::{ApiConfig, AppConfig};
use deepcision_types::error::{ConfigError, ProviderError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEEPSEEK_LIMITS: GenerationLimits = GenerationLimits::new(1, 8192);

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-4";
pub const OPENROUTER_DEFAULT_TEMPERATURE: f64 = 0.7;
pub const OPENROUTER_DEFAULT_MAX_TOKENS: u32 = 2000;
pub const OPENROUTER_DEFAULT_MAX_RETRIES: u32 = 3;
pub const OPENROUTER_DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;
pub const OPENROUTER_LIMITS: GenerationLimits = GenerationLimits::new(1, 32_000);

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com/v1";

/// Read access to environment variables.
pub trait Env: Send + Sync {
    /// Value of `key`, with empty values treated as unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

fn env_parse<T>(env: &impl Env, key: &str) -> Result<Option<T>, ProviderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ProviderError::configuration(format!("invalid {key} '{raw}': {e}"))),
        None => Ok(None),
    }
}

fn retry_delay(seconds: f64) -> Result<Duration, ProviderError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProviderError::configuration(format!(
            "retry delay must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn request_timeout(seconds: u64) -> Result<Duration, ProviderError> {
    if seconds == 0 {
        return Err(ProviderError::configuration("timeout must be at least 1 second"));
    }
    Ok(Duration::from_secs(seconds))
}

/// Env-var-safe form of a model name (`deepseek-chat` -> `DEEPSEEK_CHAT`).
fn env_key_fragment(model: &str) -> String {
    model
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Fully resolved DeepSeek settings.
#[derive(Debug)]
pub struct DeepSeekSettings {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl DeepSeekSettings {
    /// Resolve from config, then `DEEPSEEK_*` env vars, then defaults.
    ///
    /// Default generation parameters depend on the model: `deepseek-chat`
    /// uses 0.7 / 2000, every other model 0.3 / 1500. They can be overridden
    /// per model with `DEEPSEEK_<MODEL>_TEMPERATURE` and
    /// `DEEPSEEK_<MODEL>_MAX_TOKENS`.
    pub fn resolve(config: &ApiConfig, env: &impl Env) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env.var("DEEPSEEK_API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::configuration(
                    "DeepSeek API key not found, set DEEPSEEK_API_KEY or pass it in config",
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .or_else(|| env.var("DEEPSEEK_API_BASE_URL"))
            .unwrap_or_else(|| DEEPSEEK_BASE_URL.to_string());

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEEPSEEK_DEFAULT_MODEL.to_string());

        let timeout_secs = match config.timeout {
            Some(t) => t,
            None => env_parse(env, "DEEPSEEK_API_TIMEOUT")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let is_chat = model == DEEPSEEK_DEFAULT_MODEL;
        let fragment = env_key_fragment(&model);
        let temperature = match config.temperature {
            Some(t) => t,
            None => env_parse(env, &format!("DEEPSEEK_{fragment}_TEMPERATURE"))?
                .unwrap_or(if is_chat { 0.7 } else { 0.3 }),
        };
        let max_tokens = match config.max_tokens {
            Some(n) => n,
            None => env_parse(env, &format!("DEEPSEEK_{fragment}_MAX_TOKENS"))?
                .unwrap_or(if is_chat { 2000 } else { 1500 }),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout: request_timeout(timeout_secs)?,
            temperature: clamp_temperature(temperature),
            max_tokens: validate_max_tokens(max_tokens, &DEEPSEEK_LIMITS)?,
        })
    }
}

/// Fully resolved OpenRouter settings.
#[derive(Debug)]
pub struct OpenRouterSettings {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f64,
    pub max_tokens: u32,
    pub http_referer: Option<String>,
    pub x_title: Option<String>,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// Check an OpenRouter key is present and has a known prefix.
pub fn validate_openrouter_key(key: Option<&str>) -> Result<&str, ProviderError> {
    let key = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProviderError::configuration("OpenRouter API key not found"))?;
    if !(key.starts_with("sk-or-") || key.starts_with("sk-")) {
        return Err(ProviderError::configuration("Invalid OpenRouter API key format"));
    }
    Ok(key)
}

impl OpenRouterSettings {
    /// Resolve from config, then `OPENROUTER_*` env vars, then defaults.
    pub fn resolve(config: &ApiConfig, env: &impl Env) -> Result<Self, ProviderError> {
        let raw_key = config.api_key.clone().or_else(|| env.var("OPENROUTER_API_KEY"));
        let api_key = validate_openrouter_key(raw_key.as_deref())?.to_string();

        let base_url = config
            .base_url
            .clone()
            .or_else(|| env.var("OPENROUTER_API_BASE_URL"))
            .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string());

        let model = config
            .model
            .clone()
            .or_else(|| env.var("OPENROUTER_DEFAULT_MODEL"))
            .unwrap_or_else(|| OPENROUTER_DEFAULT_MODEL.to_string());

        let timeout_secs = match config.timeout {
            Some(t) => t,
            None => env_parse(env, "OPENROUTER_API_TIMEOUT")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let temperature = match config.temperature {
            Some(t) => t,
            None => env_parse(env, "OPENROUTER_DEFAULT_TEMPERATURE")?
                .unwrap_or(OPENROUTER_DEFAULT_TEMPERATURE),
        };
        let max_tokens = match config.max_tokens {
            Some(n) => n,
            None => env_parse(env, "OPENROUTER_DEFAULT_MAX_TOKENS")?
                .unwrap_or(OPENROUTER_DEFAULT_MAX_TOKENS),
        };
        let max_retries = match config.max_retries {
            Some(n) => n,
            None => env_parse(env, "OPENROUTER_MAX_RETRIES")?
                .unwrap_or(OPENROUTER_DEFAULT_MAX_RETRIES),
        };
        let delay_secs = match config.retry_delay {
            Some(d) => d,
            None => env_parse(env, "OPENROUTER_RETRY_DELAY")?
                .unwrap_or(OPENROUTER_DEFAULT_RETRY_DELAY_SECS),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout: request_timeout(timeout_secs)?,
            temperature: clamp_temperature(temperature),
            max_tokens: validate_max_tokens(max_tokens, &OPENROUTER_LIMITS)?,
            http_referer: config
                .http_referer
                .clone()
                .or_else(|| env.var("OPENROUTER_SITE_URL")),
            x_title: config.x_title.clone().or_else(|| env.var("OPENROUTER_SITE_NAME")),
            max_retries,
            retry_delay: retry_delay(delay_secs)?,
        })
    }
}

/// Resolved Tavily search settings.
#[derive(Debug)]
pub struct TavilySettings {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout: Duration,
}

impl TavilySettings {
    pub fn resolve(config: &ApiConfig, env: &impl Env) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env.var("TAVILY_API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::configuration("Tavily API key not found"))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| TAVILY_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: request_timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Toml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("json") => Ok(Format::Json),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string())),
    }
}

/// Top-level keys that mark a structured [`AppConfig`] file.
const APP_CONFIG_KEYS: [&str; 5] = ["providers", "role_templates", "roles", "server", "tokenizer"];

/// Parse config file contents.
///
/// A file with none of the [`AppConfig`] top-level keys is read as a flat
/// `name -> ApiConfig` map, e.g. `{"deepseek": {"timeout": 60}}`.
pub fn parse_app_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    };

    let value: serde_json::Value = match format_of(path)? {
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Yaml => serde_yaml_ng::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
    };

    let structured = value
        .as_object()
        .is_some_and(|obj| obj.keys().any(|k| APP_CONFIG_KEYS.contains(&k.as_str())));
    if structured || value.is_null() {
        let value = if value.is_null() { serde_json::json!({}) } else { value };
        serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))
    } else {
        let providers: BTreeMap<String, ApiConfig> =
            serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
        Ok(AppConfig {
            providers,
            ..Default::default()
        })
    }
}

/// Load an [`AppConfig`] from `path`, choosing the format by extension.
pub async fn load_app_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let config = parse_app_config(&content, path)?;
    tracing::debug!(
        path = %path.display(),
        providers = config.providers.len(),
        "loaded config"
    );
    Ok(config)
}

/// Load `path` if given and present, otherwise fall back to defaults.
///
/// A missing file logs at debug level; an unreadable or malformed one logs
/// a warning. Neither is fatal.
pub async fn load_app_config_or_default(path: Option<&Path>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };
    match load_app_config(path).await {
        Ok(config) => config,
        Err(ConfigError::Read { .. }) if !path.exists() => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            AppConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            AppConfig::default()
        }
    }
}

/// Write `config` to `path` in the format implied by its extension.
pub async fn save_app_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let ser_err = |message: String| ConfigError::Write {
        path: path.display().to_string(),
        message,
    };
    let content = match format_of(path)? {
        Format::Json => serde_json::to_string_pretty(config).map_err(|e| ser_err(e.to_string()))?,
        Format::Yaml => serde_yaml_ng::to_string(config).map_err(|e| ser_err(e.to_string()))?,
        Format::Toml => toml::to_string_pretty(config).map_err(|e| ser_err(e.to_string()))?,
    };
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// [`ConfigSource`] over a loaded config file plus the environment.
///
/// A provider with no file entry still counts as configured when its
/// `<NAME>_API_KEY` variable is set.
pub struct FileConfigSource<E: Env = ProcessEnv> {
    providers: BTreeMap<String, ApiConfig>,
    env: E,
}

impl FileConfigSource<ProcessEnv> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_env(config, ProcessEnv)
    }
}

impl<E: Env> FileConfigSource<E> {
    pub fn with_env(config: &AppConfig, env: E) -> Self {
        Self {
            providers: config.providers.clone(),
            env,
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E: Env> ConfigSource for FileConfigSource<E> {
    fn get_config(&self, name: &str) -> Option<ApiConfig> {
        if let Some(config) = self.providers.get(name) {
            return Some(config.clone());
        }
        let key_var = format!("{}_API_KEY", name.to_uppercase());
        self.env.var(&key_var).map(|_| ApiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn deepseek_missing_key_is_configuration_error() {
        let err = DeepSeekSettings::resolve(&ApiConfig::default(), &env(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration { .. }));
    }

    #[test]
    fn deepseek_defaults_for_chat_model() {
        let settings =
            DeepSeekSettings::resolve(&ApiConfig::default(), &env(&[("DEEPSEEK_API_KEY", "sk-ds")]))
                .unwrap();
        assert_eq!(settings.api_key.expose_secret(), "sk-ds");
        assert_eq!(settings.base_url, DEEPSEEK_BASE_URL);
        assert_eq!(settings.model, "deepseek-chat");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 2000);
    }

    #[test]
    fn deepseek_defaults_for_reasoner_and_model_env_overrides() {
        let config = ApiConfig {
            api_key: Some("sk-ds".into()),
            model: Some("deepseek-reasoner".into()),
            ..Default::default()
        };
        let settings = DeepSeekSettings::resolve(&config, &env(&[])).unwrap();
        assert_eq!(settings.temperature, 0.3);
        assert_eq!(settings.max_tokens, 1500);

        let overrides = env(&[
            ("DEEPSEEK_DEEPSEEK_REASONER_TEMPERATURE", "0.9"),
            ("DEEPSEEK_DEEPSEEK_REASONER_MAX_TOKENS", "4000"),
            ("DEEPSEEK_API_TIMEOUT", "45"),
        ]);
        let settings = DeepSeekSettings::resolve(&config, &overrides).unwrap();
        assert_eq!(settings.temperature, 0.9);
        assert_eq!(settings.max_tokens, 4000);
        assert_eq!(settings.timeout, Duration::from_secs(45));
    }

    #[test]
    fn deepseek_config_wins_over_env() {
        let config = ApiConfig {
            api_key: Some("sk-config".into()),
            base_url: Some("http://localhost:9999/".into()),
            timeout: Some(5),
            ..Default::default()
        };
        let env = env(&[
            ("DEEPSEEK_API_KEY", "sk-env"),
            ("DEEPSEEK_API_BASE_URL", "http://env"),
            ("DEEPSEEK_API_TIMEOUT", "99"),
        ]);
        let settings = DeepSeekSettings::resolve(&config, &env).unwrap();
        assert_eq!(settings.api_key.expose_secret(), "sk-config");
        assert_eq!(settings.base_url, "http://localhost:9999");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn deepseek_invalid_env_number_is_configuration_error() {
        let err = DeepSeekSettings::resolve(
            &ApiConfig::default(),
            &env(&[("DEEPSEEK_API_KEY", "sk"), ("DEEPSEEK_API_TIMEOUT", "soon")]),
        )
        .unwrap_err();
        assert!(err.message().contains("DEEPSEEK_API_TIMEOUT"));
    }

    #[test]
    fn openrouter_key_validation() {
        assert_eq!(
            validate_openrouter_key(None).unwrap_err().message(),
            "OpenRouter API key not found"
        );
        assert_eq!(
            validate_openrouter_key(Some("pk-123")).unwrap_err().message(),
            "Invalid OpenRouter API key format"
        );
        assert!(validate_openrouter_key(Some("sk-or-v1-abc")).is_ok());
        assert!(validate_openrouter_key(Some("sk-abc")).is_ok());
    }

    #[test]
    fn openrouter_defaults() {
        let settings = OpenRouterSettings::resolve(
            &ApiConfig::default(),
            &env(&[("OPENROUTER_API_KEY", "sk-or-v1-test")]),
        )
        .unwrap();
        assert_eq!(settings.base_url, OPENROUTER_BASE_URL);
        assert_eq!(settings.model, "openai/gpt-4");
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 2000);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.retry_delay, Duration::from_secs(1));
        assert!(settings.http_referer.is_none());
        assert!(settings.x_title.is_none());
    }

    #[test]
    fn openrouter_env_overlay() {
        let settings = OpenRouterSettings::resolve(
            &ApiConfig::default(),
            &env(&[
                ("OPENROUTER_API_KEY", "sk-or-v1-test"),
                ("OPENROUTER_SITE_URL", "https://deepcision.dev"),
                ("OPENROUTER_SITE_NAME", "Deepcision"),
                ("OPENROUTER_MAX_RETRIES", "5"),
                ("OPENROUTER_RETRY_DELAY", "0.25"),
                ("OPENROUTER_DEFAULT_MODEL", "deepseek/deepseek-chat"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.http_referer.as_deref(), Some("https://deepcision.dev"));
        assert_eq!(settings.x_title.as_deref(), Some("Deepcision"));
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.retry_delay, Duration::from_millis(250));
        assert_eq!(settings.model, "deepseek/deepseek-chat");
    }

    #[test]
    fn openrouter_rejects_out_of_range_default_max_tokens() {
        let config = ApiConfig {
            api_key: Some("sk-or-v1-test".into()),
            max_tokens: Some(64_000),
            ..Default::default()
        };
        let err = OpenRouterSettings::resolve(&config, &env(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration { .. }));
    }

    #[test]
    fn openrouter_rejects_negative_retry_delay() {
        let config = ApiConfig {
            api_key: Some("sk-or-v1-test".into()),
            retry_delay: Some(-1.0),
            ..Default::default()
        };
        assert!(OpenRouterSettings::resolve(&config, &env(&[])).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ApiConfig {
            api_key: Some("sk-ds".into()),
            timeout: Some(0),
            ..Default::default()
        };
        let err = DeepSeekSettings::resolve(&config, &env(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration { .. }));

        let err = OpenRouterSettings::resolve(
            &ApiConfig::default(),
            &env(&[("OPENROUTER_API_KEY", "sk-or-v1-test"), ("OPENROUTER_API_TIMEOUT", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration { .. }));

        let config = ApiConfig {
            api_key: Some("tvly-1".into()),
            timeout: Some(0),
            ..Default::default()
        };
        assert!(TavilySettings::resolve(&config, &env(&[])).is_err());
    }

    #[test]
    fn tavily_requires_key() {
        assert!(TavilySettings::resolve(&ApiConfig::default(), &env(&[])).is_err());
        let settings =
            TavilySettings::resolve(&ApiConfig::default(), &env(&[("TAVILY_API_KEY", "tvly-1")]))
                .unwrap();
        assert_eq!(settings.base_url, TAVILY_BASE_URL);
    }

    #[test]
    fn parse_flat_legacy_json() {
        let config = parse_app_config(
            r#"{"deepseek": {"timeout": 60, "base_url": "https://api.deepseek.com"}}"#,
            Path::new("config.json"),
        )
        .unwrap();
        assert_eq!(config.providers["deepseek"].timeout, Some(60));
    }

    #[test]
    fn parse_structured_yaml() {
        let yaml = "providers:\n  openrouter:\n    x_title: Deepcision\nserver:\n  port: 8080\n";
        let config = parse_app_config(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(
            config.providers["openrouter"].x_title.as_deref(),
            Some("Deepcision")
        );
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn parse_rejects_unknown_extension() {
        let err = parse_app_config("{}", Path::new("config.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[tokio::test]
    async fn load_missing_file_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        assert!(load_app_config(&path).await.is_err());
        let config = load_app_config_or_default(Some(&path)).await;
        assert!(config.providers.is_empty());
    }

    #[tokio::test]
    async fn load_invalid_file_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        tokio::fs::write(&path, "this is not { valid json").await.unwrap();
        assert!(matches!(
            load_app_config(&path).await.unwrap_err(),
            ConfigError::Parse { .. }
        ));
        assert_eq!(load_app_config_or_default(Some(&path)).await, AppConfig::default());
    }

    #[tokio::test]
    async fn save_then_load_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = AppConfig::default();
        config.providers.insert(
            "deepseek".into(),
            ApiConfig {
                timeout: Some(12),
                ..Default::default()
            },
        );
        save_app_config(&path, &config).await.unwrap();
        let loaded = load_app_config(&path).await.unwrap();
        assert_eq!(loaded.providers["deepseek"].timeout, Some(12));
    }

    #[test]
    fn file_config_source_falls_back_to_env_key() {
        let mut app = AppConfig::default();
        app.providers.insert("deepseek".into(), ApiConfig::default());

        let source = FileConfigSource::with_env(&app, env(&[("OPENROUTER_API_KEY", "sk-or-1")]));
        assert!(source.get_config("deepseek").is_some());
        assert!(source.get_config("openrouter").is_some());

        let source = FileConfigSource::with_env(&app, env(&[]));
        assert!(source.get_config("openrouter").is_none());
    }
}
