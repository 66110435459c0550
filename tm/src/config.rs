//! TripMind configuration types and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main TripMind configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Chat agent behavior
    pub agent: AgentConfig,

    /// Itinerary generation limits
    pub itinerary: GenerationConfig,

    /// Dispatch policy thresholds
    pub policy: PolicyConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// The API key is only required when something will actually call the LLM.
    pub fn validate(&self, needs_llm: bool) -> Result<()> {
        if needs_llm && std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable, or use --classifier rules for offline chat.",
                self.llm.api_key_env
            ));
        }
        if self.itinerary.max_days_per_generation == 0 {
            return Err(eyre::eyre!("itinerary.max-days-per-generation must be at least 1"));
        }
        if self.agent.max_tool_rounds == 0 {
            return Err(eyre::eyre!("agent.max-tool-rounds must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripmind.yml
        let local_config = PathBuf::from(".tripmind.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripmind/tripmind.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(".tripmind.yml"))
                .chain(user_config_path())
                .collect(),
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tripmind").join("tripmind.yml"))
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

/// Which intent classifier the chat agent uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// LLM tool calling
    #[default]
    Llm,
    /// Deterministic keyword rules, no network
    Rules,
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "rules" | "rule" => Ok(Self::Rules),
            _ => Err(format!("Unknown classifier: {}. Use: llm or rules", s)),
        }
    }
}

/// Chat agent behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub classifier: ClassifierKind,

    /// Classify/execute rounds allowed per user message
    #[serde(rename = "max-tool-rounds")]
    pub max_tool_rounds: u32,

    /// Messages of conversation kept as context
    #[serde(rename = "history-limit")]
    pub history_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::Llm,
            max_tool_rounds: 5,
            history_limit: 40,
        }
    }
}

/// Itinerary generation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Hard cap on days produced by one generation call
    #[serde(rename = "max-days-per-generation")]
    pub max_days_per_generation: u32,

    /// Trip length assumed when neither duration nor dates are known
    #[serde(rename = "default-trip-days")]
    pub default_trip_days: u32,

    /// Upper bound on a single generation call
    #[serde(rename = "generation-timeout-ms")]
    pub generation_timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_days_per_generation: 5,
            default_trip_days: 3,
            generation_timeout_ms: 90_000,
        }
    }
}

/// Dispatch policy thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Trips longer than this need explicit confirmation before creation
    #[serde(rename = "long-trip-confirm-days")]
    pub long_trip_confirm_days: i64,

    /// Approximate USD value of one unit of each currency
    #[serde(rename = "currency-rates")]
    pub currency_rates: BTreeMap<String, f64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let currency_rates = [("SGD", 0.74), ("EUR", 1.08), ("GBP", 1.27), ("AUD", 0.65), ("JPY", 0.0067)]
            .into_iter()
            .map(|(code, rate)| (code.to_string(), rate))
            .collect();
        Self {
            long_trip_confirm_days: 90,
            currency_rates,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store directory (or .db file)
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/tripmind on Linux)
        let db_path = dirs::data_dir()
            .map(|d| d.join("tripmind"))
            .unwrap_or_else(|| PathBuf::from(".tripstore"));

        Self { db_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.agent.max_tool_rounds, 5);
        assert_eq!(config.itinerary.max_days_per_generation, 5);
        assert_eq!(config.itinerary.default_trip_days, 3);
        assert_eq!(config.policy.long_trip_confirm_days, 90);
        assert_eq!(config.policy.currency_rates.get("SGD"), Some(&0.74));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 2048
  timeout-ms: 60000

agent:
  classifier: rules
  max-tool-rounds: 3
  history-limit: 10

itinerary:
  max-days-per-generation: 4
  generation-timeout-ms: 1000

policy:
  long-trip-confirm-days: 60

storage:
  db-path: /tmp/tripmind-test

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.agent.classifier, ClassifierKind::Rules);
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.itinerary.max_days_per_generation, 4);
        assert_eq!(config.itinerary.default_trip_days, 3);
        assert_eq!(config.policy.long_trip_confirm_days, 60);
        // Rates fall back to defaults when the key is absent
        assert_eq!(config.policy.currency_rates.len(), 5);
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/tripmind-test"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gpt-4.1
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.agent.classifier, ClassifierKind::Llm);
    }

    #[test]
    fn test_validate_requires_key_only_for_llm() {
        let mut config = Config::default();
        config.llm.api_key_env = "TRIPMIND_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        assert!(config.validate(false).is_ok());
        let err = config.validate(true).unwrap_err();
        assert!(err.to_string().contains("TRIPMIND_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_validate_rejects_zero_generation_cap() {
        let mut config = Config::default();
        config.itinerary.max_days_per_generation = 0;
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tm.yml");
        fs::write(&path, "log-level: warn\nagent:\n  classifier: rules\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.agent.classifier, ClassifierKind::Rules);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/tripmind.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_classifier_kind_from_str() {
        assert_eq!("LLM".parse::<ClassifierKind>().unwrap(), ClassifierKind::Llm);
        assert_eq!("rules".parse::<ClassifierKind>().unwrap(), ClassifierKind::Rules);
        assert!("magic".parse::<ClassifierKind>().is_err());
    }
}
