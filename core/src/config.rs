//! Configuration loading
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: the path given to the builder, else `SCENARIO_CONFIG_PATH`,
//!    else `scenario.toml` in the working directory (optional)
//! 3. The plain variables `LLM_API_KEY`, `LLM_BASE_URL`, `LLM_MODEL` and
//!    `HTTPS_PROXY` / `http_proxy`
//! 4. `SCENARIO__SECTION__KEY` variables, e.g. `SCENARIO__LLM__TIMEOUT_SECS=5`
//! 5. Explicit builder overrides (CLI flags)
//!
//! A `.env` file in the working directory is read into the environment first.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::SessionOptions;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "scenario.toml";

/// Variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SCENARIO_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    #[error("{key} must be set when the remote classifier is selected")]
    MissingSetting { key: &'static str },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/* ===================== Settings ===================== */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub llm: LlmConfig,
    pub session: SessionOptions,
}

/// Which classification backend a session talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Offline keyword matcher
    #[default]
    Local,
    /// OpenAI-compatible chat completion endpoint
    Remote,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Remote => "remote",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub backend: Backend,
}

/// Remote classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Either a bare host, a `/v1` root or a full `/chat/completions` URL
    pub base_url: Option<String>,
    pub model: String,
    pub proxy: Option<String>,
    pub timeout_secs: u64,
    /// Total attempts per classification, including the first one
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Wait after a 429 before trying again
    pub rate_limit_cooldown_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Use the keyword matcher when the remote call gives up
    pub fallback_to_local: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "deepseek-ai/DeepSeek-V3".to_string(),
            proxy: None,
            timeout_secs: 15,
            max_attempts: 3,
            retry_delay_ms: 1_000,
            rate_limit_cooldown_ms: 5_000,
            temperature: 0.1,
            max_tokens: 500,
            fallback_to_local: true,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    /// Worst-case time one classification can take before degrading.
    pub fn latency_bound(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let pause = self.retry_delay().max(self.rate_limit_cooldown());
        self.timeout() * attempts + pause * (attempts - 1)
    }
}

/* ===================== Loading ===================== */

impl Config {
    /// Load configuration from the default sources.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check cross-field requirements the deserializer can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.backend == Backend::Remote {
            if !is_set(&self.llm.api_key) {
                return Err(ConfigError::MissingSetting { key: "llm.api_key" });
            }
            if !is_set(&self.llm.base_url) {
                return Err(ConfigError::MissingSetting { key: "llm.base_url" });
            }
        }
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "llm.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "llm.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Effective configuration as TOML, with the API key masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if is_set(&shown.llm.api_key) {
            shown.llm.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Builder for loading configuration with explicit overrides
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    backend: Option<Backend>,
    skip_dotenv: bool,
}

impl ConfigBuilder {
    /// Read this file instead of searching for one. The file must exist.
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Force the classifier backend
    pub fn backend(mut self, backend: Option<Backend>) -> Self {
        self.backend = backend;
        self
    }

    /// Don't read `.env` from the working directory
    pub fn skip_dotenv(mut self) -> Self {
        self.skip_dotenv = true;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if !self.skip_dotenv {
            // A missing .env is normal
            let _ = dotenvy::dotenv();
        }

        let path = self
            .config_path
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let file = match &path {
            Some(path) => File::from(path.as_path())
                .format(FileFormat::Toml)
                .required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings = ::config::Config::builder()
            .add_source(file)
            .add_source(legacy_variables()?)
            .add_source(
                Environment::with_prefix("SCENARIO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("classifier.backend", self.backend.map(|b| b.as_str()))?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            file = ?path,
            backend = config.classifier.backend.as_str(),
            "loaded configuration"
        );
        Ok(config)
    }
}

/// The unprefixed variables the first deployments were configured with.
fn legacy_variables() -> Result<::config::Config, ::config::ConfigError> {
    let proxy = non_empty_var("HTTPS_PROXY")
        .or_else(|| non_empty_var("https_proxy"))
        .or_else(|| non_empty_var("HTTP_PROXY"))
        .or_else(|| non_empty_var("http_proxy"));

    ::config::Config::builder()
        .set_override_option("llm.api_key", non_empty_var("LLM_API_KEY"))?
        .set_override_option("llm.base_url", non_empty_var("LLM_BASE_URL"))?
        .set_override_option("llm.model", non_empty_var("LLM_MODEL"))?
        .set_override_option("llm.proxy", proxy)?
        .build()
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
