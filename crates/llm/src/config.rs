use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wikiscribe_common::{Result, ScribeError};

use crate::client::{LlmClient, http_client};
use crate::gemini::{GEMINI_DEFAULT_MODEL, GeminiClient};
use crate::groq::{GROQ_DEFAULT_MODEL, GroqClient};
use crate::retry::{RetryConfig, RetryingClient};

/// Environment variable selecting the default provider.
pub const DEFAULT_LLM_ENV: &str = "DEFAULT_LLM";

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    Gemini,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 2] = [LlmProvider::Groq, LlmProvider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "groq",
            LlmProvider::Gemini => "gemini",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn model_env(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_MODEL",
            LlmProvider::Gemini => "GEMINI_MODEL",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Groq => GROQ_DEFAULT_MODEL,
            LlmProvider::Gemini => GEMINI_DEFAULT_MODEL,
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "gemini" => Ok(LlmProvider::Gemini),
            other => Err(ScribeError::Config(format!(
                "Unknown LLM provider: {other} (expected groq or gemini)"
            ))),
        }
    }
}

/// Per-provider settings. Unset fields fall back to environment variables and
/// then to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override of the provider base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub default_provider: LlmProvider,

    #[serde(default)]
    pub groq: ProviderSettings,

    #[serde(default)]
    pub gemini: ProviderSettings,

    /// Request timeout for every provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: LlmProvider::default(),
            groq: ProviderSettings::default(),
            gemini: ProviderSettings::default(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Defaults, with `DEFAULT_LLM` selecting the default provider.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_default_provider()?;
        Ok(config)
    }

    /// Load from a TOML file. `DEFAULT_LLM` still overrides the file's provider.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| {
            ScribeError::Config(format!("Invalid config file '{}': {e}", path.display()))
        })?;

        if config.groq.api_key.is_some() || config.gemini.api_key.is_some() {
            warn!(
                "API key found in config file '{}'. Prefer GROQ_API_KEY / GEMINI_API_KEY \
                 environment variables.",
                path.display()
            );
        }

        config.apply_env_default_provider()?;
        info!(path = %path.display(), provider = %config.default_provider, "Loaded LLM configuration");
        Ok(config)
    }

    fn apply_env_default_provider(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(DEFAULT_LLM_ENV)
            && !value.trim().is_empty()
        {
            self.default_provider = value.parse()?;
        }
        Ok(())
    }

    pub fn settings(&self, provider: LlmProvider) -> &ProviderSettings {
        match provider {
            LlmProvider::Groq => &self.groq,
            LlmProvider::Gemini => &self.gemini,
        }
    }

    /// API key from config, else from the provider's environment variable.
    pub fn resolve_api_key(&self, provider: LlmProvider) -> Option<String> {
        self.settings(provider)
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                std::env::var(provider.api_key_env())
                    .ok()
                    .filter(|k| !k.is_empty())
            })
    }

    pub fn resolve_model(&self, provider: LlmProvider) -> String {
        self.settings(provider)
            .model
            .clone()
            .or_else(|| std::env::var(provider.model_env()).ok())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| provider.default_model().to_string())
    }
}

/// Build the retrying client for one provider. A missing API key is a
/// configuration error.
pub fn build_llm_client(config: &LlmConfig, provider: LlmProvider) -> Result<Arc<dyn LlmClient>> {
    let api_key = config.resolve_api_key(provider).ok_or_else(|| {
        ScribeError::Config(format!(
            "{provider} requires an API key (set {})",
            provider.api_key_env()
        ))
    })?;
    let model = config.resolve_model(provider);
    let http = http_client(Duration::from_secs(config.timeout_secs))?;
    let api_url = config.settings(provider).api_url.clone();

    let base_client: Box<dyn LlmClient> = match provider {
        LlmProvider::Groq => {
            let mut client = GroqClient::new(model, api_key).with_http_client(http);
            if let Some(url) = api_url {
                client = client.with_base_url(url);
            }
            Box::new(client)
        }
        LlmProvider::Gemini => {
            let mut client = GeminiClient::new(model, api_key).with_http_client(http);
            if let Some(url) = api_url {
                client = client.with_base_url(url);
            }
            Box::new(client)
        }
    };

    Ok(Arc::new(RetryingClient::new(base_client, config.retry.clone())))
}

/// Produces an LLM client for a provider on demand.
pub trait ClientFactory: Send + Sync {
    fn build(&self, provider: LlmProvider) -> Result<Arc<dyn LlmClient>>;

    fn default_provider(&self) -> LlmProvider;
}

/// Factory backed by an [`LlmConfig`].
pub struct ConfiguredClientFactory {
    config: LlmConfig,
}

impl ConfiguredClientFactory {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

impl ClientFactory for ConfiguredClientFactory {
    fn build(&self, provider: LlmProvider) -> Result<Arc<dyn LlmClient>> {
        build_llm_client(&self.config, provider)
    }

    fn default_provider(&self) -> LlmProvider {
        self.config.default_provider
    }
}
