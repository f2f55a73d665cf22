use evaluation::batch::BatchConfig;
use evaluation::metric::MetricConfig;
use evaluation::verifier::VerifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Chat API dialect spoken by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// Ollama native `/api/chat`
    Ollama,
    /// OpenAI-compatible `/chat/completions` (llama.cpp, vLLM, proxies)
    OpenAi,
}

impl ApiFlavor {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

/// Model inference endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub model: String,
    pub flavor: ApiFlavor,
    pub api_key: Option<String>,
    pub temperature: f64,
    /// Context window requested from Ollama
    pub num_ctx: u32,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("J2K_ENDPOINT_URL")
                .unwrap_or_else(|_| "http://localhost:11434".into()),
            model: std::env::var("J2K_MODEL").unwrap_or_else(|_| "deepseek-r1:8b".into()),
            flavor: std::env::var("J2K_API_FLAVOR")
                .ok()
                .and_then(|v| ApiFlavor::from_env_value(&v))
                .unwrap_or(ApiFlavor::Ollama),
            api_key: std::env::var("J2K_API_KEY").ok(),
            temperature: 0.0,
            num_ctx: 16384,
            timeout_secs: 600,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the chat call for this flavor.
    pub fn chat_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        match self.flavor {
            ApiFlavor::Ollama => format!("{base}/api/chat"),
            ApiFlavor::OpenAi => format!("{base}/chat/completions"),
        }
    }
}

/// Top-level configuration.
///
/// Defaults come from the environment; a TOML file may override any
/// section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct J2kConfig {
    pub endpoint: EndpointConfig,
    pub batch: BatchConfig,
    /// Auto-detected from the project when absent
    pub verifier: Option<VerifierConfig>,
    pub metric: MetricConfig,
}

impl J2kConfig {
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or from the environment alone when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Verifier settings for the configured project
    pub fn verifier_config(&self) -> VerifierConfig {
        self.verifier
            .clone()
            .unwrap_or_else(|| VerifierConfig::detect(&self.batch.project_root))
    }
}
