use crate::error::{Result, TriageError};
use crate::priority::SelectionCaps;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_API_KEY_ENV: &str = "LOGTRIAGE_API_KEY";

/// Hosts whose traffic is never ingested as a diagnostic, in addition to the
/// summarizer backend.
pub const LOOPBACK_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "[::1]", "0.0.0.0"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub summarizer: SummarizerConfig,
    pub source: SourceConfig,
    pub realtime: RealtimeConfig,
    pub selection: SelectionCaps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    pub model: String,
    /// Inline key; takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl SummarizerConfig {
    /// Inline key first, then the configured environment variable. Blank keys count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Host part of the endpoint, used to keep our own traffic out of the realtime buffer.
    pub fn backend_host(&self) -> Option<String> {
        reqwest::Url::parse(&self.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the log endpoint; `None` means logs come from a file or stdin.
    pub url: Option<String>,
    pub default_limit: usize,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { url: None, default_limit: 500, timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub buffer_capacity: usize,
    /// Extra substrings; a network event whose URL contains one is dropped.
    pub ignored_urls: Vec<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self { buffer_capacity: 500, ignored_urls: Vec::new() }
    }
}

impl TriageConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TriageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.summarizer.endpoint.trim().is_empty() {
            return Err(TriageError::Configuration("summarizer.endpoint is empty".into()));
        }
        if reqwest::Url::parse(&self.summarizer.endpoint).is_err() {
            return Err(TriageError::Configuration(format!(
                "summarizer.endpoint is not a valid URL: {}",
                self.summarizer.endpoint
            )));
        }
        Ok(())
    }

    /// Substrings the realtime noise filter discards: backend host, loopback, configured extras.
    pub fn noise_substrings(&self) -> Vec<String> {
        let mut out: Vec<String> = self.summarizer.backend_host().into_iter().collect();
        out.extend(LOOPBACK_HOSTS.iter().map(|h| h.to_string()));
        out.extend(self.realtime.ignored_urls.iter().cloned());
        out
    }
}
