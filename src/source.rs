use crate::config::SourceConfig;
use crate::error::{Result, TriageError};
use crate::grammar::LogType;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Supplies raw log text for one log type, bounded to roughly `limit` lines.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch(&self, log_type: LogType, limit: usize) -> Result<String>;
}

/// `GET {url}?type=<log type>&limit=<n>` answering `{"logs": "<raw text>"}`.
pub struct HttpLogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpLogSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("logtriage/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| TriageError::Configuration("source.url is not set".into()))?;
        Self::new(url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch(&self, log_type: LogType, limit: usize) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("type", log_type.as_str().to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| TriageError::transport("log source", format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TriageError::transport("log source", format!("failed to read response: {e}")))?;
        debug!("log source response: HTTP {} ({} bytes)", status, text.len());
        if !status.is_success() {
            return Err(TriageError::transport("log source", format!("HTTP {status}: {text}")));
        }

        Ok(extract_logs(&text).unwrap_or_else(|| {
            warn!("log source response has no \"logs\" field; treating as empty");
            String::new()
        }))
    }
}

fn extract_logs(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body).ok()?.get("logs")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

/// Reads a local file (`-` for stdin) and keeps its last `limit` lines. The log type
/// does not select anything here; the caller parses with the matching grammar.
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    async fn fetch(&self, log_type: LogType, limit: usize) -> Result<String> {
        let text = if self.path.as_os_str() == "-" {
            let mut s = String::new();
            tokio::io::stdin().read_to_string(&mut s).await?;
            s
        } else {
            tokio::fs::read_to_string(&self.path).await?
        };
        debug!(path = %self.path.display(), %log_type, limit, "read log file");
        Ok(tail_lines(&text, limit))
    }
}

/// Last `limit` lines of `text`, joined with `\n`.
pub fn tail_lines(text: &str, limit: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(limit);
    lines[start..].join("\n")
}
