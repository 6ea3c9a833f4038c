use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// Log source or summarizer unreachable, or answered with a non-success status.
    #[error("{context} transport error: {message}")]
    Transport { context: &'static str, message: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TriageError {
    pub fn transport(context: &'static str, message: impl Into<String>) -> Self {
        TriageError::Transport { context, message: message.into() }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, TriageError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
