use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
    Debug,
    Info,
}

impl Severity {
    /// Rank used when ordering entries for selection: error=3, warn=2, debug=1, info=0.
    pub fn weight(self) -> u8 {
        match self {
            Severity::Error => 3,
            Severity::Warn => 2,
            Severity::Debug => 1,
            Severity::Info => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Debug => "debug",
            Severity::Info => "info",
        }
    }

    /// Maps a level token to a severity. Only the four known spellings (plus `warning`) match.
    pub fn from_level(level: &str) -> Option<Severity> {
        match level.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warn" | "warning" => Some(Severity::Warn),
            "debug" => Some(Severity::Debug),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::from_level(s).ok_or_else(|| format!("unknown severity: {s}"))
    }
}

/// Two-phase classification: an explicit level wins, otherwise the message is scanned
/// for keywords in fixed order (error/exception/fail, then warn, then debug).
pub fn classify(explicit_level: Option<&str>, message: &str) -> Severity {
    if let Some(sev) = explicit_level.and_then(Severity::from_level) {
        return sev;
    }
    let lower = message.to_lowercase();
    if lower.contains("error") || lower.contains("exception") || lower.contains("fail") {
        Severity::Error
    } else if lower.contains("warn") {
        Severity::Warn
    } else if lower.contains("debug") {
        Severity::Debug
    } else {
        Severity::Info
    }
}
