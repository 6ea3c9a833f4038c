use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sortable form every grammar normalizes to: `YYYY-MM-DD HH:MM:SS,mmm`.
pub const SORTABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Server,
    Application,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Server => "server",
            LogType::Application => "application",
        }
    }

    pub fn grammar(self) -> LogGrammar {
        match self {
            LogType::Server => LogGrammar::Server,
            LogType::Application => LogGrammar::Application,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(LogType::Server),
            "application" | "app" => Ok(LogType::Application),
            other => Err(format!("unknown log type: {other}")),
        }
    }
}

/// Fields captured from a primary line, before severity classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryLine {
    pub timestamp: String,
    pub thread: String,
    pub level: String,
    pub request_id: String,
    pub project_path: String,
    pub app_id: String,
    pub component: String,
    pub message: String,
}

// timestamp thread level requestId projectPath [component] - message
static RE_SERVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<ts>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}[,.]\d{3})\s+(?P<thread>\S+)\s+(?P<level>\S+)\s+(?P<request>\S+)\s+(?P<project>\S+)\s+\[(?P<component>[^\]]*)\](?:\s+-\s?(?P<message>.*))?$",
    )
    .unwrap()
});

// timestamp -projectPath -appId thread level [component] - message
static RE_APPLICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<ts>\d{2}-[A-Za-z]{3}-\d{4} \d{2}:\d{2}:\d{2}[,.]\d{3}|\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}[,.]\d{3})\s+(?P<project>-\S*)\s+(?P<app>-\S*)\s+(?P<thread>\S+)\s+(?P<level>\S+)\s+\[(?P<component>[^\]]*)\](?:\s+-\s?(?P<message>.*))?$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogGrammar {
    Server,
    Application,
}

impl LogGrammar {
    /// Matches `line` against this grammar's primary pattern. Lines whose timestamp
    /// cannot be normalized are not primary lines.
    pub fn parse_primary_line(self, line: &str) -> Option<PrimaryLine> {
        let line = line.trim_end();
        match self {
            LogGrammar::Server => {
                let caps = RE_SERVER.captures(line)?;
                Some(PrimaryLine {
                    timestamp: self.normalize_timestamp(&caps["ts"])?,
                    thread: caps["thread"].to_string(),
                    level: caps["level"].to_string(),
                    request_id: caps["request"].to_string(),
                    project_path: caps["project"].to_string(),
                    app_id: String::new(),
                    component: caps["component"].trim().to_string(),
                    message: message_of(&caps),
                })
            }
            LogGrammar::Application => {
                let caps = RE_APPLICATION.captures(line)?;
                Some(PrimaryLine {
                    timestamp: self.normalize_timestamp(&caps["ts"])?,
                    thread: caps["thread"].to_string(),
                    level: caps["level"].to_string(),
                    request_id: String::new(),
                    project_path: strip_dash(&caps["project"]),
                    app_id: strip_dash(&caps["app"]),
                    component: caps["component"].trim().to_string(),
                    message: message_of(&caps),
                })
            }
        }
    }

    /// Converts a grammar-native timestamp to `YYYY-MM-DD HH:MM:SS,mmm`.
    pub fn normalize_timestamp(self, raw: &str) -> Option<String> {
        let dotted = raw.trim().replace(',', ".");
        let fmts: &[&str] = match self {
            LogGrammar::Server => &["%Y-%m-%d %H:%M:%S%.f"],
            LogGrammar::Application => &["%d-%b-%Y %H:%M:%S%.f", "%Y/%m/%d %H:%M:%S%.f"],
        };
        for f in fmts {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(&dotted, f) {
                return Some(format_sortable(&ndt));
            }
        }
        None
    }
}

pub fn format_sortable(ndt: &NaiveDateTime) -> String {
    ndt.format(SORTABLE_FORMAT).to_string()
}

fn strip_dash(field: &str) -> String {
    field.strip_prefix('-').unwrap_or(field).to_string()
}

fn message_of(caps: &Captures<'_>) -> String {
    caps.name("message")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
