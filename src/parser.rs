use crate::grammar::{LogGrammar, LogType, PrimaryLine};
use crate::multiline::{self, Continuation};
use crate::severity::{classify, Severity};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Wrapper line whose detail arrives on the lines after it.
const SERVING_WRAPPER: &str = "Error occurred while serving the request";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub time_section: String,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub thread: String,
    #[serde(default)]
    pub component: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

impl LogEntry {
    pub fn new(timestamp: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        Self {
            time_section: time_section_of(&timestamp),
            timestamp,
            project_path: String::new(),
            app_id: String::new(),
            thread: String::new(),
            component: String::new(),
            request_id: String::new(),
            severity,
            message: message.into(),
            stack_trace: Vec::new(),
        }
    }

    fn from_primary(p: PrimaryLine) -> Self {
        let severity = classify(Some(&p.level), &p.message);
        let mut e = LogEntry::new(p.timestamp, severity, p.message);
        e.thread = p.thread;
        e.request_id = p.request_id;
        e.project_path = p.project_path;
        e.app_id = p.app_id;
        e.component = p.component;
        e
    }
}

/// Grouping key: the timestamp without its final 4 characters (the `,mmm` part).
pub fn time_section_of(timestamp: &str) -> String {
    let n = timestamp.chars().count();
    if n <= 4 {
        return String::new();
    }
    timestamp.chars().take(n - 4).collect()
}

/// Builds a standalone error entry from text that matched no grammar. The first
/// line is the message; JSON diagnostics and stack frames below it form the trace.
pub fn synthesize(chunk: &str) -> LogEntry {
    let mut lines = chunk.lines().map(str::trim).filter(|l| !l.is_empty());
    let message = lines.next().unwrap_or_default();
    let mut e = LogEntry::new(String::new(), Severity::Error, message);
    e.stack_trace = lines
        .filter(|l| multiline::is_json_diagnostic(l) || multiline::is_stack_frame(l))
        .map(str::to_string)
        .collect();
    e
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    /// Exception-like message waiting for its frames.
    Deferred,
    /// Serving-wrapper line; only surfaces if frames attach to it.
    Suppressed,
}

#[derive(Debug)]
enum Current {
    Pending(LogEntry, Hold),
    Emitted(usize),
}

/// Incremental parser over one grammar. Feed lines with [`LineParser::push`] and
/// collect entries, in source order, with [`LineParser::finish`].
#[derive(Debug)]
pub struct LineParser {
    grammar: LogGrammar,
    out: Vec<LogEntry>,
    current: Option<Current>,
    lines_seen: usize,
    suppressed: usize,
}

impl LineParser {
    pub fn new(grammar: LogGrammar) -> Self {
        Self { grammar, out: Vec::new(), current: None, lines_seen: 0, suppressed: 0 }
    }

    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() { return; }
        self.lines_seen += 1;

        if let Some(primary) = self.grammar.parse_primary_line(line) {
            self.flush_pending();
            let mut entry = LogEntry::from_primary(primary);
            if entry.message.contains(SERVING_WRAPPER) {
                entry.severity = Severity::Error;
                self.current = Some(Current::Pending(entry, Hold::Suppressed));
            } else if is_exception_like(&entry.message) {
                self.current = Some(Current::Pending(entry, Hold::Deferred));
            } else {
                self.out.push(entry);
                self.current = Some(Current::Emitted(self.out.len() - 1));
            }
            return;
        }

        let marker = multiline::classify_continuation(line);
        if let (Some(kind), Some(entry)) = (marker, self.current_mut()) {
            if kind == Continuation::CompilationError {
                entry.message = line.trim().to_string();
                entry.severity = Severity::Error;
            }
            entry.stack_trace.push(line.trim_end().to_string());
            return;
        }

        // No grammar and no attachable marker: keep the line as its own entry.
        self.flush_pending();
        self.out.push(synthesize(line));
        self.current = Some(Current::Emitted(self.out.len() - 1));
    }

    pub fn finish(mut self) -> Vec<LogEntry> {
        self.flush_pending();
        debug!(
            grammar = ?self.grammar,
            lines = self.lines_seen,
            entries = self.out.len(),
            suppressed = self.suppressed,
            "parsed log text"
        );
        self.out
    }

    fn current_mut(&mut self) -> Option<&mut LogEntry> {
        match self.current.as_mut()? {
            Current::Pending(entry, _) => Some(entry),
            Current::Emitted(idx) => self.out.get_mut(*idx),
        }
    }

    fn flush_pending(&mut self) {
        match self.current.take() {
            Some(Current::Pending(entry, hold)) => {
                if !entry.stack_trace.is_empty() || hold == Hold::Deferred {
                    self.out.push(entry);
                } else {
                    self.suppressed += 1;
                }
            }
            other => self.current = other,
        }
    }
}

fn is_exception_like(message: &str) -> bool {
    message.contains("Exception:") || message.contains("Error:") || message.starts_with("Caused by:")
}

/// Parses raw log text with the grammar selected by `log_type`. Never fails: lines
/// that match nothing become synthetic error entries.
pub fn parse(raw_text: &str, log_type: LogType) -> Vec<LogEntry> {
    let mut parser = LineParser::new(log_type.grammar());
    for line in raw_text.lines() {
        parser.push(line);
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_section_drops_millis() {
        assert_eq!(time_section_of("2024-01-01 10:00:00,123"), "2024-01-01 10:00:00");
        assert_eq!(time_section_of("abcd"), "");
        assert_eq!(time_section_of(""), "");
    }

    #[test]
    fn synthesize_splits_message_and_frames() {
        let e = synthesize("TypeError: x is undefined\n    at render (app.js:1:2)\nnoise\n[{\"filename\":\"a.js\"}]");
        assert_eq!(e.message, "TypeError: x is undefined");
        assert_eq!(e.severity, Severity::Error);
        assert_eq!(e.stack_trace, vec!["at render (app.js:1:2)", "[{\"filename\":\"a.js\"}]"]);
        assert!(e.timestamp.is_empty());
        assert!(e.time_section.is_empty());
    }

    #[test]
    fn exception_like_conditions() {
        assert!(is_exception_like("java.lang.IllegalStateException: bad"));
        assert!(is_exception_like("TypeError: nope"));
        assert!(is_exception_like("Caused by: x"));
        assert!(!is_exception_like("wrapped Caused by: x"));
        assert!(!is_exception_like("boom"));
    }
}
