use crate::ai::AnalysisSlot;
use crate::config::TriageConfig;
use crate::grammar::{format_sortable, LogGrammar};
use crate::parser::{synthesize, time_section_of, LogEntry};
use crate::severity::{classify, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Console,
    Network,
    /// `window.onerror`
    Window,
    /// unhandled promise rejection
    Promise,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EventSource::Console => "console",
            EventSource::Network => "network",
            EventSource::Window => "window",
            EventSource::Promise => "promise",
            EventSource::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A diagnostic pushed by the browser side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Source tag, `ERROR` / `WARN` for alerting events.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<EventDetails>,
    /// Epoch milliseconds or an RFC 3339 string.
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub source: EventSource,
}

impl RealtimeEvent {
    pub fn url(&self) -> Option<&str> {
        self.details.as_ref()?.url.as_deref()
    }

    pub fn normalized_severity(&self) -> Severity {
        match self.severity.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Severity::Error,
            "WARN" | "WARNING" => Severity::Warn,
            _ => classify(None, &self.message),
        }
    }

    /// Only ERROR and WARN tags trigger an analysis pass.
    pub fn is_alerting(&self) -> bool {
        matches!(self.severity.trim().to_ascii_uppercase().as_str(), "ERROR" | "WARN" | "WARNING")
    }

    pub fn to_entry(&self) -> LogEntry {
        let mut entry = synthesize(&self.message);
        entry.timestamp = normalize_event_timestamp(self.timestamp.as_ref());
        entry.time_section = time_section_of(&entry.timestamp);
        entry.severity = self.normalized_severity();
        entry.thread = self.kind.clone();
        entry.component = self.source.as_str().to_string();
        if let Some(details) = &self.details {
            if let Some(url) = &details.url {
                entry.project_path = url.clone();
            }
            match &details.status {
                Some(Value::Null) | None => {}
                Some(Value::String(s)) => entry.stack_trace.push(format!("status: {s}")),
                Some(other) => entry.stack_trace.push(format!("status: {other}")),
            }
        }
        entry
    }
}

/// Normalizes an event timestamp to the sortable log form; missing or unreadable
/// values fall back to the current time.
pub fn normalize_event_timestamp(ts: Option<&Value>) -> String {
    let dt = match ts {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).and_then(epoch_to_dt),
        Some(Value::String(s)) => return normalize_event_string(s),
        _ => None,
    };
    format_sortable(&dt.unwrap_or_else(Utc::now).naive_utc())
}

fn normalize_event_string(s: &str) -> String {
    let s = s.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        if let Some(dt) = s.parse::<i64>().ok().and_then(epoch_to_dt) {
            return format_sortable(&dt.naive_utc());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return format_sortable(&dt.with_timezone(&Utc).naive_utc());
    }
    LogGrammar::Server
        .normalize_timestamp(s)
        .unwrap_or_else(|| format_sortable(&Utc::now().naive_utc()))
}

// 10 digits are seconds, anything longer is milliseconds
fn epoch_to_dt(v: i64) -> Option<DateTime<Utc>> {
    if v.unsigned_abs() < 100_000_000_000 {
        DateTime::<Utc>::from_timestamp(v, 0)
    } else {
        let secs = v.div_euclid(1000);
        let nsub = (v.rem_euclid(1000) as u32) * 1_000_000;
        DateTime::<Utc>::from_timestamp(secs, nsub)
    }
}

/// Keeps the engine's own backend traffic (and loopback calls) out of the buffer.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    substrings: Vec<String>,
}

impl NoiseFilter {
    pub fn new<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let substrings = substrings
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        Self { substrings }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(config.noise_substrings())
    }

    pub fn is_noise(&self, event: &RealtimeEvent) -> bool {
        if event.source != EventSource::Network {
            return false;
        }
        match event.url() {
            Some(url) => self.substrings.iter().any(|s| url.contains(s.as_str())),
            None => false,
        }
    }
}

/// Fixed-capacity ring of realtime entries; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct RealtimeBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl RealtimeBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity.min(4096)), capacity }
    }

    /// Appends `entry`, returning the evicted entry when the buffer was full.
    pub fn push(&mut self, entry: LogEntry) -> Option<LogEntry> {
        let evicted = if self.entries.len() >= self.capacity { self.entries.pop_front() } else { None };
        self.entries.push_back(entry);
        evicted
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Dropped by the noise filter.
    Discarded,
    Buffered,
    /// Buffered, and an analysis of the whole buffer was submitted.
    Triggered { generation: u64 },
}

/// Feeds realtime events through the noise filter into the buffer and triggers
/// analysis on alerting events.
pub struct RealtimeIngestor {
    filter: NoiseFilter,
    buffer: Mutex<RealtimeBuffer>,
    slot: AnalysisSlot,
}

impl RealtimeIngestor {
    pub fn new(filter: NoiseFilter, capacity: usize, slot: AnalysisSlot) -> Self {
        Self { filter, buffer: Mutex::new(RealtimeBuffer::with_capacity(capacity)), slot }
    }

    pub fn ingest(&self, event: &RealtimeEvent) -> IngestOutcome {
        if self.filter.is_noise(event) {
            debug!(url = event.url().unwrap_or_default(), "discarding own backend traffic");
            return IngestOutcome::Discarded;
        }

        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        if buffer.push(event.to_entry()).is_some() {
            debug!(capacity = buffer.capacity(), "realtime buffer full; evicted oldest entry");
        }
        if !event.is_alerting() {
            return IngestOutcome::Buffered;
        }

        // submit under the buffer lock so generations follow buffer order
        let entries = buffer.snapshot();
        info!(source = event.source.as_str(), entries = entries.len(), "alerting event; analyzing buffer");
        let generation = self.slot.submit(entries);
        IngestOutcome::Triggered { generation }
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    pub fn slot(&self) -> &AnalysisSlot {
        &self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn epoch_millis_and_rfc3339_normalize_to_same_form() {
        let ms = normalize_event_timestamp(Some(&json!(1704103200123i64)));
        let iso = normalize_event_timestamp(Some(&json!("2024-01-01T10:00:00.123Z")));
        assert_eq!(ms, "2024-01-01 10:00:00,123");
        assert_eq!(iso, ms);
        assert_eq!(normalize_event_timestamp(Some(&json!("1704103200"))), "2024-01-01 10:00:00,000");
    }

    #[test]
    fn missing_timestamp_uses_sortable_now() {
        let ts = normalize_event_timestamp(None);
        assert_eq!(ts.len(), "2024-01-01 10:00:00,000".len());
        assert_eq!(&ts[19..20], ",");
    }

    #[test]
    fn out_of_range_epoch_falls_back_to_now() {
        for raw in [json!(-1e300), json!(i64::MIN), json!(1e300)] {
            let ts = normalize_event_timestamp(Some(&raw));
            assert_eq!(ts.len(), "2024-01-01 10:00:00,000".len());
        }
        let event: RealtimeEvent =
            serde_json::from_str(r#"{"type":"error","severity":"ERROR","message":"boom","timestamp":-1e300,"source":"window"}"#)
                .unwrap();
        let entry = event.to_entry();
        assert_eq!(entry.time_section.len(), "2024-01-01 10:00:00".len());
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut buf = RealtimeBuffer::with_capacity(2);
        assert!(buf.push(LogEntry::new("a", Severity::Info, "1")).is_none());
        assert!(buf.push(LogEntry::new("b", Severity::Info, "2")).is_none());
        let evicted = buf.push(LogEntry::new("c", Severity::Info, "3")).unwrap();
        assert_eq!(evicted.message, "1");
        let msgs: Vec<_> = buf.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(msgs, vec!["2", "3"]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buf = RealtimeBuffer::with_capacity(0);
        buf.push(LogEntry::new("a", Severity::Info, "1"));
        buf.push(LogEntry::new("b", Severity::Info, "2"));
        assert_eq!(buf.len(), 1);
    }
}
