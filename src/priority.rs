use crate::parser::LogEntry;
use crate::severity::Severity;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TRUNCATION_SENTINEL: &str = "... truncated ...";
const MAX_STACK_LINES: usize = 10;
const KEEP_HEAD_LINES: usize = 8;

/// Per-severity limits on how many entries one summarization payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCaps {
    pub error: usize,
    pub warn: usize,
    pub other: usize,
}

impl Default for SelectionCaps {
    fn default() -> Self {
        Self { error: 10, warn: 5, other: 5 }
    }
}

/// Picks the most relevant entries: sorted by (severity weight, timestamp) descending,
/// then capped per severity block. Blocks are concatenated error, warn, other and not
/// re-sorted afterwards.
pub fn select(entries: &[LogEntry], caps: &SelectionCaps) -> Vec<LogEntry> {
    let sorted = entries
        .iter()
        .sorted_by(|a, b| {
            b.severity
                .weight()
                .cmp(&a.severity.weight())
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        })
        .collect::<Vec<_>>();

    let mut errors = Vec::new();
    let mut warns = Vec::new();
    let mut others = Vec::new();
    for e in sorted {
        match e.severity {
            Severity::Error => errors.push(e),
            Severity::Warn => warns.push(e),
            Severity::Debug | Severity::Info => others.push(e),
        }
    }
    debug!(
        errors = errors.len(),
        warns = warns.len(),
        others = others.len(),
        "selecting entries for summarization"
    );

    errors
        .into_iter()
        .take(caps.error)
        .chain(warns.into_iter().take(caps.warn))
        .chain(others.into_iter().take(caps.other))
        .map(|e| {
            let mut e = e.clone();
            e.stack_trace = truncate_stack_trace(&e.stack_trace);
            e
        })
        .collect()
}

/// Traces longer than 10 lines keep their first 8 lines, a sentinel, and the last line.
pub fn truncate_stack_trace(trace: &[String]) -> Vec<String> {
    if trace.len() <= MAX_STACK_LINES {
        return trace.to_vec();
    }
    let mut out = Vec::with_capacity(KEEP_HEAD_LINES + 2);
    out.extend_from_slice(&trace[..KEEP_HEAD_LINES]);
    out.push(TRUNCATION_SENTINEL.to_string());
    if let Some(last) = trace.last() {
        out.push(last.clone());
    }
    out
}
