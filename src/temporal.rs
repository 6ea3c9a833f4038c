use crate::parser::LogEntry;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSectionGroup {
    pub time_section: String,
    pub entries: Vec<LogEntry>,
    pub error_count: usize,
    pub warn_count: usize,
    pub debug_count: usize,
}

impl TimeSectionGroup {
    fn new(time_section: String, mut entries: Vec<LogEntry>) -> Self {
        // stable: equal timestamps keep source order
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let count = |s: Severity| entries.iter().filter(|e| e.severity == s).count();
        Self {
            error_count: count(Severity::Error),
            warn_count: count(Severity::Warn),
            debug_count: count(Severity::Debug),
            time_section,
            entries,
        }
    }
}

/// Buckets non-info entries by time section. Entries inside a bucket and the buckets
/// themselves are both ordered newest first.
pub fn group_by_time_section(entries: &[LogEntry]) -> Vec<TimeSectionGroup> {
    let mut buckets: BTreeMap<&str, Vec<LogEntry>> = BTreeMap::new();
    for e in entries.iter().filter(|e| e.severity != Severity::Info) {
        buckets.entry(e.time_section.as_str()).or_default().push(e.clone());
    }
    buckets
        .into_iter()
        .rev()
        .map(|(section, bucket)| TimeSectionGroup::new(section.to_string(), bucket))
        .collect()
}
