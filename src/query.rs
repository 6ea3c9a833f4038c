use crate::parser::LogEntry;
use crate::severity::Severity;

/// Narrowing applied to parsed entries before grouping or selection. Every set
/// criterion must hold; an empty filter keeps everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub component: Option<String>,
    pub project: Option<String>,
    pub min_severity: Option<Severity>,
    /// Inclusive lower bound on `time_section`.
    pub since: Option<String>,
    /// Inclusive upper bound on `time_section`.
    pub until: Option<String>,
}

impl EntryFilter {
    pub fn is_empty(&self) -> bool {
        self.component.is_none()
            && self.project.is_none()
            && self.min_severity.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }

    pub fn matches(&self, e: &LogEntry) -> bool {
        if let Some(c) = &self.component {
            if !e.component.to_lowercase().contains(&c.to_lowercase()) { return false; }
        }
        if let Some(p) = &self.project {
            if !e.project_path.contains(p.as_str()) { return false; }
        }
        if let Some(min) = self.min_severity {
            if e.severity.weight() < min.weight() { return false; }
        }
        // synthetic entries carry no time section and are never excluded by a range
        if !e.time_section.is_empty() {
            if let Some(s) = &self.since {
                if e.time_section.as_str() < s.as_str() { return false; }
            }
            if let Some(u) = &self.until {
                if e.time_section.as_str() > u.as_str() { return false; }
            }
        }
        true
    }

    pub fn apply(&self, entries: Vec<LogEntry>) -> Vec<LogEntry> {
        if self.is_empty() { return entries; }
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}
