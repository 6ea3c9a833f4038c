use logtriage::parser::LogEntry;
use logtriage::priority::{select, truncate_stack_trace, SelectionCaps, TRUNCATION_SENTINEL};
use logtriage::severity::Severity;

fn batch(sev: Severity, n: usize, tag: &str) -> Vec<LogEntry> {
    (0..n)
        .map(|i| LogEntry::new(format!("2024-01-01 10:00:{:02},000", i), sev, format!("{tag}{i}")))
        .collect()
}

#[test]
fn caps_each_block_and_keeps_error_block_first() {
    let mut entries = Vec::new();
    // interleave so input order does not already match the output
    entries.extend(batch(Severity::Info, 4, "i"));
    entries.extend(batch(Severity::Warn, 7, "w"));
    entries.extend(batch(Severity::Error, 12, "e"));
    entries.extend(batch(Severity::Debug, 4, "d"));

    let out = select(&entries, &SelectionCaps::default());
    assert_eq!(out.len(), 20);
    assert!(out[..10].iter().all(|e| e.severity == Severity::Error));
    assert!(out[10..15].iter().all(|e| e.severity == Severity::Warn));
    assert!(out[15..].iter().all(|e| matches!(e.severity, Severity::Debug | Severity::Info)));

    // newest first inside a block
    assert_eq!(out[0].message, "e11");
    assert_eq!(out[9].message, "e2");
    assert_eq!(out[10].message, "w6");
    // debug outranks info in the other block
    assert_eq!(out[15].message, "d3");
    assert_eq!(out[19].message, "i3");
}

#[test]
fn custom_caps_and_small_inputs() {
    let mut entries = batch(Severity::Error, 2, "e");
    entries.extend(batch(Severity::Warn, 1, "w"));
    let caps = SelectionCaps { error: 1, warn: 0, other: 5 };
    let out = select(&entries, &caps);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].message, "e1");
    assert!(select(&[], &SelectionCaps::default()).is_empty());
}

#[test]
fn fifteen_line_trace_truncates_to_ten() {
    let trace: Vec<String> = (1..=15).map(|i| format!("at frame{i}")).collect();
    let out = truncate_stack_trace(&trace);
    assert_eq!(out.len(), 10);
    assert_eq!(&out[..8], &trace[..8]);
    assert_eq!(out[8], TRUNCATION_SENTINEL);
    assert_eq!(out[9], "at frame15");
}

#[test]
fn selection_truncates_long_traces() {
    let mut e = LogEntry::new("2024-01-01 10:00:00,000", Severity::Error, "deep");
    e.stack_trace = (0..30).map(|i| format!("at f{i}")).collect();
    let out = select(&[e], &SelectionCaps::default());
    assert_eq!(out[0].stack_trace.len(), 10);
    assert_eq!(out[0].stack_trace[9], "at f29");
}
