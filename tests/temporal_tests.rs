use logtriage::parser::LogEntry;
use logtriage::severity::Severity;
use logtriage::temporal::group_by_time_section;

fn entry(ts: &str, sev: Severity, msg: &str) -> LogEntry {
    LogEntry::new(ts, sev, msg)
}

#[test]
fn groups_newest_first_and_drops_info() {
    let entries = vec![
        entry("2024-01-01 10:00:00,100", Severity::Error, "a"),
        entry("2024-01-01 10:00:00,900", Severity::Warn, "b"),
        entry("2024-01-01 10:00:01,000", Severity::Info, "c"),
        entry("2024-01-01 10:00:02,050", Severity::Debug, "d"),
        entry("2024-01-01 09:59:59,999", Severity::Error, "e"),
    ];
    let groups = group_by_time_section(&entries);
    let sections: Vec<&str> = groups.iter().map(|g| g.time_section.as_str()).collect();
    assert_eq!(sections, vec!["2024-01-01 10:00:02", "2024-01-01 10:00:00", "2024-01-01 09:59:59"]);

    let ten = &groups[1];
    let msgs: Vec<&str> = ten.entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(msgs, vec!["b", "a"]);
    assert_eq!((ten.error_count, ten.warn_count, ten.debug_count), (1, 1, 0));

    assert!(groups.iter().all(|g| g.entries.iter().all(|e| e.severity != Severity::Info)));
}

#[test]
fn only_info_or_empty_yields_no_groups() {
    assert!(group_by_time_section(&[]).is_empty());
    let entries = vec![entry("2024-01-01 10:00:00,000", Severity::Info, "x")];
    assert!(group_by_time_section(&entries).is_empty());
}

#[test]
fn synthetic_entries_share_the_empty_section() {
    let entries = vec![
        entry("", Severity::Error, "orphan 1"),
        entry("2024-01-01 10:00:00,000", Severity::Error, "timed"),
        entry("", Severity::Error, "orphan 2"),
    ];
    let groups = group_by_time_section(&entries);
    assert_eq!(groups.len(), 2);
    let last = groups.last().unwrap();
    assert_eq!(last.time_section, "");
    let msgs: Vec<&str> = last.entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(msgs, vec!["orphan 1", "orphan 2"]);
}
