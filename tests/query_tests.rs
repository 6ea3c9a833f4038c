use logtriage::grammar::LogType;
use logtriage::parser::{parse, LogEntry};
use logtriage::query::EntryFilter;
use logtriage::severity::Severity;

const RAW: &str = "\
2024-01-01 10:00:00,000 T1 INFO R1 /srv/shop [CartService] - cart loaded
2024-01-01 10:00:05,000 T1 WARN R2 /srv/shop [PaymentGateway] - slow response
2024-01-01 10:00:09,000 T2 ERROR R3 /srv/admin [cartservice] - cart write failed
orphan line without header";

fn entries() -> Vec<LogEntry> {
    parse(RAW, LogType::Server)
}

#[test]
fn empty_filter_keeps_everything() {
    let f = EntryFilter::default();
    assert!(f.is_empty());
    assert_eq!(f.apply(entries()).len(), 4);
}

#[test]
fn component_match_is_case_insensitive_substring() {
    let f = EntryFilter { component: Some("CART".into()), ..Default::default() };
    let out = f.apply(entries());
    let msgs: Vec<&str> = out.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(msgs, vec!["cart loaded", "cart write failed"]);
}

#[test]
fn min_severity_uses_weight() {
    let f = EntryFilter { min_severity: Some(Severity::Warn), ..Default::default() };
    let out = f.apply(entries());
    assert!(out.iter().all(|e| e.severity.weight() >= Severity::Warn.weight()));
    // the orphan line is a synthetic error
    assert_eq!(out.len(), 3);
}

#[test]
fn time_range_is_inclusive_and_skips_synthetic_entries() {
    let f = EntryFilter {
        since: Some("2024-01-01 10:00:05".into()),
        until: Some("2024-01-01 10:00:05".into()),
        ..Default::default()
    };
    let out = f.apply(entries());
    let msgs: Vec<&str> = out.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(msgs, vec!["slow response", "orphan line without header"]);
}

#[test]
fn criteria_combine() {
    let f = EntryFilter {
        project: Some("/srv/shop".into()),
        min_severity: Some(Severity::Warn),
        ..Default::default()
    };
    let out = f.apply(entries());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].component, "PaymentGateway");
}
