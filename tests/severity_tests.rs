use logtriage::severity::{classify, Severity};

#[test]
fn explicit_level_wins() {
    assert_eq!(classify(Some("ERROR"), ""), Severity::Error);
    assert_eq!(classify(Some("warn"), "NullPointerException"), Severity::Warn);
    assert_eq!(classify(Some("WARNING"), ""), Severity::Warn);
}

#[test]
fn message_scan_order() {
    assert_eq!(classify(None, "NullPointerException thrown"), Severity::Error);
    assert_eq!(classify(None, "cache warning"), Severity::Warn);
    assert_eq!(classify(None, "DEBUG: pool stats"), Severity::Debug);
    assert_eq!(classify(None, "ok"), Severity::Info);
    // error keywords outrank warn/debug in the same message
    assert_eq!(classify(None, "warn: retry failed"), Severity::Error);
    assert_eq!(classify(None, "debug warn"), Severity::Warn);
}

#[test]
fn absent_inputs_are_info() {
    assert_eq!(classify(None, ""), Severity::Info);
    assert_eq!(classify(Some(""), ""), Severity::Info);
}

#[test]
fn severity_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
    assert_eq!("Error".parse::<Severity>().unwrap(), Severity::Error);
    assert!("fatal".parse::<Severity>().is_err());
}
