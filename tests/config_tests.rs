use logtriage::config::{TriageConfig, LOOPBACK_HOSTS};
use std::io::Write;

#[test]
fn defaults_apply_for_missing_sections() {
    let c = TriageConfig::from_toml("").unwrap();
    assert_eq!(c.selection.error, 10);
    assert_eq!(c.selection.warn, 5);
    assert_eq!(c.selection.other, 5);
    assert_eq!(c.realtime.buffer_capacity, 500);
    assert_eq!(c.source.default_limit, 500);
}

#[test]
fn file_overrides_are_loaded() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"
[summarizer]
endpoint = "https://llm.internal.example/v1/chat/completions"
model = "small"
api_key = "k"

[realtime]
buffer_capacity = 50
ignored_urls = ["/telemetry"]

[selection]
error = 3
"#
    )
    .unwrap();
    let c = TriageConfig::load_from(f.path()).unwrap();
    assert_eq!(c.summarizer.model, "small");
    assert_eq!(c.summarizer.resolve_api_key().as_deref(), Some("k"));
    assert_eq!(c.realtime.buffer_capacity, 50);
    assert_eq!(c.selection.error, 3);
    assert_eq!(c.selection.warn, 5);

    let noise = c.noise_substrings();
    assert!(noise.iter().any(|s| s == "llm.internal.example"));
    assert!(noise.iter().any(|s| s == "/telemetry"));
    for host in LOOPBACK_HOSTS {
        assert!(noise.iter().any(|s| s == host));
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = TriageConfig::from_toml("[summarizer\nmodel=").unwrap_err();
    assert!(matches!(err, logtriage::TriageError::ConfigParse(_)));
}
