use once_cell::sync::Lazy;
use regex::Regex;

/// How a non-primary line relates to the entry before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Java compiler failure surfaced at runtime; replaces the entry's message.
    CompilationError,
    /// `[{"filename": ...}]` diagnostics emitted by front-end tooling.
    JsonDiagnostic,
    StackFrame,
}

static RE_FRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(at\s|Caused by:|\.\.\. \d+ more)").unwrap()
});

const COMPILATION_MARKERS: [&str; 2] = ["Unresolved compilation problem", "CompilationException"];

pub fn is_json_diagnostic(line: &str) -> bool {
    line.trim_start().starts_with("[{\"filename\"")
}

pub fn is_stack_frame(line: &str) -> bool {
    RE_FRAME.is_match(line.trim_start())
}

/// Checks continuation markers in priority order.
pub fn classify_continuation(line: &str) -> Option<Continuation> {
    if COMPILATION_MARKERS.iter().any(|m| line.contains(m)) {
        Some(Continuation::CompilationError)
    } else if is_json_diagnostic(line) {
        Some(Continuation::JsonDiagnostic)
    } else if is_stack_frame(line) {
        Some(Continuation::StackFrame)
    } else {
        None
    }
}
