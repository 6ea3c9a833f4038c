use crate::config::SummarizerConfig;
use crate::error::{Result, TriageError};
use crate::parser::LogEntry;
use crate::priority::{self, SelectionCaps};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const NO_LOGS_MESSAGE: &str = "No logs available for analysis.";

const ANALYSIS_PREAMBLE: &str = "\
You are analyzing diagnostic logs from a running service and its browser front end.
The entries below are the most severe and most recent ones, errors first, then warnings, then the rest.
Long stack traces have been shortened; a \"... truncated ...\" line marks the cut.

For your answer:
- Identify the distinct problems and the most likely root cause of each.
- Point at the component, project path, or URL involved when the entries name one.
- Say which problems look related (same time section, same stack frames).
- Suggest concrete next steps to confirm or fix each problem.
- Do not invent details that are not present in the entries.

Log entries (JSON):";

const SYSTEM_PROMPT: &str = "You are a concise, precise production support engineer.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// Nothing to analyze; the summarizer was not called.
    NoLogs,
    Summary(String),
}

impl Analysis {
    pub fn text(&self) -> &str {
        match self {
            Analysis::NoLogs => NO_LOGS_MESSAGE,
            Analysis::Summary(s) => s,
        }
    }
}

/// Free-text analysis of a bounded payload, typically backed by a language model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, payload: &str) -> Result<String>;
}

/// Preamble followed by the JSON array of the selected entries.
pub fn assemble_prompt(selected: &[LogEntry]) -> Result<String> {
    let json = serde_json::to_string_pretty(selected)?;
    Ok(format!("{ANALYSIS_PREAMBLE}\n{json}\n"))
}

/// Select, assemble, summarize. An empty input short-circuits to [`Analysis::NoLogs`].
pub async fn analyze(
    entries: &[LogEntry],
    caps: &SelectionCaps,
    summarizer: &dyn Summarizer,
) -> Result<Analysis> {
    if entries.is_empty() {
        debug!("no entries to analyze; skipping summarizer");
        return Ok(Analysis::NoLogs);
    }
    let selected = priority::select(entries, caps);
    let payload = assemble_prompt(&selected)?;
    debug!(
        total = entries.len(),
        selected = selected.len(),
        payload_bytes = payload.len(),
        "sending entries for summarization"
    );
    let summary = summarizer.summarize(&payload).await?;
    Ok(Analysis::Summary(summary))
}

// ── HTTP summarizer ────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: Option<RawMessage>,
}

#[derive(Deserialize, Debug)]
struct RawMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl HttpSummarizer {
    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("logtriage/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, payload: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TriageError::Configuration("summarizer API key is not set".into()));
        };
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": payload },
            ],
        });

        let start = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TriageError::transport("summarizer", format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TriageError::transport("summarizer", format!("failed to read response: {e}")))?;
        debug!(
            "summarizer response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(TriageError::transport("summarizer", format!("HTTP {status}: {text}")));
        }

        Ok(extract_content(&text).unwrap_or_else(|| {
            warn!("summarizer response has no choices[0].message.content; treating as empty");
            String::new()
        }))
    }
}

fn extract_content(body: &str) -> Option<String> {
    let parsed: RawChatResponse = serde_json::from_str(body).ok()?;
    parsed.choices?.into_iter().next()?.message?.content
}

// ── Superseding analysis slot ──────────────────────────────────────

#[derive(Debug)]
pub struct AnalysisReport {
    pub generation: u64,
    pub entry_count: usize,
    pub result: Result<Analysis>,
}

/// Single-slot scheduler: at most one analysis runs at a time. Submitting aborts the
/// in-flight task, and a task that finishes after being superseded drops its result.
pub struct AnalysisSlot {
    summarizer: Arc<dyn Summarizer>,
    caps: SelectionCaps,
    generation: Arc<AtomicU64>,
    /// Held while `generation` is bumped, so generations and handles change together.
    inflight: Mutex<Option<JoinHandle<()>>>,
    reports: mpsc::UnboundedSender<AnalysisReport>,
}

impl AnalysisSlot {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        caps: SelectionCaps,
    ) -> (Self, mpsc::UnboundedReceiver<AnalysisReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let slot = Self {
            summarizer,
            caps,
            generation: Arc::new(AtomicU64::new(0)),
            inflight: Mutex::new(None),
            reports: tx,
        };
        (slot, rx)
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Starts analysis of `entries`, superseding any earlier submission. Must be called
    /// from within a Tokio runtime.
    pub fn submit(&self, entries: Vec<LogEntry>) -> u64 {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(prev) = inflight.take() {
            if !prev.is_finished() {
                info!(generation, "superseding in-flight analysis");
                prev.abort();
            }
        }

        let summarizer = Arc::clone(&self.summarizer);
        let current = Arc::clone(&self.generation);
        let tx = self.reports.clone();
        let caps = self.caps;
        *inflight = Some(tokio::spawn(async move {
            let entry_count = entries.len();
            let result = analyze(&entries, &caps, summarizer.as_ref()).await;
            if current.load(Ordering::SeqCst) != generation {
                debug!(generation, "discarding result of superseded analysis");
                return;
            }
            let _ = tx.send(AnalysisReport { generation, entry_count, result });
        }));
        generation
    }

    /// Aborts the in-flight analysis, if any; its result is never delivered.
    pub fn cancel(&self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(prev) = inflight.take() {
            prev.abort();
        }
    }

    /// Waits for the in-flight analysis to finish (or be aborted).
    pub async fn wait(&self) {
        let handle = self.inflight.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(h) = handle {
            let _ = h.await;
        }
    }
}

impl Drop for AnalysisSlot {
    fn drop(&mut self) {
        if let Some(h) = self.inflight.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            h.abort();
        }
    }
}
