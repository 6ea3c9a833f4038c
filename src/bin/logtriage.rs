use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use logtriage::ai::{self, AnalysisReport, AnalysisSlot, HttpSummarizer, Summarizer};
use logtriage::config::TriageConfig;
use logtriage::grammar::LogType;
use logtriage::query::EntryFilter;
use logtriage::realtime::{IngestOutcome, NoiseFilter, RealtimeEvent, RealtimeIngestor};
use logtriage::severity::Severity;
use logtriage::source::{FileLogSource, HttpLogSource, LogSource};
use logtriage::temporal::{self, TimeSectionGroup};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logtriage", version, about = "Severity triage and summarization of server, application and browser logs")]
struct Cli {
    /// TOML configuration file
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a log file and print entries grouped by time section
    Parse {
        /// Input file (`-` for stdin)
        #[arg(default_value = "-")]
        input: String,
        #[arg(long = "type", default_value = "server")] log_type: LogType,
        #[arg(long = "limit")] limit: Option<usize>,
        /// Output format: json | table
        #[arg(long = "format", default_value = "json")] format: String,
        #[command(flatten)] filter: FilterArgs,
    },
    /// Fetch logs, select the most relevant entries and summarize them
    Analyze {
        #[arg(long = "file", conflicts_with = "url")] file: Option<String>,
        #[arg(long = "url")] url: Option<String>,
        #[arg(long = "type", default_value = "server")] log_type: LogType,
        #[arg(long = "limit")] limit: Option<usize>,
        /// Print the assembled prompt instead of calling the summarizer
        #[arg(long = "dry-run", default_value_t = false)] dry_run: bool,
        #[command(flatten)] filter: FilterArgs,
    },
    /// Ingest realtime browser events (one JSON object per line)
    Watch {
        #[arg(default_value = "-")]
        input: String,
        #[arg(long = "dry-run", default_value_t = false)] dry_run: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Keep entries whose component contains this text (case-insensitive)
    #[arg(long = "component")] component: Option<String>,
    #[arg(long = "project")] project: Option<String>,
    #[arg(long = "min-severity")] min_severity: Option<Severity>,
    /// Earliest time section, e.g. `2024-01-01 10:00:00`
    #[arg(long = "since")] since: Option<String>,
    #[arg(long = "until")] until: Option<String>,
}

impl From<FilterArgs> for EntryFilter {
    fn from(a: FilterArgs) -> Self {
        EntryFilter {
            component: a.component,
            project: a.project,
            min_severity: a.min_severity,
            since: a.since,
            until: a.until,
        }
    }
}

/// Stands in for the summarizer on `--dry-run`: the answer is the prompt itself.
struct PromptEcho;

#[async_trait]
impl Summarizer for PromptEcho {
    async fn summarize(&self, payload: &str) -> logtriage::Result<String> {
        Ok(payload.to_string())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logtriage=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_summarizer(config: &TriageConfig, dry_run: bool) -> anyhow::Result<Arc<dyn Summarizer>> {
    if dry_run {
        return Ok(Arc::new(PromptEcho));
    }
    let summarizer = HttpSummarizer::from_config(&config.summarizer)?;
    if config.summarizer.resolve_api_key().is_none() {
        anyhow::bail!(
            "no summarizer API key: set summarizer.api_key or ${} (or use --dry-run)",
            config.summarizer.api_key_env
        );
    }
    Ok(Arc::new(summarizer))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => TriageConfig::load_from(path)?,
        None => TriageConfig::default(),
    };

    match cli.command {
        Command::Parse { input, log_type, limit, format, filter } => {
            let limit = limit.unwrap_or(config.source.default_limit);
            let raw = FileLogSource::new(input).fetch(log_type, limit).await?;
            let entries = EntryFilter::from(filter).apply(logtriage::parser::parse(&raw, log_type));
            let groups = temporal::group_by_time_section(&entries);
            if format == "table" {
                print_groups_table(&groups);
            } else {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            }
        }
        Command::Analyze { file, url, log_type, limit, dry_run, filter } => {
            let limit = limit.unwrap_or(config.source.default_limit);
            let source: Box<dyn LogSource> = match (file, url.or_else(|| config.source.url.clone())) {
                (Some(path), _) => Box::new(FileLogSource::new(path)),
                (None, Some(url)) => Box::new(HttpLogSource::new(url, Duration::from_secs(config.source.timeout_secs))?),
                (None, None) => Box::new(FileLogSource::new("-")),
            };
            let summarizer = build_summarizer(&config, dry_run)?;
            let raw = source.fetch(log_type, limit).await?;
            let entries = EntryFilter::from(filter).apply(logtriage::parser::parse(&raw, log_type));
            let analysis = ai::analyze(&entries, &config.selection, summarizer.as_ref()).await?;
            println!("{}", analysis.text());
        }
        Command::Watch { input, dry_run } => {
            let summarizer = build_summarizer(&config, dry_run)?;
            run_watch(&input, &config, summarizer).await?;
        }
    }
    Ok(())
}

async fn run_watch(input: &str, config: &TriageConfig, summarizer: Arc<dyn Summarizer>) -> anyhow::Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = if input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(input).await?)
    };
    let mut lines = BufReader::new(reader).lines();

    let (slot, mut reports) = AnalysisSlot::new(summarizer, config.selection);
    let ingestor = RealtimeIngestor::new(NoiseFilter::from_config(config), config.realtime.buffer_capacity, slot);
    let (mut ingested, mut discarded) = (0usize, 0usize);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() { continue; }
                match serde_json::from_str::<RealtimeEvent>(&line) {
                    Ok(event) => match ingestor.ingest(&event) {
                        IngestOutcome::Discarded => discarded += 1,
                        _ => ingested += 1,
                    },
                    Err(e) => warn!("skipping malformed event: {e}"),
                }
            }
            Some(report) = reports.recv() => print_report(report)?,
            _ = tokio::signal::ctrl_c() => {
                ingestor.slot().cancel();
                break;
            }
        }
    }

    ingestor.slot().wait().await;
    while let Ok(report) = reports.try_recv() {
        print_report(report)?;
    }
    eprintln!("[watch] ingested={} discarded={} buffered={}", ingested, discarded, ingestor.snapshot().len());
    Ok(())
}

fn print_report(report: AnalysisReport) -> anyhow::Result<()> {
    let out = match &report.result {
        Ok(analysis) => serde_json::json!({
            "generation": report.generation,
            "entries": report.entry_count,
            "analysis": analysis.text(),
        }),
        Err(e) => serde_json::json!({
            "generation": report.generation,
            "entries": report.entry_count,
            "error": e.to_string(),
        }),
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn print_groups_table(groups: &[TimeSectionGroup]) {
    for g in groups {
        println!("\n# {}  (error={} warn={} debug={})", g.time_section, g.error_count, g.warn_count, g.debug_count);
        println!("{:<24} {:<6} {:<16} {}", "Timestamp", "Level", "Component", "Message");
        for e in &g.entries {
            println!("{:<24} {:<6} {:<16} {}", e.timestamp, e.severity, e.component, e.message);
            for frame in &e.stack_trace {
                println!("{:<48} {}", "", frame.trim());
            }
        }
    }
}
