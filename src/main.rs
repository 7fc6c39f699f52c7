use anyhow::{Context, Result};
use clap::Parser;
use pathseq::cli::{Cli, OutputFormat};
use pathseq::config::IngestConfig;
use pathseq::csv_output::CsvOutput;
use pathseq::json_output::JsonOutput;
use pathseq::orchestrator::{Orchestrator, RunOutcome, RunReport};
use pathseq::sequence::Sequence;
use pathseq::sink::IngestEvent;
use pathseq::store::{MemorySequenceStore, RunLogEntry, SequenceStore, SqliteSequenceStore};
use pathseq::worker::IngestWorker;
use tracing_subscriber::EnvFilter;

/// Lines between progress updates on stderr
const PROGRESS_STRIDE: u64 = 500;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn open_store(config: &IngestConfig) -> Result<Box<dyn SequenceStore>> {
    match &config.database {
        Some(path) => {
            let store = SqliteSequenceStore::open(path)
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemorySequenceStore::new())),
    }
}

fn render(
    format: OutputFormat,
    source: &str,
    sequences: Vec<Sequence>,
    report: Option<&RunReport>,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for s in &sequences {
                out.push_str(&format!(
                    "{:>7}  {} -> {} -> {}\n",
                    s.count, s.path_1, s.path_2, s.path_3
                ));
            }
            if let Some(report) = report {
                out.push_str(&format!(
                    "\n{} distinct sequences from {} lines ({} skipped, {} attempt(s))\n",
                    report.distinct_sequences,
                    report.lines_total,
                    report.lines_skipped,
                    report.attempts
                ));
            }
            out
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new(source);
            if let Some(report) = report {
                output.set_summary(report);
            }
            output.set_sequences(sequences);
            let mut json = output.to_json().context("Failed to serialize JSON")?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => sequences.into_iter().collect::<CsvOutput>().to_csv(),
    };
    Ok(rendered)
}

fn truncate(mut sequences: Vec<Sequence>, top: Option<usize>) -> Vec<Sequence> {
    if let Some(n) = top {
        sequences.truncate(n);
    }
    sequences
}

fn describe_last_run(entry: Option<&RunLogEntry>) -> String {
    match entry {
        Some(entry) => format!(
            "last run committed at {}: {} distinct sequences from {} lines ({} skipped)\n",
            entry.committed_at,
            entry.distinct_sequences,
            entry.summary.lines_total,
            entry.summary.lines_skipped
        ),
        None => "no runs recorded\n".to_string(),
    }
}

/// Print what the database currently holds
fn show_stored(args: &Cli, config: &IngestConfig) -> Result<()> {
    let Some(path) = &config.database else {
        anyhow::bail!("--show requires a database (--db or `database` in the config file)");
    };
    let store = SqliteSequenceStore::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    let sequences = truncate(store.query_all_sorted_by_count_desc()?, args.top);
    let last_run = store.last_run()?;
    print!(
        "{}",
        render(args.format, &path.display().to_string(), sequences, None)?
    );
    match args.format {
        OutputFormat::Text => print!("\n{}", describe_last_run(last_run.as_ref())),
        // keep machine-readable stdout clean
        OutputFormat::Json | OutputFormat::Csv => {
            eprint!("{}", describe_last_run(last_run.as_ref()))
        }
    }
    Ok(())
}

fn ingest(args: &Cli, config: &IngestConfig) -> Result<()> {
    let source = config.log_source();
    let description = source.describe();
    let store = open_store(config)?;
    let orchestrator = Orchestrator::from_config(source, store, config);

    let worker = IngestWorker::new();
    let (handle, events) = worker.spawn_with_channel(orchestrator)?;

    let mut published = None;
    // ends once the worker drops its senders
    for event in events.iter() {
        match event {
            IngestEvent::Progress { processed, total } => {
                if args.progress && (processed % PROGRESS_STRIDE == 0 || processed == total) {
                    eprint!("\rprocessed {processed}/{total} lines");
                    if processed == total {
                        eprintln!();
                    }
                }
            }
            IngestEvent::Results(sequences) => published = Some(sequences),
            IngestEvent::Failure(reason) => tracing::debug!(%reason, "run failed"),
        }
    }

    let (outcome, _orchestrator) = handle.join()?;
    match outcome {
        RunOutcome::Published(report) => {
            let sequences = truncate(published.unwrap_or_default(), args.top);
            print!(
                "{}",
                render(args.format, &description, sequences, Some(&report))?
            );
            Ok(())
        }
        RunOutcome::Failed { reason, .. } => {
            anyhow::bail!("Ingestion of {} failed: {}", description, reason)
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.to_config()?;

    if args.show {
        show_stored(&args, &config)
    } else {
        ingest(&args, &config)
    }
}
