use anyhow::Context;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};
use wordshard::config::CountConfig;
use wordshard::corpus::{discover_shards, GzipLineSource};
use wordshard::output::{write_table_to_path, OutputFormat};
use wordshard::pipeline::CountPipeline;
use wordshard::pool::{ConsoleEvents, EventSink, TracingEvents};

/// Count word frequencies across gzip-compressed text shards
#[derive(Parser)]
#[command(name = "wordshard", version)]
#[command(about = "Count word frequencies across gzip-compressed text shards", long_about = None)]
struct Cli {
    /// Directory containing the shards
    input_dir: PathBuf,

    /// Output table (.csv, .tsv, .json, .parquet or .arrow)
    output: PathBuf,

    /// Number of worker threads (must be an integer > 0)
    threads: Option<NonZeroUsize>,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Only treat files ending with this suffix as shards
    #[arg(long)]
    suffix: Option<String>,

    /// Do not print per-shard start/finish lines; failures are still logged
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1 like every other failure; help and version
            // still exit 0.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config = match CountConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let log_level = match cli.verbose {
        0 => config.log_level.clone().unwrap_or_else(|| "warn".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 2)
        .init();

    debug!("wordshard started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli, config).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CountConfig) -> anyhow::Result<()> {
    // Reject the output kind before doing any work.
    OutputFormat::from_path(&cli.output)?;

    let threads = config.effective_threads(cli.threads);
    let suffix = cli.suffix.as_deref().unwrap_or(&config.shard_suffix);
    let shards = discover_shards(&cli.input_dir, suffix)?;

    // Quiet runs keep stdout empty and report progress through the log only.
    let events: Arc<dyn EventSink> = if cli.quiet || config.quiet {
        Arc::new(TracingEvents)
    } else {
        Arc::new(ConsoleEvents)
    };
    let pipeline = CountPipeline::new(Arc::new(GzipLineSource), events, threads);
    let report = pipeline
        .run(shards)
        .await
        .context("Word count run failed")?;

    if !report.failures.is_empty() {
        warn!(
            "{} of {} shards could not be read and were excluded",
            report.failures.len(),
            report.table.shard_columns.len()
        );
    }

    write_table_to_path(&report.table, &cli.output)
        .with_context(|| format!("Error writing output file {}", cli.output.display()))?;
    Ok(())
}
