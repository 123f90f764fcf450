//! build-index: ingest a TREC, Gov2 or ClueWeb collection into a Tantivy index
//!
//! Prints `./<parent>/<file>\t<documents indexed>` on stdout for every file,
//! followed by a run summary. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use collection_indexer::document::IndexingHints;
use collection_indexer::ingest::{LineObserver, build_index};
use collection_indexer::{IndexConfig, ParserVariant};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "build-index")]
#[command(about = "Index a TREC/Web collection into a Tantivy index")]
#[command(version)]
struct Cli {
    /// Root directory of the collection
    #[arg(short = 'i', long = "input_path")]
    input_path: PathBuf,

    /// Directory for the index; an existing index there is replaced
    #[arg(short = 'o', long = "output_path")]
    output_path: PathBuf,

    /// Collection format: trectext, trecweb, clueweb09 or clueweb12
    #[arg(short = 'f', long)]
    format: ParserVariant,

    /// Drop English stop words from the body field
    #[arg(short = 'r', long = "remove-stopwords", default_value_t = true, action = ArgAction::Set)]
    remove_stopwords: bool,

    /// Stemmer name (porter, snowball, none, or a language)
    #[arg(short = 's', long, default_value = "porter")]
    stemmer: String,

    /// Worker threads (default: available parallelism)
    #[arg(short = 'n', long = "numThreads")]
    num_threads: Option<usize>,

    /// Maximum files submitted but not finished
    #[arg(long = "in-flight")]
    in_flight: Option<usize>,

    /// Directory name to skip during discovery (repeatable, default OtherData)
    #[arg(long = "exclude-dir")]
    exclude_dir: Vec<String>,

    /// Store document bodies so term vectors can be rebuilt
    #[arg(long = "doc-vectors")]
    doc_vectors: bool,

    /// Index term frequencies only
    #[arg(long = "no-positions")]
    no_positions: bool,

    /// Merge all segments into one after the commit
    #[arg(long)]
    optimize: bool,

    /// Index writer memory budget in megabytes
    #[arg(long = "memory-mb")]
    memory_mb: Option<usize>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Parse everything but keep documents in memory
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: Cli) -> Result<IndexConfig> {
    let mut builder = IndexConfig::builder()
        .input_dir(cli.input_path)
        .output_dir(cli.output_path)
        .format(cli.format)
        .remove_stopwords(cli.remove_stopwords)
        .stemmer(cli.stemmer)
        .optimize(cli.optimize)
        .dry_run(cli.dry_run)
        .hints(IndexingHints {
            store_term_vectors: cli.doc_vectors,
            positional: !cli.no_positions,
        });

    if let Some(workers) = cli.num_threads {
        builder = builder.workers(workers);
    }
    if let Some(capacity) = cli.in_flight {
        builder = builder.in_flight_capacity(capacity);
    }
    if !cli.exclude_dir.is_empty() {
        builder = builder.excluded_dirs(cli.exclude_dir);
    }
    if let Some(megabytes) = cli.memory_mb {
        builder = builder.writer_memory_mb(megabytes);
    }
    if let Some(path) = cli.report {
        builder = builder.report_path(path);
    }

    builder.build().context("Invalid indexing configuration")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let input = cli.input_path.clone();
    let config = build_config(cli)?;

    let summary = build_index(&config, &LineObserver::new(std::io::stdout()))
        .with_context(|| format!("Indexing {} failed", input.display()))?;

    let line = format!(
        "Indexed {} documents from {} files ({} failed) in {}",
        summary.committed_documents,
        summary.total_files,
        summary.totals.files_failed,
        summary.elapsed_hms()
    );
    if let Err(e) = writeln!(std::io::stdout(), "{line}") {
        tracing::warn!(error = %e, summary = %line, "Failed to write run summary to stdout");
    }
    Ok(())
}
