//! Load demo: hammer one counter record with every update strategy and
//! compare the totals.
//!
//! Run with:
//! ```bash
//! cargo run --example load --features demo -- --help
//! RUST_LOG=contesa=debug cargo run --example load --features demo -- -s optimistic
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use contesa::load::{self, LoadPlan, LoadReport, Strategy};
use contesa::observers::json::JsonObserver;
use contesa::observers::table::{TableObserver, TableStyle};
use contesa::record::{CounterRecord, RecordId};
use contesa::service::{CounterService, ServiceConfig};
use contesa::store::{MemoryFastStore, MemoryStore, ResourceStore};
use tracing_subscriber::EnvFilter;

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One table of reports followed by the tallies
    Table,
    /// A single JSON document
    Json,
}

/// Strategy selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyChoice {
    Exclusive,
    Optimistic,
    Fast,
    Unindexed,
}

impl From<StrategyChoice> for Strategy {
    fn from(choice: StrategyChoice) -> Self {
        match choice {
            StrategyChoice::Exclusive => Strategy::Exclusive,
            StrategyChoice::Optimistic => Strategy::Optimistic,
            StrategyChoice::Fast => Strategy::Fast,
            StrategyChoice::Unindexed => Strategy::Unindexed,
        }
    }
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Markdown,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Concurrent counter update demo.
///
/// Fires N increment requests at a single record from a pool of worker
/// threads and reports how many increments each strategy kept.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Strategy to run (all of them when omitted)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyChoice>,

    /// Worker threads
    #[arg(short, long, default_value_t = LoadPlan::DEFAULT_WORKERS)]
    workers: usize,

    /// Total increment requests per strategy
    #[arg(short, long, default_value_t = LoadPlan::DEFAULT_REQUESTS)]
    requests: usize,

    /// Optimistic retry budget
    #[arg(long, default_value_t = ServiceConfig::DEFAULT_MAX_RETRIES)]
    max_retries: usize,

    /// Extra records sharing no code with the target, to make the unindexed scan longer
    #[arg(long, default_value = "0")]
    padding: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Table style (for table format)
    #[arg(long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include timestamp in JSON output
    #[arg(long)]
    timestamp: bool,
}

const TARGET: RecordId = RecordId::new(1);

fn build_service(args: &Args) -> contesa::error::Result<CounterService<MemoryStore, MemoryFastStore>> {
    let records = Arc::new(MemoryStore::new());
    records.insert(
        CounterRecord::new(TARGET)
            .with_title("hello")
            .with_code("post-1"),
    )?;
    for raw in 0..args.padding {
        let id = RecordId::new(raw + 2);
        records.insert(CounterRecord::new(id).with_code(format!("post-{}", id)))?;
    }

    let config = ServiceConfig::new().with_max_retries(args.max_retries);
    Ok(CounterService::new(records, Arc::new(MemoryFastStore::new())).with_config(config))
}

fn run(args: &Args) -> contesa::error::Result<String> {
    let service = build_service(args)?;
    let plan = LoadPlan::new()
        .with_workers(args.workers)
        .with_requests(args.requests);

    let strategies: Vec<Strategy> = match args.strategy {
        Some(choice) => vec![choice.into()],
        None => Strategy::ALL.to_vec(),
    };

    let mut reports: Vec<LoadReport> = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        eprintln!("Running {}...", strategy);
        reports.push(load::run(&service, TARGET, strategy, plan)?);
    }
    eprintln!();

    let output = match args.format {
        OutputFormat::Table => {
            let reports = TableObserver::new()
                .with_style(args.style.into())
                .with_title(format!("{} requests on {} workers", args.requests, args.workers))
                .render_reports(&reports);
            let stats = TableObserver::new()
                .with_style(args.style.into())
                .compact(true)
                .columns(3)
                .render_stats(service.stats());
            format!("{}\n\n{}", reports, stats)
        }
        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .with_timestamp(args.timestamp)
            .to_json(&reports, service.stats())
            .unwrap_or_else(|e| format!("Error: {}", e)),
    };
    Ok(output)
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
