//! MicroDyn Log Decoder CLI Application
//!
//! This is the command-line interface for batch decoding of MicroDyn trace
//! logs. It uses the microdyn-log-decoder library and adds:
//! - Input discovery and case/task subset selection
//! - Parallel batch processing with per-file failure isolation
//! - CSV output (action stream, long and wide aggregate tables)
//! - JSON batch report

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod batch;
mod config;
mod report;
mod selection;

use config::AppConfig;
use microdyn_log_decoder::{IndeterminatePolicy, LogParser};
use report::OutputPaths;
use selection::{Selection, SelectionError};

/// MicroDyn Log Decoder - Turn trace logs into action and summary tables
#[derive(Parser, Debug)]
#[command(name = "microdyn-log-cli")]
#[command(about = "Decode MicroDyn trace logs into CSV tables", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the *_scoring.xml trace logs
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Directory for the output tables (created if missing)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Only process cases listed in the case list (column `ID`)
    #[arg(long)]
    subset_cases: bool,

    /// Only process tasks listed in the task list (column `tasks`)
    #[arg(long)]
    subset_tasks: bool,

    /// Also write the wide table (one row per subject)
    #[arg(long)]
    wide: bool,

    /// Skip the action stream table
    #[arg(long)]
    no_actions: bool,

    /// Fold rule for outputs without a committed value
    #[arg(long, value_name = "POLICY", value_parser = parse_policy)]
    indeterminate: Option<IndeterminatePolicy>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_policy(value: &str) -> std::result::Result<IndeterminatePolicy, String> {
    match value {
        "fail" => Ok(IndeterminatePolicy::Fail),
        "propagate" => Ok(IndeterminatePolicy::Propagate),
        "ignore" => Ok(IndeterminatePolicy::Ignore),
        other => Err(format!(
            "unknown policy '{}' (expected fail, propagate or ignore)",
            other
        )),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("MicroDyn Log Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", microdyn_log_decoder::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let config = apply_overrides(config, &args);

    run(&config)
}

/// Command-line flags take precedence over the config file
fn apply_overrides(mut config: AppConfig, args: &Args) -> AppConfig {
    if let Some(input) = &args.input {
        config.input.dir = input.clone();
    }
    if let Some(output) = &args.output {
        config.output.dir = output.clone();
    }
    config.selection.subset_cases |= args.subset_cases;
    config.selection.subset_tasks |= args.subset_tasks;
    config.output.wide |= args.wide;
    if args.no_actions {
        config.output.actions = false;
    }
    if let Some(policy) = args.indeterminate {
        config.parser.indeterminate_policy = policy;
    }
    config
}

fn run(config: &AppConfig) -> Result<()> {
    let files = selection::discover_files(&config.input)?;
    let selection = Selection::load(&config.selection)?;
    let files = selection.apply(files);

    if files.is_empty() {
        bail!(SelectionError::NothingSelected {
            dir: config.input.dir.clone(),
        });
    }
    log::info!("Processing {} trace logs", files.len());

    let parser = LogParser::new(config.parser.clone());
    let outcome = batch::run_batch(&parser, &files);

    let prefix = config
        .output
        .prefix
        .clone()
        .or_else(|| outcome.test.clone())
        .unwrap_or_else(|| "microdyn".to_string());

    std::fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create output directory: {:?}", config.output.dir))?;
    let paths = OutputPaths::new(&config.output.dir, &prefix);

    report::write_long(&paths.long, &outcome.aggregates)?;
    if config.output.wide {
        report::write_wide(&paths.wide, &outcome.aggregates)?;
    }
    if config.output.actions {
        report::write_actions(&paths.actions, &outcome.actions)?;
    }
    if config.output.batch_report {
        report::write_batch_report(&paths.batch_report, &outcome.report())?;
    }

    if !outcome.failures.is_empty() {
        log::warn!("{} files could not be decoded", outcome.failures.len());
        for failure in &outcome.failures {
            log::warn!("  {:?}: {}", failure.path, failure.error);
        }
    }
    log::info!(
        "Done: {} files, {} actions, {} aggregates -> {:?}",
        outcome.processed.len(),
        outcome.actions.len(),
        outcome.aggregates.len(),
        config.output.dir
    );

    Ok(())
}

/// Level selected by `-v`/`-q`
fn log_level(verbose: u8, quiet: bool) -> log::LevelFilter {
    use log::LevelFilter;

    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialize logging based on verbosity level
///
/// `RUST_LOG` directives (e.g. `microdyn_log_decoder::walker=trace`) are
/// applied on top of the level, except in quiet mode.
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use std::io::Write;

    let mut builder = Builder::new();
    builder.filter_level(log_level(verbose, quiet));
    if !quiet {
        builder.parse_default_env();
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
