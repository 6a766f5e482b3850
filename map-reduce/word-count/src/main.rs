// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use clap::{CommandFactory, Parser};
use map_reduce_core::{Config, LineSplitParams, Orchestrator};
use map_reduce_word_count::WordCountJob;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Count words of a text file with a threaded map-reduce")]
struct Cli {
    /// Text file to count words in
    file: PathBuf,

    /// Number of map threads (1..=100)
    threads: usize,

    /// JSON file with engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let start_time = Instant::now();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return usage_failure();
            }
        },
        None => Config::default(),
    };
    debug!(?config, "configuration");

    let (params, store_config) = match (
        LineSplitParams::with_pattern(&cli.file, &config.split_pattern),
        config.store_config(),
    ) {
        (Ok(params), Ok(store_config)) => (params, store_config),
        (Err(e), _) => {
            eprintln!("Invalid split pattern: {}", e);
            return usage_failure();
        }
        (_, Err(e)) => {
            eprintln!("Invalid store settings: {}", e);
            return usage_failure();
        }
    };

    let job = Arc::new(WordCountJob::stdout().skip_unreadable_input(config.skip_unreadable_input));
    let orchestrator = Orchestrator::new(job).store_config(store_config);

    match orchestrator.run(&params, cli.threads) {
        Ok(report) => {
            info!(
                input_units = report.input_units,
                words = report.distinct_keys,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "word count complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = %e.stage(), "word count failed");
            eprintln!("Error: {}", e);
            usage_failure()
        }
    }
}

fn usage_failure() -> ExitCode {
    eprintln!("{}", Cli::command().render_usage());
    ExitCode::FAILURE
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_names(verbose >= 2)
        .init();
}
