//! sync-overhead-bench - rendezvous channel vs mutex serialization benchmark
//!
//! Runs a warm-up round and then the configured number of measured rounds
//! against one engine, and reports timing, CPU and throughput statistics.

use anyhow::Result;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sync_overhead_bench::benchmark::Orchestrator;
use sync_overhead_bench::config::{BenchmarkConfig, CliArgs};
use sync_overhead_bench::metrics::MetricsReporter;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_banner(config: &BenchmarkConfig) {
    if config.quiet {
        return;
    }

    println!("sync-overhead-bench v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Engine: {}", config.engine);
    println!(
        "Workers: {}, Increments/worker: {}, Intensity: {}, Rounds: {}",
        config.round.workers,
        config
            .round
            .increments_per_worker
            .map(|n| n.to_string())
            .unwrap_or_else(|| "1 (single-shot)".to_string()),
        config.round.loop_intensity,
        config.round.rounds
    );
    println!(
        "Warm-up: {} workers, intensity {}",
        config.warmup.workers, config.warmup.loop_intensity
    );
    println!("Round deadline: {:?}", config.deadline);
    println!("====================================\n");
}

/// Returns whether any round ended with a counter mismatch
fn run() -> Result<bool> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    // Build configuration
    let config = BenchmarkConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    print_banner(&config);

    let orchestrator = Orchestrator::new(config.clone())?;
    let result = orchestrator.run_all()?;

    let reporter = MetricsReporter::new(config.output_format);
    reporter.report(&result)?;

    // Export to JSON if requested
    if let Some(ref output_path) = config.output_path {
        info!("Writing results to: {:?}", output_path);
        reporter.write_json_file(output_path, &result)?;
    }

    // Export to CSV if requested
    if let Some(ref csv_path) = config.csv_output {
        info!("Writing CSV to: {:?}", csv_path);
        reporter.write_csv_file(csv_path, &result)?;
    }

    Ok(result.race_condition)
}

fn main() {
    match run() {
        Ok(false) => {}
        Ok(true) => {
            error!("Race condition detected: a round's counter differs from its dispatched units");
            std::process::exit(2);
        }
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
