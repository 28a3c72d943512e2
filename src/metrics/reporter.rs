//! Metrics reporter - output formatting and export
//!
//! Supports multiple output formats:
//! - Console (human-readable)
//! - JSON
//! - CSV (one row per round)

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::collector::{BenchmarkResult, RoundMetrics};
use crate::config::OutputFormat;

/// Header of the per-round CSV
pub const CSV_HEADER: &str = "engine,round,expected_units,final_counter,elapsed_secs,critical_secs,throughput,cpu_percent,p50_ns,p99_ns,max_ns";

/// Metrics reporter
pub struct MetricsReporter {
    format: OutputFormat,
}

impl MetricsReporter {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report a finished run to stdout
    pub fn report(&self, result: &BenchmarkResult) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match self.format {
            OutputFormat::Text => write_text(&mut out, result),
            OutputFormat::Json => write_json(&mut out, result),
            OutputFormat::Csv => write_csv(&mut out, result),
        }
    }

    /// Write the full result as JSON to a file
    pub fn write_json_file(&self, path: &Path, result: &BenchmarkResult) -> io::Result<()> {
        let mut file = File::create(path)?;
        write_json(&mut file, result)
    }

    /// Write one row per round to a CSV file
    pub fn write_csv_file(&self, path: &Path, result: &BenchmarkResult) -> io::Result<()> {
        let mut file = File::create(path)?;
        write_csv(&mut file, result)
    }
}

/// Human-readable summary
pub fn write_text<W: Write>(out: &mut W, result: &BenchmarkResult) -> io::Result<()> {
    writeln!(out, "\n=== {} ({}) ===", result.engine, result.config.variant_name())?;
    writeln!(out, "Final counters per round: {:?}", result.counters())?;
    writeln!(
        out,
        "Elapsed per round (s): {:?}",
        result
            .rounds
            .iter()
            .map(|r| r.elapsed.as_secs_f64())
            .collect::<Vec<_>>()
    )?;
    writeln!(
        out,
        "Critical section per round (s): {:?}",
        result
            .rounds
            .iter()
            .map(|r| r.critical_time.as_secs_f64())
            .collect::<Vec<_>>()
    )?;
    writeln!(
        out,
        "Throughput per round (ops/s): {}",
        result
            .rounds
            .iter()
            .map(|r| format_throughput(r.throughput))
            .collect::<Vec<_>>()
            .join(" | ")
    )?;
    writeln!(
        out,
        "CPU usage per round (% of one core): {}",
        result
            .rounds
            .iter()
            .map(|r| format_percent(r.cpu_usage_percent))
            .collect::<Vec<_>>()
            .join(" | ")
    )?;
    if let Some(junk) = result.final_junk() {
        writeln!(out, "Final junk value: {}", junk)?;
    }

    writeln!(out, "\n--- Averages ---")?;
    writeln!(
        out,
        "Race condition: {}",
        if result.race_condition { "YES" } else { "no" }
    )?;
    writeln!(out, "Mean elapsed per round: {:.8}s", result.mean_elapsed.as_secs_f64())?;
    writeln!(
        out,
        "Mean critical section per round: {:.8}s",
        result.mean_critical_time.as_secs_f64()
    )?;
    writeln!(
        out,
        "Global throughput: {} ops/s",
        format_throughput(result.global_throughput)
    )?;
    writeln!(
        out,
        "Mean CPU usage (one core): {}",
        format_percent(result.mean_cpu_usage_percent)
    )?;
    writeln!(
        out,
        "Mean CPU utilization ({} cores): {}",
        result.available_parallelism,
        format_percent(result.normalized_cpu_usage_percent)
    )?;
    Ok(())
}

/// Pretty-printed JSON document
pub fn write_json<W: Write>(out: &mut W, result: &BenchmarkResult) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&result.to_json())?;
    writeln!(out, "{}", json)
}

/// CSV header plus one row per round
pub fn write_csv<W: Write>(out: &mut W, result: &BenchmarkResult) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for round in &result.rounds {
        writeln!(out, "{}", csv_row(result, round))?;
    }
    Ok(())
}

fn csv_row(result: &BenchmarkResult, round: &RoundMetrics) -> String {
    format!(
        "{},{},{},{},{:.9},{:.9},{:.2},{},{},{},{}",
        result.engine,
        round.round,
        round.expected_units,
        round.final_counter,
        round.elapsed.as_secs_f64(),
        round.critical_time.as_secs_f64(),
        round.throughput,
        round
            .cpu_usage_percent
            .map(|p| format!("{:.2}", p))
            .unwrap_or_default(),
        round.latency.p50_ns,
        round.latency.p99_ns,
        round.latency.max_ns
    )
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(p) => format!("{:.2}%", p),
        None => "n/a".to_string(),
    }
}

/// Format throughput without meaningless decimals
/// Examples: 1,234,567 ops/s, 987,654 ops/s
pub fn format_throughput(throughput: f64) -> String {
    let value = throughput as u64;
    format_count(value)
}

/// Format large numbers with thousands separators
/// Examples: 1,234,567 or 987,654
pub fn format_count(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}
