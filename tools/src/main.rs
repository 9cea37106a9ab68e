//! fraudscan: headless runner for the transaction anomaly scan.
//!
//! Usage:
//!   fraudscan scan --input transactions_db.csv --out-dir out [--config scan.json] [--threshold site_count=20] [--report report.json]
//!   fraudscan generate --seed 42 --days 30 --customers 200 --sites 40 --out transactions_db.csv
//!   fraudscan extract --db payments.db [--table transactions] --out transactions_db.csv

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use fraudscan_core::{
    engine::ScanReport,
    extract,
    sink,
    synth::{self, SynthConfig},
    ScanConfig, ScanEngine,
};
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("scan") => run_scan(&args),
        Some("generate") => run_generate(&args),
        Some("extract") => run_extract(&args),
        Some(other) => bail!("Unknown command '{other}' (expected scan, generate or extract)"),
        None => bail!("Missing command (expected scan, generate or extract)"),
    }
}

fn run_scan(args: &[String]) -> Result<()> {
    let input = find_arg(args, "--input").unwrap_or("./transactions_db.csv");
    let mut config = match find_arg(args, "--config") {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(dir) = find_arg(args, "--out-dir") {
        config.output_dir = PathBuf::from(dir);
    }
    let overrides = parse_thresholds(args)?;
    config.thresholds = config.thresholds.with_overrides(&overrides)?;

    println!("fraudscan — scan");
    println!("  input:     {input}");
    println!("  out dir:   {}", config.output_dir.display());
    println!();

    let engine = ScanEngine::from_config(&config);
    let report = engine
        .run_file(Path::new(input), &config.output_dir)
        .with_context(|| format!("Scan of {input} failed"))?;
    log::info!("Scan finished: {} artifacts", report.artifacts.len());
    print_summary(&report);

    if let Some(path) = find_arg(args, "--report") {
        let file = File::create(path).with_context(|| format!("Cannot create {path}"))?;
        serde_json::to_writer_pretty(file, &report)?;
        println!("  report:    {path}");
    }
    Ok(())
}

fn run_generate(args: &[String]) -> Result<()> {
    let defaults = SynthConfig::default();
    let start_date = match find_arg(args, "--start") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid --start date '{s}'"))?,
        None => defaults.start_date,
    };
    let config = SynthConfig {
        seed: parse_arg(args, "--seed", defaults.seed)?,
        start_date,
        days: parse_arg(args, "--days", defaults.days)?,
        customers: parse_arg(args, "--customers", defaults.customers)?,
        sites: parse_arg(args, "--sites", defaults.sites)?,
        purchases_per_day: parse_arg(args, "--purchases", defaults.purchases_per_day)?,
        dirty_amount_rate: parse_arg(args, "--dirty-rate", defaults.dirty_amount_rate)?,
    };
    let out = find_arg(args, "--out").unwrap_or("./transactions_db.csv");

    let table = synth::generate(&config);
    let file = File::create(out).with_context(|| format!("Cannot create {out}"))?;
    sink::write_raw_table(&table, file)?;

    println!("Generated {} transactions into {out}", table.len());
    println!("  seed:      {}", config.seed);
    println!("  days:      {}", config.days);
    println!("  customers: {}", config.customers);
    println!("  sites:     {}", config.sites);
    Ok(())
}

fn run_extract(args: &[String]) -> Result<()> {
    let Some(db) = find_arg(args, "--db") else {
        bail!("extract requires --db <sqlite file>");
    };
    let table = find_arg(args, "--table").unwrap_or(extract::DEFAULT_TABLE);
    let out = find_arg(args, "--out").unwrap_or("./transactions_db.csv");

    let conn = extract::open(Path::new(db)).with_context(|| format!("Cannot open {db}"))?;
    let file = File::create(out).with_context(|| format!("Cannot create {out}"))?;
    let rows = extract::extract_table(&conn, table, file)?;
    println!("Extracted {rows} rows from {db}:{table} into {out}");
    Ok(())
}

fn print_summary(report: &ScanReport) {
    println!("=== SCAN SUMMARY ===");
    println!("  input rows:        {}", report.input_rows);
    println!("  missing datetimes: {}", report.missing_datetimes);
    println!("  missing amounts:   {}", report.missing_amounts);
    println!();
    println!("=== ARTIFACTS ===");
    for artifact in &report.artifacts {
        println!("  {:<40} {:>8} rows", artifact.path.display(), artifact.rows);
        for calibration in &artifact.calibration {
            println!("      {calibration}");
        }
    }
}

/// Collect every `--threshold name=value` pair.
fn parse_thresholds(args: &[String]) -> Result<HashMap<String, f64>> {
    let mut overrides = HashMap::new();
    for pair in args.windows(2).filter(|w| w[0] == "--threshold") {
        let Some((name, value)) = pair[1].split_once('=') else {
            bail!("--threshold expects name=value, got '{}'", pair[1]);
        };
        let value: f64 = value
            .parse()
            .with_context(|| format!("Threshold '{name}' is not a number: '{value}'"))?;
        overrides.insert(name.to_string(), value);
    }
    Ok(overrides)
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// A flag that is present but unparsable is an error, not a silent default.
fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> Result<T> {
    match find_arg(args, flag) {
        Some(raw) => match raw.parse() {
            Ok(value) => Ok(value),
            Err(_) => bail!("Invalid value for {flag}: '{raw}'"),
        },
        None => Ok(default),
    }
}
