// Construction Ledger - Command line
// Runs the analysis passes over a sheet export and prints the results.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use construction_ledger::{
    budget_variance, category_totals, classify, classify_all, detect_with_config,
    item_histories, item_totals, load_csv, AppConfig, LoadReport, SynonymTable,
};

/// Construction Ledger - supply prices and budget from project expense sheets
#[derive(Parser)]
#[command(name = "construction-ledger")]
#[command(about = "Canonical supply items, price alerts and budget variance", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the canonical item for one or more descriptions
    Classify {
        /// Expense descriptions
        #[arg(required = true)]
        descriptions: Vec<String>,
    },

    /// Load a sheet export and report rejected rows
    Load {
        /// Sheet export (defaults to data_path from config)
        file: Option<PathBuf>,
    },

    /// Spend and latest price per canonical item
    Items {
        file: Option<PathBuf>,
    },

    /// Items whose latest price rose past the threshold
    Alerts {
        file: Option<PathBuf>,

        /// Minimum increase in percent (overrides config)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Show only the N largest increases
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Spend per category against the configured budget
    Budget {
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn, stdout is for results)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    let table = config.synonym_table()?;

    match cli.command {
        Commands::Classify { descriptions } => run_classify(&descriptions, &table, cli.json),
        Commands::Load { file } => {
            let report = load_sheet(file.as_deref(), &config)?;
            run_load(&report, cli.json)
        }
        Commands::Items { file } => {
            let report = load_sheet(file.as_deref(), &config)?;
            run_items(&report, &table, cli.json)
        }
        Commands::Alerts {
            file,
            threshold,
            limit,
        } => {
            let report = load_sheet(file.as_deref(), &config)?;
            run_alerts(&report, &table, &config, threshold, limit, cli.json)
        }
        Commands::Budget { file } => {
            let report = load_sheet(file.as_deref(), &config)?;
            run_budget(&report, &config, cli.json)
        }
    }
}

fn load_sheet(file: Option<&Path>, config: &AppConfig) -> Result<LoadReport> {
    let path = match file.or(config.data_path.as_deref()) {
        Some(p) => p,
        None => bail!("No sheet export given (pass a file or set data_path / LEDGER_DATA)"),
    };

    let report = load_csv(path)?;
    info!(path = %path.display(), "{}", report.summary());
    Ok(report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_classify(descriptions: &[String], table: &SynonymTable, json: bool) -> Result<()> {
    let items: Vec<(String, String)> = descriptions
        .iter()
        .map(|d| (d.clone(), classify(Some(d.as_str()), table)))
        .collect();

    if json {
        return print_json(&items);
    }
    for (description, item) in &items {
        println!("{} → {}", description, item);
    }
    Ok(())
}

fn run_load(report: &LoadReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    println!("📂 {}", report.summary());
    for rejected in &report.rejected {
        println!("  ✗ line {}: {}", rejected.line, rejected.reason);
    }

    let categories = category_totals(&report.records);
    if !categories.is_empty() {
        println!("\nBy category:");
        for total in &categories {
            println!("  {:<24} {:>4} rows  {:>12.2}", total.category, total.count, total.total);
        }
    }
    Ok(())
}

fn run_items(report: &LoadReport, table: &SynonymTable, json: bool) -> Result<()> {
    let classified = classify_all(&report.records, table);
    let totals = item_totals(&classified);

    if json {
        return print_json(&totals);
    }

    let histories = item_histories(&report.records, table);
    println!("🧱 Items");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for total in &totals {
        let latest = histories
            .iter()
            .find(|h| h.item == total.item)
            .and_then(|h| h.latest())
            .map(|p| format!("{:.2} on {}", p.amount, p.date))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:>4} rows  {:>12.2}  latest {}",
            total.item, total.count, total.total, latest
        );
    }
    Ok(())
}

fn run_alerts(
    report: &LoadReport,
    table: &SynonymTable,
    config: &AppConfig,
    threshold: Option<f64>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut trend = config.trend_config();
    if let Some(t) = threshold {
        trend.threshold_percent = t;
    }
    if limit.is_some() {
        trend.max_results = limit;
    }
    let alerts = detect_with_config(&report.records, table, &trend);

    if json {
        return print_json(&alerts);
    }
    if alerts.is_empty() {
        println!("No price increases of {:.1}% or more.", trend.threshold_percent);
        return Ok(());
    }

    println!("📈 Price increases (≥ {:.1}%)", trend.threshold_percent);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for alert in &alerts {
        println!(
            "{:<24} {:>10.2} ({}) → {:>10.2} ({})  +{:.1}%",
            alert.item,
            alert.previous_amount,
            alert.previous_date,
            alert.current_amount,
            alert.current_date,
            alert.percent_increase
        );
    }
    Ok(())
}

fn run_budget(report: &LoadReport, config: &AppConfig, json: bool) -> Result<()> {
    let budget = budget_variance(&report.records, &config.budget);

    if json {
        return print_json(&budget);
    }

    println!("💰 Budget by category");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for line in &budget.lines {
        let flag = if line.over_budget { "⚠" } else { "✓" };
        println!(
            "{} {:<24} planned {:>12.2}  spent {:>12.2}  {:>6.1}%",
            flag, line.category, line.planned, line.actual, line.percent_used
        );
    }
    for total in &budget.unbudgeted {
        println!("? {:<24} unbudgeted      spent {:>12.2}", total.category, total.total);
    }
    println!("\n{}", budget.summary());
    Ok(())
}
