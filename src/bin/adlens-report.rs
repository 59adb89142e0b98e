use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use adlens::config::{Config, StoreBackend};
use adlens::engine::{
    aggregate, apply_view, classify_row, AggregationLevel, BenchmarkThresholds, CopyEngine,
    GroupMode, MetricId, PatternEngine, PerformanceRecord, RawRecord, Threshold, ViewOptions,
};
use adlens::storage::{BenchmarkStore, MemoryBenchmarkStore, SqliteBenchmarkStore};

#[derive(Parser)]
#[command(name = "adlens-report")]
#[command(about = "Offline creative-performance reports and benchmark management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate an exported record file and print the rows
    Report {
        /// Path to a JSON file containing an array of ad records
        #[arg(long)]
        input: PathBuf,
        /// Aggregation level, 1 (broadest) to 5 (exact)
        #[arg(long, default_value_t = 1)]
        level: u8,
        /// Grouping mode: creative or copy
        #[arg(long, default_value = "creative")]
        mode: String,
        /// Substring filter over name and copy
        #[arg(long, default_value = "")]
        query: String,
        /// Sort column (spend, roas, ctr, name, ...)
        #[arg(long, default_value = "spend")]
        sort: String,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
        /// Account whose stored benchmarks color the report
        #[arg(long)]
        account: Option<String>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Upsert one metric's thresholds for an account
    SetBenchmark {
        account: String,
        /// Metric id (ctr, cpc, cpm, cost_per_purchase, roas, conversion_rate)
        metric: String,
        #[arg(long)]
        low: Option<f64>,
        #[arg(long)]
        medium: Option<f64>,
    },
    /// Print stored thresholds for an account
    ShowBenchmarks { account: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store: Arc<dyn BenchmarkStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryBenchmarkStore::new()),
        StoreBackend::Sqlite => Arc::new(
            SqliteBenchmarkStore::new(&config.store.url, config.store.max_connections).await?,
        ),
    };
    store.init().await?;

    match cli.command {
        Commands::Report {
            input,
            level,
            mode,
            query,
            sort,
            asc,
            account,
            json,
        } => {
            let level = AggregationLevel::from_u8(level)?;
            let mode = match mode.to_lowercase().as_str() {
                "creative" => GroupMode::Creative,
                "copy" => GroupMode::Copy,
                other => anyhow::bail!("unknown mode '{other}', expected creative or copy"),
            };
            let options = ViewOptions {
                query,
                sort_key: sort.parse().map_err(anyhow::Error::msg)?,
                sort_dir: if asc { "asc" } else { "desc" }
                    .parse()
                    .map_err(anyhow::Error::msg)?,
            };

            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let raws: Vec<RawRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {} as a record array", input.display()))?;
            let records: Vec<PerformanceRecord> =
                raws.into_iter().map(PerformanceRecord::from_raw).collect();

            let thresholds = match account.as_deref() {
                Some(account_id) => store.get(account_id).await?.unwrap_or_default(),
                None => BenchmarkThresholds::default(),
            };

            let patterns = PatternEngine::new();
            let copy_engine = CopyEngine::new();
            let rows = apply_view(
                aggregate(&records, level, mode, &patterns, &copy_engine),
                &options,
            );

            if json {
                let classified: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|row| {
                        let mut value = serde_json::to_value(row).unwrap_or_default();
                        if let Ok(tiers) =
                            serde_json::to_value(classify_row(&row.metrics, &thresholds))
                        {
                            value["tiers"] = tiers;
                        }
                        value
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&classified)?);
            } else {
                print_table(&rows, &thresholds);
            }
        }
        Commands::SetBenchmark {
            account,
            metric,
            low,
            medium,
        } => {
            let metric: MetricId = metric.parse().map_err(anyhow::Error::msg)?;
            let mut thresholds = store.get(&account).await?.unwrap_or_default();
            thresholds.set(metric, Threshold { low, medium });
            store.put(&account, &thresholds).await?;
            println!("✓ Stored {metric} thresholds for account '{account}'");
        }
        Commands::ShowBenchmarks { account } => {
            match store.get(&account).await? {
                Some(thresholds) => {
                    println!("{:<20} {:>10} {:>10}", "Metric", "Low", "Medium");
                    println!("{}", "-".repeat(42));
                    for metric in MetricId::ALL {
                        if let Some(threshold) = thresholds.get(metric) {
                            println!(
                                "{:<20} {:>10} {:>10}",
                                metric.to_string(),
                                format_bound(threshold.low),
                                format_bound(threshold.medium)
                            );
                        }
                    }
                }
                None => println!("No benchmarks stored for account '{account}'."),
            }
        }
    }

    Ok(())
}

fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(value) => format!("{value:.2}"),
        None => "-".to_string(),
    }
}

fn print_table(
    rows: &[adlens::engine::AggregateRow],
    thresholds: &BenchmarkThresholds,
) {
    if rows.is_empty() {
        println!("No rows to display.");
        return;
    }

    println!(
        "{:<40} {:>10} {:>8} {:>8} {:>8} {:>10} {:>8}",
        "Name", "Spend", "CTR%", "CPC", "ROAS", "Purchases", "Tier"
    );
    println!("{}", "-".repeat(98));
    for row in rows {
        let tiers = classify_row(&row.metrics, thresholds);
        let roas_tier = tiers
            .get(&MetricId::Roas)
            .map(|tier| format!("{tier:?}").to_lowercase())
            .unwrap_or_default();
        println!(
            "{:<40} {:>10.2} {:>8.2} {:>8.2} {:>8.2} {:>10} {:>8}",
            truncate(&row.display_name, 40),
            row.spend,
            row.metrics.ctr,
            row.metrics.cpc,
            row.metrics.roas,
            row.purchases,
            roas_tier
        );
    }
    println!("{} row(s)", rows.len());
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{prefix}…")
    }
}
