//! Price Forecast CLI
//!
//! Forecasts price (and optionally quantity sold) for one product from the
//! history stored in SQLite, and writes the table and chart.
//!
//! # Usage
//! ```sh
//! forecast seed-demo --produto "Garrafa Reutilizavel" --months 36
//! forecast products
//! forecast run --produto "Garrafa Reutilizavel" --period 12 --chart-out chart.png --csv out.csv
//! ```
//!
//! # Environment Variables
//! - `DATABASE_URL` - SQLite URL (default: sqlite://data/produtos.db)
//! - `FORECAST_DEFAULT_PERIOD` - Horizon when `--period` is omitted (default: 12)
//! - `FORECAST_*` - Pipeline settings, see `ForecastConfig`
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use price_forecast::application::forecasting::ForecastService;
use price_forecast::config::{ForecastConfig, RuntimeConfig};
use price_forecast::domain::forecasting::{ChartArtifact, ForecastResult, RawObservation};
use price_forecast::infrastructure::export::export_forecast_csv;
use price_forecast::infrastructure::{Database, PlottersChartRenderer, SqliteProductHistoryRepository};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Product price and demand forecaster", long_about = None)]
struct Cli {
    /// TOML file with forecast settings (overrides FORECAST_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast one product
    Run {
        /// Product key, matched exactly
        #[arg(short, long)]
        produto: String,

        /// Number of future periods (default: FORECAST_DEFAULT_PERIOD)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        period: Option<i64>,

        /// Write the chart PNG here
        #[arg(long)]
        chart_out: Option<PathBuf>,

        /// Write the forecast table as CSV here
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List product keys with stored history
    Products,
    /// Insert a synthetic monthly history for a product
    SeedDemo {
        #[arg(short, long)]
        produto: String,

        /// Months of history, ending last month
        #[arg(short, long, default_value = "36")]
        months: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let runtime = RuntimeConfig::from_env()?;
    let config = match &cli.config {
        Some(path) => ForecastConfig::from_toml_file(path)?,
        None => ForecastConfig::from_env()?,
    };

    info!(
        "Price Forecast {} (db={}, granularity={}, targets={:?})",
        env!("CARGO_PKG_VERSION"),
        runtime.database_url,
        config.granularity,
        config.targets
    );

    let db = Database::new(&runtime.database_url).await?;

    match cli.command {
        Commands::Run {
            produto,
            period,
            chart_out,
            csv,
            json,
        } => {
            let renderer = PlottersChartRenderer::new(config.chart_width, config.chart_height);
            let repository = SqliteProductHistoryRepository::new(db.pool.clone());
            let service = ForecastService::new(Arc::new(repository), Arc::new(renderer), config);

            let period = period.unwrap_or(runtime.default_period);
            let result = service.forecast(&produto, period).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&json_view(&result))?);
            } else {
                print_table(&result);
            }

            if let Some(path) = csv {
                export_forecast_csv(&result.rows, &path)?;
            }
            if let Some(path) = chart_out {
                write_chart(&result.chart, &path)?;
            }
        }
        Commands::Products => {
            let repository = SqliteProductHistoryRepository::new(db.pool.clone());
            let service = ForecastService::new(
                Arc::new(repository),
                Arc::new(PlottersChartRenderer::new(config.chart_width, config.chart_height)),
                config,
            );
            for produto in service.list_products().await? {
                println!("{}", produto);
            }
        }
        Commands::SeedDemo { produto, months } => {
            let rows = demo_history(Utc::now().date_naive(), months)?;
            for row in &rows {
                db.insert_observation(&produto, row).await?;
            }
            info!("Seeded {} rows for {}", rows.len(), produto);
        }
    }

    Ok(())
}

fn print_table(result: &ForecastResult) {
    println!("\nForecast for {} ({})", result.produto, result.granularity);
    for report in &result.reports {
        println!(
            "  {} MAE: {:.2} ({} folds)",
            report.target, report.mae, report.folds
        );
    }
    println!("{}", "-".repeat(44));
    println!("{:<12} {:>14} {:>16}", "data", "preco", "quantidade");
    for row in &result.rows {
        let quantity = row
            .quantity
            .map(|q| format!("{:.2}", q))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<12} {:>14.2} {:>16}", row.date, row.price, quantity);
    }
    if let Some(path) = result.chart.path() {
        println!("\nChart: {}", path.display());
    }
}

fn json_view(result: &ForecastResult) -> serde_json::Value {
    serde_json::json!({
        "produto": result.produto,
        "granularity": result.granularity,
        "forecast": result.rows,
        "mae": result.reports,
        "chart_path": result.chart.path(),
    })
}

fn write_chart(chart: &ChartArtifact, path: &Path) -> Result<()> {
    match chart {
        ChartArtifact::Png(bytes) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write chart to {:?}", path))?,
        ChartArtifact::File(stored) => {
            std::fs::copy(stored, path)
                .with_context(|| format!("Failed to copy chart to {:?}", path))?;
        }
    }
    info!("Chart saved to {:?}", path);
    Ok(())
}

/// Seasonal monthly history with a mild upward trend, one row per month,
/// ending in the month before `today`.
fn demo_history(today: NaiveDate, months: u32) -> Result<Vec<RawObservation>> {
    let first_of_month = today.with_day(1).context("Invalid current date")?;
    let start = first_of_month
        .checked_sub_months(Months::new(months))
        .context("Seed range starts before the calendar")?;

    let mut rows = Vec::with_capacity(months as usize);
    for i in 0..months {
        let date = start
            .checked_add_months(Months::new(i))
            .context("Seed range overflows the calendar")?;
        let season = (i as f64 * std::f64::consts::TAU / 12.0).sin();
        let price = 24.90 + 0.12 * i as f64 + 1.8 * season;
        let quantity = 140.0 + 2.5 * i as f64 - 20.0 * season;

        rows.push(RawObservation {
            data: date.format("%Y-%m-%d").to_string(),
            preco: Some(format_brl(price)?),
            quantidade_vendida: Some(quantity.round() as i64),
        });
    }
    Ok(rows)
}

/// Formats a value the way the collector stores prices: `1.234,56`.
fn format_brl(value: f64) -> Result<String> {
    let cents = Decimal::from_f64(value)
        .context("Price is not representable")?
        .round_dp(2);
    let plain = format!("{:.2}", cents);
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }
    Ok(format!("{},{}", grouped, frac_part))
}
