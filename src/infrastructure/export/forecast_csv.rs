use crate::domain::forecasting::ForecastRow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One CSV line, with the column names the collector's table uses.
#[derive(Serialize)]
struct CsvRecord {
    data: NaiveDate,
    preco: f64,
    quantidade_vendida: Option<f64>,
}

impl From<&ForecastRow> for CsvRecord {
    fn from(row: &ForecastRow) -> Self {
        Self {
            data: row.date,
            preco: row.price,
            quantidade_vendida: row.quantity,
        }
    }
}

/// Writes the forecast table as `data,preco,quantidade_vendida`. The
/// quantity field is left empty when only price was forecast.
pub fn write_forecast_csv<W: Write>(rows: &[ForecastRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for row in rows {
        wtr.serialize(CsvRecord::from(row))
            .context("Failed to serialize forecast row")?;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

pub fn export_forecast_csv(rows: &[ForecastRow], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {:?}", path))?;
    write_forecast_csv(rows, file)?;
    info!("Forecast table written to {:?}", path);
    Ok(())
}
