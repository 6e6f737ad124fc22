use crate::domain::forecasting::{ColumnPresence, HistoryBatch, RawObservation};
use crate::domain::repositories::ProductHistoryRepository;
use crate::infrastructure::persistence::database::HISTORY_TABLE;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub struct SqliteProductHistoryRepository {
    pool: SqlitePool,
}

impl SqliteProductHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Column names of the history table, as the collector created it
    async fn columns(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", HISTORY_TABLE))
            .fetch_all(&self.pool)
            .await
            .context("Failed to read history table schema")?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl ProductHistoryRepository for SqliteProductHistoryRepository {
    async fn load_history(&self, produto: &str) -> Result<HistoryBatch> {
        let columns = self.columns().await?;
        if columns.is_empty() {
            bail!("History table {} does not exist", HISTORY_TABLE);
        }
        let has = |name: &str| columns.iter().any(|c| c == name);
        if !has("produto") {
            bail!("History table {} has no produto column", HISTORY_TABLE);
        }

        let presence = ColumnPresence {
            date: has("data"),
            price: has("preco"),
            quantity: has("quantidade_vendida"),
        };

        // Absent columns are selected as constants so every row decodes the same way
        let select = format!(
            "SELECT {}, {}, {} FROM {} WHERE produto = ?{}",
            if presence.date { "CAST(data AS TEXT) AS data" } else { "'' AS data" },
            if presence.price { "CAST(preco AS TEXT) AS preco" } else { "NULL AS preco" },
            if presence.quantity {
                "CAST(quantidade_vendida AS INTEGER) AS quantidade_vendida"
            } else {
                "NULL AS quantidade_vendida"
            },
            HISTORY_TABLE,
            if presence.date { " ORDER BY data ASC" } else { "" },
        );

        let rows = sqlx::query(&select)
            .bind(produto)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to load history for {}", produto))?;

        let mut observations = Vec::with_capacity(rows.len());
        for row in rows {
            observations.push(RawObservation {
                data: row.try_get::<Option<String>, _>("data")?.unwrap_or_default(),
                preco: row.try_get("preco")?,
                quantidade_vendida: row.try_get("quantidade_vendida")?,
            });
        }

        debug!("Fetched {} rows for {}", observations.len(), produto);
        Ok(HistoryBatch::new(presence, observations))
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT produto FROM {} WHERE produto IS NOT NULL ORDER BY produto",
            HISTORY_TABLE
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("produto").map_err(Into::into))
            .collect()
    }
}
