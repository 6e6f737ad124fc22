use crate::domain::forecasting::RawObservation;
use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Name of the table the data-collection side writes to.
pub const HISTORY_TABLE: &str = "ProdutosSustentaveis";

/// Shared SQLite pool
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let in_memory = db_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` opens its own empty database, and
        // closing the only one drops the data
        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Creates the history table if the collector has not created it yet.
    /// An existing table is left as is; readers check its columns themselves.
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ProdutosSustentaveis (
                produto TEXT NOT NULL,
                data TEXT NOT NULL,
                preco TEXT,
                quantidade_vendida INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create ProdutosSustentaveis table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_produtos_produto
            ON ProdutosSustentaveis (produto);
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create product index")?;

        info!("Database schema initialized.");
        Ok(())
    }

    pub async fn insert_observation(&self, produto: &str, row: &RawObservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ProdutosSustentaveis (produto, data, preco, quantidade_vendida)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(produto)
        .bind(&row.data)
        .bind(&row.preco)
        .bind(row.quantidade_vendida)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert observation for {}", produto))?;

        Ok(())
    }
}
