//! In-Memory Repository Implementation
//!
//! Thread-safe, in-memory implementation of `ProductHistoryRepository`.
//!
//! # Features
//!
//! - **Thread-safe**: Uses `Arc<RwLock>` for concurrent access
//! - **Schema control**: Can pretend a column is absent, to exercise the
//!   schema checks without a database
//!
//! Data is lost on restart. For persistence use
//! `SqliteProductHistoryRepository`.

use crate::domain::forecasting::{ColumnPresence, HistoryBatch, RawObservation};
use crate::domain::repositories::ProductHistoryRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct InMemoryProductHistoryRepository {
    columns: ColumnPresence,
    rows: Arc<RwLock<HashMap<String, Vec<RawObservation>>>>,
}

impl InMemoryProductHistoryRepository {
    pub fn new() -> Self {
        Self::with_columns(ColumnPresence::all())
    }

    /// Repository whose "table" only has the given columns. Values for an
    /// absent column are dropped from every returned row.
    pub fn with_columns(columns: ColumnPresence) -> Self {
        Self {
            columns,
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, produto: &str, row: RawObservation) {
        self.rows
            .write()
            .await
            .entry(produto.to_string())
            .or_default()
            .push(row);
    }

    pub async fn insert_many(&self, produto: &str, rows: impl IntoIterator<Item = RawObservation>) {
        self.rows
            .write()
            .await
            .entry(produto.to_string())
            .or_default()
            .extend(rows);
    }
}

impl Default for InMemoryProductHistoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductHistoryRepository for InMemoryProductHistoryRepository {
    async fn load_history(&self, produto: &str) -> Result<HistoryBatch> {
        let store = self.rows.read().await;
        let rows = store
            .get(produto)
            .map(|rows| {
                rows.iter()
                    .map(|r| RawObservation {
                        data: if self.columns.date { r.data.clone() } else { String::new() },
                        preco: r.preco.clone().filter(|_| self.columns.price),
                        quantidade_vendida: r.quantidade_vendida.filter(|_| self.columns.quantity),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(HistoryBatch::new(self.columns, rows))
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.rows.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
