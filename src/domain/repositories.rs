//! Repository Pattern Abstractions
//!
//! The forecasting core only ever reads. The data-collection side owns the
//! table and writes to it; this module defines what the core needs from it.
//!
//! # Implementations
//!
//! - `SqliteProductHistoryRepository`: reads `ProdutosSustentaveis` via sqlx
//! - `InMemoryProductHistoryRepository`: fixed rows, for tests and demos
//!
//! # Example
//!
//! ```rust,no_run
//! use price_forecast::domain::repositories::ProductHistoryRepository;
//! use price_forecast::infrastructure::InMemoryProductHistoryRepository;
//!
//! # async {
//! let repo = InMemoryProductHistoryRepository::new();
//! let batch = repo.load_history("Garrafa Reutilizavel").await?;
//! # Ok::<(), anyhow::Error>(())
//! # };
//! ```

use crate::domain::forecasting::observation::HistoryBatch;
use anyhow::Result;
use async_trait::async_trait;

/// Read-only source of stored observations, keyed by product
#[async_trait]
pub trait ProductHistoryRepository: Send + Sync {
    /// All stored rows whose product key equals `produto` exactly (case-sensitive)
    async fn load_history(&self, produto: &str) -> Result<HistoryBatch>;

    /// Distinct product keys, sorted
    async fn list_products(&self) -> Result<Vec<String>>;
}
