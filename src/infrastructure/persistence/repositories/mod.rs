pub mod product_history_repository;

pub use product_history_repository::SqliteProductHistoryRepository;
