//! Record store abstraction
//!
//! All durable state lives behind the `RecordStore` trait: raw sales
//! transactions, KPI result rows, and region reference data. Two backends
//! implement it, selected at construction time (never swapped at runtime):
//!
//! - `SqliteRecordStore` - rusqlite with WAL mode and real transactions
//! - `InMemoryRecordStore` - mutex-guarded vectors for demo/offline mode

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::model::{DateWindow, KpiName, KpiResult, Region, Transaction, TransactionFilter};
use async_trait::async_trait;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Unavailable(msg) => write!(f, "Data source unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Capability set of the record store
///
/// Batch writes are transactional: `insert_batch` and `write_kpi_results`
/// commit all rows or none. A failed write leaves the store unchanged.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert transactions in one transaction; returns the inserted count
    async fn insert_batch(&self, rows: &[Transaction]) -> Result<usize, StoreError>;

    /// Fetch transactions matching the filter, ordered by date ascending
    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError>;

    /// Upsert region reference rows
    async fn insert_regions(&self, regions: &[Region]) -> Result<(), StoreError>;

    /// All known region reference rows
    async fn known_regions(&self) -> Result<Vec<Region>, StoreError>;

    /// Append KPI rows in one transaction; returns the inserted count
    async fn write_kpi_results(&self, rows: &[KpiResult]) -> Result<usize, StoreError>;

    /// Fetch KPI rows for one family, ordered by kpi_date ascending
    async fn fetch_kpi_results(
        &self,
        kpi: KpiName,
        window: Option<DateWindow>,
    ) -> Result<Vec<KpiResult>, StoreError>;

    /// Backend name for logging
    fn backend_type(&self) -> &'static str;
}
