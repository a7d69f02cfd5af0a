//! In-memory record store for demo/offline mode and tests
//!
//! Same contract as the SQLite backend, including all-or-nothing batch
//! writes. Chosen at construction time by the caller; production code never
//! swaps backends at runtime.

use super::{RecordStore, StoreError};
use crate::model::{DateWindow, KpiName, KpiResult, Region, Transaction, TransactionFilter};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    transactions: Vec<Transaction>,
    kpi_results: Vec<KpiResult>,
    regions: Vec<Region>,
    next_id: i64,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<Inner>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_batch(&self, rows: &[Transaction]) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            inner.next_id += 1;
            let mut row = row.clone();
            row.id = Some(inner.next_id);
            inner.transactions.push(row);
        }
        Ok(rows.len())
    }

    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|t| match &filter.window {
                Some(window) => window.contains(t.transaction_date),
                None => true,
            })
            .filter(|t| match filter.region_id {
                Some(region_id) => t.region_id == Some(region_id),
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by_key(|t| (t.transaction_date, t.id));
        Ok(rows)
    }

    async fn insert_regions(&self, regions: &[Region]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for region in regions {
            match inner
                .regions
                .iter_mut()
                .find(|r| r.region_id == region.region_id)
            {
                Some(existing) => existing.region_name = region.region_name.clone(),
                None => inner.regions.push(region.clone()),
            }
        }
        inner.regions.sort_by_key(|r| r.region_id);
        Ok(())
    }

    async fn known_regions(&self) -> Result<Vec<Region>, StoreError> {
        Ok(self.inner.lock().unwrap().regions.clone())
    }

    async fn write_kpi_results(&self, rows: &[KpiResult]) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.kpi_results.extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn fetch_kpi_results(
        &self,
        kpi: KpiName,
        window: Option<DateWindow>,
    ) -> Result<Vec<KpiResult>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<KpiResult> = inner
            .kpi_results
            .iter()
            .filter(|r| r.kpi_name == kpi)
            .filter(|r| match window {
                Some(window) => window.contains(r.kpi_date),
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by_key(|r| r.kpi_date);
        Ok(rows)
    }

    fn backend_type(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn make_transaction(date: &str, region_id: Option<i64>) -> Transaction {
        Transaction {
            id: None,
            transaction_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            customer_id: 1,
            product_id: 101,
            quantity: 1.0,
            unit_price: 50.0,
            total_amount: 50.0,
            region_id,
            discount_percentage: 0.0,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = InMemoryRecordStore::new();
        store
            .insert_batch(&[
                make_transaction("2024-01-10", Some(1)),
                make_transaction("2024-01-11", Some(2)),
            ])
            .await
            .unwrap();

        let rows = store.query(&TransactionFilter::default()).await.unwrap();
        assert_eq!(rows[0].id, Some(1));
        assert_eq!(rows[1].id, Some(2));
    }

    #[tokio::test]
    async fn test_region_filter() {
        let store = InMemoryRecordStore::new();
        store
            .insert_batch(&[
                make_transaction("2024-01-10", Some(1)),
                make_transaction("2024-01-11", Some(2)),
                make_transaction("2024-01-12", None),
            ])
            .await
            .unwrap();

        let filter = TransactionFilter {
            window: None,
            region_id: Some(2),
        };
        let rows = store.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region_id, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_kpi_sorted_by_date() {
        let store = InMemoryRecordStore::new();
        let make = |date: &str, value: f64| KpiResult {
            kpi_name: KpiName::AvgTransactionValue,
            kpi_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kpi_value: value,
            region_id: None,
            entity_id: None,
            calculation_date: Utc::now(),
        };

        store
            .write_kpi_results(&[make("2024-01-20", 2.0), make("2024-01-10", 1.0)])
            .await
            .unwrap();

        let rows = store
            .fetch_kpi_results(KpiName::AvgTransactionValue, None)
            .await
            .unwrap();
        assert_eq!(rows[0].kpi_value, 1.0);
        assert_eq!(rows[1].kpi_value, 2.0);
    }
}
