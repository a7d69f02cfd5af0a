//! SQLite record store
//!
//! Owns a single connection behind a mutex. Schema is embedded and
//! idempotent (`IF NOT EXISTS`); batch writes run inside explicit
//! transactions so a mid-batch failure rolls back every row.

use super::{RecordStore, StoreError};
use crate::model::{DateWindow, KpiName, KpiResult, Region, Transaction, TransactionFilter};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sales_transactions (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    transaction_date    TEXT NOT NULL,
    customer_id         INTEGER NOT NULL,
    product_id          INTEGER NOT NULL,
    quantity            REAL NOT NULL,
    unit_price          REAL NOT NULL,
    total_amount        REAL NOT NULL,
    region_id           INTEGER,
    discount_percentage REAL NOT NULL DEFAULT 0,
    load_date           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sales_date ON sales_transactions(transaction_date);

CREATE TABLE IF NOT EXISTS kpi_results (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    kpi_name         TEXT NOT NULL,
    kpi_date         TEXT NOT NULL,
    kpi_value        REAL NOT NULL,
    region_id        INTEGER,
    entity_id        INTEGER,
    calculation_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_kpi_name_date ON kpi_results(kpi_name, kpi_date);

CREATE TABLE IF NOT EXISTS regions (
    region_id   INTEGER PRIMARY KEY,
    region_name TEXT NOT NULL
);
"#;

pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `db_path` and apply the schema
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;

        log::info!("✅ SQLite record store initialized (WAL mode)");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        transaction_date: parse_date(row.get::<_, String>(1)?, 1)?,
        customer_id: row.get(2)?,
        product_id: row.get(3)?,
        quantity: row.get(4)?,
        unit_price: row.get(5)?,
        total_amount: row.get(6)?,
        region_id: row.get(7)?,
        discount_percentage: row.get(8)?,
    })
}

fn row_to_kpi_result(row: &Row<'_>) -> rusqlite::Result<KpiResult> {
    let name: String = row.get(0)?;
    let kpi_name = KpiName::from_str(&name).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown kpi_name: {}", name).into(),
        )
    })?;

    Ok(KpiResult {
        kpi_name,
        kpi_date: parse_date(row.get::<_, String>(1)?, 1)?,
        kpi_value: row.get(2)?,
        region_id: row.get(3)?,
        entity_id: row.get(4)?,
        calculation_date: parse_datetime(row.get::<_, String>(5)?, 5)?,
    })
}

fn parse_date(s: String, col: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(s: String, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_batch(&self, rows: &[Transaction]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let load_date = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO sales_transactions (
                     transaction_date, customer_id, product_id, quantity,
                     unit_price, total_amount, region_id, discount_percentage, load_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for row in rows {
                stmt.execute(params![
                    row.transaction_date.to_string(),
                    row.customer_id,
                    row.product_id,
                    row.quantity,
                    row.unit_price,
                    row.total_amount,
                    row.region_id,
                    row.discount_percentage,
                    load_date,
                ])?;
            }
        }

        tx.commit()?;
        log::info!("✅ Inserted {} transactions", rows.len());
        Ok(rows.len())
    }

    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT id, transaction_date, customer_id, product_id, quantity,
                    unit_price, total_amount, region_id, discount_percentage
             FROM sales_transactions WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(window) = &filter.window {
            sql.push_str(" AND transaction_date >= ? AND transaction_date <= ?");
            args.push(Box::new(window.start.to_string()));
            args.push(Box::new(window.end.to_string()));
        }
        if let Some(region_id) = filter.region_id {
            sql.push_str(" AND region_id = ?");
            args.push(Box::new(region_id));
        }
        sql.push_str(" ORDER BY transaction_date ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let rows = stmt
            .query_map(params.as_slice(), row_to_transaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    async fn insert_regions(&self, regions: &[Region]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO regions (region_id, region_name) VALUES (?1, ?2)
                 ON CONFLICT(region_id) DO UPDATE SET region_name = excluded.region_name",
            )?;
            for region in regions {
                stmt.execute(params![region.region_id, region.region_name])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn known_regions(&self) -> Result<Vec<Region>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT region_id, region_name FROM regions ORDER BY region_id ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Region {
                    region_id: row.get(0)?,
                    region_name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    async fn write_kpi_results(&self, rows: &[KpiResult]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO kpi_results (
                     kpi_name, kpi_date, kpi_value, region_id, entity_id, calculation_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for row in rows {
                stmt.execute(params![
                    row.kpi_name.as_str(),
                    row.kpi_date.to_string(),
                    row.kpi_value,
                    row.region_id,
                    row.entity_id,
                    row.calculation_date.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(rows.len())
    }

    async fn fetch_kpi_results(
        &self,
        kpi: KpiName,
        window: Option<DateWindow>,
    ) -> Result<Vec<KpiResult>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT kpi_name, kpi_date, kpi_value, region_id, entity_id, calculation_date
             FROM kpi_results WHERE kpi_name = ?",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(kpi.as_str().to_string())];

        if let Some(window) = window {
            sql.push_str(" AND kpi_date >= ? AND kpi_date <= ?");
            args.push(Box::new(window.start.to_string()));
            args.push(Box::new(window.end.to_string()));
        }
        sql.push_str(" ORDER BY kpi_date ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let rows = stmt
            .query_map(params.as_slice(), row_to_kpi_result)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_transaction(date: &str, customer_id: i64, total: f64) -> Transaction {
        Transaction {
            id: None,
            transaction_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            customer_id,
            product_id: 101,
            quantity: 2.0,
            unit_price: total / 2.0,
            total_amount: total,
            region_id: Some(1),
            discount_percentage: 0.0,
        }
    }

    fn make_kpi(date: &str, value: f64) -> KpiResult {
        KpiResult {
            kpi_name: KpiName::RevenueByRegion,
            kpi_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kpi_value: value,
            region_id: Some(1),
            entity_id: None,
            calculation_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_query_roundtrip() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("test.db")).unwrap();

        let rows = vec![
            make_transaction("2024-01-10", 1, 100.0),
            make_transaction("2024-01-11", 2, 250.0),
        ];
        let count = store.insert_batch(&rows).await.unwrap();
        assert_eq!(count, 2);

        let fetched = store.query(&TransactionFilter::default()).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].customer_id, 1);
        assert_eq!(fetched[0].transaction_date.to_string(), "2024-01-10");
        assert!(fetched[0].id.is_some());
        assert_eq!(fetched[1].total_amount, 250.0);
    }

    #[tokio::test]
    async fn test_query_window_filter() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("test.db")).unwrap();

        store
            .insert_batch(&[
                make_transaction("2024-01-05", 1, 10.0),
                make_transaction("2024-01-15", 2, 20.0),
                make_transaction("2024-02-01", 3, 30.0),
            ])
            .await
            .unwrap();

        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let fetched = store.query(&TransactionFilter::in_window(window)).await.unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].customer_id, 2);
    }

    #[tokio::test]
    async fn test_kpi_results_roundtrip_ordered() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("test.db")).unwrap();

        // Insert out of date order; fetch must come back ascending
        store
            .write_kpi_results(&[make_kpi("2024-01-20", 2.0), make_kpi("2024-01-10", 1.0)])
            .await
            .unwrap();

        let rows = store
            .fetch_kpi_results(KpiName::RevenueByRegion, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kpi_value, 1.0);
        assert_eq!(rows[1].kpi_value, 2.0);

        // Other families untouched
        let other = store
            .fetch_kpi_results(KpiName::TopCustomers, None)
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_kpi_results_append_only() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("test.db")).unwrap();

        // Recomputation for the same date appends, never overwrites
        store.write_kpi_results(&[make_kpi("2024-01-10", 1.0)]).await.unwrap();
        store.write_kpi_results(&[make_kpi("2024-01-10", 2.0)]).await.unwrap();

        let rows = store
            .fetch_kpi_results(KpiName::RevenueByRegion, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_regions_upsert() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("test.db")).unwrap();

        store
            .insert_regions(&[Region {
                region_id: 1,
                region_name: "North America".to_string(),
            }])
            .await
            .unwrap();
        store
            .insert_regions(&[Region {
                region_id: 1,
                region_name: "NA".to_string(),
            }])
            .await
            .unwrap();

        let regions = store.known_regions().await.unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].region_name, "NA");
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let store = SqliteRecordStore::new(&path).unwrap();
        store.insert_batch(&[make_transaction("2024-01-10", 1, 100.0)]).await.unwrap();
        drop(store);

        // Reopening must not clobber existing rows
        let store = SqliteRecordStore::new(&path).unwrap();
        let fetched = store.query(&TransactionFilter::default()).await.unwrap();
        assert_eq!(fetched.len(), 1);
    }
}
