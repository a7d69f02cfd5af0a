//! CSV loader for sales transactions
//!
//! Parses a delimited input file, checks the required column set, normalizes
//! types, batch-inserts into the record store, and archives the consumed
//! file. A missing required column or an unparseable row fails the whole
//! load before any insert happens - there are no partial batches.

use crate::model::Transaction;
use crate::store::{RecordStore, StoreError};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const REQUIRED_COLUMNS: [&str; 6] = [
    "transaction_date",
    "customer_id",
    "product_id",
    "quantity",
    "unit_price",
    "total_amount",
];

#[derive(Debug)]
pub enum LoaderError {
    /// Required columns missing from the header row
    Schema(Vec<String>),
    Io(std::io::Error),
    Csv(csv::Error),
    Parse { line: usize, detail: String },
    Store(StoreError),
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err)
    }
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::Csv(err)
    }
}

impl From<StoreError> for LoaderError {
    fn from(err: StoreError) -> Self {
        LoaderError::Store(err)
    }
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderError::Schema(missing) => {
                write!(f, "Missing required columns: {}", missing.join(", "))
            }
            LoaderError::Io(e) => write!(f, "IO error: {}", e),
            LoaderError::Csv(e) => write!(f, "CSV error: {}", e),
            LoaderError::Parse { line, detail } => {
                write!(f, "Parse error at line {}: {}", line, detail)
            }
            LoaderError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for LoaderError {}

pub struct CsvLoader {
    store: Arc<dyn RecordStore>,
    archive_dir: PathBuf,
}

impl CsvLoader {
    pub fn new(store: Arc<dyn RecordStore>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            archive_dir: archive_dir.into(),
        }
    }

    /// Load one CSV file into the store and archive it
    ///
    /// Returns the number of inserted rows. The whole file is parsed before
    /// the (single-transaction) insert, so any schema or parse error leaves
    /// the store untouched and the input file in place.
    pub async fn load_sales_data(&self, csv_path: &Path) -> Result<usize, LoaderError> {
        log::info!("📥 Loading CSV file: {}", csv_path.display());

        let mut reader = csv::Reader::from_path(csv_path)?;
        let columns = check_required_columns(reader.headers()?)?;

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            // Line 1 is the header row
            let line = i + 2;
            rows.push(parse_record(&record, &columns, line)?);
        }
        log::info!("   ├─ Parsed {} records", rows.len());

        let count = self.store.insert_batch(&rows).await?;
        log::info!("   ├─ Inserted {} records into {}", count, self.store.backend_type());

        let archived = self.archive(csv_path)?;
        log::info!("   └─ Archived input to: {}", archived.display());

        Ok(count)
    }

    fn archive(&self, csv_path: &Path) -> Result<PathBuf, LoaderError> {
        std::fs::create_dir_all(&self.archive_dir)?;

        let stem = csv_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        let stamped = format!("{}_{}.csv", stem, Utc::now().format("%Y%m%d_%H%M%S"));
        let target = self.archive_dir.join(stamped);

        std::fs::rename(csv_path, &target)?;
        Ok(target)
    }
}

/// Map column names to positions, failing if any required column is absent
fn check_required_columns(
    headers: &csv::StringRecord,
) -> Result<HashMap<String, usize>, LoaderError> {
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(LoaderError::Schema(missing));
    }
    Ok(columns)
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    line: usize,
) -> Result<Transaction, LoaderError> {
    let field = |name: &str| -> Option<&str> {
        columns.get(name).and_then(|&i| record.get(i)).map(str::trim)
    };
    let required = |name: &'static str| -> Result<&str, LoaderError> {
        field(name).filter(|s| !s.is_empty()).ok_or(LoaderError::Parse {
            line,
            detail: format!("empty value for {}", name),
        })
    };

    let transaction_date = NaiveDate::parse_from_str(required("transaction_date")?, "%Y-%m-%d")
        .map_err(|e| LoaderError::Parse {
            line,
            detail: format!("transaction_date: {}", e),
        })?;

    let parse_i64 = |name: &'static str| -> Result<i64, LoaderError> {
        required(name)?.parse().map_err(|_| LoaderError::Parse {
            line,
            detail: format!("{} is not an integer", name),
        })
    };
    let parse_f64 = |name: &'static str| -> Result<f64, LoaderError> {
        required(name)?.parse().map_err(|_| LoaderError::Parse {
            line,
            detail: format!("{} is not a number", name),
        })
    };

    // Optional columns: empty or absent means null region / zero discount
    let region_id = match field("region_id") {
        Some(s) if !s.is_empty() => Some(s.parse().map_err(|_| LoaderError::Parse {
            line,
            detail: "region_id is not an integer".to_string(),
        })?),
        _ => None,
    };
    let discount_percentage = match field("discount_percentage") {
        Some(s) if !s.is_empty() => s.parse().map_err(|_| LoaderError::Parse {
            line,
            detail: "discount_percentage is not a number".to_string(),
        })?,
        _ => 0.0,
    };

    Ok(Transaction {
        id: None,
        transaction_date,
        customer_id: parse_i64("customer_id")?,
        product_id: parse_i64("product_id")?,
        quantity: parse_f64("quantity")?,
        unit_price: parse_f64("unit_price")?,
        total_amount: parse_f64("total_amount")?,
        region_id,
        discount_percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionFilter;
    use crate::store::InMemoryRecordStore;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_valid_csv() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(
            dir.path(),
            "sales.csv",
            "transaction_date,customer_id,product_id,quantity,unit_price,total_amount,region_id,discount_percentage\n\
             2024-01-10,1,101,2,50.0,100.0,1,0\n\
             2024-01-11,2,102,1,250.0,237.5,,5\n",
        );

        let store = Arc::new(InMemoryRecordStore::new());
        let loader = CsvLoader::new(store.clone(), dir.path().join("archive"));

        let count = loader.load_sales_data(&csv_path).await.unwrap();
        assert_eq!(count, 2);

        let rows = store.query(&TransactionFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region_id, Some(1));
        assert_eq!(rows[1].region_id, None);
        assert_eq!(rows[1].discount_percentage, 5.0);

        // Input file was archived away
        assert!(!csv_path.exists());
        let archived: Vec<_> = std::fs::read_dir(dir.path().join("archive"))
            .unwrap()
            .collect();
        assert_eq!(archived.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_column_rejects_whole_file() {
        let dir = tempdir().unwrap();
        // unit_price column missing
        let csv_path = write_csv(
            dir.path(),
            "bad.csv",
            "transaction_date,customer_id,product_id,quantity,total_amount\n\
             2024-01-10,1,101,2,100.0\n",
        );

        let store = Arc::new(InMemoryRecordStore::new());
        let loader = CsvLoader::new(store.clone(), dir.path().join("archive"));

        let err = loader.load_sales_data(&csv_path).await.unwrap_err();
        match err {
            LoaderError::Schema(missing) => assert_eq!(missing, vec!["unit_price".to_string()]),
            other => panic!("expected Schema error, got {}", other),
        }

        // Zero inserts, file left in place
        let rows = store.query(&TransactionFilter::default()).await.unwrap();
        assert!(rows.is_empty());
        assert!(csv_path.exists());
    }

    #[tokio::test]
    async fn test_bad_row_means_zero_inserts() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(
            dir.path(),
            "partial.csv",
            "transaction_date,customer_id,product_id,quantity,unit_price,total_amount\n\
             2024-01-10,1,101,2,50.0,100.0\n\
             2024-01-11,not-a-number,102,1,250.0,250.0\n",
        );

        let store = Arc::new(InMemoryRecordStore::new());
        let loader = CsvLoader::new(store.clone(), dir.path().join("archive"));

        let err = loader.load_sales_data(&csv_path).await.unwrap_err();
        match err {
            LoaderError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Parse error, got {}", other),
        }

        let rows = store.query(&TransactionFilter::default()).await.unwrap();
        assert!(rows.is_empty());
    }
}
