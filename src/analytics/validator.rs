//! Data quality checks over the record store
//!
//! Each check returns a plain `ValidationOutcome`; nothing here raises on a
//! bad record. The pipeline treats outcomes as advisory unless strict
//! validation is configured. Only a store failure propagates as an error.

use crate::model::{
    DateWindow, Transaction, TransactionFilter, ValidationOutcome, ValidationStatus,
};
use crate::store::{RecordStore, StoreError};
use chrono::Datelike;
use std::collections::HashMap;
use std::sync::Arc;

/// Relative tolerance for the total_amount consistency check
const AMOUNT_TOLERANCE: f64 = 0.01;

pub struct DataValidator {
    store: Arc<dyn RecordStore>,
}

impl DataValidator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Run all validation checks over the given window
    ///
    /// Checks: sales-data integrity, referential integrity against region
    /// reference data, and duplicate detection.
    pub async fn validate_all(
        &self,
        window: Option<DateWindow>,
    ) -> Result<Vec<ValidationOutcome>, StoreError> {
        let filter = TransactionFilter {
            window,
            region_id: None,
        };
        let transactions = self.store.query(&filter).await?;
        let regions = self.store.known_regions().await?;

        let outcomes = vec![
            check_sales_data(&transactions),
            check_referential_integrity(&transactions, &regions.iter().map(|r| r.region_id).collect::<Vec<_>>()),
            check_duplicates(&transactions),
        ];

        for outcome in &outcomes {
            log::info!(
                "🔎 Validation [{}]: {} ({} checked, {} passed, {} failed)",
                outcome.check_name,
                outcome.status.as_str(),
                outcome.records_checked,
                outcome.records_passed,
                outcome.records_failed,
            );
        }

        Ok(outcomes)
    }
}

/// Field-level integrity: non-negative measures, discount range, amount drift
fn check_sales_data(transactions: &[Transaction]) -> ValidationOutcome {
    let mut failed = 0usize;
    let mut drifted = 0usize;

    for t in transactions {
        let hard_violation = t.quantity < 0.0
            || t.unit_price < 0.0
            || t.total_amount < 0.0
            || t.discount_percentage < 0.0
            || t.discount_percentage > 100.0;

        if hard_violation {
            failed += 1;
            continue;
        }

        let expected = t.quantity * t.unit_price * (1.0 - t.discount_percentage / 100.0);
        let tolerance = expected.abs().max(1.0) * AMOUNT_TOLERANCE;
        if (t.total_amount - expected).abs() > tolerance {
            drifted += 1;
        }
    }

    let status = if failed > 0 {
        ValidationStatus::Fail
    } else if drifted > 0 {
        ValidationStatus::Warn
    } else {
        ValidationStatus::Pass
    };

    ValidationOutcome {
        check_name: "sales_data".to_string(),
        status,
        records_checked: transactions.len(),
        records_passed: transactions.len() - failed,
        records_failed: failed,
        detail: if drifted > 0 {
            format!("{} records with total_amount drift beyond tolerance", drifted)
        } else {
            String::new()
        },
    }
}

/// Every non-null region_id must exist in the regions reference table
fn check_referential_integrity(
    transactions: &[Transaction],
    known_regions: &[i64],
) -> ValidationOutcome {
    let referencing: Vec<&Transaction> =
        transactions.iter().filter(|t| t.region_id.is_some()).collect();

    if known_regions.is_empty() && !referencing.is_empty() {
        return ValidationOutcome {
            check_name: "referential_integrity".to_string(),
            status: ValidationStatus::Warn,
            records_checked: referencing.len(),
            records_passed: 0,
            records_failed: 0,
            detail: "no region reference data loaded".to_string(),
        };
    }

    let orphaned = referencing
        .iter()
        .filter(|t| {
            t.region_id
                .map(|id| !known_regions.contains(&id))
                .unwrap_or(false)
        })
        .count();

    ValidationOutcome {
        check_name: "referential_integrity".to_string(),
        status: if orphaned > 0 {
            ValidationStatus::Fail
        } else {
            ValidationStatus::Pass
        },
        records_checked: referencing.len(),
        records_passed: referencing.len() - orphaned,
        records_failed: orphaned,
        detail: if orphaned > 0 {
            format!("{} records reference unknown regions", orphaned)
        } else {
            String::new()
        },
    }
}

/// Duplicate detection on (date, customer, product, total_amount)
fn check_duplicates(transactions: &[Transaction]) -> ValidationOutcome {
    let mut seen: HashMap<(i64, i64, i64, u64), usize> = HashMap::new();
    for t in transactions {
        let key = (
            t.transaction_date.num_days_from_ce() as i64,
            t.customer_id,
            t.product_id,
            t.total_amount.to_bits(),
        );
        *seen.entry(key).or_insert(0) += 1;
    }

    let duplicates: usize = seen.values().filter(|&&n| n > 1).map(|&n| n - 1).sum();

    ValidationOutcome {
        check_name: "duplicates".to_string(),
        status: if duplicates > 0 {
            ValidationStatus::Warn
        } else {
            ValidationStatus::Pass
        },
        records_checked: transactions.len(),
        records_passed: transactions.len() - duplicates,
        records_failed: duplicates,
        detail: if duplicates > 0 {
            format!("{} duplicate records detected", duplicates)
        } else {
            String::new()
        },
    }
}
