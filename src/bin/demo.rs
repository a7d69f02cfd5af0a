//! Demo - offline run against generated sample data
//!
//! Seeds an in-memory store with 90 days of synthetic sales transactions,
//! then drives a complete pipeline run (validate, aggregate, report) with
//! no database file and no input CSV. The generator is seeded, so repeated
//! runs produce identical data.
//!
//! Usage:
//!   cargo run --release --bin demo

use chrono::{Duration, Utc};
use dotenv::dotenv;
use kpiflow::config::PipelineConfig;
use kpiflow::model::{Region, Transaction};
use kpiflow::pipeline::PipelineEngine;
use kpiflow::report::{ReportSink, TextReportSink};
use kpiflow::store::{InMemoryRecordStore, RecordStore};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const DEMO_SEED: u64 = 42;
const HISTORY_DAYS: i64 = 90;
const DISCOUNT_CHOICES: [f64; 5] = [0.0, 0.0, 0.0, 5.0, 10.0];

fn demo_regions() -> Vec<Region> {
    ["North America", "Europe", "Asia Pacific", "Latin America"]
        .iter()
        .enumerate()
        .map(|(i, name)| Region {
            region_id: i as i64 + 1,
            region_name: name.to_string(),
        })
        .collect()
}

/// Generate deterministic sample transactions: 5-20 per day over the
/// history window, base price per product with 20% variance
fn generate_transactions(rng: &mut StdRng) -> Vec<Transaction> {
    let today = Utc::now().date_naive();
    let base_prices: Vec<f64> = (0..5).map(|i| 25.0 + 50.0 * i as f64).collect();
    let mut rows = Vec::new();

    for day_offset in (0..HISTORY_DAYS).rev() {
        let date = today - Duration::days(day_offset);
        let per_day = rng.gen_range(5..=20);

        for _ in 0..per_day {
            let product = rng.gen_range(0..base_prices.len());
            let base = base_prices[product];
            let unit_price = base * rng.gen_range(0.8..=1.2);
            let quantity = rng.gen_range(1..=10) as f64;
            let discount = DISCOUNT_CHOICES[rng.gen_range(0..DISCOUNT_CHOICES.len())];
            let total = quantity * unit_price * (1.0 - discount / 100.0);

            rows.push(Transaction {
                id: None,
                transaction_date: date,
                customer_id: rng.gen_range(1..=10),
                product_id: product as i64 + 101,
                quantity,
                unit_price,
                total_amount: total,
                region_id: Some(rng.gen_range(1..=4)),
                discount_percentage: discount,
            });
        }
    }
    rows
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 Demo mode: in-memory store, seeded sample data");

    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    store.insert_regions(&demo_regions()).await?;

    let mut rng = StdRng::seed_from_u64(DEMO_SEED);
    let transactions = generate_transactions(&mut rng);
    let inserted = store.insert_batch(&transactions).await?;
    info!("📥 Seeded {} transactions over {} days", inserted, HISTORY_DAYS);

    let config = PipelineConfig::from_env();
    let sinks: Vec<Box<dyn ReportSink>> =
        vec![Box::new(TextReportSink::new(&config.report_dir))];

    let mut engine = PipelineEngine::new(store, sinks, config);
    let report = engine.run(None).await?;

    info!("✅ Demo run complete: {} KPI rows", report.kpi_results.len());
    for line in &report.insights {
        info!("   {}", line);
    }

    Ok(())
}
