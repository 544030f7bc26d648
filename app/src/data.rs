use anyhow::{Context, Result};
use core_types::Bar;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// One row of the bar CSV. Extra columns (e.g. a human-readable datetime)
/// are ignored.
#[derive(Debug, Deserialize)]
struct BarRecord {
    /// Bar open time, epoch milliseconds UTC.
    timestamp: i64,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl From<BarRecord> for Bar {
    fn from(record: BarRecord) -> Self {
        Bar {
            open_time: record.timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        }
    }
}

/// Loads a bar feed from a headered CSV file.
pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: BarRecord = result.context("malformed CSV row")?;
        bars.push(record.into());
    }

    tracing::info!(count = bars.len(), path = %path.display(), "Loaded bar feed.");
    Ok(bars)
}
