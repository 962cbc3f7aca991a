//! CSV export of extracted records
//!
//! Records are open mappings, so the column set is the union of all keys
//! seen, computed lazily at export time: base columns in their fixed order
//! first, discovered detail-table columns sorted after them, and a trailing
//! JSON-encoded reviews column.

use crate::extract::{fields, Record};
use crate::Result;
use chrono::Local;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const REVIEWS_COLUMN: &str = "reviews";

/// Timestamped export file path for a region, under `dir`
pub fn export_path(dir: &Path, region: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("Data_{region}_{timestamp}.csv"))
}

/// Computes the column union: base order first, then discovered keys sorted
fn columns(records: &[Record]) -> Vec<String> {
    let mut discovered: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        for key in record.fields.keys() {
            if !fields::BASE_ORDER.contains(&key.as_str()) {
                discovered.insert(key);
            }
        }
    }

    fields::BASE_ORDER
        .iter()
        .copied()
        .chain(discovered)
        .map(String::from)
        .collect()
}

/// Writes records to a CSV file at `path`
///
/// Absent fields become empty cells; reviews are JSON-encoded into the last
/// column so the nested structure survives the tabular format.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let columns = columns(records);
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.push(REVIEWS_COLUMN);
    writer.write_record(&header)?;

    for record in records {
        let mut row: Vec<String> = columns
            .iter()
            .map(|column| record.get(column).unwrap_or_default().to_string())
            .collect();
        row.push(serde_json::to_string(&record.reviews)?);
        writer.write_record(&row)?;
    }

    writer.flush()?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
