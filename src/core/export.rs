//! CSV export of the selected coins.

use crate::core::coin::CoinRecord;
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

pub const DEFAULT_FILE_NAME: &str = "crypto.csv";

/// Serialises records as CSV with a header row and no index column.
pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a CoinRecord>) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    // Written explicitly so an empty selection still gets a header.
    wtr.write_record(CoinRecord::COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn from_csv(text: &str) -> Result<Vec<CoinRecord>> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    rdr.deserialize()
        .collect::<Result<Vec<CoinRecord>, csv::Error>>()
        .context("Failed to parse exported CSV")
}

/// Encodes CSV text as a `data:` URI that browsers offer as a download.
pub fn csv_data_uri(csv: &str) -> String {
    format!("data:file/csv;base64,{}", STANDARD.encode(csv.as_bytes()))
}

pub fn write_csv<'a, P: AsRef<Path>>(
    records: impl IntoIterator<Item = &'a CoinRecord>,
    path: P,
) -> Result<usize> {
    let path = path.as_ref();
    let records: Vec<&CoinRecord> = records.into_iter().collect();
    let csv = to_csv(records.iter().copied())?;
    std::fs::write(path, csv)
        .with_context(|| format!("Failed to write CSV file to {}", path.display()))?;
    Ok(records.len())
}
