//! CSV loader for geocoded survey data.
//!
//! Input files have a header row and the fixed column order
//! `[record id, source, neighbourhood, postcode, lat, lng, ...]`; trailing
//! columns are ignored. Malformed rows are logged and skipped, never fatal.

use anyhow::{Result, anyhow};
use std::fs::File;
use tracing::{debug, warn};

/// One survey respondent, as loaded from the geocoded CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRecord {
    pub id: String,
    pub source: String,
    pub raw_category: String,
    pub postcode: String,
    pub lat: f64,
    pub lng: f64,
}

/// Parses a single CSV row into a [`SurveyRecord`].
///
/// # Errors
///
/// Returns an error if the row has fewer than 6 columns or if the
/// latitude/longitude fields are not valid numbers.
pub fn parse_row(row: &csv::StringRecord) -> Result<SurveyRecord> {
    if row.len() < 6 {
        return Err(anyhow!("expected at least 6 columns, got {}", row.len()));
    }

    let lat: f64 = row[4]
        .trim()
        .parse()
        .map_err(|_| anyhow!("bad latitude {:?}", &row[4]))?;
    let lng: f64 = row[5]
        .trim()
        .parse()
        .map_err(|_| anyhow!("bad longitude {:?}", &row[5]))?;

    Ok(SurveyRecord {
        id: row[0].to_string(),
        source: row[1].to_string(),
        raw_category: row[2].to_string(),
        postcode: row[3].to_string(),
        lat,
        lng,
    })
}

/// Reads all well-formed records from the CSV at `path`.
///
/// The header row is always skipped. Rows that fail to parse are logged with
/// their contents and dropped; re-reading the same file yields the same
/// sequence.
#[tracing::instrument]
pub fn read_records(path: &str) -> Result<Vec<SurveyRecord>> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let row = result?;
        match parse_row(&row) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(row = ?row, error = %e, "Skipping malformed record");
                skipped += 1;
            }
        }
    }

    debug!(loaded = records.len(), skipped, "Survey data read");
    Ok(records)
}
