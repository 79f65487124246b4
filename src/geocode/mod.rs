//! One-shot postcode geocoding via the postcodes.io API.
//!
//! Thin enrichment step run once over a raw survey CSV before the pipeline
//! proper: look up each postcode, append `lat, lng` columns. Rows that fail
//! to geocode are logged and skipped.

mod client;

pub use client::{BasicClient, HttpClient};

use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use tracing::{info, warn};

const API_BASE: &str = "https://api.postcodes.io/postcodes";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: u16,
    result: Option<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Looks up one postcode, returning `(lat, lng)`.
///
/// # Errors
///
/// Returns an error for unknown postcodes, API failures, or responses
/// without coordinates (some valid postcodes are not geocoded).
pub async fn lookup<C: HttpClient>(client: &C, postcode: &str) -> Result<(f64, f64)> {
    let encoded = postcode.trim().replace(' ', "%20");
    let url = format!("{}/{}", API_BASE, encoded);

    let bytes = client.get(&url).await?;
    let resp: LookupResponse = serde_json::from_slice(&bytes)?;

    if resp.status != 200 {
        return Err(anyhow!("postcode lookup failed with status {}", resp.status));
    }
    let result = resp
        .result
        .ok_or_else(|| anyhow!("no result for postcode {:?}", postcode))?;
    match (result.latitude, result.longitude) {
        (Some(lat), Some(lng)) => Ok((lat, lng)),
        _ => Err(anyhow!("postcode {:?} has no coordinates", postcode)),
    }
}

/// Geocodes a raw survey CSV into a geocoded one.
///
/// Reads `[id, source, category, postcode, ...]` rows (header skipped),
/// keeps the first four columns, appends `lat, lng`, and writes the result
/// to `output`. Rows whose numeric record id is below `first_record` are
/// skipped, which allows resuming a partial run: the output is opened in
/// append mode so rows geocoded by an earlier run survive.
#[tracing::instrument(skip(client))]
pub async fn geocode_file<C: HttpClient>(
    client: &C,
    input: &str,
    output: &str,
    first_record: u64,
) -> Result<()> {
    let file = File::open(input)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let out = OpenOptions::new().append(true).create(true).open(output)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);

    let mut done = 0usize;
    let mut failed = 0usize;

    for result in rdr.records() {
        let row = result?;
        if row.len() < 4 {
            warn!(row = ?row, "Skipping short row");
            continue;
        }

        if let Ok(id) = row[0].trim().parse::<u64>() {
            if id < first_record {
                continue;
            }
        }

        let postcode = row[3].trim();
        match lookup(client, postcode).await {
            Ok((lat, lng)) => {
                let lat = lat.to_string();
                let lng = lng.to_string();
                writer.write_record([&row[0], &row[1], &row[2], postcode, lat.as_str(), lng.as_str()])?;
                done += 1;
                if done % 100 == 0 {
                    writer.flush()?;
                    info!(done, failed, "Geocoding progress");
                }
            }
            Err(e) => {
                warn!(record = &row[0], postcode, error = %e, "Failed to geocode");
                failed += 1;
            }
        }
    }

    writer.flush()?;
    info!(done, failed, output, "Geocoding complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedClient {
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.body.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_lookup_ok() {
        let client = CannedClient {
            body: r#"{"status":200,"result":{"latitude":55.93,"longitude":-3.20}}"#,
        };
        let (lat, lng) = lookup(&client, "EH10 5AA").await.unwrap();
        assert!((lat - 55.93).abs() < 1e-9);
        assert!((lng - -3.20).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let client = CannedClient {
            body: r#"{"status":404,"error":"Postcode not found"}"#,
        };
        assert!(lookup(&client, "XX1 1XX").await.is_err());
    }

    #[tokio::test]
    async fn test_lookup_missing_coordinates() {
        let client = CannedClient {
            body: r#"{"status":200,"result":{"latitude":null,"longitude":null}}"#,
        };
        assert!(lookup(&client, "EH10 5AA").await.is_err());
    }

    #[tokio::test]
    async fn test_geocode_file_appends_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(
            &input,
            "Record ID,Data Source,Allocated NN,Postcode\n\
             1,srcA,Morningside,EH10 5AA\n\
             2,srcA,Leith,EH6 4AA\n",
        )
        .unwrap();

        let client = CannedClient {
            body: r#"{"status":200,"result":{"latitude":55.93,"longitude":-3.2}}"#,
        };
        geocode_file(&client, input.to_str().unwrap(), output.to_str().unwrap(), 2)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        // first_record=2 skips row 1
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "2,srcA,Leith,EH6 4AA,55.93,-3.2");
    }

    #[tokio::test]
    async fn test_resumed_run_keeps_earlier_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(
            &input,
            "Record ID,Data Source,Allocated NN,Postcode\n\
             1,srcA,Morningside,EH10 5AA\n\
             2,srcA,Leith,EH6 4AA\n",
        )
        .unwrap();
        // Row 1 was geocoded by an earlier run that stopped before row 2.
        std::fs::write(&output, "1,srcA,Morningside,EH10 5AA,55.93,-3.2\n").unwrap();

        let client = CannedClient {
            body: r#"{"status":200,"result":{"latitude":55.97,"longitude":-3.17}}"#,
        };
        geocode_file(&client, input.to_str().unwrap(), output.to_str().unwrap(), 2)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1,srcA,Morningside,EH10 5AA,55.93,-3.2",
                "2,srcA,Leith,EH6 4AA,55.97,-3.17",
            ]
        );
    }
}
