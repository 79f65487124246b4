//! Visualization output: per-category data artifacts, frequency report,
//! manifest, and the optional GeoJSON / filtered-CSV exports.
//!
//! Everything written here is a pure function of the cluster set and colour
//! table, so rerunning over identical inputs reproduces every artifact byte
//! for byte. Per-category artifacts land on disk before the manifest that
//! references them.

pub mod colour;
pub mod manifest;

use crate::aggregate::NeighbourhoodCluster;
use crate::loader::SurveyRecord;
use anyhow::{Context, Result, bail};
use colour::ColourTable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output destinations for one emitter run.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub output_dir: PathBuf,
    /// Optional GeoJSON dump of every surviving record.
    pub geojson: Option<PathBuf>,
    /// Optional CSV dump of the normalized record set.
    pub filtered_csv: Option<PathBuf>,
}

/// File-system-safe artifact name for a category: lower case, spaces to
/// underscores, apostrophes removed. Doubles as the JS variable name.
pub fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_").replace('\'', "")
}

/// Contents of one per-category artifact: a JS file defining the category's
/// point list as `[[lat, lng], ...]`.
pub fn layer_contents(cluster: &NeighbourhoodCluster) -> Result<String> {
    let points: Vec<[f64; 2]> = cluster.points.iter().map(|&(lat, lng)| [lat, lng]).collect();
    Ok(format!(
        "var {} = \n{}",
        slug(&cluster.category),
        serde_json::to_string(&points)?
    ))
}

#[derive(Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

#[derive(Serialize)]
struct FeatureProperties {
    nn: String,
    postcode: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    geometry: Geometry,
    properties: FeatureProperties,
}

#[derive(Serialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature>,
}

fn feature_collection(pairs: &[(String, SurveyRecord)]) -> FeatureCollection {
    let features = pairs
        .iter()
        .map(|(name, record)| Feature {
            kind: "Feature",
            id: record.id.clone(),
            geometry: Geometry {
                kind: "Point",
                coordinates: [record.lat, record.lng],
            },
            properties: FeatureProperties {
                nn: name.clone(),
                postcode: record.postcode.clone(),
            },
        })
        .collect();
    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}

/// Writes the `(category, count)` frequency report.
///
/// The counts cover the whole post-collapse record set, rare names
/// included, so the file doubles as a starting point for a colour override
/// table.
fn write_frequency_report(path: &Path, frequencies: &[(String, usize)]) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    for (name, count) in frequencies {
        let count = count.to_string();
        writer.write_record([name.as_str(), count.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

const FILTERED_HEADER: [&str; 6] = [
    "Record ID",
    "Data Source",
    "Allocated NN",
    "Postcode",
    "Latitude",
    "Longitude",
];

/// Dumps the normalized record set as a CSV with the input header.
fn write_filtered_csv(path: &Path, pairs: &[(String, SurveyRecord)]) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record(FILTERED_HEADER)?;
    for (name, record) in pairs {
        let lat = record.lat.to_string();
        let lng = record.lng.to_string();
        writer.write_record([
            record.id.as_str(),
            record.source.as_str(),
            name.as_str(),
            record.postcode.as_str(),
            lat.as_str(),
            lng.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Runs the full emitter: colours, per-category artifacts, frequency
/// report, optional exports, and finally the manifest.
///
/// # Errors
///
/// Fails fast when the cluster set is empty (nothing to render) or on any
/// I/O error. The manifest is written last so a failed run never leaves a
/// manifest referencing missing artifacts.
#[tracing::instrument(
    skip(clusters, pairs, frequencies, table),
    fields(clusters = clusters.len())
)]
pub fn emit(
    clusters: &[NeighbourhoodCluster],
    pairs: &[(String, SurveyRecord)],
    frequencies: &[(String, usize)],
    table: &ColourTable,
    opts: &EmitOptions,
) -> Result<()> {
    if clusters.is_empty() {
        bail!("no categories survived normalization, nothing to render");
    }

    fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("creating output dir {}", opts.output_dir.display()))?;

    let categories: Vec<String> = clusters.iter().map(|c| c.category.clone()).collect();
    let colours = colour::assign_colours(&categories, table);

    let mut layers = BTreeMap::new();
    for cluster in clusters {
        let name = slug(&cluster.category);
        let path = opts.output_dir.join(format!("{}.js", name));
        fs::write(&path, layer_contents(cluster)?)
            .with_context(|| format!("writing {}", path.display()))?;
        debug!(category = %cluster.category, points = cluster.len(), path = %path.display(), "Layer written");

        layers.insert(
            cluster.category.clone(),
            manifest::layer_params(&name, &colours[&cluster.category])?,
        );
    }

    write_frequency_report(&opts.output_dir.join("nn_freq.csv"), frequencies)?;

    if let Some(path) = &opts.geojson {
        let collection = feature_collection(pairs);
        fs::write(path, serde_json::to_string(&collection)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(features = collection.features.len(), path = %path.display(), "GeoJSON written");
    }

    if let Some(path) = &opts.filtered_csv {
        write_filtered_csv(path, pairs)?;
        info!(rows = pairs.len(), path = %path.display(), "Filtered CSV written");
    }

    // Manifest last: every artifact it references already exists.
    let config = manifest::ManifestConfig {
        radius: manifest::RADIUS,
        blur: manifest::BLUR,
        layers,
    };
    let manifest_path = opts.output_dir.join("index.html");
    fs::write(&manifest_path, manifest::render(&config)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    info!(
        layers = clusters.len(),
        output_dir = %opts.output_dir.display(),
        "Heatmap artifacts written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(category: &str, points: &[(f64, f64)]) -> NeighbourhoodCluster {
        NeighbourhoodCluster {
            category: category.to_string(),
            points: points.to_vec(),
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("The Grange"), "the_grange");
        assert_eq!(slug("Craigie's Mill"), "craigies_mill");
        assert_eq!(slug("Leith"), "leith");
    }

    #[test]
    fn test_layer_contents_shape() {
        let c = cluster("Dean Village", &[(55.95, -3.22), (55.96, -3.23)]);
        let contents = layer_contents(&c).unwrap();
        assert_eq!(
            contents,
            "var dean_village = \n[[55.95,-3.22],[55.96,-3.23]]"
        );
    }

    #[test]
    fn test_emit_empty_cluster_set_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let opts = EmitOptions {
            output_dir: dir.path().join("out"),
            geojson: None,
            filtered_csv: None,
        };
        let result = emit(&[], &[], &[], &ColourTable::empty(), &opts);
        assert!(result.is_err());
        // Nothing to render means nothing written at all.
        assert!(!opts.output_dir.exists());
    }

    #[test]
    fn test_geojson_feature_shape() {
        let pairs = vec![(
            "Leith".to_string(),
            SurveyRecord {
                id: "7".to_string(),
                source: "srcA".to_string(),
                raw_category: "Leith".to_string(),
                postcode: "EH6 4AA".to_string(),
                lat: 55.97,
                lng: -3.17,
            },
        )];
        let collection = feature_collection(&pairs);
        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.contains("\"type\":\"FeatureCollection\""));
        assert!(json.contains("\"id\":\"7\""));
        assert!(json.contains("\"coordinates\":[55.97,-3.17]"));
        assert!(json.contains("\"nn\":\"Leith\""));
    }
}
