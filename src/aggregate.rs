//! Clustering of normalized records into per-neighbourhood point sets.

use crate::loader::SurveyRecord;
use std::collections::HashMap;
use tracing::debug;

/// All coordinate points contributed to one canonical neighbourhood.
///
/// Points keep input order; the order carries no meaning beyond making runs
/// reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighbourhoodCluster {
    pub category: String,
    pub points: Vec<(f64, f64)>,
}

impl NeighbourhoodCluster {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            points: Vec::new(),
        }
    }

    /// Arithmetic mean of the current point set, computed on read so it
    /// always reflects every point inserted so far.
    pub fn centroid(&self) -> (f64, f64) {
        let lats: Vec<f64> = self.points.iter().map(|p| p.0).collect();
        let lngs: Vec<f64> = self.points.iter().map(|p| p.1).collect();
        (mean(&lats), mean(&lngs))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty
/// input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Builds one cluster per category, in first-seen category order, with
/// points in input order.
#[tracing::instrument(skip(pairs), fields(records = pairs.len()))]
pub fn build_clusters(pairs: &[(String, SurveyRecord)]) -> Vec<NeighbourhoodCluster> {
    let mut clusters: Vec<NeighbourhoodCluster> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (category, record) in pairs {
        let i = *index.entry(category.clone()).or_insert_with(|| {
            clusters.push(NeighbourhoodCluster::new(category));
            clusters.len() - 1
        });
        clusters[i].points.push((record.lat, record.lng));
    }

    debug!(clusters = clusters.len(), "Clusters built");
    clusters
}
