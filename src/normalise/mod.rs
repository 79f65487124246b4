//! Neighbourhood name normalization.
//!
//! Maps the free-text "natural neighbourhood" field of each survey record to
//! zero or more canonical category names: drop unsupplied/catch-all answers,
//! expand slash-separated multi-answers, collapse aliases via the rule table,
//! and filter out categories too rare to be meaningful.

pub mod rules;

use crate::loader::SurveyRecord;
use std::collections::HashMap;
use tracing::{debug, info};

/// Respondents who left the neighbourhood question blank.
const NOT_SUPPLIED: &str = "NN not supplied";

/// City-wide catch-all answers carry no neighbourhood signal.
const EXCLUDED_SUBSTRING: &str = "Edinburgh";

/// Tunable normalization policy.
#[derive(Debug, Clone)]
pub struct NormaliseOptions {
    /// Categories with fewer occurrences than this are dropped entirely.
    pub threshold: usize,
    /// Keep the pre-slash umbrella segment of a multi-answer instead of
    /// discarding it. The source data's collection history is inconsistent
    /// on this, so it is a policy knob rather than a constant.
    pub keep_umbrella: bool,
}

impl Default for NormaliseOptions {
    fn default() -> Self {
        Self {
            threshold: 10,
            keep_umbrella: false,
        }
    }
}

/// Returns true if the raw answer should be dropped before any other
/// processing.
fn excluded(raw: &str) -> bool {
    raw == NOT_SUPPLIED || raw.contains(EXCLUDED_SUBSTRING)
}

/// Expands a raw answer into its working names.
///
/// `"A/B/C"` becomes `["B", "C"]`: the first segment is an umbrella label
/// made redundant by the segments that follow it, unless `keep_umbrella` is
/// set. A name with no slash passes through as a single entry.
fn expand_slashes(raw: &str, keep_umbrella: bool) -> Vec<&str> {
    let segments: Vec<&str> = raw.split('/').collect();
    if segments.len() == 1 {
        return segments;
    }
    let skip = if keep_umbrella { 0 } else { 1 };
    segments.into_iter().skip(skip).collect()
}

/// Expands a loaded record set into ordered `(category, record)` pairs:
/// exclusion filter, slash expansion, postcode upper-casing, and alias
/// collapsing, but not yet the rarity filter.
///
/// Total over well-formed input: no rule gap is an error, a name matching
/// no alias rule passes through unchanged.
pub fn expand(records: Vec<SurveyRecord>, opts: &NormaliseOptions) -> Vec<(String, SurveyRecord)> {
    let mut expanded: Vec<(String, SurveyRecord)> = Vec::new();

    for record in records {
        if excluded(&record.raw_category) {
            continue;
        }

        for working in expand_slashes(&record.raw_category, opts.keep_umbrella) {
            let working = working.trim();
            if working.is_empty() {
                continue;
            }

            let canonical = rules::collapse(working);
            if canonical != working {
                debug!(from = working, to = %canonical, "Collapsed name");
            }

            // Derived record: postcode upper-cased, category rewritten.
            let mut derived = record.clone();
            derived.postcode = derived.postcode.to_uppercase();
            derived.raw_category = canonical.clone();
            expanded.push((canonical, derived));
        }
    }

    expanded
}

/// Drops every pair whose canonical name occurs fewer than `threshold`
/// times across the whole set. Dropped categories vanish entirely, they are
/// never merged into another bucket.
pub fn filter_rare(
    expanded: Vec<(String, SurveyRecord)>,
    threshold: usize,
) -> Vec<(String, SurveyRecord)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (name, _) in &expanded {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let before = expanded.len();
    let kept: Vec<(String, SurveyRecord)> = expanded
        .iter()
        .filter(|(name, _)| counts[name.as_str()] >= threshold)
        .cloned()
        .collect();

    info!(
        kept = kept.len(),
        dropped_rare = before - kept.len(),
        threshold,
        "Normalization complete"
    );
    kept
}

/// Normalizes a loaded record set into ordered `(category, record)` pairs.
///
/// Every emitted category occurs at least `opts.threshold` times; no record
/// with an unsupplied or excluded raw name survives. Input order is
/// preserved.
#[tracing::instrument(skip(records), fields(input = records.len()))]
pub fn normalise(
    records: Vec<SurveyRecord>,
    opts: &NormaliseOptions,
) -> Vec<(String, SurveyRecord)> {
    filter_rare(expand(records, opts), opts.threshold)
}

/// Counts canonical names over a normalized pair set, sorted by descending
/// count with a lexicographic tie-break.
pub fn frequencies(pairs: &[(String, SurveyRecord)]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (name, _) in pairs {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let mut freq: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    freq
}
