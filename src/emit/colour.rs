//! Deterministic colour assignment for neighbourhood categories.
//!
//! A category either takes its colour verbatim from an external override
//! table, or is placed at an evenly spaced point on the hue circle. The
//! generated spacing is 1/N over the categories that need a colour, walked
//! in lexicographic order, so a fixed category set always colours the same
//! way.

use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use tracing::debug;

/// Generated colours use a fixed half-saturation, half-value HSV band so
/// neighbours stay readable over a base map.
const GEN_SATURATION: f64 = 0.5;
const GEN_VALUE: f64 = 0.5;

/// Optional external colour overrides, keyed by canonical name.
///
/// A missing entry and an explicit empty/"none" entry both mean "generate".
#[derive(Debug, Default)]
pub struct ColourTable {
    entries: HashMap<String, Option<String>>,
}

impl ColourTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads overrides from a CSV of `(canonical_name, frequency, colour)`
    /// rows. The frequency column is informational and ignored here; the
    /// colour column may be empty or "none" to request a generated colour.
    pub fn load(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut entries = HashMap::new();
        for result in rdr.records() {
            let row = result?;
            if row.is_empty() {
                continue;
            }
            let name = row[0].trim().to_string();
            let colour = row
                .get(2)
                .map(str::trim)
                .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("none"))
                .map(|c| c.trim_start_matches('#').to_lowercase());
            entries.insert(name, colour);
        }

        debug!(entries = entries.len(), path, "Colour table loaded");
        Ok(Self { entries })
    }

    /// Returns the override colour for `name`, if one is usable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|c| c.as_deref())
    }
}

/// Converts HSV (hue in degrees, s/v in 0..=1) to RGB in 0..=1.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

fn to_hex(r: f64, g: f64, b: f64) -> String {
    format!(
        "{:02x}{:02x}{:02x}",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8
    )
}

/// Parses a 6-digit hex colour into RGB bytes.
pub fn parse_hex(colour: &str) -> Result<(u8, u8, u8)> {
    let c = colour.trim_start_matches('#');
    if c.len() != 6 {
        return Err(anyhow!("expected 6-digit hex colour, got {:?}", colour));
    }
    Ok((
        u8::from_str_radix(&c[0..2], 16)?,
        u8::from_str_radix(&c[2..4], 16)?,
        u8::from_str_radix(&c[4..6], 16)?,
    ))
}

/// Assigns a colour to every category.
///
/// Table overrides are used verbatim; the rest are spread evenly around the
/// hue circle in lexicographic category order. Output is a sorted map so
/// downstream artifacts are reproducible byte for byte.
pub fn assign_colours(categories: &[String], table: &ColourTable) -> BTreeMap<String, String> {
    let mut sorted: Vec<&String> = categories.iter().collect();
    sorted.sort();
    sorted.dedup();

    let needing: Vec<&String> = sorted
        .iter()
        .copied()
        .filter(|name| table.get(name).is_none())
        .collect();
    let n = needing.len().max(1);

    let mut assigned = BTreeMap::new();
    let mut next = 0usize;

    for name in sorted {
        let colour = match table.get(name) {
            Some(c) => c.to_string(),
            None => {
                let hue = 360.0 * next as f64 / n as f64;
                next += 1;
                let (r, g, b) = hsv_to_rgb(hue, GEN_SATURATION, GEN_VALUE);
                to_hex(r, g, b)
            }
        };
        assigned.insert(name.clone(), colour);
    }

    assigned
}
