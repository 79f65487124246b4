//! Heatmap manifest generation.
//!
//! The manifest is a single HTML document that pulls in every per-category
//! data artifact via a script tag and embeds a JSON config block with the
//! rendering parameters a heatmap layer needs: base colour, a three-stop
//! gradient derived from it, and shared radius/blur constants.

use crate::emit::colour::parse_hex;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Shared heatmap layer constants.
pub const RADIUS: u32 = 25;
pub const BLUR: u32 = 15;

/// Gradient stop positions and how far each stop is blended towards white
/// from the base colour. The innermost stop is the base colour itself.
const STOP_BLENDS: [(&str, f64); 3] = [("0.4", 0.55), ("0.65", 0.25), ("1.0", 0.0)];

/// Rendering parameters for one category layer.
#[derive(Debug, Serialize)]
pub struct LayerParams {
    /// Data artifact file name, relative to the manifest.
    pub file: String,
    /// JS variable the artifact defines.
    pub var_name: String,
    /// Base colour as `#rrggbb`.
    pub colour: String,
    /// Stop position -> colour, lightest at the lowest stop.
    pub gradient: BTreeMap<String, String>,
}

/// Top-level manifest config embedded in the HTML document.
#[derive(Debug, Serialize)]
pub struct ManifestConfig {
    pub radius: u32,
    pub blur: u32,
    pub layers: BTreeMap<String, LayerParams>,
}

/// Blends an RGB colour towards white by `t` (0 = unchanged, 1 = white).
fn lighten(rgb: (u8, u8, u8), t: f64) -> String {
    let blend = |c: u8| -> u8 { (c as f64 + (255.0 - c as f64) * t).round() as u8 };
    format!("#{:02x}{:02x}{:02x}", blend(rgb.0), blend(rgb.1), blend(rgb.2))
}

/// Derives the three fixed gradient stops from a base colour.
pub fn gradient_stops(colour: &str) -> Result<BTreeMap<String, String>> {
    let rgb = parse_hex(colour)?;
    let mut stops = BTreeMap::new();
    for (stop, t) in STOP_BLENDS {
        stops.insert(stop.to_string(), lighten(rgb, t));
    }
    Ok(stops)
}

/// Builds a [`LayerParams`] for one category.
pub fn layer_params(slug: &str, colour: &str) -> Result<LayerParams> {
    Ok(LayerParams {
        file: format!("{}.js", slug),
        var_name: slug.to_string(),
        colour: format!("#{}", colour),
        gradient: gradient_stops(colour)?,
    })
}

/// Renders the manifest HTML.
///
/// Pure function of its inputs: identical layer sets produce identical
/// bytes. Layers are keyed by canonical name in a sorted map, so iteration
/// order is stable.
pub fn render(config: &ManifestConfig) -> Result<String> {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Natural neighbourhoods heatmap</title>\n");
    html.push_str("</head>\n<body>\n<div id=\"map\"></div>\n");

    for layer in config.layers.values() {
        html.push_str(&format!("<script src=\"{}\"></script>\n", layer.file));
    }

    html.push_str("<script>\nvar heatmapConfig = ");
    html.push_str(&serde_json::to_string_pretty(config)?);
    html.push_str(";\n</script>\n</body>\n</html>\n");
    Ok(html)
}
