//! CLI entry point for the natural neighbourhoods heatmap tool.
//!
//! Provides subcommands for rendering the full survey-to-heatmap pipeline
//! and for the one-shot postcode geocoding pass that prepares its input.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nn_heatmap::emit::colour::ColourTable;
use nn_heatmap::emit::{self, EmitOptions};
use nn_heatmap::geocode::{self, BasicClient};
use nn_heatmap::normalise::{self, NormaliseOptions};
use nn_heatmap::{aggregate, loader};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "nn_heatmap")]
#[command(about = "Turn geocoded neighbourhood survey data into a heatmap", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over one geocoded survey CSV
    Render {
        /// Geocoded survey CSV: [id, source, neighbourhood, postcode, lat, lng]
        #[arg(value_name = "INPUT_CSV")]
        input: String,

        /// Directory for per-neighbourhood artifacts and the manifest
        #[arg(short, long, default_value = "heatmap_data")]
        output_dir: PathBuf,

        /// Optional colour override table (name, frequency, colour_or_none)
        #[arg(short, long)]
        colours: Option<String>,

        /// Drop neighbourhoods with fewer than this many responses
        #[arg(short, long, default_value_t = 10)]
        threshold: usize,

        /// Keep the pre-slash umbrella segment of multi-answers
        #[arg(long, default_value_t = false)]
        keep_umbrella: bool,

        /// Optional: also write a GeoJSON FeatureCollection of all records
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Optional: also write the normalized record set as CSV
        #[arg(long)]
        filtered_csv: Option<PathBuf>,
    },
    /// Geocode a raw survey CSV (postcode -> lat/lng via postcodes.io)
    Geocode {
        /// Raw survey CSV: [id, source, neighbourhood, postcode, ...]
        #[arg(value_name = "INPUT_CSV")]
        input: String,

        /// Geocoded CSV to write
        #[arg(short, long, default_value = "nn_latlng.csv")]
        output: String,

        /// Skip rows with a record id below this (resume a partial run)
        #[arg(long, default_value_t = 0)]
        first_record: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/nn_heatmap.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("nn_heatmap.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output_dir,
            colours,
            threshold,
            keep_umbrella,
            geojson,
            filtered_csv,
        } => {
            let records = loader::read_records(&input)?;
            info!(records = records.len(), input = %input, "Survey data loaded");

            let norm_opts = NormaliseOptions {
                threshold,
                keep_umbrella,
            };
            let expanded = normalise::expand(records, &norm_opts);
            // Frequencies are reported over the full post-collapse set so
            // rare names show up in nn_freq.csv too.
            let frequencies = normalise::frequencies(&expanded);
            let pairs = normalise::filter_rare(expanded, norm_opts.threshold);
            let clusters = aggregate::build_clusters(&pairs);

            let table = match colours {
                Some(path) => ColourTable::load(&path)?,
                None => ColourTable::empty(),
            };

            let emit_opts = EmitOptions {
                output_dir,
                geojson,
                filtered_csv,
            };
            emit::emit(&clusters, &pairs, &frequencies, &table, &emit_opts)?;
        }
        Commands::Geocode {
            input,
            output,
            first_record,
        } => {
            let client = BasicClient::new();
            geocode::geocode_file(&client, &input, &output, first_record).await?;
        }
    }

    Ok(())
}
