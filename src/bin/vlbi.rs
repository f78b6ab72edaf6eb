// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
A thin demonstration front end for `vlbi-core`: read a station/target
description from a config file, fill a UV-plane model, and report a coverage
summary. This is deliberately minimal — a production host application (with
its own file formats and command protocol) is expected to be built directly
on the library, not on this binary.
*/

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use vlbi_core::context::PlotOptions;
use vlbi_core::grid::DepositMode;
use vlbi_core::node::SampleStream;
use vlbi_core::{Context, VlbiError};

#[derive(Parser, Debug)]
#[clap(name = "vlbi", about = "Fill a UV-plane model from a station config")]
struct Args {
    /// Path to a station/target description (TOML, YAML or JSON, inferred
    /// from extension).
    #[clap(long, parse(from_os_str))]
    config: PathBuf,

    /// Grid width and height in cells. Overrides the config file's `size`
    /// when passed.
    #[clap(long)]
    size: Option<usize>,

    /// Observation span, in seconds from the config's reference epoch.
    #[clap(long, default_value_t = 1.0)]
    duration_s: f64,

    /// Maximum number of concurrently running baseline workers. Overrides
    /// the config file's `max_threads` when passed.
    #[clap(long)]
    max_threads: Option<usize>,

    /// Fill UV coverage (presence/absence) instead of averaged
    /// visibilities. Overrides the config file's `coverage_only` when
    /// passed.
    #[clap(long)]
    coverage_only: bool,

    /// Use each baseline's own moving location track, if present.
    /// Overrides the config file's `moving_baseline` when passed.
    #[clap(long)]
    moving_baseline: bool,

    /// Skip delay referencing and correlate samples at the same local
    /// time. Overrides the config file's `nodelay` when passed.
    #[clap(long)]
    nodelay: bool,

    /// Verbosity: pass more than once for more detail.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,
}

/// Everything a [`Context::get_uv_plot`] call needs, so that repeated
/// observations can be scripted from a config file alone — CLI flags only
/// override the fields they were actually given.
#[derive(Deserialize, Debug)]
struct StationConfig {
    ra_rad: f64,
    dec_rad: f64,
    /// Array reference location. When absent, baselines project relative
    /// to their own two nodes' midpoint.
    array_location: Option<(f64, f64, f64)>,
    /// Grid width and height in cells. Defaults to 256 when absent from
    /// both the config and the CLI.
    #[serde(default)]
    size: Option<usize>,
    /// Maximum number of concurrently running baseline workers. Defaults
    /// to 4 when absent from both the config and the CLI.
    #[serde(default)]
    max_threads: Option<usize>,
    /// Fill UV coverage instead of averaged visibilities.
    #[serde(default)]
    coverage_only: bool,
    /// Use each baseline's own moving location track, if present.
    #[serde(default)]
    moving_baseline: bool,
    /// Skip delay referencing and correlate samples at the same local time.
    #[serde(default)]
    nodelay: bool,
    stations: Vec<StationEntry>,
}

#[derive(Deserialize, Debug)]
struct StationEntry {
    name: String,
    lat_deg: f64,
    lon_deg: f64,
    el_m: f64,
    sample_rate_hz: f64,
    wavelength_m: f64,
    samples: Vec<f64>,
}

fn setup_logging(level: u8) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match level {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<StationConfig, VlbiError> {
    let raw = fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&raw)
            .map_err(|e| VlbiError::InvalidInput(format!("bad YAML config: {e}"))),
        "json" => serde_json::from_str(&raw)
            .map_err(|e| VlbiError::InvalidInput(format!("bad JSON config: {e}"))),
        _ => toml::from_str(&raw)
            .map_err(|e| VlbiError::InvalidInput(format!("bad TOML config: {e}"))),
    }
}

fn main() -> Result<(), VlbiError> {
    let args = Args::parse();
    setup_logging(args.verbosity).map_err(|e| VlbiError::Generic(e.to_string()))?;

    let config = load_config(&args.config)?;
    let mut ctx = Context::new();
    for station in &config.stations {
        ctx.add_node(
            &station.name,
            SampleStream::new(
                station.samples.clone(),
                0.0,
                station.sample_rate_hz,
                station.wavelength_m,
            ),
            (station.lat_deg, station.lon_deg, station.el_m),
            true,
        )?;
    }
    if let Some((lat, lon, el)) = config.array_location {
        ctx.set_location(lat, lon, el);
    }
    log::info!(
        "loaded {} stations, {} baselines",
        ctx.list_nodes().len(),
        ctx.baselines().len()
    );

    let size = args.size.or(config.size).unwrap_or(256);
    let max_threads = args.max_threads.or(config.max_threads).unwrap_or(4);
    let coverage_only = args.coverage_only || config.coverage_only;
    let moving_baseline = args.moving_baseline || config.moving_baseline;
    let nodelay = args.nodelay || config.nodelay;

    let options = PlotOptions {
        ra: config.ra_rad,
        dec: config.dec_rad,
        mode: if coverage_only {
            DepositMode::Coverage
        } else {
            DepositMode::ApertureSynthesis
        },
        moving_baseline,
        nodelay,
        max_threads,
        show_progress: args.verbosity > 0,
    };

    ctx.get_uv_plot("model", size, size, 0.0, args.duration_s, options, None)?;

    let model = ctx.get_model("model").expect("just inserted");
    println!(
        "filled {} cell(s) out of {} ({:.2}% coverage)",
        model.coverage_count(),
        size * size,
        100.0 * model.coverage_count() as f64 / (size * size) as f64
    );
    Ok(())
}
