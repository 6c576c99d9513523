//! zoneplot - Main entry point
//!
//! Thin CLI glue around the plotting pipeline: argument parsing, recursive
//! input discovery, output path construction and sample-data generation.
//! Everything with algorithmic content lives in the library modules.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use zoneplot::config::{CellCollision, RenderConfig, TickSpec, ZoneSelection, ZoneTimeMode};
use zoneplot::pipeline::{generate_from_datasets, generate_plot, OutputMode, PlotResult};
use zoneplot::plot::parser::{AxisSelection, Dataset, Record};
use zoneplot::plot::scale::Extent;

#[derive(Parser, Debug)]
#[command(
    name = "zoneplot",
    version,
    about = "Render zone-segmented simulation output as color-mapped grids"
)]
struct Args {
    /// The file to read in (the name to search for in recursive mode)
    #[arg(short, long, default_value = "Plot_Data_Elem")]
    file: String,

    /// Additional input files rendered as extra panel columns
    #[arg(long)]
    compare: Vec<PathBuf>,

    /// Which colormap to use
    #[arg(short, long, default_value = "jet")]
    colormap: String,

    /// Which columns to plot in the x, y and value dimensions, comma separated
    #[arg(short, long, default_value = "r,z,P")]
    axes: String,

    /// Labels for the x, y and value axes, comma separated
    #[arg(long)]
    axes_labels: Option<String>,

    /// Labels for the dataset columns, comma separated
    #[arg(long)]
    column_labels: Option<String>,

    /// The filename to save the resulting figure to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Traverse the directory tree looking for FILE
    #[arg(short, long)]
    recursive: bool,

    /// When running recursively, which directory to save plots to
    #[arg(long, default_value = "plots")]
    output_directory: PathBuf,

    /// Limit the drawn area: left,right,bottom,top
    #[arg(short, long)]
    extent: Option<String>,

    /// Number of ticks
    #[arg(short, long, default_value_t = 5)]
    ticks: usize,

    /// Step between consecutive ticks (replaces --ticks)
    #[arg(long, conflicts_with = "ticks")]
    tick_step: Option<f64>,

    /// Font size
    #[arg(long, default_value_t = 10)]
    font_size: u32,

    /// Which zones to plot, comma separated
    #[arg(short, long)]
    zones: Option<String>,

    /// Factor to multiply the zone number by for day labels
    #[arg(long, default_value_t = 365.0)]
    zone_factor: f64,

    /// Read day labels from the time literals embedded in zone markers
    #[arg(long)]
    embedded_times: bool,

    /// Explicit color scale minimum
    #[arg(long)]
    vmin: Option<f64>,

    /// Explicit color scale maximum
    #[arg(long)]
    vmax: Option<f64>,

    /// How to resolve duplicate grid coordinates: last or mean
    #[arg(long, default_value = "last")]
    collision: String,

    /// Export an animated GIF, one frame per zone
    #[arg(long)]
    animate: bool,

    /// Frame delay for animated output, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u32,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 1000)]
    height: u32,

    /// Plot some sample data
    #[arg(long)]
    sample_data: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    println!("zoneplot v{}", env!("CARGO_PKG_VERSION"));

    let axes = if args.sample_data {
        AxisSelection::new("x", "y", "z")
    } else {
        AxisSelection::parse(&args.axes)
            .ok_or_else(|| anyhow!("--axes must name three comma-separated fields"))?
    };
    let config = build_config(&args)?;
    let mode = if args.animate {
        OutputMode::Animate {
            delay_ms: args.delay_ms,
        }
    } else {
        OutputMode::Static
    };

    if args.sample_data {
        let dataset = sample_dataset();
        let result =
            generate_from_datasets(std::slice::from_ref(&dataset), &axes, &config, mode)?;
        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(format!("sample.{}", result.extension())));
        save_result(&result, &path)
    } else if args.recursive {
        run_recursive(&args, &axes, &config, mode)
    } else {
        let mut paths = vec![PathBuf::from(&args.file)];
        paths.extend(args.compare.iter().cloned());

        let result = generate_plot(&paths, &axes, &config, mode)?;
        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(format!("{}.{}", result.label, result.extension())));
        save_result(&result, &path)
    }
}

/// Recursive mode: find every match under the working directory and plot
/// each as an isolated unit of work; one failure never aborts the rest
fn run_recursive(
    args: &Args,
    axes: &AxisSelection,
    config: &RenderConfig,
    mode: OutputMode,
) -> Result<()> {
    let mut hits = Vec::new();
    search_files(Path::new("."), &args.file, &mut hits)?;
    if hits.is_empty() {
        return Err(anyhow!("no files named '{}' found", args.file));
    }

    if !args.output_directory.is_dir() {
        std::fs::create_dir_all(&args.output_directory).with_context(|| {
            format!(
                "failed to create output directory {}",
                args.output_directory.display()
            )
        })?;
    }

    let mut failures = 0usize;
    for hit in &hits {
        println!("plotting {}", hit.display());
        match generate_plot(std::slice::from_ref(hit), axes, config, mode) {
            Ok(result) => {
                let stem = sanitize_match_path(hit, &args.file);
                let path = args
                    .output_directory
                    .join(format!("{}.{}", stem, result.extension()));
                if let Err(e) = save_result(&result, &path) {
                    eprintln!("✗ failed to save {}: {:#}", path.display(), e);
                    failures += 1;
                }
            }
            Err(e) => {
                eprintln!("✗ failed to plot {}: {}", hit.display(), e);
                failures += 1;
            }
        }
    }

    println!(
        "✓ {} of {} plot(s) written to {}",
        hits.len() - failures,
        hits.len(),
        args.output_directory.display()
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<RenderConfig> {
    let axis_labels = match &args.axes_labels {
        Some(spec) => {
            let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [x, y, v] => Some((x.to_string(), y.to_string(), v.to_string())),
                _ => return Err(anyhow!("--axes-labels must name three comma-separated labels")),
            }
        }
        None => None,
    };

    let column_labels = args
        .column_labels
        .as_ref()
        .map(|spec| spec.split(',').map(|s| s.trim().to_string()).collect());

    let extent = match &args.extent {
        Some(spec) => Some(
            Extent::parse(spec)
                .ok_or_else(|| anyhow!("--extent must be left,right,bottom,top"))?,
        ),
        None => None,
    };

    let zones = match &args.zones {
        Some(spec) => ZoneSelection::parse(spec)
            .ok_or_else(|| anyhow!("--zones must be a comma-separated list of zone indices"))?,
        None => ZoneSelection::All,
    };

    let ticks = match args.tick_step {
        Some(step) if step > 0.0 => TickSpec::Interval(step),
        Some(_) => return Err(anyhow!("--tick-step must be positive")),
        None => TickSpec::Count(args.ticks),
    };

    let zone_time = if args.embedded_times {
        ZoneTimeMode::Embedded
    } else {
        ZoneTimeMode::Factor(args.zone_factor)
    };

    Ok(RenderConfig {
        colormap: args.colormap.clone(),
        ticks,
        font_size: args.font_size,
        axis_labels,
        column_labels,
        extent,
        scale_min: args.vmin,
        scale_max: args.vmax,
        zones,
        zone_time,
        collision: CellCollision::parse(&args.collision),
        width: args.width,
        height: args.height,
    })
}

/// Walk the directory tree collecting every file with the given name
fn search_files(dir: &Path, name: &str, hits: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            search_files(&path, name, hits)?;
        } else if entry.file_name().to_string_lossy() == name {
            hits.push(path);
        }
    }
    Ok(())
}

/// Flatten a match path into a single output stem
fn sanitize_match_path(path: &Path, file: &str) -> String {
    let stem: String = path
        .display()
        .to_string()
        .replace(file, "")
        .replace(['/', '\\'], "_")
        .replace('.', "");
    if stem.trim_matches('_').is_empty() {
        "plot".to_string()
    } else {
        stem
    }
}

fn save_result(result: &PlotResult, path: &Path) -> Result<()> {
    std::fs::write(path, &result.image)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "✓ wrote {} ({} bytes, {}x{})",
        path.display(),
        result.image.len(),
        result.width,
        result.height
    );
    Ok(())
}

/// Synthesize the demonstration field: four zones of a 100x100 sine surface
fn sample_dataset() -> Dataset {
    let mut records = Vec::new();
    for zone in 0..=3usize {
        for x in 0..100 {
            for y in 0..100 {
                let z = (x as f64 / 50.0).sin() * (y as f64 / 50.0).sin() * zone as f64;
                records.push(Record {
                    values: vec![x as f64, y as f64, z],
                    zone,
                    zone_time_days: None,
                });
            }
        }
    }

    Dataset {
        source: PathBuf::from("sample-data"),
        label: "sample".to_string(),
        fields: ["x", "y", "z", "zone", "zone_time"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        records,
        max_zone: 3,
        zone_times: vec![None; 4],
    }
}
