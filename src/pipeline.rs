//! Shared plot generation pipeline
//!
//! One call per unit of work: parse the input files, settle the zone
//! selection, resolve the shared color scale, then render either the static
//! multi-panel figure or the animated frame sequence. The color scale is
//! always fixed before any drawing starts, so panels and frames stay
//! comparable.
//!
//! Batch callers (recursive directory mode) invoke `generate_plot` once per
//! match and isolate failures per item; nothing carries across invocations.

use std::path::PathBuf;

use crate::config::RenderConfig;
use crate::plot::animate::export_animation;
use crate::plot::error::Result;
use crate::plot::parser::{parse_file, AxisSelection, Dataset};
use crate::plot::render::render_figure;
use crate::plot::scale::resolve_scale;

/// Static figure or animated sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Static,
    Animate { delay_ms: u32 },
}

/// One finished plot, ready for the caller to persist or display
#[derive(Debug, Clone)]
pub struct PlotResult {
    /// Human-readable label, also the default output stem
    pub label: String,
    /// Encoded image bytes: PNG for static output, GIF for animation
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PlotResult {
    /// File extension matching the encoded image bytes
    pub fn extension(&self) -> &'static str {
        if self.image.starts_with(b"GIF") {
            "gif"
        } else {
            "png"
        }
    }
}

/// Generate one plot from input files on disk
pub fn generate_plot(
    paths: &[PathBuf],
    axes: &AxisSelection,
    config: &RenderConfig,
    mode: OutputMode,
) -> Result<PlotResult> {
    let datasets: Vec<Dataset> = paths.iter().map(|p| parse_file(p)).collect::<Result<_>>()?;
    generate_from_datasets(&datasets, axes, config, mode)
}

/// Generate one plot from already-parsed datasets
///
/// This is the full sequential pipeline: validate the zone selection,
/// resolve the shared color scale, then draw. Each step's failure aborts
/// only this invocation.
pub fn generate_from_datasets(
    datasets: &[Dataset],
    axes: &AxisSelection,
    config: &RenderConfig,
    mode: OutputMode,
) -> Result<PlotResult> {
    let zones = config.zones.resolve(datasets)?;

    let scale = resolve_scale(
        datasets,
        &zones,
        axes,
        config.extent.as_ref(),
        config.scale_min,
        config.scale_max,
    )?;

    eprintln!(
        "DEBUG pipeline: {} dataset(s), zones {:?}, scale [{:.3e}, {:.3e}]",
        datasets.len(),
        zones,
        scale.min,
        scale.max
    );

    let label = figure_label(axes);

    let (image, width, height) = match mode {
        OutputMode::Static => {
            let figure = render_figure(datasets, &zones, axes, &scale, config)?;
            let png = figure.to_png()?;
            (png, figure.width, figure.height)
        }
        OutputMode::Animate { delay_ms } => {
            let gif = export_animation(datasets, &zones, axes, &scale, config, delay_ms)?;
            (gif, config.width, config.height)
        }
    };

    Ok(PlotResult {
        label,
        image,
        width,
        height,
    })
}

/// Default figure label: "x vs y vs value"
pub fn figure_label(axes: &AxisSelection) -> String {
    format!("{} vs {} vs {}", axes.x, axes.y, axes.value)
}
