//! Render configuration
//!
//! All rendering policy lives in one value: colormap, tick placement, fonts,
//! labels, extent clipping, explicit color-scale overrides, zone selection
//! and the zone-to-day labeling strategy. There are no ambient globals; the
//! pipeline threads a `RenderConfig` through every call.

use crate::plot::error::{PlotError, Result};
use crate::plot::palettes::DEFAULT_COLORMAP;
use crate::plot::parser::Dataset;
use crate::plot::scale::Extent;

/// How to resolve duplicate (x, y) coordinates within one zone
///
/// `Last` matches pivot semantics: the last record in input order wins.
/// `Mean` averages every colliding record instead. One policy applies to the
/// whole run; the two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellCollision {
    #[default]
    Last,
    Mean,
}

impl CellCollision {
    /// Parse from string value; anything unrecognized falls back to `Last`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mean" => Self::Mean,
            _ => Self::Last, // "last" or any other value
        }
    }
}

/// Tick placement mode
///
/// Either a fixed number of evenly spaced ticks across the visible range or
/// a fixed step between consecutive ticks. The two modes produce visually
/// different results and are chosen per invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickSpec {
    /// Evenly spaced ticks, endpoints included
    Count(usize),
    /// Ticks at multiples of the step inside the visible range
    Interval(f64),
}

impl Default for TickSpec {
    fn default() -> Self {
        TickSpec::Count(5)
    }
}

impl TickSpec {
    /// Compute tick positions for a visible range
    pub fn ticks(&self, lo: f64, hi: f64) -> Vec<f64> {
        if !lo.is_finite() || !hi.is_finite() || hi < lo {
            return Vec::new();
        }
        match *self {
            TickSpec::Count(0) => Vec::new(),
            TickSpec::Count(1) => vec![(lo + hi) / 2.0],
            TickSpec::Count(n) => {
                let step = (hi - lo) / (n - 1) as f64;
                (0..n).map(|i| lo + step * i as f64).collect()
            }
            TickSpec::Interval(step) => {
                if step <= 0.0 {
                    return Vec::new();
                }
                let mut ticks = Vec::new();
                let mut k = (lo / step).ceil();
                // Guard against steps that would produce an absurd tick count
                let max_ticks = 1000;
                while k * step <= hi + step * 1e-9 && ticks.len() < max_ticks {
                    ticks.push(k * step);
                    k += 1.0;
                }
                ticks
            }
        }
    }
}

/// How a zone index maps onto the "Day N" panel title
///
/// `Embedded` reads the quoted time literal from the zone's boundary marker;
/// `Factor` multiplies the zone index by a fixed day count. The strategy is
/// chosen per input format capability and never mixed within one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneTimeMode {
    Embedded,
    Factor(f64),
}

impl Default for ZoneTimeMode {
    fn default() -> Self {
        // Historical default for formats without embedded times
        ZoneTimeMode::Factor(365.0)
    }
}

impl ZoneTimeMode {
    /// Compute the day label value for one zone of a dataset
    pub fn day_for(&self, dataset: &Dataset, zone: usize) -> Result<f64> {
        match *self {
            ZoneTimeMode::Factor(factor) => Ok(zone as f64 * factor),
            ZoneTimeMode::Embedded => dataset
                .zone_times
                .get(zone)
                .copied()
                .flatten()
                .ok_or_else(|| PlotError::Parse {
                    file: dataset.source.clone(),
                    message: format!(
                        "zone {} carries no embedded time literal; use a zone factor instead",
                        zone
                    ),
                }),
        }
    }
}

/// Which zones to render, in order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ZoneSelection {
    /// The full range `[0, max_zone]`, ascending
    #[default]
    All,
    /// An explicit ordered list of zone indices
    Explicit(Vec<usize>),
}

impl ZoneSelection {
    /// Parse a comma-separated list of zone indices
    pub fn parse(spec: &str) -> Option<Self> {
        let zones: Option<Vec<usize>> = spec
            .split(',')
            .map(|t| t.trim().parse::<usize>().ok())
            .collect();
        zones.map(ZoneSelection::Explicit)
    }

    /// Resolve the selection against a set of datasets
    ///
    /// An explicit index above a dataset's highest zone is a fatal range
    /// error naming both the index and that dataset's actual maximum; it is
    /// never silently truncated or clamped.
    pub fn resolve(&self, datasets: &[Dataset]) -> Result<Vec<usize>> {
        match self {
            ZoneSelection::All => {
                let max_zone = datasets.iter().map(|d| d.max_zone).max().unwrap_or(0);
                Ok((0..=max_zone).collect())
            }
            ZoneSelection::Explicit(zones) => {
                for dataset in datasets {
                    if let Some(&requested) = zones.iter().find(|&&z| z > dataset.max_zone) {
                        return Err(PlotError::Range {
                            file: dataset.source.clone(),
                            requested,
                            max_zone: dataset.max_zone,
                        });
                    }
                }
                Ok(zones.clone())
            }
        }
    }
}

/// Layout, styling and policy for one render invocation
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Colormap name, resolved against the palette registry
    pub colormap: String,

    /// Tick placement for both axes and the colorbar
    pub ticks: TickSpec,

    /// Font size in points for every text element
    pub font_size: u32,

    /// Labels for the x, y and value axes; defaults to the axis field names
    pub axis_labels: Option<(String, String, String)>,

    /// One label per dataset column; defaults to dataset labels when several
    /// datasets are rendered side by side
    pub column_labels: Option<Vec<String>>,

    /// Optional spatial clip applied to both the color scale and every
    /// panel's view
    pub extent: Option<Extent>,

    /// Explicit color-scale minimum; replaces the computed value
    pub scale_min: Option<f64>,

    /// Explicit color-scale maximum; replaces the computed value
    pub scale_max: Option<f64>,

    /// Which zones to render
    pub zones: ZoneSelection,

    /// How panel titles derive days from zones
    pub zone_time: ZoneTimeMode,

    /// Duplicate-coordinate policy for the grid builder
    pub collision: CellCollision,

    /// Figure width in pixels
    pub width: u32,

    /// Figure height in pixels
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            colormap: DEFAULT_COLORMAP.to_string(),
            ticks: TickSpec::default(),
            font_size: 10,
            axis_labels: None,
            column_labels: None,
            extent: None,
            scale_min: None,
            scale_max: None,
            zones: ZoneSelection::default(),
            zone_time: ZoneTimeMode::default(),
            collision: CellCollision::default(),
            width: 1000,
            height: 1000,
        }
    }
}
