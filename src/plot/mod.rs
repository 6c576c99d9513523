//! Core plotting library: parse zone-segmented output, pivot it into dense
//! grids and render color-mapped panels
//!
//! Structure:
//! - `parser.rs`: text format parser (records, zones, embedded times)
//! - `grid.rs`: per-zone pivot into dense rectangular fields
//! - `scale.rs`: shared color-scale resolution
//! - `palettes.rs`: embedded colormap registry
//! - `render.rs`: multi-panel figure composition
//! - `animate.rs`: animated GIF export
//! - `error.rs`: error types

pub mod animate;
pub mod error;
pub mod grid;
pub mod palettes;
pub mod parser;
pub mod render;
pub mod scale;

// Re-exports for convenience
pub use error::{PlotError, Result};
pub use grid::{build_grid, Grid};
pub use parser::{parse_file, parse_text, AxisSelection, Dataset, Record};
pub use render::{render_figure, Figure};
pub use scale::{resolve_scale, ColorScale, Extent};
