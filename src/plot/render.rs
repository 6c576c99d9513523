//! Multi-panel render engine
//!
//! Composes one figure from a grid of panels: one row per selected zone, one
//! column per dataset. Every panel shares the same x/y view, the same
//! normalization and the same colormap; a single colorbar on the right edge
//! is keyed to the shared color scale. Only outer panels draw tick labels,
//! and each row carries its zone's physical time as a rotated side title.

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::error::{PlotError, Result};
use super::grid::{build_grid, Grid};
use super::palettes::{PaletteDefinition, PALETTE_REGISTRY};
use super::parser::{AxisSelection, Dataset, ResolvedAxes};
use super::scale::ColorScale;
use crate::config::RenderConfig;

/// Width reserved for the shared colorbar, in pixels
const COLORBAR_GUTTER: u32 = 110;

/// Right margin inside each panel, where the rotated zone title is drawn
const ROW_TITLE_GUTTER: i32 = 26;

/// A rendered figure: raw RGB pixels plus dimensions
///
/// The engine never touches the filesystem; serializing (or discarding) the
/// figure is the caller's decision.
pub struct Figure {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8 pixel data, `width * height * 3` bytes
    pub rgb: Vec<u8>,
}

impl Figure {
    /// Encode the pixel data as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;

        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.rgb, self.width, self.height, image::ColorType::Rgb8)
            .map_err(|e| PlotError::Render(format!("PNG encoding failed: {}", e)))?;
        Ok(out)
    }
}

/// An axis range carrying its own precomputed tick positions
///
/// plotters' stock f64 coordinate picks "nice" tick positions on its own;
/// this wrapper pins them to exactly what the tick mode computed, which is
/// what makes count mode and interval mode produce different figures.
#[derive(Clone)]
pub struct TickedRange {
    lo: f64,
    hi: f64,
    ticks: Vec<f64>,
}

impl TickedRange {
    pub fn new(lo: f64, hi: f64, ticks: Vec<f64>) -> Self {
        TickedRange { lo, hi, ticks }
    }
}

impl Ranged for TickedRange {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let span = self.hi - self.lo;
        if span == 0.0 || !span.is_finite() {
            return limit.0;
        }
        let t = (value - self.lo) / span;
        limit.0 + ((limit.1 - limit.0) as f64 * t).round() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.max_num_points() == 0 {
            Vec::new()
        } else {
            self.ticks.clone()
        }
    }

    fn range(&self) -> std::ops::Range<f64> {
        self.lo..self.hi
    }
}

impl ValueFormatter<f64> for TickedRange {
    fn format(value: &f64) -> String {
        format_coord(*value)
    }
}

/// Compact coordinate label: integers without a decimal point
fn format_coord(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e12 {
        format!("{}", value as i64)
    } else {
        format!("{:.3}", value)
    }
}

/// Format a day value for a panel title, dropping a trailing `.0`
pub fn format_day(day: f64) -> String {
    if day.fract() == 0.0 && day.abs() < 1e12 {
        format!("Day {}", day as i64)
    } else {
        format!("Day {:.2}", day)
    }
}

/// Render the composed multi-panel figure
///
/// Rows follow `zones` in order, columns follow `datasets` in order. The
/// color scale must already be resolved; every panel is normalized against
/// it. Zones absent from a dataset produce blank panels.
pub fn render_figure(
    datasets: &[Dataset],
    zones: &[usize],
    axes: &AxisSelection,
    scale: &ColorScale,
    config: &RenderConfig,
) -> Result<Figure> {
    if datasets.is_empty() || zones.is_empty() {
        return Err(PlotError::Render("nothing to render: no datasets or zones".to_string()));
    }

    let palette = PALETTE_REGISTRY
        .get(&config.colormap)
        .ok_or_else(|| PlotError::Render(format!("unknown colormap '{}'", config.colormap)))?;

    let resolved: Vec<ResolvedAxes> = datasets
        .iter()
        .map(|ds| axes.resolve(ds))
        .collect::<Result<_>>()?;

    // Build every grid up front: rows = zones, columns = datasets
    let n_rows = zones.len();
    let n_cols = datasets.len();
    let mut grids: Vec<Grid> = Vec::with_capacity(n_rows * n_cols);
    for &zone in zones {
        for (col, dataset) in datasets.iter().enumerate() {
            grids.push(build_grid(dataset, zone, &resolved[col], config.collision));
        }
    }

    // Shared view bounds: the extent if configured, otherwise the union of
    // every grid's cell edges
    let (x_lo, x_hi, y_lo, y_hi) = view_bounds(&grids, config);

    // Row titles report the zone's physical time in days
    let row_titles: Vec<String> = zones
        .iter()
        .map(|&zone| {
            config
                .zone_time
                .day_for(&datasets[0], zone)
                .map(format_day)
        })
        .collect::<Result<_>>()?;

    let column_labels = column_labels(datasets, config);

    let (x_label, y_label, value_label) = match &config.axis_labels {
        Some((x, y, v)) => (x.clone(), y.clone(), v.clone()),
        None => (axes.x.clone(), axes.y.clone(), axes.value.clone()),
    };

    let x_ticks = config.ticks.ticks(x_lo, x_hi);
    let y_ticks = config.ticks.ticks(y_lo, y_hi);
    let font_size = config.font_size;

    let width = config.width;
    let height = config.height;
    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (panel_root, cbar_root) = root.split_horizontally(width.saturating_sub(COLORBAR_GUTTER));
        let panels = panel_root.split_evenly((n_rows, n_cols));

        for (idx, panel) in panels.iter().enumerate() {
            let row = idx / n_cols;
            let col = idx % n_cols;
            let grid = &grids[idx];

            let bottom_row = row == n_rows - 1;
            let first_col = col == 0;
            let last_col = col == n_cols - 1;

            let mut builder = ChartBuilder::on(panel);
            builder
                .margin(4)
                .margin_right(ROW_TITLE_GUTTER)
                .x_label_area_size(if bottom_row { font_size * 3 } else { 0 })
                .y_label_area_size(if first_col { font_size * 4 + 8 } else { 0 });

            if row == 0 {
                if let Some(labels) = &column_labels {
                    builder.caption(&labels[col], ("sans-serif", font_size + 2));
                }
            }

            let mut chart = builder
                .build_cartesian_2d(
                    TickedRange::new(x_lo, x_hi, x_ticks.clone()),
                    TickedRange::new(y_lo, y_hi, y_ticks.clone()),
                )
                .map_err(draw_err)?;

            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh()
                .label_style(("sans-serif", font_size))
                .axis_desc_style(("sans-serif", font_size));
            // Label-outer policy: only the outer panels carry axis text
            if bottom_row {
                mesh.x_desc(&x_label);
            } else {
                mesh.x_labels(0);
            }
            if first_col {
                mesh.y_desc(&y_label);
            } else {
                mesh.y_labels(0);
            }
            mesh.draw().map_err(draw_err)?;

            draw_cells(&mut chart, grid, scale, palette, (x_lo, x_hi, y_lo, y_hi))?;

            // Rotated zone-time title outside the plotted area, one per row
            if last_col {
                let (pw, ph) = panel.dim_in_pixel();
                let style = TextStyle::from(
                    ("sans-serif", font_size)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                );
                panel
                    .draw(&Text::new(
                        row_titles[row].clone(),
                        (pw as i32 - font_size as i32 - 4, (ph / 3) as i32),
                        style,
                    ))
                    .map_err(draw_err)?;
            }
        }

        draw_colorbar(&cbar_root, scale, palette, config, &value_label)?;

        root.present().map_err(draw_err)?;
    }

    Ok(Figure {
        width,
        height,
        rgb: buffer,
    })
}

/// Fill one panel with the grid's colored cells
///
/// Cell edges are midpoints between adjacent coordinates (pcolormesh style),
/// clamped to the shared view so an extent genuinely clips the drawing. An
/// empty grid draws nothing, leaving a blank panel.
fn draw_cells<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<TickedRange, TickedRange>>,
    grid: &Grid,
    scale: &ColorScale,
    palette: &PaletteDefinition,
    view: (f64, f64, f64, f64),
) -> Result<()> {
    if grid.is_empty() {
        return Ok(());
    }

    let (x_lo, x_hi, y_lo, y_hi) = view;
    let x_edges = Grid::edges(&grid.xs);
    let y_edges = Grid::edges(&grid.ys);

    let mut cells = Vec::new();
    for yi in 0..grid.height() {
        for xi in 0..grid.width() {
            let Some(value) = grid.get(xi, yi) else {
                continue;
            };
            let x0 = x_edges[xi].max(x_lo);
            let x1 = x_edges[xi + 1].min(x_hi);
            let y0 = y_edges[yi].max(y_lo);
            let y1 = y_edges[yi + 1].min(y_hi);
            if x0 >= x1 || y0 >= y1 {
                continue; // entirely outside the view
            }
            let [r, g, b] = palette.interpolate(scale.normalize(value));
            cells.push(Rectangle::new(
                [(x0, y0), (x1, y1)],
                RGBColor(r, g, b).filled(),
            ));
        }
    }

    chart
        .draw_series(cells)
        .map_err(|e| PlotError::Render(e.to_string()))?;
    Ok(())
}

/// Draw the shared colorbar with `%.2e` tick labels and the value-axis title
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scale: &ColorScale,
    palette: &PaletteDefinition,
    config: &RenderConfig,
    value_label: &str,
) -> Result<()> {
    let (_, h) = area.dim_in_pixel();
    let font_size = config.font_size;
    let title_style = TextStyle::from(("sans-serif", font_size + 2).into_font());
    let label_style = TextStyle::from(("sans-serif", font_size).into_font());

    let strip_x0 = 8;
    let strip_x1 = 28;
    let y_top = (font_size * 2 + 12) as i32;
    let y_bot = h as i32 - 24;
    if y_bot <= y_top {
        return Ok(());
    }

    // Title above the strip
    area.draw(&Text::new(value_label.to_string(), (strip_x0, 8), title_style))
        .map_err(draw_err)?;

    // Gradient strip, max at the top
    for y in y_top..y_bot {
        let t = (y_bot - y) as f64 / (y_bot - y_top) as f64;
        let [r, g, b] = palette.interpolate(t);
        area.draw(&Rectangle::new(
            [(strip_x0, y), (strip_x1, y + 1)],
            RGBColor(r, g, b).filled(),
        ))
        .map_err(draw_err)?;
    }
    area.draw(&Rectangle::new(
        [(strip_x0, y_top), (strip_x1, y_bot)],
        BLACK.stroke_width(1),
    ))
    .map_err(draw_err)?;

    // Tick marks and labels at the configured tick positions
    for tick in config.ticks.ticks(scale.min, scale.max) {
        let t = scale.normalize(tick);
        let y = y_bot - (t * (y_bot - y_top) as f64).round() as i32;
        area.draw(&PathElement::new(
            vec![(strip_x1, y), (strip_x1 + 4, y)],
            BLACK.stroke_width(1),
        ))
        .map_err(draw_err)?;
        area.draw(&Text::new(
            format!("{:.2e}", tick),
            (strip_x1 + 6, y - font_size as i32 / 2),
            label_style.clone(),
        ))
        .map_err(draw_err)?;
    }

    Ok(())
}

/// Shared view bounds across every panel
fn view_bounds(grids: &[Grid], config: &RenderConfig) -> (f64, f64, f64, f64) {
    if let Some(extent) = &config.extent {
        return (extent.x_min, extent.x_max, extent.y_min, extent.y_max);
    }

    let mut x_lo = f64::INFINITY;
    let mut x_hi = f64::NEG_INFINITY;
    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;

    for grid in grids {
        let x_edges = Grid::edges(&grid.xs);
        let y_edges = Grid::edges(&grid.ys);
        if let (Some(first), Some(last)) = (x_edges.first(), x_edges.last()) {
            x_lo = x_lo.min(*first);
            x_hi = x_hi.max(*last);
        }
        if let (Some(first), Some(last)) = (y_edges.first(), y_edges.last()) {
            y_lo = y_lo.min(*first);
            y_hi = y_hi.max(*last);
        }
    }

    if !x_lo.is_finite() || !y_lo.is_finite() {
        // Every grid was empty; give the blank panels a unit view
        return (0.0, 1.0, 0.0, 1.0);
    }
    (x_lo, x_hi, y_lo, y_hi)
}

/// Column labels: explicit config wins; several datasets side by side
/// default to their cleaned source identifiers; a single unlabeled dataset
/// gets no column label (the historical layout)
fn column_labels(datasets: &[Dataset], config: &RenderConfig) -> Option<Vec<String>> {
    if let Some(labels) = &config.column_labels {
        let mut labels = labels.clone();
        labels.resize(datasets.len(), String::new());
        return Some(labels);
    }
    if datasets.len() > 1 {
        return Some(datasets.iter().map(|d| d.label.clone()).collect());
    }
    None
}

fn draw_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TickSpec, ZoneTimeMode};
    use crate::plot::parser::parse_text;
    use crate::plot::scale::resolve_scale;
    use std::path::Path;

    fn dataset(text: &str) -> Dataset {
        parse_text(text, Path::new("render_test"), "render_test".to_string()).unwrap()
    }

    #[test]
    fn test_format_day() {
        assert_eq!(format_day(0.0), "Day 0");
        assert_eq!(format_day(365.0), "Day 365");
        assert_eq!(format_day(1.5), "Day 1.50");
    }

    #[test]
    fn test_ticked_range_map() {
        let range = TickedRange::new(0.0, 10.0, vec![0.0, 5.0, 10.0]);
        assert_eq!(range.map(&0.0, (100, 200)), 100);
        assert_eq!(range.map(&5.0, (100, 200)), 150);
        assert_eq!(range.map(&10.0, (100, 200)), 200);

        // Degenerate range maps everything to the low edge
        let flat = TickedRange::new(3.0, 3.0, vec![3.0]);
        assert_eq!(flat.map(&3.0, (100, 200)), 100);
    }

    #[test]
    fn test_render_three_zone_figure() {
        let ds = dataset(
            "Variables = x y P\nboilerplate\n\
             1 1 10\n2 1 20\n1 2 30\n2 2 40\n\
             ZONE\n1 1 50\n2 1 60\n1 2 70\n2 2 80\n\
             ZONE\n1 1 90\n2 1 100\n1 2 110\n2 2 120\n",
        );
        let axes = AxisSelection::new("x", "y", "P");
        let zones = vec![0, 1, 2];
        let scale = resolve_scale(
            std::slice::from_ref(&ds),
            &zones,
            &axes,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(scale.min, 10.0);
        assert_eq!(scale.max, 120.0);

        let config = RenderConfig {
            width: 400,
            height: 400,
            ..RenderConfig::default()
        };
        let figure =
            render_figure(std::slice::from_ref(&ds), &zones, &axes, &scale, &config).unwrap();
        assert_eq!(figure.width, 400);
        assert_eq!(figure.height, 400);
        assert_eq!(figure.rgb.len(), 400 * 400 * 3);
        // Something was drawn: the buffer is not all-white
        assert!(figure.rgb.iter().any(|&b| b != 255));
    }

    #[test]
    fn test_blank_panel_for_missing_zone() {
        // Zone 1 exists but has no records; rendering must not fail
        let ds = dataset("Variables = x y P\nboilerplate\n1 1 10\n2 2 20\nZONE\n");
        let axes = AxisSelection::new("x", "y", "P");
        let scale = ColorScale {
            min: 10.0,
            max: 20.0,
        };
        let config = RenderConfig {
            width: 300,
            height: 300,
            ..RenderConfig::default()
        };
        let figure =
            render_figure(std::slice::from_ref(&ds), &[0, 1], &axes, &scale, &config).unwrap();
        assert_eq!(figure.rgb.len(), 300 * 300 * 3);
    }

    #[test]
    fn test_embedded_times_in_row_titles() {
        let ds = dataset(
            "Variables = x y P\nboilerplate\n\
             ZONE T=\"0\"\n1 1 1\nZONE T=\"86400\"\n1 1 2\nZONE T=\"172800\"\n1 1 3\n",
        );
        assert_eq!(
            ZoneTimeMode::Embedded.day_for(&ds, 1).map(format_day).unwrap(),
            "Day 0"
        );
        assert_eq!(
            ZoneTimeMode::Embedded.day_for(&ds, 2).map(format_day).unwrap(),
            "Day 1"
        );
        assert_eq!(
            ZoneTimeMode::Embedded.day_for(&ds, 3).map(format_day).unwrap(),
            "Day 2"
        );
    }

    #[test]
    fn test_interval_ticks_render() {
        let ds = dataset("Variables = x y P\nboilerplate\n0 0 1\n10 10 2\n");
        let axes = AxisSelection::new("x", "y", "P");
        let scale = ColorScale { min: 1.0, max: 2.0 };
        let config = RenderConfig {
            width: 300,
            height: 300,
            ticks: TickSpec::Interval(5.0),
            ..RenderConfig::default()
        };
        let figure =
            render_figure(std::slice::from_ref(&ds), &[0], &axes, &scale, &config).unwrap();
        assert_eq!(figure.width, 300);
    }

    #[test]
    fn test_png_encoding() {
        let figure = Figure {
            width: 4,
            height: 4,
            rgb: vec![255; 4 * 4 * 3],
        };
        let png = figure.to_png().unwrap();
        // PNG signature
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
