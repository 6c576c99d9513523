//! Grid builder
//!
//! Pivots one zone's records into a dense rectangular field: distinct y
//! values become rows, distinct x values become columns, and each cell holds
//! the value field of the matching record. Axes are sorted ascending, which
//! the renderer relies on for cell edges and tick placement.

use super::parser::{Dataset, ResolvedAxes};
use crate::config::CellCollision;

/// A dense pivot of one zone's records over two spatial fields
#[derive(Debug, Clone)]
pub struct Grid {
    /// Distinct x coordinates, ascending
    pub xs: Vec<f64>,
    /// Distinct y coordinates, ascending
    pub ys: Vec<f64>,
    /// Row-major cells: `cells[yi * xs.len() + xi]`; `None` where no record
    /// covered the coordinate pair
    cells: Vec<Option<f64>>,
}

impl Grid {
    /// Grid with no rows and no columns
    pub fn empty() -> Self {
        Grid {
            xs: Vec::new(),
            ys: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.xs.len()
    }

    pub fn height(&self) -> usize {
        self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell value at (column, row), if a record covered it
    pub fn get(&self, xi: usize, yi: usize) -> Option<f64> {
        self.cells.get(yi * self.xs.len() + xi).copied().flatten()
    }

    /// Midpoint edges for one axis, pcolormesh style
    ///
    /// For n coordinates this returns n+1 edges; a single coordinate gets a
    /// unit-wide cell around it.
    pub fn edges(coords: &[f64]) -> Vec<f64> {
        match coords.len() {
            0 => Vec::new(),
            1 => vec![coords[0] - 0.5, coords[0] + 0.5],
            n => {
                let mut edges = Vec::with_capacity(n + 1);
                edges.push(coords[0] - (coords[1] - coords[0]) / 2.0);
                for i in 1..n {
                    edges.push((coords[i - 1] + coords[i]) / 2.0);
                }
                edges.push(coords[n - 1] + (coords[n - 1] - coords[n - 2]) / 2.0);
                edges
            }
        }
    }
}

/// Pivot the records of one zone into a dense grid
///
/// Duplicate (x, y) pairs are resolved by the collision policy. A zone with
/// no matching records yields an empty grid, which renders as a blank panel.
pub fn build_grid(
    dataset: &Dataset,
    zone: usize,
    axes: &ResolvedAxes,
    collision: CellCollision,
) -> Grid {
    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();

    for record in dataset.zone_records(zone) {
        xs.push(dataset.value(record, axes.x));
        ys.push(dataset.value(record, axes.y));
    }

    if xs.is_empty() {
        return Grid::empty();
    }

    sort_distinct(&mut xs);
    sort_distinct(&mut ys);

    let width = xs.len();
    let mut cells: Vec<Option<f64>> = vec![None; width * ys.len()];
    // Running (sum, count) per cell for the mean policy
    let mut sums: Vec<(f64, usize)> = match collision {
        CellCollision::Mean => vec![(0.0, 0); cells.len()],
        CellCollision::Last => Vec::new(),
    };

    for record in dataset.zone_records(zone) {
        let x = dataset.value(record, axes.x);
        let y = dataset.value(record, axes.y);
        let value = dataset.value(record, axes.value);

        let (Some(xi), Some(yi)) = (coord_index(&xs, x), coord_index(&ys, y)) else {
            continue;
        };
        let cell = yi * width + xi;

        match collision {
            CellCollision::Last => cells[cell] = Some(value),
            CellCollision::Mean => {
                sums[cell].0 += value;
                sums[cell].1 += 1;
                cells[cell] = Some(sums[cell].0 / sums[cell].1 as f64);
            }
        }
    }

    Grid { xs, ys, cells }
}

fn sort_distinct(coords: &mut Vec<f64>) {
    coords.sort_by(f64::total_cmp);
    coords.dedup();
}

fn coord_index(coords: &[f64], value: f64) -> Option<usize> {
    coords.binary_search_by(|c| c.total_cmp(&value)).ok()
}
