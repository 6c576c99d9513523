//! Color scale resolver
//!
//! Computes the single (min, max) pair that every panel and animation frame
//! is normalized against. The scale is resolved once per render invocation,
//! before any drawing starts, so colors stay comparable across panels and
//! frames.

use super::error::{PlotError, Result};
use super::parser::{AxisSelection, Dataset};

/// Rectangular spatial clip: inclusive on all four bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Extent {
    /// Parse a comma-separated `left,right,bottom,top` quadruple
    pub fn parse(spec: &str) -> Option<Self> {
        let parts: Vec<f64> = spec
            .split(',')
            .map(|t| t.trim().parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>()?;
        match parts.as_slice() {
            [left, right, bottom, top] => Some(Extent {
                x_min: *left,
                x_max: *right,
                y_min: *bottom,
                y_max: *top,
            }),
            _ => None,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// The shared (min, max) normalization for a render invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Map a value to t ∈ [0, 1] within the scale
    ///
    /// A degenerate scale (min == max) maps everything to the midpoint, so a
    /// constant field still renders with one well-defined color.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 || !span.is_finite() {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Resolve the shared color scale across datasets
///
/// Per dataset, records are restricted to the selected zones and, when an
/// extent is given, to coordinates inside it (inclusive). The global minimum
/// and maximum of the value field are reduced across all datasets. Explicit
/// `override_min`/`override_max` replace the computed bound unconditionally;
/// either may be given on its own.
///
/// Fails with a "no data in range" condition when no record survives the
/// restriction in any dataset, unless both bounds are overridden.
pub fn resolve_scale(
    datasets: &[Dataset],
    zones: &[usize],
    axes: &AxisSelection,
    extent: Option<&Extent>,
    override_min: Option<f64>,
    override_max: Option<f64>,
) -> Result<ColorScale> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut seen = false;

    for dataset in datasets {
        let resolved = axes.resolve(dataset)?;

        for record in &dataset.records {
            if !zones.contains(&record.zone) {
                continue;
            }
            if let Some(extent) = extent {
                let x = dataset.value(record, resolved.x);
                let y = dataset.value(record, resolved.y);
                if !extent.contains(x, y) {
                    continue;
                }
            }
            let value = dataset.value(record, resolved.value);
            if value.is_finite() {
                min = min.min(value);
                max = max.max(value);
                seen = true;
            }
        }
    }

    if !seen && (override_min.is_none() || override_max.is_none()) {
        return Err(PlotError::Scale);
    }

    Ok(ColorScale {
        min: override_min.unwrap_or(min),
        max: override_max.unwrap_or(max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::parser::parse_text;
    use std::path::Path;

    fn dataset(text: &str) -> Dataset {
        parse_text(text, Path::new("scale_test"), "scale_test".to_string()).unwrap()
    }

    fn axes() -> AxisSelection {
        AxisSelection::new("x", "y", "P")
    }

    const DATA: &str = "\
Variables = x y P
boilerplate
1 1 10
2 1 40
ZONE
1 1 -5
2 1 25
";

    #[test]
    fn test_union_across_zones() {
        let ds = dataset(DATA);
        let scale =
            resolve_scale(std::slice::from_ref(&ds), &[0, 1], &axes(), None, None, None).unwrap();
        assert_eq!(scale.min, -5.0);
        assert_eq!(scale.max, 40.0);
        assert!(scale.min <= scale.max);
    }

    #[test]
    fn test_zone_restriction() {
        let ds = dataset(DATA);
        let scale =
            resolve_scale(std::slice::from_ref(&ds), &[0], &axes(), None, None, None).unwrap();
        assert_eq!(scale.min, 10.0);
        assert_eq!(scale.max, 40.0);
    }

    #[test]
    fn test_union_across_datasets() {
        let a = dataset("Variables = x y P\nb\n1 1 5\n");
        let b = dataset("Variables = x y P\nb\n1 1 100\n");
        let scale = resolve_scale(&[a, b], &[0], &axes(), None, None, None).unwrap();
        assert_eq!(scale.min, 5.0);
        assert_eq!(scale.max, 100.0);
    }

    #[test]
    fn test_insensitive_to_record_order() {
        let forward = dataset("Variables = x y P\nb\n1 1 1\n2 1 2\n3 1 3\n");
        let reversed = dataset("Variables = x y P\nb\n3 1 3\n2 1 2\n1 1 1\n");
        let s1 =
            resolve_scale(std::slice::from_ref(&forward), &[0], &axes(), None, None, None).unwrap();
        let s2 = resolve_scale(
            std::slice::from_ref(&reversed),
            &[0],
            &axes(),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_extent_restricts_bounds() {
        let ds = dataset(DATA);
        let extent = Extent {
            x_min: 0.0,
            x_max: 1.5,
            y_min: 0.0,
            y_max: 2.0,
        };
        let scale = resolve_scale(
            std::slice::from_ref(&ds),
            &[0, 1],
            &axes(),
            Some(&extent),
            None,
            None,
        )
        .unwrap();
        // x=2 records fall outside
        assert_eq!(scale.min, -5.0);
        assert_eq!(scale.max, 10.0);
    }

    #[test]
    fn test_extent_bounds_inclusive() {
        let ds = dataset("Variables = x y P\nb\n1 1 7\n");
        let extent = Extent {
            x_min: 1.0,
            x_max: 1.0,
            y_min: 1.0,
            y_max: 1.0,
        };
        let scale = resolve_scale(
            std::slice::from_ref(&ds),
            &[0],
            &axes(),
            Some(&extent),
            None,
            None,
        )
        .unwrap();
        assert_eq!(scale.min, 7.0);
        assert_eq!(scale.max, 7.0);
    }

    #[test]
    fn test_empty_extent_is_scale_error() {
        let ds = dataset(DATA);
        let extent = Extent {
            x_min: 100.0,
            x_max: 200.0,
            y_min: 100.0,
            y_max: 200.0,
        };
        let err = resolve_scale(
            std::slice::from_ref(&ds),
            &[0, 1],
            &axes(),
            Some(&extent),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::Scale));
    }

    #[test]
    fn test_partial_override() {
        let ds = dataset(DATA);
        let scale = resolve_scale(
            std::slice::from_ref(&ds),
            &[0, 1],
            &axes(),
            None,
            None,
            Some(99.0),
        )
        .unwrap();
        // Overriding only max leaves min at the computed value
        assert_eq!(scale.min, -5.0);
        assert_eq!(scale.max, 99.0);

        let scale = resolve_scale(
            std::slice::from_ref(&ds),
            &[0, 1],
            &axes(),
            None,
            Some(-100.0),
            Some(100.0),
        )
        .unwrap();
        assert_eq!(scale.min, -100.0);
        assert_eq!(scale.max, 100.0);
    }

    #[test]
    fn test_normalize() {
        let scale = ColorScale { min: 0.0, max: 10.0 };
        assert_eq!(scale.normalize(0.0), 0.0);
        assert_eq!(scale.normalize(5.0), 0.5);
        assert_eq!(scale.normalize(10.0), 1.0);
        assert_eq!(scale.normalize(-5.0), 0.0);
        assert_eq!(scale.normalize(15.0), 1.0);

        let degenerate = ColorScale { min: 3.0, max: 3.0 };
        assert_eq!(degenerate.normalize(3.0), 0.5);
    }

    #[test]
    fn test_extent_parse() {
        assert_eq!(
            Extent::parse("0,10,-5,5"),
            Some(Extent {
                x_min: 0.0,
                x_max: 10.0,
                y_min: -5.0,
                y_max: 5.0,
            })
        );
        assert_eq!(Extent::parse("0,10,5"), None);
        assert_eq!(Extent::parse("0,10,a,5"), None);
    }
}
