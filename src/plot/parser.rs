//! Format parser for zone-segmented simulation output
//!
//! The input is a Tecplot-style whitespace text format:
//! - line 1: `Variables =` followed by whitespace-separated field names
//! - line 2: format boilerplate, ignored
//! - remaining lines: either a zone-boundary marker (any line containing the
//!   literal `ZONE` token, optionally embedding a quoted time-in-seconds
//!   literal such as `T="86400"`) or one whitespace-separated record of
//!   floating point tokens; blank lines are skipped
//!
//! The parser returns the discovered zone range; callers decide which zones
//! to render afterwards.

use super::error::{PlotError, Result};
use std::path::{Path, PathBuf};

/// Fixed literal tag prefixing the header line
pub const HEADER_TAG: &str = "Variables =";

/// Literal token marking a zone boundary
pub const ZONE_MARKER: &str = "ZONE";

/// Seconds per day, for converting embedded zone times
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One parsed data row: header field values plus the derived zone tag
#[derive(Debug, Clone)]
pub struct Record {
    /// Values aligned with the dataset's header field list
    pub values: Vec<f64>,
    /// Zone index this record belongs to (0-based, non-decreasing in file order)
    pub zone: usize,
    /// The zone's physical time in days, when the marker embedded one
    pub zone_time_days: Option<f64>,
}

/// Resolved reference to a field of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef {
    /// A header-declared column, by position
    Column(usize),
    /// The derived zone index
    Zone,
    /// The derived zone time in days
    ZoneTime,
}

/// The ordered records parsed from one input file, immutable once built
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Where this dataset came from, for error reporting
    pub source: PathBuf,
    /// Cleaned source identifier, used as the default column label
    pub label: String,
    /// Header field names, with the derived `zone` and `zone_time` appended
    pub fields: Vec<String>,
    /// Records in input order
    pub records: Vec<Record>,
    /// Highest zone index seen (equals the number of boundary markers)
    pub max_zone: usize,
    /// Embedded zone times in days, indexed by zone
    pub zone_times: Vec<Option<f64>>,
}

impl Dataset {
    /// Resolve a field name against this dataset's header
    ///
    /// The two derived names resolve to their dedicated variants; everything
    /// else resolves by position in the header-declared columns.
    pub fn resolve_field(&self, name: &str) -> Option<FieldRef> {
        match name {
            "zone" => Some(FieldRef::Zone),
            "zone_time" => Some(FieldRef::ZoneTime),
            _ => {
                let n_columns = self.fields.len().saturating_sub(2);
                self.fields[..n_columns]
                    .iter()
                    .position(|f| f == name)
                    .map(FieldRef::Column)
            }
        }
    }

    /// Read a field value out of a record
    pub fn value(&self, record: &Record, field: FieldRef) -> f64 {
        match field {
            FieldRef::Column(idx) => record.values[idx],
            FieldRef::Zone => record.zone as f64,
            FieldRef::ZoneTime => record.zone_time_days.unwrap_or(f64::NAN),
        }
    }

    /// Iterate the records of one zone, in input order
    pub fn zone_records(&self, zone: usize) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.zone == zone)
    }
}

/// The three field names to plot: x and y span the grid, value fills it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSelection {
    pub x: String,
    pub y: String,
    pub value: String,
}

impl AxisSelection {
    pub fn new(x: impl Into<String>, y: impl Into<String>, value: impl Into<String>) -> Self {
        AxisSelection {
            x: x.into(),
            y: y.into(),
            value: value.into(),
        }
    }

    /// Parse a comma-separated `x,y,value` triple
    pub fn parse(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [x, y, v] if !x.is_empty() && !y.is_empty() && !v.is_empty() => {
                Some(AxisSelection::new(*x, *y, *v))
            }
            _ => None,
        }
    }

    /// Resolve all three names against a dataset, failing if any is absent
    pub fn resolve(&self, dataset: &Dataset) -> Result<ResolvedAxes> {
        let lookup = |name: &str| {
            dataset.resolve_field(name).ok_or_else(|| PlotError::Parse {
                file: dataset.source.clone(),
                message: format!(
                    "axis field '{}' not found in header (available: {})",
                    name,
                    dataset.fields.join(", ")
                ),
            })
        };

        Ok(ResolvedAxes {
            x: lookup(&self.x)?,
            y: lookup(&self.y)?,
            value: lookup(&self.value)?,
        })
    }
}

/// An `AxisSelection` resolved against one dataset's header
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAxes {
    pub x: FieldRef,
    pub y: FieldRef,
    pub value: FieldRef,
}

/// Read and parse one input file
pub fn parse_file(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    let label = clean_label(path);
    parse_text(&text, path, label)
}

/// Parse raw text into a dataset
///
/// `source` is only used for error reporting and as the dataset identity.
pub fn parse_text(text: &str, source: &Path, label: String) -> Result<Dataset> {
    let mut lines = text.lines();

    let header_line = lines.next().ok_or_else(|| PlotError::Parse {
        file: source.to_path_buf(),
        message: "empty file: no header line".to_string(),
    })?;

    let header = header_line.trim();
    if !header.starts_with(HEADER_TAG) {
        return Err(PlotError::Parse {
            file: source.to_path_buf(),
            message: format!("header line does not start with '{}'", HEADER_TAG),
        });
    }

    let mut fields: Vec<String> = header[HEADER_TAG.len()..]
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if fields.is_empty() {
        return Err(PlotError::Parse {
            file: source.to_path_buf(),
            message: "header declares no field names".to_string(),
        });
    }
    let n_columns = fields.len();
    fields.push("zone".to_string());
    fields.push("zone_time".to_string());

    // Line 2 is format boilerplate
    let _ = lines.next();

    let mut records = Vec::new();
    let mut zone = 0usize;
    let mut zone_times: Vec<Option<f64>> = vec![None];
    let mut current_time: Option<f64> = None;

    for (line_no, line) in lines.enumerate() {
        let line_no = line_no + 3; // 1-based, after header and boilerplate
        let trimmed = line.trim();

        if trimmed.contains(ZONE_MARKER) {
            zone += 1;
            current_time = embedded_time_days(trimmed);
            zone_times.push(current_time);
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        let mut values = Vec::with_capacity(n_columns);
        for token in trimmed.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| PlotError::Parse {
                file: source.to_path_buf(),
                message: format!("non-numeric token '{}' on line {}", token, line_no),
            })?;
            values.push(value);
        }

        if values.len() != n_columns {
            return Err(PlotError::Parse {
                file: source.to_path_buf(),
                message: format!(
                    "line {} has {} values but the header declares {} fields",
                    line_no,
                    values.len(),
                    n_columns
                ),
            });
        }

        records.push(Record {
            values,
            zone,
            zone_time_days: current_time,
        });
    }

    Ok(Dataset {
        source: source.to_path_buf(),
        label,
        fields,
        records,
        max_zone: zone,
        zone_times,
    })
}

/// Extract the quoted time literal from a zone marker, converted to days
///
/// Markers look like `ZONE T="86400" I=10 J=10`; the first quoted token that
/// parses as a number is taken as the zone's time in seconds.
fn embedded_time_days(line: &str) -> Option<f64> {
    let mut rest = line;
    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        let end = after.find('"')?;
        if let Ok(seconds) = after[..end].trim().parse::<f64>() {
            return Some(seconds / SECONDS_PER_DAY);
        }
        rest = &after[end + 1..];
    }
    None
}

/// Turn a file path into a short display label (the file stem)
pub fn clean_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Dataset> {
        parse_text(text, Path::new("test_input"), "test_input".to_string())
    }

    const THREE_ZONES: &str = "\
Variables = r z P
DT=(SINGLE SINGLE SINGLE)
1.0 1.0 10.0
2.0 1.0 20.0
ZONE T=\"86400\"
1.0 1.0 30.0
2.0 1.0 40.0
ZONE T=\"172800\"
1.0 1.0 50.0
2.0 1.0 60.0
";

    #[test]
    fn test_header_fields_and_derived_names() {
        let ds = parse(THREE_ZONES).unwrap();
        assert_eq!(ds.fields, vec!["r", "z", "P", "zone", "zone_time"]);
    }

    #[test]
    fn test_zone_count_matches_markers() {
        let ds = parse(THREE_ZONES).unwrap();
        // Two markers: zones 0, 1, 2
        assert_eq!(ds.max_zone, 2);
        assert!(ds.records.iter().all(|r| r.zone <= ds.max_zone));
        assert_eq!(ds.zone_records(0).count(), 2);
        assert_eq!(ds.zone_records(1).count(), 2);
        assert_eq!(ds.zone_records(2).count(), 2);
    }

    #[test]
    fn test_embedded_time_converted_to_days() {
        let ds = parse(THREE_ZONES).unwrap();
        assert_eq!(ds.zone_times[0], None);
        assert_eq!(ds.zone_times[1], Some(1.0));
        assert_eq!(ds.zone_times[2], Some(2.0));
    }

    #[test]
    fn test_marker_times_zero_one_two_days() {
        let text = "\
Variables = x y P
DT=(SINGLE)
ZONE T=\"0\"
1 1 1
ZONE T=\"86400\"
1 1 2
ZONE T=\"172800\"
1 1 3
";
        let ds = parse(text).unwrap();
        assert_eq!(ds.zone_times[1], Some(0.0));
        assert_eq!(ds.zone_times[2], Some(1.0));
        assert_eq!(ds.zone_times[3], Some(2.0));
    }

    #[test]
    fn test_marker_without_time() {
        let text = "\
Variables = x y P
boilerplate
1 1 1
ZONE I=10 J=10
1 1 2
";
        let ds = parse(text).unwrap();
        assert_eq!(ds.max_zone, 1);
        assert_eq!(ds.zone_times[1], None);
        assert_eq!(ds.records[1].zone_time_days, None);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = "\
Variables = x y P
boilerplate

1 1 1

2 2 2
";
        let ds = parse(text).unwrap();
        assert_eq!(ds.records.len(), 2);
    }

    #[test]
    fn test_empty_file_is_fatal() {
        assert!(matches!(parse(""), Err(PlotError::Parse { .. })));
    }

    #[test]
    fn test_missing_header_tag_is_fatal() {
        let text = "x y P\nboilerplate\n1 1 1\n";
        assert!(matches!(parse(text), Err(PlotError::Parse { .. })));
    }

    #[test]
    fn test_non_numeric_token_is_fatal() {
        let text = "Variables = x y P\nboilerplate\n1 oops 3\n";
        let err = parse(text).unwrap_err();
        match err {
            PlotError::Parse { message, .. } => assert!(message.contains("oops")),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_count_mismatch_is_fatal() {
        let text = "Variables = x y P\nboilerplate\n1 2\n";
        let err = parse(text).unwrap_err();
        match err {
            PlotError::Parse { message, .. } => assert!(message.contains("2 values")),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_field() {
        let ds = parse(THREE_ZONES).unwrap();
        assert_eq!(ds.resolve_field("r"), Some(FieldRef::Column(0)));
        assert_eq!(ds.resolve_field("P"), Some(FieldRef::Column(2)));
        assert_eq!(ds.resolve_field("zone"), Some(FieldRef::Zone));
        assert_eq!(ds.resolve_field("zone_time"), Some(FieldRef::ZoneTime));
        assert_eq!(ds.resolve_field("missing"), None);
    }

    #[test]
    fn test_axis_selection_parse_and_resolve() {
        let ds = parse(THREE_ZONES).unwrap();
        let axes = AxisSelection::parse("r,z,P").unwrap();
        assert!(axes.resolve(&ds).is_ok());

        let bad = AxisSelection::parse("r,z,missing").unwrap();
        assert!(matches!(bad.resolve(&ds), Err(PlotError::Parse { .. })));

        assert!(AxisSelection::parse("r,z").is_none());
        assert!(AxisSelection::parse("r,,P").is_none());
    }
}
