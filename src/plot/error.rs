use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing input files or rendering plots
#[derive(Debug, Error)]
pub enum PlotError {
    /// Malformed input file: bad header, non-numeric token, wrong token count
    #[error("parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    /// A requested zone index exceeds the highest zone present in the file
    #[error("zone {requested} does not exist in {} - {max_zone} is the highest zone", file.display())]
    Range {
        file: PathBuf,
        requested: usize,
        max_zone: usize,
    },

    /// Color-scale resolution found no data inside the restricting extent
    #[error("no data in range: extent excludes every record across all datasets")]
    Scale,

    /// An input combination the renderer does not support
    #[error("unsupported combination: {0}")]
    UnsupportedCombination(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Drawing backend or image encoding failure
    #[error("render error: {0}")]
    Render(String),
}

/// Type alias for Results using PlotError
pub type Result<T> = std::result::Result<T, PlotError>;
