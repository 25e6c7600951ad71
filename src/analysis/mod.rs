//! Post-processing of sweep results
//!
//! Reads a results CSV (one row per solver run), splits it by convection
//! direction and, for each analysed variable and depth band, computes the
//! RMS and spread of the temperature metric per distinct parameter value
//! plus a linear trend through those RMS values.
//!
//! ## Submodules
//! - `results`: header-indexed CSV table with numeric column access
//! - `stats`: RMS, sample standard deviation, least-squares fit
//! - `grouping`: direction split and per-band summaries
//! - `summary`: RMS summary CSV reading and writing

pub mod grouping;
pub mod results;
pub mod stats;
pub mod summary;

pub use grouping::{
    analyze, AnalysisReport, ConvectionDirection, DepthBandSeries, GroupStats, VariableAnalysis,
};
pub use results::ResultsTable;
pub use stats::LinearFit;
pub use summary::{read_rms_csv, write_rms_csv, RmsRecord};

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV has no header row")]
    NoHeader,

    #[error("Results table has no data rows")]
    EmptyTable,

    #[error("Column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("Row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Line {line}: {reason}")]
    BadRecord { line: usize, reason: String },
}

impl AnalysisError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
