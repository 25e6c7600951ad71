//! Parameter sweep generation
//!
//! Expands a grid of model parameters into numbered runs and writes one
//! solver input file per run, plus a CSV log mapping run index to parameter
//! values.
//!
//! ## Flow
//!
//! ```text
//! grid CSV / [grid] ──► ParameterGrid ──expand──► Vec<SweepRun>
//!                                                     │
//!                      PrmTemplate + TemplateContext ◄┘
//!                                │
//!                                ▼
//!              parameters001.prm ... + permutations.csv + manifest
//! ```
//!
//! ## Submodules
//! - `parameters`: the five varied parameters and one combination of values
//! - `grid`: axes, CSV reading, Cartesian expansion and mirroring
//! - `naming`: file names and sanitised solver output directory names
//! - `template`: built-in solver input and `{{placeholder}}` filling
//! - `writer`: parallel file output, run log and manifest

pub mod grid;
pub mod naming;
pub mod parameters;
pub mod template;
pub mod writer;

pub use grid::ParameterGrid;
pub use parameters::{Parameter, ParameterSet};
pub use template::{PrmTemplate, TemplateContext};
pub use writer::{PlannedRun, SweepManifest, SweepSummary, SweepWriter};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or writing a sweep
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Grid CSV must have one row per parameter ({expected}), found {rows}", expected = Parameter::COUNT)]
    GridShape { rows: usize },

    #[error("Grid CSV line {line}, column {column}: '{value}' is not a number")]
    InvalidCell {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("No values given for {0}")]
    EmptyAxis(Parameter),

    #[error("Invalid value {value} for {parameter}: {reason}")]
    InvalidAxisValue {
        parameter: Parameter,
        value: f64,
        reason: &'static str,
    },

    #[error("No parameter grid: pass --grid or fill in [grid] in the config")]
    NoGrid,

    #[error("Unknown template placeholder '{{{{{0}}}}}'")]
    UnknownPlaceholder(String),

    #[error("Template pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Refusing to overwrite existing file {0} (set overwrite to replace it)")]
    FileExists(PathBuf),

    #[error("Manifest serialization error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl SweepError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One numbered parameter combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRun {
    /// 1-based run index
    pub index: usize,
    pub parameters: ParameterSet,
    /// True when this is the negated-speed copy of the previous run
    pub mirrored: bool,
}
