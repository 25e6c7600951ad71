//! aspect-sweep: parameter sweeps for 2-D mantle convection models
//!
//! Generates numbered solver input files over a grid of model parameters,
//! analyses the temperature metrics the runs produce, and plots the
//! analytic initial temperature profile.
//!
//! ## Modules
//!
//! - **config**: TOML configuration, defaults and validation
//! - **thermal**: piecewise initial temperature field and depth profiles
//! - **sweep**: grid expansion, run naming, solver input templating and output
//! - **analysis**: results CSV statistics per convection direction and depth band
//! - **plot**: SVG charts for profiles, per-variable scatters and RMS summaries

pub mod analysis;
pub mod config;
pub mod csv;
pub mod plot;
pub mod sweep;
pub mod thermal;

pub use config::SweepConfig;

pub use thermal::{GradientCoefficients, InitialTemperature, ProfilePoint, ThermalError};

pub use sweep::{
    Parameter, ParameterGrid, ParameterSet, PrmTemplate, SweepError, SweepRun, SweepSummary,
    SweepWriter,
};

pub use analysis::{
    analyze, AnalysisError, AnalysisReport, ConvectionDirection, LinearFit, ResultsTable,
    RmsRecord,
};

pub use plot::PlotError;
