//! SVG charts
//!
//! - `profile`: initial temperature against depth
//! - `scatter`: one variable against the depth-band temperature metric
//! - `summary`: RMS values of every variable side by side
//!
//! All charts are written with the plotters SVG backend.

pub mod profile;
pub mod scatter;
pub mod summary;

pub use profile::initial_temperature;
pub use scatter::variable_scatter;
pub use summary::{rms_summary, summary_categories};

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::style::RGBColor;
use thiserror::Error;
use tracing::info;

use crate::analysis::{AnalysisReport, ConvectionDirection};
use crate::config::AnalysisConfig;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Nothing to plot: {0}")]
    NoData(String),

    #[error("I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Drawing error: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Drawing(err.to_string())
    }
}

/// Line colours cycled per depth band.
pub(crate) const BAND_COLORS: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];

pub(crate) fn band_color(index: usize) -> RGBColor {
    BAND_COLORS[index % BAND_COLORS.len()]
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), PlotError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| PlotError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Axis range covering `min..max` with 5% padding, widened when the data
/// collapses to a single value.
pub(crate) fn padded_range(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (min.abs() * 0.05).max(1.0)
    };
    (min - pad, max + pad)
}

fn file_safe(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// `scatter_plot_{variable}_{direction}_conv.svg`
pub fn scatter_file_name(variable: &str, direction: ConvectionDirection) -> String {
    format!("scatter_plot_{}_{direction}_conv.svg", file_safe(variable))
}

/// `rms_scatter_{direction}_convection.svg`
pub fn rms_summary_file_name(direction: ConvectionDirection) -> String {
    format!("rms_scatter_{direction}_convection.svg")
}

/// Draw every scatter chart and one RMS summary chart per direction into
/// `output_dir`. Variables without data are skipped.
pub fn render_report(
    report: &AnalysisReport,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, PlotError> {
    std::fs::create_dir_all(output_dir).map_err(|source| PlotError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for analysis in report.variables.iter().filter(|a| !a.is_empty()) {
        let path = output_dir.join(scatter_file_name(&analysis.variable.name, analysis.direction));
        variable_scatter(&path, analysis, config.scatter_y_range)?;
        written.push(path);
    }

    let records = report.rms_records();
    for direction in ConvectionDirection::ALL {
        let subset: Vec<_> = records
            .iter()
            .filter(|r| r.direction == direction && r.rms.is_finite())
            .cloned()
            .collect();
        if subset.is_empty() {
            continue;
        }
        let (variables, bands) = summary_categories(&subset, &config.variables, &config.depth_bands);
        let path = output_dir.join(rms_summary_file_name(direction));
        rms_summary(&path, &subset, &variables, &bands, config.rms_y_range)?;
        written.push(path);
    }

    info!(charts = written.len(), dir = %output_dir.display(), "Charts written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(
            scatter_file_name("Lateral Extent", ConvectionDirection::Positive),
            "scatter_plot_Lateral Extent_Positive_conv.svg"
        );
        assert_eq!(
            rms_summary_file_name(ConvectionDirection::Negative),
            "rms_scatter_Negative_convection.svg"
        );
        assert_eq!(
            scatter_file_name("m/yr", ConvectionDirection::Negative),
            "scatter_plot_m_yr_Negative_conv.svg"
        );
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(0.0, 100.0), (-5.0, 105.0));
        let (lo, hi) = padded_range(3.0, 3.0);
        assert!(lo < 3.0 && hi > 3.0);
    }
}
