//! Splitting results by convection direction and summarising each depth
//! band per distinct parameter value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::results::ResultsTable;
use super::stats::{rms, sample_std, LinearFit};
use super::summary::RmsRecord;
use super::AnalysisError;
use crate::config::{AnalysisConfig, VariableSpec};

/// Sign of the imposed plate speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConvectionDirection {
    Positive,
    Negative,
}

impl ConvectionDirection {
    pub const ALL: [Self; 2] = [Self::Positive, Self::Negative];

    /// Direction of a speed; zero and NaN belong to neither.
    pub fn of(speed: f64) -> Option<Self> {
        if speed > 0.0 {
            Some(Self::Positive)
        } else if speed < 0.0 {
            Some(Self::Negative)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for ConvectionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConvectionDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown convection direction '{other}'")),
        }
    }
}

/// Statistics of the runs sharing one value of the swept variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub x_value: f64,
    pub rms: f64,
    /// Sample standard deviation, NaN for a single run
    pub std_dev: f64,
    pub count: usize,
}

/// One depth band of one variable in one direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthBandSeries {
    pub label: String,
    /// Raw `(x, y)` pairs in row order
    pub points: Vec<(f64, f64)>,
    /// One entry per distinct x, ascending
    pub groups: Vec<GroupStats>,
    /// Line through the group RMS values
    pub fit: Option<LinearFit>,
}

impl DepthBandSeries {
    fn build(label: &str, points: Vec<(f64, f64)>) -> Self {
        let groups = group_by_x(&points);
        let xs: Vec<f64> = groups.iter().map(|g| g.x_value).collect();
        let ys: Vec<f64> = groups.iter().map(|g| g.rms).collect();
        Self {
            label: label.to_string(),
            fit: LinearFit::fit(&xs, &ys),
            points,
            groups,
        }
    }
}

/// Everything measured for one variable in one convection direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableAnalysis {
    pub variable: VariableSpec,
    pub direction: ConvectionDirection,
    pub bands: Vec<DepthBandSeries>,
}

impl VariableAnalysis {
    pub fn is_empty(&self) -> bool {
        self.bands.iter().all(|b| b.points.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub variables: Vec<VariableAnalysis>,
}

impl AnalysisReport {
    /// Flatten to one record per band and distinct x, in variable,
    /// direction, band, x order.
    pub fn rms_records(&self) -> Vec<RmsRecord> {
        let mut records = Vec::new();
        for analysis in &self.variables {
            for band in &analysis.bands {
                for group in &band.groups {
                    records.push(RmsRecord {
                        depth_label: band.label.clone(),
                        variable: analysis.variable.name.clone(),
                        direction: analysis.direction,
                        x_value: group.x_value,
                        rms: group.rms,
                        std_dev: group.std_dev,
                        gradient: band.fit.map(|f| f.slope),
                        r_squared: band.fit.map(|f| f.r_squared),
                    });
                }
            }
        }
        records
    }

    pub fn for_direction(
        &self,
        direction: ConvectionDirection,
    ) -> impl Iterator<Item = &VariableAnalysis> {
        self.variables
            .iter()
            .filter(move |a| a.direction == direction)
    }
}

/// Group `(x, y)` pairs by exact x value, ascending.
pub fn group_by_x(points: &[(f64, f64)]) -> Vec<GroupStats> {
    let mut sorted: Vec<(f64, f64)> = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups = Vec::new();
    for chunk in sorted.chunk_by(|a, b| a.0 == b.0) {
        let ys: Vec<f64> = chunk.iter().map(|p| p.1).collect();
        groups.push(GroupStats {
            x_value: chunk[0].0,
            rms: rms(&ys),
            std_dev: sample_std(&ys),
            count: ys.len(),
        });
    }
    groups
}

/// Build per-variable, per-direction, per-band statistics from a results
/// table.
pub fn analyze(table: &ResultsTable, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }

    let speeds = table.column(&config.convection_column)?;
    let bands = config
        .depth_bands
        .iter()
        .map(|band| Ok((band.label.as_str(), table.column(&band.column)?)))
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    let skipped = speeds.iter().filter(|s| ConvectionDirection::of(**s).is_none()).count();
    if skipped > 0 {
        warn!(rows = skipped, "Rows with zero or missing convection speed ignored");
    }

    let mut report = AnalysisReport::default();
    for variable in &config.variables {
        let xs = table.column(&variable.name)?;

        for direction in ConvectionDirection::ALL {
            let rows: Vec<usize> = (0..speeds.len())
                .filter(|&i| ConvectionDirection::of(speeds[i]) == Some(direction))
                .collect();
            if rows.is_empty() {
                continue;
            }

            let series = bands
                .iter()
                .map(|(label, ys)| {
                    let points = rows
                        .iter()
                        .map(|&i| (xs[i], ys[i]))
                        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
                        .collect();
                    DepthBandSeries::build(label, points)
                })
                .collect::<Vec<_>>();

            debug!(
                variable = %variable.name,
                direction = %direction,
                rows = rows.len(),
                "Analysed variable"
            );
            report.variables.push(VariableAnalysis {
                variable: variable.clone(),
                direction,
                bands: series,
            });
        }
    }

    Ok(report)
}
