//! The RMS summary CSV: one row per depth band, variable, direction and
//! distinct parameter value.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::grouping::ConvectionDirection;
use super::AnalysisError;
use crate::csv::{csv_join, csv_lines, csv_split};

pub const RMS_HEADER: [&str; 8] = [
    "Depth Label",
    "Variable",
    "Convection Velocity",
    "X Value",
    "RMS Value",
    "Standard Deviation",
    "Gradient",
    "R Squared",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmsRecord {
    pub depth_label: String,
    pub variable: String,
    pub direction: ConvectionDirection,
    pub x_value: f64,
    pub rms: f64,
    pub std_dev: f64,
    /// Slope of the band's fit, when one exists
    pub gradient: Option<f64>,
    pub r_squared: Option<f64>,
}

fn number_cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map_or_else(String::new, number_cell)
}

pub fn write_rms_csv(path: &Path, records: &[RmsRecord]) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AnalysisError::io(parent, e))?;
    }
    let io_err = |e| AnalysisError::io(path, e);
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", csv_join(&RMS_HEADER)).map_err(io_err)?;
    for r in records {
        let row = [
            r.depth_label.clone(),
            r.variable.clone(),
            r.direction.to_string(),
            number_cell(r.x_value),
            number_cell(r.rms),
            number_cell(r.std_dev),
            optional_cell(r.gradient),
            optional_cell(r.r_squared),
        ];
        writeln!(writer, "{}", csv_join(&row)).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

pub fn read_rms_csv(path: &Path) -> Result<Vec<RmsRecord>, AnalysisError> {
    let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
    parse_rms_csv(&text)
}

/// Parse RMS summary text. The last two columns are optional so files with
/// only the first six columns still load.
pub fn parse_rms_csv(text: &str) -> Result<Vec<RmsRecord>, AnalysisError> {
    let mut lines = csv_lines(text).enumerate().filter(|(_, l)| !l.trim().is_empty());
    lines.next().ok_or(AnalysisError::NoHeader)?;

    lines
        .map(|(i, line)| {
            let line_no = i + 1;
            let bad = |reason: String| AnalysisError::BadRecord {
                line: line_no,
                reason,
            };
            let fields = csv_split(line);
            if fields.len() < 6 {
                return Err(bad(format!("expected at least 6 fields, found {}", fields.len())));
            }
            let number = |idx: usize| -> Result<f64, AnalysisError> {
                let cell = fields[idx].trim();
                if cell.is_empty() {
                    return Ok(f64::NAN);
                }
                cell.parse::<f64>()
                    .map_err(|_| bad(format!("'{cell}' in column '{}' is not a number", RMS_HEADER[idx])))
            };
            let optional = |idx: usize| -> Result<Option<f64>, AnalysisError> {
                if fields.get(idx).is_some_and(|c| !c.trim().is_empty()) {
                    number(idx).map(Some)
                } else {
                    Ok(None)
                }
            };

            Ok(RmsRecord {
                depth_label: fields[0].trim().to_string(),
                variable: fields[1].trim().to_string(),
                direction: fields[2].parse().map_err(bad)?,
                x_value: number(3)?,
                rms: number(4)?,
                std_dev: number(5)?,
                gradient: optional(6)?,
                r_squared: optional(7)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: f64, std_dev: f64, gradient: Option<f64>) -> RmsRecord {
        RmsRecord {
            depth_label: "100-200".to_string(),
            variable: "Lateral Extent".to_string(),
            direction: ConvectionDirection::Negative,
            x_value: x,
            rms: 1500.25,
            std_dev,
            gradient,
            r_squared: gradient.map(|_| 0.5),
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/rms_values.csv");
        let records = vec![record(4.5e6, 12.0, Some(-0.001)), record(6e6, f64::NAN, None)];
        write_rms_csv(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Depth Label,Variable,Convection Velocity,X Value,"));
        assert!(text.contains("100-200,Lateral Extent,Negative,4500000,1500.25,12,-0.001,0.5"));
        assert!(text.contains("100-200,Lateral Extent,Negative,6000000,1500.25,,,"));

        let back = read_rms_csv(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], records[0]);
        assert!(back[1].std_dev.is_nan());
        assert_eq!(back[1].gradient, None);
    }

    #[test]
    fn test_six_column_file_loads() {
        let text = "Depth Label,Variable,Convection Velocity,X Value,RMS Value,Standard Deviation\n\
                    200-400,Continental Crust Thickness,Positive,200000,1700,30\n";
        let records = parse_rms_csv(text).unwrap();
        assert_eq!(records[0].direction, ConvectionDirection::Positive);
        assert_eq!(records[0].r_squared, None);
    }

    #[test]
    fn test_bad_direction_reports_line() {
        let text = "h\n100-200,X,Sideways,1,2,3\n";
        match parse_rms_csv(text).unwrap_err() {
            AnalysisError::BadRecord { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("sideways"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
