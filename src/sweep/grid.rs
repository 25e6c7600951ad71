//! Parameter grid: axes of values and their Cartesian expansion into runs.

use std::path::Path;

use tracing::{debug, info};

use super::parameters::{Parameter, ParameterSet};
use super::{SweepError, SweepRun};
use crate::config::GridConfig;
use crate::csv::{csv_lines, csv_split};

/// One axis of values per parameter, in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    axes: [Vec<f64>; Parameter::COUNT],
}

impl ParameterGrid {
    pub fn new(axes: [Vec<f64>; Parameter::COUNT]) -> Self {
        Self { axes }
    }

    /// Read a grid CSV from disk. See [`ParameterGrid::parse_csv`].
    pub fn from_csv(path: &Path) -> Result<Self, SweepError> {
        let text = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        let grid = Self::parse_csv(&text)?;
        debug!(path = %path.display(), combinations = grid.combination_count(), "Loaded grid CSV");
        Ok(grid)
    }

    /// Parse a grid CSV.
    ///
    /// The first line is a header and is ignored. Each following line with
    /// at least one non-empty cell holds the values of one parameter, in [`Parameter::ALL`] order.
    /// Empty cells are skipped so axes can have different lengths.
    pub fn parse_csv(text: &str) -> Result<Self, SweepError> {
        let mut axes: Vec<Vec<f64>> = Vec::with_capacity(Parameter::COUNT);

        for (line_no, line) in csv_lines(text).enumerate().skip(1) {
            let cells = csv_split(line);
            // Spreadsheets export trailing blank rows as bare commas
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let mut axis = Vec::new();
            for (col, cell) in cells.iter().enumerate() {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell.parse().map_err(|_| SweepError::InvalidCell {
                    line: line_no + 1,
                    column: col + 1,
                    value: cell.to_string(),
                })?;
                axis.push(value);
            }
            axes.push(axis);
        }

        let rows = axes.len();
        let axes: [Vec<f64>; Parameter::COUNT] = axes
            .try_into()
            .map_err(|_| SweepError::GridShape { rows })?;
        Ok(Self { axes })
    }

    /// Pick the grid source: an explicit CSV path first, then
    /// `[grid] input_csv`, then the `[grid]` axes themselves.
    pub fn resolve(explicit_csv: Option<&Path>, config: &GridConfig) -> Result<Self, SweepError> {
        if let Some(path) = explicit_csv.or(config.input_csv.as_deref()) {
            info!(path = %path.display(), "Reading parameter grid");
            return Self::from_csv(path);
        }
        if config.is_empty() {
            return Err(SweepError::NoGrid);
        }
        info!("Using parameter grid from config");
        Ok(Self::from_config(config))
    }

    /// Axes from `[grid]`, in [`Parameter::ALL`] order.
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            axes: [
                config.lateral_extent_m.clone(),
                config.convection_speed_m_yr.clone(),
                config.mantle_temperature_c.clone(),
                config.continent_heat_production.clone(),
                config.continent_thickness_m.clone(),
            ],
        }
    }

    pub fn axis(&self, parameter: Parameter) -> &[f64] {
        &self.axes[parameter.index()]
    }

    /// Check that every axis is usable for generating solver input.
    pub fn validate(&self) -> Result<(), SweepError> {
        for p in Parameter::ALL {
            let axis = self.axis(p);
            if axis.is_empty() {
                return Err(SweepError::EmptyAxis(p));
            }
            for &value in axis {
                let reason = if !value.is_finite() {
                    Some("must be finite")
                } else {
                    match p {
                        Parameter::LateralExtent if value <= 0.0 => Some("must be > 0"),
                        Parameter::ContinentThickness | Parameter::ContinentHeatProduction
                            if value < 0.0 =>
                        {
                            Some("must be >= 0")
                        }
                        _ => None,
                    }
                };
                if let Some(reason) = reason {
                    return Err(SweepError::InvalidAxisValue {
                        parameter: p,
                        value,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of distinct combinations, before mirroring.
    pub fn combination_count(&self) -> usize {
        self.axes.iter().map(Vec::len).product()
    }

    /// Cartesian product in lexicographic order, last parameter fastest.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            grid: self,
            cursor: [0; Parameter::COUNT],
            done: self.axes.iter().any(Vec::is_empty),
        }
    }

    /// Number the combinations from 1, following each with its mirrored
    /// (negated convection speed) run when `mirror` is set.
    ///
    /// Zero-speed combinations are never mirrored since the mirror would be
    /// an identical run.
    pub fn expand(&self, mirror: bool) -> Vec<SweepRun> {
        let mut runs = Vec::with_capacity(self.combination_count() * if mirror { 2 } else { 1 });
        let mut index = 1;
        for set in self.combinations() {
            runs.push(SweepRun {
                index,
                parameters: set,
                mirrored: false,
            });
            index += 1;

            if mirror && set.convection_speed() != 0.0 {
                runs.push(SweepRun {
                    index,
                    parameters: set.mirrored(),
                    mirrored: true,
                });
                index += 1;
            }
        }
        runs
    }
}

/// Iterator over grid combinations. See [`ParameterGrid::combinations`].
pub struct Combinations<'a> {
    grid: &'a ParameterGrid,
    cursor: [usize; Parameter::COUNT],
    done: bool,
}

impl Iterator for Combinations<'_> {
    type Item = ParameterSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut values = [0.0; Parameter::COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = self.grid.axes[i][self.cursor[i]];
        }

        // Odometer increment from the last axis
        let mut pos = Parameter::COUNT;
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.cursor[pos] += 1;
            if self.cursor[pos] < self.grid.axes[pos].len() {
                break;
            }
            self.cursor[pos] = 0;
        }

        Some(ParameterSet::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> ParameterGrid {
        ParameterGrid::new([
            vec![4.5e6, 6e6],
            vec![0.05],
            vec![1300.0, 1400.0],
            vec![1.0],
            vec![150_000.0],
        ])
    }

    #[test]
    fn test_combinations_last_axis_fastest() {
        let sets: Vec<_> = small_grid().combinations().collect();
        assert_eq!(sets.len(), 4);
        assert_eq!(sets[0].values(), [4.5e6, 0.05, 1300.0, 1.0, 150_000.0]);
        assert_eq!(sets[1].values(), [4.5e6, 0.05, 1400.0, 1.0, 150_000.0]);
        assert_eq!(sets[2].values(), [6e6, 0.05, 1300.0, 1.0, 150_000.0]);
        assert_eq!(sets[3].values(), [6e6, 0.05, 1400.0, 1.0, 150_000.0]);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let grid = ParameterGrid::new([vec![1.0], vec![], vec![1.0], vec![1.0], vec![1.0]]);
        assert_eq!(grid.combinations().count(), 0);
        assert!(matches!(
            grid.validate(),
            Err(SweepError::EmptyAxis(Parameter::ConvectionSpeed))
        ));
    }

    #[test]
    fn test_expand_interleaves_mirrors() {
        let runs = small_grid().expand(true);
        assert_eq!(runs.len(), 8);
        let indices: Vec<_> = runs.iter().map(|r| r.index).collect();
        assert_eq!(indices, (1..=8).collect::<Vec<_>>());
        assert!(!runs[0].mirrored);
        assert!(runs[1].mirrored);
        assert_eq!(runs[1].parameters.convection_speed(), -0.05);
        assert_eq!(runs[1].parameters.mantle_start_temperature(), 1300.0);
        assert_eq!(runs[2].parameters.mantle_start_temperature(), 1400.0);
    }

    #[test]
    fn test_expand_without_mirror() {
        let runs = small_grid().expand(false);
        assert_eq!(runs.len(), 4);
        assert!(runs.iter().all(|r| !r.mirrored));
    }

    #[test]
    fn test_zero_speed_not_mirrored() {
        let grid = ParameterGrid::new([
            vec![4.5e6],
            vec![0.0, 0.02],
            vec![1350.0],
            vec![1.0],
            vec![100_000.0],
        ]);
        let runs = grid.expand(true);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].parameters.convection_speed(), 0.0);
        assert_eq!(runs[1].parameters.convection_speed(), 0.02);
        assert_eq!(runs[2].parameters.convection_speed(), -0.02);
        assert_eq!(runs[2].index, 3);
    }

    #[test]
    fn test_parse_csv_rows_are_axes() {
        let text = "\
a,b,c
4500000,6000000,7500000
0.02,0.05,
1300,1350,1400
1,5,10
100000,200000,300000
";
        let grid = ParameterGrid::parse_csv(text).unwrap();
        assert_eq!(grid.axis(Parameter::LateralExtent), &[4.5e6, 6e6, 7.5e6]);
        assert_eq!(grid.axis(Parameter::ConvectionSpeed), &[0.02, 0.05]);
        assert_eq!(grid.combination_count(), 3 * 2 * 3 * 3 * 3);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_parse_csv_wrong_row_count() {
        let err = ParameterGrid::parse_csv("h\n1\n2\n").unwrap_err();
        assert!(matches!(err, SweepError::GridShape { rows: 2 }));
    }

    #[test]
    fn test_parse_csv_bad_cell_reports_position() {
        let err = ParameterGrid::parse_csv("h\n1\n2\nthree\n4\n5\n").unwrap_err();
        match err {
            SweepError::InvalidCell { line, column, value } => {
                assert_eq!((line, column), (4, 1));
                assert_eq!(value, "three");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_negative_extent_rejected() {
        let grid = ParameterGrid::new([vec![-1.0], vec![0.1], vec![1.0], vec![1.0], vec![1.0]]);
        assert!(matches!(
            grid.validate(),
            Err(SweepError::InvalidAxisValue {
                parameter: Parameter::LateralExtent,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_csv_skips_blank_cell_rows() {
        let text = "P,V1,V2\n4500000,6000000\n0.05\n1300,1400\n5\n200000\n,,\n , \n";
        let grid = ParameterGrid::parse_csv(text).unwrap();
        assert_eq!(grid.combination_count(), 4);
        assert_eq!(grid.axis(Parameter::ContinentThickness), &[200_000.0]);
    }

    fn config_axes() -> GridConfig {
        GridConfig {
            lateral_extent_m: vec![4.5e6],
            convection_speed_m_yr: vec![0.02, 0.05],
            mantle_temperature_c: vec![1350.0],
            continent_heat_production: vec![1.0, 5.0, 10.0],
            continent_thickness_m: vec![100_000.0],
            ..GridConfig::default()
        }
    }

    #[test]
    fn test_from_config_axis_order() {
        let grid = ParameterGrid::from_config(&config_axes());
        assert_eq!(grid.axis(Parameter::LateralExtent), &[4.5e6]);
        assert_eq!(grid.axis(Parameter::ConvectionSpeed), &[0.02, 0.05]);
        assert_eq!(grid.axis(Parameter::MantleStartTemperature), &[1350.0]);
        assert_eq!(grid.axis(Parameter::ContinentHeatProduction), &[1.0, 5.0, 10.0]);
        assert_eq!(grid.axis(Parameter::ContinentThickness), &[100_000.0]);
        let first = grid.combinations().next().unwrap();
        assert_eq!(first.values(), [4.5e6, 0.02, 1350.0, 1.0, 100_000.0]);
    }

    #[test]
    fn test_resolve_prefers_explicit_csv() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.csv");
        let configured = dir.path().join("configured.csv");
        std::fs::write(&explicit, "h\n1\n2\n3\n4\n5\n").unwrap();
        std::fs::write(&configured, "h\n9\n9\n9\n9\n9\n").unwrap();

        let config = GridConfig {
            input_csv: Some(configured.clone()),
            ..config_axes()
        };
        let grid = ParameterGrid::resolve(Some(&explicit), &config).unwrap();
        assert_eq!(grid.axis(Parameter::LateralExtent), &[1.0]);

        // Without an explicit path the configured CSV beats the axes
        let grid = ParameterGrid::resolve(None, &config).unwrap();
        assert_eq!(grid.axis(Parameter::LateralExtent), &[9.0]);
    }

    #[test]
    fn test_resolve_falls_back_to_config_axes() {
        let grid = ParameterGrid::resolve(None, &config_axes()).unwrap();
        assert_eq!(grid, ParameterGrid::from_config(&config_axes()));
    }

    #[test]
    fn test_resolve_without_any_source() {
        assert!(matches!(
            ParameterGrid::resolve(None, &GridConfig::default()),
            Err(SweepError::NoGrid)
        ));
    }

    #[test]
    fn test_resolve_missing_csv_is_io_error() {
        let missing = Path::new("/nonexistent/grid.csv");
        assert!(matches!(
            ParameterGrid::resolve(Some(missing), &config_axes()),
            Err(SweepError::Io { .. })
        ));
    }
}
