//! Solver results exported as CSV: one row per run, one column per
//! parameter or measured quantity.

use std::path::Path;

use tracing::debug;

use super::AnalysisError;
use crate::csv::{csv_lines, csv_split};

/// A header row and the string cells beneath it.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let table = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "Loaded results table"
        );
        Ok(table)
    }

    /// Parse CSV text. The first non-blank line is the header; blank lines
    /// after it are skipped.
    pub fn parse(text: &str) -> Result<Self, AnalysisError> {
        let mut lines = csv_lines(text).filter(|l| !l.trim().is_empty());
        let header_line = lines.next().ok_or(AnalysisError::NoHeader)?;
        let headers = csv_split(header_line)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = lines.map(csv_split).collect();
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column. Exact match first, then case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h == name).or_else(|| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        })
    }

    /// Numeric values of a column, one per row. Empty or missing cells are
    /// NaN.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, AnalysisError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                column: name.to_string(),
                available: self.headers.join(", "),
            })?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = cells.get(index).map_or("", |c| c.trim());
                if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                    return Ok(f64::NAN);
                }
                cell.parse::<f64>().map_err(|_| AnalysisError::InvalidNumber {
                    // 1-based data row, header excluded
                    row: row + 1,
                    column: self.headers[index].clone(),
                    value: cell.to_string(),
                })
            })
            .collect()
    }
}
