//! Summary statistics and least-squares fits.
//!
//! `LinearFit` follows the usual simple-regression conventions: two-sided
//! p-value for a zero slope from Student's t with `n - 2` degrees of freedom
//! (via statrs), and the standard error of the slope.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Root mean square: `sqrt(mean(v²))`. NaN for an empty slice.
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mean_square = values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64;
    mean_square.sqrt()
}

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (`n - 1` denominator). NaN when `n < 2`.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub r_value: f64,
    pub r_squared: f64,
    /// Two-sided p-value for the null hypothesis of zero slope
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
    pub sample_count: usize,
}

impl LinearFit {
    /// Fit a line through `(x[i], y[i])`.
    ///
    /// Returns `None` for fewer than two points, mismatched lengths, or when
    /// every `x` is identical (the slope is undefined).
    pub fn fit(x: &[f64], y: &[f64]) -> Option<Self> {
        let n = x.len();
        if n < 2 || n != y.len() {
            return None;
        }

        let x_mean = mean(x);
        let y_mean = mean(y);
        let mut ss_xx = 0.0;
        let mut ss_yy = 0.0;
        let mut ss_xy = 0.0;
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            ss_xx += dx * dx;
            ss_yy += dy * dy;
            ss_xy += dx * dy;
        }

        if ss_xx == 0.0 {
            return None;
        }

        let slope = ss_xy / ss_xx;
        let intercept = y_mean - slope * x_mean;
        let r_value = if ss_yy == 0.0 {
            0.0
        } else {
            (ss_xy / (ss_xx * ss_yy).sqrt()).clamp(-1.0, 1.0)
        };
        let r_squared = r_value * r_value;

        let (p_value, std_err) = if n == 2 {
            // Two points always fit exactly
            (if y[0] == y[1] { 1.0 } else { 0.0 }, 0.0)
        } else {
            let df = (n - 2) as f64;
            let std_err = ((1.0 - r_squared).max(0.0) * ss_yy / ss_xx / df).sqrt();
            (Self::p_value_for_r(r_value, df), std_err)
        };

        Some(Self {
            slope,
            intercept,
            r_value,
            r_squared,
            p_value,
            std_err,
            sample_count: n,
        })
    }

    /// Two-tailed p-value of a correlation coefficient with `df` degrees of
    /// freedom.
    fn p_value_for_r(r: f64, df: f64) -> f64 {
        let one_minus_r2 = 1.0 - r * r;
        if one_minus_r2 <= f64::EPSILON {
            return 0.0;
        }
        let t_stat = r * (df / one_minus_r2).sqrt();
        match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => (2.0 * (1.0 - t_dist.cdf(t_stat.abs()))).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    }

    /// Evaluate the line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}
