//! Initial Temperature Profile
//!
//! Analytic starting temperature field used by every sweep run: two linear
//! thermal boundary layers (above the core-mantle boundary and below the
//! surface) around an isothermal interior, minus a small cosine/sine
//! perturbation that seeds convection.
//!
//! Heights `z` are measured upward from the core-mantle boundary, matching
//! the solver's coordinate system. Depth profiles report `h - z`.
//!
//! The same piecewise expression is written into every solver input file,
//! so the coefficients computed here are the ones the solver sees.

use std::f64::consts::PI;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ModelConstants;

#[derive(Error, Debug)]
pub enum ThermalError {
    #[error("Profile needs at least 2 samples, got {0}")]
    TooFewSamples(usize),

    #[error("Interior temperature must be finite, got {0}")]
    NonFiniteInterior(f64),

    #[error("Profile I/O error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Gradient Coefficients
// ============================================================================

/// Coefficients of the two boundary-layer segments.
///
/// Bottom layer: `T0 + A z + B`, top layer: `T0 + C z + D`, both in Kelvin
/// with `T0` the surface temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl GradientCoefficients {
    /// Derive the coefficients for an interior start temperature in ºC.
    pub fn new(model: &ModelConstants, interior_c: f64) -> Self {
        let h = model.height_m;
        let t_top = model.surface_temperature_k;
        let t_bot = model.cmb_temperature_k;
        let t_mid = interior_c + t_top;

        let z1 = h * model.boundary_layer_fraction;
        let z2 = h * (1.0 - model.boundary_layer_fraction);

        let a = (t_bot - t_mid) / (0.0 - z1);
        let b = t_bot - t_top;
        let c = (t_mid - t_top) / (z2 - h);
        let d = -c * h;

        Self { a, b, c, d }
    }
}

// ============================================================================
// Temperature Field
// ============================================================================

/// One sample of a depth profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub depth_km: f64,
    pub temperature_c: f64,
}

/// The analytic initial temperature field for one interior start temperature.
#[derive(Debug, Clone)]
pub struct InitialTemperature {
    coefficients: GradientCoefficients,
    interior_c: f64,
    height: f64,
    lower_boundary: f64,
    upper_boundary: f64,
    surface_k: f64,
    amplitude: f64,
    wavelength: f64,
    mode: f64,
}

impl InitialTemperature {
    pub fn new(model: &ModelConstants, interior_c: f64) -> Result<Self, ThermalError> {
        if !interior_c.is_finite() {
            return Err(ThermalError::NonFiniteInterior(interior_c));
        }
        let h = model.height_m;
        Ok(Self {
            coefficients: GradientCoefficients::new(model, interior_c),
            interior_c,
            height: h,
            lower_boundary: model.boundary_layer_fraction * h,
            upper_boundary: (1.0 - model.boundary_layer_fraction) * h,
            surface_k: model.surface_temperature_k,
            amplitude: model.perturbation_amplitude,
            wavelength: model.perturbation_wavelength_m,
            mode: f64::from(model.perturbation_mode),
        })
    }

    pub fn coefficients(&self) -> GradientCoefficients {
        self.coefficients
    }

    fn perturbation(&self, x: f64, z: f64) -> f64 {
        self.amplitude * (self.mode * PI * x / self.wavelength).cos() * (PI * z / self.height).sin()
    }

    /// Temperature in Kelvin at horizontal position `x` and height `z`.
    pub fn temperature_k(&self, x: f64, z: f64) -> f64 {
        let GradientCoefficients { a, b, c, d } = self.coefficients;
        let base = if z < self.lower_boundary {
            a * z + b
        } else if z > self.upper_boundary {
            c * z + d
        } else {
            self.interior_c
        };
        self.surface_k + base - self.perturbation(x, z)
    }

    /// Temperature relative to the surface offset, i.e. ºC on the solver's
    /// 273 K scale.
    pub fn temperature_c(&self, x: f64, z: f64) -> f64 {
        self.temperature_k(x, z) - self.surface_k
    }

    /// Sample `samples` evenly spaced heights from the core-mantle boundary to
    /// the surface and report them as depths, shallowest last.
    pub fn depth_profile(&self, samples: usize, x: f64) -> Result<Vec<ProfilePoint>, ThermalError> {
        if samples < 2 {
            return Err(ThermalError::TooFewSamples(samples));
        }
        let step = self.height / (samples - 1) as f64;
        Ok((0..samples)
            .map(|i| {
                // Pin the last sample to h exactly
                let z = if i == samples - 1 { self.height } else { i as f64 * step };
                ProfilePoint {
                    depth_km: (self.height - z) / 1000.0,
                    temperature_c: self.temperature_c(x, z),
                }
            })
            .collect())
    }
}

/// Write a depth profile as `Depth (km),Temperature (C)` CSV.
pub fn write_profile_csv(path: &Path, points: &[ProfilePoint]) -> Result<(), ThermalError> {
    let io_err = |source| ThermalError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "Depth (km),Temperature (C)").map_err(io_err)?;
    for p in points {
        writeln!(writer, "{},{}", p.depth_km, p.temperature_c).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}
