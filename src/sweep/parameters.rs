//! The five varied model parameters and one combination of their values.

use serde::{Deserialize, Serialize};

/// A parameter varied across the sweep, in grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Horizontal extent of the model box (m)
    LateralExtent,
    /// Prescribed plate speed on the oceanic part of the top boundary (m/yr).
    /// The sign gives the direction.
    ConvectionSpeed,
    /// Mantle interior start temperature (ºC)
    MantleStartTemperature,
    /// Continental crust radiogenic heating in grid units (× scale = W/m³)
    ContinentHeatProduction,
    /// Continental crust thickness (m)
    ContinentThickness,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::LateralExtent,
        Parameter::ConvectionSpeed,
        Parameter::MantleStartTemperature,
        Parameter::ContinentHeatProduction,
        Parameter::ContinentThickness,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in grid order.
    pub fn index(self) -> usize {
        match self {
            Parameter::LateralExtent => 0,
            Parameter::ConvectionSpeed => 1,
            Parameter::MantleStartTemperature => 2,
            Parameter::ContinentHeatProduction => 3,
            Parameter::ContinentThickness => 4,
        }
    }

    /// Column label in the run log. Matches the default analysis variables.
    pub fn label(self) -> &'static str {
        match self {
            Parameter::LateralExtent => "Lateral Extent",
            Parameter::ConvectionSpeed => "Convection Velocity",
            Parameter::MantleStartTemperature => "Mantle Interior Starting Temperature",
            Parameter::ContinentHeatProduction => "Continental Crust Internal Heat Production",
            Parameter::ContinentThickness => "Continental Crust Thickness",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::LateralExtent | Parameter::ContinentThickness => "m",
            Parameter::ConvectionSpeed => "m/yr",
            Parameter::MantleStartTemperature => "ºC",
            Parameter::ContinentHeatProduction => "1e-7 W/m³",
        }
    }

    /// Key of this parameter's axis under `[grid]` in the config file.
    pub fn config_key(self) -> &'static str {
        match self {
            Parameter::LateralExtent => "lateral_extent_m",
            Parameter::ConvectionSpeed => "convection_speed_m_yr",
            Parameter::MantleStartTemperature => "mantle_temperature_c",
            Parameter::ContinentHeatProduction => "continent_heat_production",
            Parameter::ContinentThickness => "continent_thickness_m",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One value per parameter, in grid order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: [f64; Parameter::COUNT],
}

impl ParameterSet {
    pub fn new(values: [f64; Parameter::COUNT]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> [f64; Parameter::COUNT] {
        self.values
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        self.values[parameter.index()]
    }

    pub fn lateral_extent(&self) -> f64 {
        self.get(Parameter::LateralExtent)
    }

    pub fn convection_speed(&self) -> f64 {
        self.get(Parameter::ConvectionSpeed)
    }

    pub fn mantle_start_temperature(&self) -> f64 {
        self.get(Parameter::MantleStartTemperature)
    }

    pub fn continent_heat_production(&self) -> f64 {
        self.get(Parameter::ContinentHeatProduction)
    }

    pub fn continent_thickness(&self) -> f64 {
        self.get(Parameter::ContinentThickness)
    }

    /// The same combination with the plate moving the other way.
    pub fn mirrored(&self) -> Self {
        let mut values = self.values;
        values[Parameter::ConvectionSpeed.index()] = -values[Parameter::ConvectionSpeed.index()];
        Self { values }
    }
}
