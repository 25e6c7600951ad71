//! Sweep Configuration - model constants, grid axes, generation and analysis settings
//!
//! Every constant the solver input, the profile plot and the result analysis
//! depend on lives here. Each struct implements `Default` with the values the
//! dissertation runs used, so running without a config file reproduces them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::sweep::Parameter;

/// Environment variable naming a config file to load.
pub const CONFIG_ENV_VAR: &str = "ASPECT_SWEEP_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sweep_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a sweep / analysis session.
///
/// Load with `SweepConfig::load()` which searches:
/// 1. `$ASPECT_SWEEP_CONFIG` env var
/// 2. `./sweep_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Physical constants shared by the solver input and the profile
    #[serde(default)]
    pub model: ModelConstants,

    /// Parameter axes (may instead come from a grid CSV)
    #[serde(default)]
    pub grid: GridConfig,

    /// Parameter file generation
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Result statistics and plots
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Standalone initial temperature profile plot
    #[serde(default)]
    pub profile: ProfileConfig,
}

impl SweepConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ASPECT_SWEEP_CONFIG` environment variable
    /// 2. `./sweep_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded sweep config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded sweep config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings and never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to a file, e.g. as a starting point for editing.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Sweep config saved");
        Ok(())
    }

    /// Validate all settings for internal consistency.
    ///
    /// Collects every problem rather than stopping at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.model;
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in m.named_values() {
            if !value.is_finite() {
                errors.push(format!("model.{name} must be finite (got {value})"));
            }
        }

        Self::check_positive(m.height_m, "model.height_m", &mut errors);
        Self::check_positive(m.perturbation_wavelength_m, "model.perturbation_wavelength_m", &mut errors);
        Self::check_positive(m.mantle_density, "model.mantle_density", &mut errors);
        Self::check_positive(m.continent_density, "model.continent_density", &mut errors);
        Self::check_positive(m.continent_heating_scale, "model.continent_heating_scale", &mut errors);

        if !(m.boundary_layer_fraction > 0.0 && m.boundary_layer_fraction < 0.5) {
            errors.push(format!(
                "model.boundary_layer_fraction ({}) must be in (0, 0.5)",
                m.boundary_layer_fraction
            ));
        }
        if m.cmb_temperature_k <= m.surface_temperature_k {
            errors.push(format!(
                "model.cmb_temperature_k ({}) must be > surface_temperature_k ({})",
                m.cmb_temperature_k, m.surface_temperature_k
            ));
        }
        if !(m.oceanic_fraction > 0.0 && m.oceanic_fraction < 1.0) {
            errors.push(format!(
                "model.oceanic_fraction ({}) must be in (0, 1)",
                m.oceanic_fraction
            ));
        }
        if m.perturbation_mode == 0 {
            errors.push("model.perturbation_mode must be >= 1".to_string());
        }
        if m.x_repetitions == 0 {
            errors.push("model.x_repetitions must be >= 1".to_string());
        }

        for (key, axis) in self.grid.named_axes() {
            if axis.iter().any(|v| !v.is_finite()) {
                errors.push(format!("grid.{key} contains a non-finite value"));
            }
        }

        let a = &self.analysis;
        if a.depth_bands.is_empty() {
            errors.push("analysis.depth_bands must contain at least one band".to_string());
        }
        if a.variables.is_empty() {
            errors.push("analysis.variables must contain at least one variable".to_string());
        }
        let mut seen = HashSet::new();
        for band in &a.depth_bands {
            if !seen.insert(band.label.as_str()) {
                errors.push(format!("analysis.depth_bands: duplicate label '{}'", band.label));
            }
        }
        let mut seen = HashSet::new();
        for var in &a.variables {
            if !seen.insert(var.name.as_str()) {
                errors.push(format!("analysis.variables: duplicate name '{}'", var.name));
            }
        }
        Self::check_range(a.scatter_y_range, "analysis.scatter_y_range", &mut errors);
        Self::check_range(a.rms_y_range, "analysis.rms_y_range", &mut errors);

        if self.profile.samples < 2 {
            errors.push(format!(
                "profile.samples ({}) must be >= 2",
                self.profile.samples
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if value <= 0.0 {
            errors.push(format!("{name} must be > 0 (got {value})"));
        }
    }

    fn check_range(range: [f64; 2], name: &str, errors: &mut Vec<String>) {
        if !range[0].is_finite() || !range[1].is_finite() {
            errors.push(format!("{name}: bounds must be finite"));
            return;
        }
        if range[0] >= range[1] {
            errors.push(format!(
                "{name}: lower bound ({}) must be < upper bound ({})",
                range[0], range[1]
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Model Constants
// ============================================================================

/// Physical constants of the convection model.
///
/// Temperatures are in Kelvin with the solver's 273 K surface offset, lengths
/// in metres, times in years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConstants {
    #[serde(default = "default_height")]
    pub height_m: f64,
    #[serde(default = "default_surface_temperature")]
    pub surface_temperature_k: f64,
    #[serde(default = "default_cmb_temperature")]
    pub cmb_temperature_k: f64,
    /// Fraction of the height taken by each thermal boundary layer
    #[serde(default = "default_boundary_layer_fraction")]
    pub boundary_layer_fraction: f64,
    #[serde(default = "default_perturbation_amplitude")]
    pub perturbation_amplitude: f64,
    #[serde(default = "default_perturbation_wavelength")]
    pub perturbation_wavelength_m: f64,
    #[serde(default = "default_perturbation_mode")]
    pub perturbation_mode: u32,
    #[serde(default = "default_mantle_density")]
    pub mantle_density: f64,
    #[serde(default = "default_continent_density")]
    pub continent_density: f64,
    #[serde(default = "default_mantle_heating")]
    pub mantle_heating_w_m3: f64,
    /// Grid heat-production values are multiplied by this to get W/m³
    #[serde(default = "default_continent_heating_scale")]
    pub continent_heating_scale: f64,
    /// Share of the lateral extent driven by the prescribed plate velocity
    #[serde(default = "default_oceanic_fraction")]
    pub oceanic_fraction: f64,
    #[serde(default = "default_end_time")]
    pub end_time_years: f64,
    #[serde(default = "default_global_refinement")]
    pub global_refinement: u32,
    #[serde(default = "default_x_repetitions")]
    pub x_repetitions: u32,
    #[serde(default = "default_output_interval")]
    pub output_interval_years: f64,
}

fn default_height() -> f64 { defaults::MODEL_HEIGHT_M }
fn default_surface_temperature() -> f64 { defaults::SURFACE_TEMPERATURE_K }
fn default_cmb_temperature() -> f64 { defaults::CMB_TEMPERATURE_K }
fn default_boundary_layer_fraction() -> f64 { defaults::BOUNDARY_LAYER_FRACTION }
fn default_perturbation_amplitude() -> f64 { defaults::PERTURBATION_AMPLITUDE }
fn default_perturbation_wavelength() -> f64 { defaults::PERTURBATION_WAVELENGTH_M }
fn default_perturbation_mode() -> u32 { defaults::PERTURBATION_MODE }
fn default_mantle_density() -> f64 { defaults::MANTLE_DENSITY }
fn default_continent_density() -> f64 { defaults::CONTINENT_DENSITY }
fn default_mantle_heating() -> f64 { defaults::MANTLE_HEATING_W_M3 }
fn default_continent_heating_scale() -> f64 { defaults::CONTINENT_HEATING_SCALE }
fn default_oceanic_fraction() -> f64 { defaults::OCEANIC_FRACTION }
fn default_end_time() -> f64 { defaults::END_TIME_YEARS }
fn default_global_refinement() -> u32 { defaults::GLOBAL_REFINEMENT }
fn default_x_repetitions() -> u32 { defaults::X_REPETITIONS }
fn default_output_interval() -> f64 { defaults::OUTPUT_INTERVAL_YEARS }

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            height_m: default_height(),
            surface_temperature_k: default_surface_temperature(),
            cmb_temperature_k: default_cmb_temperature(),
            boundary_layer_fraction: default_boundary_layer_fraction(),
            perturbation_amplitude: default_perturbation_amplitude(),
            perturbation_wavelength_m: default_perturbation_wavelength(),
            perturbation_mode: default_perturbation_mode(),
            mantle_density: default_mantle_density(),
            continent_density: default_continent_density(),
            mantle_heating_w_m3: default_mantle_heating(),
            continent_heating_scale: default_continent_heating_scale(),
            oceanic_fraction: default_oceanic_fraction(),
            end_time_years: default_end_time(),
            global_refinement: default_global_refinement(),
            x_repetitions: default_x_repetitions(),
            output_interval_years: default_output_interval(),
        }
    }
}

impl ModelConstants {
    /// All floating-point fields with their config key, for finiteness sweeps.
    pub fn named_values(&self) -> [(&'static str, f64); 13] {
        [
            ("height_m", self.height_m),
            ("surface_temperature_k", self.surface_temperature_k),
            ("cmb_temperature_k", self.cmb_temperature_k),
            ("boundary_layer_fraction", self.boundary_layer_fraction),
            ("perturbation_amplitude", self.perturbation_amplitude),
            ("perturbation_wavelength_m", self.perturbation_wavelength_m),
            ("mantle_density", self.mantle_density),
            ("continent_density", self.continent_density),
            ("mantle_heating_w_m3", self.mantle_heating_w_m3),
            ("continent_heating_scale", self.continent_heating_scale),
            ("oceanic_fraction", self.oceanic_fraction),
            ("end_time_years", self.end_time_years),
            ("output_interval_years", self.output_interval_years),
        ]
    }
}

// ============================================================================
// Grid
// ============================================================================

/// Values to sweep for each varied parameter.
///
/// Left empty by default; a grid CSV passed on the command line takes
/// precedence over these axes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    /// CSV file with one row of values per parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_csv: Option<PathBuf>,
    #[serde(default)]
    pub lateral_extent_m: Vec<f64>,
    #[serde(default)]
    pub convection_speed_m_yr: Vec<f64>,
    #[serde(default)]
    pub mantle_temperature_c: Vec<f64>,
    #[serde(default)]
    pub continent_heat_production: Vec<f64>,
    #[serde(default)]
    pub continent_thickness_m: Vec<f64>,
}

impl GridConfig {
    pub fn named_axes(&self) -> [(&'static str, &[f64]); 5] {
        [
            ("lateral_extent_m", &self.lateral_extent_m),
            ("convection_speed_m_yr", &self.convection_speed_m_yr),
            ("mantle_temperature_c", &self.mantle_temperature_c),
            ("continent_heat_production", &self.continent_heat_production),
            ("continent_thickness_m", &self.continent_thickness_m),
        ]
    }

    /// True when no axis has been given any value.
    pub fn is_empty(&self) -> bool {
        self.named_axes().iter().all(|(_, axis)| axis.is_empty())
    }
}

// ============================================================================
// Generation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Index log; relative paths resolve against the working directory
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_run_prefix")]
    pub run_prefix: String,
    /// Follow each run with a copy whose convection speed is negated
    #[serde(default = "default_true")]
    pub mirror_convection: bool,
    #[serde(default)]
    pub overwrite: bool,
    /// Replaces the built-in solver input template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf { PathBuf::from(defaults::OUTPUT_DIR) }
fn default_log_path() -> PathBuf { PathBuf::from(defaults::LOG_FILE) }
fn default_file_prefix() -> String { defaults::FILE_PREFIX.to_string() }
fn default_run_prefix() -> String { defaults::RUN_PREFIX.to_string() }
fn default_true() -> bool { true }

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            log_path: default_log_path(),
            file_prefix: default_file_prefix(),
            run_prefix: default_run_prefix(),
            mirror_convection: true,
            overwrite: false,
            template_path: None,
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// A depth interval and the results column holding its temperature metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthBand {
    /// Short label used in legends and the RMS CSV, e.g. `100-200`
    pub label: String,
    /// Results CSV column name
    pub column: String,
}

impl DepthBand {
    pub fn new(label: &str, column: &str) -> Self {
        Self {
            label: label.to_string(),
            column: column.to_string(),
        }
    }
}

/// A results column to analyse against, with its axis unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default)]
    pub unit: String,
}

impl VariableSpec {
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }

    /// Axis label, e.g. `Lateral Extent (m)`.
    pub fn axis_label(&self) -> String {
        if self.unit.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.unit)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_depth_bands")]
    pub depth_bands: Vec<DepthBand>,
    #[serde(default = "default_variables")]
    pub variables: Vec<VariableSpec>,
    #[serde(default = "default_convection_column")]
    pub convection_column: String,
    #[serde(default = "default_scatter_y_range")]
    pub scatter_y_range: [f64; 2],
    #[serde(default = "default_rms_y_range")]
    pub rms_y_range: [f64; 2],
    #[serde(default = "default_analysis_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub plots: bool,
}

fn default_depth_bands() -> Vec<DepthBand> {
    vec![
        DepthBand::new("100-200", "R values 100-200km"),
        DepthBand::new("200-400", "R values 200-400km"),
    ]
}

/// One variable per swept parameter, named and unit-labelled the way the
/// run log writes them.
fn default_variables() -> Vec<VariableSpec> {
    Parameter::ALL
        .iter()
        .map(|p| VariableSpec::new(p.label(), p.unit()))
        .collect()
}

fn default_convection_column() -> String { defaults::CONVECTION_COLUMN.to_string() }
fn default_scatter_y_range() -> [f64; 2] { defaults::SCATTER_Y_RANGE }
fn default_rms_y_range() -> [f64; 2] { defaults::RMS_Y_RANGE }
fn default_analysis_output_dir() -> PathBuf { PathBuf::from(defaults::ANALYSIS_OUTPUT_DIR) }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            depth_bands: default_depth_bands(),
            variables: default_variables(),
            convection_column: default_convection_column(),
            scatter_y_range: default_scatter_y_range(),
            rms_y_range: default_rms_y_range(),
            output_dir: default_analysis_output_dir(),
            plots: true,
        }
    }
}

// ============================================================================
// Profile Plot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Mantle interior start temperature (ºC)
    #[serde(default = "default_profile_interior")]
    pub interior_temperature_c: f64,
    #[serde(default = "default_profile_samples")]
    pub samples: usize,
    /// Horizontal position the profile is taken at (m)
    #[serde(default)]
    pub horizontal_position_m: f64,
    #[serde(default = "default_profile_output")]
    pub output: PathBuf,
}

fn default_profile_interior() -> f64 { defaults::PROFILE_INTERIOR_C }
fn default_profile_samples() -> usize { defaults::PROFILE_SAMPLES }
fn default_profile_output() -> PathBuf { PathBuf::from(defaults::PROFILE_OUTPUT) }

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            interior_temperature_c: default_profile_interior(),
            samples: default_profile_samples(),
            horizontal_position_m: 0.0,
            output: default_profile_output(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SweepConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = SweepConfig::from_toml_str("").unwrap();
        assert_eq!(config.model.height_m, 3_000_000.0);
        assert_eq!(config.analysis.depth_bands.len(), 2);
        assert!(config.generate.mirror_convection);
        assert!(config.grid.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = SweepConfig::from_toml_str(
            r#"
[model]
cmb_temperature_k = 2800.0
"#,
        )
        .unwrap();
        assert_eq!(config.model.cmb_temperature_k, 2800.0);
        assert_eq!(config.model.surface_temperature_k, 273.0);
    }

    #[test]
    fn test_inverted_temperatures_rejected() {
        let mut config = SweepConfig::default();
        config.model.cmb_temperature_k = 200.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cmb_temperature_k"));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut config = SweepConfig::default();
        config.model.boundary_layer_fraction = 0.7;
        config.profile.samples = 1;
        config.analysis.rms_y_range = [2000.0, 1000.0];
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.len() >= 3, "expected 3+ errors, got {errors:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_band_labels_rejected() {
        let mut config = SweepConfig::default();
        config.analysis.depth_bands.push(DepthBand::new("100-200", "other"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_preserves_grid() {
        let mut config = SweepConfig::default();
        config.grid.convection_speed_m_yr = vec![0.02, 0.05];
        let text = config.to_toml().unwrap();
        let back = SweepConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.grid.convection_speed_m_yr, vec![0.02, 0.05]);
        assert_eq!(back.analysis.variables, config.analysis.variables);
    }

    #[test]
    fn test_axis_label_without_unit() {
        assert_eq!(VariableSpec::new("Index", "").axis_label(), "Index");
        assert_eq!(
            VariableSpec::new("Lateral Extent", "km").axis_label(),
            "Lateral Extent (km)"
        );
    }

    #[test]
    fn test_default_variables_match_run_log_units() {
        let labels: Vec<String> = AnalysisConfig::default()
            .variables
            .iter()
            .map(VariableSpec::axis_label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "Lateral Extent (m)",
                "Convection Velocity (m/yr)",
                "Mantle Interior Starting Temperature (ºC)",
                "Continental Crust Internal Heat Production (1e-7 W/m³)",
                "Continental Crust Thickness (m)",
            ]
        );
    }
}
