//! Built-in default constants.
//!
//! These are the values the dissertation runs were set up with. Every one of
//! them can be overridden from `sweep_config.toml`.

// ============================================================================
// Model Geometry & Thermal Boundary Conditions
// ============================================================================

/// Depth of the model box (m). Core-mantle boundary to surface.
pub const MODEL_HEIGHT_M: f64 = 3_000_000.0;

/// Fixed surface temperature (K).
pub const SURFACE_TEMPERATURE_K: f64 = 273.0;

/// Fixed core-mantle boundary temperature (K).
pub const CMB_TEMPERATURE_K: f64 = 2723.0;

/// Fraction of the model height occupied by each thermal boundary layer.
pub const BOUNDARY_LAYER_FRACTION: f64 = 0.1;

// ============================================================================
// Initial Temperature Perturbation
// ============================================================================

/// Amplitude of the cosine/sine perturbation (K).
pub const PERTURBATION_AMPLITUDE: f64 = 0.01;

/// Horizontal wavelength of the perturbation (m).
pub const PERTURBATION_WAVELENGTH_M: f64 = 15_000_000.0;

/// Horizontal mode number of the perturbation.
pub const PERTURBATION_MODE: u32 = 1;

// ============================================================================
// Materials
// ============================================================================

/// Reference mantle density (kg/m³).
pub const MANTLE_DENSITY: f64 = 3400.0;

/// Continental crust density (kg/m³).
pub const CONTINENT_DENSITY: f64 = 3350.0;

/// Internal heat production of the mantle (W/m³).
pub const MANTLE_HEATING_W_M3: f64 = 6e-9;

/// Multiplier converting grid heat-production values to W/m³.
pub const CONTINENT_HEATING_SCALE: f64 = 1e-7;

/// Fraction of the lateral extent covered by the moving oceanic plate.
pub const OCEANIC_FRACTION: f64 = 2.0 / 3.0;

// ============================================================================
// Solver Run Control
// ============================================================================

/// Model end time (years).
pub const END_TIME_YEARS: f64 = 1e9;

/// Global mesh refinement level.
pub const GLOBAL_REFINEMENT: u32 = 6;

/// Number of coarse cells along x.
pub const X_REPETITIONS: u32 = 5;

/// Interval between graphical output snapshots (years).
pub const OUTPUT_INTERVAL_YEARS: f64 = 2e7;

// ============================================================================
// Sweep Generation
// ============================================================================

/// Directory the `.prm` files are written into.
pub const OUTPUT_DIR: &str = "automated";

/// Name of the index-to-parameters log.
pub const LOG_FILE: &str = "permutations.csv";

/// Name of the JSON manifest written beside the log.
pub const MANIFEST_FILE: &str = "sweep_manifest.json";

/// Prefix of generated parameter files (`parameters001.prm`).
pub const FILE_PREFIX: &str = "parameters";

/// Prefix of the solver output directory names (`v5_001__...`).
pub const RUN_PREFIX: &str = "v5";

// ============================================================================
// Analysis & Plotting
// ============================================================================

/// Directory the analysis plots and `rms_values.csv` are written into.
pub const ANALYSIS_OUTPUT_DIR: &str = "scatter plots";

/// Name of the RMS summary CSV.
pub const RMS_FILE: &str = "rms_values.csv";

/// Results column holding the signed convection speed.
pub const CONVECTION_COLUMN: &str = "Convection Velocity";

/// Y-axis range of the per-variable scatter plots (K).
pub const SCATTER_Y_RANGE: [f64; 2] = [600.0, 2200.0];

/// Y-axis range of the RMS summary plot (K).
pub const RMS_Y_RANGE: [f64; 2] = [1000.0, 2000.0];

/// Interior start temperature used for the standalone profile plot (ºC).
pub const PROFILE_INTERIOR_C: f64 = 1350.0;

/// Number of heights sampled for the profile plot.
pub const PROFILE_SAMPLES: usize = 500;

/// Output path of the profile plot.
pub const PROFILE_OUTPUT: &str = "initial temp variation with depth.svg";
