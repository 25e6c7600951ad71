//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for SweepConfig.
///
/// Must be kept in step with the struct hierarchy in sweep_config.rs.
/// Entries of the `depth_bands` / `variables` arrays are not walked.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [model]
        "model",
        "model.height_m",
        "model.surface_temperature_k",
        "model.cmb_temperature_k",
        "model.boundary_layer_fraction",
        "model.perturbation_amplitude",
        "model.perturbation_wavelength_m",
        "model.perturbation_mode",
        "model.mantle_density",
        "model.continent_density",
        "model.mantle_heating_w_m3",
        "model.continent_heating_scale",
        "model.oceanic_fraction",
        "model.end_time_years",
        "model.global_refinement",
        "model.x_repetitions",
        "model.output_interval_years",
        // [grid]
        "grid",
        "grid.input_csv",
        "grid.lateral_extent_m",
        "grid.convection_speed_m_yr",
        "grid.mantle_temperature_c",
        "grid.continent_heat_production",
        "grid.continent_thickness_m",
        // [generate]
        "generate",
        "generate.output_dir",
        "generate.log_path",
        "generate.file_prefix",
        "generate.run_prefix",
        "generate.mirror_convection",
        "generate.overwrite",
        "generate.template_path",
        // [analysis]
        "analysis",
        "analysis.depth_bands",
        "analysis.variables",
        "analysis.convection_column",
        "analysis.scatter_y_range",
        "analysis.rms_y_range",
        "analysis.output_dir",
        "analysis.plots",
        // [profile]
        "profile",
        "profile.interior_temperature_c",
        "profile.samples",
        "profile.horizontal_position_m",
        "profile.output",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        best = match best {
            Some((bk, bd)) if bd < dist || (bd == dist && bk < k) => Some((bk, bd)),
            _ => Some((k, dist)),
        };
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key,
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed SweepConfig.
///
/// Returns (errors, warnings): errors are impossible values that must stop
/// the run; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::SweepConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.model;

    // Absolute temperatures cannot be negative
    if m.surface_temperature_k < 0.0 {
        errors.push(format!(
            "model.surface_temperature_k = {:.1} is below absolute zero",
            m.surface_temperature_k
        ));
    }

    // Solver refinement beyond 12 levels is 4^12 cells per coarse cell
    if m.global_refinement > 12 {
        errors.push(format!(
            "model.global_refinement = {} is beyond what the solver can mesh (max 12)",
            m.global_refinement
        ));
    }

    // Heat production cannot be negative
    if m.mantle_heating_w_m3 < 0.0 {
        errors.push(format!(
            "model.mantle_heating_w_m3 = {:e} cannot be negative",
            m.mantle_heating_w_m3
        ));
    }

    // Rock densities outside 1000-10000 kg/m³ are almost certainly a unit slip
    for (field, value) in [
        ("model.mantle_density", m.mantle_density),
        ("model.continent_density", m.continent_density),
    ] {
        if value > 0.0 && !(1000.0..=10_000.0).contains(&value) {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {value:.0} is outside typical range (1000-10000 kg/m³)"),
                suggestion: None,
            });
        }
    }

    if m.output_interval_years > m.end_time_years {
        warnings.push(ValidationWarning {
            field: "model.output_interval_years".to_string(),
            message: format!(
                "output_interval_years ({:e}) exceeds end_time_years ({:e}), no snapshots will be written",
                m.output_interval_years, m.end_time_years
            ),
            suggestion: None,
        });
    }

    // Plate speeds beyond 1 m/yr are an order of magnitude above any real plate
    if config.grid.convection_speed_m_yr.iter().any(|v| v.abs() > 1.0) {
        warnings.push(ValidationWarning {
            field: "grid.convection_speed_m_yr".to_string(),
            message: "grid.convection_speed_m_yr has values above 1 m/yr".to_string(),
            suggestion: None,
        });
    }

    if config
        .grid
        .continent_thickness_m
        .iter()
        .any(|&t| t >= m.height_m)
    {
        errors.push(format!(
            "grid.continent_thickness_m must be below model.height_m ({})",
            m.height_m
        ));
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
