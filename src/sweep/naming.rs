//! File and solver output-directory names for sweep runs.

use super::parameters::ParameterSet;

/// Shortest decimal representation of a value, never in exponent notation.
///
/// `4500000.0` → `4500000`, `0.05` → `0.05`, `1e-7` → `0.0000001`.
pub fn format_value(value: f64) -> String {
    // Display for f64 is already shortest-roundtrip without exponents
    let text = format!("{value}");
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

/// Name of the solver output directory for a run.
///
/// The solver chokes on `-` and `.` in directory names, so they become `L`
/// and `_` respectively: `v5_002__4500000__L0_05__1350__5__200000`.
pub fn run_directory_name(prefix: &str, index: usize, parameters: &ParameterSet) -> String {
    let mut name = format!("{prefix}_{index:03}");
    for value in parameters.values() {
        name.push_str("__");
        name.push_str(&format_value(value));
    }
    name.replace('-', "L").replace('.', "_")
}

/// Name of the parameter file for a run, e.g. `parameters007.prm`.
pub fn parameter_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:03}.prm")
}

/// Whether `file_name` looks like a parameter file written with `prefix`:
/// the prefix, one or more digits, then `.prm`.
pub fn is_parameter_file_name(prefix: &str, file_name: &str) -> bool {
    file_name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(".prm"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
