//! Analysis Integration Tests
//!
//! Results CSV in, RMS summary CSV and SVG charts out, using the default
//! analysis configuration (five swept variables, two depth bands).

use std::fmt::Write as _;

use aspect_sweep::analysis::{analyze, read_rms_csv, write_rms_csv, ConvectionDirection, ResultsTable};
use aspect_sweep::config::{AnalysisConfig, GenerateConfig, ModelConstants};
use aspect_sweep::plot;
use aspect_sweep::sweep::{ParameterGrid, SweepWriter};

/// Two lateral extents x two temperatures, both directions, two repeats each.
fn results_csv() -> String {
    let mut csv = String::from(
        "Lateral Extent,Convection Velocity,Mantle Interior Starting Temperature,\
         Continental Crust Internal Heat Production,Continental Crust Thickness,\
         R values 100-200km,R values 200-400km\n",
    );
    for extent in [4500.0, 6000.0] {
        for speed in [0.05, -0.05] {
            for temp in [1300.0, 1400.0] {
                for repeat in 0..2 {
                    let r1 = 1000.0 + extent / 10.0 + temp / 10.0 + f64::from(repeat) * 10.0;
                    let r2 = r1 + 200.0;
                    writeln!(csv, "{extent},{speed},{temp},5,200,{r1},{r2}").unwrap();
                }
            }
        }
    }
    csv
}

#[test]
fn analysis_covers_every_variable_and_direction() {
    let table = ResultsTable::parse(&results_csv()).unwrap();
    assert_eq!(table.row_count(), 16);

    let config = AnalysisConfig::default();
    let report = analyze(&table, &config).unwrap();
    assert_eq!(report.variables.len(), 5 * 2);

    let lateral = report
        .variables
        .iter()
        .find(|v| v.variable.name == "Lateral Extent" && v.direction == ConvectionDirection::Negative)
        .unwrap();
    assert_eq!(lateral.bands.len(), 2);
    let band = &lateral.bands[0];
    assert_eq!(band.points.len(), 8);
    assert_eq!(band.groups.len(), 2);
    assert_eq!(band.groups[0].x_value, 4500.0);
    assert_eq!(band.groups[0].count, 4);

    // RMS rises by ~150 K per 1500 km of extent
    let fit = band.fit.unwrap();
    assert!(fit.slope > 0.09 && fit.slope < 0.11, "slope {}", fit.slope);

    // A single distinct value gives no fit
    let thickness = report
        .variables
        .iter()
        .find(|v| v.variable.name == "Continental Crust Thickness")
        .unwrap();
    assert!(thickness.bands.iter().all(|b| b.fit.is_none()));
}

#[test]
fn rms_csv_round_trips_through_disk() {
    let table = ResultsTable::parse(&results_csv()).unwrap();
    let report = analyze(&table, &AnalysisConfig::default()).unwrap();
    let records = report.rms_records();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rms_values.csv");
    write_rms_csv(&path, &records).unwrap();
    let back = read_rms_csv(&path).unwrap();

    assert_eq!(back.len(), records.len());
    for (a, b) in records.iter().zip(&back) {
        assert_eq!(a.depth_label, b.depth_label);
        assert_eq!(a.variable, b.variable);
        assert_eq!(a.direction, b.direction);
        assert!((a.rms - b.rms).abs() < 1e-9);
        assert_eq!(a.gradient.is_some(), b.gradient.is_some());
    }
}

#[test]
fn charts_written_with_expected_names() {
    let table = ResultsTable::parse(&results_csv()).unwrap();
    let config = AnalysisConfig::default();
    let report = analyze(&table, &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("scatter plots");
    let written = plot::render_report(&report, &config, &out).unwrap();

    // 10 scatter charts plus one RMS summary per direction
    assert_eq!(written.len(), 12);
    assert!(out.join("scatter_plot_Lateral Extent_Positive_conv.svg").exists());
    assert!(out.join("scatter_plot_Continental Crust Thickness_Negative_conv.svg").exists());
    assert!(out.join("rms_scatter_Positive_convection.svg").exists());
    assert!(out.join("rms_scatter_Negative_convection.svg").exists());
}

#[test]
fn missing_band_column_is_reported() {
    let table = ResultsTable::parse("Lateral Extent,Convection Velocity\n4500,0.05\n").unwrap();
    let err = analyze(&table, &AnalysisConfig::default()).unwrap_err();
    assert!(err.to_string().contains("R values 100-200km"));
}

// ============================================================================
// Generated Run Log
// ============================================================================

#[test]
fn generated_run_log_analyses_with_run_log_units() {
    let dir = tempfile::tempdir().unwrap();
    let settings = GenerateConfig {
        output_dir: dir.path().join("automated"),
        log_path: dir.path().join("permutations.csv"),
        ..GenerateConfig::default()
    };
    let grid = ParameterGrid::new([
        vec![4.5e6, 6e6],
        vec![0.05],
        vec![1350.0],
        vec![5.0, 10.0],
        vec![200_000.0],
    ]);
    SweepWriter::new(ModelConstants::default(), settings)
        .unwrap()
        .write(&grid)
        .unwrap();

    // Append the two result columns the runs would produce
    let log = std::fs::read_to_string(dir.path().join("permutations.csv")).unwrap();
    let mut results = String::new();
    for (i, line) in log.lines().enumerate() {
        if i == 0 {
            writeln!(results, "{line},R values 100-200km,R values 200-400km").unwrap();
        } else {
            let r = 1300.0 + i as f64 * 5.0;
            writeln!(results, "{line},{r},{}", r + 150.0).unwrap();
        }
    }

    let table = ResultsTable::parse(&results).unwrap();
    let report = analyze(&table, &AnalysisConfig::default()).unwrap();

    let find = |name: &str| {
        report
            .variables
            .iter()
            .find(|v| v.variable.name == name && v.direction == ConvectionDirection::Positive)
            .unwrap()
    };

    let lateral = find("Lateral Extent");
    assert_eq!(lateral.variable.axis_label(), "Lateral Extent (m)");
    let xs: Vec<f64> = lateral.bands[0].groups.iter().map(|g| g.x_value).collect();
    assert_eq!(xs, vec![4.5e6, 6e6]);

    let heat = find("Continental Crust Internal Heat Production");
    assert_eq!(
        heat.variable.axis_label(),
        "Continental Crust Internal Heat Production (1e-7 W/m³)"
    );
    let xs: Vec<f64> = heat.bands[0].groups.iter().map(|g| g.x_value).collect();
    assert_eq!(xs, vec![5.0, 10.0]);

    assert_eq!(
        find("Continental Crust Thickness").variable.axis_label(),
        "Continental Crust Thickness (m)"
    );

    let out = dir.path().join("charts");
    plot::render_report(&report, &AnalysisConfig::default(), &out).unwrap();
    let svg = std::fs::read_to_string(
        out.join(plot::scatter_file_name("Lateral Extent", ConvectionDirection::Positive)),
    )
    .unwrap();
    assert!(svg.contains("Lateral Extent (m)"));
}
