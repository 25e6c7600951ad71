//! Sweep Generation Tests
//!
//! End-to-end generation from a grid CSV into a temporary directory:
//! file numbering, mirrored runs, the run log, the manifest, and the
//! overwrite guard with its cleanup of files from earlier sweeps.

use aspect_sweep::config::{GenerateConfig, ModelConstants};
use aspect_sweep::sweep::{ParameterGrid, SweepError, SweepManifest, SweepWriter};

const GRID_CSV: &str = "\
Parameter,Value 1,Value 2
4500000,6000000
0.05
1300,1400
5
200000
";

fn settings(dir: &std::path::Path) -> GenerateConfig {
    GenerateConfig {
        output_dir: dir.join("automated"),
        log_path: dir.join("permutations.csv"),
        ..GenerateConfig::default()
    }
}

// ============================================================================
// Full Generation
// ============================================================================

#[test]
fn generates_numbered_files_with_mirrors() {
    let dir = tempfile::tempdir().unwrap();
    let grid = ParameterGrid::parse_csv(GRID_CSV).unwrap();
    assert_eq!(grid.combination_count(), 4);

    let writer = SweepWriter::new(ModelConstants::default(), settings(dir.path())).unwrap();
    let summary = writer.write(&grid).unwrap();
    assert_eq!(summary.files_written, 8);

    let out = dir.path().join("automated");
    for i in 1..=8 {
        assert!(out.join(format!("parameters{i:03}.prm")).exists(), "missing file {i}");
    }
    assert!(!out.join("parameters009.prm").exists());

    // Run 2 mirrors run 1
    let second = std::fs::read_to_string(out.join("parameters002.prm")).unwrap();
    assert!(second.contains("v5_002__4500000__L0_05__1300__5__200000"));
    assert!(second.contains("if(x<3000000, -0.05, 0); 0"));
    assert!(!second.contains("{{"), "unfilled placeholder left in output");

    let last = std::fs::read_to_string(out.join("parameters007.prm")).unwrap();
    assert!(last.contains("v5_007__6000000__0_05__1400__5__200000"));
    assert!(last.contains("if(x<4000000, 0.05, 0); 0"));
}

#[test]
fn run_log_lists_every_run() {
    let dir = tempfile::tempdir().unwrap();
    let grid = ParameterGrid::parse_csv(GRID_CSV).unwrap();
    SweepWriter::new(ModelConstants::default(), settings(dir.path()))
        .unwrap()
        .write(&grid)
        .unwrap();

    let log = std::fs::read_to_string(dir.path().join("permutations.csv")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 9, "header plus 8 runs");
    assert!(lines[0].starts_with("Index,Lateral Extent,Convection Velocity,"));
    assert_eq!(
        lines[2],
        "2,4500000,-0.05,1300,5,200000,parameters002.prm,v5_002__4500000__L0_05__1300__5__200000"
    );
}

#[test]
fn manifest_records_grid_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let grid = ParameterGrid::parse_csv(GRID_CSV).unwrap();
    let summary = SweepWriter::new(ModelConstants::default(), settings(dir.path()))
        .unwrap()
        .write(&grid)
        .unwrap();

    let json = std::fs::read_to_string(&summary.manifest_path).unwrap();
    let manifest: SweepManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(manifest.combination_count, 4);
    assert_eq!(manifest.run_count, 8);
    assert!(manifest.mirror_convection);
    assert_eq!(manifest.template, "builtin");
    assert_eq!(manifest.grid["mantle_temperature_c"], vec![1300.0, 1400.0]);
}

#[test]
fn no_mirror_halves_the_runs() {
    let dir = tempfile::tempdir().unwrap();
    let grid = ParameterGrid::parse_csv(GRID_CSV).unwrap();
    let config = GenerateConfig {
        mirror_convection: false,
        ..settings(dir.path())
    };
    let summary = SweepWriter::new(ModelConstants::default(), config)
        .unwrap()
        .write(&grid)
        .unwrap();
    assert_eq!(summary.files_written, 4);
    assert!(summary.runs.iter().all(|p| !p.run.mirrored));
}

// ============================================================================
// Guards
// ============================================================================

#[test]
fn existing_files_are_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let grid = ParameterGrid::parse_csv(GRID_CSV).unwrap();
    let writer = SweepWriter::new(ModelConstants::default(), settings(dir.path())).unwrap();
    writer.write(&grid).unwrap();

    match writer.write(&grid) {
        Err(SweepError::FileExists(path)) => {
            assert!(path.ends_with("parameters001.prm"));
        }
        other => panic!("expected FileExists, got {other:?}"),
    }

    let overwrite = GenerateConfig {
        overwrite: true,
        ..settings(dir.path())
    };
    let again = SweepWriter::new(ModelConstants::default(), overwrite).unwrap();
    assert_eq!(again.write(&grid).unwrap().files_written, 8);
}

fn prm_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".prm"))
        .collect();
    names.sort();
    names
}

#[test]
fn overwrite_removes_files_from_a_larger_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let large = ParameterGrid::new([vec![4.5e6], vec![0.05], vec![1300.0, 1400.0], vec![5.0], vec![2e5]]);
    let small = ParameterGrid::new([vec![4.5e6], vec![0.05], vec![1300.0], vec![5.0], vec![2e5]]);

    SweepWriter::new(ModelConstants::default(), settings(dir.path()))
        .unwrap()
        .write(&large)
        .unwrap();
    assert_eq!(prm_files(&dir.path().join("automated")).len(), 4);

    // An unrelated file in the output directory is left alone
    std::fs::write(dir.path().join("automated/notes.prm"), "keep").unwrap();

    let overwrite = GenerateConfig {
        overwrite: true,
        ..settings(dir.path())
    };
    let summary = SweepWriter::new(ModelConstants::default(), overwrite)
        .unwrap()
        .write(&small)
        .unwrap();
    assert_eq!(summary.files_written, 2);
    assert_eq!(
        prm_files(&dir.path().join("automated")),
        vec!["notes.prm", "parameters001.prm", "parameters002.prm"]
    );

    let log = std::fs::read_to_string(dir.path().join("permutations.csv")).unwrap();
    assert_eq!(log.lines().count(), 3);
}

#[test]
fn leftover_files_outside_the_plan_block_a_fresh_write() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("automated");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("parameters099.prm"), "old").unwrap();

    let grid = ParameterGrid::parse_csv(GRID_CSV).unwrap();
    let writer = SweepWriter::new(ModelConstants::default(), settings(dir.path())).unwrap();
    match writer.write(&grid) {
        Err(SweepError::FileExists(path)) => assert!(path.ends_with("parameters099.prm")),
        other => panic!("expected FileExists, got {other:?}"),
    }
    assert_eq!(prm_files(&out), vec!["parameters099.prm"]);
}

#[test]
fn empty_axis_is_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let grid = ParameterGrid::new([vec![4.5e6], vec![0.05], vec![], vec![5.0], vec![2e5]]);
    let writer = SweepWriter::new(ModelConstants::default(), settings(dir.path())).unwrap();
    assert!(matches!(writer.write(&grid), Err(SweepError::EmptyAxis(_))));
    assert!(!dir.path().join("automated").exists());
}

#[test]
fn custom_template_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("custom.prm");
    std::fs::write(
        &template,
        "set Output directory = {{output_directory}}\nset Speed = {{convection_speed}}\n",
    )
    .unwrap();

    let config = GenerateConfig {
        template_path: Some(template),
        mirror_convection: false,
        ..settings(dir.path())
    };
    let grid = ParameterGrid::new([vec![4.5e6], vec![0.02], vec![1350.0], vec![5.0], vec![2e5]]);
    SweepWriter::new(ModelConstants::default(), config)
        .unwrap()
        .write(&grid)
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("automated/parameters001.prm")).unwrap();
    assert_eq!(
        text,
        "set Output directory = v5_001__4500000__0_02__1350__5__200000\nset Speed = 0.02\n"
    );
}

#[test]
fn template_with_unknown_placeholder_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("bad.prm");
    std::fs::write(&template, "set X = {{x_extnet}}\n").unwrap();
    let config = GenerateConfig {
        template_path: Some(template),
        ..settings(dir.path())
    };
    match SweepWriter::new(ModelConstants::default(), config) {
        Err(SweepError::UnknownPlaceholder(name)) => assert_eq!(name, "x_extnet"),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("template should have been rejected"),
    }
}
