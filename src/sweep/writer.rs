//! Sweep output: solver input files, the run log and the manifest.

use std::collections::{BTreeMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::naming::{format_value, is_parameter_file_name, parameter_file_name, run_directory_name};
use super::parameters::Parameter;
use super::template::{PrmTemplate, TemplateContext};
use super::{ParameterGrid, SweepError, SweepRun};
use crate::config::{defaults, GenerateConfig, ModelConstants};
use crate::csv::csv_join;

/// A run together with the names it will be written under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRun {
    pub run: SweepRun,
    /// Parameter file name inside the output directory
    pub file_name: String,
    /// Solver output directory written into the parameter file
    pub directory_name: String,
}

/// What a `write` call produced (or would have produced, for a dry run).
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub runs: Vec<PlannedRun>,
    pub output_dir: PathBuf,
    pub log_path: PathBuf,
    pub manifest_path: PathBuf,
    pub files_written: usize,
    pub dry_run: bool,
}

/// Machine-readable record of how a sweep was generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepManifest {
    pub generated_at: DateTime<Utc>,
    pub combination_count: usize,
    pub run_count: usize,
    pub mirror_convection: bool,
    pub output_dir: PathBuf,
    pub template: String,
    pub model: ModelConstants,
    /// Grid axes keyed by their `[grid]` config key
    pub grid: BTreeMap<String, Vec<f64>>,
}

/// Writes the parameter files for a grid.
pub struct SweepWriter {
    model: ModelConstants,
    settings: GenerateConfig,
    template: PrmTemplate,
    dry_run: bool,
}

impl SweepWriter {
    /// Build a writer, loading the custom template if one is configured.
    pub fn new(model: ModelConstants, settings: GenerateConfig) -> Result<Self, SweepError> {
        let template = match &settings.template_path {
            Some(path) => {
                info!(path = %path.display(), "Using custom solver input template");
                PrmTemplate::from_file(path)?
            }
            None => PrmTemplate::builtin()?,
        };
        Ok(Self {
            model,
            settings,
            template,
            dry_run: false,
        })
    }

    /// Plan and log the runs without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn settings(&self) -> &GenerateConfig {
        &self.settings
    }

    /// Number and name every run of the grid.
    pub fn plan(&self, grid: &ParameterGrid) -> Vec<PlannedRun> {
        grid.expand(self.settings.mirror_convection)
            .into_iter()
            .map(|run| PlannedRun {
                file_name: parameter_file_name(&self.settings.file_prefix, run.index),
                directory_name: run_directory_name(
                    &self.settings.run_prefix,
                    run.index,
                    &run.parameters,
                ),
                run,
            })
            .collect()
    }

    /// Render a single planned run.
    pub fn render(&self, planned: &PlannedRun) -> Result<String, SweepError> {
        let context = TemplateContext::for_run(&self.model, &planned.run, &planned.directory_name);
        self.template.render(&context)
    }

    fn manifest_path(&self) -> PathBuf {
        self.settings.log_path.with_file_name(defaults::MANIFEST_FILE)
    }

    /// Validate the grid, then write every parameter file, the run log and
    /// the manifest.
    pub fn write(&self, grid: &ParameterGrid) -> Result<SweepSummary, SweepError> {
        grid.validate()?;
        let runs = self.plan(grid);
        let output_dir = self.settings.output_dir.clone();
        let log_path = self.settings.log_path.clone();
        let manifest_path = self.manifest_path();

        info!(
            combinations = grid.combination_count(),
            runs = runs.len(),
            mirror = self.settings.mirror_convection,
            output_dir = %output_dir.display(),
            "Planned parameter sweep"
        );

        if self.dry_run {
            for planned in &runs {
                debug!(file = %planned.file_name, directory = %planned.directory_name, "Dry run");
            }
            return Ok(SweepSummary {
                runs,
                output_dir,
                log_path,
                manifest_path,
                files_written: 0,
                dry_run: true,
            });
        }

        std::fs::create_dir_all(&output_dir).map_err(|e| SweepError::io(&output_dir, e))?;

        // Any parameter file already in the directory would either be
        // replaced or, if outside the plan, left uncovered by the new log.
        let existing = existing_parameter_files(&output_dir, &self.settings.file_prefix)?;
        if !self.settings.overwrite {
            if let Some(first) = existing.into_iter().next() {
                return Err(SweepError::FileExists(first));
            }
        } else {
            let planned: HashSet<&str> = runs.iter().map(|p| p.file_name.as_str()).collect();
            for stale in existing.iter().filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !planned.contains(n))
            }) {
                std::fs::remove_file(stale).map_err(|e| SweepError::io(stale, e))?;
                warn!(path = %stale.display(), "Removed parameter file from an earlier sweep");
            }
        }

        runs.par_iter().try_for_each(|planned| {
            let path = output_dir.join(&planned.file_name);
            let text = self.render(planned)?;
            std::fs::write(&path, text).map_err(|e| SweepError::io(&path, e))?;
            debug!(path = %path.display(), index = planned.run.index, "Wrote parameter file");
            Ok::<(), SweepError>(())
        })?;

        write_run_log(&log_path, &runs)?;
        self.write_manifest(&manifest_path, grid, runs.len())?;

        info!(
            files = runs.len(),
            log = %log_path.display(),
            "Parameter sweep written"
        );

        Ok(SweepSummary {
            files_written: runs.len(),
            runs,
            output_dir,
            log_path,
            manifest_path,
            dry_run: false,
        })
    }

    fn write_manifest(
        &self,
        path: &Path,
        grid: &ParameterGrid,
        run_count: usize,
    ) -> Result<(), SweepError> {
        let manifest = SweepManifest {
            generated_at: Utc::now(),
            combination_count: grid.combination_count(),
            run_count,
            mirror_convection: self.settings.mirror_convection,
            output_dir: self.settings.output_dir.clone(),
            template: self
                .settings
                .template_path
                .as_ref()
                .map_or_else(|| "builtin".to_string(), |p| p.display().to_string()),
            model: self.model.clone(),
            grid: Parameter::ALL
                .iter()
                .map(|&p| (p.config_key().to_string(), grid.axis(p).to_vec()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        ensure_parent(path)?;
        std::fs::write(path, json).map_err(|e| SweepError::io(path, e))
    }
}

fn ensure_parent(path: &Path) -> Result<(), SweepError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Parameter files with `prefix` already in `dir`, sorted by name.
fn existing_parameter_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, SweepError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SweepError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SweepError::io(dir, e))?;
        let name = entry.file_name();
        if name
            .to_str()
            .is_some_and(|n| is_parameter_file_name(prefix, n))
            && entry.path().is_file()
        {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Header of the run log: index, one column per parameter, then the names.
pub fn run_log_header() -> Vec<String> {
    let mut header = vec!["Index".to_string()];
    header.extend(Parameter::ALL.iter().map(|p| p.label().to_string()));
    header.push("File".to_string());
    header.push("Output Directory".to_string());
    header
}

/// Write the index-to-parameters log, one row per run in index order.
pub fn write_run_log(path: &Path, runs: &[PlannedRun]) -> Result<(), SweepError> {
    ensure_parent(path)?;
    let io_err = |e| SweepError::io(path, e);
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", csv_join(&run_log_header())).map_err(io_err)?;
    for planned in runs {
        let mut row = vec![planned.run.index.to_string()];
        row.extend(planned.run.parameters.values().iter().map(|&v| format_value(v)));
        row.push(planned.file_name.clone());
        row.push(planned.directory_name.clone());
        writeln!(writer, "{}", csv_join(&row)).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ParameterGrid {
        ParameterGrid::new([
            vec![4.5e6],
            vec![0.05],
            vec![1300.0, 1400.0],
            vec![5.0],
            vec![200_000.0],
        ])
    }

    #[test]
    fn test_plan_names_follow_index() {
        let writer = SweepWriter::new(ModelConstants::default(), GenerateConfig::default()).unwrap();
        let plan = writer.plan(&grid());
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0].file_name, "parameters001.prm");
        assert_eq!(plan[1].file_name, "parameters002.prm");
        assert_eq!(plan[1].directory_name, "v5_002__4500000__L0_05__1300__5__200000");
        assert_eq!(plan[2].directory_name, "v5_003__4500000__0_05__1400__5__200000");
    }

    #[test]
    fn test_run_log_header() {
        let header = run_log_header();
        assert_eq!(header.len(), 8);
        assert_eq!(header[0], "Index");
        assert_eq!(header[2], "Convection Velocity");
        assert_eq!(header[7], "Output Directory");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GenerateConfig {
            output_dir: dir.path().join("automated"),
            log_path: dir.path().join("permutations.csv"),
            ..GenerateConfig::default()
        };
        let writer = SweepWriter::new(ModelConstants::default(), settings)
            .unwrap()
            .dry_run(true);
        let summary = writer.write(&grid()).unwrap();
        assert!(summary.dry_run);
        assert_eq!(summary.runs.len(), 4);
        assert_eq!(summary.files_written, 0);
        assert!(!dir.path().join("automated").exists());
        assert!(!dir.path().join("permutations.csv").exists());
    }

    #[test]
    fn test_manifest_beside_log() {
        let settings = GenerateConfig {
            log_path: PathBuf::from("out/permutations.csv"),
            ..GenerateConfig::default()
        };
        let writer = SweepWriter::new(ModelConstants::default(), settings).unwrap();
        assert_eq!(writer.manifest_path(), PathBuf::from("out/sweep_manifest.json"));
    }
}
