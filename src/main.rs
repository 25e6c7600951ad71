//! aspect-sweep - parameter sweeps for mantle convection runs
//!
//! Generates one solver input file per parameter combination, analyses the
//! results the runs produce, and plots the initial temperature profile.
//!
//! # Usage
//!
//! ```bash
//! # Write parameters001.prm ... into ./automated plus permutations.csv
//! aspect-sweep generate --grid input_grid.csv
//!
//! # Preview the run numbering without writing anything
//! aspect-sweep generate --grid input_grid.csv --dry-run
//!
//! # RMS statistics, fits and scatter charts from exported results
//! aspect-sweep analyze --results results.csv
//!
//! # Initial temperature against depth
//! aspect-sweep initial-temp --interior-temp 1400
//! ```
//!
//! # Environment Variables
//!
//! - `ASPECT_SWEEP_CONFIG`: Path to a config TOML (default: ./sweep_config.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use aspect_sweep::analysis::{self, ConvectionDirection, ResultsTable};
use aspect_sweep::config::{self, defaults, SweepConfig};
use aspect_sweep::plot;
use aspect_sweep::sweep::{ParameterGrid, SweepWriter};
use aspect_sweep::thermal::{self, InitialTemperature};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "aspect-sweep")]
#[command(about = "Parameter sweep generation and result analysis for mantle convection models")]
#[command(version)]
struct CliArgs {
    /// Config file to use instead of $ASPECT_SWEEP_CONFIG / ./sweep_config.toml.
    /// Unlike the search order, a bad file here is an error.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Write one solver input file per parameter combination
    Generate {
        /// Grid CSV: a header line, then one row of values per parameter
        #[arg(long)]
        grid: Option<PathBuf>,
        /// Directory for the parameter files
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Run log CSV path
        #[arg(long)]
        log: Option<PathBuf>,
        /// Do not add a negated-speed run after each combination
        #[arg(long)]
        no_mirror: bool,
        /// Replace existing parameter files
        #[arg(long)]
        overwrite: bool,
        /// Plan and log the runs without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// RMS statistics, linear fits and charts from a results CSV
    Analyze {
        /// Results CSV, one row per run
        #[arg(long)]
        results: PathBuf,
        /// Directory for rms_values.csv and charts
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Skip chart output
        #[arg(long)]
        no_plots: bool,
    },

    /// Redraw the RMS summary charts from an existing rms_values.csv
    RmsPlot {
        #[arg(long)]
        rms: PathBuf,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Plot the initial temperature against depth
    InitialTemp {
        /// Mantle interior start temperature (ºC)
        #[arg(long)]
        interior_temp: Option<f64>,
        /// Number of depth samples
        #[arg(long)]
        samples: Option<usize>,
        /// SVG output path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write the sampled profile as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Load and validate the active config, then summarise it
    CheckConfig,

    /// Write the built-in defaults as a config file to start from
    InitConfig {
        #[arg(long, default_value = config::LOCAL_CONFIG_FILE)]
        output: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// Explicit `--config` fails hard; otherwise use the lenient search order.
fn load_config(explicit: Option<&Path>) -> Result<SweepConfig> {
    match explicit {
        Some(path) => SweepConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SweepConfig::load()),
    }
}

/// The file `load_config` would read, if any.
fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(config::CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    let local = PathBuf::from(config::LOCAL_CONFIG_FILE);
    local.exists().then_some(local)
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_generate(
    config: SweepConfig,
    grid: Option<&Path>,
    output_dir: Option<PathBuf>,
    log: Option<PathBuf>,
    no_mirror: bool,
    overwrite: bool,
    dry_run: bool,
) -> Result<()> {
    let grid =
        ParameterGrid::resolve(grid, &config.grid).context("Failed to load parameter grid")?;

    let mut settings = config.generate;
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
    }
    if let Some(path) = log {
        settings.log_path = path;
    }
    settings.mirror_convection &= !no_mirror;
    settings.overwrite |= overwrite;

    let writer = SweepWriter::new(config.model, settings)
        .context("Failed to prepare solver input template")?
        .dry_run(dry_run);
    let summary = writer.write(&grid).context("Parameter sweep failed")?;

    if summary.dry_run {
        for planned in &summary.runs {
            info!(
                "  {} -> {}{}",
                planned.file_name,
                planned.directory_name,
                if planned.run.mirrored { " (mirrored)" } else { "" }
            );
        }
        info!("Dry run: {} runs planned, nothing written", summary.runs.len());
    } else {
        info!("✓ {} parameter files in {}", summary.files_written, summary.output_dir.display());
        info!("  Run log: {}", summary.log_path.display());
        info!("  Manifest: {}", summary.manifest_path.display());
    }
    Ok(())
}

fn run_analyze(
    config: &SweepConfig,
    results: &Path,
    output_dir: Option<PathBuf>,
    no_plots: bool,
) -> Result<()> {
    let settings = &config.analysis;
    let table = ResultsTable::load(results)
        .with_context(|| format!("Failed to read results {}", results.display()))?;
    info!(rows = table.row_count(), "Results loaded from {}", results.display());

    let report = analysis::analyze(&table, settings)?;
    for var in &report.variables {
        for band in &var.bands {
            match &band.fit {
                Some(fit) => info!(
                    "{} [{}] {}: gradient {:.4e}, R² {:.3}, p {:.3e}",
                    var.variable.name, var.direction, band.label, fit.slope, fit.r_squared, fit.p_value
                ),
                None => warn!(
                    "{} [{}] {}: fewer than two distinct values, no fit",
                    var.variable.name, var.direction, band.label
                ),
            }
        }
    }

    let output_dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let rms_path = output_dir.join(defaults::RMS_FILE);
    let records = report.rms_records();
    analysis::write_rms_csv(&rms_path, &records)?;
    info!("✓ {} RMS rows written to {}", records.len(), rms_path.display());

    if settings.plots && !no_plots {
        let charts = plot::render_report(&report, settings, &output_dir)?;
        info!("✓ {} charts written to {}", charts.len(), output_dir.display());
    }
    Ok(())
}

fn run_rms_plot(config: &SweepConfig, rms: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let records = analysis::read_rms_csv(rms)
        .with_context(|| format!("Failed to read {}", rms.display()))?;


    let output_dir = output_dir.unwrap_or_else(|| config.analysis.output_dir.clone());
    let mut written = 0;
    for direction in ConvectionDirection::ALL {
        let subset: Vec<_> = records
            .iter()
            .filter(|r| r.direction == direction && r.rms.is_finite())
            .cloned()
            .collect();
        if subset.is_empty() {
            continue;
        }
        // Only the variables and bands this direction has values for
        let (variables, bands) = plot::summary_categories(
            &subset,
            &config.analysis.variables,
            &config.analysis.depth_bands,
        );
        let path = output_dir.join(plot::rms_summary_file_name(direction));
        plot::rms_summary(&path, &subset, &variables, &bands, config.analysis.rms_y_range)?;
        info!("✓ {}", path.display());
        written += 1;
    }
    if written == 0 {
        warn!("No RMS values with a convection direction in {}", rms.display());
    }
    Ok(())
}

fn run_initial_temp(
    config: &SweepConfig,
    interior_temp: Option<f64>,
    samples: Option<usize>,
    output: Option<PathBuf>,
    csv: Option<&Path>,
) -> Result<()> {
    let profile = &config.profile;
    let interior = interior_temp.unwrap_or(profile.interior_temperature_c);
    let samples = samples.unwrap_or(profile.samples);
    let output = output.unwrap_or_else(|| profile.output.clone());

    let field = InitialTemperature::new(&config.model, interior)?;
    let c = field.coefficients();
    info!(a = c.a, b = c.b, c = c.c, d = c.d, "Boundary layer gradients for {interior} ºC");

    let points = field.depth_profile(samples, profile.horizontal_position_m)?;
    plot::initial_temperature(&output, &points)?;
    info!("✓ Profile ({} samples) written to {}", points.len(), output.display());

    if let Some(path) = csv {
        thermal::write_profile_csv(path, &points)?;
        info!("✓ Profile CSV written to {}", path.display());
    }
    Ok(())
}

fn run_check_config(explicit: Option<&Path>) -> Result<()> {
    let config = match config_source(explicit) {
        Some(path) => {
            let config = SweepConfig::load_from_file(&path)
                .with_context(|| format!("Config {} is invalid", path.display()))?;
            info!("✓ {} is valid", path.display());
            config
        }
        None => {
            info!("No config file found, built-in defaults in use");
            SweepConfig::default()
        }
    };

    let m = &config.model;
    info!(
        "Model: height {} km, boundary layers {:.0}%, refinement {}, end time {:e} yr",
        m.height_m / 1000.0,
        m.boundary_layer_fraction * 100.0,
        m.global_refinement,
        m.end_time_years
    );
    if let Some(csv) = &config.grid.input_csv {
        info!("Grid: from {}", csv.display());
    } else if config.grid.is_empty() {
        info!("Grid: none configured (pass --grid to generate)");
    } else {
        let grid = ParameterGrid::from_config(&config.grid);
        match grid.validate() {
            Ok(()) => info!(
                "Grid: {} combinations ({} runs with mirroring)",
                grid.combination_count(),
                grid.expand(config.generate.mirror_convection).len()
            ),
            Err(e) => warn!("Grid: {e}"),
        }
    }
    info!(
        "Analysis: {} variables x {} depth bands",
        config.analysis.variables.len(),
        config.analysis.depth_bands.len()
    );
    Ok(())
}

fn run_init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to replace it)", output.display());
    }
    SweepConfig::default().save_to_file(output)?;
    info!("✓ Default config written to {}", output.display());
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let explicit = args.config.as_deref();

    match args.command {
        SubCommand::Generate {
            grid,
            output_dir,
            log,
            no_mirror,
            overwrite,
            dry_run,
        } => {
            let config = load_config(explicit)?;
            run_generate(config, grid.as_deref(), output_dir, log, no_mirror, overwrite, dry_run)
        }
        SubCommand::Analyze {
            results,
            output_dir,
            no_plots,
        } => run_analyze(&load_config(explicit)?, &results, output_dir, no_plots),
        SubCommand::RmsPlot { rms, output_dir } => {
            run_rms_plot(&load_config(explicit)?, &rms, output_dir)
        }
        SubCommand::InitialTemp {
            interior_temp,
            samples,
            output,
            csv,
        } => run_initial_temp(&load_config(explicit)?, interior_temp, samples, output, csv.as_deref()),
        SubCommand::CheckConfig => run_check_config(explicit),
        SubCommand::InitConfig { output, force } => run_init_config(&output, force),
    }
}
