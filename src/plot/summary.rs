use std::path::Path;

use plotters::prelude::*;

use super::{band_color, ensure_parent, PlotError};
use crate::analysis::RmsRecord;
use crate::config::{DepthBand, VariableSpec};

/// Horizontal spacing between depth bands within one variable's column.
const BAND_SPACING: f64 = 0.1;

/// Variables and depth bands that actually appear in `records`.
///
/// Configured entries keep their order (and units) and come first; names
/// only the records know are appended in first-seen order.
pub fn summary_categories(
    records: &[RmsRecord],
    variables: &[VariableSpec],
    bands: &[DepthBand],
) -> (Vec<VariableSpec>, Vec<DepthBand>) {
    let mut present_vars: Vec<VariableSpec> = variables
        .iter()
        .filter(|v| records.iter().any(|r| r.variable == v.name))
        .cloned()
        .collect();
    let mut present_bands: Vec<DepthBand> = bands
        .iter()
        .filter(|b| records.iter().any(|r| r.depth_label == b.label))
        .cloned()
        .collect();
    for r in records {
        if !present_vars.iter().any(|v| v.name == r.variable) {
            present_vars.push(VariableSpec::new(&r.variable, ""));
        }
        if !present_bands.iter().any(|b| b.label == r.depth_label) {
            present_bands.push(DepthBand::new(&r.depth_label, &r.depth_label));
        }
    }
    (present_vars, present_bands)
}

/// One categorical column per variable holding every RMS value recorded for
/// it, each depth band nudged sideways, with `± std/2` bars.
///
/// Records for variables not listed in `variables` are ignored.
pub fn rms_summary(
    path: &Path,
    records: &[RmsRecord],
    variables: &[VariableSpec],
    bands: &[DepthBand],
    y_range: [f64; 2],
) -> Result<(), PlotError> {
    let category = |name: &str| variables.iter().position(|v| v.name == name);
    if variables.is_empty() || !records.iter().any(|r| category(r.variable.as_str()).is_some()) {
        return Err(PlotError::NoData("no RMS records for the listed variables".to_string()));
    }
    ensure_parent(path)?;

    let direction = records[0].direction;
    let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
    let x_max = variables.len() as f64 - 0.5;

    let root = SVGBackend::new(path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("RMS temperature by variable ({direction} convection)"),
            ("sans-serif", 20),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..x_max, y_range[0]..y_range[1])?;

    let label_for = |v: &f64| {
        let nearest = v.round();
        if (v - nearest).abs() > 1e-6 || nearest < 0.0 {
            return String::new();
        }
        names.get(nearest as usize).map_or_else(String::new, |n| (*n).to_string())
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(variables.len() + 1)
        .x_label_formatter(&label_for)
        .y_desc("Average Steady State Temperature RMS (K)")
        .draw()?;

    let centre = (bands.len() as f64 - 1.0) / 2.0;
    for (i, band) in bands.iter().enumerate() {
        let color = band_color(i);
        let shift = (i as f64 - centre) * BAND_SPACING;
        let points: Vec<(f64, &RmsRecord)> = records
            .iter()
            .filter(|r| r.depth_label == band.label)
            .filter_map(|r| category(r.variable.as_str()).map(|c| (c as f64 + shift, r)))
            .collect();
        if points.is_empty() {
            continue;
        }

        chart.draw_series(points.iter().filter(|(_, r)| r.std_dev.is_finite()).map(|(x, r)| {
            let half = r.std_dev / 2.0;
            ErrorBar::new_vertical(*x, r.rms - half, r.rms, r.rms + half, color.stroke_width(1), 6)
        }))?;
        chart
            .draw_series(points.iter().map(|(x, r)| Circle::new((*x, r.rms), 4, color.filled())))?
            .label(format!("{} km", band.label))
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
