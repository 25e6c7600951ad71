use std::path::Path;

use plotters::prelude::*;

use super::{ensure_parent, padded_range, PlotError};
use crate::thermal::ProfilePoint;

/// Temperature (x) against depth (y, increasing downwards) as a red line.
///
/// Depth is drawn as negative y so the surface sits at the top; the tick
/// labels show the positive depth.
pub fn initial_temperature(path: &Path, points: &[ProfilePoint]) -> Result<(), PlotError> {
    if points.is_empty() {
        return Err(PlotError::NoData("temperature profile has no points".to_string()));
    }
    ensure_parent(path)?;

    let (t_min, t_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.temperature_c), hi.max(p.temperature_c))
        });
    let max_depth = points.iter().map(|p| p.depth_km).fold(0.0, f64::max);
    let (x_lo, x_hi) = padded_range(t_min, t_max);

    let root = SVGBackend::new(path, (800, 1000)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Initial temperature with depth", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, -max_depth..0.0)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Temperature (ºC)")
        .y_desc("Depth (km)")
        .y_label_formatter(&|v: &f64| format!("{:.0}", v.abs()))
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().map(|p| (p.temperature_c, -p.depth_km)),
        &RED,
    ))?;

    root.present()?;
    Ok(())
}
