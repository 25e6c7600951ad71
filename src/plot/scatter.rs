use std::path::Path;

use plotters::prelude::*;

use super::{band_color, ensure_parent, padded_range, PlotError};
use crate::analysis::VariableAnalysis;

/// Fraction of the x span each depth band is shifted by so overlapping
/// markers stay readable.
const BAND_OFFSET_FRACTION: f64 = 0.04;

/// Scatter of one variable against each depth band's temperature metric.
///
/// Band `i` is drawn shifted right by `i` offsets. Its per-value RMS sits
/// half an offset further right as a black dot with a `± std/2` bar, and its
/// fitted trend is drawn as a line in the band colour.
pub fn variable_scatter(
    path: &Path,
    analysis: &VariableAnalysis,
    y_range: [f64; 2],
) -> Result<(), PlotError> {
    let xs: Vec<f64> = analysis
        .bands
        .iter()
        .flat_map(|b| b.points.iter().map(|p| p.0))
        .collect();
    if xs.is_empty() {
        return Err(PlotError::NoData(format!(
            "{} ({} convection)",
            analysis.variable.name, analysis.direction
        )));
    }
    ensure_parent(path)?;

    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let offset = BAND_OFFSET_FRACTION * (x_max - x_min);
    let band_count = analysis.bands.len() as f64;
    let (x_lo, x_hi) = padded_range(x_min, x_max + offset * band_count);

    let root = SVGBackend::new(path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "{} vs temperature ({} convection)",
                analysis.variable.name, analysis.direction
            ),
            ("sans-serif", 20),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_range[0]..y_range[1])?;

    chart
        .configure_mesh()
        .x_desc(analysis.variable.axis_label())
        .y_desc("Temperature (K)")
        .draw()?;

    for (i, band) in analysis.bands.iter().enumerate() {
        let color = band_color(i);
        let shift = offset * i as f64;

        chart
            .draw_series(
                band.points
                    .iter()
                    .map(|&(x, y)| Cross::new((x + shift, y), 4, color.stroke_width(1))),
            )?
            .label(format!("{} km", band.label))
            .legend(move |(x, y)| Cross::new((x + 10, y), 4, color.stroke_width(1)));

        let rms_shift = offset * (i as f64 + 0.5);
        chart.draw_series(
            band.groups
                .iter()
                .filter(|g| g.std_dev.is_finite())
                .map(|g| {
                    let half = g.std_dev / 2.0;
                    ErrorBar::new_vertical(
                        g.x_value + rms_shift,
                        g.rms - half,
                        g.rms,
                        g.rms + half,
                        BLACK.stroke_width(1),
                        6,
                    )
                }),
        )?;
        chart.draw_series(
            band.groups
                .iter()
                .map(|g| Circle::new((g.x_value + rms_shift, g.rms), 3, BLACK.filled())),
        )?;

        if let Some(fit) = band.fit {
            let ends = [x_min, x_max].map(|x| (x + shift, fit.predict(x)));
            chart
                .draw_series(LineSeries::new(ends, color.stroke_width(2)))?
                .label(format!(
                    "{} km fit (gradient {:.3e}, R² {:.2})",
                    band.label, fit.slope, fit.r_squared
                ))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
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
