//! This module is responsible for generating all charts from a tank's water-test history.

use anyhow::Result;
use chrono::NaiveDate;
use reefwatch_core::analytics::alerts::reference_range;
use reefwatch_schemas::parameters::{Parameter, WaterParameters};
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// One parameter's readings as (days since the first test, value) points.
struct Series {
    parameter: Parameter,
    points: Vec<(i64, f64)>,
}

fn collect_series(tests: &[WaterParameters], first_date: NaiveDate) -> Vec<Series> {
    Parameter::ALL
        .into_iter()
        .map(|parameter| Series {
            parameter,
            points: tests
                .iter()
                .filter_map(|t| t.value(parameter).map(|v| ((t.test_date - first_date).num_days(), v)))
                .collect(),
        })
        .filter(|s| !s.points.is_empty())
        .collect()
}

/// The main function to generate and save all charts for a tank.
pub fn generate_all_plots(output_dir: &Path, tank_id: &str, tests: &[WaterParameters]) -> Result<()> {
    info!("[Plotting] Generating charts for tank '{}'...", tank_id);

    let mut sorted = tests.to_vec();
    sorted.sort_by_key(|t| t.test_date);
    let Some(first_date) = sorted.first().map(|t| t.test_date) else {
        warn!("[Plotting] No water tests to plot.");
        return Ok(());
    };

    let series = collect_series(&sorted, first_date);
    for (i, s) in series.iter().enumerate() {
        plot_parameter_history(output_dir, i + 1, s, first_date)?;
    }
    plot_testing_timeline(output_dir, &sorted, first_date)?;

    info!("[Plotting] {} charts have been saved to '{}'.", series.len() + 1, output_dir.display());
    Ok(())
}

/// Line chart of one parameter with its ideal band drawn as dashed lines.
fn plot_parameter_history(output_dir: &Path, index: usize, series: &Series, first_date: NaiveDate) -> Result<()> {
    let path = output_dir.join(format!("{}_{}.png", index, series.parameter.key()));
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let range = reference_range(series.parameter);
    let max_day = series.points.iter().map(|(d, _)| *d).max().unwrap_or(0).max(1);
    let (mut y_min, mut y_max) = series
        .points
        .iter()
        .fold((range.ideal.min, range.ideal.max), |(lo, hi), (_, v)| (lo.min(*v), hi.max(*v)));
    let pad = ((y_max - y_min) * 0.1).max(0.001);
    y_min = (y_min - pad).max(0.0);
    y_max += pad;

    let unit = series.parameter.unit();
    let caption = if unit.is_empty() {
        series.parameter.label().to_string()
    } else {
        format!("{} ({})", series.parameter.label(), unit)
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(&caption, ("sans-serif", 50).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0i64..max_day, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(format!("Days since {}", first_date))
        .y_desc(series.parameter.label())
        .draw()?;

    chart
        .draw_series(LineSeries::new(series.points.iter().copied(), BLUE.stroke_width(2)))?
        .label("Measured")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));
    chart.draw_series(series.points.iter().map(|(d, v)| Circle::new((*d, *v), 4, BLUE.filled())))?;

    for (bound, label) in [(range.ideal.min, "Ideal min"), (range.ideal.max, "Ideal max")] {
        chart
            .draw_series(DashedLineSeries::new(
                vec![(0, bound), (max_day, bound)],
                5,
                5,
                (&GREEN).into(),
            ))?
            .label(label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Histogram of test days, to make gaps in the testing routine visible.
fn plot_testing_timeline(output_dir: &Path, tests: &[WaterParameters], first_date: NaiveDate) -> Result<()> {
    let path = output_dir.join("testing_timeline.png");
    let root = BitMapBackend::new(&path, (1024, 256)).into_drawing_area();
    root.fill(&WHITE)?;

    let days: Vec<i64> = tests.iter().map(|t| (t.test_date - first_date).num_days()).collect();
    let max_day = days.iter().copied().max().unwrap_or(0) + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Water Test Timeline", ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(0i64..max_day, 0..3i32)?;

    chart
        .configure_mesh()
        .x_desc(format!("Days since {}", first_date))
        .disable_y_axis()
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .data(days.iter().map(|day| (*day, 1))),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_skip_parameters_without_readings() {
        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let tests = vec![
            WaterParameters::new("a", "T", first).with(Parameter::Nitrate, 10.0),
            WaterParameters::new("b", "T", NaiveDate::from_ymd_opt(2024, 3, 8).unwrap())
                .with(Parameter::Nitrate, 12.0)
                .with(Parameter::Ph, 8.1),
        ];

        let series = collect_series(&tests, first);
        assert_eq!(series.len(), 2);
        let nitrate = series.iter().find(|s| s.parameter == Parameter::Nitrate).unwrap();
        assert_eq!(nitrate.points, vec![(0, 10.0), (7, 12.0)]);
    }
}
