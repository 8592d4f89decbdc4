//! Ranked horizontal charts: one bar (or box group) per creative asset,
//! sorted by the metric, with mean and one-standard-deviation guides.

use crate::options::{truncate_label, ChartOptions, PlotKind};
use insights_core::error::{InsightsError, InsightsResult};
use insights_core::stats::{self, ReferenceLines};
use insights_reporting::derive::{DerivedRecord, Metric};
use plotters::prelude::*;
use std::cmp::Ordering;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info};

const BAR_COLOR: RGBColor = RGBColor(70, 130, 180);
const MEAN_COLOR: RGBColor = RGBColor(255, 105, 97);
const STD_DEV_COLOR: RGBColor = RGBColor(3, 198, 252);

/// Render one ranked chart for `metric` over the given rows.
///
/// Rows with an undefined metric are left out of the drawing but the
/// reference statistics always come from every defined value in the input,
/// not from any truncated view. Returns without writing a file when there
/// is nothing to draw.
pub fn render_ranked(
    rows: &[DerivedRecord],
    metric: Metric,
    kind: PlotKind,
    title: &str,
    path: &Path,
    options: &ChartOptions,
) -> InsightsResult<()> {
    let mut sorted: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|row| {
            metric
                .value(row)
                .map(|v| (row.record.breakdown_label.clone(), v))
        })
        .collect();
    if sorted.is_empty() {
        debug!(chart = %path.display(), "no defined values to plot, skipping");
        return Ok(());
    }
    // Stable: ties keep their original relative order.
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let values: Vec<f64> = sorted.iter().map(|(_, v)| *v).collect();
    let lines = stats::reference_lines(&values)
        .ok_or_else(|| InsightsError::Render("no values for reference lines".to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    draw_ranked(&sorted, kind, lines, metric.column(), title, path, options)
        .map_err(|e| InsightsError::Render(format!("{}: {e}", path.display())))?;

    info!(chart = %path.display(), kind = kind.as_str(), "saved chart");
    Ok(())
}

fn draw_ranked(
    sorted: &[(String, f64)],
    kind: PlotKind,
    lines: ReferenceLines,
    metric_name: &str,
    title: &str,
    path: &Path,
    options: &ChartOptions,
) -> Result<(), Box<dyn Error>> {
    // For box mode, rows sharing a label collapse into one distribution,
    // keeping the rank order of each label's first (highest) appearance.
    let entries: Vec<(String, Vec<f64>)> = match kind {
        PlotKind::Bar => sorted
            .iter()
            .map(|(label, v)| (label.clone(), vec![*v]))
            .collect(),
        PlotKind::Box => {
            let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
            for (label, value) in sorted {
                match groups.iter_mut().find(|(l, _)| l == label) {
                    Some((_, vs)) => vs.push(*value),
                    None => groups.push((label.clone(), vec![*value])),
                }
            }
            groups
        }
    };

    let n = entries.len() as i32;
    // Highest-ranked entry goes to the top segment.
    let segment_labels: Vec<String> = entries
        .iter()
        .rev()
        .map(|(label, _)| truncate_label(label, options.max_label_len))
        .collect();

    let max_value = sorted.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max);
    let x_max = {
        let m = max_value.max(lines.upper);
        if m <= 0.0 {
            1.0f32
        } else {
            (m * 1.05) as f32
        }
    };

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", options.title_font_size))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size((options.max_label_len as u32) * 8)
        .build_cartesian_2d(0f32..x_max, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(metric_name)
        .y_desc("breakdown")
        .axis_desc_style(("sans-serif", options.axis_font_size))
        .label_style(("sans-serif", options.axis_font_size))
        .y_labels(entries.len())
        .y_label_formatter(&|coord: &SegmentValue<i32>| match coord {
            SegmentValue::CenterOf(i) => segment_labels
                .get(*i as usize)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    match kind {
        PlotKind::Bar => {
            for (i, (_, values)) in entries.iter().enumerate() {
                let segment = n - 1 - i as i32;
                let value = values[0];
                chart.draw_series(std::iter::once(Rectangle::new(
                    [
                        (0f32, SegmentValue::Exact(segment)),
                        (value as f32, SegmentValue::Exact(segment + 1)),
                    ],
                    BAR_COLOR.mix(0.8).filled(),
                )))?;
                // Per-bar value at the bar's end.
                chart.draw_series(std::iter::once(Text::new(
                    format!("{value:.2}"),
                    (value as f32, SegmentValue::CenterOf(segment)),
                    ("sans-serif", options.axis_font_size),
                )))?;
            }
        }
        PlotKind::Box => {
            for (i, (_, values)) in entries.iter().enumerate() {
                let segment = n - 1 - i as i32;
                let quartiles = Quartiles::new(values);
                chart.draw_series(std::iter::once(
                    Boxplot::new_horizontal(SegmentValue::CenterOf(segment), &quartiles)
                        .width(15)
                        .style(BAR_COLOR),
                ))?;
                // Median annotated at the tip of each box.
                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.2}", quartiles.median()),
                    (quartiles.median() as f32, SegmentValue::CenterOf(segment)),
                    ("sans-serif", options.axis_font_size),
                )))?;
            }
        }
    }

    let guides = [
        ("Average", lines.mean, MEAN_COLOR),
        ("+1 Std Dev", lines.upper, STD_DEV_COLOR),
        ("-1 Std Dev", lines.lower, STD_DEV_COLOR),
    ];
    for (name, x, color) in guides {
        chart
            .draw_series(DashedLineSeries::new(
                [
                    (x as f32, SegmentValue::Exact(0)),
                    (x as f32, SegmentValue::Exact(n)),
                ],
                5,
                5,
                color.stroke_width(2),
            ))?
            .label(name)
            .legend(move |(lx, ly)| {
                PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.stroke_width(2))
            });
        chart.draw_series(std::iter::once(Text::new(
            format!("{name}: {x:.2}"),
            (x as f32, SegmentValue::CenterOf(0)),
            ("sans-serif", options.axis_font_size),
        )))?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .label_font(("sans-serif", options.legend_font_size))
        .draw()?;

    // The bitmap buffer is flushed here; the drawing context itself is
    // dropped at scope end whether or not the write succeeds.
    root.present()?;
    Ok(())
}
