//! Dual-panel correlation scatter: how conversion quality relates to
//! click-through, and what that does to acquisition cost.

use crate::options::ChartOptions;
use insights_core::error::{InsightsError, InsightsResult};
use insights_reporting::derive::{DerivedRecord, Metric};
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info};

const POINT_COLOR: RGBColor = RGBColor(70, 130, 180);

/// Render the two correlation panels side by side: lead-conversion rate
/// against CTR on the left, cost-per-lead against lead-conversion rate on
/// the right. Rows missing either coordinate are skipped; with no plottable
/// points at all, no file is written.
pub fn render_correlation(
    rows: &[DerivedRecord],
    title: &str,
    path: &Path,
    options: &ChartOptions,
) -> InsightsResult<()> {
    let conversion_vs_ctr = paired_points(rows, Metric::Ctr, Metric::Lcvr);
    let cost_vs_conversion = paired_points(rows, Metric::Lcvr, Metric::Cpl);

    if conversion_vs_ctr.is_empty() && cost_vs_conversion.is_empty() {
        debug!(chart = %path.display(), "no defined point pairs, skipping");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    draw_panels(
        &conversion_vs_ctr,
        &cost_vs_conversion,
        title,
        path,
        options,
    )
    .map_err(|e| InsightsError::Render(format!("{}: {e}", path.display())))?;

    info!(chart = %path.display(), "saved correlation chart");
    Ok(())
}

fn paired_points(rows: &[DerivedRecord], x: Metric, y: Metric) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|row| match (x.value(row), y.value(row)) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .collect()
}

fn draw_panels(
    left: &[(f64, f64)],
    right: &[(f64, f64)],
    title: &str,
    path: &Path,
    options: &ChartOptions,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", options.title_font_size))?;
    let panels = root.split_evenly((1, 2));

    draw_panel(
        &panels[0],
        left,
        Metric::Ctr.column(),
        Metric::Lcvr.column(),
        options,
    )?;
    draw_panel(
        &panels[1],
        right,
        Metric::Lcvr.column(),
        Metric::Cpl.column(),
        options,
    )?;

    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    points: &[(f64, f64)],
    x_desc: &str,
    y_desc: &str,
    options: &ChartOptions,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = padded_bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_bounds(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", options.axis_font_size))
        .label_style(("sans-serif", options.axis_font_size))
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, POINT_COLOR.mix(0.6).filled())),
    )?;

    Ok(())
}

/// Data bounds with a 5% margin; degenerate (empty or single-valued) inputs
/// fall back to a unit span so the axis stays drawable.
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::types::NormalizedRecord;
    use insights_reporting::derive::derive_metrics;

    fn make_row(impressions: u64, clicks: u64, leads: i64) -> NormalizedRecord {
        NormalizedRecord {
            breakdown_label: "asset".into(),
            spend: 10.0,
            impressions,
            clicks,
            actions: [("lead".to_string(), leads)].into_iter().collect(),
            ..NormalizedRecord::default()
        }
    }

    #[test]
    fn test_paired_points_skip_undefined_rows() {
        let mut records = vec![make_row(1000, 50, 5), make_row(1000, 40, 2)];
        records.push(NormalizedRecord {
            breakdown_label: "no-clicks".into(),
            spend: 1.0,
            impressions: 100,
            clicks: 0,
            ..NormalizedRecord::default()
        });
        let rows = derive_metrics(records);
        assert_eq!(paired_points(&rows, Metric::Ctr, Metric::Lcvr).len(), 2);
        assert_eq!(paired_points(&rows, Metric::Lcvr, Metric::Cpl).len(), 2);
    }

    #[test]
    fn test_correlation_chart_written() {
        let rows = derive_metrics(vec![make_row(1000, 50, 5), make_row(800, 40, 2)]);
        let path = std::env::temp_dir()
            .join(format!("insights-charts-{}", std::process::id()))
            .join("correlation.png");
        render_correlation(&rows, "correlations", &path, &ChartOptions::default()).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_no_file_without_point_pairs() {
        // no lead actions anywhere: both panels end up empty
        let rows = derive_metrics(vec![NormalizedRecord {
            spend: 5.0,
            impressions: 100,
            clicks: 10,
            ..NormalizedRecord::default()
        }]);
        let path = std::env::temp_dir()
            .join(format!("insights-charts-{}", std::process::id()))
            .join("correlation-empty.png");
        render_correlation(&rows, "correlations", &path, &ChartOptions::default()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_padded_bounds() {
        let (lo, hi) = padded_bounds([1.0, 3.0].into_iter());
        assert!(lo < 1.0 && hi > 3.0);
        let (lo, hi) = padded_bounds([2.0].into_iter());
        assert_eq!((lo, hi), (1.5, 2.5));
        let (lo, hi) = padded_bounds(std::iter::empty());
        assert_eq!((lo, hi), (0.0, 1.0));
    }
}
