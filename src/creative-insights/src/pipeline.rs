//! The batch run: for every breakdown dimension, fetch, normalize, derive,
//! chart, and export, one dimension fully before the next.
//!
//! Failure handling is deliberately asymmetric. Anything that questions the
//! integrity of the data (missing breakdown asset, missing numeric field)
//! or of the configuration aborts the whole run; a chart that fails to save
//! is logged and the run moves on to the next chart.

use chrono::{DateTime, Local};
use insights_charts::{render_correlation, render_ranked, ChartOptions, PlotKind};
use insights_core::config::AppConfig;
use insights_core::error::InsightsResult;
use insights_core::sanitize::safe_folder_name;
use insights_core::types::{Breakdown, FetchWindow, InsightsSource};
use insights_reporting::derive::{add_campaign_comparison, derive_metrics, DerivedRecord, Metric};
use insights_reporting::export::export_csv;
use insights_reporting::normalize::normalize_rows;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// The three metrics charted for every dimension, in rendering order.
const RANKED_METRICS: [Metric; 3] = [Metric::Ctr, Metric::Cpl, Metric::Lcvr];

/// Output tree for one run: a timestamped, period-stamped root with
/// `totals/`, `campaigns/<name>/` and `csv/` below it.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new(output_root: &Path, started_at: DateTime<Local>, window: &FetchWindow) -> Self {
        let stamp = started_at.format("%Y-%m-%dT%H-%M-%S");
        Self {
            root: output_root.join(format!("{stamp}__{}", window.folder_segment())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn totals(&self) -> PathBuf {
        self.root.join("totals")
    }

    pub fn campaign(&self, name: &str) -> PathBuf {
        self.root.join("campaigns").join(safe_folder_name(name))
    }

    pub fn csv(&self) -> PathBuf {
        self.root.join("csv")
    }
}

pub struct Pipeline<S> {
    source: S,
    config: AppConfig,
}

impl<S: InsightsSource> Pipeline<S> {
    pub fn new(source: S, config: AppConfig) -> Self {
        Self { source, config }
    }

    /// Process all seven breakdown dimensions and return the run's output
    /// layout. Stops at the first fatal error.
    pub fn run(&self, started_at: DateTime<Local>) -> InsightsResult<RunLayout> {
        let window = self.config.fetch.window();
        let layout = RunLayout::new(Path::new(&self.config.output.root), started_at, &window);
        let options = ChartOptions::from(&self.config.chart);
        // Reject a bad plot kind up front, before the first fetch.
        let kind = PlotKind::from_str(&self.config.chart.kind)?;

        info!(period = %window.period_label(), output = %layout.root().display(), "starting run");
        for breakdown in Breakdown::ALL {
            self.process_dimension(breakdown, &window, &layout, kind, &options)?;
        }
        Ok(layout)
    }

    fn process_dimension(
        &self,
        breakdown: Breakdown,
        window: &FetchWindow,
        layout: &RunLayout,
        kind: PlotKind,
        options: &ChartOptions,
    ) -> InsightsResult<()> {
        let raw = self.source.fetch(breakdown, window)?;
        if raw.is_empty() {
            info!(breakdown = %breakdown, "no rows returned, skipping dimension");
            return Ok(());
        }
        info!(breakdown = %breakdown, rows = raw.len(), "processing dimension");

        let records = normalize_rows(raw, breakdown)?;
        let mut table = derive_metrics(records);
        add_campaign_comparison(&mut table);

        self.render_ranked_set(&table, breakdown, &layout.totals(), None, kind, options);

        let correlation_path = layout
            .totals()
            .join(format!("correlation_{breakdown}.png"));
        if let Err(err) = render_correlation(
            &table,
            &format!("Correlations for {breakdown}"),
            &correlation_path,
            options,
        ) {
            warn!(error = %err, "chart save failed, continuing");
        }

        for campaign in distinct_campaigns(&table) {
            let subset: Vec<DerivedRecord> = table
                .iter()
                .filter(|r| r.record.campaign_name == campaign)
                .cloned()
                .collect();
            self.render_ranked_set(
                &subset,
                breakdown,
                &layout.campaign(&campaign),
                Some(&campaign),
                kind,
                options,
            );
        }

        export_csv(&table, &layout.csv().join(format!("{breakdown}.csv")))?;
        Ok(())
    }

    fn render_ranked_set(
        &self,
        table: &[DerivedRecord],
        breakdown: Breakdown,
        dir: &Path,
        campaign: Option<&str>,
        kind: PlotKind,
        options: &ChartOptions,
    ) {
        for metric in RANKED_METRICS {
            let path = dir.join(format!("{}_by_{breakdown}.png", metric.column()));
            let title = match campaign {
                Some(name) => format!("{} by {breakdown} ({name})", metric.title()),
                None => format!("{} by {breakdown}", metric.title()),
            };
            if let Err(err) = render_ranked(table, metric, kind, &title, &path, options) {
                warn!(error = %err, "chart save failed, continuing");
            }
        }
    }
}

/// Distinct campaign names in first-seen order.
fn distinct_campaigns(table: &[DerivedRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in table {
        if !names.contains(&row.record.campaign_name) {
            names.push(row.record.campaign_name.clone());
        }
    }
    names
}
