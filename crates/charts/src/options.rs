//! Chart configuration: the closed plot-kind set and sizing options.

use insights_core::config::ChartConfig;
use insights_core::error::InsightsError;
use std::str::FromStr;

/// The two ranked-chart renderings. A closed set checked at construction:
/// an unrecognized kind is a programming or configuration mistake and
/// aborts the run before any drawing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Bar,
    Box,
}

impl PlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotKind::Bar => "barplot",
            PlotKind::Box => "boxplot",
        }
    }
}

impl FromStr for PlotKind {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "barplot" => Ok(PlotKind::Bar),
            "boxplot" => Ok(PlotKind::Box),
            other => Err(InsightsError::Config(format!("invalid plot type: {other}"))),
        }
    }
}

/// Rendering options shared by every chart in a run.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Output bitmap size in pixels.
    pub width: u32,
    pub height: u32,
    /// Maximum label length on the category axis, ellipsis included.
    pub max_label_len: usize,
    pub axis_font_size: u32,
    pub title_font_size: u32,
    pub legend_font_size: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1200,
            max_label_len: 60,
            axis_font_size: 15,
            title_font_size: 20,
            legend_font_size: 15,
        }
    }
}

impl From<&ChartConfig> for ChartOptions {
    fn from(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            max_label_len: config.max_label_len,
            axis_font_size: config.axis_font_size,
            title_font_size: config.title_font_size,
            legend_font_size: config.legend_font_size,
        }
    }
}

/// Truncate a label to `max` characters, marking the cut with an ellipsis.
/// Total length never exceeds `max`; shorter labels pass through unchanged.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() > max {
        let kept: String = label.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_kind_parses_known_values() {
        assert_eq!(PlotKind::from_str("barplot").unwrap(), PlotKind::Bar);
        assert_eq!(PlotKind::from_str("boxplot").unwrap(), PlotKind::Box);
    }

    #[test]
    fn test_plot_kind_rejects_unknown_value() {
        let err = PlotKind::from_str("scatterplot").unwrap_err();
        assert!(err.to_string().contains("scatterplot"));
    }

    #[test]
    fn test_truncation_length_property() {
        let max = 10;
        for len in [0usize, 5, 9, 10, 11, 40] {
            let label: String = "x".repeat(len);
            let out = truncate_label(&label, max);
            assert_eq!(out.chars().count(), len.min(max), "len {len}");
            assert_eq!(out.ends_with("..."), len > max, "len {len}");
        }
    }

    #[test]
    fn test_truncation_is_unicode_safe() {
        let label = "é".repeat(20);
        let out = truncate_label(&label, 8);
        assert_eq!(out.chars().count(), 8);
        assert!(out.ends_with("..."));
        assert!(out.starts_with("ééééé"));
    }
}
