use crate::types::FetchWindow;
use chrono::NaiveDate;
use serde::Deserialize;

/// Root run configuration. Loaded from environment variables with the
/// prefix `CREATIVE_INSIGHTS__`; every field has a default so a bare
/// invocation reports on the last seven days into `output/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_date_preset")]
    pub date_preset: String,
    /// Explicit range start; used only when `until` is also set, and then
    /// takes precedence over `date_preset`.
    #[serde(default)]
    pub since: Option<NaiveDate>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_root")]
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    /// Ranked-chart rendering, `barplot` or `boxplot`. Parsed (and
    /// rejected) at run start, before any fetch.
    #[serde(default = "default_chart_kind")]
    pub kind: String,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
    #[serde(default = "default_max_label_len")]
    pub max_label_len: usize,
    #[serde(default = "default_axis_font_size")]
    pub axis_font_size: u32,
    #[serde(default = "default_title_font_size")]
    pub title_font_size: u32,
    #[serde(default = "default_legend_font_size")]
    pub legend_font_size: u32,
}

// Default functions
fn default_date_preset() -> String {
    "last_7d".to_string()
}
fn default_statuses() -> Vec<String> {
    [
        "ACTIVE",
        "PAUSED",
        "DELETED",
        "ARCHIVED",
        "IN_PROCESS",
        "WITH_ISSUES",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_output_root() -> String {
    "output".to_string()
}
fn default_chart_kind() -> String {
    "barplot".to_string()
}
fn default_chart_width() -> u32 {
    1600
}
fn default_chart_height() -> u32 {
    1200
}
fn default_max_label_len() -> usize {
    60
}
fn default_axis_font_size() -> u32 {
    15
}
fn default_title_font_size() -> u32 {
    20
}
fn default_legend_font_size() -> u32 {
    15
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            date_preset: default_date_preset(),
            since: None,
            until: None,
            statuses: default_statuses(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            kind: default_chart_kind(),
            width: default_chart_width(),
            height: default_chart_height(),
            max_label_len: default_max_label_len(),
            axis_font_size: default_axis_font_size(),
            title_font_size: default_title_font_size(),
            legend_font_size: default_legend_font_size(),
        }
    }
}

impl FetchConfig {
    /// An explicit since/until pair wins over the preset.
    pub fn window(&self) -> FetchWindow {
        match (self.since, self.until) {
            (Some(since), Some(until)) => FetchWindow::Between { since, until },
            _ => FetchWindow::DatePreset(self.date_preset.clone()),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CREATIVE_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.date_preset, "last_7d");
        assert_eq!(config.fetch.statuses.len(), 6);
        assert_eq!(config.output.root, "output");
        assert_eq!(config.chart.kind, "barplot");
        assert_eq!(config.chart.max_label_len, 60);
    }

    #[test]
    fn test_window_prefers_explicit_range() {
        let mut fetch = FetchConfig::default();
        assert_eq!(fetch.window(), FetchWindow::DatePreset("last_7d".into()));

        fetch.since = NaiveDate::from_ymd_opt(2022, 1, 1);
        // `until` still unset: preset stays in effect
        assert_eq!(fetch.window(), FetchWindow::DatePreset("last_7d".into()));

        fetch.until = NaiveDate::from_ymd_opt(2022, 1, 31);
        match fetch.window() {
            FetchWindow::Between { since, until } => {
                assert_eq!(since.to_string(), "2022-01-01");
                assert_eq!(until.to_string(), "2022-01-31");
            }
            other => panic!("expected explicit range, got {other:?}"),
        }
    }
}
