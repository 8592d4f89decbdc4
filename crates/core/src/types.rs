//! Shared domain types: breakdown dimensions, raw insights rows as the
//! platform returns them, and the normalized working record.

use crate::error::{InsightsError, InsightsResult};
use crate::sanitize;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ─── Breakdown dimensions ───────────────────────────────────────────────────

/// The creative-asset axis a report is grouped by. Closed set: the platform
/// only supports these seven at ad level, and an unknown name is a
/// configuration mistake, not data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakdown {
    BodyAsset,
    CallToActionAsset,
    DescriptionAsset,
    ImageAsset,
    LinkUrlAsset,
    TitleAsset,
    VideoAsset,
}

impl Breakdown {
    /// Fixed processing order for a full pipeline run.
    pub const ALL: [Breakdown; 7] = [
        Breakdown::BodyAsset,
        Breakdown::CallToActionAsset,
        Breakdown::DescriptionAsset,
        Breakdown::ImageAsset,
        Breakdown::LinkUrlAsset,
        Breakdown::TitleAsset,
        Breakdown::VideoAsset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakdown::BodyAsset => "body_asset",
            Breakdown::CallToActionAsset => "call_to_action_asset",
            Breakdown::DescriptionAsset => "description_asset",
            Breakdown::ImageAsset => "image_asset",
            Breakdown::LinkUrlAsset => "link_url_asset",
            Breakdown::TitleAsset => "title_asset",
            Breakdown::VideoAsset => "video_asset",
        }
    }

    /// Asset-object field holding the human-readable label for this
    /// dimension.
    pub fn label_field(&self) -> &'static str {
        match self {
            Breakdown::BodyAsset => "text",
            Breakdown::CallToActionAsset => "type",
            Breakdown::DescriptionAsset => "text",
            Breakdown::ImageAsset => "image_name",
            Breakdown::LinkUrlAsset => "display_url",
            Breakdown::TitleAsset => "text",
            Breakdown::VideoAsset => "video_name",
        }
    }

    /// Asset-object field holding the asset identifier. Uniform today, but
    /// kept beside `label_field` so the mapping reads as one table.
    pub fn id_field(&self) -> &'static str {
        "id"
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Breakdown {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body_asset" => Ok(Breakdown::BodyAsset),
            "call_to_action_asset" => Ok(Breakdown::CallToActionAsset),
            "description_asset" => Ok(Breakdown::DescriptionAsset),
            "image_asset" => Ok(Breakdown::ImageAsset),
            "link_url_asset" => Ok(Breakdown::LinkUrlAsset),
            "title_asset" => Ok(Breakdown::TitleAsset),
            "video_asset" => Ok(Breakdown::VideoAsset),
            other => Err(InsightsError::UnknownBreakdown(other.to_string())),
        }
    }
}

// ─── Raw wire types ─────────────────────────────────────────────────────────

/// One `{action_type, value}` pair from the insights `actions` list. The
/// platform serializes counts as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdAction {
    pub action_type: String,
    pub value: String,
}

/// The nested breakdown-asset object. Which label field is populated
/// depends on the dimension; `id` is always present on real responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub cta_type: Option<String>,
    pub image_name: Option<String>,
    pub display_url: Option<String>,
    pub video_name: Option<String>,
}

impl AssetRef {
    /// Look up a field by its wire name, as named by
    /// [`Breakdown::label_field`] / [`Breakdown::id_field`].
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "id" => &self.id,
            "text" => &self.text,
            "type" => &self.cta_type,
            "image_name" => &self.image_name,
            "display_url" => &self.display_url,
            "video_name" => &self.video_name,
            _ => &None,
        };
        value.as_deref()
    }
}

/// One ad-level insights row as returned for a given breakdown dimension.
/// Numeric fields arrive string-encoded; exactly one of the asset objects
/// is expected to be populated, matching the requested breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReportRow {
    pub account_id: Option<String>,
    pub account_name: Option<String>,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub adset_id: Option<String>,
    pub adset_name: Option<String>,
    pub ad_id: Option<String>,
    pub ad_name: Option<String>,
    pub spend: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<AdAction>>,
    pub body_asset: Option<AssetRef>,
    pub call_to_action_asset: Option<AssetRef>,
    pub description_asset: Option<AssetRef>,
    pub image_asset: Option<AssetRef>,
    pub link_url_asset: Option<AssetRef>,
    pub title_asset: Option<AssetRef>,
    pub video_asset: Option<AssetRef>,
}

impl RawReportRow {
    /// The asset object for the requested dimension, if the platform sent
    /// one.
    pub fn asset(&self, breakdown: Breakdown) -> Option<&AssetRef> {
        match breakdown {
            Breakdown::BodyAsset => self.body_asset.as_ref(),
            Breakdown::CallToActionAsset => self.call_to_action_asset.as_ref(),
            Breakdown::DescriptionAsset => self.description_asset.as_ref(),
            Breakdown::ImageAsset => self.image_asset.as_ref(),
            Breakdown::LinkUrlAsset => self.link_url_asset.as_ref(),
            Breakdown::TitleAsset => self.title_asset.as_ref(),
            Breakdown::VideoAsset => self.video_asset.as_ref(),
        }
    }
}

// ─── Normalized record ──────────────────────────────────────────────────────

/// One row of the working table: typed identifiers plus the sparse
/// action-count map. An action type absent from `actions` was not observed
/// on this row; it is never zero-filled here, so the export layer can take
/// the union of observed types across the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    pub account_id: String,
    pub account_name: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub adset_id: String,
    pub adset_name: String,
    pub ad_id: String,
    pub ad_name: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub breakdown_label: String,
    pub breakdown_id: String,
    pub actions: BTreeMap<String, i64>,
}

impl NormalizedRecord {
    pub fn action(&self, action_type: &str) -> Option<i64> {
        self.actions.get(action_type).copied()
    }
}

// ─── Fetch window ───────────────────────────────────────────────────────────

/// The reporting period: either a platform-defined preset or an explicit
/// inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchWindow {
    DatePreset(String),
    Between { since: NaiveDate, until: NaiveDate },
}

impl Default for FetchWindow {
    fn default() -> Self {
        FetchWindow::DatePreset("last_7d".to_string())
    }
}

impl FetchWindow {
    /// Human-readable period used in the run folder name.
    pub fn period_label(&self) -> String {
        match self {
            FetchWindow::DatePreset(preset) => preset.clone(),
            FetchWindow::Between { since, until } => format!("{since} to {until}"),
        }
    }

    /// Filesystem-safe form of [`period_label`](Self::period_label).
    pub fn folder_segment(&self) -> String {
        sanitize::safe_folder_name(&self.period_label())
    }
}

// ─── Source boundary ────────────────────────────────────────────────────────

/// The reporting-API boundary. The pipeline depends only on this contract;
/// the production implementation lives in the platform crate and tests
/// substitute an in-memory source.
pub trait InsightsSource {
    fn fetch(&self, breakdown: Breakdown, window: &FetchWindow) -> InsightsResult<Vec<RawReportRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_roundtrip() {
        for b in Breakdown::ALL {
            assert_eq!(Breakdown::from_str(b.as_str()).unwrap(), b);
        }
    }

    #[test]
    fn test_unknown_breakdown_names_value() {
        let err = Breakdown::from_str("foo_asset").unwrap_err();
        assert!(err.to_string().contains("foo_asset"));
    }

    #[test]
    fn test_label_field_mapping() {
        assert_eq!(Breakdown::BodyAsset.label_field(), "text");
        assert_eq!(Breakdown::CallToActionAsset.label_field(), "type");
        assert_eq!(Breakdown::ImageAsset.label_field(), "image_name");
        assert_eq!(Breakdown::LinkUrlAsset.label_field(), "display_url");
        assert_eq!(Breakdown::VideoAsset.label_field(), "video_name");
        for b in Breakdown::ALL {
            assert_eq!(b.id_field(), "id");
        }
    }

    #[test]
    fn test_asset_field_lookup() {
        let asset = AssetRef {
            id: Some("123".into()),
            image_name: Some("hero.png".into()),
            ..AssetRef::default()
        };
        assert_eq!(asset.field("id"), Some("123"));
        assert_eq!(asset.field("image_name"), Some("hero.png"));
        assert_eq!(asset.field("text"), None);
        assert_eq!(asset.field("nonsense"), None);
    }

    #[test]
    fn test_raw_row_deserializes_from_api_shape() {
        let json = r#"{
            "account_id": "1",
            "campaign_id": "2",
            "ad_id": "3",
            "spend": "12.5",
            "impressions": "100",
            "clicks": "7",
            "actions": [{"action_type": "lead", "value": "3"}],
            "image_asset": {"id": "img-1", "image_name": "hero.png"}
        }"#;
        let row: RawReportRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.spend.as_deref(), Some("12.5"));
        assert_eq!(row.actions.as_ref().unwrap()[0].action_type, "lead");
        let asset = row.asset(Breakdown::ImageAsset).unwrap();
        assert_eq!(asset.field("image_name"), Some("hero.png"));
        assert!(row.asset(Breakdown::VideoAsset).is_none());
    }

    #[test]
    fn test_fetch_window_labels() {
        assert_eq!(FetchWindow::default().period_label(), "last_7d");
        let between = FetchWindow::Between {
            since: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            until: NaiveDate::from_ymd_opt(2022, 1, 31).unwrap(),
        };
        assert_eq!(between.period_label(), "2022-01-01 to 2022-01-31");
        assert_eq!(between.folder_segment(), "2022-01-01_to_2022-01-31");
    }
}
