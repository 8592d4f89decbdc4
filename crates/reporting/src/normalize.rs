//! Turns raw insights rows into the flat working record for one breakdown
//! dimension.
//!
//! Normalization is where the run's data-integrity guarantees are enforced:
//! a row without its breakdown asset, or without the always-present numeric
//! fields, aborts the whole run instead of being skipped. Silently dropping
//! or mislabeling creative rows would corrupt every downstream comparison.

use insights_core::error::{InsightsError, InsightsResult};
use insights_core::sanitize::clean_label;
use insights_core::types::{Breakdown, NormalizedRecord, RawReportRow};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Normalize a batch of raw rows fetched for `breakdown`.
pub fn normalize_rows(
    rows: Vec<RawReportRow>,
    breakdown: Breakdown,
) -> InsightsResult<Vec<NormalizedRecord>> {
    rows.into_iter()
        .map(|row| normalize_row(row, breakdown))
        .collect()
}

fn normalize_row(row: RawReportRow, breakdown: Breakdown) -> InsightsResult<NormalizedRecord> {
    let ad_id = row.ad_id.clone().unwrap_or_else(|| "<unknown>".to_string());

    let asset = row
        .asset(breakdown)
        .ok_or_else(|| InsightsError::MissingBreakdownAsset {
            breakdown: breakdown.to_string(),
            ad_id: ad_id.clone(),
        })?;

    // A present asset with an unset label field is tolerated (empty label);
    // the call-to-action dimension in particular is sparse about it.
    let breakdown_label = clean_label(asset.field(breakdown.label_field()).unwrap_or(""));
    let breakdown_id = asset.field(breakdown.id_field()).unwrap_or("").to_string();

    let spend: f64 = required(row.spend.as_deref(), "spend", &ad_id)?;
    let impressions: u64 = required(row.impressions.as_deref(), "impressions", &ad_id)?;
    let clicks: u64 = required(row.clicks.as_deref(), "clicks", &ad_id)?;

    let mut actions = BTreeMap::new();
    for action in row.actions.unwrap_or_default() {
        let value: i64 = action.value.parse().map_err(|_| InsightsError::MissingField {
            field: format!("actions.{}", action.action_type),
            ad_id: ad_id.clone(),
        })?;
        actions.insert(action.action_type, value);
    }

    Ok(NormalizedRecord {
        account_id: row.account_id.unwrap_or_default(),
        account_name: row.account_name.unwrap_or_default(),
        campaign_id: row.campaign_id.unwrap_or_default(),
        campaign_name: row.campaign_name.unwrap_or_default(),
        adset_id: row.adset_id.unwrap_or_default(),
        adset_name: row.adset_name.unwrap_or_default(),
        ad_id: row.ad_id.unwrap_or_default(),
        ad_name: row.ad_name.unwrap_or_default(),
        spend,
        impressions,
        clicks,
        breakdown_label,
        breakdown_id,
        actions,
    })
}

/// Parse a field the platform guarantees on every insights row; absence or
/// garbage is a fatal data-integrity error naming the field and the ad.
fn required<T: FromStr>(value: Option<&str>, field: &str, ad_id: &str) -> InsightsResult<T> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| InsightsError::MissingField {
            field: field.to_string(),
            ad_id: ad_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::types::{AdAction, AssetRef};

    fn sample_raw_row() -> RawReportRow {
        RawReportRow {
            account_id: Some("901".into()),
            account_name: Some("Acme".into()),
            campaign_id: Some("c-1".into()),
            campaign_name: Some("Spring Sale".into()),
            adset_id: Some("as-1".into()),
            adset_name: Some("Broad".into()),
            ad_id: Some("ad-1".into()),
            ad_name: Some("Hero ad".into()),
            spend: Some("12.50".into()),
            impressions: Some("1000".into()),
            clicks: Some("40".into()),
            actions: Some(vec![
                AdAction {
                    action_type: "lead".into(),
                    value: "3".into(),
                },
                AdAction {
                    action_type: "post_engagement".into(),
                    value: "11".into(),
                },
            ]),
            image_asset: Some(AssetRef {
                id: Some("img-9".into()),
                image_name: Some("hero \u{1F525}\nbanner.png".into()),
                ..AssetRef::default()
            }),
            ..RawReportRow::default()
        }
    }

    #[test]
    fn test_normalizes_full_row() {
        let records = normalize_rows(vec![sample_raw_row()], Breakdown::ImageAsset).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.campaign_name, "Spring Sale");
        assert_eq!(r.spend, 12.5);
        assert_eq!(r.impressions, 1000);
        assert_eq!(r.clicks, 40);
        // emoji stripped, newline collapsed
        assert_eq!(r.breakdown_label, "hero  banner.png");
        assert_eq!(r.breakdown_id, "img-9");
        assert_eq!(r.action("lead"), Some(3));
        assert_eq!(r.action("post_engagement"), Some(11));
        // unobserved action types stay absent, not zero
        assert_eq!(r.action("purchase"), None);
    }

    #[test]
    fn test_missing_asset_is_fatal() {
        let mut row = sample_raw_row();
        row.image_asset = None;
        let err = normalize_rows(vec![row], Breakdown::ImageAsset).unwrap_err();
        match err {
            InsightsError::MissingBreakdownAsset { breakdown, ad_id } => {
                assert_eq!(breakdown, "image_asset");
                assert_eq!(ad_id, "ad-1");
            }
            other => panic!("expected MissingBreakdownAsset, got {other}"),
        }
    }

    #[test]
    fn test_missing_label_field_defaults_to_empty() {
        let mut row = sample_raw_row();
        row.image_asset = Some(AssetRef {
            id: Some("img-9".into()),
            ..AssetRef::default()
        });
        let records = normalize_rows(vec![row], Breakdown::ImageAsset).unwrap();
        assert_eq!(records[0].breakdown_label, "");
        assert_eq!(records[0].breakdown_id, "img-9");
    }

    #[test]
    fn test_missing_spend_is_fatal() {
        let mut row = sample_raw_row();
        row.spend = None;
        let err = normalize_rows(vec![row], Breakdown::ImageAsset).unwrap_err();
        assert!(err.to_string().contains("spend"));
        assert!(err.to_string().contains("ad-1"));
    }

    #[test]
    fn test_unparsable_impressions_is_fatal() {
        let mut row = sample_raw_row();
        row.impressions = Some("lots".into());
        let err = normalize_rows(vec![row], Breakdown::ImageAsset).unwrap_err();
        assert!(err.to_string().contains("impressions"));
    }

    #[test]
    fn test_no_actions_list_means_no_action_columns() {
        let mut row = sample_raw_row();
        row.actions = None;
        let records = normalize_rows(vec![row], Breakdown::ImageAsset).unwrap();
        assert!(records[0].actions.is_empty());
    }
}
