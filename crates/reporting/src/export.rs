//! CSV export with the preferred column ordering.
//!
//! Column order is a pure projection of the derived table: a fixed preferred
//! prefix, then every remaining column lexicographically. No value is
//! dropped, renamed, or recomputed on the way out.

use crate::derive::DerivedRecord;
use insights_core::error::InsightsResult;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Preferred column prefix: identifiers, names, breakdown label/id, each
/// metric followed by its campaign-average companions, then the raw counts.
/// Action-count entries apply only when that action type was observed in
/// the batch.
const PREFERRED_ORDER: &[&str] = &[
    "account_id",
    "campaign_id",
    "ad_id",
    "breakdown_id",
    "account_name",
    "campaign_name",
    "ad_name",
    "breakdown",
    "click_through_rate",
    "avg_campaign_ctr",
    "ctr_greater_than_avg",
    "cost_per_click",
    "avg_campaign_cpc",
    "cpc_greater_than_avg",
    "cost_per_lead",
    "avg_campaign_cpl",
    "cpl_greater_than_avg",
    "cost_per_purchase",
    "avg_campaign_cpp",
    "cpp_greater_than_avg",
    "lead_conversion_rate",
    "spend",
    "impressions",
    "clicks",
    "lead",
    "purchase",
    "post_reaction",
    "post_engagement",
    "video_view",
];

/// Columns every derived record carries regardless of the data.
const FIXED_COLUMNS: &[&str] = &[
    "account_id",
    "account_name",
    "campaign_id",
    "campaign_name",
    "adset_id",
    "adset_name",
    "ad_id",
    "ad_name",
    "breakdown",
    "breakdown_id",
    "spend",
    "impressions",
    "clicks",
    "click_through_rate",
    "avg_campaign_ctr",
    "ctr_greater_than_avg",
    "cost_per_click",
    "avg_campaign_cpc",
    "cpc_greater_than_avg",
    "cost_per_lead",
    "avg_campaign_cpl",
    "cpl_greater_than_avg",
    "cost_per_purchase",
    "avg_campaign_cpp",
    "cpp_greater_than_avg",
    "lead_conversion_rate",
];

/// The ordered header for a batch: preferred prefix filtered to columns the
/// table actually has, then the rest in lexicographic order. The dynamic
/// part is the union of action types observed across all rows.
pub fn ordered_columns(rows: &[DerivedRecord]) -> Vec<String> {
    let observed_actions: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.record.actions.keys().map(String::as_str))
        .collect();

    let mut columns: Vec<String> = PREFERRED_ORDER
        .iter()
        .filter(|col| FIXED_COLUMNS.contains(*col) || observed_actions.contains(**col))
        .map(|col| col.to_string())
        .collect();

    // Everything not already placed, lexicographically: the adset columns
    // and any action type outside the well-known set. BTreeSet keeps the
    // ordering for us.
    let remaining: BTreeSet<&str> = FIXED_COLUMNS
        .iter()
        .copied()
        .chain(observed_actions.iter().copied())
        .filter(|col| !PREFERRED_ORDER.contains(col))
        .collect();
    columns.extend(remaining.into_iter().map(String::from));

    columns
}

fn format_float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_flag(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Cell value for one column of one row. Unobserved action counts and
/// undefined metrics serialize as empty cells, never zero.
fn cell(row: &DerivedRecord, column: &str) -> String {
    let r = &row.record;
    match column {
        "account_id" => r.account_id.clone(),
        "account_name" => r.account_name.clone(),
        "campaign_id" => r.campaign_id.clone(),
        "campaign_name" => r.campaign_name.clone(),
        "adset_id" => r.adset_id.clone(),
        "adset_name" => r.adset_name.clone(),
        "ad_id" => r.ad_id.clone(),
        "ad_name" => r.ad_name.clone(),
        "breakdown" => r.breakdown_label.clone(),
        "breakdown_id" => r.breakdown_id.clone(),
        "spend" => r.spend.to_string(),
        "impressions" => r.impressions.to_string(),
        "clicks" => r.clicks.to_string(),
        "click_through_rate" => format_float(row.click_through_rate),
        "cost_per_click" => format_float(row.cost_per_click),
        "cost_per_lead" => format_float(row.cost_per_lead),
        "cost_per_purchase" => format_float(row.cost_per_purchase),
        "lead_conversion_rate" => format_float(row.lead_conversion_rate),
        "avg_campaign_ctr" => format_float(row.avg_campaign_ctr),
        "ctr_greater_than_avg" => format_flag(row.ctr_greater_than_avg),
        "avg_campaign_cpc" => format_float(row.avg_campaign_cpc),
        "cpc_greater_than_avg" => format_flag(row.cpc_greater_than_avg),
        "avg_campaign_cpl" => format_float(row.avg_campaign_cpl),
        "cpl_greater_than_avg" => format_flag(row.cpl_greater_than_avg),
        "avg_campaign_cpp" => format_float(row.avg_campaign_cpp),
        "cpp_greater_than_avg" => format_flag(row.cpp_greater_than_avg),
        action => r
            .actions
            .get(action)
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

/// Write the derived table as a header-bearing CSV file, no index column.
pub fn export_csv(rows: &[DerivedRecord], path: &Path) -> InsightsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let columns = ordered_columns(rows);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|col| cell(row, col)))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "exported CSV");
    Ok(())
}
