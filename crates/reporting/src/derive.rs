//! Per-row ratio metrics and per-campaign comparison columns.
//!
//! A metric is `None` when its denominator is zero or was never observed on
//! the row. Undefined values flow through to rendering and export; they are
//! excluded from sorts and averages but the row itself is never dropped.

use insights_core::stats;
use insights_core::types::NormalizedRecord;
use std::collections::BTreeMap;

/// A normalized record plus its derived metric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedRecord {
    pub record: NormalizedRecord,
    pub click_through_rate: Option<f64>,
    pub cost_per_click: Option<f64>,
    pub cost_per_lead: Option<f64>,
    pub cost_per_purchase: Option<f64>,
    pub lead_conversion_rate: Option<f64>,
    pub avg_campaign_ctr: Option<f64>,
    pub ctr_greater_than_avg: Option<bool>,
    pub avg_campaign_cpc: Option<f64>,
    pub cpc_greater_than_avg: Option<bool>,
    pub avg_campaign_cpl: Option<f64>,
    pub cpl_greater_than_avg: Option<bool>,
    pub avg_campaign_cpp: Option<f64>,
    pub cpp_greater_than_avg: Option<bool>,
}

/// The plottable per-row metrics. Closed set: chart requests are built from
/// these variants, so an unknown metric name is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Ctr,
    Cpc,
    Cpl,
    Cpp,
    Lcvr,
}

impl Metric {
    /// Column name in the exported table.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Ctr => "click_through_rate",
            Metric::Cpc => "cost_per_click",
            Metric::Cpl => "cost_per_lead",
            Metric::Cpp => "cost_per_purchase",
            Metric::Lcvr => "lead_conversion_rate",
        }
    }

    /// Human-readable name used in chart captions.
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Ctr => "Click Through Rate",
            Metric::Cpc => "Cost per Click",
            Metric::Cpl => "Cost per Lead",
            Metric::Cpp => "Cost per Purchase",
            Metric::Lcvr => "Lead Conversion Rate",
        }
    }

    pub fn value(&self, row: &DerivedRecord) -> Option<f64> {
        match self {
            Metric::Ctr => row.click_through_rate,
            Metric::Cpc => row.cost_per_click,
            Metric::Cpl => row.cost_per_lead,
            Metric::Cpp => row.cost_per_purchase,
            Metric::Lcvr => row.lead_conversion_rate,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Add the five ratio metrics to every record. Click-through and
/// lead-conversion rates are percentages (0 to 100), not fractions.
pub fn derive_metrics(records: Vec<NormalizedRecord>) -> Vec<DerivedRecord> {
    records
        .into_iter()
        .map(|record| {
            let lead = record.action("lead");
            let purchase = record.action("purchase");
            let clicks = record.clicks as f64;
            let impressions = record.impressions as f64;

            let click_through_rate = ratio(clicks, impressions).map(|v| v * 100.0);
            let cost_per_click = ratio(record.spend, clicks);
            let cost_per_lead = lead.and_then(|l| ratio(record.spend, l as f64));
            let cost_per_purchase = purchase.and_then(|p| ratio(record.spend, p as f64));
            let lead_conversion_rate =
                lead.and_then(|l| ratio(l as f64, clicks)).map(|v| v * 100.0);

            DerivedRecord {
                record,
                click_through_rate,
                cost_per_click,
                cost_per_lead,
                cost_per_purchase,
                lead_conversion_rate,
                ..DerivedRecord::default()
            }
        })
        .collect()
}

/// Attach per-campaign average columns and the greater-than-average flags
/// for CTR/CPC/CPL/CPP. The average for a campaign is taken over the rows
/// where the metric is defined and broadcast to every row of that campaign.
pub fn add_campaign_comparison(rows: &mut [DerivedRecord]) {
    for metric in [Metric::Ctr, Metric::Cpc, Metric::Cpl, Metric::Cpp] {
        let mut averages: BTreeMap<String, Option<f64>> = BTreeMap::new();
        for (campaign, indices) in group_by_campaign(rows) {
            let defined: Vec<f64> = indices.iter().filter_map(|&i| metric.value(&rows[i])).collect();
            averages.insert(campaign, stats::mean(&defined));
        }

        for row in rows.iter_mut() {
            let average = averages.get(&row.record.campaign_name).copied().flatten();
            let flag = match (metric.value(row), average) {
                (Some(v), Some(a)) => Some(v > a),
                _ => None,
            };
            match metric {
                Metric::Ctr => {
                    row.avg_campaign_ctr = average;
                    row.ctr_greater_than_avg = flag;
                }
                Metric::Cpc => {
                    row.avg_campaign_cpc = average;
                    row.cpc_greater_than_avg = flag;
                }
                Metric::Cpl => {
                    row.avg_campaign_cpl = average;
                    row.cpl_greater_than_avg = flag;
                }
                Metric::Cpp => {
                    row.avg_campaign_cpp = average;
                    row.cpp_greater_than_avg = flag;
                }
                // lead-conversion rate ships without a campaign companion
                Metric::Lcvr => {}
            }
        }
    }
}

fn group_by_campaign(rows: &[DerivedRecord]) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups
            .entry(row.record.campaign_name.clone())
            .or_default()
            .push(i);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(
        campaign: &str,
        spend: f64,
        impressions: u64,
        clicks: u64,
        actions: &[(&str, i64)],
    ) -> NormalizedRecord {
        NormalizedRecord {
            campaign_name: campaign.to_string(),
            spend,
            impressions,
            clicks,
            actions: actions
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            ..NormalizedRecord::default()
        }
    }

    #[test]
    fn test_ctr_is_a_percentage() {
        let rows = derive_metrics(vec![
            make_record("A", 5.0, 100, 10, &[]),
            make_record("A", 5.0, 100, 20, &[]),
        ]);
        assert_eq!(rows[0].click_through_rate, Some(10.0));
        assert_eq!(rows[1].click_through_rate, Some(20.0));
    }

    #[test]
    fn test_ctr_bounded_when_clicks_at_most_impressions() {
        for (clicks, impressions) in [(0u64, 50u64), (25, 50), (50, 50)] {
            let rows = derive_metrics(vec![make_record("A", 1.0, impressions, clicks, &[])]);
            let ctr = rows[0].click_through_rate.unwrap();
            assert!((0.0..=100.0).contains(&ctr));
        }
    }

    #[test]
    fn test_zero_impressions_leaves_ctr_undefined() {
        let rows = derive_metrics(vec![make_record("A", 1.0, 0, 0, &[])]);
        assert_eq!(rows[0].click_through_rate, None);
    }

    #[test]
    fn test_zero_clicks_with_leads() {
        // cost_per_lead stays well-defined, cost_per_click does not
        let rows = derive_metrics(vec![make_record("A", 9.0, 100, 0, &[("lead", 3)])]);
        let row = &rows[0];
        assert_eq!(row.cost_per_lead, Some(3.0));
        assert_eq!(row.cost_per_click, None);
        assert_eq!(row.lead_conversion_rate, None);
    }

    #[test]
    fn test_missing_action_leaves_metric_undefined() {
        let rows = derive_metrics(vec![make_record("A", 9.0, 100, 10, &[])]);
        assert_eq!(rows[0].cost_per_lead, None);
        assert_eq!(rows[0].cost_per_purchase, None);
        assert_eq!(rows[0].lead_conversion_rate, None);
    }

    #[test]
    fn test_lead_conversion_rate() {
        let rows = derive_metrics(vec![make_record("A", 9.0, 1000, 50, &[("lead", 5)])]);
        assert_eq!(rows[0].lead_conversion_rate, Some(10.0));
    }

    #[test]
    fn test_empty_input_short_circuits() {
        assert!(derive_metrics(Vec::new()).is_empty());
    }

    #[test]
    fn test_campaign_comparison_broadcasts_averages() {
        let mut rows = derive_metrics(vec![
            make_record("A", 5.0, 100, 10, &[]), // ctr 10
            make_record("A", 5.0, 100, 30, &[]), // ctr 30
            make_record("B", 5.0, 100, 50, &[]), // ctr 50
        ]);
        add_campaign_comparison(&mut rows);

        assert_eq!(rows[0].avg_campaign_ctr, Some(20.0));
        assert_eq!(rows[1].avg_campaign_ctr, Some(20.0));
        assert_eq!(rows[2].avg_campaign_ctr, Some(50.0));
        assert_eq!(rows[0].ctr_greater_than_avg, Some(false));
        assert_eq!(rows[1].ctr_greater_than_avg, Some(true));
        // a single row always equals its own average
        assert_eq!(rows[2].ctr_greater_than_avg, Some(false));
    }

    #[test]
    fn test_campaign_comparison_skips_undefined_rows() {
        let mut rows = derive_metrics(vec![
            make_record("A", 6.0, 100, 10, &[("lead", 2)]), // cpl 3.0
            make_record("A", 6.0, 100, 10, &[]),            // cpl undefined
        ]);
        add_campaign_comparison(&mut rows);

        // the undefined row is excluded from the average but still carries it
        assert_eq!(rows[0].avg_campaign_cpl, Some(3.0));
        assert_eq!(rows[1].avg_campaign_cpl, Some(3.0));
        assert_eq!(rows[1].cpl_greater_than_avg, None);
    }
}
