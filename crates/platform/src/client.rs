//! Blocking Graph API insights client. Fetches ad-level rows for one
//! creative-asset breakdown at a time and follows paging until the result
//! set is exhausted.

use insights_core::error::{InsightsError, InsightsResult};
use insights_core::types::{Breakdown, FetchWindow, InsightsSource, RawReportRow};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

const GRAPH_BASE: &str = "https://graph.facebook.com";
const API_VERSION: &str = "v19.0";

/// Insight fields requested on every call.
const FIELDS: &str = "account_id,account_name,campaign_id,campaign_name,\
adset_id,adset_name,ad_id,ad_name,spend,impressions,clicks,actions";

/// Pre-provisioned Graph credentials, read from the process environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub access_token: String,
    pub account_id: String,
}

impl Credentials {
    /// Read `FB_APP_ID`, `FB_APP_SECRET`, `FB_ACCESS_TOKEN` and
    /// `FB_AD_ACCOUNT_ID`. Any missing variable fails client construction,
    /// never the reporting core.
    pub fn from_env() -> InsightsResult<Self> {
        Ok(Self {
            app_id: require_env("FB_APP_ID")?,
            app_secret: require_env("FB_APP_SECRET")?,
            access_token: require_env("FB_ACCESS_TOKEN")?,
            account_id: require_env("FB_AD_ACCOUNT_ID")?,
        })
    }
}

fn require_env(name: &str) -> InsightsResult<String> {
    std::env::var(name)
        .map_err(|_| InsightsError::Platform(format!("environment variable {name} is not set")))
}

/// One page of an insights response.
#[derive(Debug, Deserialize)]
struct InsightsPage {
    #[serde(default)]
    data: Vec<RawReportRow>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<String>,
}

/// Error envelope the Graph API returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

pub struct GraphClient {
    http: reqwest::blocking::Client,
    credentials: Credentials,
    base: Url,
    statuses: Vec<String>,
}

impl GraphClient {
    pub fn new(credentials: Credentials, statuses: Vec<String>) -> InsightsResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| InsightsError::Platform(format!("failed to build HTTP client: {e}")))?;
        let base = Url::parse(GRAPH_BASE)
            .map_err(|e| InsightsError::Platform(format!("invalid Graph base URL: {e}")))?;
        Ok(Self {
            http,
            credentials,
            base,
            statuses,
        })
    }

    /// First-page request URL for one breakdown and reporting window.
    fn insights_url(&self, breakdown: Breakdown, window: &FetchWindow) -> InsightsResult<Url> {
        let mut url = self
            .base
            .join(&format!(
                "{API_VERSION}/act_{}/insights",
                self.credentials.account_id
            ))
            .map_err(|e| InsightsError::Platform(format!("invalid insights path: {e}")))?;

        let filtering = json!([{
            "field": "ad.effective_status",
            "operator": "IN",
            "value": self.statuses,
        }]);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("level", "ad");
            query.append_pair("breakdowns", breakdown.as_str());
            query.append_pair("fields", FIELDS);
            query.append_pair("filtering", &filtering.to_string());
            match window {
                FetchWindow::DatePreset(preset) => {
                    query.append_pair("date_preset", preset);
                }
                FetchWindow::Between { since, until } => {
                    let range = json!({
                        "since": since.to_string(),
                        "until": until.to_string(),
                    });
                    query.append_pair("time_range", &range.to_string());
                }
            }
            query.append_pair("access_token", &self.credentials.access_token);
        }

        Ok(url)
    }

    fn get_page(&self, url: Url) -> InsightsResult<InsightsPage> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| InsightsError::Platform(format!("insights request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| InsightsError::Platform(format!("failed to read insights body: {e}")))?;

        if !status.is_success() {
            // The Graph API wraps failures in an error envelope; surface its
            // message when it parses, the raw status otherwise.
            let detail = serde_json::from_str::<GraphErrorEnvelope>(&body)
                .map(|env| match env.error.code {
                    Some(code) => format!("{} (code {code})", env.error.message),
                    None => env.error.message,
                })
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(InsightsError::Platform(detail));
        }

        serde_json::from_str(&body)
            .map_err(|e| InsightsError::Platform(format!("unexpected insights payload: {e}")))
    }
}

impl InsightsSource for GraphClient {
    fn fetch(&self, breakdown: Breakdown, window: &FetchWindow) -> InsightsResult<Vec<RawReportRow>> {
        info!(breakdown = %breakdown, period = %window.period_label(), "fetching ad insights");

        let mut rows = Vec::new();
        let mut next = Some(self.insights_url(breakdown, window)?);
        while let Some(url) = next {
            let page = self.get_page(url)?;
            debug!(breakdown = %breakdown, page_rows = page.data.len(), "insights page received");
            rows.extend(page.data);
            // Paging URLs come back fully qualified, token included.
            next = match page.paging.and_then(|p| p.next) {
                Some(next_url) => Some(Url::parse(&next_url).map_err(|e| {
                    InsightsError::Platform(format!("invalid paging URL from API: {e}"))
                })?),
                None => None,
            };
        }

        info!(breakdown = %breakdown, rows = rows.len(), "retrieved ad insights");
        Ok(rows)
    }
}
