use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::config::AnalyticsConfig;
use crate::error::FetchError;
use crate::models::MetricResult;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Counts(MetricResult),
    Malformed { reason: String },
}

impl FetchOutcome {
    pub fn into_counts(self) -> MetricResult {
        match self {
            FetchOutcome::Counts(counts) => counts,
            FetchOutcome::Malformed { .. } => MetricResult::new(),
        }
    }
}

pub trait EventSource {
    async fn fetch_event(
        &self,
        event_name: &str,
        date: NaiveDate,
        filter: Option<&str>,
    ) -> Result<FetchOutcome, FetchError>;
}

#[derive(Debug, Clone)]
pub struct InsightsClient {
    http: reqwest::Client,
    config: AnalyticsConfig,
}

impl InsightsClient {
    pub fn new(config: AnalyticsConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn form_params(
        &self,
        event_name: &str,
        date: NaiveDate,
        filter: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut params = vec![
            ("project_id", self.config.project_id.clone()),
            ("from_date", day.clone()),
            ("to_date", day),
            ("event", Value::from(vec![event_name]).to_string()),
            ("type", "general".to_string()),
            ("unit", "day".to_string()),
            ("breakdown", "id".to_string()),
        ];
        if let Some(filter) = filter {
            params.push(("where", filter.to_string()));
        }
        params
    }
}

impl EventSource for InsightsClient {
    async fn fetch_event(
        &self,
        event_name: &str,
        date: NaiveDate,
        filter: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let params = self.form_params(event_name, date, filter);
        debug!(event = event_name, %date, filtered = filter.is_some(), "Querying insights");

        let response = self
            .http
            .post(&self.config.api_url)
            .basic_auth(&self.config.username, Some(&self.config.secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_insights(&body))
    }
}

/// Parse `{"data": {"values": {user_id: {bucket: count}}}}` into per-user totals.
pub fn parse_insights(body: &str) -> FetchOutcome {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => {
            return FetchOutcome::Malformed {
                reason: format!("body is not JSON: {e}"),
            }
        }
    };

    let Some(data) = json.get("data") else {
        return malformed("missing `data`");
    };
    let Some(values) = data.get("values") else {
        return malformed("missing `data.values`");
    };
    let Some(values) = values.as_object() else {
        return malformed("`data.values` is not an object");
    };

    let mut result = MetricResult::new();
    for (user_id, buckets) in values {
        let count = match buckets.as_object() {
            Some(buckets) => {
                let mut total: u64 = 0;
                for (bucket, value) in buckets {
                    let Some(count) = bucket_count(value) else {
                        return malformed(&format!(
                            "bucket `{bucket}` for user `{user_id}` is not a non-negative integer"
                        ));
                    };
                    total = total.saturating_add(count);
                }
                total
            }
            None => 0,
        };
        result.insert(user_id.clone(), count);
    }

    FetchOutcome::Counts(result)
}

fn bucket_count(value: &Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }
    let float = value.as_f64()?;
    (float.is_finite() && float >= 0.0 && float.fract() == 0.0).then_some(float as u64)
}

fn malformed(reason: &str) -> FetchOutcome {
    FetchOutcome::Malformed {
        reason: reason.to_string(),
    }
}
