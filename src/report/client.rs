//! Minimal Prometheus HTTP API client.
//!
//! Only the instant-query endpoint (`/api/v1/query`) is used. Failures are
//! soft by design: a query that errors out is logged and reported as absent
//! data, so one broken metric never sinks the whole report.

use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use super::promql::MetricQuery;

const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PromClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PromClient {
    pub fn new(base_url: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(QUERY_TIMEOUT).build()?;
        Ok(Self { http, base_url })
    }

    /// Evaluate a query expected to yield a single value. `None` means the
    /// metric is absent, the result was empty, or the query failed.
    pub async fn query_scalar(&self, query: &MetricQuery) -> Option<f64> {
        match self.execute(query).await {
            Ok(samples) => samples.first().and_then(VectorSample::sample_value),
            Err(e) => {
                warn!(query = %query.expression, error = %e, "Prometheus query failed");
                None
            }
        }
    }

    /// Evaluate a query yielding a labelled vector. Failures and unparsable
    /// samples produce an empty result.
    pub async fn query_vector(&self, query: &MetricQuery) -> Vec<(HashMap<String, String>, f64)> {
        match self.execute(query).await {
            Ok(samples) => samples
                .into_iter()
                .filter_map(|sample| {
                    let value = sample.sample_value()?;
                    Some((sample.metric, value))
                })
                .collect(),
            Err(e) => {
                warn!(query = %query.expression, error = %e, "Prometheus query failed");
                Vec::new()
            }
        }
    }

    async fn execute(&self, query: &MetricQuery) -> Result<Vec<VectorSample>, crate::Error> {
        let url = format!("{}/api/v1/query", self.base_url.as_str().trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .query(&[
                ("query", query.expression.as_str()),
                ("time", &query.evaluation_time.timestamp().to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response.json().await?;
        if body.status != "success" {
            return Err(anyhow::anyhow!("query returned status {:?}", body.status).into());
        }
        Ok(body.data.result)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<VectorSample>,
}

/// One element of a Prometheus instant vector. The value comes over the wire
/// as `[<unix timestamp>, "<value>"]`.
#[derive(Debug, Deserialize)]
struct VectorSample {
    #[serde(default)]
    metric: HashMap<String, String>,
    value: (f64, String),
}

impl VectorSample {
    fn sample_value(&self) -> Option<f64> {
        self.value.1.parse().ok()
    }
}
