//! Multi-candidate metric resolution.
//!
//! Deployments differ in how recording rules name the active-user series, so
//! the report tries a short list of equivalent queries in order and takes the
//! first one that returns data.

use chrono::{DateTime, Utc};

use super::client::PromClient;
use super::promql::{self, MetricQuery};

/// Evaluate candidates in order, short-circuiting on the first that yields a
/// value. Later candidates are never sent once one succeeds.
pub async fn resolve_first(client: &PromClient, candidates: &[MetricQuery]) -> Option<f64> {
    for candidate in candidates {
        if let Some(value) = client.query_scalar(candidate).await {
            return Some(value);
        }
    }
    None
}

/// Known spellings of the 30-day active user count, most likely first. The
/// last entry derives the figure from per-user message gauges when no
/// dedicated series exists at all.
pub fn active_user_candidates(at: DateTime<Utc>) -> Vec<MetricQuery> {
    vec![
        promql::instant("openwebui_users_active_30d", at),
        promql::instant("openwebui:users_active_30d", at),
        promql::instant("count(openwebui_user_messages > 0)", at),
    ]
}
