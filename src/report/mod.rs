//! KPI reporting against Prometheus.
//!
//! Pulls the window's key figures (active users, generated tokens, mean
//! latency, per-model token split) with independent queries and assembles
//! them into a [`KpiReport`]. Queries run concurrently; any of them failing
//! or returning nothing shows up as `N/A` rather than an error.

pub mod client;
pub mod promql;
pub mod render;
pub mod resolve;
pub mod window;

use client::PromClient;
use render::{KpiReport, ModelUsage};
use window::TimeWindow;

pub async fn generate(client: &PromClient, window: &TimeWindow) -> KpiReport {
    let user_candidates = resolve::active_user_candidates(window.end);
    let tokens_query = promql::range_increase(promql::GENERATION_TOKENS_METRIC, window);
    let latency_query = promql::avg_latency(
        promql::LATENCY_SUM_METRIC,
        promql::LATENCY_COUNT_METRIC,
        window,
    );
    let by_model_query = promql::range_increase_by(
        promql::GENERATION_TOKENS_METRIC,
        window,
        promql::MODEL_LABEL,
    );
    let (active_users, total_tokens, avg_latency, by_model) = tokio::join!(
        resolve::resolve_first(client, &user_candidates),
        client.query_scalar(&tokens_query),
        client.query_scalar(&latency_query),
        client.query_vector(&by_model_query),
    );

    let tokens_by_model = by_model
        .into_iter()
        .map(|(labels, value)| ModelUsage {
            label: labels
                .get(promql::MODEL_LABEL)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            value,
        })
        .collect();

    KpiReport::new(*window, active_users, total_tokens, avg_latency, tokens_by_model)
}
