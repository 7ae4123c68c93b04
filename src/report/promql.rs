//! PromQL expression builders for the KPI queries.
//!
//! All range queries use `increase(metric[<window>s])` evaluated at the
//! window's end, so a report covers exactly the requested interval no matter
//! when it is generated.

use chrono::{DateTime, Utc};

use super::window::TimeWindow;

/// vLLM counter of generated tokens, labelled by `model_name`
pub const GENERATION_TOKENS_METRIC: &str = "vllm:generation_tokens_total";
/// Sum component of vLLM's end-to-end request latency histogram
pub const LATENCY_SUM_METRIC: &str = "vllm:e2e_request_latency_seconds_sum";
/// Count component of vLLM's end-to-end request latency histogram
pub const LATENCY_COUNT_METRIC: &str = "vllm:e2e_request_latency_seconds_count";
/// Label distinguishing models on the vLLM metrics
pub const MODEL_LABEL: &str = "model_name";

/// A PromQL expression plus the instant to evaluate it at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub expression: String,
    pub evaluation_time: DateTime<Utc>,
}

/// Evaluate a raw expression at a point in time.
pub fn instant(expression: impl Into<String>, at: DateTime<Utc>) -> MetricQuery {
    MetricQuery {
        expression: expression.into(),
        evaluation_time: at,
    }
}

/// Total increase of a counter over the window: `sum(increase(metric[Ns]))`.
pub fn range_increase(metric: &str, window: &TimeWindow) -> MetricQuery {
    MetricQuery {
        expression: format!("sum(increase({metric}[{}s]))", window.duration_secs()),
        evaluation_time: window.end,
    }
}

/// Increase over the window, grouped by one label:
/// `sum by(label) (increase(metric[Ns]))`.
pub fn range_increase_by(metric: &str, window: &TimeWindow, label: &str) -> MetricQuery {
    MetricQuery {
        expression: format!("sum by({label}) (increase({metric}[{}s]))", window.duration_secs()),
        evaluation_time: window.end,
    }
}

/// Mean latency over the window from a histogram's `_sum`/`_count` pair.
pub fn avg_latency(sum_metric: &str, count_metric: &str, window: &TimeWindow) -> MetricQuery {
    let secs = window.duration_secs();
    MetricQuery {
        expression: format!("sum(increase({sum_metric}[{secs}s])) / sum(increase({count_metric}[{secs}s]))"),
        evaluation_time: window.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::window::TimeWindow;
    use chrono::Utc;

    fn hour_window() -> TimeWindow {
        TimeWindow {
            start: "2026-01-01T00:00:00Z".parse().expect("timestamp parses"),
            end: "2026-01-01T01:00:00Z".parse().expect("timestamp parses"),
        }
    }

    #[test]
    fn range_increase_uses_window_seconds_and_end() {
        let query = range_increase("vllm:generation_tokens_total", &hour_window());
        assert_eq!(query.expression, "sum(increase(vllm:generation_tokens_total[3600s]))");
        assert_eq!(query.evaluation_time, hour_window().end);
    }

    #[test]
    fn grouped_increase_names_the_label() {
        let query = range_increase_by("vllm:generation_tokens_total", &hour_window(), "model_name");
        assert_eq!(
            query.expression,
            "sum by(model_name) (increase(vllm:generation_tokens_total[3600s]))"
        );
    }

    #[test]
    fn avg_latency_divides_sum_by_count() {
        let query = avg_latency(LATENCY_SUM_METRIC, LATENCY_COUNT_METRIC, &hour_window());
        assert_eq!(
            query.expression,
            "sum(increase(vllm:e2e_request_latency_seconds_sum[3600s])) / \
             sum(increase(vllm:e2e_request_latency_seconds_count[3600s]))"
        );
    }

    #[test]
    fn zero_length_window_builds_a_zero_range() {
        let now = Utc::now();
        let window = TimeWindow { start: now, end: now };
        let query = range_increase("m", &window);
        assert_eq!(query.expression, "sum(increase(m[0s]))");
    }
}
