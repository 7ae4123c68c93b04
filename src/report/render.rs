//! KPI report assembly and plain-text rendering.

use std::cmp::Ordering;
use std::fmt::Write;

use super::window::TimeWindow;

/// Models wider than this are truncated in the report table.
const LABEL_DISPLAY_WIDTH: usize = 40;

/// One model's share of generated tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelUsage {
    pub label: String,
    pub value: f64,
}

/// The assembled report. `None` fields render as `N/A`.
#[derive(Debug, Clone)]
pub struct KpiReport {
    pub window: TimeWindow,
    pub active_users: Option<f64>,
    pub total_tokens: Option<f64>,
    pub avg_latency_secs: Option<f64>,
    pub tokens_by_model: Vec<ModelUsage>,
}

impl KpiReport {
    /// Assemble a report. Zero and negative model rows are dropped and the
    /// rest sorted by descending usage; equal values keep their input order.
    pub fn new(
        window: TimeWindow,
        active_users: Option<f64>,
        total_tokens: Option<f64>,
        avg_latency_secs: Option<f64>,
        mut tokens_by_model: Vec<ModelUsage>,
    ) -> Self {
        tokens_by_model.retain(|usage| usage.value > 0.0);
        tokens_by_model.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        Self {
            window,
            active_users,
            total_tokens,
            avg_latency_secs,
            tokens_by_model,
        }
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "KPI REPORT: {} to {}",
            self.window.start.format("%Y-%m-%d"),
            self.window.end.format("%Y-%m-%d")
        );
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);

        let _ = writeln!(out, "KEY METRICS:");
        let _ = writeln!(out, "  Active Users:              {:>12}", format_number(self.active_users, 0));
        let _ = writeln!(
            out,
            "  Total Tokens Generated:    {:>12}",
            format_number(self.total_tokens, 0)
        );
        match self.avg_latency_secs {
            Some(latency) => {
                let _ = writeln!(out, "  Avg Response Time:         {latency:>11.3}s");
            }
            None => {
                let _ = writeln!(out, "  Avg Response Time:         {:>12}", "N/A");
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "TOKENS BY MODEL:");
        if self.tokens_by_model.is_empty() {
            let _ = writeln!(out, "  No data available");
        } else {
            let total: f64 = self.tokens_by_model.iter().map(|usage| usage.value).sum();
            for usage in &self.tokens_by_model {
                let _ = writeln!(
                    out,
                    "  {:<42} {:>10} ({:5.1}%)",
                    truncate_label(&usage.label, LABEL_DISPLAY_WIDTH),
                    format_number(Some(usage.value), 0),
                    percentage(usage.value, total)
                );
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");

        out
    }
}

/// `value` as a share of `total`, in percent. Zero when the total is zero.
pub fn percentage(value: f64, total: f64) -> f64 {
    if total > 0.0 { value / total * 100.0 } else { 0.0 }
}

/// Human-friendly number: thousands separators, `N/A` for absent values.
/// With zero decimals the fractional part is dropped, not rounded.
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };
    let formatted = if decimals == 0 {
        (value.trunc() as i64).to_string()
    } else {
        format!("{value:.decimals$}")
    };
    match formatted.split_once('.') {
        Some((int_part, frac)) => format!("{}.{frac}", group_digits(int_part)),
        None => group_digits(&formatted),
    }
}

fn group_digits(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

/// Truncate a model label to `width` display characters, ellipsized.
fn truncate_label(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let kept: String = label.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
