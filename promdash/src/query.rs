//! Query expression and legend composition.

use crate::classifier::{is_structured_name, TELEMETRY_VENDOR};
use crate::config::{QueryConfig, DEFAULT_LEGEND};
use crate::metric::{Metric, MetricType};
use crate::promql;

/// Window used for rate queries over structured telemetry counters
pub const TELEMETRY_RATE_WINDOW: &str = "5m";

/// Labels preferred in telemetry legends, in display order
const TELEMETRY_LEGEND_LABELS: [&str; 3] = [
    "device",
    "_interfaces_interface__name",
    "_components_component__name",
];

const TELEMETRY_FALLBACK_LEGEND: &str = "Device:[{{device}}]";

/// Name segments marking a telemetry counter that should be rated
const TELEMETRY_COUNTER_CUES: [&str; 6] = [
    "_in_", "_out_", "_frames_", "_drops_", "_errors_", "_packets_",
];

/// A query expression together with its legend template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedQuery {
    pub expr: String,
    pub legend: String,
}

/// Turns classified metrics into query expressions and legends
#[derive(Debug, Clone, Copy)]
pub struct QueryComposer<'a> {
    config: &'a QueryConfig,
}

impl<'a> QueryComposer<'a> {
    pub fn new(config: &'a QueryConfig) -> Self {
        Self { config }
    }

    pub fn compose(&self, metric: &Metric) -> ComposedQuery {
        ComposedQuery {
            expr: self.expression(metric),
            legend: self.legend(metric),
        }
    }

    /// Query expression for `metric`
    pub fn expression(&self, metric: &Metric) -> String {
        if uses_telemetry_rules(metric) {
            return telemetry_expression(metric.name());
        }

        let template = match metric.metric_type() {
            MetricType::Counter => &self.config.counter_expr,
            MetricType::Gauge => &self.config.gauge_expr,
            MetricType::Summary => &self.config.summary_expr,
            MetricType::Unknown => return metric.full_name(),
        };

        let query_name = match metric.metric_type() {
            MetricType::Summary => metric.name().to_string(),
            _ => metric.full_name(),
        };

        template.replace(&self.config.delimiter, &query_name)
    }

    /// Legend template for `metric`
    pub fn legend(&self, metric: &Metric) -> String {
        if uses_telemetry_rules(metric) {
            return telemetry_legend(metric);
        }

        let fallback = match metric.metric_type() {
            MetricType::Counter => self.config.counter_legend.as_str(),
            MetricType::Gauge => self.config.gauge_legend.as_str(),
            MetricType::Summary => self.config.summary_legend.as_str(),
            MetricType::Unknown => "",
        };

        format_legend(metric, fallback)
    }
}

/// One `label:[{{label}}]` clause per label in sorted order
pub fn format_legend(metric: &Metric, fallback: &str) -> String {
    let clauses: Vec<String> = metric.labels().map(legend_clause).collect();

    if !clauses.is_empty() {
        return clauses.join(" ");
    }

    if fallback.is_empty() {
        DEFAULT_LEGEND.to_string()
    } else {
        fallback.to_string()
    }
}

fn legend_clause(label: &str) -> String {
    format!("{}:[{{{{{}}}}}]", label, label)
}

fn uses_telemetry_rules(metric: &Metric) -> bool {
    metric.vendor() == TELEMETRY_VENDOR && is_structured_name(metric.name())
}

fn telemetry_expression(name: &str) -> String {
    let counter_like = name.contains("_counters_")
        && TELEMETRY_COUNTER_CUES.iter().any(|cue| name.contains(cue));

    if counter_like {
        promql::rate_query(name, TELEMETRY_RATE_WINDOW)
    } else {
        // Instantaneous values such as cpu, memory, utilization and temperature
        name.to_string()
    }
}

fn telemetry_legend(metric: &Metric) -> String {
    let clauses: Vec<String> = TELEMETRY_LEGEND_LABELS
        .iter()
        .filter(|label| metric.has_label(label))
        .map(|label| legend_clause(label))
        .collect();

    if clauses.is_empty() {
        TELEMETRY_FALLBACK_LEGEND.to_string()
    } else {
        clauses.join(" ")
    }
}
