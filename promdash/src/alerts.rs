//! Heuristic alert thresholds and panel alert definitions
//!
//! Thresholds are derived purely from a metric's type and name. When one
//! exists, an alert definition with a critical condition (and an optional
//! warning condition) is attached to the metric's panel.

use crate::metric::{Metric, MetricType};
use serde::{Deserialize, Serialize};

/// Reference id of the critical condition's query
pub const CRITICAL_REF_ID: &str = "A";

/// Reference id of the warning condition's query
pub const WARNING_REF_ID: &str = "B";

/// How often alert conditions are evaluated
pub const EVALUATION_FREQUENCY: &str = "60s";

/// How long a condition must hold before the alert fires
pub const PENDING_DURATION: &str = "5m";

/// Warning and critical levels derived for a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThreshold {
    pub warning: f64,
    pub critical: f64,
    pub notify: bool,
}

/// Name-pattern rule producing a threshold for one metric type
struct ThresholdRule {
    metric_type: MetricType,
    cues: &'static [&'static str],
    warning: f64,
    critical: f64,
}

const fn threshold_rule(
    metric_type: MetricType,
    cues: &'static [&'static str],
    warning: f64,
    critical: f64,
) -> ThresholdRule {
    ThresholdRule {
        metric_type,
        cues,
        warning,
        critical,
    }
}

/// Evaluated top to bottom; first match wins
const THRESHOLD_RULES: &[ThresholdRule] = &[
    // errors per second
    threshold_rule(MetricType::Counter, &["error", "fail"], 0.1, 1.0),
    // percent
    threshold_rule(MetricType::Gauge, &["cpu"], 80.0, 95.0),
    threshold_rule(MetricType::Gauge, &["memory", "mem"], 85.0, 95.0),
    threshold_rule(MetricType::Gauge, &["disk"], 80.0, 90.0),
    // milliseconds
    threshold_rule(
        MetricType::Summary,
        &["latency", "duration", "time"],
        1000.0,
        2000.0,
    ),
];

/// Threshold for `metric`, if any rule matches its type and full name
pub fn alert_threshold(metric: &Metric) -> Option<AlertThreshold> {
    let name = metric.name();
    THRESHOLD_RULES
        .iter()
        .find(|rule| {
            rule.metric_type == metric.metric_type()
                && rule.cues.iter().any(|cue| name.contains(cue))
        })
        .map(|rule| AlertThreshold {
            warning: rule.warning,
            critical: rule.critical,
            notify: true,
        })
}

/// Alert attached to a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
    pub name: String,
    pub message: String,
    pub handler: u32,
    pub no_data_state: String,
    pub execution_error_state: String,
    pub frequency: String,
    #[serde(rename = "for")]
    pub pending: String,
    pub conditions: Vec<AlertCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<AlertNotification>,
}

/// One query condition of an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub target: AlertTarget,
    pub evaluator: AlertEvaluator,
    pub reducer: AlertReducer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<AlertOperator>,
}

/// Query evaluated by a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTarget {
    pub ref_id: String,
    pub datasource: String,
    pub expr: String,
}

/// Comparison applied to the reduced value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvaluator {
    #[serde(rename = "type")]
    pub comparison: Comparison,
    pub params: Vec<f64>,
}

/// Comparison operators for alert conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "gt")]
    GreaterThan,
}

/// Reduction applied to the series before comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReducer {
    #[serde(rename = "type")]
    pub reducer_type: String,
}

/// How a condition combines with the previous ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlertOperator {
    Or,
}

/// Notification channel reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub id: u32,
}

impl AlertCondition {
    fn greater_than(ref_id: &str, datasource: &str, expr: &str, level: f64) -> Self {
        Self {
            condition_type: "query".to_string(),
            target: AlertTarget {
                ref_id: ref_id.to_string(),
                datasource: datasource.to_string(),
                expr: expr.to_string(),
            },
            evaluator: AlertEvaluator {
                comparison: Comparison::GreaterThan,
                params: vec![level],
            },
            reducer: AlertReducer {
                reducer_type: "avg".to_string(),
            },
            operator: None,
        }
    }
}

impl AlertDefinition {
    /// Build an alert for `metric_name` evaluating `expr`
    pub fn new(
        metric_name: &str,
        expr: &str,
        threshold: &AlertThreshold,
        datasource: &str,
        notification_channel: u32,
    ) -> Self {
        let mut conditions = vec![AlertCondition::greater_than(
            CRITICAL_REF_ID,
            datasource,
            expr,
            threshold.critical,
        )];

        if threshold.warning > 0.0 && threshold.warning != threshold.critical {
            let mut warning =
                AlertCondition::greater_than(WARNING_REF_ID, datasource, expr, threshold.warning);
            warning.operator = Some(AlertOperator::Or);
            conditions.push(warning);
        }

        let notifications = if threshold.notify {
            vec![AlertNotification {
                id: notification_channel,
            }]
        } else {
            Vec::new()
        };

        Self {
            name: format!("Alert for {}", metric_name),
            message: format!("{} is outside acceptable range", metric_name),
            handler: 1,
            no_data_state: "no_data".to_string(),
            execution_error_state: "alerting".to_string(),
            frequency: EVALUATION_FREQUENCY.to_string(),
            pending: PENDING_DURATION.to_string(),
            conditions,
            notifications,
        }
    }
}
