//! Metric value object and its classification metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unit assigned before any name-based inference runs
pub const DEFAULT_UNIT: &str = "short";

/// Suffixes stripped from sample names to find the owning metric
pub const FAMILY_SUFFIXES: [&str; 3] = ["_bucket", "_sum", "_count"];

/// Prometheus metric types as seen by dashboard generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    /// Summaries and histograms
    Summary,
    #[default]
    Unknown,
}

impl MetricType {
    /// Map a `# TYPE` string onto a metric type; histograms are summary-like
    pub fn from_type_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "counter" => Self::Counter,
            "gauge" => Self::Gauge,
            "summary" | "histogram" => Self::Summary,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Summary => "summary",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named metric with the metadata aggregated over an input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,
    help: String,
    metric_type: MetricType,
    suffix: String,
    suffixes: BTreeSet<String>,
    unit: String,
    labels: BTreeSet<String>,
    vendor: String,
    subsystem: String,
    category: String,
    display_name: String,
}

impl Metric {
    /// Create a metric with no labels, no help and the default unit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            metric_type: MetricType::Unknown,
            suffix: String::new(),
            suffixes: BTreeSet::new(),
            unit: DEFAULT_UNIT.to_string(),
            labels: BTreeSet::new(),
            vendor: String::new(),
            subsystem: String::new(),
            category: String::new(),
            display_name: String::new(),
        }
    }

    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.set_suffix(suffix);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            self.add_label(label);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn set_help(&mut self, help: impl Into<String>) {
        self.help = help.into();
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn set_type(&mut self, metric_type: MetricType) {
        self.metric_type = metric_type;
    }

    /// Most recently observed suffix
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Record `suffix` as the most recent one and remember it in the family set
    pub fn set_suffix(&mut self, suffix: impl Into<String>) {
        let suffix = suffix.into();
        if !suffix.is_empty() {
            self.suffixes.insert(suffix.clone());
        }
        self.suffix = suffix;
    }

    /// Every non-empty suffix observed for this metric
    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }

    /// Whether `_bucket` samples were observed, i.e. this is a histogram family
    pub fn is_histogram(&self) -> bool {
        self.suffix == "_bucket" || self.suffixes.contains("_bucket")
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    /// Label names in sorted order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Name with the most recent suffix re-attached
    pub fn full_name(&self) -> String {
        format!("{}{}", self.name, self.suffix)
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn set_vendor(&mut self, vendor: impl Into<String>) {
        self.vendor = vendor.into();
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn set_subsystem(&mut self, subsystem: impl Into<String>) {
        self.subsystem = subsystem.into();
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Display name, falling back to the metric name
    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    /// Reset everything the classifier derives
    pub(crate) fn clear_classification(&mut self) {
        self.vendor.clear();
        self.subsystem.clear();
        self.category.clear();
        self.display_name.clear();
        self.unit = DEFAULT_UNIT.to_string();
    }
}

/// Split a sample name into its metric name and recognized family suffix
pub fn split_family_suffix(sample_name: &str) -> (&str, &str) {
    for suffix in FAMILY_SUFFIXES {
        if let Some(base) = sample_name.strip_suffix(suffix) {
            if !base.is_empty() {
                return (base, suffix);
            }
        }
    }
    (sample_name, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_strings() {
        assert_eq!(MetricType::from_type_str("counter"), MetricType::Counter);
        assert_eq!(MetricType::from_type_str("GAUGE"), MetricType::Gauge);
        assert_eq!(MetricType::from_type_str("histogram"), MetricType::Summary);
        assert_eq!(MetricType::from_type_str("untyped"), MetricType::Unknown);
    }

    #[test]
    fn test_split_family_suffix() {
        assert_eq!(
            split_family_suffix("http_duration_seconds_bucket"),
            ("http_duration_seconds", "_bucket")
        );
        assert_eq!(split_family_suffix("rpc_sum"), ("rpc", "_sum"));
        assert_eq!(split_family_suffix("up"), ("up", ""));
        assert_eq!(split_family_suffix("_count"), ("_count", ""));
    }

    #[test]
    fn test_labels_are_sorted_and_unique() {
        let metric = Metric::new("up").with_labels(["job", "instance", "job"]);
        let labels: Vec<_> = metric.labels().collect();
        assert_eq!(labels, vec!["instance", "job"]);
        assert_eq!(metric.label_count(), 2);
    }

    #[test]
    fn test_suffix_family_tracking() {
        let mut metric = Metric::new("latency_seconds").with_suffix("_bucket");
        metric.set_suffix("_count");
        assert_eq!(metric.suffix(), "_count");
        assert_eq!(metric.full_name(), "latency_seconds_count");
        assert!(metric.is_histogram());
        assert_eq!(metric.suffixes().collect::<Vec<_>>(), vec!["_bucket", "_count"]);
    }

    #[test]
    fn test_display_name_fallback() {
        let mut metric = Metric::new("node_load1");
        assert_eq!(metric.display_name(), "node_load1");
        metric.set_display_name("load");
        assert_eq!(metric.display_name(), "load");
    }
}
