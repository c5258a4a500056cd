use crate::{PromdashError, PromdashResult};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Placeholder substituted with the metric name in expression templates
pub const DEFAULT_DELIMITER: &str = ":METRIC:";

/// Legend used when a metric carries no labels and no per-type fallback is set
pub const DEFAULT_LEGEND: &str = "Job:[{{job}}]";

/// Root configuration for dashboard generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromdashConfig {
    /// Dashboard metadata
    pub dashboard: DashboardConfig,

    /// Query expression templates and legends
    pub query: QueryConfig,

    /// Vendor detection and grouping
    pub vendor: VendorConfig,

    /// Label-based panel grouping
    pub label_grouping: LabelGroupingConfig,

    /// Visualization selection
    pub visualization: VisualizationConfig,

    /// Alert generation
    pub alerts: AlertConfig,
}

/// Dashboard metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dashboard title
    pub title: String,

    /// Dashboard description
    pub description: String,

    /// Dashboard tags
    pub tags: Vec<String>,

    /// Timezone used by the dashboard
    pub timezone: String,

    /// Start of the default time range
    pub time_from: String,

    /// End of the default time range
    pub time_to: String,

    /// Auto-refresh interval
    pub refresh: String,

    /// Render graph legends as tables with current values
    pub table_legend: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Prometheus Metrics".to_string(),
            description: String::new(),
            tags: vec!["prometheus".to_string(), "generated".to_string()],
            timezone: "browser".to_string(),
            time_from: "now-6h".to_string(),
            time_to: "now".to_string(),
            refresh: "30s".to_string(),
            table_legend: false,
        }
    }
}

/// Query expression templates and per-type fallback legends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Token replaced by the metric name in templates
    pub delimiter: String,

    /// Template for counter metrics
    pub counter_expr: String,

    /// Template for gauge metrics
    pub gauge_expr: String,

    /// Template for summary and histogram metrics
    pub summary_expr: String,

    /// Legend for label-less counters
    pub counter_legend: String,

    /// Legend for label-less gauges
    pub gauge_legend: String,

    /// Legend for label-less summaries
    pub summary_legend: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            counter_expr: "sum(rate(:METRIC: [1m]))".to_string(),
            gauge_expr: ":METRIC:".to_string(),
            summary_expr: "sum(rate(:METRIC:_sum[1m])) / sum(rate(:METRIC:_count[1m]))"
                .to_string(),
            counter_legend: String::new(),
            gauge_legend: String::new(),
            summary_legend: String::new(),
        }
    }
}

/// Vendor detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Enable vendor detection
    pub enabled: bool,

    /// Organize the dashboard into one row per vendor
    pub group_by_vendor: bool,

    /// Prefixes of known vendors, e.g. `cisco_`
    pub known_prefixes: Vec<String>,

    /// Additional site-specific prefixes
    pub custom_prefixes: Vec<String>,

    /// Enable Juniper-specific enrichment
    pub juniper_enabled: bool,

    /// Enable Cisco-specific enrichment
    pub cisco_enabled: bool,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            group_by_vendor: false,
            known_prefixes: [
                "juniper_",
                "cisco_",
                "arista_",
                "huawei_",
                "paloalto_",
                "fortinet_",
                "f5_",
                "checkpoint_",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            custom_prefixes: Vec::new(),
            juniper_enabled: true,
            cisco_enabled: true,
        }
    }
}

impl VendorConfig {
    /// Whether vendor-specific enrichment runs for the given vendor code
    pub fn enrichment_enabled(&self, vendor: &str) -> bool {
        match vendor {
            "juniper" => self.juniper_enabled,
            "cisco" => self.cisco_enabled,
            _ => false,
        }
    }
}

/// Label-based grouping configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelGroupingConfig {
    /// Label names used to build group keys
    pub group_by_labels: Vec<String>,

    /// Emit a row header in front of every group
    pub separate_rows: bool,

    /// Panels per grid row; zero or negative means unset
    pub panels_per_row: i32,
}

/// Visualization selection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Render gauges with the gauge widget
    pub gauges: bool,

    /// Render gauges with at most one label as stat panels
    pub use_stat_for_gauges: bool,

    /// Render `_bucket` histograms as heatmaps
    pub use_heatmap_for_histograms: bool,

    /// Override for counter metrics
    pub counter: Option<String>,

    /// Override for gauge metrics
    pub gauge: Option<String>,

    /// Override for summary metrics
    pub summary: Option<String>,

    /// Override for every metric type without its own override
    pub default: Option<String>,
}

/// Alert generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Attach heuristic alerts to panels
    pub enabled: bool,

    /// Datasource name referenced by alert targets
    pub datasource: String,

    /// Notification channel id used when an alert notifies
    pub notification_channel: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            datasource: "Prometheus".to_string(),
            notification_channel: 1,
        }
    }
}

impl PromdashConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> PromdashResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROMDASH_*` overrides resolved through `lookup`
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(title) = lookup("PROMDASH_TITLE") {
            self.dashboard.title = title;
        }
        if let Some(description) = lookup("PROMDASH_DESCRIPTION") {
            self.dashboard.description = description;
        }
        if let Some(enabled) = lookup("PROMDASH_VENDOR_DETECTION") {
            self.vendor.enabled = enabled.parse().unwrap_or(false);
        }
        if let Some(enabled) = lookup("PROMDASH_ALERTS") {
            self.alerts.enabled = enabled.parse().unwrap_or(false);
        }
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> PromdashResult<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PromdashError::configuration(format!("Failed to read config file: {}", e))
        })?;

        let extension = path.as_ref().extension().and_then(|s| s.to_str());
        let config: Self = match extension {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                PromdashError::configuration(format!("Failed to parse TOML config: {}", e))
            })?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                PromdashError::configuration(format!("Failed to parse YAML config: {}", e))
            })?,
            _ => serde_json::from_str(&content).map_err(|e| {
                PromdashError::configuration(format!("Failed to parse JSON config: {}", e))
            })?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> PromdashResult<()> {
        if self.query.delimiter.is_empty() {
            return Err(PromdashError::configuration(
                "Query delimiter cannot be empty",
            ));
        }

        for (kind, template) in [
            ("counter", &self.query.counter_expr),
            ("gauge", &self.query.gauge_expr),
            ("summary", &self.query.summary_expr),
        ] {
            if !template.is_empty() && !template.contains(&self.query.delimiter) {
                warn!(
                    kind,
                    template = template.as_str(),
                    "Query template does not reference the metric delimiter"
                );
            }
        }

        if self.alerts.enabled && self.alerts.datasource.is_empty() {
            return Err(PromdashError::configuration(
                "Alert datasource required when alert generation is enabled",
            ));
        }

        Ok(())
    }
}

/// Configuration builder for programmatic configuration
#[derive(Debug, Default)]
pub struct PromdashConfigBuilder {
    config: PromdashConfig,
}

impl PromdashConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.dashboard.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.dashboard.description = description.into();
        self
    }

    pub fn counter_expr(mut self, template: impl Into<String>) -> Self {
        self.config.query.counter_expr = template.into();
        self
    }

    pub fn gauge_expr(mut self, template: impl Into<String>) -> Self {
        self.config.query.gauge_expr = template.into();
        self
    }

    pub fn summary_expr(mut self, template: impl Into<String>) -> Self {
        self.config.query.summary_expr = template.into();
        self
    }

    pub fn enable_vendor_detection(mut self, enabled: bool) -> Self {
        self.config.vendor.enabled = enabled;
        self
    }

    pub fn group_by_vendor(mut self, enabled: bool) -> Self {
        self.config.vendor.group_by_vendor = enabled;
        self
    }

    pub fn known_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.vendor.known_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.vendor.custom_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.label_grouping.group_by_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn separate_rows(mut self, enabled: bool) -> Self {
        self.config.label_grouping.separate_rows = enabled;
        self
    }

    pub fn panels_per_row(mut self, count: i32) -> Self {
        self.config.label_grouping.panels_per_row = count;
        self
    }

    pub fn gauges(mut self, enabled: bool) -> Self {
        self.config.visualization.gauges = enabled;
        self
    }

    pub fn use_stat_for_gauges(mut self, enabled: bool) -> Self {
        self.config.visualization.use_stat_for_gauges = enabled;
        self
    }

    pub fn use_heatmap_for_histograms(mut self, enabled: bool) -> Self {
        self.config.visualization.use_heatmap_for_histograms = enabled;
        self
    }

    pub fn enable_alerts(mut self, enabled: bool) -> Self {
        self.config.alerts.enabled = enabled;
        self
    }

    pub fn build(self) -> PromdashResult<PromdashConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
