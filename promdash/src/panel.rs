//! Dashboard panels, visualization kinds and the panel factory.

use crate::alerts::{alert_threshold, AlertDefinition};
use crate::config::{PromdashConfig, VisualizationConfig};
use crate::metric::{Metric, MetricType};
use crate::query::QueryComposer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Columns in the dashboard grid
pub const GRID_WIDTH: u32 = 24;

/// Height of a row-header panel
pub const ROW_HEADER_HEIGHT: u32 = 1;

/// Height of a metric panel
pub const PANEL_HEIGHT: u32 = 8;

/// Query result format for time series targets
const TIME_SERIES_FORMAT: &str = "time_series";

/// Position of a panel in the dashboard grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridPos {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// One query of a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub ref_id: String,
    pub expr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub legend_format: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
}

/// Visualization kinds selectable for metric panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizationKind {
    Graph,
    Gauge,
    Stat,
    Table,
    Heatmap,
    BarGauge,
}

impl VisualizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Gauge => "gauge",
            Self::Stat => "stat",
            Self::Table => "table",
            Self::Heatmap => "heatmap",
            Self::BarGauge => "bargauge",
        }
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" | "timeseries" => Ok(Self::Graph),
            "gauge" => Ok(Self::Gauge),
            "stat" => Ok(Self::Stat),
            "table" => Ok(Self::Table),
            "heatmap" => Ok(Self::Heatmap),
            "bargauge" | "bar-gauge" | "bar_gauge" => Ok(Self::BarGauge),
            other => Err(format!("unknown visualization '{}'", other)),
        }
    }
}

/// Legend settings of graph panels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub show: bool,
    pub current: bool,
    pub values: bool,
    pub align_as_table: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub format: String,
    pub log_base: u32,
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XAxis {
    pub mode: String,
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    pub bars: bool,
    pub lines: bool,
    pub linewidth: u32,
    pub fill: u32,
    pub points: bool,
    pub dashes: bool,
    pub legend: Legend,
    pub yaxes: Vec<Axis>,
    pub xaxis: XAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceOptions {
    pub calcs: Vec<String>,
    pub values: bool,
}

impl ReduceOptions {
    fn calc(calc: &str, values: bool) -> Self {
        Self {
            calcs: vec![calc.to_string()],
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeOptions {
    pub reduce_options: ReduceOptions,
    pub show_threshold_labels: bool,
    pub show_threshold_markers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatOptions {
    pub reduce_options: ReduceOptions,
    pub color_mode: String,
    pub graph_mode: String,
    pub text_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarGaugeOptions {
    pub reduce_options: ReduceOptions,
    pub orientation: String,
    pub display_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSort {
    pub col: u32,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    pub columns: Vec<TableColumn>,
    pub transform: String,
    pub sort: TableSort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapColor {
    pub mode: String,
    pub card_color: String,
    pub color_scale: String,
    pub exponent: f64,
    pub min: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapSettings {
    pub data_format: String,
    pub hide_zero_buckets: bool,
    pub highlight_cards: bool,
    pub color: HeatmapColor,
    pub x_axis: XAxis,
    pub y_axis: Axis,
}

/// Visualization of a panel, with the settings specific to each kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Visualization {
    Graph(GraphSettings),
    Gauge { options: GaugeOptions },
    Stat { options: StatOptions },
    Table(TableSettings),
    Heatmap(HeatmapSettings),
    #[serde(rename = "bargauge")]
    BarGauge { options: BarGaugeOptions },
    /// Group separator spanning the full grid width
    Row { collapsed: bool },
}

impl Visualization {
    /// Grafana panel type string
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Graph(_) => "graph",
            Self::Gauge { .. } => "gauge",
            Self::Stat { .. } => "stat",
            Self::Table(_) => "table",
            Self::Heatmap(_) => "heatmap",
            Self::BarGauge { .. } => "bargauge",
            Self::Row { .. } => "row",
        }
    }

    pub fn is_row(&self) -> bool {
        matches!(self, Self::Row { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStep {
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDefaults {
    pub unit: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ThresholdStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub defaults: FieldDefaults,
}

/// One visualization unit of a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub grid_pos: GridPos,
    #[serde(flatten)]
    pub visualization: Visualization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_config: Option<FieldConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertDefinition>,
}

impl Panel {
    /// Full-width header separating a group of panels
    pub fn row(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            grid_pos: GridPos::new(0, 0, GRID_WIDTH, ROW_HEADER_HEIGHT),
            visualization: Visualization::Row { collapsed: false },
            field_config: None,
            targets: Vec::new(),
            datasource: None,
            alert: None,
        }
    }

    pub fn is_row(&self) -> bool {
        self.visualization.is_row()
    }

    pub fn unit(&self) -> Option<&str> {
        self.field_config
            .as_ref()
            .map(|config| config.defaults.unit.as_str())
    }

    /// Attach `alert`, adding a target for every condition the panel lacks
    pub fn attach_alert(&mut self, alert: AlertDefinition) {
        for condition in &alert.conditions {
            let target = &condition.target;
            if self.targets.iter().any(|t| t.ref_id == target.ref_id) {
                continue;
            }
            self.targets.push(Target {
                ref_id: target.ref_id.clone(),
                expr: target.expr.clone(),
                legend_format: String::new(),
                format: TIME_SERIES_FORMAT.to_string(),
                datasource: Some(target.datasource.clone()),
            });
        }

        self.datasource = alert
            .conditions
            .first()
            .map(|c| c.target.datasource.clone());
        self.alert = Some(alert);
    }
}

/// Title for a metric panel: display name with underscores as spaces, trimmed
pub fn panel_title(metric: &Metric) -> String {
    metric.display_name().replace('_', " ").trim().to_string()
}

/// Pick the visualization kind for a metric
///
/// Per-type overrides win over the default override, which wins over the
/// built-in rules. Unrecognized override strings are ignored.
pub fn select_visualization(metric: &Metric, config: &VisualizationConfig) -> VisualizationKind {
    let type_override = match metric.metric_type() {
        MetricType::Counter => config.counter.as_deref(),
        MetricType::Gauge => config.gauge.as_deref(),
        MetricType::Summary => config.summary.as_deref(),
        MetricType::Unknown => None,
    };

    for value in [type_override, config.default.as_deref()].into_iter().flatten() {
        match value.parse() {
            Ok(kind) => return kind,
            Err(e) => warn!(metric = metric.name(), "Ignoring visualization override: {}", e),
        }
    }

    match metric.metric_type() {
        MetricType::Gauge if config.gauges => VisualizationKind::Gauge,
        MetricType::Gauge if config.use_stat_for_gauges && metric.label_count() <= 1 => {
            VisualizationKind::Stat
        }
        MetricType::Summary if metric.is_histogram() && config.use_heatmap_for_histograms => {
            VisualizationKind::Heatmap
        }
        _ => VisualizationKind::Graph,
    }
}

fn threshold_steps(metric: &Metric) -> Vec<ThresholdStep> {
    let levels: &[(f64, &str)] = match metric.metric_type() {
        MetricType::Counter => &[(0.0, "green"), (100.0, "orange"), (500.0, "red")],
        MetricType::Gauge if metric.unit() == "percent" => {
            &[(0.0, "green"), (80.0, "orange"), (90.0, "red")]
        }
        MetricType::Gauge => &[(0.0, "green"), (70.0, "orange"), (90.0, "red")],
        _ => &[],
    };

    levels
        .iter()
        .map(|(value, color)| ThresholdStep {
            value: *value,
            color: color.to_string(),
        })
        .collect()
}

/// Build the settings payload for `kind`
pub fn visualization_for(
    kind: VisualizationKind,
    metric: &Metric,
    table_legend: bool,
) -> Visualization {
    match kind {
        VisualizationKind::Graph => Visualization::Graph(GraphSettings {
            bars: false,
            lines: true,
            linewidth: 1,
            fill: 1,
            points: false,
            dashes: false,
            legend: Legend {
                show: true,
                current: table_legend,
                values: table_legend,
                align_as_table: table_legend,
            },
            yaxes: vec![
                Axis {
                    format: metric.unit().to_string(),
                    log_base: 1,
                    show: true,
                },
                Axis {
                    format: metric.unit().to_string(),
                    log_base: 1,
                    show: false,
                },
            ],
            xaxis: XAxis {
                mode: "time".to_string(),
                show: true,
            },
        }),
        VisualizationKind::Gauge => Visualization::Gauge {
            options: GaugeOptions {
                reduce_options: ReduceOptions::calc("lastNotNull", false),
                show_threshold_labels: true,
                show_threshold_markers: true,
            },
        },
        VisualizationKind::Stat => Visualization::Stat {
            options: StatOptions {
                reduce_options: ReduceOptions::calc("lastNotNull", false),
                color_mode: "value".to_string(),
                graph_mode: "area".to_string(),
                text_mode: "auto".to_string(),
            },
        },
        VisualizationKind::BarGauge => Visualization::BarGauge {
            options: BarGaugeOptions {
                reduce_options: ReduceOptions::calc("lastNotNull", false),
                orientation: "horizontal".to_string(),
                display_mode: "gradient".to_string(),
            },
        },
        VisualizationKind::Table => {
            let mut columns = vec![
                TableColumn {
                    text: "Time".to_string(),
                    value: "time".to_string(),
                },
                TableColumn {
                    text: "Value".to_string(),
                    value: "value".to_string(),
                },
            ];
            columns.extend(metric.labels().map(|label| TableColumn {
                text: label.to_string(),
                value: format!("label_{}", label),
            }));
            Visualization::Table(TableSettings {
                columns,
                transform: "timeseries_to_columns".to_string(),
                sort: TableSort { col: 0, desc: true },
            })
        }
        VisualizationKind::Heatmap => Visualization::Heatmap(HeatmapSettings {
            data_format: "tsbuckets".to_string(),
            hide_zero_buckets: true,
            highlight_cards: true,
            color: HeatmapColor {
                mode: "spectrum".to_string(),
                card_color: "#b4ff00".to_string(),
                color_scale: "sqrt".to_string(),
                exponent: 0.5,
                min: 0,
            },
            x_axis: XAxis {
                mode: "histogram".to_string(),
                show: true,
            },
            y_axis: Axis {
                format: metric.unit().to_string(),
                log_base: 1,
                show: true,
            },
        }),
    }
}

/// Builds metric panels from classified metrics
#[derive(Debug, Clone, Copy)]
pub struct PanelFactory<'a> {
    config: &'a PromdashConfig,
}

impl<'a> PanelFactory<'a> {
    pub fn new(config: &'a PromdashConfig) -> Self {
        Self { config }
    }

    /// Panel for `metric`, positioned at the grid origin
    pub fn build(&self, metric: &Metric) -> Panel {
        let query = QueryComposer::new(&self.config.query).compose(metric);
        let kind = select_visualization(metric, &self.config.visualization);

        let thresholds = match kind {
            VisualizationKind::Stat | VisualizationKind::BarGauge => threshold_steps(metric),
            _ => Vec::new(),
        };

        let mut panel = Panel {
            id: 0,
            title: panel_title(metric),
            description: metric.help().to_string(),
            grid_pos: GridPos::new(0, 0, GRID_WIDTH / 2, PANEL_HEIGHT),
            visualization: visualization_for(kind, metric, self.config.dashboard.table_legend),
            field_config: Some(FieldConfig {
                defaults: FieldDefaults {
                    unit: metric.unit().to_string(),
                    thresholds,
                },
            }),
            targets: vec![Target {
                ref_id: crate::alerts::CRITICAL_REF_ID.to_string(),
                expr: query.expr.clone(),
                legend_format: query.legend,
                format: TIME_SERIES_FORMAT.to_string(),
                datasource: None,
            }],
            datasource: None,
            alert: None,
        };

        let alerts = &self.config.alerts;
        if alerts.enabled {
            if let Some(threshold) = alert_threshold(metric) {
                panel.attach_alert(AlertDefinition::new(
                    metric.name(),
                    &query.expr,
                    &threshold,
                    &alerts.datasource,
                    alerts.notification_channel,
                ));
            }
        }

        panel
    }
}
