use crate::config::PromdashConfig;
use crate::layout::{LayoutEngine, LayoutStrategy};
use crate::panel::Panel;
use crate::registry::Registry;
use crate::{PromdashError, PromdashResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Refresh intervals offered by the time picker
pub const REFRESH_INTERVALS: [&str; 10] = [
    "5s", "10s", "30s", "1m", "5m", "15m", "30m", "1h", "2h", "1d",
];

/// Relative ranges offered by the time picker
pub const TIME_OPTIONS: [&str; 12] = [
    "5m", "15m", "1h", "3h", "6h", "12h", "24h", "2d", "3d", "4d", "7d", "30d",
];

/// Dashboard schema version emitted
pub const SCHEMA_VERSION: u32 = 22;

/// Time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

/// Time picker options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePicker {
    pub refresh_intervals: Vec<String>,
    pub time_options: Vec<String>,
}

impl Default for TimePicker {
    fn default() -> Self {
        Self {
            refresh_intervals: REFRESH_INTERVALS.iter().map(|s| s.to_string()).collect(),
            time_options: TIME_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Dashboard document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    pub timezone: String,
    pub editable: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub graph_tooltip: u32,
    pub panels: Vec<Panel>,
    pub time: TimeRange,
    pub timepicker: TimePicker,
    pub refresh: String,
    pub schema_version: u32,
    pub version: u32,
}

impl Dashboard {
    /// Empty dashboard with default metadata
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            uid: None,
            title: title.into(),
            tags: vec!["prometheus".to_string(), "generated".to_string()],
            timezone: "browser".to_string(),
            editable: true,
            description: String::new(),
            graph_tooltip: 0,
            panels: Vec::new(),
            time: TimeRange {
                from: "now-6h".to_string(),
                to: "now".to_string(),
            },
            timepicker: TimePicker::default(),
            refresh: "30s".to_string(),
            schema_version: SCHEMA_VERSION,
            version: 0,
        }
    }

    /// Append a panel, assigning the next sequential id starting at 1
    pub fn add_panel(&mut self, mut panel: Panel) {
        panel.id = self.panels.len() as u32 + 1;
        self.panels.push(panel);
    }

    /// Metric panels only, without row headers
    pub fn metric_panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter().filter(|p| !p.is_row())
    }

    /// Serialize the dashboard to JSON
    pub fn to_json(&self, pretty: bool) -> PromdashResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };

        json.map_err(|e| PromdashError::dashboard(format!("Failed to serialize dashboard: {}", e)))
    }
}

/// Payload accepted by a dashboarding backend's create-or-update endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSubmission {
    pub dashboard: Dashboard,
    pub folder_id: u32,
    pub overwrite: bool,
}

impl DashboardSubmission {
    /// Wrap `dashboard` for the general folder, replacing any existing copy
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            folder_id: 0,
            overwrite: true,
        }
    }

    pub fn with_folder(mut self, folder_id: u32) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn to_json(&self, pretty: bool) -> PromdashResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };

        json.map_err(|e| PromdashError::dashboard(format!("Failed to serialize submission: {}", e)))
    }
}

/// Turns a classified registry into a finished dashboard
#[derive(Debug, Clone, Copy)]
pub struct DashboardAssembler<'a> {
    config: &'a PromdashConfig,
}

impl<'a> DashboardAssembler<'a> {
    pub fn new(config: &'a PromdashConfig) -> Self {
        Self { config }
    }

    pub fn assemble(&self, registry: &Registry) -> Dashboard {
        let settings = &self.config.dashboard;
        let strategy = LayoutStrategy::select(self.config, registry);

        info!(
            title = settings.title.as_str(),
            metrics = registry.len(),
            %strategy,
            "Assembling dashboard"
        );

        let mut dashboard = Dashboard::new(settings.title.clone());
        dashboard.description = settings.description.clone();
        dashboard.tags = settings.tags.clone();
        dashboard.timezone = settings.timezone.clone();
        dashboard.time = TimeRange {
            from: settings.time_from.clone(),
            to: settings.time_to.clone(),
        };
        dashboard.refresh = settings.refresh.clone();

        for panel in LayoutEngine::new(self.config).layout(strategy, registry) {
            dashboard.add_panel(panel);
        }

        info!(
            panels = dashboard.panels.len(),
            alerts = dashboard.metric_panels().filter(|p| p.alert.is_some()).count(),
            "Dashboard assembled"
        );

        dashboard
    }
}
