//! Grid placement of panels under the flat, label-grouped and vendor-grouped
//! strategies.
//!
//! Row headers and metric panels share one coordinate space. Each layout pass
//! owns its own [`GridCursor`], so repeated passes over the same registry
//! yield identical positions.

use crate::config::PromdashConfig;
use crate::metric::Metric;
use crate::panel::{GridPos, Panel, PanelFactory, GRID_WIDTH, PANEL_HEIGHT, ROW_HEADER_HEIGHT};
use crate::registry::Registry;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Vertical distance between two rows of the flat layout
pub const FLAT_ROW_STEP: u32 = 9;

/// Panels per grid row when none is configured
pub const DEFAULT_PANELS_PER_ROW: u32 = 2;

/// Title of the row holding metrics without a vendor
pub const GENERAL_ROW_TITLE: &str = "General Metrics";

const GENERAL_ROW_DESCRIPTION: &str = "General metrics with no vendor prefix";

/// Group for metrics with none of the grouping keys; always placed last
pub const OTHER_GROUP: &str = "other";

const VENDOR_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("juniper", "Juniper Networks"),
    ("cisco", "Cisco Systems"),
    ("arista", "Arista Networks"),
    ("huawei", "Huawei Technologies"),
    ("paloalto", "Palo Alto Networks"),
    ("fortinet", "Fortinet"),
    ("f5", "F5 Networks"),
    ("checkpoint", "Check Point"),
];

/// Human-readable vendor name, falling back to the vendor code
pub fn vendor_display_name(code: &str) -> &str {
    VENDOR_DISPLAY_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// How panels are organized on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    Flat,
    LabelGrouped,
    VendorGrouped,
}

impl LayoutStrategy {
    /// Vendor grouping wins when enabled and at least one vendor was
    /// detected, then label grouping when labels are configured.
    pub fn select(config: &PromdashConfig, registry: &Registry) -> Self {
        let vendor = &config.vendor;
        if vendor.enabled && vendor.group_by_vendor && !registry.vendors().is_empty() {
            Self::VendorGrouped
        } else if !config.label_grouping.group_by_labels.is_empty() {
            Self::LabelGrouped
        } else {
            Self::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::LabelGrouped => "label-grouped",
            Self::VendorGrouped => "vendor-grouped",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next free grid position of one layout pass
#[derive(Debug, Clone)]
pub struct GridCursor {
    y: u32,
    column: u32,
    columns: u32,
    width: u32,
    row_step: u32,
}

impl GridCursor {
    /// Two half-width panels per row, rows `FLAT_ROW_STEP` apart
    pub fn flat() -> Self {
        Self {
            y: 0,
            column: 0,
            columns: DEFAULT_PANELS_PER_ROW,
            width: GRID_WIDTH / DEFAULT_PANELS_PER_ROW,
            row_step: FLAT_ROW_STEP,
        }
    }

    /// `panels_per_row` panels per row; values <= 0 fall back to the default
    pub fn grouped(panels_per_row: i32) -> Self {
        let columns = match u32::try_from(panels_per_row) {
            Ok(0) | Err(_) => DEFAULT_PANELS_PER_ROW,
            Ok(n) => n.min(GRID_WIDTH),
        };

        Self {
            y: 0,
            column: 0,
            columns,
            width: GRID_WIDTH / columns,
            row_step: PANEL_HEIGHT,
        }
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn panel_width(&self) -> u32 {
        self.width
    }

    /// Position the panel in the next free slot, wrapping after a full row
    pub fn place(&mut self, panel: &mut Panel) {
        panel.grid_pos = GridPos::new(self.column * self.width, self.y, self.width, PANEL_HEIGHT);

        self.column += 1;
        if self.column == self.columns {
            self.column = 0;
            self.y += self.row_step;
        }
    }

    /// Position a full-width row header below everything placed so far
    pub fn place_header(&mut self, panel: &mut Panel) {
        self.finish_group();
        panel.grid_pos = GridPos::new(0, self.y, GRID_WIDTH, ROW_HEADER_HEIGHT);
        self.y += ROW_HEADER_HEIGHT;
    }

    /// Move to the start of a fresh row if the current one is partly filled
    pub fn finish_group(&mut self) {
        if self.column > 0 {
            self.column = 0;
            self.y += self.row_step;
        }
    }
}

/// Group key: the configured labels present on the metric, colon-joined
pub fn label_group_key(metric: &Metric, group_by: &[String]) -> String {
    let present: Vec<&str> = group_by
        .iter()
        .map(String::as_str)
        .filter(|label| metric.has_label(label))
        .collect();

    if present.is_empty() {
        OTHER_GROUP.to_string()
    } else {
        present.join(":")
    }
}

/// Sorted groups with the `other` group moved to the end
fn other_last<T>(mut groups: BTreeMap<String, T>) -> Vec<(String, T)> {
    let other = groups.remove(OTHER_GROUP);
    let mut ordered: Vec<(String, T)> = groups.into_iter().collect();
    ordered.extend(other.map(|group| (OTHER_GROUP.to_string(), group)));
    ordered
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds and positions every panel of a dashboard
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine<'a> {
    config: &'a PromdashConfig,
    factory: PanelFactory<'a>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a PromdashConfig) -> Self {
        Self {
            config,
            factory: PanelFactory::new(config),
        }
    }

    /// Panels for every metric in `registry`, in display order
    pub fn layout(&self, strategy: LayoutStrategy, registry: &Registry) -> Vec<Panel> {
        match strategy {
            LayoutStrategy::Flat => self.flat(registry),
            LayoutStrategy::LabelGrouped => self.label_grouped(registry),
            LayoutStrategy::VendorGrouped => self.vendor_grouped(registry),
        }
    }

    fn flat(&self, registry: &Registry) -> Vec<Panel> {
        let mut cursor = GridCursor::flat();
        registry
            .iter()
            .map(|metric| self.metric_panel(&mut cursor, metric))
            .collect()
    }

    fn label_grouped(&self, registry: &Registry) -> Vec<Panel> {
        let grouping = &self.config.label_grouping;
        let mut cursor = self.grouped_cursor();
        let mut panels = Vec::new();

        let mut groups: BTreeMap<String, Vec<&Metric>> = BTreeMap::new();
        for metric in registry {
            groups
                .entry(label_group_key(metric, &grouping.group_by_labels))
                .or_default()
                .push(metric);
        }

        for (key, members) in other_last(groups) {
            if grouping.separate_rows {
                panels.push(self.row_header(
                    &mut cursor,
                    key.replace(':', " "),
                    format!("Metrics grouped by {}", key),
                ));
            }
            self.place_group(&mut cursor, &members, &mut panels);
        }

        panels
    }

    fn vendor_grouped(&self, registry: &Registry) -> Vec<Panel> {
        let mut cursor = self.grouped_cursor();
        let mut panels = Vec::new();

        let general: Vec<&Metric> = registry.iter().filter(|m| m.vendor().is_empty()).collect();
        if !general.is_empty() {
            panels.push(self.row_header(&mut cursor, GENERAL_ROW_TITLE, GENERAL_ROW_DESCRIPTION));
            self.place_group(&mut cursor, &general, &mut panels);
        }

        for vendor in registry.vendors() {
            let members = registry.list_by_vendor(&vendor);
            if members.is_empty() {
                continue;
            }

            let vendor_title = vendor_display_name(&vendor);
            panels.push(self.row_header(
                &mut cursor,
                vendor_title,
                format!("Metrics for {}", vendor_title),
            ));

            let mut categories: BTreeMap<String, Vec<&Metric>> = BTreeMap::new();
            for metric in members {
                let category = match metric.category() {
                    "" => OTHER_GROUP,
                    category => category,
                };
                categories.entry(category.to_string()).or_default().push(metric);
            }

            if categories.len() > 1 {
                for (category, metrics) in other_last(categories) {
                    let category_title = capitalize(&category);
                    let description = format!("{} metrics for {}", category_title, vendor_title);
                    panels.push(self.row_header(&mut cursor, category_title, description));
                    self.place_group(&mut cursor, &metrics, &mut panels);
                }
            } else {
                for metrics in categories.values() {
                    self.place_group(&mut cursor, metrics, &mut panels);
                }
            }
        }

        panels
    }

    fn grouped_cursor(&self) -> GridCursor {
        let panels_per_row = self.config.label_grouping.panels_per_row;
        let cursor = GridCursor::grouped(panels_per_row);
        if panels_per_row < 0 || panels_per_row > GRID_WIDTH as i32 {
            warn!(
                panels_per_row,
                width = cursor.panel_width(),
                "panels_per_row out of range, using panel width {}",
                cursor.panel_width()
            );
        }
        cursor
    }

    fn place_group(&self, cursor: &mut GridCursor, metrics: &[&Metric], panels: &mut Vec<Panel>) {
        for metric in metrics {
            panels.push(self.metric_panel(cursor, metric));
        }
        cursor.finish_group();
    }

    fn metric_panel(&self, cursor: &mut GridCursor, metric: &Metric) -> Panel {
        let mut panel = self.factory.build(metric);
        cursor.place(&mut panel);
        debug!(
            metric = metric.name(),
            x = panel.grid_pos.x,
            y = panel.grid_pos.y,
            kind = panel.visualization.type_name(),
            "Placed panel"
        );
        panel
    }

    fn row_header(
        &self,
        cursor: &mut GridCursor,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Panel {
        let mut panel = Panel::row(title, description);
        cursor.place_header(&mut panel);
        panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromdashConfigBuilder;
    use crate::metric::MetricType;

    fn metric(name: &str, labels: &[&str]) -> Metric {
        Metric::new(name)
            .with_type(MetricType::Gauge)
            .with_labels(labels.iter().copied())
    }

    fn vendored(name: &str, vendor: &str, category: &str) -> Metric {
        let mut metric = Metric::new(name).with_type(MetricType::Gauge);
        metric.set_vendor(vendor);
        metric.set_category(category);
        metric
    }

    fn titles(panels: &[Panel]) -> Vec<&str> {
        panels.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_strategy_selection() {
        let mut registry: Registry = [metric("up", &["job"])].into_iter().collect();

        let flat = PromdashConfigBuilder::new().build().unwrap();
        assert_eq!(LayoutStrategy::select(&flat, &registry), LayoutStrategy::Flat);

        let labels = PromdashConfigBuilder::new()
            .group_by_labels(["job"])
            .enable_vendor_detection(true)
            .group_by_vendor(true)
            .build()
            .unwrap();
        assert_eq!(
            LayoutStrategy::select(&labels, &registry),
            LayoutStrategy::LabelGrouped
        );

        registry.insert(vendored("cisco_cpu", "cisco", "cpu"));
        assert_eq!(
            LayoutStrategy::select(&labels, &registry),
            LayoutStrategy::VendorGrouped
        );
    }

    #[test]
    fn test_flat_layout_alternates_columns() {
        let config = PromdashConfig::default();
        let registry: Registry = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|name| metric(name, &[]))
            .collect();

        let panels = LayoutEngine::new(&config).layout(LayoutStrategy::Flat, &registry);
        let positions: Vec<(u32, u32)> = panels.iter().map(|p| (p.grid_pos.x, p.grid_pos.y)).collect();
        assert_eq!(positions, vec![(0, 0), (12, 0), (0, 9), (12, 9), (0, 18)]);
        assert!(panels.iter().all(|p| p.grid_pos.w == 12 && p.grid_pos.h == 8));
    }

    #[test]
    fn test_grouped_cursor_degrades_invalid_widths() {
        assert_eq!(GridCursor::grouped(0).panel_width(), 12);
        assert_eq!(GridCursor::grouped(-4).panel_width(), 12);
        assert_eq!(GridCursor::grouped(3).panel_width(), 8);
        assert_eq!(GridCursor::grouped(100).panel_width(), 1);
    }

    #[test]
    fn test_cursor_wraps_and_finishes_group() {
        let mut cursor = GridCursor::grouped(3);
        let mut panel = Panel::row("", "");
        let mut xs = Vec::new();
        for _ in 0..4 {
            cursor.place(&mut panel);
            xs.push((panel.grid_pos.x, panel.grid_pos.y));
        }
        assert_eq!(xs, vec![(0, 0), (8, 0), (16, 0), (0, 8)]);

        cursor.place_header(&mut panel);
        assert_eq!(panel.grid_pos, GridPos::new(0, 16, 24, 1));
        assert_eq!(cursor.y(), 17);
    }

    #[test]
    fn test_label_group_key() {
        let group_by = vec!["instance".to_string(), "job".to_string()];
        assert_eq!(label_group_key(&metric("a", &["job", "instance"]), &group_by), "instance:job");
        assert_eq!(label_group_key(&metric("b", &["job"]), &group_by), "job");
        assert_eq!(label_group_key(&metric("c", &["zone"]), &group_by), "other");
    }

    #[test]
    fn test_label_grouped_rows_with_other_last() {
        let config = PromdashConfigBuilder::new()
            .group_by_labels(["instance", "job"])
            .separate_rows(true)
            .panels_per_row(3)
            .build()
            .unwrap();
        let registry: Registry = [
            metric("a_free", &[]),
            metric("b_up", &["job"]),
            metric("c_load", &["instance", "job"]),
            metric("d_mem", &["job"]),
        ]
        .into_iter()
        .collect();

        let panels = LayoutEngine::new(&config).layout(LayoutStrategy::LabelGrouped, &registry);
        assert_eq!(
            titles(&panels),
            vec!["instance job", "c load", "job", "b up", "d mem", "other", "a free"]
        );

        assert_eq!(panels[0].description, "Metrics grouped by instance:job");
        assert_eq!(panels[0].grid_pos, GridPos::new(0, 0, 24, 1));
        assert_eq!(panels[1].grid_pos, GridPos::new(0, 1, 8, 8));
        assert_eq!(panels[2].grid_pos.y, 9);
        assert_eq!(panels[4].grid_pos, GridPos::new(8, 10, 8, 8));
        assert_eq!(panels[5].grid_pos.y, 18);
    }

    #[test]
    fn test_label_grouped_without_rows() {
        let config = PromdashConfigBuilder::new()
            .group_by_labels(["job"])
            .build()
            .unwrap();
        let registry: Registry = [metric("a", &["job"]), metric("b", &[])].into_iter().collect();

        let panels = LayoutEngine::new(&config).layout(LayoutStrategy::LabelGrouped, &registry);
        assert!(panels.iter().all(|p| !p.is_row()));
        assert_eq!(panels[0].grid_pos, GridPos::new(0, 0, 12, 8));
        assert_eq!(panels[1].grid_pos, GridPos::new(0, 8, 12, 8));
    }

    #[test]
    fn test_vendor_grouped_order_and_category_rows() {
        let config = PromdashConfigBuilder::new()
            .enable_vendor_detection(true)
            .group_by_vendor(true)
            .build()
            .unwrap();
        let registry: Registry = [
            metric("node_load1", &[]),
            vendored("juniper_bgp_peers", "juniper", "bgp"),
            vendored("juniper_misc", "juniper", ""),
            vendored("juniper_cpu_util", "juniper", "cpu"),
            vendored("arista_fan_speed", "arista", ""),
            vendored("cisco_cpu_load", "cisco", "cpu"),
        ]
        .into_iter()
        .collect();

        let panels = LayoutEngine::new(&config).layout(LayoutStrategy::VendorGrouped, &registry);
        assert_eq!(
            titles(&panels),
            vec![
                "General Metrics",
                "node load1",
                "Arista Networks",
                "arista fan speed",
                "Cisco Systems",
                "cisco cpu load",
                "Juniper Networks",
                "Bgp",
                "juniper bgp peers",
                "Cpu",
                "juniper cpu util",
                "Other",
                "juniper misc",
            ]
        );
        assert_eq!(panels[7].description, "Bgp metrics for Juniper Networks");

        let rows: Vec<u32> = panels.iter().filter(|p| p.is_row()).map(|p| p.grid_pos.y).collect();
        assert_eq!(rows, vec![0, 9, 18, 27, 28, 37, 46]);
    }

    #[test]
    fn test_vendor_grouped_without_general_metrics() {
        let config = PromdashConfig::default();
        let registry: Registry = [vendored("f5_pool_members", "f5", "")].into_iter().collect();
        let panels = LayoutEngine::new(&config).layout(LayoutStrategy::VendorGrouped, &registry);
        assert_eq!(titles(&panels), vec!["F5 Networks", "f5 pool members"]);
    }

    #[test]
    fn test_vendor_display_name_fallback() {
        assert_eq!(vendor_display_name("paloalto"), "Palo Alto Networks");
        assert_eq!(vendor_display_name("acme"), "acme");
    }

    #[test]
    fn test_layout_is_reproducible() {
        let config = PromdashConfigBuilder::new()
            .group_by_labels(["job"])
            .separate_rows(true)
            .build()
            .unwrap();
        let registry: Registry = [metric("x", &["job"]), metric("y", &[]), metric("z", &["job"])]
            .into_iter()
            .collect();
        let engine = LayoutEngine::new(&config);
        assert_eq!(
            engine.layout(LayoutStrategy::LabelGrouped, &registry),
            engine.layout(LayoutStrategy::LabelGrouped, &registry)
        );
    }
}
