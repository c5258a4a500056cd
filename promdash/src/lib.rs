//! # Promdash
//!
//! Turns Prometheus exposition text into a Grafana dashboard document.
//!
//! ## Pipeline
//!
//! - **Ingestion**: exposition entries are folded into a name-keyed
//!   [`Registry`], merging `_bucket`/`_sum`/`_count` samples into one metric
//! - **Classification**: vendor, subsystem, category, unit and display name
//!   are derived from names, help text and configured prefixes
//! - **Query composition**: per-type expression templates, or vendor rules
//!   for structured telemetry names
//! - **Layout**: panels placed on a 24-column grid, flat or grouped into rows
//!   by label or by vendor, with optional heuristic alerts
//!
//! ## Example
//!
//! ```rust
//! use promdash::{build_registry, parse_exposition, DashboardAssembler, PromdashConfig};
//!
//! let text = "# TYPE up gauge\nup{job=\"node\"} 1\n";
//! let config = PromdashConfig::default();
//!
//! let entries = parse_exposition(text).filter_map(Result::ok);
//! let registry = build_registry(entries, &config.vendor);
//! let dashboard = DashboardAssembler::new(&config).assemble(&registry);
//!
//! assert_eq!(dashboard.panels[0].targets[0].expr, "up");
//! ```

pub mod alerts;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod exposition;
pub mod ingest;
pub mod layout;
pub mod metric;
pub mod panel;
pub mod promql;
pub mod query;
pub mod registry;

pub use alerts::{alert_threshold, AlertDefinition, AlertThreshold};
pub use classifier::Classifier;
pub use config::*;
pub use dashboard::{Dashboard, DashboardAssembler, DashboardSubmission};
pub use error::*;
pub use exposition::parse_exposition;
pub use ingest::{build_registry, Entry, Ingestor};
pub use layout::{LayoutEngine, LayoutStrategy};
pub use metric::{Metric, MetricType};
pub use panel::{Panel, PanelFactory, Visualization, VisualizationKind};
pub use promql::PromQlBuilder;
pub use query::{ComposedQuery, QueryComposer};
pub use registry::Registry;
