//! Configuration file loading tests

use promdash::{PromdashConfig, PromdashError};
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// Formats
// ============================================================================

#[test]
fn test_load_toml() {
    let file = config_file(
        ".toml",
        r#"
[dashboard]
title = "Edge routers"
tags = ["network"]

[query]
counter_expr = "rate(:METRIC:[5m])"

[vendor]
enabled = true
group_by_vendor = true
custom_prefixes = ["acme_"]

[label_grouping]
group_by_labels = ["job"]
panels_per_row = 3
"#,
    );

    let config = PromdashConfig::from_file(file.path()).unwrap();
    assert_eq!(config.dashboard.title, "Edge routers");
    assert_eq!(config.dashboard.tags, vec!["network"]);
    assert_eq!(config.dashboard.refresh, "30s");
    assert_eq!(config.query.counter_expr, "rate(:METRIC:[5m])");
    assert_eq!(config.query.delimiter, ":METRIC:");
    assert!(config.vendor.group_by_vendor);
    assert_eq!(config.vendor.custom_prefixes, vec!["acme_"]);
    assert!(config.vendor.known_prefixes.contains(&"cisco_".to_string()));
    assert_eq!(config.label_grouping.panels_per_row, 3);
}

#[test]
fn test_load_yaml() {
    let file = config_file(
        ".yaml",
        r#"
visualization:
  gauges: true
  counter: table
alerts:
  enabled: true
  notification_channel: 4
"#,
    );

    let config = PromdashConfig::from_file(file.path()).unwrap();
    assert!(config.visualization.gauges);
    assert_eq!(config.visualization.counter.as_deref(), Some("table"));
    assert!(config.alerts.enabled);
    assert_eq!(config.alerts.datasource, "Prometheus");
    assert_eq!(config.alerts.notification_channel, 4);
}

#[test]
fn test_load_json() {
    let file = config_file(
        ".json",
        r#"{"query": {"delimiter": "$M", "gauge_expr": "max($M)"}}"#,
    );

    let config = PromdashConfig::from_file(file.path()).unwrap();
    assert_eq!(config.query.delimiter, "$M");
    assert_eq!(config.query.gauge_expr, "max($M)");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_file_contents() {
    let file = config_file(".toml", "[dashboard\ntitle = ");
    assert!(matches!(
        PromdashConfig::from_file(file.path()),
        Err(PromdashError::Configuration { .. })
    ));
}

#[test]
fn test_empty_delimiter_rejected_from_file() {
    let file = config_file(".yml", "query:\n  delimiter: \"\"\n");
    let err = PromdashConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("delimiter"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = PromdashConfig::from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(PromdashError::Configuration { .. })));
}
