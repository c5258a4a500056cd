//! Vendor, subsystem, category and unit classification.
//!
//! Every heuristic is an ordered table evaluated top to bottom; the first
//! entry whose cue matches wins. Classification is a pure function of the
//! metric's name, help text and type plus the vendor configuration, so
//! running it twice yields the same result.

use crate::config::VendorConfig;
use crate::metric::{Metric, MetricType};
use tracing::debug;

/// Help-text marker emitted by the structured telemetry collector
pub const TELEMETRY_MARKER: &str = "JTIMON Metric";

/// Vendor tag assigned to structured telemetry metrics
pub const TELEMETRY_VENDOR: &str = "juniper";

/// Substring cues mapped to an outcome; any needle matching selects the entry
struct Cue {
    needles: &'static [&'static str],
    outcome: &'static str,
}

const fn cue(needles: &'static [&'static str], outcome: &'static str) -> Cue {
    Cue { needles, outcome }
}

/// Unit inference applied to every metric
const BASE_UNIT_CUES: &[Cue] = &[
    cue(&["_seconds"], "s"),
    cue(&["_milliseconds"], "ms"),
    cue(&["_bytes"], "decbytes"),
    cue(&["_percent", "_ratio"], "percent"),
    cue(&["_count"], "short"),
];

const COMPONENT_CATEGORY_CUES: &[Cue] = &[
    cue(&["_cpu_"], "cpu"),
    cue(&["_memory_"], "memory"),
    cue(&["_temperature_"], "temperature"),
    cue(&["_transceiver_"], "transceiver"),
    cue(&["_power_"], "power"),
];

const INTERFACE_CATEGORY_CUES: &[Cue] = &[
    cue(&["_ethernet_"], "ethernet"),
    cue(&["_aggregation_"], "lag"),
    cue(&["_counters_"], "counters"),
];

/// Structured telemetry subsystems that carry a category table
const SUBSYSTEM_CATEGORY_TABLES: &[(&str, &[Cue])] = &[
    ("components", COMPONENT_CATEGORY_CUES),
    ("interfaces", INTERFACE_CATEGORY_CUES),
];

const TELEMETRY_UNIT_CUES: &[Cue] = &[
    cue(&["_cpu_", "_utilization_"], "percent"),
    cue(&["_power_"], "dbm"),
    cue(&["_temperature_"], "celsius"),
    cue(&["_bytes", "_octets"], "decbytes"),
    cue(&["_bits_"], "decbits"),
    cue(&["_speed"], "bps"),
    cue(&["_packets", "_frames"], "pps"),
    cue(&["_memory_"], "bytes"),
    cue(&["_counters_"], "short"),
];

const TELEMETRY_INTERFACE_CATEGORY_CUES: &[Cue] = &[
    cue(&["_error", "_discard"], "errors"),
    cue(&["_counters_"], "counters"),
    cue(&["_state_"], "state"),
    cue(&["_statistics_"], "statistics"),
];

const LEGACY_RATE_UNIT_CUES: &[Cue] = &[
    cue(&["bps", "bitrate"], "bps"),
    cue(&["pps", "packetrate"], "pps"),
];

/// Category rule for flat, prefix-named vendor metrics
struct CategoryRule {
    name_cue: &'static str,
    subsystem_cue: Option<&'static str>,
    category: &'static str,
    unit: Option<&'static str>,
}

const fn rule(
    name_cue: &'static str,
    subsystem_cue: Option<&'static str>,
    category: &'static str,
) -> CategoryRule {
    CategoryRule {
        name_cue,
        subsystem_cue,
        category,
        unit: None,
    }
}

const LEGACY_CATEGORY_RULES: &[CategoryRule] = &[
    rule("interface", None, "interfaces"),
    rule("bgp", Some("bgp"), "bgp"),
    rule("ospf", Some("ospf"), "ospf"),
    rule("route", Some("route"), "routing"),
    rule("memory", Some("memory"), "memory"),
    rule("cpu", Some("cpu"), "cpu"),
];

const TEMPERATURE_RULE: CategoryRule = CategoryRule {
    name_cue: "temperature",
    subsystem_cue: Some("temp"),
    category: "temperature",
    unit: Some("celsius"),
};

fn first_match(cues: &[Cue], haystack: &str) -> Option<&'static str> {
    cues.iter()
        .find(|c| c.needles.iter().any(|n| haystack.contains(n)))
        .map(|c| c.outcome)
}

impl CategoryRule {
    fn matches(&self, name: &str, subsystem: &str) -> bool {
        name.contains(self.name_cue)
            || self
                .subsystem_cue
                .map(|cue| subsystem.contains(cue))
                .unwrap_or(false)
    }
}

/// Vendor-specific enrichment passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Enrichment {
    Juniper,
    Cisco,
}

impl Enrichment {
    fn for_vendor(vendor: &str) -> Option<Self> {
        match vendor {
            "juniper" => Some(Self::Juniper),
            "cisco" => Some(Self::Cisco),
            _ => None,
        }
    }
}

/// Whether a name encodes a nested telemetry path rather than a flat name
pub fn is_structured_name(name: &str) -> bool {
    name.starts_with('_')
}

/// Unit implied by common Prometheus naming conventions
pub fn base_unit(name: &str) -> Option<&'static str> {
    first_match(BASE_UNIT_CUES, name)
}

/// Derives classification metadata for metrics
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a VendorConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a VendorConfig) -> Self {
        Self { config }
    }

    /// Set vendor, subsystem, category, unit and display name on `metric`
    pub fn classify(&self, metric: &mut Metric) {
        metric.clear_classification();

        if let Some(unit) = base_unit(metric.name()) {
            metric.set_unit(unit);
        }

        if !self.config.enabled {
            return;
        }

        self.detect_vendor(metric);

        let enrichment = Enrichment::for_vendor(metric.vendor())
            .filter(|_| self.config.enrichment_enabled(metric.vendor()));
        match enrichment {
            Some(Enrichment::Juniper) if is_structured_name(metric.name()) => {
                enrich_structured(metric)
            }
            Some(Enrichment::Juniper) => enrich_legacy(metric, true),
            Some(Enrichment::Cisco) => enrich_legacy(metric, false),
            None => {}
        }

        debug!(
            metric = metric.name(),
            vendor = metric.vendor(),
            subsystem = metric.subsystem(),
            category = metric.category(),
            unit = metric.unit(),
            "Classified metric"
        );
    }

    fn detect_vendor(&self, metric: &mut Metric) {
        if metric.help().contains(TELEMETRY_MARKER) || is_structured_name(metric.name()) {
            detect_structured(metric);
            return;
        }

        let lowered = metric.name().to_ascii_lowercase();

        if let Some(prefix) = matching_prefix(&self.config.known_prefixes, &lowered) {
            let remainder = &metric.name()[prefix.len()..];
            let subsystem = remainder.split('_').next().unwrap_or_default().to_string();
            metric.set_vendor(vendor_code(&prefix));
            metric.set_subsystem(subsystem);
            return;
        }

        if let Some(prefix) = matching_prefix(&self.config.custom_prefixes, &lowered) {
            metric.set_vendor(vendor_code(&prefix));
        }
    }
}

fn matching_prefix(prefixes: &[String], lowered_name: &str) -> Option<String> {
    prefixes
        .iter()
        .map(|p| p.to_ascii_lowercase())
        .find(|p| !p.is_empty() && lowered_name.starts_with(p.as_str()))
}

fn vendor_code(prefix: &str) -> String {
    prefix.strip_suffix('_').unwrap_or(prefix).to_string()
}

/// Marker-only names get the vendor; path-shaped names also get a subsystem
fn detect_structured(metric: &mut Metric) {
    metric.set_vendor(TELEMETRY_VENDOR);
    if !is_structured_name(metric.name()) {
        return;
    }

    let path = metric.name().trim_start_matches('_');
    let subsystem = path.split('_').next().unwrap_or_default().to_string();

    let category = SUBSYSTEM_CATEGORY_TABLES
        .iter()
        .find(|(name, _)| *name == subsystem)
        .and_then(|(_, cues)| first_match(cues, metric.name()));

    if let Some(category) = category {
        metric.set_category(category);
    }
    metric.set_subsystem(subsystem);
}

fn enrich_structured(metric: &mut Metric) {
    let name = metric.name().to_string();

    if let Some(unit) = first_match(TELEMETRY_UNIT_CUES, &name) {
        metric.set_unit(unit);
    }

    if metric.subsystem() == "interfaces" && metric.category().is_empty() {
        if let Some(category) = first_match(TELEMETRY_INTERFACE_CATEGORY_CUES, &name) {
            metric.set_category(category);
        }
    }

    let display = name.strip_suffix("_instant").unwrap_or(&name).to_string();
    metric.set_display_name(display);
}

fn enrich_legacy(metric: &mut Metric, juniper: bool) {
    let name = metric.name().to_string();
    let subsystem = metric.subsystem().to_string();

    let temperature = juniper.then_some(&TEMPERATURE_RULE);
    let rule = LEGACY_CATEGORY_RULES
        .iter()
        .chain(temperature)
        .find(|r| r.matches(&name, &subsystem));

    if let Some(rule) = rule {
        metric.set_category(rule.category);
        if let Some(unit) = rule.unit {
            metric.set_unit(unit);
        }
    }

    if !juniper {
        return;
    }

    if let Some(unit) = first_match(LEGACY_RATE_UNIT_CUES, &name) {
        metric.set_unit(unit);
    } else if (name.contains("error") || name.contains("discard"))
        && metric.metric_type() == MetricType::Counter
    {
        metric.set_category("errors");
    }

    metric.set_display_name(name.strip_suffix("_instant").unwrap_or(&name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_config() -> VendorConfig {
        VendorConfig {
            enabled: true,
            group_by_vendor: true,
            known_prefixes: vec!["juniper_".to_string(), "cisco_".to_string()],
            custom_prefixes: vec!["acme_".to_string()],
            juniper_enabled: true,
            cisco_enabled: true,
        }
    }

    fn classified(metric: Metric, config: &VendorConfig) -> Metric {
        let mut metric = metric;
        Classifier::new(config).classify(&mut metric);
        metric
    }

    #[test]
    fn test_base_units() {
        assert_eq!(base_unit("http_request_duration_seconds"), Some("s"));
        assert_eq!(base_unit("gc_pause_milliseconds"), Some("ms"));
        assert_eq!(base_unit("process_resident_memory_bytes"), Some("decbytes"));
        assert_eq!(base_unit("cache_hit_ratio"), Some("percent"));
        assert_eq!(base_unit("up"), None);
    }

    #[test]
    fn test_detection_disabled_only_infers_units() {
        let config = VendorConfig::default();
        let config = VendorConfig {
            enabled: false,
            ..config
        };
        let metric = classified(Metric::new("_components_cpu_utilization_seconds"), &config);
        assert_eq!(metric.vendor(), "");
        assert_eq!(metric.unit(), "s");
    }

    #[test]
    fn test_structured_components_metric() {
        let metric = Metric::new("_components_cpu_utilization_instant")
            .with_help("JTIMON Metric for cpu")
            .with_type(MetricType::Gauge);
        let metric = classified(metric, &vendor_config());

        assert_eq!(metric.vendor(), "juniper");
        assert_eq!(metric.subsystem(), "components");
        assert_eq!(metric.category(), "cpu");
        assert_eq!(metric.unit(), "percent");
        assert_eq!(metric.display_name(), "_components_cpu_utilization");
    }

    #[test]
    fn test_structured_interface_category_from_enrichment() {
        let metric = classified(
            Metric::new("_interfaces_interface_state_in_errors"),
            &vendor_config(),
        );
        assert_eq!(metric.subsystem(), "interfaces");
        assert_eq!(metric.category(), "errors");

        let metric = classified(
            Metric::new("_interfaces_interface_state_counters_in_octets"),
            &vendor_config(),
        );
        assert_eq!(metric.category(), "counters");
        assert_eq!(metric.unit(), "decbytes");
    }

    #[test]
    fn test_marker_in_help_uses_flat_name_rules() {
        let metric = Metric::new("interfaces_interface_mtu").with_help("JTIMON Metric");
        let metric = classified(metric, &vendor_config());
        assert_eq!(metric.vendor(), "juniper");
        assert_eq!(metric.subsystem(), "");
        assert_eq!(metric.category(), "interfaces");
    }

    #[test]
    fn test_marker_only_name_skips_subsystem_rules() {
        let metric = Metric::new("temp_sensor").with_help("JTIMON Metric");
        let metric = classified(metric, &vendor_config());
        assert_eq!(metric.vendor(), "juniper");
        assert_eq!(metric.subsystem(), "");
        assert_eq!(metric.category(), "");
        assert_eq!(metric.unit(), "short");
        assert_eq!(metric.display_name(), "temp_sensor");
    }

    #[test]
    fn test_known_prefix_sets_subsystem() {
        let metric = classified(Metric::new("Cisco_bgp_peers_up"), &vendor_config());
        assert_eq!(metric.vendor(), "cisco");
        assert_eq!(metric.subsystem(), "bgp");
        assert_eq!(metric.category(), "bgp");
    }

    #[test]
    fn test_custom_prefix_sets_vendor_only() {
        let metric = classified(Metric::new("acme_widget_total"), &vendor_config());
        assert_eq!(metric.vendor(), "acme");
        assert_eq!(metric.subsystem(), "");
    }

    #[test]
    fn test_legacy_juniper_rules() {
        let metric = classified(
            Metric::new("juniper_chassis_temperature_celsius"),
            &vendor_config(),
        );
        assert_eq!(metric.category(), "temperature");
        assert_eq!(metric.unit(), "celsius");

        let metric = classified(
            Metric::new("juniper_port_bitrate").with_type(MetricType::Gauge),
            &vendor_config(),
        );
        assert_eq!(metric.unit(), "bps");

        let metric = classified(
            Metric::new("juniper_port_discards_total").with_type(MetricType::Counter),
            &vendor_config(),
        );
        assert_eq!(metric.category(), "errors");
    }

    #[test]
    fn test_cisco_has_no_temperature_rule() {
        let metric = classified(
            Metric::new("cisco_env_temperature_celsius"),
            &vendor_config(),
        );
        assert_eq!(metric.vendor(), "cisco");
        assert_eq!(metric.category(), "");
        assert_eq!(metric.unit(), "short");
    }

    #[test]
    fn test_enrichment_toggle() {
        let config = VendorConfig {
            juniper_enabled: false,
            ..vendor_config()
        };
        let metric = classified(Metric::new("_components_cpu_utilization_instant"), &config);
        assert_eq!(metric.vendor(), "juniper");
        assert_eq!(metric.category(), "cpu");
        assert_eq!(metric.unit(), "short");
        assert_eq!(metric.display_name(), "_components_cpu_utilization_instant");
    }

    #[test]
    fn test_classification_is_idempotent() {
        let config = vendor_config();
        let names = [
            "_components_cpu_utilization_instant",
            "_interfaces_interface_state_in_discards",
            "juniper_bgp_session_errors_total",
            "cisco_interface_bytes",
            "node_memory_usage",
        ];

        for name in names {
            let once = classified(Metric::new(name).with_type(MetricType::Counter), &config);
            let twice = classified(once.clone(), &config);
            assert_eq!(once, twice, "classification of {name} changed on rerun");
        }
    }
}
