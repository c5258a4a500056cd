//! Name-keyed metric collection with deterministic, sorted traversal.

use crate::metric::{Metric, MetricType};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

/// Collection of metrics keyed by name
///
/// Enumeration is always in lexicographic name order so dashboard layout is
/// reproducible regardless of input order. Filtering produces new
/// registries and never touches the source.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    metrics: BTreeMap<String, Metric>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a metric under its own name
    pub fn insert(&mut self, metric: Metric) -> Option<Metric> {
        self.metrics.insert(metric.name().to_string(), metric)
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Metric> {
        self.metrics.get_mut(name)
    }

    /// Fetch a metric, creating an empty one when absent
    pub fn entry(&mut self, name: &str) -> &mut Metric {
        self.metrics
            .entry(name.to_string())
            .or_insert_with(|| Metric::new(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Sorted metric names
    pub fn names(&self) -> Vec<&str> {
        self.metrics.keys().map(String::as_str).collect()
    }

    /// Metrics in name order
    pub fn iter(&self) -> btree_map::Values<'_, String, Metric> {
        self.metrics.values()
    }

    pub(crate) fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, String, Metric> {
        self.metrics.values_mut()
    }

    pub fn list_by_type(&self, metric_type: MetricType) -> Vec<&Metric> {
        self.iter()
            .filter(|m| m.metric_type() == metric_type)
            .collect()
    }

    pub fn list_by_vendor(&self, vendor: &str) -> Vec<&Metric> {
        self.iter().filter(|m| m.vendor() == vendor).collect()
    }

    /// Distinct non-empty vendor codes in sorted order
    pub fn vendors(&self) -> Vec<String> {
        self.iter()
            .map(Metric::vendor)
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// New registry holding clones of the metrics accepted by `predicate`
    pub fn filter<F>(&self, mut predicate: F) -> Registry
    where
        F: FnMut(&Metric) -> bool,
    {
        Registry {
            metrics: self
                .metrics
                .iter()
                .filter(|&(_, metric)| predicate(metric))
                .map(|(name, metric)| (name.clone(), metric.clone()))
                .collect(),
        }
    }

    pub fn filter_by_vendor(&self, vendor: &str) -> Registry {
        self.filter(|m| m.vendor() == vendor)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Metric;
    type IntoIter = btree_map::Values<'a, String, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Metric> for Registry {
    fn from_iter<T: IntoIterator<Item = Metric>>(iter: T) -> Self {
        let mut registry = Registry::new();
        for metric in iter {
            registry.insert(metric);
        }
        registry
    }
}
