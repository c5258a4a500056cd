//! Registry construction from parsed exposition entries.

use crate::classifier::Classifier;
use crate::config::VendorConfig;
use crate::metric::{split_family_suffix, MetricType};
use crate::registry::Registry;
use crate::{PromdashError, PromdashResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Label holding a sample's metric name
pub const NAME_LABEL: &str = "__name__";

/// One parsed unit of exposition input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Documentation for a metric name
    Help { name: String, help: String },
    /// Declared type of a metric name
    Type { name: String, metric_type: String },
    /// A sample occurrence; `__name__` carries the sample name
    Sample { labels: BTreeMap<String, String> },
}

impl Entry {
    pub fn help(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Help {
            name: name.into(),
            help: help.into(),
        }
    }

    pub fn metric_type(name: impl Into<String>, metric_type: impl Into<String>) -> Self {
        Self::Type {
            name: name.into(),
            metric_type: metric_type.into(),
        }
    }

    /// Sample named `name` with the given label names and values
    pub fn sample<I, K, V>(name: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut labels: BTreeMap<String, String> = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        labels.insert(NAME_LABEL.to_string(), name.to_string());
        Self::Sample { labels }
    }
}

/// Accumulates entries into a registry and classifies it once complete
#[derive(Debug)]
pub struct Ingestor<'a> {
    registry: Registry,
    classifier: Classifier<'a>,
}

impl<'a> Ingestor<'a> {
    pub fn new(vendor: &'a VendorConfig) -> Self {
        Self {
            registry: Registry::new(),
            classifier: Classifier::new(vendor),
        }
    }

    /// Apply one entry; an entry without a metric name is rejected untouched
    pub fn ingest(&mut self, entry: Entry) -> PromdashResult<()> {
        match entry {
            Entry::Help { name, help } => {
                if name.is_empty() {
                    return Err(PromdashError::malformed_entry(
                        "HELP entry has an empty metric name",
                    ));
                }
                self.registry.entry(&name).set_help(help);
            }
            Entry::Type { name, metric_type } => {
                if name.is_empty() {
                    return Err(PromdashError::malformed_entry(
                        "TYPE entry has an empty metric name",
                    ));
                }
                self.registry
                    .entry(&name)
                    .set_type(MetricType::from_type_str(&metric_type));
            }
            Entry::Sample { labels } => {
                let sample_name = match labels.get(NAME_LABEL) {
                    Some(name) if !name.is_empty() => name,
                    Some(_) => {
                        return Err(PromdashError::malformed_entry(
                            "sample has an empty metric name",
                        ))
                    }
                    None => {
                        return Err(PromdashError::malformed_entry(format!(
                            "sample has no {} label",
                            NAME_LABEL
                        )))
                    }
                };

                let (name, suffix) = split_family_suffix(sample_name);
                let metric = self.registry.entry(name);
                metric.set_suffix(suffix);
                for label in labels.keys() {
                    if label != NAME_LABEL && !label.is_empty() {
                        metric.add_label(label.as_str());
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply every entry, skipping malformed ones; returns how many were skipped
    pub fn ingest_all<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut skipped = 0;
        for entry in entries {
            if let Err(e) = self.ingest(entry) {
                warn!("Skipping entry: {}", e);
                skipped += 1;
            }
        }
        skipped
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Classify every metric and hand over the finished registry
    pub fn finish(mut self) -> Registry {
        for metric in self.registry.iter_mut() {
            self.classifier.classify(metric);
        }
        debug!(metrics = self.registry.len(), "Ingestion finished");
        self.registry
    }
}

/// Build a classified registry from `entries`, skipping malformed ones
pub fn build_registry<I>(entries: I, vendor: &VendorConfig) -> Registry
where
    I: IntoIterator<Item = Entry>,
{
    let mut ingestor = Ingestor::new(vendor);
    ingestor.ingest_all(entries);
    ingestor.finish()
}
