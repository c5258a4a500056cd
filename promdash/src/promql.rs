//! Fluent construction of PromQL expressions.

use std::collections::BTreeMap;
use std::fmt::Display;

/// Builds PromQL expressions from a metric name, selectors and functions
#[derive(Debug, Clone, Default)]
pub struct PromQlBuilder {
    metric: String,
    selectors: BTreeMap<String, String>,
    functions: Vec<String>,
    range: Option<String>,
    group_by: Vec<String>,
    offset: Option<String>,
}

impl PromQlBuilder {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Self::default()
        }
    }

    /// Add an equality label selector
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selectors.insert(key.into(), value.into());
        self
    }

    /// Wrap the expression in a function; functions added later wrap outermost
    pub fn with_function(mut self, name: &str) -> Self {
        self.functions.push(name.to_string());
        self
    }

    /// Wrap the expression in a function whose leading arguments precede it
    pub fn with_function_args<A: Display>(mut self, name: &str, args: &[A]) -> Self {
        if args.is_empty() {
            return self.with_function(name);
        }
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.functions.push(format!("{}({})", name, args.join(",")));
        self
    }

    /// Apply `rate()` over the given range window
    pub fn with_rate(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self.with_function("rate")
    }

    pub fn with_group_by<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn build(&self) -> String {
        let mut query = self.metric.clone();

        if !self.selectors.is_empty() {
            let selectors: Vec<String> = self
                .selectors
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, v))
                .collect();
            query = format!("{}{{{}}}", query, selectors.join(","));
        }

        if let Some(range) = &self.range {
            query = format!("{}[{}]", query, range);
        }

        if let Some(offset) = &self.offset {
            query = format!("{} offset {}", query, offset);
        }

        for function in &self.functions {
            query = match function.strip_suffix(')') {
                Some(head) => format!("{},{})", head, query),
                None => format!("{}({})", function, query),
            };
        }

        if !self.group_by.is_empty() {
            query = format!("{} by ({})", query, self.group_by.join(","));
        }

        query
    }
}

/// `rate(<metric>[<range>])`
pub fn rate_query(metric: &str, range: &str) -> String {
    PromQlBuilder::new(metric).with_rate(range).build()
}
