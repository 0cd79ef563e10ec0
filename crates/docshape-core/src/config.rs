//! Analyzer configuration and environment overrides.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sampling and truncation limits for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Documents sampled from each top-level sub-collection.
    pub max_docs: usize,
    /// Upper bound on documents sampled from nested sub-collections.
    pub nested_max_docs: usize,
    /// Documents echoed verbatim into `sample_documents`.
    pub max_sample_documents: usize,
    /// Characters kept from long string samples.
    pub string_sample_limit: usize,
    /// Elements kept from primitive array samples.
    pub array_sample_limit: usize,
    /// Elements inspected when classifying an array.
    pub array_inspect_limit: usize,
    /// Map nesting depth below which nested fields are still analyzed.
    pub max_field_depth: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_docs: 10,
            nested_max_docs: 5,
            max_sample_documents: 3,
            string_sample_limit: 100,
            array_sample_limit: 3,
            array_inspect_limit: 5,
            max_field_depth: 64,
        }
    }
}

impl AnalyzerConfig {
    /// Create configuration from environment and defaults.
    ///
    /// Reads `DOCSHAPE_MAX_DOCS`, `DOCSHAPE_NESTED_MAX_DOCS` and
    /// `DOCSHAPE_MAX_FIELD_DEPTH`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "DOCSHAPE_MAX_DOCS")? {
            config.max_docs = v;
        }
        if let Some(v) = parse_var(&lookup, "DOCSHAPE_NESTED_MAX_DOCS")? {
            config.nested_max_docs = v;
        }
        if let Some(v) = parse_var(&lookup, "DOCSHAPE_MAX_FIELD_DEPTH")? {
            config.max_field_depth = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make the analysis meaningless.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("max_docs", self.max_docs),
            ("nested_max_docs", self.nested_max_docs),
            ("string_sample_limit", self.string_sample_limit),
            ("array_sample_limit", self.array_sample_limit),
            ("array_inspect_limit", self.array_inspect_limit),
            ("max_field_depth", self.max_field_depth),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    /// Sample size for a child collection whose parent sampled `parent_max_docs`.
    pub fn child_max_docs(&self, parent_max_docs: usize) -> usize {
        parent_max_docs.min(self.nested_max_docs).max(1)
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} is not a valid count: {:?}", key, raw))),
    }
}
