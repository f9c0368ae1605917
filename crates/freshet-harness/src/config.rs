//! Effective configuration assembly.
//!
//! Harness defaults overlaid with caller overrides, key by key, last write
//! wins. The only built-in default is the timestamp policy: sequence-based
//! logical time, never the wall clock, so runs stay reproducible.

use std::collections::BTreeMap;

use freshet_core::{FlowError, TimestampPolicy};

/// Configuration key selecting the timestamp-extraction policy.
///
/// Recognized values: `sequence` (default), `zero`, `record`.
pub const TIMESTAMP_POLICY: &str = "timestamp.policy";

/// Merged configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    entries: BTreeMap<String, String>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self::merge(&BTreeMap::new())
    }
}

impl EffectiveConfig {
    /// Harness defaults with `overrides` applied key by key.
    #[must_use]
    pub fn merge(overrides: &BTreeMap<String, String>) -> Self {
        let mut entries = Self::defaults();
        for (key, value) in overrides {
            entries.insert(key.clone(), value.clone());
        }
        Self { entries }
    }

    fn defaults() -> BTreeMap<String, String> {
        BTreeMap::from([(TIMESTAMP_POLICY.to_string(), "sequence".to_string())])
    }

    /// Looks up a merged value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Parses the timestamp policy from the merged entries.
    ///
    /// Parsing happens at run time, not at `config()` time, so an invalid
    /// override fails the triggering read the same way any other runtime
    /// error would.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::UnknownTimestampPolicy` for unrecognized values.
    pub fn timestamp_policy(&self) -> Result<TimestampPolicy, FlowError> {
        match self.get(TIMESTAMP_POLICY) {
            Some(value) => TimestampPolicy::parse(value),
            None => Ok(TimestampPolicy::default()),
        }
    }
}
