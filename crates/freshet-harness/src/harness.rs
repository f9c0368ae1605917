//! The chainable harness facade.
//!
//! [`HarnessBuilder`] is the unconfigured state: the only thing it can do
//! is bind a topology definition, which produces a [`Harness`]. The
//! configured harness accumulates inputs, store declarations, and
//! configuration overrides through consuming builder calls, and serves
//! read-backs that each trigger a fresh, independent run over everything
//! accumulated so far. State only grows; there is no reset.
//!
//! # Example
//!
//! ```
//! use freshet_core::StringCodec;
//! use freshet_harness::HarnessBuilder;
//!
//! let harness = HarnessBuilder::new()
//!     .topology(|t| {
//!         t.stream("words")
//!             .map(|key, value| Ok((key.to_vec(), value.to_ascii_uppercase())))
//!             .to("shouted");
//!     })
//!     .input(
//!         "words",
//!         &StringCodec,
//!         &StringCodec,
//!         vec![("a".to_string(), "hello".to_string())],
//!     );
//!
//! let out = harness
//!     .output("shouted", &StringCodec, &StringCodec, 1)
//!     .unwrap();
//! assert_eq!(out, vec![("a".to_string(), "HELLO".to_string())]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use freshet_core::{Codec, CodecError, FlowResult, InputRegistry, Record, TopologyBuilder};

use crate::config::EffectiveConfig;
use crate::error::HarnessError;
use crate::{extract, guard, runner};

/// Caller-supplied topology definition.
///
/// Invoked exactly once per run against a fresh construction context; the
/// harness never inspects what it builds.
pub type TopologyDef = Arc<dyn Fn(&mut TopologyBuilder) + Send + Sync>;

/// The unconfigured harness: no topology bound yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct HarnessBuilder;

impl HarnessBuilder {
    /// Creates an unconfigured harness.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Binds the topology definition, transitioning to the configured
    /// state. There is no way back.
    #[must_use]
    pub fn topology(self, def: impl Fn(&mut TopologyBuilder) + Send + Sync + 'static) -> Harness {
        Harness {
            def: Arc::new(def),
            inputs: InputRegistry::new(),
            stores: Vec::new(),
            overrides: BTreeMap::new(),
            pending: None,
        }
    }
}

/// The configured harness.
///
/// Builder calls consume and return the facade; read-backs borrow it, so a
/// test can keep reading and then accumulate more input. Every read-back
/// re-runs the topology from scratch over the accumulated inputs, which
/// makes consecutive reads with no intervening mutation identical.
pub struct Harness {
    def: TopologyDef,
    inputs: InputRegistry,
    /// Declared store names, first-declaration order, deduplicated.
    stores: Vec<String>,
    overrides: BTreeMap<String, String>,
    /// First input-encoding failure, reported by the next read.
    pending: Option<CodecError>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("input_records", &self.inputs.record_count())
            .field("stores", &self.stores)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Replaces the topology definition. Last write wins; previously
    /// accumulated inputs, stores, and config are kept.
    #[must_use]
    pub fn topology(mut self, def: impl Fn(&mut TopologyBuilder) + Send + Sync + 'static) -> Self {
        self.def = Arc::new(def);
        self
    }

    /// Appends typed records to the named input channel.
    ///
    /// Records are encoded immediately. An encode failure drops the whole
    /// batch and is reported by the next read; the chain itself never
    /// breaks.
    #[must_use]
    pub fn input<K, V>(
        mut self,
        channel: &str,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
        records: Vec<(K, V)>,
    ) -> Self {
        let records = records.into_iter().map(|(k, v)| (k, v, None));
        self.push_records(channel, key_codec, value_codec, records);
        self
    }

    /// Appends typed records carrying explicit event timestamps.
    #[must_use]
    pub fn input_at<K, V>(
        mut self,
        channel: &str,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
        records: Vec<(K, V, i64)>,
    ) -> Self {
        let records = records.into_iter().map(|(k, v, ts)| (k, v, Some(ts)));
        self.push_records(channel, key_codec, value_codec, records);
        self
    }

    fn push_records<K, V>(
        &mut self,
        channel: &str,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
        records: impl IntoIterator<Item = (K, V, Option<i64>)>,
    ) {
        let mut encoded = Vec::new();
        for (key, value, timestamp) in records {
            let key_bytes = match key_codec.encode(&key) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.pending.get_or_insert(e);
                    return;
                }
            };
            let value_bytes = match value_codec.encode(&value) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.pending.get_or_insert(e);
                    return;
                }
            };
            encoded.push(Record {
                key: key_bytes,
                value: value_bytes,
                timestamp,
            });
        }
        self.inputs.append(channel, encoded);
    }

    /// Declares the stores that must be readable after a run.
    ///
    /// The runtime registers stores before execution; a topology node that
    /// references an undeclared store fails the run.
    #[must_use]
    pub fn stores<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.stores.contains(&name) {
                self.stores.push(name);
            }
        }
        self
    }

    /// Applies configuration overrides on top of harness defaults, last
    /// write wins per key.
    #[must_use]
    pub fn config<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.overrides.extend(overrides);
        self
    }

    fn run(&self) -> Result<FlowResult, HarnessError> {
        if let Some(e) = &self.pending {
            return Err(e.clone().into());
        }
        let config = EffectiveConfig::merge(&self.overrides);
        runner::run(&self.def, &self.inputs, &self.stores, &config)
    }

    /// Up to `n` records emitted on the named output channel, in emission
    /// order. Fewer than `n` is not an error.
    ///
    /// # Errors
    ///
    /// `ExpectedOutputIsEmpty` when `n` is zero, `NoInputSpecified` when no
    /// input record has been supplied, plus any runtime or codec failure.
    pub fn output<K, V>(
        &self,
        channel: &str,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
        n: usize,
    ) -> Result<Vec<(K, V)>, HarnessError> {
        guard::require_positive_size(n)?;
        guard::require_input_present(&self.inputs)?;
        let result = self.run()?;
        extract::output(&result, channel, key_codec, value_codec, n)
    }

    /// The same drain as [`Harness::output`], folded last-write-wins into
    /// a table by key.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Harness::output`].
    pub fn output_table<K: Ord, V>(
        &self,
        channel: &str,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
        n: usize,
    ) -> Result<BTreeMap<K, V>, HarnessError> {
        guard::require_positive_size(n)?;
        guard::require_input_present(&self.inputs)?;
        let result = self.run()?;
        extract::output_table(&result, channel, key_codec, value_codec, n)
    }

    /// Full post-run snapshot of a declared store.
    ///
    /// # Errors
    ///
    /// `NoInputSpecified` when no input record has been supplied,
    /// `StoreNotRegistered` for an undeclared name, plus any runtime or
    /// codec failure.
    pub fn state_table<K: Ord, V>(
        &self,
        store: &str,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
    ) -> Result<BTreeMap<K, V>, HarnessError> {
        guard::require_input_present(&self.inputs)?;
        let result = self.run()?;
        extract::state_table(&result, store, key_codec, value_codec)
    }

    /// Post-run snapshot of a windowed store, filtered to one key and
    /// mapped by window start.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Harness::state_table`].
    pub fn window_state_table<K, V>(
        &self,
        store: &str,
        key: &K,
        key_codec: &impl Codec<K>,
        value_codec: &impl Codec<V>,
    ) -> Result<BTreeMap<i64, V>, HarnessError> {
        guard::require_input_present(&self.inputs)?;
        let result = self.run()?;
        extract::window_state_table(&result, store, key, key_codec, value_codec)
    }
}
