//! One-shot topology execution.
//!
//! A [`Flow`] is a single execution pass: it is created with a topology,
//! the declared store names, and a timestamp policy; it replays every
//! pending input record; and it is consumed by [`Flow::run`], which returns
//! a [`FlowResult`] of per-channel emissions and per-store snapshots.
//!
//! Replay order is fixed: channels in first-registration order, records
//! within a channel in registration order, no cross-channel interleaving.
//! There are no threads and no clocks, so a run is deterministic for a
//! fixed topology, input set, and policy.

use std::collections::BTreeMap;

use bytes::Bytes;
use fxhash::FxHashMap;

use crate::error::FlowError;
use crate::record::{InputRegistry, OutputSet, Record};
use crate::state::{InMemoryStore, StateStore};
use crate::time::{TimestampAssigner, TimestampPolicy, WindowKey};
use crate::topology::{Node, NodeId, NodeKind, Topology};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowMetrics {
    /// Records fed from input channels.
    pub records_in: u64,
    /// Records emitted onto output channels.
    pub records_out: u64,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct FlowResult {
    outputs: OutputSet,
    stores: FxHashMap<String, BTreeMap<Vec<u8>, Bytes>>,
    metrics: FlowMetrics,
}

impl FlowResult {
    /// Emission-ordered records of a named output channel.
    ///
    /// A channel the topology never wrote to reads back as an empty slice.
    #[must_use]
    pub fn output_records(&self, channel: &str) -> &[Record] {
        self.outputs.records(channel)
    }

    /// Final contents of a registered store, or `None` for a name that was
    /// never registered.
    #[must_use]
    pub fn store(&self, name: &str) -> Option<&BTreeMap<Vec<u8>, Bytes>> {
        self.stores.get(name)
    }

    /// Counters observed during the run.
    #[must_use]
    pub fn metrics(&self) -> FlowMetrics {
        self.metrics
    }
}

/// A single execution pass over a topology.
///
/// One flow per extraction: create, feed, drain, discard. Nothing survives
/// the pass, so consecutive runs over the same inputs cannot influence each
/// other.
pub struct Flow<'t> {
    topology: &'t Topology,
    stores: FxHashMap<String, Box<dyn StateStore>>,
    outputs: OutputSet,
    assigner: TimestampAssigner,
    metrics: FlowMetrics,
}

impl<'t> Flow<'t> {
    /// Creates an execution context with one fresh store per declared name.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::StoreNotRegistered` when the topology references
    /// a store outside `store_names`.
    pub fn new(
        topology: &'t Topology,
        store_names: &[String],
        policy: TimestampPolicy,
    ) -> Result<Self, FlowError> {
        let mut stores: FxHashMap<String, Box<dyn StateStore>> = FxHashMap::default();
        for name in store_names {
            stores.insert(name.clone(), Box::new(InMemoryStore::new()));
        }
        for name in topology.referenced_stores() {
            if !stores.contains_key(name) {
                return Err(FlowError::StoreNotRegistered(name.to_string()));
            }
        }
        Ok(Self {
            topology,
            stores,
            outputs: OutputSet::default(),
            assigner: TimestampAssigner::new(policy),
            metrics: FlowMetrics::default(),
        })
    }

    /// Replays every pending input record and returns the collected
    /// results.
    ///
    /// # Errors
    ///
    /// Propagates the first operator, codec, or timestamp failure; the
    /// context is discarded either way.
    pub fn run(mut self, inputs: &InputRegistry) -> Result<FlowResult, FlowError> {
        for (channel, records) in inputs.channels() {
            let sources = self.topology.sources_for(channel);
            tracing::debug!(
                channel,
                records = records.len(),
                sources = sources.len(),
                "replaying input channel"
            );
            for record in records {
                let ts = self.assigner.assign(record.timestamp)?;
                self.metrics.records_in += 1;
                for &source in &sources {
                    self.deliver(source, source, &record.key, &record.value, ts)?;
                }
            }
        }

        let stores: FxHashMap<String, BTreeMap<Vec<u8>, Bytes>> = self
            .stores
            .iter()
            .map(|(name, store)| (name.clone(), store.snapshot()))
            .collect();
        tracing::debug!(
            records_in = self.metrics.records_in,
            records_out = self.metrics.records_out,
            "flow complete"
        );
        Ok(FlowResult {
            outputs: self.outputs,
            stores,
            metrics: self.metrics,
        })
    }

    /// Processes one record at `id` and pushes whatever it emits to the
    /// node's downstream connections.
    fn deliver(
        &mut self,
        id: NodeId,
        from: NodeId,
        key: &[u8],
        value: &[u8],
        ts: i64,
    ) -> Result<(), FlowError> {
        let topology: &'t Topology = self.topology;
        let node = &topology.nodes[id.0 as usize];
        match &node.kind {
            NodeKind::Source { .. } => self.fan_out(node, key, value, ts),
            NodeKind::Map { f } => {
                let (mapped_key, mapped_value) = f(key, value)?;
                self.fan_out(node, &mapped_key, &mapped_value, ts)
            }
            NodeKind::Filter { f } => {
                if f(key, value)? {
                    self.fan_out(node, key, value, ts)
                } else {
                    Ok(())
                }
            }
            NodeKind::Table { store } => {
                self.store_mut(store)?.put(key, value);
                self.fan_out(node, key, value, ts)
            }
            NodeKind::Aggregate { store, f } => {
                let acc = self.store(store)?.get(key);
                let next = f(acc.as_deref(), key, value)?;
                self.store_mut(store)?.put(key, &next);
                self.fan_out(node, key, &next, ts)
            }
            NodeKind::WindowAggregate { store, window, f } => {
                let window_key = WindowKey {
                    start: window.start_for(ts),
                    key: key.to_vec(),
                }
                .encode();
                let acc = self.store(store)?.get(&window_key);
                let next = f(acc.as_deref(), key, value)?;
                self.store_mut(store)?.put(&window_key, &next);
                self.fan_out(node, key, &next, ts)
            }
            NodeKind::Join {
                left,
                left_store,
                right_store,
                f,
            } => {
                // A join has exactly two parents; anything not the left
                // table is the right one.
                let from_left = from == *left;
                let other_store = if from_left { right_store } else { left_store };
                let Some(other) = self.store(other_store)?.get(key) else {
                    return Ok(());
                };
                let joined = if from_left {
                    f(value, &other)?
                } else {
                    f(&other, value)?
                };
                self.fan_out(node, key, &joined, ts)
            }
            NodeKind::Sink { channel } => {
                self.outputs
                    .push(channel, Record::with_timestamp(key.to_vec(), value.to_vec(), ts));
                self.metrics.records_out += 1;
                Ok(())
            }
        }
    }

    fn fan_out(
        &mut self,
        node: &Node,
        key: &[u8],
        value: &[u8],
        ts: i64,
    ) -> Result<(), FlowError> {
        for &child in &node.outputs {
            self.deliver(child, node.id, key, value, ts)?;
        }
        Ok(())
    }

    fn store(&self, name: &str) -> Result<&dyn StateStore, FlowError> {
        self.stores
            .get(name)
            .map(|store| &**store)
            .ok_or_else(|| FlowError::StoreNotRegistered(name.to_string()))
    }

    fn store_mut(&mut self, name: &str) -> Result<&mut (dyn StateStore + 'static), FlowError> {
        self.stores
            .get_mut(name)
            .map(|store| &mut **store)
            .ok_or_else(|| FlowError::StoreNotRegistered(name.to_string()))
    }
}
