//! One-shot topology runs over accumulated harness state.
//!
//! Each read-back on the facade calls [`run`] afresh: the topology
//! definition is invoked, the graph is built and validated, a new flow is
//! created against the declared stores, and every pending input record is
//! replayed. No run result is cached; two consecutive reads over the same
//! accumulated state perform two independent, identical runs.

use freshet_core::{Flow, FlowResult, InputRegistry, TopologyBuilder};

use crate::config::EffectiveConfig;
use crate::error::HarnessError;
use crate::harness::TopologyDef;

/// Builds and drives one fresh execution pass.
///
/// Replay order is fixed: channels in first-registration order, records
/// within a channel in registration order. Cross-channel interleaving is
/// never attempted, which callers must account for in join and aggregate
/// expectations.
///
/// The flow is dropped on every exit path, error or not, so no execution
/// context outlives the call.
///
/// # Errors
///
/// Topology, configuration, and execution failures propagate unchanged
/// through `HarnessError::Flow`.
pub fn run(
    def: &TopologyDef,
    inputs: &InputRegistry,
    stores: &[String],
    config: &EffectiveConfig,
) -> Result<FlowResult, HarnessError> {
    let mut builder = TopologyBuilder::new();
    def(&mut builder);
    let topology = builder.build()?;
    let policy = config.timestamp_policy()?;

    tracing::trace!(
        nodes = topology.node_count(),
        stores = stores.len(),
        records = inputs.record_count(),
        "starting topology run"
    );
    let flow = Flow::new(&topology, stores, policy)?;
    let result = flow.run(inputs)?;
    Ok(result)
}
