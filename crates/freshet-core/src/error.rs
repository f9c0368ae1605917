//! Error types for topology construction and flow execution.

use crate::codec::CodecError;

/// Errors raised while building or running a flow.
///
/// All of these reflect a misconfigured topology or input set, not a
/// transient condition; a run either succeeds or fails deterministically.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A topology node references a store that was not declared up front.
    #[error("store '{0}' is not registered; declare it before running")]
    StoreNotRegistered(String),

    /// Two stateful nodes claimed the same backing store.
    #[error("store '{0}' is used by more than one stateful node")]
    DuplicateStore(String),

    /// A window assigner was configured with a non-positive size.
    #[error("window size must be positive, got {0}")]
    InvalidWindow(i64),

    /// A record carried no explicit timestamp under the `record` policy.
    #[error("record without explicit timestamp under 'record' timestamp policy")]
    MissingTimestamp,

    /// Unrecognized timestamp policy value in the effective configuration.
    #[error("unrecognized timestamp policy: '{0}'")]
    UnknownTimestampPolicy(String),

    /// A codec failed inside an operator.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
