//! Error types for the harness facade.

use freshet_core::{CodecError, FlowError};

/// Errors surfaced to test code by harness reads.
///
/// Every variant reflects a caller-input violation; none are transient or
/// retriable, and all surface synchronously as the result of the
/// triggering call.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A read was attempted before any input record was supplied on any
    /// channel. Add input; retrying cannot help.
    #[error("no input specified: supply at least one input record before reading")]
    NoInputSpecified,

    /// A count-bounded read asked for zero records. A caller logic error,
    /// not a runtime condition.
    #[error("expected output is empty: requested record count must be positive")]
    ExpectedOutputIsEmpty,

    /// The execution runtime failed; the original error passes through
    /// unchanged, without a harness wrapper.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// A codec failed while encoding inputs or decoding results.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
