//! Fail-fast validation guards.
//!
//! Pure predicates over accumulated harness state, invoked before a run is
//! ever constructed. A failed guard means the runtime is never touched.

use freshet_core::InputRegistry;

use crate::error::HarnessError;

/// Rejects reads attempted before any input record exists on any channel.
///
/// A channel registered with an empty batch does not count.
///
/// # Errors
///
/// Returns `HarnessError::NoInputSpecified`.
pub fn require_input_present(inputs: &InputRegistry) -> Result<(), HarnessError> {
    if inputs.is_empty() {
        return Err(HarnessError::NoInputSpecified);
    }
    Ok(())
}

/// Rejects count-bounded reads asking for zero records.
///
/// # Errors
///
/// Returns `HarnessError::ExpectedOutputIsEmpty`.
pub fn require_positive_size(n: usize) -> Result<(), HarnessError> {
    if n == 0 {
        return Err(HarnessError::ExpectedOutputIsEmpty);
    }
    Ok(())
}
