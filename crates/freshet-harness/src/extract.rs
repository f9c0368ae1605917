//! Typed read-back views over a finished run.
//!
//! Three shapes: ordered output records, last-write-wins table folds of an
//! output channel, and store snapshots (flat or windowed). All of them
//! decode through the codec boundary; a decode failure fails the read.

use std::collections::BTreeMap;

use freshet_core::{Codec, FlowError, FlowResult, WindowKey};

use crate::error::HarnessError;

/// First `min(n, emitted)` records of the channel, in emission order.
///
/// Fewer than `n` available records is not an error; callers compare the
/// returned length themselves.
///
/// # Errors
///
/// Returns a codec error when a record fails to decode.
pub fn output<K, V>(
    result: &FlowResult,
    channel: &str,
    key_codec: &impl Codec<K>,
    value_codec: &impl Codec<V>,
    n: usize,
) -> Result<Vec<(K, V)>, HarnessError> {
    result
        .output_records(channel)
        .iter()
        .take(n)
        .map(|record| {
            Ok((
                key_codec.decode(&record.key)?,
                value_codec.decode(&record.value)?,
            ))
        })
        .collect()
}

/// Last-write-wins fold of the same drain as [`output`].
///
/// Later records overwrite earlier ones per key, modeling a changelog
/// stream read as a table.
///
/// # Errors
///
/// Returns a codec error when a record fails to decode.
pub fn output_table<K: Ord, V>(
    result: &FlowResult,
    channel: &str,
    key_codec: &impl Codec<K>,
    value_codec: &impl Codec<V>,
    n: usize,
) -> Result<BTreeMap<K, V>, HarnessError> {
    let mut table = BTreeMap::new();
    for record in result.output_records(channel).iter().take(n) {
        table.insert(
            key_codec.decode(&record.key)?,
            value_codec.decode(&record.value)?,
        );
    }
    Ok(table)
}

/// Full snapshot of a materialized store, unbounded.
///
/// # Errors
///
/// Returns `FlowError::StoreNotRegistered` for a store name that was never
/// declared, or a codec error when an entry fails to decode.
pub fn state_table<K: Ord, V>(
    result: &FlowResult,
    store: &str,
    key_codec: &impl Codec<K>,
    value_codec: &impl Codec<V>,
) -> Result<BTreeMap<K, V>, HarnessError> {
    let snapshot = result
        .store(store)
        .ok_or_else(|| FlowError::StoreNotRegistered(store.to_string()))?;
    let mut table = BTreeMap::new();
    for (key, value) in snapshot {
        table.insert(key_codec.decode(key)?, value_codec.decode(value)?);
    }
    Ok(table)
}

/// Snapshot of a windowed store filtered to one key, mapped by window
/// start.
///
/// Intended for stores written by windowed aggregations; entries whose
/// store key is too short to carry a window prefix are skipped.
///
/// # Errors
///
/// Returns `FlowError::StoreNotRegistered` for a store name that was never
/// declared, or a codec error when an entry fails to decode.
pub fn window_state_table<K, V>(
    result: &FlowResult,
    store: &str,
    key: &K,
    key_codec: &impl Codec<K>,
    value_codec: &impl Codec<V>,
) -> Result<BTreeMap<i64, V>, HarnessError> {
    let snapshot = result
        .store(store)
        .ok_or_else(|| FlowError::StoreNotRegistered(store.to_string()))?;
    let key_bytes = key_codec.encode(key)?;
    let mut table = BTreeMap::new();
    for (raw, value) in snapshot {
        let Some(window_key) = WindowKey::decode(raw) else {
            continue;
        };
        if window_key.key == key_bytes {
            table.insert(window_key.start, value_codec.decode(value)?);
        }
    }
    Ok(table)
}
