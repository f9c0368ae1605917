//! Records and channel registries.
//!
//! A [`Record`] is the unit of data flowing through a topology: encoded key
//! bytes, encoded value bytes, and an optional explicit event timestamp.
//! Typed values are encoded once at the codec boundary; everything past that
//! boundary works on bytes.
//!
//! [`InputRegistry`] holds caller-populated input channels with a fixed
//! replay order; [`OutputSet`] holds run-populated output channels in
//! emission order.

use fxhash::FxHashMap;

/// A single keyed record within a channel.
///
/// Identity is positional within the channel's ordered sequence; duplicate
/// keys are legal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Encoded key bytes.
    pub key: Vec<u8>,
    /// Encoded value bytes.
    pub value: Vec<u8>,
    /// Explicit event timestamp. `None` defers to the configured
    /// timestamp policy at replay time.
    pub timestamp: Option<i64>,
}

impl Record {
    /// Creates a record without an explicit timestamp.
    #[must_use]
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            timestamp: None,
        }
    }

    /// Creates a record carrying an explicit event timestamp.
    #[must_use]
    pub fn with_timestamp(key: Vec<u8>, value: Vec<u8>, timestamp: i64) -> Self {
        Self {
            key,
            value,
            timestamp: Some(timestamp),
        }
    }
}

/// Caller-populated input channels with a fixed replay order.
///
/// Channels replay in the order they were first registered; records within a
/// channel keep their registration order. Cross-channel interleaving is
/// never attempted.
#[derive(Debug, Default, Clone)]
pub struct InputRegistry {
    /// Channel names in first-registration order.
    order: Vec<String>,
    /// Pending records per channel.
    channels: FxHashMap<String, Vec<Record>>,
}

impl InputRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records to the named channel, registering it on first use.
    pub fn append(&mut self, channel: &str, records: impl IntoIterator<Item = Record>) {
        if let Some(existing) = self.channels.get_mut(channel) {
            existing.extend(records);
        } else {
            self.order.push(channel.to_string());
            self.channels
                .insert(channel.to_string(), records.into_iter().collect());
        }
    }

    /// Total number of pending records across all channels.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    /// Returns true when no channel holds a record.
    ///
    /// A channel registered with an empty batch does not count as input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Channels and their pending records, in first-registration order.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.channels[name].as_slice()))
    }
}

/// Run-populated output channels, each in emission order.
#[derive(Debug, Default)]
pub struct OutputSet {
    channels: FxHashMap<String, Vec<Record>>,
}

impl OutputSet {
    /// Appends an emitted record to the named output channel.
    pub(crate) fn push(&mut self, channel: &str, record: Record) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(record);
    }

    /// Emission-ordered records of the named channel.
    ///
    /// A channel the run never wrote to reads back as an empty slice.
    #[must_use]
    pub fn records(&self, channel: &str) -> &[Record] {
        self.channels.get(channel).map_or(&[], Vec::as_slice)
    }

    /// Number of channels that received at least one record.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
