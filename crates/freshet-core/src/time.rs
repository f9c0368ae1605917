//! Deterministic event-time assignment and window bucketing.
//!
//! Nothing in this module reads a clock. A record's logical timestamp is
//! either carried explicitly or derived by a [`TimestampPolicy`], so two
//! runs over the same inputs always see the same times.

use crate::error::FlowError;

/// How a record's logical timestamp is derived when none is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// Per-run monotonic sequence counter: the Nth record replayed gets
    /// time N. The default.
    #[default]
    Sequence,

    /// Every record without an explicit timestamp gets time zero.
    Zero,

    /// Explicit timestamps are mandatory; a bare record fails the run.
    Record,
}

impl TimestampPolicy {
    /// Parses a configuration value (`sequence`, `zero`, or `record`).
    ///
    /// # Errors
    ///
    /// Returns `FlowError::UnknownTimestampPolicy` for any other value.
    pub fn parse(value: &str) -> Result<Self, FlowError> {
        match value {
            "sequence" => Ok(Self::Sequence),
            "zero" => Ok(Self::Zero),
            "record" => Ok(Self::Record),
            other => Err(FlowError::UnknownTimestampPolicy(other.to_string())),
        }
    }
}

/// Assigns logical timestamps to records during one run.
///
/// The internal counter tracks replay position and advances for every
/// record, explicit timestamp or not, so a record's sequence time depends
/// only on its position in the replay order.
#[derive(Debug)]
pub struct TimestampAssigner {
    policy: TimestampPolicy,
    next_seq: i64,
}

impl TimestampAssigner {
    /// Creates an assigner with the counter at zero.
    #[must_use]
    pub fn new(policy: TimestampPolicy) -> Self {
        Self {
            policy,
            next_seq: 0,
        }
    }

    /// Resolves the timestamp for the next record in replay order.
    ///
    /// An explicit timestamp always wins over the policy.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::MissingTimestamp` when the policy is
    /// [`TimestampPolicy::Record`] and the record carries none.
    pub fn assign(&mut self, explicit: Option<i64>) -> Result<i64, FlowError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        match explicit {
            Some(ts) => Ok(ts),
            None => match self.policy {
                TimestampPolicy::Sequence => Ok(seq),
                TimestampPolicy::Zero => Ok(0),
                TimestampPolicy::Record => Err(FlowError::MissingTimestamp),
            },
        }
    }
}

/// Fixed-size, non-overlapping window assigner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TumblingWindow {
    size: i64,
}

impl TumblingWindow {
    /// Creates a window assigner with the given size in timestamp units.
    ///
    /// The size is validated when the topology is built; a non-positive
    /// size fails the run with `FlowError::InvalidWindow`.
    #[must_use]
    pub const fn new(size: i64) -> Self {
        Self { size }
    }

    /// The window size in timestamp units.
    #[must_use]
    pub const fn size(&self) -> i64 {
        self.size
    }

    /// Start of the window containing `ts`.
    ///
    /// Floor alignment; Euclidean remainder keeps negative timestamps in
    /// the window below zero rather than straddling it.
    #[must_use]
    pub fn start_for(&self, ts: i64) -> i64 {
        ts - ts.rem_euclid(self.size)
    }
}

/// Composite identity of one windowed-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowKey {
    /// Inclusive start of the window.
    pub start: i64,
    /// Encoded record key.
    pub key: Vec<u8>,
}

impl WindowKey {
    /// Encodes as an 8-byte big-endian start followed by the key bytes, so
    /// entries for one window stay adjacent in a lexicographic store.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + self.key.len());
        bytes.extend_from_slice(&self.start.to_be_bytes());
        bytes.extend_from_slice(&self.key);
        bytes
    }

    /// Decodes a composite store key.
    ///
    /// Returns `None` for keys shorter than the 8-byte window prefix.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let (head, tail) = bytes.split_at_checked(8)?;
        let start = i64::from_be_bytes(head.try_into().ok()?);
        Some(Self {
            start,
            key: tail.to_vec(),
        })
    }
}
