//! # Freshet Core
//!
//! The in-memory execution runtime behind the `freshet` test harness.
//!
//! This crate provides:
//! - **Records & channels**: byte-level keyed records with ordered input
//!   and output channel registries
//! - **Codecs**: the typed/byte serialization boundary
//! - **Topology**: the construction context a topology definition drives
//!   (map, filter, table, aggregate, join, windowed aggregate)
//! - **State**: byte-keyed stores materialized during a run
//! - **Time**: deterministic timestamp policies and tumbling windows
//! - **Flow**: a one-shot, single-threaded executor producing per-channel
//!   emissions and per-store snapshots
//!
//! ## Design Principles
//!
//! 1. **Determinism** - no clocks, no threads, no randomized iteration on
//!    any observable path
//! 2. **One pass per run** - a [`Flow`] is created, fed, drained, and
//!    dropped; nothing leaks into the next run
//! 3. **Bytes in the middle** - typed values exist only at the codec
//!    boundary, so operators and stores stay monomorphic

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod error;
pub mod flow;
pub mod record;
pub mod state;
pub mod time;
pub mod topology;

pub use codec::{Codec, CodecError, JsonCodec, StringCodec};
pub use error::FlowError;
pub use flow::{Flow, FlowMetrics, FlowResult};
pub use record::{InputRegistry, OutputSet, Record};
pub use state::{InMemoryStore, StateStore};
pub use time::{TimestampAssigner, TimestampPolicy, TumblingWindow, WindowKey};
pub use topology::{NodeId, StreamNode, TableNode, Topology, TopologyBuilder};
