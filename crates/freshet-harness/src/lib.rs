//! # Freshet Harness
//!
//! A deterministic test harness for stream-processing topologies: define a
//! data-flow graph once, feed synthetic keyed records on named input
//! channels, and assert on the records, materialized tables, and windowed
//! tables the run produces. No broker, no cluster, no wall clock.
//!
//! The harness bridges an asynchronous-looking processing model into a
//! synchronous, repeatable, single-call assertion API:
//!
//! - accumulate a topology, inputs, store declarations, and config through
//!   the chainable [`Harness`] facade
//! - every read-back builds a fresh execution context, replays all
//!   accumulated inputs in a fixed order, and discards the context
//! - misuse fails fast with descriptive errors before the runtime is ever
//!   touched: reading without input ([`HarnessError::NoInputSpecified`]) or
//!   asking for zero records ([`HarnessError::ExpectedOutputIsEmpty`])
//!
//! ## Quick Start
//!
//! ```
//! use freshet_core::{JsonCodec, StringCodec};
//! use freshet_harness::HarnessBuilder;
//!
//! let keys = StringCodec;
//! let values = JsonCodec::<i64>::new();
//!
//! let harness = HarnessBuilder::new()
//!     .topology(move |t| {
//!         let _ = t.stream("scores").table("latest-scores");
//!     })
//!     .stores(["latest-scores"])
//!     .input(
//!         "scores",
//!         &keys,
//!         &values,
//!         vec![("ada".to_string(), 3), ("ada".to_string(), 5)],
//!     );
//!
//! let table = harness.state_table("latest-scores", &keys, &values).unwrap();
//! assert_eq!(table.get("ada"), Some(&5));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod harness;
pub mod runner;

pub use config::{EffectiveConfig, TIMESTAMP_POLICY};
pub use error::HarnessError;
pub use harness::{Harness, HarnessBuilder, TopologyDef};

#[cfg(test)]
mod tests;
