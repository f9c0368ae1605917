//! # Freshet
//!
//! Deterministic testing for stream-processing topologies: wire a data-flow
//! graph once, feed synthetic keyed records on named input channels, and
//! assert on emitted records, materialized tables, and windowed tables.
//! No broker, no cluster, no wall clock.
//!
//! # Quick Start
//!
//! ```rust
//! use freshet::prelude::*;
//!
//! let keys = StringCodec;
//! let values = StringCodec;
//!
//! let harness = HarnessBuilder::new()
//!     .topology(|t| {
//!         t.stream("greetings")
//!             .map(|key, value| Ok((key.to_vec(), value.to_ascii_uppercase())))
//!             .to("loud-greetings");
//!     })
//!     .input(
//!         "greetings",
//!         &keys,
//!         &values,
//!         vec![("en".to_string(), "hello".to_string())],
//!     );
//!
//! let out = harness.output("loud-greetings", &keys, &values, 1).unwrap();
//! assert_eq!(out, vec![("en".to_string(), "HELLO".to_string())]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

// Re-export the harness facade
pub use freshet_harness::{EffectiveConfig, Harness, HarnessBuilder, HarnessError, TopologyDef};

// Re-export the runtime surface topology definitions touch
pub use freshet_core::{
    Codec, CodecError, JsonCodec, StringCodec, StreamNode, TableNode, TopologyBuilder,
    TumblingWindow,
};

/// Commonly used types and traits.
///
/// ```rust,ignore
/// use freshet::prelude::*;
/// ```
pub mod prelude {
    // Harness
    pub use freshet_harness::{Harness, HarnessBuilder, HarnessError, TIMESTAMP_POLICY};

    // Topology construction
    pub use freshet_core::{StreamNode, TableNode, TopologyBuilder, TumblingWindow};

    // Codecs
    pub use freshet_core::{Codec, CodecError, JsonCodec, StringCodec};
}
