//! Topology construction context.
//!
//! A caller-supplied topology definition receives a [`TopologyBuilder`] and
//! wires a graph of operators through [`StreamNode`] and [`TableNode`]
//! handles. [`TopologyBuilder::build`] validates the graph and freezes it
//! into an immutable [`Topology`] ready for execution.
//!
//! Operator closures work on byte slices; a closure that needs typed values
//! decodes and re-encodes through a codec, and any codec failure inside an
//! operator fails the run.
//!
//! # Example
//!
//! ```rust
//! use freshet_core::TopologyBuilder;
//!
//! let mut builder = TopologyBuilder::new();
//! builder
//!     .stream("events")
//!     .filter(|key, _value| Ok(key != b"skip"))
//!     .map(|key, value| Ok((key.to_vec(), value.to_ascii_uppercase())))
//!     .to("shouted");
//! let topology = builder.build().unwrap();
//! assert_eq!(topology.node_count(), 4);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::codec::CodecError;
use crate::error::FlowError;
use crate::time::TumblingWindow;

/// Unique identifier for a node in a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Stateless key-value transform: `(key, value) -> (key, value)`.
pub type MapFn =
    Arc<dyn Fn(&[u8], &[u8]) -> Result<(Vec<u8>, Vec<u8>), CodecError> + Send + Sync>;

/// Stateless predicate: records failing it are dropped.
pub type FilterFn = Arc<dyn Fn(&[u8], &[u8]) -> Result<bool, CodecError> + Send + Sync>;

/// Keyed fold: `(accumulator, key, value) -> accumulator`. The accumulator
/// is `None` the first time a key (or window-key pair) is seen.
pub type AggregateFn =
    Arc<dyn Fn(Option<&[u8]>, &[u8], &[u8]) -> Result<Vec<u8>, CodecError> + Send + Sync>;

/// Combines the two sides of a join: `(left value, right value) -> value`.
pub type JoinFn = Arc<dyn Fn(&[u8], &[u8]) -> Result<Vec<u8>, CodecError> + Send + Sync>;

/// What a node does with each record delivered to it.
pub(crate) enum NodeKind {
    /// Consumes a named input channel.
    Source { channel: String },
    /// Stateless transform.
    Map { f: MapFn },
    /// Stateless predicate.
    Filter { f: FilterFn },
    /// Last-write-wins materialization into a named store; forwards its
    /// changelog downstream.
    Table { store: String },
    /// Keyed fold materialized into a named store; forwards each updated
    /// accumulator downstream.
    Aggregate { store: String, f: AggregateFn },
    /// Keyed fold bucketed by tumbling window, materialized under
    /// composite `(window start, key)` store keys.
    WindowAggregate {
        store: String,
        window: TumblingWindow,
        f: AggregateFn,
    },
    /// Inner join of two materialized tables; emits the joined changelog.
    Join {
        left: NodeId,
        left_store: String,
        right_store: String,
        f: JoinFn,
    },
    /// Terminates into a named output channel.
    Sink { channel: String },
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { channel } => write!(f, "Source({channel})"),
            Self::Map { .. } => f.write_str("Map"),
            Self::Filter { .. } => f.write_str("Filter"),
            Self::Table { store } => write!(f, "Table({store})"),
            Self::Aggregate { store, .. } => write!(f, "Aggregate({store})"),
            Self::WindowAggregate { store, window, .. } => {
                write!(f, "WindowAggregate({store}, size={})", window.size())
            }
            Self::Join {
                left_store,
                right_store,
                ..
            } => write!(f, "Join({left_store}, {right_store})"),
            Self::Sink { channel } => write!(f, "Sink({channel})"),
        }
    }
}

/// A node plus its downstream connections.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    /// Downstream fan-out. `SmallVec` avoids heap alloc for small graphs.
    pub(crate) outputs: SmallVec<[NodeId; 4]>,
}

/// An immutable, runnable topology graph.
pub struct Topology {
    pub(crate) nodes: Vec<Node>,
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("node_count", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Topology {
    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of every store the graph reads or writes.
    #[must_use]
    pub fn referenced_stores(&self) -> Vec<&str> {
        let mut stores = Vec::new();
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Table { store }
                | NodeKind::Aggregate { store, .. }
                | NodeKind::WindowAggregate { store, .. } => stores.push(store.as_str()),
                NodeKind::Join {
                    left_store,
                    right_store,
                    ..
                } => {
                    stores.push(left_store.as_str());
                    stores.push(right_store.as_str());
                }
                _ => {}
            }
        }
        stores.sort_unstable();
        stores.dedup();
        stores
    }

    /// Source node ids consuming the named input channel.
    pub(crate) fn sources_for(&self, channel: &str) -> SmallVec<[NodeId; 4]> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Source { channel: bound } if bound.as_str() == channel => Some(node.id),
                _ => None,
            })
            .collect()
    }
}

/// Shared mutable graph under construction.
#[derive(Default)]
struct TopologyInner {
    nodes: Vec<Node>,
}

impl TopologyInner {
    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        // Node count is bounded by test-sized topologies.
        #[allow(clippy::cast_possible_truncation)]
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            kind,
            outputs: SmallVec::new(),
        });
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0 as usize].outputs.push(to);
    }
}

/// The construction context handed to a topology definition.
///
/// Stream and table handles hand out clones of the shared graph, so a
/// definition can hold several handles at once (fan-out, joins).
pub struct TopologyBuilder {
    inner: Rc<RefCell<TopologyInner>>,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TopologyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyBuilder")
            .field("node_count", &self.inner.borrow().nodes.len())
            .finish_non_exhaustive()
    }
}

impl TopologyBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TopologyInner::default())),
        }
    }

    /// Declares a source consuming the named input channel.
    ///
    /// Multiple sources may consume the same channel; each receives every
    /// record of that channel.
    pub fn stream(&mut self, channel: &str) -> StreamNode {
        let id = self.inner.borrow_mut().add_node(NodeKind::Source {
            channel: channel.to_string(),
        });
        StreamNode {
            inner: Rc::clone(&self.inner),
            id,
        }
    }

    /// Consumes the builder, validating and freezing the graph.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::DuplicateStore` when two stateful nodes claim
    /// the same backing store, and `FlowError::InvalidWindow` for a
    /// non-positive window size.
    pub fn build(self) -> Result<Topology, FlowError> {
        let nodes = std::mem::take(&mut self.inner.borrow_mut().nodes);

        let mut owned_stores: Vec<&str> = Vec::new();
        for node in &nodes {
            let store = match &node.kind {
                NodeKind::Table { store }
                | NodeKind::Aggregate { store, .. }
                | NodeKind::WindowAggregate { store, .. } => Some(store.as_str()),
                _ => None,
            };
            if let Some(store) = store {
                if owned_stores.contains(&store) {
                    return Err(FlowError::DuplicateStore(store.to_string()));
                }
                owned_stores.push(store);
            }
            if let NodeKind::WindowAggregate { window, .. } = &node.kind {
                if window.size() <= 0 {
                    return Err(FlowError::InvalidWindow(window.size()));
                }
            }
        }

        Ok(Topology { nodes })
    }
}

/// Handle to a record stream within a topology under construction.
#[derive(Clone)]
pub struct StreamNode {
    inner: Rc<RefCell<TopologyInner>>,
    id: NodeId,
}

impl fmt::Debug for StreamNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamNode").field(&self.id).finish()
    }
}

impl StreamNode {
    fn attach(&self, kind: NodeKind) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.add_node(kind);
        inner.connect(self.id, id);
        id
    }

    /// Applies a stateless key-value transform to every record.
    #[must_use]
    pub fn map(
        &self,
        f: impl Fn(&[u8], &[u8]) -> Result<(Vec<u8>, Vec<u8>), CodecError> + Send + Sync + 'static,
    ) -> StreamNode {
        let id = self.attach(NodeKind::Map { f: Arc::new(f) });
        StreamNode {
            inner: Rc::clone(&self.inner),
            id,
        }
    }

    /// Drops records failing the predicate.
    #[must_use]
    pub fn filter(
        &self,
        f: impl Fn(&[u8], &[u8]) -> Result<bool, CodecError> + Send + Sync + 'static,
    ) -> StreamNode {
        let id = self.attach(NodeKind::Filter { f: Arc::new(f) });
        StreamNode {
            inner: Rc::clone(&self.inner),
            id,
        }
    }

    /// Terminates the stream into a named output channel.
    pub fn to(&self, channel: &str) {
        self.attach(NodeKind::Sink {
            channel: channel.to_string(),
        });
    }

    /// Materializes the stream as a last-write-wins table in the named
    /// store. The table's changelog flows downstream.
    #[must_use]
    pub fn table(&self, store: &str) -> TableNode {
        let id = self.attach(NodeKind::Table {
            store: store.to_string(),
        });
        TableNode {
            inner: Rc::clone(&self.inner),
            id,
            store: store.to_string(),
        }
    }

    /// Folds records per key into the named store. Each incoming record
    /// updates the key's accumulator and forwards it downstream.
    #[must_use]
    pub fn aggregate(
        &self,
        store: &str,
        f: impl Fn(Option<&[u8]>, &[u8], &[u8]) -> Result<Vec<u8>, CodecError>
        + Send
        + Sync
        + 'static,
    ) -> TableNode {
        let id = self.attach(NodeKind::Aggregate {
            store: store.to_string(),
            f: Arc::new(f),
        });
        TableNode {
            inner: Rc::clone(&self.inner),
            id,
            store: store.to_string(),
        }
    }

    /// Folds records per key and tumbling window into the named store,
    /// under composite `(window start, key)` store keys. Each incoming
    /// record updates its window's accumulator and forwards it downstream.
    #[must_use]
    pub fn window_aggregate(
        &self,
        store: &str,
        window: TumblingWindow,
        f: impl Fn(Option<&[u8]>, &[u8], &[u8]) -> Result<Vec<u8>, CodecError>
        + Send
        + Sync
        + 'static,
    ) -> StreamNode {
        let id = self.attach(NodeKind::WindowAggregate {
            store: store.to_string(),
            window,
            f: Arc::new(f),
        });
        StreamNode {
            inner: Rc::clone(&self.inner),
            id,
        }
    }
}

/// Handle to a materialized table node.
#[derive(Clone)]
pub struct TableNode {
    inner: Rc<RefCell<TopologyInner>>,
    id: NodeId,
    store: String,
}

impl fmt::Debug for TableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableNode")
            .field("id", &self.id)
            .field("store", &self.store)
            .finish()
    }
}

impl TableNode {
    /// Inner-joins this table with another by key.
    ///
    /// Every update on either side looks up the other side's current value;
    /// when both sides hold the key, the joined record flows downstream.
    /// `f` always receives this table's value first.
    #[must_use]
    pub fn join(
        &self,
        other: &TableNode,
        f: impl Fn(&[u8], &[u8]) -> Result<Vec<u8>, CodecError> + Send + Sync + 'static,
    ) -> StreamNode {
        let mut inner = self.inner.borrow_mut();
        let id = inner.add_node(NodeKind::Join {
            left: self.id,
            left_store: self.store.clone(),
            right_store: other.store.clone(),
            f: Arc::new(f),
        });
        inner.connect(self.id, id);
        inner.connect(other.id, id);
        drop(inner);
        StreamNode {
            inner: Rc::clone(&self.inner),
            id,
        }
    }

    /// Reinterprets the table's changelog as a stream.
    #[must_use]
    pub fn to_stream(&self) -> StreamNode {
        StreamNode {
            inner: Rc::clone(&self.inner),
            id: self.id,
        }
    }
}
