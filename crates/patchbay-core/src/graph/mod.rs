//! Signal-routing graph for the patchbay.
//!
//! The graph models what the operator has wired: one [`Source`](NodeKind::Source)
//! per physical channel, effect nodes from the closed catalog, named buses,
//! and a single master [`Sink`](NodeKind::Sink). It is pure data; nothing
//! here talks to the device. Command translation reads the graph through the
//! upstream resolver ([`RoutingGraph::tracks_feeding`]) and reacts to the
//! [`GraphEvent`]s each mutation records.
//!
//! # Invariants
//!
//! - Exactly one sink, never a source of edges.
//! - At most one source per channel, never a destination of edges.
//! - Acyclic: [`connect()`](RoutingGraph::connect) rejects any edge whose
//!   destination already reaches its source.
//! - No duplicate ordered pair.
//! - Node and edge IDs are never reused within a graph instance.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::graph::{NodeKind, Position, RoutingGraph};
//!
//! let mut graph = RoutingGraph::new(16);
//! let kick = graph.add_source(0, Position::default()).unwrap();
//! let comp = graph
//!     .add_node(NodeKind::from_catalog("compressor").unwrap(), Position::default())
//!     .unwrap();
//! graph.connect(kick, comp).unwrap();
//! graph.connect(comp, graph.sink()).unwrap();
//!
//! let scene = graph.capture_scene();
//! let mut other = RoutingGraph::new(16);
//! other.restore_scene(&scene);
//! assert_eq!(other.edge_count(), 2);
//! ```

pub mod edge;
pub mod node;
mod routing;
pub mod scene;
mod upstream;

pub use edge::{Edge, EdgeId};
pub use node::{ChannelIndex, Node, NodeId, NodeKind, Position, SourcePolicy};
pub use routing::{GraphError, GraphEvent, RoutingGraph};
pub use scene::{
    RestoreReport, SCENE_VERSION, SceneData, SceneEdge, SceneEndpoint, SceneNode, SceneNodeKind,
    SourcePlacement,
};
pub use upstream::FeedMap;
