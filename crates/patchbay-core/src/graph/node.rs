//! Graph node types for the routing graph.
//!
//! Each node has a [`NodeId`], a [`NodeKind`] that determines its role, a
//! layout [`Position`], and (for effects) a bypass flag. Adjacency lists are
//! internal bookkeeping maintained by [`RoutingGraph`](super::RoutingGraph).

use serde::{Deserialize, Serialize};

use crate::color::NamedColor;
use crate::effect::EffectParams;

use super::edge::EdgeId;
use super::routing::GraphError;

/// A physical device channel index.
pub type ChannelIndex = u8;

/// Unique identifier for a node in the routing graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// 2D layout position. Has no effect on routing.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The role of a node in the routing graph.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A physical channel. At most one per channel; never has incoming edges.
    Source {
        /// Channel fed into the graph.
        channel: ChannelIndex,
    },
    /// A device effect with its parameters.
    Effect(EffectParams),
    /// Named sub-mix point. Pass-through, no parameters.
    Bus {
        /// Display name.
        name: String,
        /// Display colour, also used for cables leaving the bus.
        color: NamedColor,
    },
    /// The master output. Exactly one per graph; never has outgoing edges.
    Sink,
}

impl NodeKind {
    /// An effect node with catalog defaults, looked up by catalog id.
    ///
    /// Fails with [`GraphError::InvalidVariant`] for ids not in the catalog.
    pub fn from_catalog(id: &str) -> Result<Self, GraphError> {
        crate::EffectKind::from_id(id)
            .map(|kind| Self::Effect(EffectParams::defaults(kind)))
            .ok_or_else(|| GraphError::InvalidVariant(id.to_string()))
    }

    /// A bus node.
    pub fn bus(name: impl Into<String>, color: NamedColor) -> Self {
        Self::Bus {
            name: name.into(),
            color,
        }
    }

    /// Short human-readable label for logs and listings.
    pub fn label(&self) -> String {
        match self {
            Self::Source { channel } => format!("source {channel}"),
            Self::Effect(params) => params.kind().label().to_string(),
            Self::Bus { name, .. } => name.clone(),
            Self::Sink => "MASTER".to_string(),
        }
    }
}

/// Removal rule for source nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SourcePolicy {
    /// Sources persist for the graph's lifetime; removing one is a no-op.
    #[default]
    Fixed,
    /// Sources may be removed like any other node (edges cascade).
    Removable,
}

/// A node in the routing graph.
#[derive(Clone, Debug)]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Role and parameters.
    pub kind: NodeKind,
    /// Layout position.
    pub position: Position,
    /// Bypass flag (only meaningful for effects).
    pub bypassed: bool,
    /// Edges arriving at this node.
    pub(crate) incoming: Vec<EdgeId>,
    /// Edges leaving this node.
    pub(crate) outgoing: Vec<EdgeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            bypassed: false,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Effect parameters, if this is an effect node.
    pub fn effect(&self) -> Option<&EffectParams> {
        match &self.kind {
            NodeKind::Effect(params) => Some(params),
            _ => None,
        }
    }

    /// The channel, if this is a source node.
    pub fn channel(&self) -> Option<ChannelIndex> {
        match self.kind {
            NodeKind::Source { channel } => Some(channel),
            _ => None,
        }
    }

    /// Returns `true` for the master output.
    pub fn is_sink(&self) -> bool {
        matches!(self.kind, NodeKind::Sink)
    }

    /// Edges arriving at this node.
    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    /// Edges leaving this node.
    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }
}
