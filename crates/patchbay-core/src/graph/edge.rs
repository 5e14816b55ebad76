//! Graph edge types for the routing graph.
//!
//! An `Edge` is a cable carrying signal from one node to another. Its colour is
//! fixed at creation from the node it leaves.

use serde::{Deserialize, Serialize};

use crate::color::Color;

use super::node::NodeId;

/// Unique identifier for an edge in the routing graph.
///
/// Edge IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A directed connection between two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Edge identifier.
    pub id: EdgeId,
    /// Node the signal leaves.
    pub from: NodeId,
    /// Node the signal enters.
    pub to: NodeId,
    /// Display colour derived from `from`.
    pub color: Color,
}
