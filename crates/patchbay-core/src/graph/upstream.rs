//! Upstream resolution: which physical channels feed a node.
//!
//! The device applies effects per channel, so every effect node must know the
//! set of channels whose signal reaches it. Effects and buses are transparent
//! waypoints; only sources contribute channels. Results are recomputed on
//! demand from the current topology.

use std::collections::{BTreeMap, BTreeSet};

use super::node::{ChannelIndex, NodeId, NodeKind};
use super::routing::RoutingGraph;

/// Channels feeding each effect node, keyed by node.
pub type FeedMap = BTreeMap<NodeId, BTreeSet<ChannelIndex>>;

impl RoutingGraph {
    /// Channels whose source reaches `node` by a directed path.
    ///
    /// A source node is fed by its own channel. Unknown nodes yield an empty set.
    /// Each node is expanded at most once, so the walk is linear in graph size.
    pub fn tracks_feeding(&self, node: NodeId) -> BTreeSet<ChannelIndex> {
        let mut tracks = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(data) = self.node(current) else {
                continue;
            };
            if let NodeKind::Source { channel } = data.kind {
                tracks.insert(channel);
            }
            for edge_id in data.incoming() {
                if let Some(edge) = self.edge(*edge_id) {
                    stack.push(edge.from);
                }
            }
        }
        tracks
    }

    /// Effect nodes reachable forward from `node`, including `node` itself
    /// when it is an effect. Ordered by node id.
    ///
    /// These are the effects whose feed may change when `node`'s inputs change.
    pub fn downstream_effects(&self, node: NodeId) -> Vec<NodeId> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(data) = self.node(current) {
                for edge_id in data.outgoing() {
                    if let Some(edge) = self.edge(*edge_id) {
                        stack.push(edge.to);
                    }
                }
            }
        }
        visited
            .into_iter()
            .filter(|id| self.effect(*id).is_some())
            .collect()
    }

    /// Feed sets for the given nodes.
    pub fn feeds_of(&self, nodes: impl IntoIterator<Item = NodeId>) -> FeedMap {
        nodes
            .into_iter()
            .map(|id| (id, self.tracks_feeding(id)))
            .collect()
    }

    /// Feed sets for every effect node in the graph.
    pub fn effect_feeds(&self) -> FeedMap {
        let effects: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.effect().is_some())
            .map(|n| n.id)
            .collect();
        self.feeds_of(effects)
    }

    /// Channels carried by an edge: everything feeding its source node.
    pub fn tracks_on_edge(&self, edge: super::EdgeId) -> BTreeSet<ChannelIndex> {
        self.edge(edge)
            .map(|e| self.tracks_feeding(e.from))
            .unwrap_or_default()
    }
}
