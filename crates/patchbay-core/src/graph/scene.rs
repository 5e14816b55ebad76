//! Whole-graph snapshots.
//!
//! A [`SceneData`] records every effect and bus (definition, position,
//! parameters, bypass), the positions of sources and the sink, and the full
//! edge set. Edges name sources by channel and the sink symbolically, so a
//! scene restores onto any graph with the same channel layout; effect and bus
//! nodes get fresh ids on restore.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::NamedColor;
use crate::effect::EffectParams;

use super::node::{ChannelIndex, NodeId, NodeKind, Position};
use super::routing::{GraphError, RoutingGraph};

/// Scene format version written by [`RoutingGraph::capture_scene`].
pub const SCENE_VERSION: u32 = 1;

/// A recreatable node in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneNodeKind {
    /// An effect with its parameters.
    Effect(EffectParams),
    /// A bus.
    Bus {
        /// Display name.
        name: String,
        /// Display colour.
        color: NamedColor,
    },
}

/// An effect or bus node in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Scene-local key referenced by [`SceneEndpoint::Node`].
    pub key: String,
    /// Node definition.
    pub kind: SceneNodeKind,
    /// Layout position.
    pub position: Position,
    /// Bypass flag.
    #[serde(default)]
    pub bypassed: bool,
}

/// Placement of a source node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePlacement {
    /// Source channel.
    pub channel: ChannelIndex,
    /// Layout position.
    pub position: Position,
}

/// One end of a scene edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneEndpoint {
    /// The source for a channel.
    Source(ChannelIndex),
    /// The master output.
    Sink,
    /// A scene node by key.
    Node(String),
}

/// A directed edge in a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneEdge {
    /// Signal leaves here.
    pub from: SceneEndpoint,
    /// Signal enters here.
    pub to: SceneEndpoint,
}

impl SceneEdge {
    /// Creates an edge.
    pub fn new(from: SceneEndpoint, to: SceneEndpoint) -> Self {
        Self { from, to }
    }
}

/// Immutable snapshot of a routing graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneData {
    /// Format version.
    #[serde(default)]
    pub version: u32,
    /// Effects and buses.
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    /// Source positions.
    #[serde(default)]
    pub sources: Vec<SourcePlacement>,
    /// Sink position.
    #[serde(default)]
    pub sink: Option<Position>,
    /// Edges.
    #[serde(default)]
    pub edges: Vec<SceneEdge>,
}

/// Outcome of restoring a scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    /// Fresh node id for every scene node key.
    pub ids: BTreeMap<String, NodeId>,
    /// Edges that could not be recreated, with the reason.
    pub skipped: Vec<(SceneEdge, GraphError)>,
    /// Other steps that failed: clearing old nodes, placing sources or the
    /// sink, creating or bypassing nodes.
    pub failed: Vec<GraphError>,
}

impl RestoreReport {
    fn record<T>(&mut self, result: Result<T, GraphError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("scene_restore: {err}");
                self.failed.push(err);
                None
            }
        }
    }
}

impl RoutingGraph {
    /// Captures the whole graph as a scene.
    pub fn capture_scene(&self) -> SceneData {
        let key = |id: NodeId| format!("n{}", id.index());
        let mut scene = SceneData {
            version: SCENE_VERSION,
            ..SceneData::default()
        };

        for node in self.nodes() {
            match &node.kind {
                NodeKind::Source { channel } => scene.sources.push(SourcePlacement {
                    channel: *channel,
                    position: node.position,
                }),
                NodeKind::Sink => scene.sink = Some(node.position),
                NodeKind::Effect(params) => scene.nodes.push(SceneNode {
                    key: key(node.id),
                    kind: SceneNodeKind::Effect(*params),
                    position: node.position,
                    bypassed: node.bypassed,
                }),
                NodeKind::Bus { name, color } => scene.nodes.push(SceneNode {
                    key: key(node.id),
                    kind: SceneNodeKind::Bus {
                        name: name.clone(),
                        color: *color,
                    },
                    position: node.position,
                    bypassed: false,
                }),
            }
        }

        let endpoint = |id: NodeId| match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Source { channel }) => SceneEndpoint::Source(*channel),
            Some(NodeKind::Sink) => SceneEndpoint::Sink,
            _ => SceneEndpoint::Node(key(id)),
        };
        scene.edges = self
            .edges()
            .map(|e| SceneEdge::new(endpoint(e.from), endpoint(e.to)))
            .collect();
        scene
    }

    /// Replaces the graph's effects, buses, and edges with a scene.
    ///
    /// Clears every edge and removes every effect and bus, ensures each source
    /// the scene mentions exists, restores positions, recreates nodes with
    /// fresh ids, then recreates edges. Edges that fail (unknown key, channel
    /// out of range, invariant violation) are skipped and reported.
    pub fn restore_scene(&mut self, scene: &SceneData) -> RestoreReport {
        let mut report = RestoreReport::default();

        self.clear_edges();
        let doomed: Vec<NodeId> = self
            .nodes()
            .filter(|n| matches!(n.kind, NodeKind::Effect(_) | NodeKind::Bus { .. }))
            .map(|n| n.id)
            .collect();
        for id in doomed {
            report.record(self.remove_node(id));
        }

        for placement in &scene.sources {
            let placed = self
                .add_source(placement.channel, placement.position)
                .and_then(|id| self.move_node(id, placement.position));
            report.record(placed);
        }
        for edge in &scene.edges {
            for end in [&edge.from, &edge.to] {
                if let SceneEndpoint::Source(channel) = end
                    && *channel < self.channel_count()
                    && self.source(*channel).is_none()
                {
                    report.record(self.add_source(*channel, Position::default()));
                }
            }
        }
        if let Some(position) = scene.sink {
            let sink = self.sink();
            report.record(self.move_node(sink, position));
        }

        for node in &scene.nodes {
            let kind = match &node.kind {
                SceneNodeKind::Effect(params) => NodeKind::Effect(*params),
                SceneNodeKind::Bus { name, color } => NodeKind::bus(name.clone(), *color),
            };
            let Some(id) = report.record(self.add_node(kind, node.position)) else {
                continue;
            };
            if node.bypassed {
                report.record(self.set_bypass(id, true));
            }
            report.ids.insert(node.key.clone(), id);
        }

        for edge in &scene.edges {
            if let Err(err) = self.connect_scene_edge(edge, &report.ids) {
                #[cfg(feature = "tracing")]
                tracing::warn!("scene_restore: skipping edge {edge:?}: {err}");
                report.skipped.push((edge.clone(), err));
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "scene_restore: {} nodes, {} edges, {} skipped, {} failed",
            report.ids.len(),
            self.edge_count(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    fn connect_scene_edge(
        &mut self,
        edge: &SceneEdge,
        ids: &BTreeMap<String, NodeId>,
    ) -> Result<super::EdgeId, GraphError> {
        let from = self.resolve_endpoint(&edge.from, ids)?;
        let to = self.resolve_endpoint(&edge.to, ids)?;
        self.connect(from, to)
    }

    fn resolve_endpoint(
        &self,
        endpoint: &SceneEndpoint,
        ids: &BTreeMap<String, NodeId>,
    ) -> Result<NodeId, GraphError> {
        match endpoint {
            SceneEndpoint::Sink => Ok(self.sink()),
            SceneEndpoint::Source(channel) => {
                self.source(*channel)
                    .ok_or(GraphError::ChannelOutOfRange {
                        channel: *channel,
                        count: self.channel_count(),
                    })
            }
            SceneEndpoint::Node(key) => ids
                .get(key)
                .copied()
                .ok_or_else(|| GraphError::InvalidVariant(format!("unknown scene node '{key}'"))),
        }
    }
}
