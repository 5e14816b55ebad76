//! Routing graph: mutation API and structural invariants.
//!
//! [`RoutingGraph`] is the sole owner of nodes and edges. Every mutation either
//! succeeds and records a [`GraphEvent`], or fails with a [`GraphError`] and
//! leaves the graph untouched. The invariants it maintains:
//!
//! - the sink has no outgoing edges and sources have no incoming edges,
//! - no directed cycle exists,
//! - no ordered pair `(from, to)` is connected twice,
//! - every edge endpoint is a live node,
//! - every effect parameter is inside its declared range.

use crate::color::{Color, channel_color};
use crate::effect::{EffectParams, ParamError};
use crate::param_info::ParameterInfo;

use super::edge::{Edge, EdgeId};
use super::node::{ChannelIndex, Node, NodeId, NodeKind, Position, SourcePolicy};

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The specified edge was not found in the graph.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),
    /// An edge from a node to itself.
    #[error("cannot connect {0} to itself")]
    SelfLoop(NodeId),
    /// An edge into a source or out of the sink.
    #[error("invalid connection {from} → {to}: {reason}")]
    InvalidEndpointType {
        /// Requested source node.
        from: NodeId,
        /// Requested destination node.
        to: NodeId,
        /// Which endpoint rule was broken.
        reason: &'static str,
    },
    /// A duplicate edge already exists between these nodes.
    #[error("edge from {0} to {1} already exists")]
    DuplicateEdge(NodeId, NodeId),
    /// Adding this edge would create a cycle.
    #[error("edge from {0} to {1} would create a cycle")]
    WouldCreateCycle(NodeId, NodeId),
    /// Unknown catalog id or a second sink.
    #[error("invalid node variant: {0}")]
    InvalidVariant(String),
    /// A source for a channel the graph was not configured with.
    #[error("channel {channel} out of range (graph has {count} channels)")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: ChannelIndex,
        /// Configured channel count.
        count: u8,
    },
    /// A parameter or bypass operation on a node that is not an effect.
    #[error("node {0} is not an effect")]
    NotAnEffect(NodeId),
    /// Parameter rejected by the effect.
    #[error(transparent)]
    Param(#[from] ParamError),
}

impl GraphError {
    /// Returns `true` for errors that protect a structural invariant
    /// (as opposed to addressing something that does not exist).
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::SelfLoop(_)
                | Self::InvalidEndpointType { .. }
                | Self::DuplicateEdge(..)
                | Self::WouldCreateCycle(..)
        )
    }
}

/// A change notification recorded by every successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node was created.
    NodeAdded(NodeId),
    /// A node was destroyed (its edges were disconnected first).
    NodeRemoved(NodeId),
    /// A node's layout position changed.
    NodeMoved(NodeId),
    /// An edge was created.
    Connected {
        /// New edge.
        edge: EdgeId,
        /// Source node.
        from: NodeId,
        /// Destination node.
        to: NodeId,
    },
    /// An edge was removed.
    Disconnected {
        /// Removed edge.
        edge: EdgeId,
        /// Former source node.
        from: NodeId,
        /// Former destination node.
        to: NodeId,
    },
    /// An effect parameter changed.
    ParamChanged {
        /// Effect node.
        node: NodeId,
        /// Parameter key.
        param: &'static str,
        /// Value applied after clamping.
        value: f32,
    },
    /// An effect's bypass flag changed.
    BypassChanged {
        /// Effect node.
        node: NodeId,
        /// New flag.
        bypassed: bool,
    },
}

/// Directed acyclic graph of sources, effects, buses, and the master sink.
///
/// # Usage
///
/// ```rust
/// use patchbay_core::{NodeKind, Position, RoutingGraph};
///
/// let mut graph = RoutingGraph::new(16);
/// let kick = graph.add_source(0, Position::new(60.0, 60.0)).unwrap();
/// let lpf = graph
///     .add_node(NodeKind::from_catalog("lowpass").unwrap(), Position::default())
///     .unwrap();
/// graph.connect(kick, lpf).unwrap();
/// graph.connect(lpf, graph.sink()).unwrap();
///
/// assert!(graph.connect(graph.sink(), kick).is_err());
/// assert_eq!(graph.tracks_feeding(graph.sink()).into_iter().collect::<Vec<_>>(), [0]);
/// ```
#[derive(Debug, Clone)]
pub struct RoutingGraph {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    next_node_slot: u32,
    next_edge_slot: u32,
    /// Source node per channel.
    sources: Vec<Option<NodeId>>,
    sink: NodeId,
    channel_count: u8,
    source_policy: SourcePolicy,
    events: Vec<GraphEvent>,
}

impl RoutingGraph {
    /// Creates a graph for `channel_count` channels holding only the sink.
    pub fn new(channel_count: u8) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            next_node_slot: 0,
            next_edge_slot: 0,
            sources: vec![None; channel_count as usize],
            sink: NodeId(0),
            channel_count,
            source_policy: SourcePolicy::default(),
            events: Vec::new(),
        };
        graph.sink = graph.insert_node(NodeKind::Sink, Position::default());
        graph.events.clear();
        graph
    }

    /// Sets the removal rule for sources.
    pub fn with_source_policy(mut self, policy: SourcePolicy) -> Self {
        self.source_policy = policy;
        self
    }

    /// Number of channels this graph was configured with.
    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Current source removal rule.
    pub fn source_policy(&self) -> SourcePolicy {
        self.source_policy
    }

    /// The master output node.
    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// The source node for a channel, if one exists.
    pub fn source(&self, channel: ChannelIndex) -> Option<NodeId> {
        self.sources.get(channel as usize).copied().flatten()
    }

    // --- Queries ---

    /// Looks up a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Iterates over live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// Looks up a live edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Iterates over live edges in id (creation) order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().flatten()
    }

    /// Number of live nodes, sink included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    /// Finds the edge connecting `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let node = self.node(from)?;
        node.outgoing
            .iter()
            .copied()
            .find(|&e| self.edge(e).is_some_and(|edge| edge.to == to))
    }

    /// Effect parameters of a node, if it is an effect.
    pub fn effect(&self, id: NodeId) -> Option<&EffectParams> {
        self.node(id).and_then(Node::effect)
    }

    /// Returns `true` if `id` is a bypassed effect.
    pub fn is_bypassed(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.bypassed)
    }

    /// Takes all events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        core::mem::take(&mut self.events)
    }

    // --- Node mutations ---

    /// Adds a node. Returns the new node's ID.
    ///
    /// Adding a source for a channel that already has one returns the existing
    /// source. A second sink fails with [`GraphError::InvalidVariant`]; a source
    /// outside the configured channel range fails with
    /// [`GraphError::ChannelOutOfRange`].
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> Result<NodeId, GraphError> {
        let channel = match &kind {
            NodeKind::Sink => return Err(GraphError::InvalidVariant("second sink".into())),
            NodeKind::Source { channel } => Some(*channel),
            NodeKind::Effect(_) | NodeKind::Bus { .. } => None,
        };
        if let Some(channel) = channel {
            if channel >= self.channel_count {
                return Err(GraphError::ChannelOutOfRange {
                    channel,
                    count: self.channel_count,
                });
            }
            if let Some(existing) = self.source(channel) {
                return Ok(existing);
            }
            let id = self.insert_node(kind, position);
            self.sources[channel as usize] = Some(id);
            return Ok(id);
        }
        let mut kind = kind;
        if let NodeKind::Effect(params) = &mut kind {
            params.sanitize();
        }
        Ok(self.insert_node(kind, position))
    }

    /// Adds (or returns) the source for a channel.
    pub fn add_source(
        &mut self,
        channel: ChannelIndex,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        self.add_node(NodeKind::Source { channel }, position)
    }

    /// Removes a node and every edge touching it.
    ///
    /// Returns `Ok(false)` without changing anything for the sink, and for
    /// sources while the policy is [`SourcePolicy::Fixed`].
    pub fn remove_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Sink => return Ok(false),
            NodeKind::Source { .. } if self.source_policy == SourcePolicy::Fixed => {
                return Ok(false);
            }
            _ => {}
        }

        // Collect edge IDs to remove (avoid borrow conflict).
        let edge_ids: Vec<EdgeId> = node
            .incoming
            .iter()
            .chain(node.outgoing.iter())
            .copied()
            .collect();
        let channel = node.channel();

        for edge_id in edge_ids {
            self.disconnect_internal(edge_id);
        }

        if let Some(channel) = channel {
            self.sources[channel as usize] = None;
        }
        self.nodes[id.0 as usize] = None;
        self.events.push(GraphEvent::NodeRemoved(id));
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(true)
    }

    /// Moves a node. Layout only.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.position = position;
        self.events.push(GraphEvent::NodeMoved(id));
        Ok(())
    }

    // --- Edge mutations ---

    /// Connects `from` to `to`.
    ///
    /// Checks, in order: both nodes exist, not a self-loop, valid endpoint
    /// types, no duplicate, no cycle.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        // Validate both nodes exist.
        self.get_node(from)?;
        self.get_node(to)?;

        if from == to {
            return Err(GraphError::SelfLoop(from));
        }

        // Validate structural constraints.
        self.validate_connection(from, to)?;

        if self.has_edge(from, to) {
            return Err(GraphError::DuplicateEdge(from, to));
        }

        // A cycle exists if `to` can already reach `from` via existing edges.
        if self.can_reach(to, from) {
            return Err(GraphError::WouldCreateCycle(from, to));
        }

        let edge_id = EdgeId(self.next_edge_slot);
        self.next_edge_slot += 1;

        let color = self.edge_color(from);
        let edge_idx = edge_id.0 as usize;
        if edge_idx >= self.edges.len() {
            self.edges.resize_with(edge_idx + 1, || None);
        }
        self.edges[edge_idx] = Some(Edge {
            id: edge_id,
            from,
            to,
            color,
        });

        // Update adjacency lists.
        if let Some(Some(node)) = self.nodes.get_mut(from.0 as usize) {
            node.outgoing.push(edge_id);
        }
        if let Some(Some(node)) = self.nodes.get_mut(to.0 as usize) {
            node.incoming.push(edge_id);
        }

        self.events.push(GraphEvent::Connected {
            edge: edge_id,
            from,
            to,
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(edge_id)
    }

    /// Removes an edge. Returns the removed edge.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<Edge, GraphError> {
        let edge = *self.edge(id).ok_or(GraphError::EdgeNotFound(id))?;
        self.disconnect_internal(id);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {} → {}", edge.from, edge.to);
        Ok(edge)
    }

    /// Removes every edge, keeping all nodes.
    pub fn clear_edges(&mut self) {
        let ids: Vec<EdgeId> = self.edges().map(|e| e.id).collect();
        for id in ids {
            self.disconnect_internal(id);
        }
    }

    // --- Effect state ---

    /// Sets an effect parameter by key or name. Returns the applied value.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: f32) -> Result<f32, GraphError> {
        let node = self.node_mut(id)?;
        let NodeKind::Effect(params) = &mut node.kind else {
            return Err(GraphError::NotAnEffect(id));
        };
        let applied = params.set_named(name, value)?;
        let index = params.find_param_by_name(name).unwrap_or_default();
        let param = params.kind().params()[index].key;
        self.events.push(GraphEvent::ParamChanged {
            node: id,
            param,
            value: applied,
        });
        Ok(applied)
    }

    /// Replaces all parameters of an effect with a record of the same kind.
    ///
    /// Values are clamped. Records a [`GraphEvent::ParamChanged`] for every
    /// parameter whose value actually changed.
    pub fn replace_params(&mut self, id: NodeId, mut new: EffectParams) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        let NodeKind::Effect(params) = &mut node.kind else {
            return Err(GraphError::NotAnEffect(id));
        };
        if params.kind() != new.kind() {
            return Err(GraphError::InvalidVariant(format!(
                "{} parameters for a {} node",
                new.kind(),
                params.kind()
            )));
        }
        new.sanitize();
        let changed: Vec<GraphEvent> = (0..new.param_count())
            .filter(|&i| params.get_param(i) != new.get_param(i))
            .map(|i| GraphEvent::ParamChanged {
                node: id,
                param: new.kind().params()[i].key,
                value: new.get_param(i),
            })
            .collect();
        *params = new;
        self.events.extend(changed);
        Ok(())
    }

    /// Sets an effect's bypass flag. Returns `true` if the flag changed.
    pub fn set_bypass(&mut self, id: NodeId, bypassed: bool) -> Result<bool, GraphError> {
        let node = self.node_mut(id)?;
        if !matches!(node.kind, NodeKind::Effect(_)) {
            return Err(GraphError::NotAnEffect(id));
        }
        if node.bypassed == bypassed {
            return Ok(false);
        }
        node.bypassed = bypassed;
        self.events.push(GraphEvent::BypassChanged { node: id, bypassed });
        Ok(true)
    }

    // --- Internal helpers ---

    fn insert_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = NodeId(self.next_node_slot);
        self.next_node_slot += 1;
        let idx = id.0 as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {id} ({})", kind.label());
        self.nodes[idx] = Some(Node::new(id, kind, position));
        self.events.push(GraphEvent::NodeAdded(id));
        id
    }

    fn get_node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.node(id).ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Depth-first reachability along forward edges.
    pub(crate) fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;

            if let Some(Some(node)) = self.nodes.get(idx) {
                for edge_id in &node.outgoing {
                    if let Some(edge) = self.edge(*edge_id) {
                        stack.push(edge.to);
                    }
                }
            }
        }
        false
    }

    fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.find_edge(from, to).is_some()
    }

    fn validate_connection(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let invalid = |reason| GraphError::InvalidEndpointType { from, to, reason };
        if self.get_node(to)?.channel().is_some() {
            return Err(invalid("sources accept no input"));
        }
        if self.get_node(from)?.is_sink() {
            return Err(invalid("the master output has no output"));
        }
        Ok(())
    }

    fn edge_color(&self, from: NodeId) -> Color {
        match self.node(from).map(|n| &n.kind) {
            Some(NodeKind::Source { channel }) => channel_color(*channel),
            Some(NodeKind::Effect(params)) => params.kind().color().color(),
            Some(NodeKind::Bus { color, .. }) => color.color(),
            Some(NodeKind::Sink) | None => Color::MASTER,
        }
    }

    fn disconnect_internal(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(Some(node)) = self.nodes.get_mut(edge.from.0 as usize) {
            node.outgoing.retain(|&e| e != id);
        }
        if let Some(Some(node)) = self.nodes.get_mut(edge.to.0 as usize) {
            node.incoming.retain(|&e| e != id);
        }
        self.events.push(GraphEvent::Disconnected {
            edge: id,
            from: edge.from,
            to: edge.to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EffectKind;
    use crate::color::NamedColor;

    fn effect(graph: &mut RoutingGraph, kind: EffectKind) -> NodeId {
        graph
            .add_node(NodeKind::Effect(EffectParams::defaults(kind)), Position::default())
            .unwrap()
    }

    #[test]
    fn new_graph_holds_only_the_sink() {
        let graph = RoutingGraph::new(16);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.node(graph.sink()).unwrap().is_sink());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn sources_are_unique_per_channel() {
        let mut graph = RoutingGraph::new(4);
        let a = graph.add_source(2, Position::default()).unwrap();
        let b = graph.add_source(2, Position::new(5.0, 5.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(graph.source(2), Some(a));
        assert_eq!(
            graph.add_source(4, Position::default()),
            Err(GraphError::ChannelOutOfRange { channel: 4, count: 4 })
        );
    }

    #[test]
    fn second_sink_and_unknown_catalog_id_are_invalid() {
        let mut graph = RoutingGraph::new(2);
        assert!(matches!(
            graph.add_node(NodeKind::Sink, Position::default()),
            Err(GraphError::InvalidVariant(_))
        ));
        assert_eq!(
            NodeKind::from_catalog("wobble"),
            Err(GraphError::InvalidVariant("wobble".into()))
        );
    }

    #[test]
    fn connect_rejects_self_loop() {
        let mut graph = RoutingGraph::new(2);
        let fx = effect(&mut graph, EffectKind::Lowpass);
        assert_eq!(graph.connect(fx, fx), Err(GraphError::SelfLoop(fx)));
    }

    #[test]
    fn connect_rejects_bad_endpoints() {
        let mut graph = RoutingGraph::new(2);
        let src = graph.add_source(0, Position::default()).unwrap();
        let fx = effect(&mut graph, EffectKind::Lowpass);
        let sink = graph.sink();

        let err = graph.connect(sink, src).unwrap_err();
        assert!(matches!(err, GraphError::InvalidEndpointType { .. }));
        assert!(err.is_invariant_violation());
        assert!(matches!(
            graph.connect(fx, src),
            Err(GraphError::InvalidEndpointType { .. })
        ));
        assert!(matches!(
            graph.connect(sink, fx),
            Err(GraphError::InvalidEndpointType { .. })
        ));
    }

    #[test]
    fn connect_rejects_duplicates_before_cycles() {
        let mut graph = RoutingGraph::new(2);
        let a = effect(&mut graph, EffectKind::Lowpass);
        let b = effect(&mut graph, EffectKind::Delay);
        graph.connect(a, b).unwrap();
        assert_eq!(graph.connect(a, b), Err(GraphError::DuplicateEdge(a, b)));
    }

    #[test]
    fn connect_rejects_cycles() {
        let mut graph = RoutingGraph::new(2);
        let a = effect(&mut graph, EffectKind::Lowpass);
        let b = effect(&mut graph, EffectKind::Delay);
        let c = effect(&mut graph, EffectKind::Compressor);
        graph.connect(a, b).unwrap();
        graph.connect(b, c).unwrap();
        assert_eq!(graph.connect(c, a), Err(GraphError::WouldCreateCycle(c, a)));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn connect_missing_node() {
        let mut graph = RoutingGraph::new(2);
        let ghost = NodeId(99);
        assert_eq!(
            graph.connect(graph.sink(), ghost),
            Err(GraphError::NodeNotFound(ghost))
        );
    }

    #[test]
    fn edge_color_follows_source_node() {
        let mut graph = RoutingGraph::new(2);
        let src = graph.add_source(1, Position::default()).unwrap();
        let bus = graph
            .add_node(NodeKind::bus("BUS A", NamedColor::Teal), Position::default())
            .unwrap();
        let fx = effect(&mut graph, EffectKind::Echo);
        let e1 = graph.connect(src, fx).unwrap();
        let e2 = graph.connect(fx, bus).unwrap();
        let e3 = graph.connect(bus, graph.sink()).unwrap();
        assert_eq!(graph.edge(e1).unwrap().color, channel_color(1));
        assert_eq!(graph.edge(e2).unwrap().color, NamedColor::Orange.color());
        assert_eq!(graph.edge(e3).unwrap().color, NamedColor::Teal.color());
    }

    #[test]
    fn remove_node_cascades_edges() {
        let mut graph = RoutingGraph::new(2);
        let src = graph.add_source(0, Position::default()).unwrap();
        let fx = effect(&mut graph, EffectKind::Lowpass);
        graph.connect(src, fx).unwrap();
        graph.connect(fx, graph.sink()).unwrap();
        graph.drain_events();

        assert_eq!(graph.remove_node(fx), Ok(true));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node(src).unwrap().outgoing().is_empty());
        let events = graph.drain_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events.last(), Some(&GraphEvent::NodeRemoved(fx)));
    }

    #[test]
    fn sink_and_fixed_sources_are_protected() {
        let mut graph = RoutingGraph::new(2);
        let src = graph.add_source(0, Position::default()).unwrap();
        assert_eq!(graph.remove_node(graph.sink()), Ok(false));
        assert_eq!(graph.remove_node(src), Ok(false));
        assert!(graph.node(src).is_some());

        let mut graph = RoutingGraph::new(2).with_source_policy(SourcePolicy::Removable);
        let src = graph.add_source(0, Position::default()).unwrap();
        assert_eq!(graph.remove_node(src), Ok(true));
        assert_eq!(graph.source(0), None);
        let again = graph.add_source(0, Position::default()).unwrap();
        assert_ne!(again, src);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut graph = RoutingGraph::new(2);
        let a = effect(&mut graph, EffectKind::Lowpass);
        graph.remove_node(a).unwrap();
        let b = effect(&mut graph, EffectKind::Lowpass);
        assert!(b.index() > a.index());
    }

    #[test]
    fn set_param_clamps_and_records_event() {
        let mut graph = RoutingGraph::new(2);
        let fx = effect(&mut graph, EffectKind::Lowpass);
        graph.drain_events();
        assert_eq!(graph.set_param(fx, "Cutoff", 99_999.0), Ok(16000.0));
        assert_eq!(
            graph.drain_events(),
            vec![GraphEvent::ParamChanged {
                node: fx,
                param: "cutoff",
                value: 16000.0
            }]
        );
        assert!(matches!(
            graph.set_param(fx, "bits", 4.0),
            Err(GraphError::Param(ParamError::UnknownParam { .. }))
        ));
        assert_eq!(
            graph.set_param(graph.sink(), "cutoff", 1.0),
            Err(GraphError::NotAnEffect(graph.sink()))
        );
    }

    #[test]
    fn replace_params_requires_same_kind() {
        let mut graph = RoutingGraph::new(2);
        let fx = effect(&mut graph, EffectKind::Echo);
        let other = EffectParams::defaults(EffectKind::Delay);
        assert!(matches!(
            graph.replace_params(fx, other),
            Err(GraphError::InvalidVariant(_))
        ));

        let mut same = EffectParams::defaults(EffectKind::Echo);
        same.set_named("mix", 80.0).unwrap();
        graph.drain_events();
        graph.replace_params(fx, same).unwrap();
        assert_eq!(graph.drain_events().len(), 1);
        assert_eq!(graph.effect(fx).and_then(|p| p.get_named("mix")), Some(80.0));
    }

    #[test]
    fn bypass_only_on_effects() {
        let mut graph = RoutingGraph::new(2);
        let fx = effect(&mut graph, EffectKind::Flanger);
        assert_eq!(graph.set_bypass(fx, true), Ok(true));
        assert_eq!(graph.set_bypass(fx, true), Ok(false));
        assert!(graph.is_bypassed(fx));
        assert_eq!(
            graph.set_bypass(graph.sink(), true),
            Err(GraphError::NotAnEffect(graph.sink()))
        );
    }

    #[test]
    fn disconnect_unknown_edge() {
        let mut graph = RoutingGraph::new(2);
        assert_eq!(
            graph.disconnect(EdgeId(3)),
            Err(GraphError::EdgeNotFound(EdgeId(3)))
        );
    }

    #[test]
    fn error_display() {
        let err = GraphError::WouldCreateCycle(NodeId(1), NodeId(2));
        assert_eq!(err.to_string(), "edge from NodeId(1) to NodeId(2) would create a cycle");
    }
}
