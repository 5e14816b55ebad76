//! Resynchronization after the device link comes up.
//!
//! The device may have rebooted or been driven by another client while the
//! link was down, so its effect state is unknown. The plan resets every
//! channel to inactive defaults, then replays the graph edge by edge, each
//! replay walking on to everything the edge feeds. Steps
//! are staggered so the burst does not flood the link.
//!
//! ```text
//! t=0                 volumes request
//! t=k·stagger         reset channel k            (k = 0..channels)
//! t=channels·stagger  global reset
//! t=span+margin+i·stagger  replay edge i          (i < max_replay)
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use patchbay_config::ReconcileSettings;
use patchbay_core::{ChannelIndex, EdgeId, EffectScope, RoutingGraph};

use crate::command::DeviceCommand;
use crate::translator;

/// One timed step of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    /// Ask the device for channel volumes.
    RequestVolumes,
    /// Send the inactive-defaults burst for a channel.
    ResetTrack(ChannelIndex),
    /// Send the device-wide reset.
    ResetGlobal,
    /// Re-activate the effect an edge feeds.
    ReplayEdge(EdgeId),
}

/// Timed steps, relative to the moment the link came up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Steps with their offsets, in firing order.
    pub steps: Vec<(Duration, ReconcileStep)>,
    /// Edges left out because the replay cap was reached.
    pub overflow: usize,
}

impl ReconcilePlan {
    /// Number of replay steps.
    pub fn replay_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|(_, s)| matches!(s, ReconcileStep::ReplayEdge(_)))
            .count()
    }
}

/// Builds the reconciliation plan for the current graph.
///
/// Edges are replayed in id order; past `max_replay` they are dropped and
/// a single warning is logged.
pub fn plan(graph: &RoutingGraph, settings: &ReconcileSettings) -> ReconcilePlan {
    let stagger = settings.stagger();
    let channels = u32::from(graph.channel_count());
    let mut steps = Vec::with_capacity(channels as usize + 2);

    steps.push((Duration::ZERO, ReconcileStep::RequestVolumes));
    for ch in 0..graph.channel_count() {
        steps.push((stagger * u32::from(ch), ReconcileStep::ResetTrack(ch)));
    }
    let reset_span = stagger * channels;
    steps.push((reset_span, ReconcileStep::ResetGlobal));

    let mut edges: Vec<EdgeId> = graph.edges().map(|e| e.id).collect();
    edges.sort();
    let overflow = edges.len().saturating_sub(settings.max_replay);
    if overflow > 0 {
        tracing::warn!(
            edges = edges.len(),
            max_replay = settings.max_replay,
            overflow,
            "reconciliation overflow, not replaying every edge"
        );
    }
    let replay_start = reset_span + settings.replay_margin();
    for (i, edge) in edges.into_iter().take(settings.max_replay).enumerate() {
        let offset = replay_start + stagger * i as u32;
        steps.push((offset, ReconcileStep::ReplayEdge(edge)));
    }

    tracing::info!(
        channels,
        replays = steps.len() - channels as usize - 2,
        "reconciliation planned"
    );
    ReconcilePlan { steps, overflow }
}

/// Commands for one step against the current graph.
///
/// A replayed edge activates its target on every channel feeding it, then
/// walks on through every edge leaving the target, so effects behind a bus
/// or another effect are reached even when their own incoming edges fall
/// past the replay cap. Each node is expanded once per step. Buses, the
/// sink, and bypassed effects activate nothing but still pass the walk on.
pub fn commands_for(graph: &RoutingGraph, step: ReconcileStep) -> Vec<DeviceCommand> {
    match step {
        ReconcileStep::RequestVolumes => vec![DeviceCommand::GetTrackVolumes],
        ReconcileStep::ResetTrack(ch) => translator::reset_track(ch),
        ReconcileStep::ResetGlobal => translator::reset_global(),
        ReconcileStep::ReplayEdge(id) => replay_from(graph, id),
    }
}

fn replay_from(graph: &RoutingGraph, start: EdgeId) -> Vec<DeviceCommand> {
    let Some(edge) = graph.edge(start) else {
        return Vec::new();
    };
    let mut cmds = Vec::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![edge.to];
    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        if let Some(params) = graph.effect(node).filter(|_| !graph.is_bypassed(node)) {
            let tracks = graph.tracks_feeding(node);
            match params.kind().scope() {
                EffectScope::PerChannel => cmds.extend(
                    tracks
                        .iter()
                        .flat_map(|&ch| translator::activate(params, ch)),
                ),
                EffectScope::Global if tracks.is_empty() => {}
                EffectScope::Global => cmds.extend(translator::activate(params, 0)),
            }
        }
        if let Some(n) = graph.node(node) {
            // Reverse so the first outgoing edge is expanded first.
            stack.extend(
                n.outgoing()
                    .iter()
                    .rev()
                    .filter_map(|&e| graph.edge(e))
                    .map(|e| e.to),
            );
        }
    }
    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::{NamedColor, NodeKind, Position};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn empty_graph_resets_without_replay() {
        let g = RoutingGraph::new(16);
        let plan = plan(&g, &ReconcileSettings::default());
        assert_eq!(plan.replay_count(), 0);
        assert_eq!(plan.overflow, 0);
        assert_eq!(plan.steps.len(), 18);
        assert_eq!(plan.steps[1], (ms(0), ReconcileStep::ResetTrack(0)));
        assert_eq!(plan.steps[16], (ms(510), ReconcileStep::ResetTrack(15)));
        assert_eq!(plan.steps[17], (ms(544), ReconcileStep::ResetGlobal));
    }

    #[test]
    fn edges_replay_after_margin() {
        let mut g = RoutingGraph::new(16);
        let s = g.add_source(0, Position::default()).unwrap();
        let fx = g
            .add_node(NodeKind::from_catalog("delay").unwrap(), Position::default())
            .unwrap();
        g.connect(s, fx).unwrap();
        g.connect(fx, g.sink()).unwrap();

        let plan = plan(&g, &ReconcileSettings::default());
        assert_eq!(plan.replay_count(), 2);
        let replays: Vec<Duration> = plan
            .steps
            .iter()
            .filter(|(_, s)| matches!(s, ReconcileStep::ReplayEdge(_)))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(replays, [ms(624), ms(658)]);
    }

    #[test]
    fn replay_is_capped() {
        let mut g = RoutingGraph::new(16);
        for ch in 0..16 {
            let s = g.add_source(ch, Position::default()).unwrap();
            g.connect(s, g.sink()).unwrap();
        }
        let settings = ReconcileSettings {
            max_replay: 10,
            ..ReconcileSettings::default()
        };
        let plan = plan(&g, &settings);
        assert_eq!(plan.replay_count(), 10);
        assert_eq!(plan.overflow, 6);
    }

    #[test]
    fn replay_commands_follow_edge_target() {
        let mut g = RoutingGraph::new(4);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let s2 = g.add_source(2, Position::default()).unwrap();
        let fx = g
            .add_node(NodeKind::from_catalog("lowpass").unwrap(), Position::default())
            .unwrap();
        let e0 = g.connect(s0, fx).unwrap();
        g.connect(s2, fx).unwrap();
        let out = g.connect(fx, g.sink()).unwrap();

        let cmds = commands_for(&g, ReconcileStep::ReplayEdge(e0));
        let tracks: Vec<u8> = cmds.iter().filter_map(DeviceCommand::track).collect();
        assert_eq!(tracks, [0, 2]);
        assert!(cmds.iter().all(|c| c.name() == "setTrackFilter"));
        assert!(commands_for(&g, ReconcileStep::ReplayEdge(out)).is_empty());

        g.disconnect(e0).unwrap();
        assert!(commands_for(&g, ReconcileStep::ReplayEdge(e0)).is_empty());
    }

    #[test]
    fn replay_walks_through_bus() {
        let mut g = RoutingGraph::new(4);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let s1 = g.add_source(1, Position::default()).unwrap();
        let bus = g
            .add_node(NodeKind::bus("BUS A", NamedColor::Teal), Position::default())
            .unwrap();
        let lpf = g
            .add_node(NodeKind::from_catalog("lowpass").unwrap(), Position::default())
            .unwrap();
        let dly = g
            .add_node(NodeKind::from_catalog("delay").unwrap(), Position::default())
            .unwrap();
        let into_bus = g.connect(s0, bus).unwrap();
        g.connect(s1, bus).unwrap();
        g.connect(bus, lpf).unwrap();
        g.connect(lpf, dly).unwrap();
        g.connect(dly, g.sink()).unwrap();

        let cmds = commands_for(&g, ReconcileStep::ReplayEdge(into_bus));
        let names: Vec<(&str, Option<u8>)> = cmds.iter().map(|c| (c.name(), c.track())).collect();
        assert_eq!(
            names,
            [
                ("setTrackFilter", Some(0)),
                ("setTrackFilter", Some(1)),
                ("setTrackEcho", Some(0)),
                ("setTrackEcho", Some(1)),
            ]
        );
    }

    #[test]
    fn capped_replay_still_reaches_effect_behind_bus() {
        let mut g = RoutingGraph::new(1);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let bus = g
            .add_node(NodeKind::bus("BUS A", NamedColor::Teal), Position::default())
            .unwrap();
        let lpf = g
            .add_node(NodeKind::from_catalog("lowpass").unwrap(), Position::default())
            .unwrap();
        g.connect(s0, bus).unwrap();
        g.connect(bus, lpf).unwrap();
        let settings = ReconcileSettings {
            max_replay: 1,
            ..ReconcileSettings::default()
        };

        let plan = plan(&g, &settings);
        assert_eq!(plan.overflow, 1);
        let cmds: Vec<DeviceCommand> = plan
            .steps
            .iter()
            .filter(|(_, s)| matches!(s, ReconcileStep::ReplayEdge(_)))
            .flat_map(|&(_, s)| commands_for(&g, s))
            .collect();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name(), "setTrackFilter");
        assert_eq!(cmds[0].track(), Some(0));
    }

    #[test]
    fn bypassed_effect_passes_replay_on() {
        let mut g = RoutingGraph::new(1);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let comp = g
            .add_node(NodeKind::from_catalog("compressor").unwrap(), Position::default())
            .unwrap();
        let lpf = g
            .add_node(NodeKind::from_catalog("lowpass").unwrap(), Position::default())
            .unwrap();
        let first = g.connect(s0, comp).unwrap();
        g.connect(comp, lpf).unwrap();
        g.set_bypass(comp, true).unwrap();

        let cmds = commands_for(&g, ReconcileStep::ReplayEdge(first));
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name(), "setTrackFilter");
    }
}
