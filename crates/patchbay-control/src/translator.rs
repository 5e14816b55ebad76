//! Graph state to device commands.
//!
//! Translation is driven by the effect catalog: each kind's [`CommandShape`]
//! picks the command family and each parameter's
//! [`DeviceScale`](patchbay_core::DeviceScale) converts the stored value into
//! the device's units.
//!
//! Mutations are translated by comparing [`EffectSnapshot`]s taken before and
//! after the change. An effect is *live* on a channel when that channel feeds
//! it and it is not bypassed; only changes in liveness produce commands.
//!
//! ```text
//!   before ──┐                    ┌── deactivate lost (effect, channel)
//!            ├── transition() ────┼── activate gained (effect, channel)
//!   after  ──┘                    └── re-apply slot-mates of cleared slots
//! ```

use std::collections::{BTreeMap, BTreeSet};

use patchbay_core::{
    ChannelIndex, CommandShape, DeviceSlot, EffectKind, EffectParams, EffectScope, NodeId,
    RoutingGraph,
};

use crate::command::DeviceCommand;

/// Liveness of one effect node at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectState {
    /// Parameters at snapshot time.
    pub params: EffectParams,
    /// Channels the effect is applied to: its feed, or empty when bypassed.
    pub live: BTreeSet<ChannelIndex>,
}

/// Liveness of a set of effect nodes, keyed by node.
pub type EffectSnapshot = BTreeMap<NodeId, EffectState>;

/// Snapshot of the given nodes. Non-effect and unknown ids are skipped.
pub fn snapshot(graph: &RoutingGraph, nodes: impl IntoIterator<Item = NodeId>) -> EffectSnapshot {
    nodes
        .into_iter()
        .filter_map(|id| {
            let params = *graph.effect(id)?;
            let live = if graph.is_bypassed(id) {
                BTreeSet::new()
            } else {
                graph.tracks_feeding(id)
            };
            Some((id, EffectState { params, live }))
        })
        .collect()
}

/// Snapshot of every effect node in the graph.
pub fn snapshot_all(graph: &RoutingGraph) -> EffectSnapshot {
    let ids: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.effect().is_some())
        .map(|n| n.id)
        .collect();
    snapshot(graph, ids)
}

fn device_value(params: &EffectParams, key: &str) -> Option<f32> {
    let desc = params.kind().param(key)?;
    params.get_named(key).map(|v| desc.to_device(v))
}

fn device_byte(value: Option<f32>) -> u8 {
    value.map_or(0, |v| v.round().clamp(0.0, 255.0) as u8)
}

/// Commands that apply `params` to `track`.
///
/// Global kinds ignore `track` and program the device-wide instance.
pub fn activate(params: &EffectParams, track: ChannelIndex) -> Vec<DeviceCommand> {
    let v = |key: &str| device_value(params, key);
    match params.kind().command_shape() {
        CommandShape::Filter { code, with_gain } => vec![DeviceCommand::SetTrackFilter {
            track,
            filter_type: code,
            cutoff: v("cutoff").unwrap_or(1000.0),
            resonance: v("resonance").unwrap_or(1.0),
            gain: if with_gain { v("gain") } else { None },
        }],
        CommandShape::BitCrush => vec![DeviceCommand::SetTrackBitCrush {
            track,
            value: device_byte(v("bits")),
        }],
        CommandShape::Distortion => vec![DeviceCommand::SetTrackDistortion {
            track,
            amount: v("amount").unwrap_or_default(),
            mode: device_byte(v("mode")),
        }],
        CommandShape::Echo => vec![DeviceCommand::SetTrackEcho {
            track,
            active: true,
            time: v("time"),
            feedback: v("feedback"),
            mix: v("mix"),
        }],
        CommandShape::Flanger => vec![DeviceCommand::SetTrackFlanger {
            track,
            active: true,
            rate: v("rate"),
            depth: v("depth"),
            feedback: v("feedback"),
        }],
        CommandShape::Compressor => vec![DeviceCommand::SetTrackCompressor {
            track,
            active: true,
            threshold: v("threshold"),
            ratio: v("ratio"),
        }],
        CommandShape::Phaser => vec![
            DeviceCommand::SetPhaserActive { value: true },
            DeviceCommand::SetPhaserRate {
                value: v("rate").unwrap_or_default(),
            },
            DeviceCommand::SetPhaserDepth {
                value: v("depth").unwrap_or_default(),
            },
            DeviceCommand::SetPhaserFeedback {
                value: v("feedback").unwrap_or_default(),
            },
        ],
    }
}

/// Commands that switch off the slot `kind` occupies on `track`.
pub fn deactivate(kind: EffectKind, track: ChannelIndex) -> Vec<DeviceCommand> {
    let cmd = match kind.command_shape() {
        CommandShape::Filter { .. } => DeviceCommand::ClearTrackFilter { track },
        CommandShape::BitCrush | CommandShape::Distortion => DeviceCommand::ClearTrackFx { track },
        CommandShape::Echo => DeviceCommand::SetTrackEcho {
            track,
            active: false,
            time: None,
            feedback: None,
            mix: None,
        },
        CommandShape::Flanger => DeviceCommand::SetTrackFlanger {
            track,
            active: false,
            rate: None,
            depth: None,
            feedback: None,
        },
        CommandShape::Compressor => DeviceCommand::SetTrackCompressor {
            track,
            active: false,
            threshold: None,
            ratio: None,
        },
        CommandShape::Phaser => DeviceCommand::SetPhaserActive { value: false },
    };
    vec![cmd]
}

/// Activation of `state` on every live channel (once for global kinds).
pub fn activate_live(state: &EffectState) -> Vec<DeviceCommand> {
    match state.params.kind().scope() {
        EffectScope::PerChannel => state
            .live
            .iter()
            .flat_map(|&ch| activate(&state.params, ch))
            .collect(),
        EffectScope::Global if state.live.is_empty() => Vec::new(),
        EffectScope::Global => activate(&state.params, 0),
    }
}

/// Deactivation of `state` on every live channel (once for global kinds).
pub fn deactivate_live(state: &EffectState) -> Vec<DeviceCommand> {
    let kind = state.params.kind();
    match kind.scope() {
        EffectScope::PerChannel => state
            .live
            .iter()
            .flat_map(|&ch| deactivate(kind, ch))
            .collect(),
        EffectScope::Global if state.live.is_empty() => Vec::new(),
        EffectScope::Global => deactivate(kind, 0),
    }
}

/// Inactive defaults sent to every slot of `track` when resynchronizing.
pub fn reset_track(track: ChannelIndex) -> Vec<DeviceCommand> {
    vec![
        DeviceCommand::ClearTrackFilter { track },
        DeviceCommand::ClearTrackFx { track },
        DeviceCommand::SetTrackEcho {
            track,
            active: false,
            time: Some(200.0),
            feedback: Some(40.0),
            mix: Some(50.0),
        },
        DeviceCommand::SetTrackFlanger {
            track,
            active: false,
            rate: Some(30.0),
            depth: Some(50.0),
            feedback: Some(40.0),
        },
        DeviceCommand::SetTrackCompressor {
            track,
            active: false,
            threshold: Some(60.0),
            ratio: Some(4.0),
        },
    ]
}

/// Device-wide reset after the per-channel bursts.
pub fn reset_global() -> Vec<DeviceCommand> {
    vec![DeviceCommand::SetPhaserActive { value: false }]
}

/// A (slot, channel) pair; `None` addresses the global instance.
type SlotKey = (DeviceSlot, Option<ChannelIndex>);

fn slot_key(kind: EffectKind, ch: ChannelIndex) -> SlotKey {
    match kind.scope() {
        EffectScope::PerChannel => (kind.slot(), Some(ch)),
        EffectScope::Global => (kind.slot(), None),
    }
}

/// Commands moving the device from `before` to `after`.
///
/// Emits, in order: deactivations for every (effect, channel) that stopped
/// being live, activations for every pair that became live, then re-applies
/// any other live effect in `graph` sharing a cleared slot on the same
/// channel. Global kinds activate when their live set becomes non-empty and
/// deactivate when it becomes empty.
///
/// `graph` must be the post-mutation graph.
pub fn transition(
    graph: &RoutingGraph,
    before: &EffectSnapshot,
    after: &EffectSnapshot,
) -> Vec<DeviceCommand> {
    let empty = BTreeSet::new();
    let mut out = Vec::new();
    let mut cleared: BTreeSet<SlotKey> = BTreeSet::new();
    let mut applied: BTreeSet<(NodeId, SlotKey)> = BTreeSet::new();

    for (id, old) in before {
        let kind = old.params.kind();
        let now_live = after.get(id).map_or(&empty, |s| &s.live);
        match kind.scope() {
            EffectScope::PerChannel => {
                for &ch in old.live.difference(now_live) {
                    out.extend(deactivate(kind, ch));
                    cleared.insert(slot_key(kind, ch));
                }
            }
            EffectScope::Global => {
                if !old.live.is_empty() && now_live.is_empty() {
                    out.extend(deactivate(kind, 0));
                    cleared.insert(slot_key(kind, 0));
                }
            }
        }
    }

    for (id, new) in after {
        let kind = new.params.kind();
        let was_live = before.get(id).map_or(&empty, |s| &s.live);
        match kind.scope() {
            EffectScope::PerChannel => {
                for &ch in new.live.difference(was_live) {
                    out.extend(activate(&new.params, ch));
                    applied.insert((*id, slot_key(kind, ch)));
                }
            }
            EffectScope::Global => {
                if was_live.is_empty() && !new.live.is_empty() {
                    out.extend(activate(&new.params, 0));
                    applied.insert((*id, slot_key(kind, 0)));
                }
            }
        }
    }

    if !cleared.is_empty() {
        for (id, state) in snapshot_all(graph) {
            let kind = state.params.kind();
            for &slot in &cleared {
                let hit = match slot.1 {
                    Some(ch) => slot.0 == kind.slot() && state.live.contains(&ch),
                    None => slot.0 == kind.slot() && !state.live.is_empty(),
                };
                if hit && applied.insert((id, slot)) {
                    out.extend(activate(&state.params, slot.1.unwrap_or(0)));
                }
            }
        }
    }

    out
}

/// Activation of an effect's current values on every live channel.
///
/// Used after a parameter change; empty for bypassed or unfed effects.
pub fn refresh(graph: &RoutingGraph, node: NodeId) -> Vec<DeviceCommand> {
    snapshot(graph, [node])
        .get(&node)
        .map(activate_live)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::{NodeKind, Position};

    fn fx(graph: &mut RoutingGraph, id: &str) -> NodeId {
        graph
            .add_node(NodeKind::from_catalog(id).unwrap(), Position::default())
            .unwrap()
    }

    #[test]
    fn filter_activation_carries_type_code() {
        let params = EffectParams::defaults(EffectKind::Highpass);
        assert_eq!(
            activate(&params, 5),
            vec![DeviceCommand::SetTrackFilter {
                track: 5,
                filter_type: 2,
                cutoff: 1000.0,
                resonance: 0.707,
                gain: None,
            }]
        );
    }

    #[test]
    fn shelf_gets_unit_resonance_and_gain() {
        let params = EffectParams::defaults(EffectKind::Lowshelf);
        let cmds = activate(&params, 0);
        let [
            DeviceCommand::SetTrackFilter {
                filter_type,
                resonance,
                gain,
                ..
            },
        ] = cmds.as_slice()
        else {
            panic!("expected one filter command");
        };
        assert_eq!(*filter_type, 7);
        assert_eq!(*resonance, 1.0);
        assert_eq!(*gain, Some(6.0));
    }

    #[test]
    fn compressor_threshold_is_scaled_to_db() {
        let mut params = EffectParams::defaults(EffectKind::Compressor);
        params.set_named("threshold", 60.0).unwrap();
        let cmds = activate(&params, 1);
        let DeviceCommand::SetTrackCompressor {
            threshold: Some(db),
            ratio,
            active: true,
            ..
        } = cmds[0]
        else {
            panic!("expected compressor command");
        };
        assert!((db - -24.0).abs() < 1e-4);
        assert_eq!(ratio, Some(4.0));
    }

    #[test]
    fn bitcrusher_rounds_bits() {
        let mut params = EffectParams::defaults(EffectKind::Bitcrusher);
        params.set_named("bits", 6.6).unwrap();
        assert_eq!(
            activate(&params, 0),
            vec![DeviceCommand::SetTrackBitCrush { track: 0, value: 7 }]
        );
    }

    #[test]
    fn phaser_activation_is_a_command_set() {
        let params = EffectParams::defaults(EffectKind::Phaser);
        let cmds = activate(&params, 9);
        assert_eq!(cmds.len(), 4);
        assert_eq!(cmds[0], DeviceCommand::SetPhaserActive { value: true });
        assert!(cmds.iter().all(|c| c.track().is_none()));
    }

    #[test]
    fn deactivations_match_slots() {
        assert_eq!(
            deactivate(EffectKind::Notch, 1),
            vec![DeviceCommand::ClearTrackFilter { track: 1 }]
        );
        assert_eq!(
            deactivate(EffectKind::Distortion, 1),
            vec![DeviceCommand::ClearTrackFx { track: 1 }]
        );
        assert!(deactivate(EffectKind::Delay, 1)[0].is_deactivation());
        assert_eq!(
            deactivate(EffectKind::Phaser, 1),
            vec![DeviceCommand::SetPhaserActive { value: false }]
        );
    }

    #[test]
    fn reset_track_is_five_commands() {
        let cmds = reset_track(3);
        assert_eq!(cmds.len(), 5);
        assert!(cmds.iter().all(|c| c.track() == Some(3)));
        assert!(cmds.iter().all(DeviceCommand::is_deactivation));
    }

    #[test]
    fn connect_transition_activates_gained_channels() {
        let mut g = RoutingGraph::new(4);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let s1 = g.add_source(1, Position::default()).unwrap();
        let lpf = fx(&mut g, "lowpass");
        let dly = fx(&mut g, "delay");
        g.connect(s0, lpf).unwrap();
        g.connect(lpf, dly).unwrap();

        let before = snapshot(&g, g.downstream_effects(lpf));
        g.connect(s1, lpf).unwrap();
        let after = snapshot(&g, g.downstream_effects(lpf));

        let cmds = transition(&g, &before, &after);
        assert_eq!(cmds.len(), 2);
        assert!(cmds.iter().all(|c| c.track() == Some(1)));
        assert_eq!(cmds[0].name(), "setTrackFilter");
        assert_eq!(cmds[1].name(), "setTrackEcho");
    }

    #[test]
    fn disconnect_reapplies_slot_mate() {
        // Two filters on channel 0 share the filter slot. Dropping one must
        // not leave the channel unfiltered.
        let mut g = RoutingGraph::new(2);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let lpf = fx(&mut g, "lowpass");
        let hpf = fx(&mut g, "highpass");
        g.connect(s0, lpf).unwrap();
        let e = g.connect(s0, hpf).unwrap();

        let before = snapshot(&g, [hpf]);
        g.disconnect(e).unwrap();
        let after = snapshot(&g, [hpf]);

        let cmds = transition(&g, &before, &after);
        assert_eq!(cmds[0], DeviceCommand::ClearTrackFilter { track: 0 });
        let DeviceCommand::SetTrackFilter { filter_type, .. } = cmds[1] else {
            panic!("expected re-applied filter");
        };
        assert_eq!(filter_type, 1);
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn global_effect_toggles_once() {
        let mut g = RoutingGraph::new(4);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let s1 = g.add_source(1, Position::default()).unwrap();
        let ph = fx(&mut g, "phaser");

        let before = snapshot(&g, [ph]);
        g.connect(s0, ph).unwrap();
        let mid = snapshot(&g, [ph]);
        assert_eq!(transition(&g, &before, &mid).len(), 4);

        let e1 = g.connect(s1, ph).unwrap();
        let after = snapshot(&g, [ph]);
        assert!(transition(&g, &mid, &after).is_empty());

        g.disconnect(e1).unwrap();
        let fewer = snapshot(&g, [ph]);
        assert!(transition(&g, &after, &fewer).is_empty());
    }

    #[test]
    fn bypassed_effects_are_not_live() {
        let mut g = RoutingGraph::new(2);
        let s0 = g.add_source(0, Position::default()).unwrap();
        let lpf = fx(&mut g, "lowpass");
        g.set_bypass(lpf, true).unwrap();
        g.connect(s0, lpf).unwrap();
        assert!(snapshot(&g, [lpf])[&lpf].live.is_empty());
        assert!(refresh(&g, lpf).is_empty());
    }
}
