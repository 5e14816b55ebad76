//! End-to-end session behavior on a virtual clock.

use std::collections::BTreeMap;
use std::time::Duration;

use patchbay_config::{MemoryStore, SceneLibrary, Settings, get_factory_preset};
use patchbay_control::{
    DeviceCommand, MACROS_KEY, Macro, MacroBank, MacroScene, Notice, Patchbay, RecordingChannel,
    SceneOutcome,
};
use patchbay_core::{GraphError, NamedColor, NodeId, NodeKind, Position};
use proptest::prelude::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn session() -> Patchbay<RecordingChannel> {
    Patchbay::new(Settings::default(), RecordingChannel::new())
}

fn source(pb: &Patchbay<RecordingChannel>, ch: u8) -> NodeId {
    pb.graph().source(ch).unwrap()
}

fn effect_count(pb: &Patchbay<RecordingChannel>) -> usize {
    pb.graph().nodes().filter(|n| n.effect().is_some()).count()
}

fn bus_names(pb: &Patchbay<RecordingChannel>) -> Vec<String> {
    pb.graph()
        .nodes()
        .filter_map(|n| match &n.kind {
            NodeKind::Bus { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn cutoff_of(cmd: &DeviceCommand) -> f32 {
    match cmd {
        DeviceCommand::SetTrackFilter { cutoff, .. } => *cutoff,
        other => panic!("expected a filter command, got {other:?}"),
    }
}

#[test]
fn debounce_coalesces_rapid_updates() {
    let mut pb = session();
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    pb.connect(source(&pb, 0), lpf).unwrap();
    pb.run_until(ms(50));
    pb.channel_mut().take();

    for i in 0..10u16 {
        pb.adjust_param(lpf, "cutoff", 1000.0 + f32::from(i) * 100.0, ms(100 + u64::from(i)))
            .unwrap();
    }
    assert_eq!(pb.graph().effect(lpf).unwrap().get_named("cutoff"), Some(1900.0));
    pb.run_until(ms(140));
    assert!(pb.channel().sent().is_empty());
    pb.run_until(ms(200));
    let cmds = pb.channel().commands();
    assert_eq!(cmds.len(), 1);
    assert_eq!(cutoff_of(&cmds[0]), 1900.0);

    pb.adjust_param(lpf, "cutoff", 3000.0, ms(300)).unwrap();
    pb.commit_param(lpf, "cutoff", 2500.0).unwrap();
    pb.run_until(ms(500));
    let cmds = pb.channel().commands();
    assert_eq!(cmds.len(), 2);
    assert_eq!(cutoff_of(&cmds[1]), 2500.0);
}

#[test]
fn reconciliation_on_empty_graph_is_reset_only() {
    let mut pb = session();
    pb.on_channel_up(ms(0));
    pb.run_until(ms(5_000));

    let cmds = pb.channel().commands();
    assert_eq!(cmds.len(), 1 + 16 * 5 + 1);
    assert_eq!(cmds[0], DeviceCommand::GetTrackVolumes);
    assert_eq!(
        cmds.last(),
        Some(&DeviceCommand::SetPhaserActive { value: false })
    );
    assert_eq!(
        cmds.iter().filter(|c| c.name() == "clearTrackFilter").count(),
        16
    );
    assert!(cmds[1..].iter().all(DeviceCommand::is_deactivation));
    assert_eq!(pb.dispatch_stats().dropped_overflow, 0);
}

#[test]
fn reconciliation_replays_every_edge() {
    let mut pb = session();
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    for ch in 0..4 {
        pb.connect(source(&pb, ch), lpf).unwrap();
    }
    pb.connect(lpf, pb.graph().sink()).unwrap();
    pb.run_until(ms(1_000));
    pb.channel_mut().take();

    pb.on_channel_up(ms(2_000));
    pb.run_until(ms(10_000));
    let cmds = pb.channel().commands();
    // Every edge into the filter replays it on all four feeding channels.
    assert_eq!(cmds.len(), 82 + 16);
    let replayed: Vec<u8> = cmds[82..].iter().filter_map(DeviceCommand::track).collect();
    assert_eq!(replayed, [0u8, 1, 2, 3].repeat(4));
    assert!(cmds[82..].iter().all(|c| c.name() == "setTrackFilter"));
}

#[test]
fn reconnect_discards_stale_queue() {
    let mut pb = session();
    let dly = pb.add_effect("delay", Position::default()).unwrap();
    for ch in 0..8 {
        pb.connect(source(&pb, ch), dly).unwrap();
    }
    // Each connect re-activates the delay on every channel feeding it.
    assert_eq!(pb.pending_sends(), 36);
    pb.on_channel_up(ms(0));
    assert_eq!(pb.pending_sends(), 0);
}

#[test]
fn removing_only_edge_into_effect_deactivates_each_channel() {
    let mut pb = session();
    let bus = pb
        .add_node(NodeKind::bus("DRUMS", NamedColor::Gold), Position::default())
        .unwrap();
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    pb.connect(source(&pb, 0), bus).unwrap();
    pb.connect(source(&pb, 1), bus).unwrap();
    let feed = pb.connect(bus, lpf).unwrap();
    pb.run_until(ms(100));
    pb.channel_mut().take();

    pb.disconnect(feed).unwrap();
    pb.run_until(ms(200));
    assert!(pb.graph().tracks_feeding(lpf).is_empty());
    assert_eq!(
        pb.channel().commands(),
        vec![
            DeviceCommand::ClearTrackFilter { track: 0 },
            DeviceCommand::ClearTrackFilter { track: 1 },
        ]
    );
}

#[test]
fn removing_effect_deactivates_downstream() {
    let mut pb = session();
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    let dly = pb.add_effect("delay", Position::default()).unwrap();
    pb.connect(source(&pb, 0), lpf).unwrap();
    pb.connect(lpf, dly).unwrap();
    pb.run_until(ms(100));
    assert_eq!(pb.channel_mut().take().len(), 2);

    assert!(pb.remove_node(lpf).unwrap());
    pb.run_until(ms(200));
    let cmds = pb.channel().commands();
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds[0], DeviceCommand::ClearTrackFilter { track: 0 });
    assert!(matches!(
        cmds[1],
        DeviceCommand::SetTrackEcho {
            track: 0,
            active: false,
            ..
        }
    ));

    assert!(!pb.remove_node(pb.graph().sink()).unwrap());
    assert!(!pb.remove_node(source(&pb, 3)).unwrap());
}

#[test]
fn lowpass_chain_rejects_edges_into_sources() {
    let mut pb = session();
    let s0 = source(&pb, 0);
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    pb.connect(s0, lpf).unwrap();
    pb.connect(lpf, pb.graph().sink()).unwrap();
    assert_eq!(
        pb.graph().effect(lpf).unwrap().get_named("cutoff"),
        Some(1000.0)
    );

    let sink = pb.graph().sink();
    assert!(matches!(
        pb.connect(sink, s0),
        Err(GraphError::InvalidEndpointType { .. })
    ));
    assert!(matches!(
        pb.connect(lpf, s0),
        Err(GraphError::InvalidEndpointType { .. })
    ));
    assert_eq!(pb.graph().edge_count(), 2);
}

#[test]
fn preset_waits_for_step_boundary_while_playing() {
    let mut pb = session();
    let preset = get_factory_preset("dub-echo").unwrap();
    pb.on_message(r#"{"type":"playState","playing":true}"#, ms(0));

    assert_eq!(pb.apply_preset(&preset, ms(10)).unwrap(), SceneOutcome::Queued);
    for step in 1u64..4 {
        pb.on_message(&format!(r#"{{"step":{step}}}"#), ms(10 + step * 100));
        assert_eq!(effect_count(&pb), 0);
    }
    pb.on_message(r#"{"step":"4"}"#, ms(500));
    assert_eq!(effect_count(&pb), 3);
    assert_eq!(bus_names(&pb), ["BUS A", "BUS B"]);

    let notices = pb.drain_notices();
    assert!(matches!(notices[0], Notice::SceneQueued { .. }));
    assert!(matches!(
        notices[1],
        Notice::SceneApplied {
            skipped_edges: 0,
            ..
        }
    ));

    // 16 channels through delay, reverb, and lowpass.
    pb.run_until(ms(10_000));
    assert_eq!(pb.channel().sent().len(), 48);
}

#[test]
fn step_messages_alone_count_as_playing() {
    let mut pb = session();
    pb.on_message(r#"{"step":1}"#, ms(0));
    let preset = get_factory_preset("808-boom").unwrap();
    assert_eq!(pb.apply_preset(&preset, ms(100)).unwrap(), SceneOutcome::Queued);
    pb.on_message(r#"{"step":2}"#, ms(200));
    assert_eq!(effect_count(&pb), 0);
    pb.on_message(r#"{"step":4}"#, ms(300));
    assert!(effect_count(&pb) > 0);
}

#[test]
fn stopping_keeps_pending_scene_until_flushed() {
    let mut pb = session();
    pb.on_message(r#"{"type":"status","playing":true}"#, ms(0));
    let preset = get_factory_preset("telephone").unwrap();
    assert_eq!(pb.apply_preset(&preset, ms(0)).unwrap(), SceneOutcome::Queued);
    pb.on_message(r#"{"type":"status","playing":false}"#, ms(10));
    assert!(pb.scene_controller().pending().is_some());
    assert!(pb.flush_pending_scene().is_some());
    assert!(effect_count(&pb) > 0);
    assert!(pb.flush_pending_scene().is_none());
}

#[test]
fn preset_keeps_layout_and_buses() {
    let mut pb = session();
    let bus_a = pb
        .graph()
        .nodes()
        .find(|n| matches!(&n.kind, NodeKind::Bus { name, .. } if name == "BUS A"))
        .map(|n| n.id)
        .unwrap();
    pb.move_node(bus_a, Position::new(1800.0, 200.0)).unwrap();
    let s5 = pb.graph().node(source(&pb, 5)).unwrap().position;

    let preset = get_factory_preset("808-boom").unwrap();
    let SceneOutcome::Applied(report) = pb.apply_preset(&preset, ms(0)).unwrap() else {
        panic!("stopped transport applies immediately");
    };
    assert!(report.skipped.is_empty());
    assert_eq!(pb.graph().node(source(&pb, 5)).unwrap().position, s5);
    let moved = pb
        .graph()
        .nodes()
        .find(|n| matches!(&n.kind, NodeKind::Bus { name, .. } if name == "BUS A"))
        .unwrap();
    assert_eq!(moved.position, Position::new(1800.0, 200.0));
    assert_eq!(pb.graph().tracks_feeding(pb.graph().sink()).len(), 16);
}

#[test]
fn replacing_a_scene_deactivates_then_activates() {
    let mut pb = session();
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    pb.connect(source(&pb, 0), lpf).unwrap();
    let saved = pb.capture_scene();
    pb.run_until(ms(100));
    pb.channel_mut().take();

    let hpf = pb.add_effect("highpass", Position::default()).unwrap();
    pb.connect(source(&pb, 0), hpf).unwrap();
    pb.connect(source(&pb, 1), hpf).unwrap();
    pb.run_until(ms(200));
    pb.channel_mut().take();

    pb.apply_scene(saved, "back", ms(300));
    pb.run_until(ms(1_000));
    let cmds = pb.channel().commands();
    // lowpass and highpass off on channel 0, highpass off on 1, lowpass back on 0
    assert_eq!(cmds.len(), 4);
    assert_eq!(cmds.iter().filter(|c| c.is_deactivation()).count(), 3);
    assert_eq!(cmds[3].name(), "setTrackFilter");
    assert_eq!(cmds[3].track(), Some(0));
}

#[test]
fn startup_graph_round_trips_through_library() {
    let mut library = SceneLibrary::new(MemoryStore::new());
    let mut pb = session();
    let comp = pb.add_effect("compressor", Position::new(900.0, 300.0)).unwrap();
    pb.commit_param(comp, "ratio", 9.0).unwrap();
    pb.set_bypass(comp, true).unwrap();
    pb.connect(source(&pb, 2), comp).unwrap();
    pb.connect(comp, pb.graph().sink()).unwrap();
    pb.save_startup_graph(&mut library).unwrap();

    let mut fresh = session();
    let report = fresh.load_startup_graph(&library).unwrap();
    assert!(report.skipped.is_empty());
    let restored = fresh
        .graph()
        .nodes()
        .find(|n| n.effect().is_some())
        .unwrap();
    assert!(restored.bypassed);
    assert_eq!(restored.effect().unwrap().get_named("ratio"), Some(9.0));
    assert_eq!(fresh.graph().edge_count(), 2);
    assert_eq!(bus_names(&fresh), ["BUS A", "BUS B"]);
    fresh.run_until(ms(1_000));
    assert!(fresh.channel().sent().is_empty());

    let empty = SceneLibrary::new(MemoryStore::new());
    assert!(fresh.load_startup_graph(&empty).is_none());
}

#[test]
fn filter_broadcast_syncs_matching_effect() {
    let mut pb = session();
    let bpf = pb.add_effect("bandpass", Position::default()).unwrap();
    pb.connect(source(&pb, 6), bpf).unwrap();
    pb.on_message(
        r#"{"type":"trackFilterSet","success":true,"track":6,"filterType":3,"cutoff":2400,"resonance":4}"#,
        ms(0),
    );
    let params = pb.graph().effect(bpf).unwrap();
    assert_eq!(params.get_named("cutoff"), Some(2400.0));
    assert_eq!(params.get_named("resonance"), Some(4.0));

    pb.on_message(
        r#"{"type":"trackFilterSet","success":true,"track":7,"filterType":3,"cutoff":500}"#,
        ms(10),
    );
    assert_eq!(pb.graph().effect(bpf).unwrap().get_named("cutoff"), Some(2400.0));
}

#[test]
fn capped_reconciliation_reaches_effect_behind_bus() {
    let mut settings = Settings::default();
    settings.reconcile.max_replay = 1;
    let mut pb = Patchbay::new(settings, RecordingChannel::new());
    let bus = pb
        .graph()
        .nodes()
        .find(|n| matches!(&n.kind, NodeKind::Bus { name, .. } if name == "BUS A"))
        .unwrap()
        .id;
    let dly = pb.add_effect("delay", Position::default()).unwrap();
    pb.connect(source(&pb, 0), bus).unwrap();
    pb.connect(bus, dly).unwrap();
    pb.run_until(ms(1_000));
    pb.channel_mut().take();

    pb.on_channel_up(ms(2_000));
    assert_eq!(
        pb.drain_notices(),
        [Notice::ReconciliationOverflow { skipped: 1 }]
    );
    pb.run_until(ms(10_000));
    let cmds = pb.channel().commands();
    assert_eq!(cmds.len(), 82 + 1);
    assert!(matches!(
        cmds[82],
        DeviceCommand::SetTrackEcho {
            track: 0,
            active: true,
            ..
        }
    ));
}

#[test]
fn macro_slider_sends_latest_value_after_throttle() {
    let mut pb = session();
    assert_eq!(pb.set_macro(Macro::Cutoff, 100.0, ms(0)), 100);
    assert_eq!(pb.set_macro(Macro::Cutoff, 50.0, ms(30)), 50);
    pb.run_until(ms(80));
    assert!(pb.channel().sent().is_empty());
    pb.run_until(ms(500));
    assert_eq!(
        pb.channel().commands(),
        [DeviceCommand::SetFilterCutoff { value: 6100.0 }]
    );
    assert_eq!(pb.macros().value(Macro::Cutoff), 50);
}

#[test]
fn selecting_macro_scene_sends_all_four() {
    let mut pb = session();
    pb.select_macro_scene(MacroScene::B, ms(0));
    pb.run_until(ms(1_000));
    let cmds = pb.channel().commands();
    let names: Vec<&str> = cmds.iter().map(DeviceCommand::name).collect();
    assert_eq!(
        names,
        [
            "setFilterCutoff",
            "setDelayActive",
            "setDelayMix",
            "setCompressorActive",
            "setCompressorThreshold",
            "setSidechainPro",
        ]
    );
    assert_eq!(cmds[0], DeviceCommand::SetFilterCutoff { value: 8460.0 });
    assert_eq!(cmds[2], DeviceCommand::SetDelayMix { value: 20.0 });
}

#[test]
fn disabling_macros_resets_master_fx() {
    let mut pb = session();
    pb.set_macro(Macro::Delay, 10.0, ms(0));
    assert!(pb.set_macros_enabled(false, ms(10)));
    assert!(!pb.set_macros_enabled(false, ms(11)));
    pb.run_until(ms(1_000));
    assert_eq!(pb.channel().commands(), MacroBank::reset_commands());
    pb.channel_mut().take();

    // Sliders keep storing while off but stay silent.
    assert_eq!(pb.set_macro(Macro::Cutoff, 0.0, ms(2_000)), 0);
    pb.run_until(ms(3_000));
    assert!(pb.channel().sent().is_empty());

    assert!(pb.set_macros_enabled(true, ms(4_000)));
    pb.run_until(ms(5_000));
    let cmds = pb.channel().commands();
    assert_eq!(cmds.len(), 6);
    assert_eq!(cmds[0], DeviceCommand::SetFilterCutoff { value: 200.0 });
    assert_eq!(cmds[2], DeviceCommand::SetDelayMix { value: 10.0 });
}

#[test]
fn committed_edits_are_autosaved() {
    let mut pb = session().with_autosave(MemoryStore::new());
    let lpf = pb.add_effect("lowpass", Position::default()).unwrap();
    pb.connect(source(&pb, 0), lpf).unwrap();
    pb.adjust_param(lpf, "cutoff", 1234.0, ms(100)).unwrap();

    let saved_cutoff = |pb: &Patchbay<RecordingChannel>| {
        let mut fresh = session();
        fresh.load_startup_graph(pb.autosave_library().unwrap()).unwrap();
        assert_eq!(fresh.graph().edge_count(), 1);
        let node = fresh.graph().nodes().find(|n| n.effect().is_some()).unwrap();
        node.effect().unwrap().get_named("cutoff")
    };
    assert_ne!(saved_cutoff(&pb), Some(1234.0));
    pb.run_until(ms(1_000));
    assert_eq!(saved_cutoff(&pb), Some(1234.0));
}

#[test]
fn autosave_can_be_switched_off() {
    let mut settings = Settings::default();
    settings.persistence.autosave = false;
    let mut pb = Patchbay::new(settings, RecordingChannel::new()).with_autosave(MemoryStore::new());
    let dly = pb.add_effect("delay", Position::default()).unwrap();
    pb.connect(source(&pb, 0), dly).unwrap();
    pb.set_macro(Macro::Delay, 80.0, ms(0));

    let library = pb.autosave_library().unwrap();
    assert!(library.load_default().is_none());
    assert!(library.load_record::<MacroBank>(MACROS_KEY).is_none());
}

#[test]
fn autosaved_state_restores_without_sending_macros() {
    let mut source_pb = session().with_autosave(MemoryStore::new());
    let comp = source_pb.add_effect("compressor", Position::default()).unwrap();
    source_pb.connect(source(&source_pb, 1), comp).unwrap();
    source_pb.select_macro_scene(MacroScene::D, ms(0));
    source_pb.set_macro(Macro::Sidechain, 5.0, ms(10));
    let saved = source_pb
        .autosave_library()
        .unwrap()
        .load_record::<MacroBank>(MACROS_KEY)
        .unwrap();
    assert_eq!(&saved, source_pb.macros());

    let mut library = SceneLibrary::new(MemoryStore::new());
    library.save_record(MACROS_KEY, &saved).unwrap();
    source_pb.save_startup_graph(&mut library).unwrap();

    let mut pb = session().with_autosave(library.into_inner());
    let report = pb.restore_autosaved().unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(pb.macros().active(), MacroScene::D);
    assert_eq!(pb.macros().values(), [55, 48, 72, 5]);
    pb.run_until(ms(1_000));
    assert!(pb.channel().commands().iter().all(|c| c.name() == "setTrackCompressor"));
}

#[derive(Debug, Clone)]
enum Edit {
    Connect(usize, usize),
    Disconnect(usize),
    Bypass(usize, bool),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0usize..11, 0usize..11).prop_map(|(a, b)| Edit::Connect(a, b)),
        1 => (0usize..32).prop_map(Edit::Disconnect),
        1 => (0usize..5, any::<bool>()).prop_map(|(i, b)| Edit::Bypass(i, b)),
    ]
}

/// Device slot a command addresses, with its channel.
fn slot_of(cmd: &DeviceCommand) -> Option<(&'static str, Option<u8>)> {
    let slot = match cmd.name() {
        "setTrackFilter" | "clearTrackFilter" => "filter",
        "setTrackBitCrush" | "setTrackDistortion" | "clearTrackFX" => "fx",
        "setTrackEcho" => "echo",
        "setTrackFlanger" => "flanger",
        "setTrackCompressor" => "compressor",
        "setPhaserActive" | "setPhaserRate" | "setPhaserDepth" | "setPhaserFeedback" => "phaser",
        _ => return None,
    };
    Some((slot, cmd.track()))
}

proptest! {
    #[test]
    fn removing_every_effect_leaves_every_slot_off(edits in prop::collection::vec(edit(), 1..40)) {
        let mut settings = Settings::default();
        settings.channel_count = 4;
        settings.default_buses.truncate(1);
        settings.dispatch.queue_capacity = 100_000;
        let mut pb = Patchbay::new(settings, RecordingChannel::new());

        let effects: Vec<NodeId> = ["lowpass", "highpass", "delay", "phaser", "bitcrusher"]
            .iter()
            .map(|id| pb.add_effect(id, Position::default()).unwrap())
            .collect();
        let mut nodes: Vec<NodeId> = (0..4).map(|ch| pb.graph().source(ch).unwrap()).collect();
        nodes.extend(&effects);
        nodes.extend(pb.graph().nodes().filter(|n| matches!(n.kind, NodeKind::Bus { .. })).map(|n| n.id));
        nodes.push(pb.graph().sink());

        for e in edits {
            match e {
                Edit::Connect(a, b) => {
                    let _ = pb.connect(nodes[a % nodes.len()], nodes[b % nodes.len()]);
                }
                Edit::Disconnect(i) => {
                    let ids: Vec<_> = pb.graph().edges().map(|e| e.id).collect();
                    if !ids.is_empty() {
                        pb.disconnect(ids[i % ids.len()]).unwrap();
                    }
                }
                Edit::Bypass(i, on) => {
                    pb.set_bypass(effects[i], on).unwrap();
                }
            }
        }
        for id in &effects {
            prop_assert!(pb.remove_node(*id).unwrap());
        }
        pb.run_until(Duration::from_secs(3_600));

        let mut last: BTreeMap<(&'static str, Option<u8>), DeviceCommand> = BTreeMap::new();
        for cmd in pb.channel().commands() {
            if let Some(slot) = slot_of(&cmd) {
                last.insert(slot, cmd);
            }
        }
        for (slot, cmd) in &last {
            prop_assert!(cmd.is_deactivation(), "{slot:?} left on by {cmd:?}");
        }
    }
}
