//! Integration tests for patchbay-core.
//!
//! Exercises the graph, resolver, parameter model, and scene snapshots
//! together through the public API only.

use patchbay_core::{
    EffectKind, EffectParams, GraphError, GraphEvent, NamedColor, NodeKind, ParameterInfo,
    Position, RoutingGraph, SceneData, SourcePlacement, SourcePolicy,
};

#[test]
fn lowpass_chain_rejects_edges_into_source() {
    let mut graph = RoutingGraph::new(16);
    let s0 = graph.add_source(0, Position::default()).unwrap();
    let lpf = graph
        .add_node(NodeKind::from_catalog("lowpass").unwrap(), Position::default())
        .unwrap();
    assert_eq!(graph.set_param(lpf, "cutoff", 1000.0), Ok(1000.0));
    graph.connect(s0, lpf).unwrap();
    graph.connect(lpf, graph.sink()).unwrap();

    assert!(matches!(
        graph.connect(graph.sink(), s0),
        Err(GraphError::InvalidEndpointType { .. })
    ));
    assert!(matches!(
        graph.connect(lpf, s0),
        Err(GraphError::InvalidEndpointType { .. })
    ));
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.tracks_feeding(lpf).into_iter().collect::<Vec<_>>(), [0]);
}

#[test]
fn removing_only_input_empties_feed() {
    let mut graph = RoutingGraph::new(16);
    let s3 = graph.add_source(3, Position::default()).unwrap();
    let echo = graph
        .add_node(NodeKind::from_catalog("echo").unwrap(), Position::default())
        .unwrap();
    let edge = graph.connect(s3, echo).unwrap();
    assert!(!graph.tracks_feeding(echo).is_empty());

    let removed = graph.disconnect(edge).unwrap();
    assert_eq!((removed.from, removed.to), (s3, echo));
    assert!(graph.tracks_feeding(echo).is_empty());
}

#[test]
fn events_describe_every_mutation() {
    let mut graph = RoutingGraph::new(2);
    let src = graph.add_source(1, Position::default()).unwrap();
    let fx = graph
        .add_node(NodeKind::from_catalog("flanger").unwrap(), Position::default())
        .unwrap();
    let edge = graph.connect(src, fx).unwrap();
    graph.set_bypass(fx, true).unwrap();
    graph.move_node(fx, Position::new(10.0, 20.0)).unwrap();
    graph.remove_node(fx).unwrap();

    let events = graph.drain_events();
    assert_eq!(
        events,
        vec![
            GraphEvent::NodeAdded(src),
            GraphEvent::NodeAdded(fx),
            GraphEvent::Connected { edge, from: src, to: fx },
            GraphEvent::BypassChanged { node: fx, bypassed: true },
            GraphEvent::NodeMoved(fx),
            GraphEvent::Disconnected { edge, from: src, to: fx },
            GraphEvent::NodeRemoved(fx),
        ]
    );
    assert!(graph.drain_events().is_empty());
}

#[test]
fn failed_mutations_leave_graph_unchanged() {
    let mut graph = RoutingGraph::new(2);
    let a = graph
        .add_node(NodeKind::from_catalog("delay").unwrap(), Position::default())
        .unwrap();
    let b = graph
        .add_node(NodeKind::from_catalog("phaser").unwrap(), Position::default())
        .unwrap();
    graph.connect(a, b).unwrap();
    graph.drain_events();

    assert!(graph.connect(b, a).is_err());
    assert!(graph.connect(a, b).is_err());
    assert!(graph.set_param(a, "mode", 1.0).is_err());
    assert!(graph.drain_events().is_empty());
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn bus_mixes_several_effects() {
    let mut graph = RoutingGraph::new(16);
    let bus = graph
        .add_node(NodeKind::bus("BUS A", NamedColor::Teal), Position::default())
        .unwrap();
    let comp = graph
        .add_node(NodeKind::from_catalog("compressor").unwrap(), Position::default())
        .unwrap();
    for ch in [0, 1, 2] {
        let src = graph.add_source(ch, Position::default()).unwrap();
        let hpf = graph
            .add_node(NodeKind::from_catalog("highpass").unwrap(), Position::default())
            .unwrap();
        graph.connect(src, hpf).unwrap();
        graph.connect(hpf, bus).unwrap();
    }
    graph.connect(bus, comp).unwrap();
    graph.connect(comp, graph.sink()).unwrap();
    assert_eq!(graph.tracks_feeding(comp).len(), 3);
    assert_eq!(graph.downstream_effects(bus), vec![comp]);
}

#[test]
fn scene_survives_json_and_preserves_params() {
    let mut graph = RoutingGraph::new(16);
    let s0 = graph.add_source(0, Position::new(60.0, 60.0)).unwrap();
    let dist = graph
        .add_node(NodeKind::from_catalog("distortion").unwrap(), Position::new(700.0, 700.0))
        .unwrap();
    graph.set_param(dist, "amount", 82.0).unwrap();
    graph.set_param(dist, "mode", 3.0).unwrap();
    graph.connect(s0, dist).unwrap();
    graph.connect(dist, graph.sink()).unwrap();

    let json = serde_json::to_string_pretty(&graph.capture_scene()).unwrap();
    let scene: SceneData = serde_json::from_str(&json).unwrap();

    let mut restored = RoutingGraph::new(16);
    let report = restored.restore_scene(&scene);
    let id = report.ids[&format!("n{}", dist.index())];
    let params = restored.effect(id).unwrap();
    assert_eq!(params.kind(), EffectKind::Distortion);
    assert_eq!(params.get_named("amount"), Some(82.0));
    assert_eq!(params.get_named("mode"), Some(3.0));
    assert_eq!(restored.tracks_feeding(restored.sink()).len(), 1);
}

#[test]
fn removable_sources_cascade() {
    let mut graph = RoutingGraph::new(4).with_source_policy(SourcePolicy::Removable);
    let s = graph.add_source(2, Position::default()).unwrap();
    let fx = graph
        .add_node(NodeKind::Effect(EffectParams::defaults(EffectKind::Notch)), Position::default())
        .unwrap();
    graph.connect(s, fx).unwrap();
    assert_eq!(graph.remove_node(s), Ok(true));
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.tracks_feeding(fx).is_empty());
}

#[test]
fn descriptor_table_drives_param_info() {
    let params = EffectParams::defaults(EffectKind::Compressor);
    let threshold = params.param_info(0).unwrap();
    assert_eq!(threshold.key, "threshold");
    assert!((threshold.to_device(params.get_param(0)) - -24.0).abs() < 1e-4);
}

#[test]
fn scene_places_sources_through_public_api() {
    let scene = SceneData {
        sources: vec![SourcePlacement {
            channel: 5,
            position: Position::new(60.0, 660.0),
        }],
        ..SceneData::default()
    };
    let mut graph = RoutingGraph::new(16);
    let report = graph.restore_scene(&scene);
    assert!(report.failed.is_empty());
    let s5 = graph.source(5).unwrap();
    assert_eq!(graph.node(s5).unwrap().position, Position::new(60.0, 660.0));
    assert_eq!(graph.capture_scene().sources, scene.sources);
}
