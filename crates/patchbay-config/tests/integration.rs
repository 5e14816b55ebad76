//! Integration tests for patchbay-config.

use patchbay_config::{
    BlobStore, DirStore, SceneLibrary, Settings, factory_presets, get_factory_preset,
};
use patchbay_core::{RoutingGraph, SourcePolicy};
use tempfile::TempDir;

fn startup_graph(settings: &Settings) -> RoutingGraph {
    let mut graph = RoutingGraph::new(settings.channel_count).with_source_policy(SourcePolicy::Fixed);
    for ch in 0..settings.channel_count {
        graph
            .add_source(ch, Settings::source_position(ch))
            .expect("channel in range");
    }
    graph
}

/// Every factory preset applies cleanly to a full 16-channel graph.
#[test]
fn test_factory_presets_apply_to_graph() {
    let settings = Settings::default();
    for preset in factory_presets() {
        let mut graph = startup_graph(&settings);
        let scene = preset.to_scene(0..settings.channel_count).unwrap();
        let report = graph.restore_scene(&scene);
        assert!(report.skipped.is_empty(), "{}: {:?}", preset.id, report.skipped);
        assert_eq!(graph.tracks_feeding(graph.sink()).len(), 16, "{}", preset.id);
        assert_eq!(
            graph.nodes().filter(|n| n.effect().is_some()).count(),
            preset.chain.len()
        );
    }
}

/// A scene saved through the directory store survives a new library instance.
#[test]
fn test_dir_store_library_persists() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    let mut graph = startup_graph(&settings);
    let preset = get_factory_preset("space-wide").unwrap();
    graph.restore_scene(&preset.to_scene([0, 4]).unwrap());
    let scene = graph.capture_scene();

    {
        let mut library = SceneLibrary::new(DirStore::new(dir.path()));
        library.save("Space Wide", &scene).unwrap();
        library.save_default(&scene).unwrap();
    }

    let library = SceneLibrary::new(DirStore::new(dir.path()));
    assert_eq!(library.names(), ["Space Wide"]);
    assert_eq!(library.load("space wide"), Some(scene.clone()));
    assert_eq!(library.load_default(), Some(scene.clone()));

    let mut restored = startup_graph(&settings);
    let report = restored.restore_scene(&scene);
    assert!(report.skipped.is_empty());
    assert_eq!(
        restored.tracks_feeding(restored.sink()).into_iter().collect::<Vec<_>>(),
        [0, 4]
    );
}

/// A damaged default-graph file does not prevent startup.
#[test]
fn test_corrupt_default_graph_is_ignored() {
    let dir = TempDir::new().unwrap();
    let mut store = DirStore::new(dir.path());
    store.set(patchbay_config::DEFAULT_GRAPH_KEY, b"\x00\x01garbage").unwrap();
    let library = SceneLibrary::new(store);
    assert!(library.load_default().is_none());
}

/// Settings written to disk load back identically.
#[test]
fn test_settings_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    let mut settings = Settings::default();
    settings.channel_count = 8;
    settings.reconcile.max_replay = 12;
    settings.save(&path).unwrap();
    assert_eq!(Settings::load_or_default(&path).unwrap(), settings);
}
