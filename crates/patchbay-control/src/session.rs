//! The patchbay session: one graph, one device link, one clock.
//!
//! [`Patchbay`] owns the routing graph and every piece of machinery that
//! keeps the device in step with it. Edits go through the session so each
//! mutation is translated into device commands; inbound messages and link
//! state changes are fed in by the host, which also drives time.
//!
//! ```text
//!            edits                    inbound text / level frames
//!              │                                  │
//!              ▼                                  ▼
//!   RoutingGraph ──► translator ──► DispatchQueue ──► DeviceChannel
//!              ▲          ▲              ▲
//!              │          │              │
//!      SceneController  Scheduler (debounce · flush · reconcile)
//! ```
//!
//! # Host loop
//!
//! The session never reads a clock. The host passes a monotonic [`Duration`]
//! to every time-dependent call and invokes [`Patchbay::poll`] whenever
//! [`Patchbay::next_wake`] comes due.
//!
//! # Autosave
//!
//! With a store attached through [`Patchbay::with_autosave`] and
//! `persistence.autosave` on, every committed edit rewrites the startup graph
//! and every macro change rewrites the macro bank. Live knob drags are saved
//! once their debounced resend fires.

use std::collections::BTreeSet;
use std::time::Duration;

use patchbay_config::{BlobStore, ConfigError, Preset, SceneLibrary, Settings};
use patchbay_core::{
    ChannelIndex, EdgeId, EffectKind, GraphError, GraphEvent, NodeId, NodeKind, ParameterInfo,
    Position, RestoreReport, RoutingGraph, SceneData, SceneNode, SceneNodeKind, SourcePlacement,
    SourcePolicy,
};

use crate::command::DeviceCommand;
use crate::dispatch::{DeviceChannel, DispatchQueue, DispatchStats};
use crate::macros::{MACROS_KEY, Macro, MacroBank, MacroScene};
use crate::message::{self, DeviceEvent, LiveFxReport};
use crate::meters::Meters;
use crate::reconcile::{self, ReconcileStep};
use crate::scene::{PendingScene, SceneController};
use crate::scheduler::Scheduler;
use crate::translator;

/// Scheduler key: `(subject, purpose)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TaskKey {
    /// Next dispatch opportunity.
    Flush,
    /// Deferred resend of one effect parameter.
    Debounce(NodeId, &'static str),
    /// Step `i` of the current reconciliation plan.
    Reconcile(usize),
    /// Throttled send of one macro slider.
    Macro(Macro),
}

#[derive(Debug, Clone, Copy)]
enum Task {
    Flush,
    Resend(NodeId),
    Reconcile(ReconcileStep),
    Macro(Macro),
}

/// Outcome of a scene request.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOutcome {
    /// The scene replaced the graph.
    Applied(RestoreReport),
    /// The scene waits for the next step boundary.
    Queued,
}

/// Something the operator should be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The device refused a filter because its active-filter limit is reached.
    FilterLimitReached {
        /// Channel, if the device said which.
        track: Option<ChannelIndex>,
    },
    /// A scene was queued for the next step boundary.
    SceneQueued {
        /// Label of the request.
        label: String,
    },
    /// A scene replaced the graph.
    SceneApplied {
        /// Label of the request.
        label: String,
        /// Edges that could not be recreated.
        skipped_edges: usize,
    },
    /// Reconciliation left edges unreplayed.
    ReconciliationOverflow {
        /// Edges past the replay cap.
        skipped: usize,
    },
}

/// A routing graph kept in sync with a RED808 over `C`.
#[derive(Debug)]
pub struct Patchbay<C> {
    graph: RoutingGraph,
    settings: Settings,
    channel: C,
    queue: DispatchQueue,
    scheduler: Scheduler<TaskKey, Task>,
    scenes: SceneController,
    meters: Meters,
    macros: MacroBank,
    autosave: Option<SceneLibrary<Box<dyn BlobStore>>>,
    notices: Vec<Notice>,
    clock: Duration,
}

impl<C: DeviceChannel> Patchbay<C> {
    /// Creates a session with one source per channel, the master output, and
    /// the configured buses, all at their default layout positions.
    pub fn new(settings: Settings, channel: C) -> Self {
        let policy = if settings.removable_sources {
            SourcePolicy::Removable
        } else {
            SourcePolicy::Fixed
        };
        let mut graph = RoutingGraph::new(settings.channel_count).with_source_policy(policy);
        for ch in 0..settings.channel_count {
            if let Err(err) = graph.add_source(ch, Settings::source_position(ch)) {
                tracing::warn!(channel = ch, error = %err, "failed to create source");
            }
        }
        let sink = graph.sink();
        if let Err(err) = graph.move_node(sink, Settings::sink_position()) {
            tracing::warn!(error = %err, "failed to place master output");
        }
        for bus in &settings.default_buses {
            let kind = NodeKind::bus(bus.name.clone(), bus.color);
            if let Err(err) = graph.add_node(kind, bus.position()) {
                tracing::warn!(bus = %bus.name, error = %err, "failed to create bus");
            }
        }
        graph.drain_events();

        Self {
            queue: DispatchQueue::new(
                settings.dispatch.queue_capacity,
                settings.dispatch.min_send_gap(),
            ),
            scenes: SceneController::new(&settings.scenes),
            meters: Meters::new(settings.channel_count),
            scheduler: Scheduler::new(),
            macros: MacroBank::default(),
            autosave: None,
            notices: Vec::new(),
            clock: Duration::ZERO,
            graph,
            settings,
            channel,
        }
    }

    /// Attaches a store that receives the working state after each
    /// committed change. Saving only happens while `persistence.autosave`
    /// is on.
    #[must_use]
    pub fn with_autosave(mut self, store: impl BlobStore + 'static) -> Self {
        let store: Box<dyn BlobStore> = Box::new(store);
        self.autosave = Some(SceneLibrary::new(store));
        self
    }

    // --- Accessors ---

    /// The routing graph. Mutate through the session.
    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    /// Settings the session was created with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The device channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The device channel, mutably (for transports that need driving).
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Display state reported by the device.
    pub fn meters(&self) -> &Meters {
        &self.meters
    }

    /// Macro sliders and scenes.
    pub fn macros(&self) -> &MacroBank {
        &self.macros
    }

    /// The autosave target, if one is attached.
    pub fn autosave_library(&self) -> Option<&SceneLibrary<Box<dyn BlobStore>>> {
        self.autosave.as_ref()
    }

    /// Scene timing state.
    pub fn scene_controller(&self) -> &SceneController {
        &self.scenes
    }

    /// Enables or disables quantized scene application.
    pub fn set_quantize(&mut self, quantize: bool) {
        self.scenes.set_quantize(quantize);
    }

    /// Dispatch counters.
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.queue.stats()
    }

    /// Payloads waiting for the link.
    pub fn pending_sends(&self) -> usize {
        self.queue.len()
    }

    /// Display level of an edge, see [`Meters::edge_level`].
    pub fn edge_level(&self, edge: EdgeId) -> Option<f32> {
        self.meters.edge_level(&self.graph, edge)
    }

    /// Takes the graph change notifications recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.graph.drain_events()
    }

    /// Takes the operator notices recorded since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // --- Structural edits ---

    /// Adds an unconnected node. Emits nothing.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> Result<NodeId, GraphError> {
        let id = self.graph.add_node(kind, position)?;
        self.autosave_graph();
        Ok(id)
    }

    /// Adds an effect from the catalog by id. Emits nothing.
    pub fn add_effect(&mut self, id: &str, position: Position) -> Result<NodeId, GraphError> {
        self.add_node(NodeKind::from_catalog(id)?, position)
    }

    /// Moves a node. Layout only.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        self.graph.move_node(id, position)?;
        self.autosave_graph();
        Ok(())
    }

    /// Connects two nodes and activates what the new edge feeds.
    ///
    /// The target is activated on every channel feeding it; effects further
    /// downstream are activated only on channels they newly gained.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        let affected = self.graph.downstream_effects(to);
        let mut before = translator::snapshot(&self.graph, affected.iter().copied());
        let edge = self.graph.connect(from, to)?;
        before.remove(&to);
        let after = translator::snapshot(&self.graph, affected);
        self.emit(translator::transition(&self.graph, &before, &after));
        self.autosave_graph();
        Ok(edge)
    }

    /// Removes an edge and deactivates what lost its feed.
    pub fn disconnect(&mut self, edge: EdgeId) -> Result<(), GraphError> {
        let to = self.graph.edge(edge).ok_or(GraphError::EdgeNotFound(edge))?.to;
        let affected = self.graph.downstream_effects(to);
        let before = translator::snapshot(&self.graph, affected.iter().copied());
        self.graph.disconnect(edge)?;
        let after = translator::snapshot(&self.graph, affected);
        self.emit(translator::transition(&self.graph, &before, &after));
        self.autosave_graph();
        Ok(())
    }

    /// Removes a node with its edges. Returns `Ok(false)` for protected
    /// nodes (the sink, fixed sources).
    pub fn remove_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let affected = self.graph.downstream_effects(id);
        let before = translator::snapshot(&self.graph, affected.iter().copied());
        if !self.graph.remove_node(id)? {
            return Ok(false);
        }
        self.scheduler
            .cancel_where(|k| matches!(k, TaskKey::Debounce(node, _) if *node == id));
        let after = translator::snapshot(&self.graph, affected);
        self.emit(translator::transition(&self.graph, &before, &after));
        self.autosave_graph();
        Ok(true)
    }

    /// Bypasses or re-engages an effect. Returns `true` if the flag changed.
    pub fn set_bypass(&mut self, id: NodeId, bypassed: bool) -> Result<bool, GraphError> {
        let before = translator::snapshot(&self.graph, [id]);
        if !self.graph.set_bypass(id, bypassed)? {
            return Ok(false);
        }
        let after = translator::snapshot(&self.graph, [id]);
        self.emit(translator::transition(&self.graph, &before, &after));
        self.autosave_graph();
        Ok(true)
    }

    // --- Parameters ---

    fn param_key(&self, node: NodeId, name: &str) -> Option<&'static str> {
        let params = self.graph.effect(node)?;
        let index = params.find_param_by_name(name)?;
        params.kind().params().get(index).map(|desc| desc.key)
    }

    /// Live adjustment (knob drag). The graph updates at once; the device
    /// gets the latest value after the debounce window goes quiet.
    pub fn adjust_param(
        &mut self,
        node: NodeId,
        name: &str,
        value: f32,
        now: Duration,
    ) -> Result<f32, GraphError> {
        self.advance(now);
        let applied = self.graph.set_param(node, name, value)?;
        if let Some(key) = self.param_key(node, name) {
            let deadline = now + self.settings.debounce.param_window();
            self.scheduler.schedule_or_replace(
                TaskKey::Debounce(node, key),
                deadline,
                Task::Resend(node),
            );
        }
        Ok(applied)
    }

    /// Final value (knob release). Cancels any pending debounced resend and
    /// sends immediately.
    pub fn commit_param(&mut self, node: NodeId, name: &str, value: f32) -> Result<f32, GraphError> {
        let applied = self.graph.set_param(node, name, value)?;
        if let Some(key) = self.param_key(node, name) {
            self.scheduler.cancel(&TaskKey::Debounce(node, key));
        }
        self.emit(translator::refresh(&self.graph, node));
        self.autosave_graph();
        Ok(applied)
    }

    // --- Scenes ---

    /// Snapshot of the current graph.
    pub fn capture_scene(&self) -> SceneData {
        self.graph.capture_scene()
    }

    /// Replaces the graph with `scene`, now or at the next step boundary.
    pub fn apply_scene(
        &mut self,
        scene: SceneData,
        label: impl Into<String>,
        now: Duration,
    ) -> SceneOutcome {
        self.advance(now);
        let label = label.into();
        match self.scenes.request(scene, label.clone(), now) {
            Some(request) => SceneOutcome::Applied(self.apply_now(request)),
            None => {
                self.notices.push(Notice::SceneQueued { label });
                SceneOutcome::Queued
            }
        }
    }

    /// Applies a preset chain to every present source.
    ///
    /// Source, bus, and master positions are kept; buses survive.
    pub fn apply_preset(&mut self, preset: &Preset, now: Duration) -> Result<SceneOutcome, ConfigError> {
        let channels: Vec<ChannelIndex> = self.graph.nodes().filter_map(|n| n.channel()).collect();
        let mut scene = preset.to_scene(channels)?;
        for node in self.graph.nodes() {
            match &node.kind {
                NodeKind::Source { channel } => scene.sources.push(SourcePlacement {
                    channel: *channel,
                    position: node.position,
                }),
                NodeKind::Sink => scene.sink = Some(node.position),
                NodeKind::Bus { name, color } => scene.nodes.push(SceneNode {
                    key: format!("bus:{}", node.id.index()),
                    kind: SceneNodeKind::Bus {
                        name: name.clone(),
                        color: *color,
                    },
                    position: node.position,
                    bypassed: false,
                }),
                NodeKind::Effect(_) => {}
            }
        }
        Ok(self.apply_scene(scene, preset.name.clone(), now))
    }

    /// Applies the queued scene at once, if any.
    pub fn flush_pending_scene(&mut self) -> Option<RestoreReport> {
        let request = self.scenes.take_pending()?;
        Some(self.apply_now(request))
    }

    fn apply_now(&mut self, request: PendingScene) -> RestoreReport {
        let before = translator::snapshot_all(&self.graph);
        let mut cmds: Vec<DeviceCommand> =
            before.values().flat_map(translator::deactivate_live).collect();

        self.scheduler.cancel_where(|k| matches!(k, TaskKey::Debounce(..)));
        let report = self.graph.restore_scene(&request.scene);

        let after = translator::snapshot_all(&self.graph);
        cmds.extend(after.values().flat_map(translator::activate_live));
        self.emit(cmds);

        tracing::info!(
            label = %request.label,
            nodes = report.ids.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "scene applied"
        );
        self.notices.push(Notice::SceneApplied {
            label: request.label,
            skipped_edges: report.skipped.len(),
        });
        self.autosave_graph();
        report
    }

    /// Persists the current graph as the startup graph.
    pub fn save_startup_graph<S: BlobStore>(
        &self,
        library: &mut SceneLibrary<S>,
    ) -> Result<(), ConfigError> {
        library.save_default(&self.capture_scene())
    }

    /// Restores the stored startup graph immediately, if one is readable.
    pub fn load_startup_graph<S: BlobStore>(
        &mut self,
        library: &SceneLibrary<S>,
    ) -> Option<RestoreReport> {
        let scene = library.load_default()?;
        Some(self.apply_now(PendingScene {
            label: "startup".to_string(),
            scene,
        }))
    }

    /// Restores the graph and macro bank from the autosave store. Macro
    /// values are not sent until a slider moves or a scene is recalled.
    pub fn restore_autosaved(&mut self) -> Option<RestoreReport> {
        let library = self.autosave.take()?;
        if let Some(bank) = library.load_record::<MacroBank>(MACROS_KEY) {
            self.macros = bank.sanitized();
        }
        let report = self.load_startup_graph(&library);
        self.autosave = Some(library);
        report
    }

    fn autosave_graph(&mut self) {
        if !self.settings.persistence.autosave {
            return;
        }
        let Some(library) = self.autosave.as_mut() else {
            return;
        };
        if let Err(err) = library.save_default(&self.graph.capture_scene()) {
            tracing::warn!(error = %err, "graph autosave failed");
        }
    }

    fn autosave_macros(&mut self) {
        if !self.settings.persistence.autosave {
            return;
        }
        let Some(library) = self.autosave.as_mut() else {
            return;
        };
        if let Err(err) = library.save_record(MACROS_KEY, &self.macros) {
            tracing::warn!(error = %err, "macro autosave failed");
        }
    }

    // --- Macros ---

    /// Moves a macro slider. The position is stored in the active scene even
    /// while macros are off; the device gets it once the slider's throttle
    /// window goes quiet. Returns the stored position.
    pub fn set_macro(&mut self, m: Macro, value: f32, now: Duration) -> u8 {
        self.advance(now);
        let stored = self.macros.set_value(m, value);
        self.schedule_macro(m, now);
        self.autosave_macros();
        stored
    }

    /// Makes `scene` active and sends its four positions.
    pub fn select_macro_scene(&mut self, scene: MacroScene, now: Duration) {
        self.macros.select(scene);
        self.reload_macro_scene(now);
        self.autosave_macros();
    }

    /// Sends the active scene's four positions again.
    pub fn reload_macro_scene(&mut self, now: Duration) {
        self.advance(now);
        for m in Macro::ALL {
            self.schedule_macro(m, now);
        }
    }

    /// Switches macros on or off. Switching off drops pending macro sends
    /// and returns the master FX to neutral at once; switching on sends the
    /// active scene. Returns `false` if unchanged.
    pub fn set_macros_enabled(&mut self, enabled: bool, now: Duration) -> bool {
        self.advance(now);
        if !self.macros.set_enabled(enabled) {
            return false;
        }
        if enabled {
            self.reload_macro_scene(now);
        } else {
            self.scheduler.cancel_where(|k| matches!(k, TaskKey::Macro(_)));
            self.emit(MacroBank::reset_commands());
        }
        self.autosave_macros();
        tracing::info!(enabled, scene = ?self.macros.active(), "macros toggled");
        true
    }

    fn schedule_macro(&mut self, m: Macro, now: Duration) {
        if self.macros.enabled() {
            self.scheduler
                .schedule_or_replace(TaskKey::Macro(m), now + m.throttle(), Task::Macro(m));
        }
    }

    // --- Link ---

    /// The link came up: drop stale work and schedule reconciliation.
    pub fn on_channel_up(&mut self, now: Duration) {
        self.advance(now);
        let dropped = self.queue.clear();
        self.scheduler
            .cancel_where(|k| matches!(k, TaskKey::Reconcile(_) | TaskKey::Flush));
        if dropped > 0 {
            tracing::debug!(dropped, "discarded stale commands");
        }

        let plan = reconcile::plan(&self.graph, &self.settings.reconcile);
        if plan.overflow > 0 {
            self.notices.push(Notice::ReconciliationOverflow {
                skipped: plan.overflow,
            });
        }
        for (i, (offset, step)) in plan.steps.into_iter().enumerate() {
            self.scheduler
                .schedule_or_replace(TaskKey::Reconcile(i), now + offset, Task::Reconcile(step));
        }
    }

    /// The link went down: pending sends and reconciliation are abandoned.
    pub fn on_channel_down(&mut self) {
        let dropped = self.queue.clear();
        self.scheduler
            .cancel_where(|k| matches!(k, TaskKey::Reconcile(_) | TaskKey::Flush));
        tracing::info!(dropped, "device link down");
    }

    /// Handles an inbound text message. Returns the facts it carried.
    pub fn on_message(&mut self, text: &str, now: Duration) -> Vec<DeviceEvent> {
        self.advance(now);
        let events = message::parse_message(text);
        for event in &events {
            self.handle_event(event, now);
        }
        events
    }

    /// Handles a binary level frame. Returns `false` if it was malformed.
    pub fn on_levels(&mut self, frame: &[u8]) -> bool {
        match message::parse_level_frame(frame, self.meters.channel_count()) {
            Some(peaks) => {
                self.meters.set_peaks(&peaks);
                true
            }
            None => false,
        }
    }

    fn handle_event(&mut self, event: &DeviceEvent, now: Duration) {
        match event {
            DeviceEvent::PlayState(playing) => self.scenes.on_play_state(*playing),
            DeviceEvent::Tempo(bpm) => self.scenes.on_tempo(*bpm),
            DeviceEvent::Step(step) => {
                if let Some(request) = self.scenes.on_step(*step, now) {
                    self.apply_now(request);
                }
            }
            DeviceEvent::Volumes(volumes) => self.meters.set_volumes(volumes),
            DeviceEvent::Volume { track, volume } => self.meters.set_volume(*track, *volume),
            DeviceEvent::FilterRejected { track } => {
                tracing::warn!(?track, "device filter limit reached");
                self.notices.push(Notice::FilterLimitReached { track: *track });
            }
            DeviceEvent::FilterSet {
                track,
                filter_type,
                cutoff,
                resonance,
            } => {
                if let Some(kind) = EffectKind::from_filter_code(*filter_type) {
                    self.sync_from_device(
                        *track,
                        &[kind],
                        &[("cutoff", *cutoff), ("resonance", *resonance)],
                    );
                }
            }
            DeviceEvent::FilterCleared { .. } => {}
            DeviceEvent::LiveFx(report) => self.sync_live_fx(report),
            DeviceEvent::Muted { track, muted } => self.meters.set_muted(*track, *muted),
            DeviceEvent::MuteMap(flags) => self.meters.set_mute_map(flags),
        }
    }

    fn sync_live_fx(&mut self, report: &LiveFxReport) {
        match report.fx.as_str() {
            "echo" => self.sync_from_device(
                report.track,
                &[EffectKind::Echo, EffectKind::Delay],
                &[
                    ("time", report.time),
                    ("feedback", report.feedback),
                    ("mix", report.mix),
                ],
            ),
            "flanger" => self.sync_from_device(
                report.track,
                &[EffectKind::Flanger],
                &[
                    ("rate", report.rate),
                    ("depth", report.depth),
                    ("feedback", report.feedback),
                ],
            ),
            "compressor" => self.sync_from_device(
                report.track,
                &[EffectKind::Compressor],
                &[("threshold", report.threshold), ("ratio", report.ratio)],
            ),
            other => tracing::debug!(fx = other, "ignoring unknown live fx report"),
        }
    }

    /// Copies device-reported values into effects of `kinds` fed by `track`.
    /// Emits no commands.
    fn sync_from_device(
        &mut self,
        track: ChannelIndex,
        kinds: &[EffectKind],
        values: &[(&str, Option<f32>)],
    ) {
        let targets: BTreeSet<NodeId> = self
            .graph
            .nodes()
            .filter(|n| n.effect().is_some_and(|p| kinds.contains(&p.kind())))
            .map(|n| n.id)
            .filter(|&id| self.graph.tracks_feeding(id).contains(&track))
            .collect();

        for id in targets {
            let Some(kind) = self.graph.effect(id).map(|p| p.kind()) else {
                continue;
            };
            for &(key, value) in values {
                let (Some(value), Some(desc)) = (value, kind.param(key)) else {
                    continue;
                };
                if let Err(err) = self.graph.set_param(id, key, desc.from_device(value)) {
                    tracing::debug!(node = %id, key, error = %err, "device sync rejected");
                }
            }
            tracing::debug!(node = %id, track, "synced from device");
        }
    }

    // --- Time ---

    fn advance(&mut self, now: Duration) {
        self.clock = self.clock.max(now);
    }

    /// Earliest instant [`poll`](Self::poll) has work to do.
    pub fn next_wake(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Runs every task due at `now`, then sends at most one payload.
    /// Returns the number of payloads sent.
    pub fn poll(&mut self, now: Duration) -> usize {
        self.advance(now);
        while let Some((_, task)) = self.scheduler.pop_due(now) {
            match task {
                Task::Flush => {}
                Task::Resend(node) => {
                    let cmds = translator::refresh(&self.graph, node);
                    self.emit(cmds);
                    self.autosave_graph();
                }
                Task::Reconcile(step) => {
                    let cmds = reconcile::commands_for(&self.graph, step);
                    self.emit(cmds);
                }
                Task::Macro(m) if self.macros.enabled() => {
                    let cmds = m.commands(self.macros.value(m));
                    self.emit(cmds);
                }
                Task::Macro(_) => {}
            }
        }
        let sent = usize::from(self.queue.poll_send(&mut self.channel, now));
        self.schedule_flush();
        sent
    }

    /// Polls at every wake-up up to and including `until`. Returns the number
    /// of payloads sent.
    ///
    /// Wake-ups earlier than the latest instant the session has seen are
    /// run at that instant.
    pub fn run_until(&mut self, until: Duration) -> usize {
        let mut sent = 0;
        while let Some(wake) = self.next_wake() {
            let at = wake.max(self.clock);
            if at > until {
                break;
            }
            sent += self.poll(at);
        }
        self.advance(until);
        sent
    }

    fn emit(&mut self, cmds: Vec<DeviceCommand>) {
        if cmds.is_empty() {
            return;
        }
        let open = self.channel.is_open();
        for cmd in &cmds {
            self.queue.enqueue(cmd, open);
        }
        self.schedule_flush();
    }

    fn schedule_flush(&mut self) {
        match self.queue.next_send_at() {
            Some(at) => {
                self.scheduler.schedule_or_replace(TaskKey::Flush, at, Task::Flush);
            }
            None => {
                self.scheduler.cancel(&TaskKey::Flush);
            }
        }
    }
}
