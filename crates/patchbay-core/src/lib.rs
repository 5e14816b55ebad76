//! Patchbay Core - routing graph and effect model for the RED808 patchbay
//!
//! This crate holds the in-memory model the operator edits: which channels are
//! wired through which effects to the master output, and with what parameters.
//! It knows nothing about the device link; `patchbay-control` turns graph
//! changes into device commands.
//!
//! # Core Abstractions
//!
//! ## Routing
//!
//! - [`RoutingGraph`] - Arena-backed DAG with invariant-checked mutations
//! - [`RoutingGraph::tracks_feeding`] - Channels whose signal reaches a node
//! - [`SceneData`] - Whole-graph snapshot, restorable with fresh node ids
//!
//! ## Effects
//!
//! - [`EffectKind`] - The closed catalog of device effects
//! - [`EffectParams`] - Typed parameter record per kind
//! - [`ParamDescriptor`] / [`ParameterInfo`] - Ranges, defaults, device scaling
//!
//! ## Timing
//!
//! - [`TransportState`] - Device sequencer running or stopped
//! - [`StepGrid`] - Step boundaries for quantized scene changes
//!
//! # Features
//!
//! - `tracing` - Emit `tracing` debug events for graph mutations

pub mod catalog;
pub mod color;
pub mod effect;
pub mod graph;
pub mod param_info;
pub mod tempo;

pub use catalog::{
    CommandShape, DISTORTION_MODES, DeviceSlot, EffectCategory, EffectDescriptor, EffectKind,
    EffectScope,
};
pub use color::{CHANNEL_PALETTE, Color, NamedColor, channel_color};
pub use effect::{
    BitCrusherParams, CompressorParams, DistortionMode, DistortionParams, EchoParams,
    EffectParams, FilterParams, ModulationParams, ParamError, PeakingParams, ShelfParams,
};
pub use graph::{
    ChannelIndex, Edge, EdgeId, FeedMap, GraphError, GraphEvent, Node, NodeId, NodeKind, Position,
    RestoreReport, RoutingGraph, SceneData, SceneEdge, SceneEndpoint, SceneNode, SceneNodeKind,
    SourcePlacement, SourcePolicy,
};
pub use param_info::{DeviceScale, ParamDescriptor, ParamScale, ParamUnit, ParameterInfo};
pub use tempo::{StepGrid, TransportState};
