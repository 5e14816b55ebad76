//! Device control for the RED808 patchbay.
//!
//! Turns routing graph edits into the firmware's JSON command stream and keeps
//! the device in step with the graph across reconnects.
//!
//! # Core Abstractions
//!
//! - [`Patchbay`] - Session owning the graph, the link, and all timers
//! - [`DeviceChannel`] - Transport seam; [`RecordingChannel`] for tests
//! - [`DeviceCommand`] - Wire commands, one JSON object each
//! - [`translator`] - Graph snapshots to activations and deactivations
//! - [`DispatchQueue`] - Bounded, paced outbound FIFO
//! - [`Scheduler`] - Keyed, cancellable delayed tasks on an explicit clock
//! - [`reconcile`] - Reset-then-replay plan run when the link comes up
//! - [`SceneController`] - Step-quantized scene switching
//! - [`MacroBank`] - Four master-FX sliders stored in scenes A to D
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use patchbay_config::Settings;
//! use patchbay_control::{Patchbay, RecordingChannel};
//! use patchbay_core::Position;
//!
//! let mut pb = Patchbay::new(Settings::default(), RecordingChannel::new());
//! let kick = pb.graph().source(0).unwrap();
//! let lpf = pb.add_effect("lowpass", Position::new(600.0, 60.0)).unwrap();
//! pb.connect(kick, lpf).unwrap();
//!
//! pb.run_until(Duration::from_millis(50));
//! assert_eq!(pb.channel().commands()[0].name(), "setTrackFilter");
//! ```

mod command;
mod dispatch;
mod macros;
mod meters;
mod scene;
mod scheduler;
mod session;

pub mod message;
pub mod reconcile;
pub mod translator;

pub use command::DeviceCommand;
pub use dispatch::{ChannelError, DeviceChannel, DispatchQueue, DispatchStats, RecordingChannel};
pub use macros::{MACROS_KEY, Macro, MacroBank, MacroScene};
pub use message::{DeviceEvent, LiveFxReport, parse_level_frame, parse_message};
pub use meters::{DEFAULT_VOLUME, MAX_VOLUME, Meters, clamp_volume};
pub use reconcile::{ReconcilePlan, ReconcileStep};
pub use scene::{PendingScene, SceneController};
pub use scheduler::Scheduler;
pub use session::{Notice, Patchbay, SceneOutcome};
pub use translator::{EffectSnapshot, EffectState};
