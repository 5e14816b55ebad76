//! Settings, scene storage, and presets for the RED808 patchbay.
//!
//! # Features
//!
//! - **Settings**: Engine timing and layout defaults from a TOML file
//! - **Scene Library**: Named scenes and the startup graph over a [`BlobStore`]
//! - **Presets**: Linear effect chains that expand to scenes
//! - **Factory Presets**: Built-in chains for common use cases
//! - **Paths**: Platform-specific config directories
//!
//! # Example
//!
//! ```rust
//! use patchbay_config::{MemoryStore, SceneLibrary, Settings, get_factory_preset};
//!
//! let settings = Settings::default();
//! let preset = get_factory_preset("dub-echo").unwrap();
//! let scene = preset.to_scene(0..settings.channel_count).unwrap();
//!
//! let mut library = SceneLibrary::new(MemoryStore::new());
//! library.save("Dub", &scene).unwrap();
//! assert_eq!(library.load("dub"), Some(scene));
//! ```

mod error;
mod library;
mod preset;
mod settings;
mod store;

/// Platform-specific paths for settings and stored scenes.
pub mod paths;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_IDS, factory_presets, get_factory_preset, is_factory_preset,
};
pub use library::{DEFAULT_GRAPH_KEY, SceneLibrary, slugify};
pub use paths::{scenes_dir, settings_path, user_config_dir};
pub use preset::{ChainStep, Preset};
pub use settings::{
    BusSettings, DebounceSettings, DispatchSettings, MAX_CHANNELS, PersistenceSettings,
    ReconcileSettings, SceneSettings, Settings,
};
pub use store::{BlobStore, DirStore, MemoryStore, validate_key};
