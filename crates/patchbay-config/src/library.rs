//! Saved scenes and the default graph.
//!
//! Scenes are stored as JSON blobs in a [`BlobStore`]. Named scenes live under
//! `scene.<slug>` with a separate index blob listing display names. A blob that
//! fails to decode is treated as absent and logged, so a damaged store never
//! blocks startup.

use patchbay_core::SceneData;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::BlobStore;

/// Key of the graph restored at startup.
pub const DEFAULT_GRAPH_KEY: &str = "default-graph";

const INDEX_KEY: &str = "scene-index";
const SCENE_PREFIX: &str = "scene.";

#[derive(Debug, Serialize, Deserialize)]
struct NamedScene {
    name: String,
    scene: SceneData,
}

/// Storage-safe form of a display name: lowercase ASCII alphanumerics joined by `-`.
///
/// Returns `None` when nothing usable remains.
pub fn slugify(name: &str) -> Option<String> {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    (!slug.is_empty()).then_some(slug)
}

/// Scene persistence over a blob store.
#[derive(Debug)]
pub struct SceneLibrary<S> {
    store: S,
}

impl<S: BlobStore> SceneLibrary<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Unwraps the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Persists the graph restored at startup.
    pub fn save_default(&mut self, scene: &SceneData) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec(scene)?;
        self.store.set(DEFAULT_GRAPH_KEY, &bytes)
    }

    /// The stored default graph, or `None` if absent or unreadable.
    pub fn load_default(&self) -> Option<SceneData> {
        let bytes = self.read_blob(DEFAULT_GRAPH_KEY)?;
        decode_or_warn::<SceneData>(DEFAULT_GRAPH_KEY, &bytes)
    }

    /// Persists any serializable record as JSON under `key`.
    pub fn save_record<T: serde::Serialize>(
        &mut self,
        key: &str,
        record: &T,
    ) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec(record)?;
        self.store.set(key, &bytes)
    }

    /// A record stored with [`save_record`](Self::save_record), or `None` if
    /// absent or unreadable.
    pub fn load_record<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.read_blob(key)?;
        decode_or_warn::<T>(key, &bytes)
    }

    /// Saves a named scene, replacing one with the same slug.
    pub fn save(&mut self, name: &str, scene: &SceneData) -> Result<(), ConfigError> {
        let key = scene_key(name)?;
        let entry = NamedScene {
            name: name.to_string(),
            scene: scene.clone(),
        };
        self.store.set(&key, &serde_json::to_vec(&entry)?)?;

        let mut names = self.names();
        let slug = slugify(name);
        names.retain(|existing| slugify(existing) != slug);
        names.push(name.to_string());
        names.sort();
        self.write_index(&names)?;
        tracing::debug!(name, "scene saved");
        Ok(())
    }

    /// Loads a named scene, or `None` if absent or unreadable.
    pub fn load(&self, name: &str) -> Option<SceneData> {
        let key = scene_key(name).ok()?;
        let bytes = self.read_blob(&key)?;
        decode_or_warn::<NamedScene>(&key, &bytes).map(|entry| entry.scene)
    }

    /// Deletes a named scene. Returns `false` if it did not exist.
    pub fn delete(&mut self, name: &str) -> Result<bool, ConfigError> {
        let key = scene_key(name)?;
        let removed = self.store.remove(&key)?;
        let mut names = self.names();
        let slug = slugify(name);
        let before = names.len();
        names.retain(|existing| slugify(existing) != slug);
        if names.len() != before {
            self.write_index(&names)?;
        }
        Ok(removed)
    }

    /// Display names of saved scenes, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read_blob(INDEX_KEY)
            .and_then(|bytes| decode_or_warn::<Vec<String>>(INDEX_KEY, &bytes))
            .unwrap_or_default()
    }

    fn write_index(&mut self, names: &[String]) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec(names)?;
        self.store.set(INDEX_KEY, &bytes)
    }

    fn read_blob(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key, error = %e, "scene store read failed");
                None
            }
        }
    }
}

fn scene_key(name: &str) -> Result<String, ConfigError> {
    slugify(name)
        .map(|slug| format!("{SCENE_PREFIX}{slug}"))
        .ok_or_else(|| ConfigError::InvalidKey(name.to_string()))
}

fn decode_or_warn<T: serde::de::DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring corrupt blob");
            None
        }
    }
}
