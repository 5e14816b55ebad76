//! Effect chain presets.
//!
//! A preset is a linear chain of effects. Applying it wires every present
//! source into the first effect, each effect into the next, and the last one
//! into the master output.
//!
//! # TOML Format
//!
//! ```toml
//! id = "dub-echo"
//! name = "DUB ECHO"
//! description = "Long delay into reverb"
//!
//! [[chain]]
//! key = "dly"
//! effect = "delay"
//! x = 720
//! y = 480
//! params = { time = 180, feedback = 72, mix = 55 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use patchbay_core::graph::scene::SCENE_VERSION;
use patchbay_core::{
    ChannelIndex, EffectKind, EffectParams, Position, SceneData, SceneEdge, SceneEndpoint,
    SceneNode, SceneNodeKind,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One effect in a preset chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    /// Preset-local key, unique within the chain.
    pub key: String,
    /// Catalog id of the effect.
    pub effect: String,
    /// Layout position, horizontal.
    #[serde(default)]
    pub x: f32,
    /// Layout position, vertical.
    #[serde(default)]
    pub y: f32,
    /// Parameter overrides by key; unspecified parameters keep catalog defaults.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
    /// Insert the effect bypassed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bypassed: bool,
}

impl ChainStep {
    /// Creates a step with catalog defaults.
    pub fn new(key: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            effect: effect.into(),
            x: 0.0,
            y: 0.0,
            params: BTreeMap::new(),
            bypassed: false,
        }
    }

    /// Sets a parameter override.
    pub fn with_param(mut self, key: impl Into<String>, value: f32) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Sets the layout position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Resolves the effect id against the catalog.
    pub fn kind(&self) -> Result<EffectKind, ConfigError> {
        EffectKind::from_id(&self.effect).ok_or_else(|| ConfigError::UnknownEffect(self.effect.clone()))
    }

    /// Catalog defaults with this step's overrides applied (and clamped).
    pub fn to_params(&self) -> Result<EffectParams, ConfigError> {
        let mut params = EffectParams::defaults(self.kind()?);
        for (name, value) in &self.params {
            params
                .set_named(name, *value)
                .map_err(|e| ConfigError::InvalidParameter {
                    effect: self.effect.clone(),
                    param: name.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(params)
    }
}

/// A named effect chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Effects in signal order.
    #[serde(default)]
    pub chain: Vec<ChainStep>,
}

impl Preset {
    /// Creates an empty preset.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            chain: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a step to the chain.
    pub fn with_step(mut self, step: ChainStep) -> Self {
        self.chain.push(step);
        self
    }

    /// Parse a preset from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Expands the chain into a scene fed by `channels`.
    ///
    /// Source and sink positions are left out so they keep their current
    /// layout when the scene is applied. An empty chain wires the channels
    /// straight to the sink.
    pub fn to_scene(
        &self,
        channels: impl IntoIterator<Item = ChannelIndex>,
    ) -> Result<SceneData, ConfigError> {
        let mut seen = BTreeSet::new();
        let mut nodes = Vec::with_capacity(self.chain.len());
        for step in &self.chain {
            if !seen.insert(step.key.as_str()) {
                return Err(ConfigError::InvalidParameter {
                    effect: step.effect.clone(),
                    param: "key".to_string(),
                    reason: format!("duplicate chain key '{}' in preset '{}'", step.key, self.id),
                });
            }
            nodes.push(SceneNode {
                key: step.key.clone(),
                kind: SceneNodeKind::Effect(step.to_params()?),
                position: Position::new(step.x, step.y),
                bypassed: step.bypassed,
            });
        }

        let head = self
            .chain
            .first()
            .map_or(SceneEndpoint::Sink, |s| SceneEndpoint::Node(s.key.clone()));
        let mut edges: Vec<SceneEdge> = channels
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|ch| SceneEdge::new(SceneEndpoint::Source(ch), head.clone()))
            .collect();
        for pair in self.chain.windows(2) {
            edges.push(SceneEdge::new(
                SceneEndpoint::Node(pair[0].key.clone()),
                SceneEndpoint::Node(pair[1].key.clone()),
            ));
        }
        if let Some(last) = self.chain.last() {
            edges.push(SceneEdge::new(
                SceneEndpoint::Node(last.key.clone()),
                SceneEndpoint::Sink,
            ));
        }

        Ok(SceneData {
            version: SCENE_VERSION,
            nodes,
            sources: Vec::new(),
            sink: None,
            edges,
        })
    }
}
