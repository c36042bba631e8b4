use std::collections::HashMap;

use crate::assets::manifest::AssetManifest;
use crate::components::material::TextureId;

/// Load state of a texture, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
struct TextureEntry {
    id: TextureId,
    state: TextureState,
}

/// Registry of named textures, built from an AssetManifest.
/// Id 0 is reserved for the placeholder texture.
pub struct TextureRegistry {
    textures: HashMap<String, TextureEntry>,
    next_id: u32,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            next_id: 1,
        }
    }

    /// Build a registry from a parsed AssetManifest. All textures start pending.
    pub fn from_manifest(manifest: &AssetManifest) -> Self {
        let mut registry = Self::new();
        registry.extend(manifest);
        registry
    }

    /// Register every texture in `manifest` that is not already known.
    pub fn extend(&mut self, manifest: &AssetManifest) {
        for desc in &manifest.textures {
            self.register(&desc.name);
        }
    }

    /// Register a texture by name, returning its id. Idempotent.
    pub fn register(&mut self, name: &str) -> TextureId {
        if let Some(entry) = self.textures.get(name) {
            return entry.id;
        }
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            name.to_string(),
            TextureEntry {
                id,
                state: TextureState::Pending,
            },
        );
        id
    }

    /// Record the host's load result. Returns false for unknown names.
    pub fn mark_loaded(&mut self, name: &str, ok: bool) -> bool {
        match self.textures.get_mut(name) {
            Some(entry) => {
                entry.state = if ok {
                    TextureState::Loaded
                } else {
                    log::warn!("texture '{}' failed to load", name);
                    TextureState::Failed
                };
                true
            }
            None => {
                log::warn!("load result for unknown texture '{}'", name);
                false
            }
        }
    }

    pub fn state(&self, name: &str) -> Option<TextureState> {
        self.textures.get(name).map(|e| e.state)
    }

    /// Resolve a texture for use in a material.
    /// Pending textures resolve to their own id (the host binds them when ready);
    /// failed or unknown textures resolve to the placeholder.
    pub fn resolve(&self, name: &str) -> TextureId {
        match self.textures.get(name) {
            Some(TextureEntry {
                state: TextureState::Failed,
                ..
            }) => {
                log::warn!("texture '{}' unavailable, using placeholder", name);
                TextureId::PLACEHOLDER
            }
            Some(entry) => entry.id,
            None => {
                log::warn!("texture '{}' not in manifest, using placeholder", name);
                TextureId::PLACEHOLDER
            }
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
