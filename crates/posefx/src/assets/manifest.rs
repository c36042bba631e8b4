use serde::{Deserialize, Serialize};

use crate::assets::error::AssetError;

/// Asset manifest listing the textures and vector art the effects use.
/// Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub textures: Vec<TextureDescriptor>,
    #[serde(default)]
    pub vectors: Vec<VectorDescriptor>,
}

/// Describes a single texture image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureDescriptor {
    /// Name effects refer to (e.g., "energy").
    pub name: String,
    /// Relative path to the image file.
    pub path: String,
}

/// Describes a vector art file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDescriptor {
    pub name: String,
    pub path: String,
}

impl AssetManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest() {
        let json = r#"{
            "textures": [
                { "name": "energy", "path": "energy.png" },
                { "name": "hair", "path": "hair.png" }
            ],
            "vectors": [
                { "name": "figure", "path": "figure.json" }
            ]
        }"#;
        let manifest = AssetManifest::from_json(json).unwrap();
        assert_eq!(manifest.textures.len(), 2);
        assert_eq!(manifest.textures[1].path, "hair.png");
        assert_eq!(manifest.vectors[0].name, "figure");
    }

    #[test]
    fn sections_are_optional() {
        let manifest = AssetManifest::from_json("{}").unwrap();
        assert!(manifest.textures.is_empty());
        assert!(manifest.vectors.is_empty());
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            AssetManifest::from_json("[1, 2"),
            Err(AssetError::Json(_))
        ));
    }
}
