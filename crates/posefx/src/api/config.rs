use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::beam::BeamConfig;
use crate::effects::blackout::BlackoutConfig;
use crate::effects::body_aura::BodyAuraConfig;
use crate::effects::descending_figure::DescendingFigureConfig;
use crate::effects::energy_sphere::EnergySphereConfig;
use crate::effects::hair::HairAuraConfig;
use crate::effects::intro::IntroConfig;
use crate::effects::ring::RingOverlayConfig;
use crate::effects::teleport::TeleportConfig;
use crate::systems::detection::DetectionConfig;
use crate::systems::stage::StageError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid stage table for {effect}: {source}")]
    Stage {
        effect: &'static str,
        #[source]
        source: StageError,
    },
}

/// Configuration for the engine. Every field has a default, so a host may
/// supply a partial JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render surface width in scene units (default: 1300).
    pub surface_width: f32,
    /// Render surface height in scene units (default: 600).
    pub surface_height: f32,
    /// Landmarks below this visibility are treated as missing (default: 0,
    /// which still rejects zero-confidence points).
    pub min_landmark_visibility: f32,
    /// Upper bound on a single frame's delta time, in ms (default: 250).
    pub max_frame_dt_ms: f32,
    /// Seed for the spark RNG.
    pub seed: u64,
    /// Maximum render instances in the shared buffer (default: 1024).
    pub max_instances: usize,
    /// Maximum vector vertices in the shared buffer (default: 65536).
    pub max_vector_vertices: usize,
    /// Maximum wire events per frame (default: 32).
    pub max_events: usize,
    /// Consecutive-detection gate for classifier labels.
    pub detection: DetectionConfig,

    pub energy_sphere: EnergySphereConfig,
    pub beam: BeamConfig,
    pub descending_figure: DescendingFigureConfig,
    pub hair: HairAuraConfig,
    pub body_aura: BodyAuraConfig,
    pub teleport: TeleportConfig,
    pub blackout: BlackoutConfig,
    pub ring: RingOverlayConfig,
    pub intro: IntroConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_width: 1300.0,
            surface_height: 600.0,
            min_landmark_visibility: 0.0,
            max_frame_dt_ms: 250.0,
            seed: 42,
            max_instances: 1024,
            max_vector_vertices: 65536,
            max_events: 32,
            detection: DetectionConfig::default(),
            energy_sphere: EnergySphereConfig::default(),
            beam: BeamConfig::default(),
            descending_figure: DescendingFigureConfig::default(),
            hair: HairAuraConfig::default(),
            body_aura: BodyAuraConfig::default(),
            teleport: TeleportConfig::default(),
            blackout: BlackoutConfig::default(),
            ring: RingOverlayConfig::default(),
            intro: IntroConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
