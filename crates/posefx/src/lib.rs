pub mod api;
pub mod core;
pub mod components;
pub mod assets;
pub mod systems;
pub mod effects;
pub mod orchestrator;
pub mod renderer;
pub mod bridge;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::config::{ConfigError, EngineConfig};
pub use api::context::EngineContext;
pub use api::effect::{Effect, SkipReason, StartOutcome};
pub use api::types::{EffectEvent, EffectKind, NodeId, PoseLabel, WireEvent};
pub use assets::error::AssetError;
pub use assets::manifest::AssetManifest;
pub use assets::registry::{TextureRegistry, TextureState};
pub use assets::vector::VectorAsset;
pub use bridge::protocol::{pack_frame, ProtocolLayout};
pub use components::material::{BlendMode, Color, Material, TextureId};
pub use components::node::Node;
pub use core::landmark::{Landmark, PoseError, PoseSnapshot, RenderSize};
pub use core::scene::Scene;
pub use core::time::{FrameClock, FrameTime};
pub use orchestrator::{CompletionCallback, DispatchOutcome, EffectSet, Orchestrator};
pub use renderer::instance::{RenderBuffer, RenderInstance, VectorVertex};
pub use systems::commentary::Commentary;
pub use systems::detection::{DetectionConfig, DetectionGate};
pub use systems::render::build_render_buffer;
pub use systems::stage::{Stage, StageError, StageTable};

pub use extensions::{ease, lerp, Easing};
