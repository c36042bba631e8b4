use glam::Vec3;

use crate::api::config::EngineConfig;
use crate::api::effect::SkipReason;
use crate::api::types::EffectEvent;
use crate::assets::registry::TextureRegistry;
use crate::core::landmark::{PoseSnapshot, RenderSize};
use crate::core::scene::Scene;
use crate::core::time::FrameTime;
use crate::systems::commentary::Commentary;

/// Mutable engine state handed to every effect call.
pub struct EngineContext {
    pub scene: Scene,
    pub textures: TextureRegistry,
    pub commentary: Commentary,
    pub events: Vec<EffectEvent>,
    pub frame: FrameTime,
    pub surface: RenderSize,
    pub min_visibility: f32,
}

impl EngineContext {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scene: Scene::new(),
            textures: TextureRegistry::new(),
            commentary: Commentary::new(),
            events: Vec::new(),
            frame: FrameTime::default(),
            surface: RenderSize::new(config.surface_width, config.surface_height),
            min_visibility: config.min_landmark_visibility,
        }
    }

    /// Emit an event to be processed after this frame's animate pass.
    pub fn emit(&mut self, event: EffectEvent) {
        self.events.push(event);
    }

    /// Look up a gated landmark and convert it to scene space.
    pub fn landmark(&self, pose: &PoseSnapshot, index: usize) -> Result<Vec3, SkipReason> {
        pose.require(index, self.min_visibility)
            .map(|lm| self.surface.to_scene(lm))
            .ok_or(SkipReason::MissingLandmark(index))
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EffectKind;
    use crate::core::landmark::Landmark;

    #[test]
    fn landmark_converts_to_scene_space() {
        let ctx = EngineContext::default();
        let pose = PoseSnapshot::new(vec![Landmark::new(0.5, 0.5, 0.2, 1.0)]);
        let p = ctx.landmark(&pose, 0).unwrap();
        assert_eq!(p, Vec3::new(0.0, 0.0, 0.2));
    }

    #[test]
    fn missing_landmark_reports_index() {
        let ctx = EngineContext::default();
        let pose = PoseSnapshot::new(vec![]);
        assert_eq!(ctx.landmark(&pose, 7), Err(SkipReason::MissingLandmark(7)));
    }

    #[test]
    fn visibility_gate_applies() {
        let config = EngineConfig {
            min_landmark_visibility: 0.5,
            ..Default::default()
        };
        let ctx = EngineContext::new(&config);
        let pose = PoseSnapshot::new(vec![Landmark::new(0.5, 0.5, 0.0, 0.2)]);
        assert!(ctx.landmark(&pose, 0).is_err());
    }

    #[test]
    fn emit_collects_events() {
        let mut ctx = EngineContext::default();
        ctx.emit(EffectEvent::DarkWindow);
        ctx.emit(EffectEvent::Completed(EffectKind::Teleport));
        assert_eq!(ctx.events.len(), 2);
    }
}
