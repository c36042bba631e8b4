use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::hair::Placement;
use super::{depth_scale_factor, discard_node, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectKind, NodeId};
use crate::components::geometry::Anchor;
use crate::components::material::Color;
use crate::core::landmark::{index, PoseSnapshot};
use crate::extensions::easing::Easing;
use crate::systems::factory::make_sprite;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyAuraConfig {
    pub texture: String,
    pub base_distance: f32,
    /// Added to the hand span so the aura clears the arms.
    pub width_padding: f32,
    /// Headroom above the nose, in scene units.
    pub head_room: f32,
    pub start_color: Color,
    pub end_color: Color,
    pub color_ramp_ms: f64,
    pub color_easing: Easing,
}

impl Default for BodyAuraConfig {
    fn default() -> Self {
        Self {
            texture: "aura".to_string(),
            base_distance: 1.5,
            width_padding: 300.0,
            head_room: 600.0,
            start_color: Color::LIGHT_GRAY,
            end_color: Color::GOLD,
            color_ramp_ms: 3_000.0,
            color_easing: Easing::SineInOut,
        }
    }
}

/// Full-body aura standing on the lower foot and wrapping both hands.
pub struct BodyAuraEffect {
    config: BodyAuraConfig,
    latest: Option<PoseSnapshot>,
    node: Option<NodeId>,
    running: bool,
    clock: RunClock,
    placement: Option<Placement>,
    color: Color,
}

impl BodyAuraEffect {
    pub fn new(config: BodyAuraConfig) -> Self {
        let color = config.start_color;
        Self {
            config,
            latest: None,
            node: None,
            running: false,
            clock: RunClock::default(),
            placement: None,
            color,
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn color(&self) -> Color {
        self.color
    }

    fn place(&self, ctx: &EngineContext, pose: &PoseSnapshot) -> Result<Placement, SkipReason> {
        let nose = ctx.landmark(pose, index::NOSE)?;
        let left_hand = ctx.landmark(pose, index::LEFT_INDEX)?;
        let right_hand = ctx.landmark(pose, index::RIGHT_INDEX)?;
        let left_foot = ctx.landmark(pose, index::LEFT_FOOT_INDEX)?;
        let right_foot = ctx.landmark(pose, index::RIGHT_FOOT_INDEX)?;

        let factor = depth_scale_factor(self.config.base_distance, nose.z);
        let min_x = left_hand.x.min(right_hand.x);
        let max_x = left_hand.x.max(right_hand.x);
        let ground = left_foot.y.min(right_foot.y);
        let width = (min_x.abs() + max_x.abs()) * factor + self.config.width_padding;
        let height = ground.abs() + (nose.y + self.config.head_room).abs();
        Ok(Placement {
            position: Vec3::new(nose.x, ground, 0.0),
            scale: Vec3::new(width, height, 1.0),
        })
    }

    fn apply(&self, ctx: &mut EngineContext) {
        let (Some(p), Some(node)) = (self.placement, self.node.and_then(|id| ctx.scene.get_mut(id))) else {
            return;
        };
        node.position = p.position;
        node.scale = p.scale;
        if let Some(mesh) = node.mesh_mut() {
            mesh.material.color = self.color;
        }
    }
}

impl Effect for BodyAuraEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::BodyAura
    }

    fn start(&mut self, ctx: &mut EngineContext, pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.running {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        if let Some(pose) = pose {
            self.latest = Some(pose.clone());
        }
        let Some(pose) = self.latest.as_ref() else {
            return StartOutcome::Skipped(SkipReason::NoPose);
        };
        let placement = match self.place(ctx, pose) {
            Ok(p) => p,
            Err(reason) => return StartOutcome::Skipped(reason),
        };
        discard_node(ctx, &mut self.node);
        let texture = ctx.textures.resolve(&self.config.texture);
        let sprite = make_sprite(ctx.scene.resources_mut(), texture, Anchor::BOTTOM).with_tag("body-aura");
        self.node = Some(ctx.scene.add(sprite));
        self.placement = Some(placement);
        self.color = self.config.start_color;
        self.clock.reset();
        self.running = true;
        self.apply(ctx);
        log::info!("body aura on");
        StartOutcome::Started
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        discard_node(ctx, &mut self.node);
        self.running = false;
        self.placement = None;
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        if !self.running {
            return;
        }
        let elapsed = self.clock.elapsed(ctx.frame.now_ms);
        let t = if self.config.color_ramp_ms > 0.0 {
            (elapsed / self.config.color_ramp_ms) as f32
        } else {
            1.0
        };
        self.color = self
            .config
            .start_color
            .lerp(self.config.end_color, self.config.color_easing.apply(t));
        if let Some(p) = self.latest.as_ref().and_then(|pose| self.place(ctx, pose).ok()) {
            self.placement = Some(p);
        }
        self.apply(ctx);
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn track(&mut self, pose: &PoseSnapshot) {
        self.latest = Some(pose.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::landmark::Landmark;
    use crate::effects::test_support::{pose_with, run_frames};

    fn body() -> PoseSnapshot {
        pose_with(&[
            (index::NOSE, Landmark::new(0.5, 0.25, 0.0, 1.0)),
            (index::LEFT_INDEX, Landmark::new(0.7, 0.5, 0.0, 1.0)),
            (index::RIGHT_INDEX, Landmark::new(0.3, 0.5, 0.0, 1.0)),
            (index::LEFT_FOOT_INDEX, Landmark::new(0.55, 0.9, 0.0, 1.0)),
            (index::RIGHT_FOOT_INDEX, Landmark::new(0.45, 0.95, 0.0, 1.0)),
        ])
    }

    #[test]
    fn placement_spans_hands_and_feet() {
        let mut ctx = EngineContext::default();
        let mut fx = BodyAuraEffect::new(BodyAuraConfig::default());
        assert_eq!(fx.start(&mut ctx, Some(&body())), StartOutcome::Started);
        let p = fx.placement().unwrap();
        // Hands at x = +-260, feet at y = -240 and -270, nose at y = 150.
        assert!((p.scale.x - (520.0 + 300.0)).abs() < 1e-2, "width {}", p.scale.x);
        assert!((p.scale.y - (270.0 + 750.0)).abs() < 1e-2, "height {}", p.scale.y);
        assert!((p.position.y + 270.0).abs() < 1e-2);
        assert!(p.position.x.abs() < 1e-3);
    }

    #[test]
    fn color_ramps_to_gold() {
        let mut ctx = EngineContext::default();
        let mut fx = BodyAuraEffect::new(BodyAuraConfig::default());
        fx.start(&mut ctx, Some(&body()));
        assert_eq!(fx.color(), Color::LIGHT_GRAY);
        run_frames(&mut fx, &mut ctx, 0.0, 1_500.0, 16.0);
        let mid = fx.color();
        assert!(mid.b < Color::LIGHT_GRAY.b && mid.b > 0.0);
        run_frames(&mut fx, &mut ctx, 1_500.0, 4_000.0, 16.0);
        assert!((fx.color().b - Color::GOLD.b).abs() < 1e-6);
        assert!(fx.is_running());
    }

    #[test]
    fn missing_foot_skips() {
        let mut ctx = EngineContext::default();
        let mut fx = BodyAuraEffect::new(BodyAuraConfig::default());
        let upper = PoseSnapshot::new(vec![Landmark::new(0.5, 0.5, 0.0, 1.0); 25]);
        assert_eq!(
            fx.start(&mut ctx, Some(&upper)),
            StartOutcome::Skipped(SkipReason::MissingLandmark(index::LEFT_FOOT_INDEX))
        );
        assert!(ctx.scene.is_empty());
    }

    #[test]
    fn restart_resets_color() {
        let mut ctx = EngineContext::default();
        let mut fx = BodyAuraEffect::new(BodyAuraConfig::default());
        fx.start(&mut ctx, Some(&body()));
        run_frames(&mut fx, &mut ctx, 0.0, 4_000.0, 16.0);
        fx.stop(&mut ctx);
        fx.stop(&mut ctx);
        assert_eq!(ctx.scene.resources().live_count(), 0);
        fx.start(&mut ctx, Some(&body()));
        assert_eq!(fx.color(), Color::LIGHT_GRAY);
    }
}
