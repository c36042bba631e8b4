use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::hair::Placement;
use super::{depth_scale_factor, discard_node};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectKind, NodeId};
use crate::components::geometry::Anchor;
use crate::core::landmark::{index, PoseSnapshot};
use crate::systems::factory::make_sprite;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingOverlayConfig {
    pub texture: String,
    pub base_distance: f32,
    pub width_factor: f32,
    pub height_ratio: f32,
    /// Upward lift per unit of nose depth.
    pub lift_per_depth: f32,
    pub z: f32,
}

impl Default for RingOverlayConfig {
    fn default() -> Self {
        Self {
            texture: "ring".to_string(),
            base_distance: 1.2,
            width_factor: 3.0,
            height_ratio: 0.5,
            lift_per_depth: 110.0,
            z: 1.0,
        }
    }
}

/// Halo floating above the head. Shown during the blackout's dark window.
pub struct RingOverlayEffect {
    config: RingOverlayConfig,
    latest: Option<PoseSnapshot>,
    node: Option<NodeId>,
    running: bool,
    placement: Option<Placement>,
}

impl RingOverlayEffect {
    pub fn new(config: RingOverlayConfig) -> Self {
        Self {
            config,
            latest: None,
            node: None,
            running: false,
            placement: None,
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn place(&self, ctx: &EngineContext, pose: &PoseSnapshot) -> Result<Placement, SkipReason> {
        let nose = ctx.landmark(pose, index::NOSE)?;
        let left = ctx.landmark(pose, index::LEFT_EAR)?;
        let right = ctx.landmark(pose, index::RIGHT_EAR)?;
        let factor = depth_scale_factor(self.config.base_distance, left.z.max(right.z));
        let width = (left.x - right.x).abs() * self.config.width_factor * factor;
        let height = width * self.config.height_ratio * factor;
        Ok(Placement {
            position: Vec3::new(
                nose.x,
                nose.y + nose.z.abs() * self.config.lift_per_depth,
                self.config.z,
            ),
            scale: Vec3::new(width, height, 1.0),
        })
    }

    fn apply(&self, ctx: &mut EngineContext) {
        let (Some(p), Some(node)) = (self.placement, self.node.and_then(|id| ctx.scene.get_mut(id))) else {
            return;
        };
        node.position = p.position;
        node.scale = p.scale;
    }
}

impl Effect for RingOverlayEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::RingOverlay
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
        let sprite = make_sprite(ctx.scene.resources_mut(), texture, Anchor::BOTTOM).with_tag("ring");
        self.node = Some(ctx.scene.add(sprite));
        self.placement = Some(placement);
        self.running = true;
        self.apply(ctx);
        log::info!("ring overlay on");
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
