use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{depth_scale_factor, discard_node};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectKind, NodeId};
use crate::components::geometry::Anchor;
use crate::core::landmark::{index, PoseSnapshot};
use crate::systems::factory::make_sprite;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HairAuraConfig {
    pub texture: String,
    /// Depth-factor base distance.
    pub base_distance: f32,
    /// Sprite size per unit of ear-to-ear distance.
    pub width_factor: f32,
    /// Vertical offset from the ear midpoint.
    pub y_offset: f32,
}

impl Default for HairAuraConfig {
    fn default() -> Self {
        Self {
            texture: "hair".to_string(),
            base_distance: 1.5,
            width_factor: 5.0,
            y_offset: -55.0,
        }
    }
}

/// Sprite placement derived from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub scale: Vec3,
}

/// Hair sprite pinned over the head, sized from the ear span.
pub struct HairAuraEffect {
    config: HairAuraConfig,
    latest: Option<PoseSnapshot>,
    node: Option<NodeId>,
    running: bool,
    placement: Option<Placement>,
}

impl HairAuraEffect {
    pub fn new(config: HairAuraConfig) -> Self {
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
        let left = ctx.landmark(pose, index::LEFT_EAR)?;
        let right = ctx.landmark(pose, index::RIGHT_EAR)?;
        let nose = ctx.landmark(pose, index::NOSE)?;
        let factor = depth_scale_factor(self.config.base_distance, nose.z);
        let size = (left.x - right.x).abs() * self.config.width_factor * factor;
        let mid = (left + right) / 2.0;
        Ok(Placement {
            position: Vec3::new(mid.x, mid.y + self.config.y_offset, 0.0),
            scale: Vec3::new(size, size, 1.0),
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

impl Effect for HairAuraEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::HairAura
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
        let sprite = make_sprite(ctx.scene.resources_mut(), texture, Anchor::BOTTOM).with_tag("hair");
        self.node = Some(ctx.scene.add(sprite));
        self.placement = Some(placement);
        self.running = true;
        self.apply(ctx);
        log::info!("hair aura on");
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
        // Keep the last placement when landmarks drop out.
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
