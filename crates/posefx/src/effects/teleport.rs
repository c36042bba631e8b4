use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{discard_node, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectEvent, EffectKind, NodeId};
use crate::components::material::Material;
use crate::core::landmark::PoseSnapshot;
use crate::systems::factory::make_plane;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    pub texture: String,
    /// Depth of the backdrop while hidden behind the camera feed.
    pub parked_z: f32,
    /// Depth while shown in front of the feed.
    pub front_z: f32,
    pub duration_ms: f64,
    pub message: String,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            texture: "room".to_string(),
            parked_z: -2.0,
            front_z: 1.0,
            duration_ms: 1_200.0,
            message: "Instant Transmission!!!".to_string(),
        }
    }
}

/// Flashes a full-surface backdrop in front of the feed, then parks it
/// behind again.
pub struct TeleportEffect {
    config: TeleportConfig,
    node: Option<NodeId>,
    clock: RunClock,
    running: bool,
}

impl TeleportEffect {
    pub fn new(config: TeleportConfig) -> Self {
        Self {
            config,
            node: None,
            clock: RunClock::default(),
            running: false,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Depth of the backdrop, if it exists.
    pub fn depth(&self, ctx: &EngineContext) -> Option<f32> {
        self.node
            .and_then(|id| ctx.scene.get(id))
            .map(|n| n.position.z)
    }

    fn ensure_backdrop(&mut self, ctx: &mut EngineContext) -> NodeId {
        if let Some(id) = self.node.filter(|id| ctx.scene.contains(*id)) {
            return id;
        }
        let texture = ctx.textures.resolve(&self.config.texture);
        let plane = make_plane(
            ctx.scene.resources_mut(),
            ctx.surface.width,
            ctx.surface.height,
            Material::textured(texture),
        )
        .with_tag("teleport-backdrop")
        .with_position(Vec3::new(0.0, 0.0, self.config.parked_z));
        let id = ctx.scene.add(plane);
        self.node = Some(id);
        id
    }

    fn set_depth(&self, ctx: &mut EngineContext, z: f32) {
        if let Some(node) = self.node.and_then(|id| ctx.scene.get_mut(id)) {
            node.position.z = z;
        }
    }
}

impl Effect for TeleportEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Teleport
    }

    fn start(&mut self, ctx: &mut EngineContext, _pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.running {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        self.ensure_backdrop(ctx);
        self.set_depth(ctx, self.config.front_z);
        ctx.commentary.update_message(&self.config.message);
        self.clock.reset();
        self.running = true;
        log::info!("teleport backdrop shown");
        StartOutcome::Started
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        discard_node(ctx, &mut self.node);
        self.running = false;
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        if !self.running {
            return;
        }
        if self.clock.elapsed(ctx.frame.now_ms) >= self.config.duration_ms {
            self.set_depth(ctx, self.config.parked_z);
            self.running = false;
            log::debug!("teleport backdrop parked");
            ctx.emit(EffectEvent::Completed(EffectKind::Teleport));
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
