//! Charged energy sphere: grows at the hand, shifts color as it nears its
//! climax, then fires off the left edge of the surface.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{discard_node, enter_stages, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectEvent, EffectKind, NodeId};
use crate::components::material::Color;
use crate::core::landmark::{index, PoseSnapshot};
use crate::systems::factory::make_sphere;
use crate::systems::particles::{SparkConfig, SparkField};
use crate::systems::stage::{Stage, StageCursor, StageError, StageTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySphereConfig {
    /// Landmark the sphere spawns at (default: hand middle-finger knuckle).
    pub spawn_landmark: usize,
    /// Offset from the landmark, in scene units.
    pub spawn_offset: [f32; 2],
    pub texture: String,
    pub radius: f32,
    pub segments: u32,
    pub growth_per_sec: f32,
    pub scale_ceiling: f32,
    /// Above this scale the sphere changes color and fades.
    pub climax_scale: f32,
    /// Scale at which the hue completes one turn.
    pub hue_period: f32,
    /// Scale at which opacity reaches zero.
    pub fade_scale: f32,
    /// Texture scroll speed, in UV units per second.
    pub churn_per_sec: f32,
    /// Leftward speed once released, in units per second.
    pub release_speed: f32,
    pub sparks: SparkConfig,
    pub stages: Vec<Stage>,
}

impl Default for EnergySphereConfig {
    fn default() -> Self {
        Self {
            spawn_landmark: index::MIDDLE_FINGER_MCP,
            spawn_offset: [-100.0, 0.0],
            texture: "energy".to_string(),
            radius: 10.0,
            segments: 32,
            growth_per_sec: 0.5,
            scale_ceiling: 11.0,
            climax_scale: 4.0,
            hue_period: 10.0,
            fade_scale: 10.0,
            churn_per_sec: 0.65,
            release_speed: 1800.0,
            sparks: SparkConfig::default(),
            stages: vec![
                Stage::new(0.0, 4_000.0).with_message("Big Bang Attack!!!"),
                Stage::new(4_000.0, 10_000.0)
                    .with_message("Tien! My psychic powers don't work on him!"),
                Stage::new(10_000.0, 15_000.0)
                    .with_message("He's going to wipe out the whole Earth!!!!"),
                Stage::new(15_000.0, 19_000.0).with_message("Waaaaaah!!!!"),
                Stage::open(19_000.0)
                    .with_message("Goodbye, Tien...")
                    .finishing(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpherePhase {
    Idle,
    Charging,
    Climax,
    Discharging,
}

pub struct EnergySphereEffect {
    config: EnergySphereConfig,
    table: StageTable,
    cursor: StageCursor,
    clock: RunClock,
    phase: SpherePhase,
    node: Option<NodeId>,
    sparks: SparkField,
    position: Vec3,
    scale: f32,
    color: Color,
    opacity: f32,
    uv_offset: Vec2,
}

impl EnergySphereEffect {
    pub fn new(config: EnergySphereConfig, seed: u64) -> Result<Self, StageError> {
        let table = StageTable::new(config.stages.clone())?;
        let sparks = SparkField::new(config.sparks.clone(), seed);
        Ok(Self {
            config,
            table,
            cursor: StageCursor::new(),
            clock: RunClock::default(),
            phase: SpherePhase::Idle,
            node: None,
            sparks,
            position: Vec3::ZERO,
            scale: 1.0,
            color: Color::WHITE,
            opacity: 1.0,
            uv_offset: Vec2::ZERO,
        })
    }

    pub fn phase(&self) -> SpherePhase {
        self.phase
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn sparks(&self) -> &SparkField {
        &self.sparks
    }

    /// Growth limit: the config ceiling, tightened by the current stage's.
    fn ceiling(&self) -> f32 {
        self.cursor
            .current()
            .and_then(|i| self.table.get(i))
            .and_then(|s| s.scale_ceiling)
            .map_or(self.config.scale_ceiling, |c| c.min(self.config.scale_ceiling))
    }

    fn begin_discharge(&mut self, ctx: &mut EngineContext) {
        if self.phase == SpherePhase::Discharging {
            return;
        }
        log::debug!("energy sphere released at scale {:.2}", self.scale);
        self.phase = SpherePhase::Discharging;
        self.sparks.park(&mut ctx.scene);
    }

    fn finish(&mut self, ctx: &mut EngineContext) {
        self.release(ctx);
        log::info!("energy sphere left the surface");
        ctx.emit(EffectEvent::Completed(EffectKind::EnergySphere));
    }

    fn release(&mut self, ctx: &mut EngineContext) {
        discard_node(ctx, &mut self.node);
        self.sparks.detach(&mut ctx.scene);
        self.phase = SpherePhase::Idle;
    }

    fn sync(&self, ctx: &mut EngineContext) {
        let Some(node) = self.node.and_then(|id| ctx.scene.get_mut(id)) else {
            return;
        };
        node.position = self.position;
        node.scale = Vec3::splat(self.scale);
        if let Some(mesh) = node.mesh_mut() {
            mesh.material.color = self.color;
            mesh.material.opacity = self.opacity;
            mesh.material.uv_offset = self.uv_offset;
        }
    }
}

impl Effect for EnergySphereEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::EnergySphere
    }

    fn start(&mut self, ctx: &mut EngineContext, pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.is_running() {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        let Some(pose) = pose else {
            return StartOutcome::Skipped(SkipReason::NoPose);
        };
        let anchor = match ctx.landmark(pose, self.config.spawn_landmark) {
            Ok(p) => p,
            Err(reason) => return StartOutcome::Skipped(reason),
        };

        let [dx, dy] = self.config.spawn_offset;
        self.position = anchor + Vec3::new(dx, dy, 0.0);
        self.scale = 1.0;
        self.color = Color::WHITE;
        self.opacity = 1.0;
        self.uv_offset = Vec2::ZERO;
        self.cursor.reset();
        self.clock.reset();

        discard_node(ctx, &mut self.node);
        let texture = ctx.textures.resolve(&self.config.texture);
        let sphere = make_sphere(
            ctx.scene.resources_mut(),
            texture,
            self.config.radius,
            self.config.segments,
            self.config.segments,
        )
        .with_tag("energy-sphere");
        self.node = Some(ctx.scene.add(sphere));

        let spark_texture = ctx.textures.resolve(&self.config.sparks.texture);
        self.sparks.reposition(self.position.x, self.position.y);
        self.sparks.attach(&mut ctx.scene, spark_texture);

        self.phase = SpherePhase::Charging;
        self.sync(ctx);
        log::info!(
            "energy sphere charging at ({:.1}, {:.1})",
            self.position.x,
            self.position.y
        );
        StartOutcome::Started
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        if self.phase != SpherePhase::Idle {
            log::debug!("energy sphere stopped");
        }
        self.release(ctx);
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        if self.phase == SpherePhase::Idle {
            return;
        }
        let dt = ctx.frame.dt;
        let elapsed = self.clock.elapsed(ctx.frame.now_ms);
        self.uv_offset += Vec2::splat(self.config.churn_per_sec * dt);

        for i in enter_stages(ctx, &self.table, &mut self.cursor, elapsed) {
            if self.table.get(i).is_some_and(|s| s.is_final) {
                self.begin_discharge(ctx);
            }
        }

        match self.phase {
            SpherePhase::Charging | SpherePhase::Climax => {
                let ceiling = self.ceiling();
                if self.scale < ceiling {
                    self.scale = (self.scale + self.config.growth_per_sec * dt).min(ceiling);
                }
                if self.scale > self.config.climax_scale {
                    self.phase = SpherePhase::Climax;
                    self.color = Color::from_hsl(self.scale / self.config.hue_period, 1.0, 0.5);
                    self.opacity = (1.0 - self.scale / self.config.fade_scale).clamp(0.0, 1.0);
                }
                self.sparks.reposition(self.position.x, self.position.y);
                self.sparks.tick(dt);
                self.sparks.sync(&mut ctx.scene);
            }
            SpherePhase::Discharging => {
                self.position.x -= self.config.release_speed * dt;
                let half_extent = self.config.radius * self.scale;
                if self.position.x < -(ctx.surface.half_width() + half_extent) {
                    self.finish(ctx);
                    return;
                }
            }
            SpherePhase::Idle => return,
        }
        self.sync(ctx);
    }

    fn is_running(&self) -> bool {
        self.phase != SpherePhase::Idle
    }
}
