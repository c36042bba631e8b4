//! Charged beam: a gold sphere that follows the hand through a chant of
//! syllables, each allowing it to grow a little more, then swells to fill
//! the screen.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{discard_node, enter_stages, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectEvent, EffectKind, NodeId};
use crate::components::material::Color;
use crate::core::landmark::{index, PoseSnapshot};
use crate::systems::factory::make_sphere;
use crate::systems::stage::{Stage, StageCursor, StageError, StageTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Landmark the beam originates from, re-sampled every frame.
    pub origin_landmark: usize,
    pub texture: String,
    pub color: Color,
    pub radius: f32,
    pub segments: u32,
    pub charge_growth_per_sec: f32,
    pub release_growth_per_sec: f32,
    pub release_ceiling: f32,
    /// Pause at full size before the beam is removed.
    pub teardown_delay_ms: f64,
    pub churn_per_sec: f32,
    pub stages: Vec<Stage>,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            origin_landmark: index::LEFT_INDEX,
            texture: "energy".to_string(),
            color: Color::GOLD,
            radius: 10.0,
            segments: 32,
            charge_growth_per_sec: 1.2,
            release_growth_per_sec: 80.0,
            release_ceiling: 130.0,
            teardown_delay_ms: 500.0,
            churn_per_sec: 0.5,
            stages: vec![
                Stage::new(0.0, 1_500.0).with_message("Take this!!!").with_ceiling(2.0),
                Stage::new(1_500.0, 2_500.0).with_message("Ka...").with_ceiling(3.0),
                Stage::new(2_500.0, 3_500.0).with_message("me...").with_ceiling(4.0),
                Stage::new(3_500.0, 4_500.0).with_message("ha...").with_ceiling(5.0),
                Stage::new(4_500.0, 5_500.0).with_message("me...").with_ceiling(6.0),
                Stage::open(5_500.0)
                    .with_message("HAAAAA!!!")
                    .with_ceiling(7.0)
                    .finishing(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeamPhase {
    Idle,
    Charging,
    Releasing,
    /// Full size; removed once `now_ms` reaches `until_ms`.
    Settling { until_ms: f64 },
}

pub struct BeamEffect {
    config: BeamConfig,
    table: StageTable,
    cursor: StageCursor,
    clock: RunClock,
    phase: BeamPhase,
    node: Option<NodeId>,
    latest: Option<PoseSnapshot>,
    position: Vec3,
    scale: f32,
    uv_offset: Vec2,
}

impl BeamEffect {
    pub fn new(config: BeamConfig) -> Result<Self, StageError> {
        let table = StageTable::new(config.stages.clone())?;
        Ok(Self {
            config,
            table,
            cursor: StageCursor::new(),
            clock: RunClock::default(),
            phase: BeamPhase::Idle,
            node: None,
            latest: None,
            position: Vec3::ZERO,
            scale: 1.0,
            uv_offset: Vec2::ZERO,
        })
    }

    pub fn phase(&self) -> BeamPhase {
        self.phase
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn is_charging(&self) -> bool {
        self.phase == BeamPhase::Charging
    }

    /// Skip the rest of the chant and fire immediately.
    /// Returns false unless the beam was charging.
    pub fn release_now(&mut self, ctx: &mut EngineContext) -> bool {
        if !self.is_charging() {
            return false;
        }
        let last = self.table.last_index();
        for i in self.cursor.advance_to(last) {
            if let Some(message) = self.table.get(i).and_then(|s| s.message.as_deref()) {
                ctx.commentary.update_message(message);
            }
        }
        log::debug!("beam released early at scale {:.2}", self.scale);
        self.phase = BeamPhase::Releasing;
        true
    }

    fn stage_ceiling(&self) -> f32 {
        self.cursor
            .current()
            .and_then(|i| self.table.get(i))
            .and_then(|s| s.scale_ceiling)
            .unwrap_or(self.config.release_ceiling)
    }

    fn follow_origin(&mut self, ctx: &EngineContext) {
        if let Some(p) = self
            .latest
            .as_ref()
            .and_then(|pose| ctx.landmark(pose, self.config.origin_landmark).ok())
        {
            self.position = p;
        }
    }

    fn sync(&self, ctx: &mut EngineContext) {
        let Some(node) = self.node.and_then(|id| ctx.scene.get_mut(id)) else {
            return;
        };
        node.position = self.position;
        node.scale = Vec3::splat(self.scale);
        if let Some(mesh) = node.mesh_mut() {
            mesh.material.uv_offset = self.uv_offset;
        }
    }
}

impl Effect for BeamEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Beam
    }

    fn start(&mut self, ctx: &mut EngineContext, pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.is_running() {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        if let Some(pose) = pose {
            self.latest = Some(pose.clone());
        }
        let Some(pose) = self.latest.as_ref() else {
            return StartOutcome::Skipped(SkipReason::NoPose);
        };
        self.position = match ctx.landmark(pose, self.config.origin_landmark) {
            Ok(p) => p,
            Err(reason) => return StartOutcome::Skipped(reason),
        };
        self.scale = 1.0;
        self.uv_offset = Vec2::ZERO;
        self.cursor.reset();
        self.clock.reset();

        discard_node(ctx, &mut self.node);
        let texture = ctx.textures.resolve(&self.config.texture);
        let mut sphere = make_sphere(
            ctx.scene.resources_mut(),
            texture,
            self.config.radius,
            self.config.segments,
            self.config.segments,
        )
        .with_tag("beam");
        if let Some(mesh) = sphere.mesh_mut() {
            mesh.material.color = self.config.color;
        }
        self.node = Some(ctx.scene.add(sphere));
        self.phase = BeamPhase::Charging;
        self.sync(ctx);
        log::info!("beam charging");
        StartOutcome::Started
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        discard_node(ctx, &mut self.node);
        self.phase = BeamPhase::Idle;
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        if self.phase == BeamPhase::Idle {
            return;
        }
        let dt = ctx.frame.dt;
        let now = ctx.frame.now_ms;
        let elapsed = self.clock.elapsed(now);
        self.uv_offset += Vec2::splat(self.config.churn_per_sec * dt);
        self.follow_origin(ctx);

        if self.phase == BeamPhase::Charging {
            for i in enter_stages(ctx, &self.table, &mut self.cursor, elapsed) {
                if self.table.get(i).is_some_and(|s| s.is_final) {
                    self.phase = BeamPhase::Releasing;
                }
            }
        }

        match self.phase {
            BeamPhase::Charging => {
                let ceiling = self.stage_ceiling();
                if self.scale < ceiling {
                    self.scale = (self.scale + self.config.charge_growth_per_sec * dt).min(ceiling);
                }
            }
            BeamPhase::Releasing => {
                self.scale = (self.scale + self.config.release_growth_per_sec * dt)
                    .min(self.config.release_ceiling);
                if self.scale >= self.config.release_ceiling {
                    self.phase = BeamPhase::Settling {
                        until_ms: now + self.config.teardown_delay_ms,
                    };
                }
            }
            BeamPhase::Settling { until_ms } => {
                if now >= until_ms {
                    self.stop(ctx);
                    log::info!("beam finished");
                    ctx.emit(EffectEvent::Completed(EffectKind::Beam));
                    return;
                }
            }
            BeamPhase::Idle => return,
        }
        self.sync(ctx);
    }

    fn is_running(&self) -> bool {
        self.phase != BeamPhase::Idle
    }

    fn track(&mut self, pose: &PoseSnapshot) {
        self.latest = Some(pose.clone());
    }
}
