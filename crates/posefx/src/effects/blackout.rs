//! Post-attack narration over a full-surface black plane. The plane fades in
//! for the "everyone perished" window and is cleared again afterwards.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{discard_node, enter_stages, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectEvent, EffectKind, NodeId};
use crate::components::material::{Color, Material};
use crate::core::landmark::PoseSnapshot;
use crate::systems::factory::make_plane;
use crate::systems::stage::{Stage, StageCursor, StageError, StageTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackoutConfig {
    /// Stage at which the plane goes opaque.
    pub dark_stage: usize,
    /// Stage at which the plane is cleared.
    pub restore_stage: usize,
    pub hidden_z: f32,
    pub dark_z: f32,
    pub color: Color,
    pub stages: Vec<Stage>,
}

impl Default for BlackoutConfig {
    fn default() -> Self {
        let window = 8_000.0;
        let messages = [
            "Uh oh...",
            "The Big Bang Attack didn't even scratch Majin Buu.",
            "Our only hope is that a survivor gathers the Dragon Balls and wishes everyone back...!",
            "Everyone perished.",
            "Six months of training, well done! The Saiyan power sleeping inside you is awakening fast!",
            "Keep training for a year or two and you'll reach Super Saiyan 3, strong enough to beat Majin Buu!",
        ];
        let mut stages: Vec<Stage> = messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let start = i as f64 * window;
                Stage::new(start, start + window).with_message(*m)
            })
            .collect();
        stages.push(Stage::open(messages.len() as f64 * window).finishing());
        Self {
            dark_stage: 3,
            restore_stage: 6,
            hidden_z: -3.0,
            dark_z: 2.0,
            color: Color::BLACK,
            stages,
        }
    }
}

pub struct NarrativeBlackoutEffect {
    config: BlackoutConfig,
    table: StageTable,
    cursor: StageCursor,
    clock: RunClock,
    node: Option<NodeId>,
    running: bool,
    dark: bool,
}

impl NarrativeBlackoutEffect {
    pub fn new(config: BlackoutConfig) -> Result<Self, StageError> {
        let table = StageTable::new(config.stages.clone())?;
        table.check_index(config.dark_stage)?;
        table.check_index(config.restore_stage)?;
        Ok(Self {
            config,
            table,
            cursor: StageCursor::new(),
            clock: RunClock::default(),
            node: None,
            running: false,
            dark: false,
        })
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn shade(&self, ctx: &mut EngineContext, opacity: f32, z: f32) {
        let Some(node) = self.node.and_then(|id| ctx.scene.get_mut(id)) else {
            return;
        };
        node.position.z = z;
        if let Some(mesh) = node.mesh_mut() {
            mesh.material.opacity = opacity;
        }
    }

    fn enter(&mut self, ctx: &mut EngineContext, stage: usize) {
        if stage == self.config.dark_stage && !self.dark {
            self.dark = true;
            self.shade(ctx, 1.0, self.config.dark_z);
            log::debug!("blackout: dark");
            ctx.emit(EffectEvent::DarkWindow);
        }
        if stage == self.config.restore_stage && self.dark {
            self.dark = false;
            self.shade(ctx, 0.0, self.config.hidden_z);
            log::debug!("blackout: light restored");
            ctx.emit(EffectEvent::LightRestored);
        }
        if self.table.get(stage).is_some_and(|s| s.is_final) {
            discard_node(ctx, &mut self.node);
            self.running = false;
            log::info!("blackout narration finished");
            ctx.emit(EffectEvent::Completed(EffectKind::NarrativeBlackout));
        }
    }
}

impl Effect for NarrativeBlackoutEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::NarrativeBlackout
    }

    fn start(&mut self, ctx: &mut EngineContext, _pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.running {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        discard_node(ctx, &mut self.node);
        let material = Material::solid(self.config.color).with_opacity(0.0);
        let plane = make_plane(
            ctx.scene.resources_mut(),
            ctx.surface.width,
            ctx.surface.height,
            material,
        )
        .with_tag("blackout")
        .with_position(Vec3::new(0.0, 0.0, self.config.hidden_z));
        self.node = Some(ctx.scene.add(plane));
        self.cursor.reset();
        self.clock.reset();
        self.dark = false;
        self.running = true;
        StartOutcome::Started
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        discard_node(ctx, &mut self.node);
        self.running = false;
        self.dark = false;
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        if !self.running {
            return;
        }
        let elapsed = self.clock.elapsed(ctx.frame.now_ms);
        for stage in enter_stages(ctx, &self.table, &mut self.cursor, elapsed) {
            self.enter(ctx, stage);
            if !self.running {
                break;
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
