use serde::{Deserialize, Serialize};

use super::{enter_stages, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectEvent, EffectKind};
use crate::core::landmark::PoseSnapshot;
use crate::systems::stage::{Stage, StageCursor, StageError, StageTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub stages: Vec<Stage>,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            stages: vec![
                Stage::new(0.0, 3_000.0)
                    .with_message("The... the whole Earth is shaking. What incredible power!"),
                Stage::new(3_000.0, 6_000.0).with_message("There's a level beyond Saiyan?!"),
                Stage::open(6_000.0)
                    .with_message("It's a Super Saiyan!!!!!")
                    .finishing(),
            ],
        }
    }
}

/// Commentary-only lead-in to the hair transformation. Adds no scene nodes.
pub struct IntroNarrationEffect {
    table: StageTable,
    cursor: StageCursor,
    clock: RunClock,
    running: bool,
}

impl IntroNarrationEffect {
    pub fn new(config: IntroConfig) -> Result<Self, StageError> {
        Ok(Self {
            table: StageTable::new(config.stages)?,
            cursor: StageCursor::new(),
            clock: RunClock::default(),
            running: false,
        })
    }
}

impl Effect for IntroNarrationEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::IntroNarration
    }

    fn start(&mut self, _ctx: &mut EngineContext, _pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.running {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        self.cursor.reset();
        self.clock.reset();
        self.running = true;
        StartOutcome::Started
    }

    fn stop(&mut self, _ctx: &mut EngineContext) {
        self.running = false;
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        if !self.running {
            return;
        }
        let elapsed = self.clock.elapsed(ctx.frame.now_ms);
        let entered = enter_stages(ctx, &self.table, &mut self.cursor, elapsed);
        if entered
            .iter()
            .any(|i| self.table.get(*i).is_some_and(|s| s.is_final))
        {
            self.running = false;
            log::info!("intro narration finished");
            ctx.emit(EffectEvent::Completed(EffectKind::IntroNarration));
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
