//! Effect state machines. Each one owns the scene nodes it adds and
//! drives them from `animate`.

pub mod beam;
pub mod blackout;
pub mod body_aura;
pub mod descending_figure;
pub mod energy_sphere;
pub mod hair;
pub mod intro;
pub mod ring;
pub mod teleport;

pub use beam::BeamEffect;
pub use blackout::NarrativeBlackoutEffect;
pub use body_aura::BodyAuraEffect;
pub use descending_figure::DescendingFigureEffect;
pub use energy_sphere::EnergySphereEffect;
pub use hair::HairAuraEffect;
pub use intro::IntroNarrationEffect;
pub use ring::RingOverlayEffect;
pub use teleport::TeleportEffect;

use crate::api::context::EngineContext;
use crate::api::types::NodeId;
use crate::systems::stage::{StageCursor, StageTable};

/// Elapsed time of a run, measured from its first animated frame.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunClock {
    started_at: Option<f64>,
}

impl RunClock {
    pub(crate) fn reset(&mut self) {
        self.started_at = None;
    }

    /// Milliseconds since the first call after `reset`.
    pub(crate) fn elapsed(&mut self, now_ms: f64) -> f64 {
        let start = *self.started_at.get_or_insert(now_ms);
        (now_ms - start).max(0.0)
    }
}

/// Apparent-size factor for a landmark depth `z`, approximated as
/// `base / (base - z)`. The denominator is floored so extreme depths stay finite.
pub fn depth_scale_factor(base: f32, z: f32) -> f32 {
    base / (base - z).max(base * 0.1)
}

/// Advance `cursor` and push the message of every newly entered stage.
/// Returns the entered stage indices, in order.
pub(crate) fn enter_stages(
    ctx: &mut EngineContext,
    table: &StageTable,
    cursor: &mut StageCursor,
    elapsed_ms: f64,
) -> Vec<usize> {
    let entered: Vec<usize> = cursor.advance(table, elapsed_ms).collect();
    for stage in entered.iter().filter_map(|i| table.get(*i)) {
        if let Some(message) = &stage.message {
            ctx.commentary.update_message(message);
        }
    }
    entered
}

/// Remove and dispose a node held in `slot`. Safe to call when empty.
pub(crate) fn discard_node(ctx: &mut EngineContext, slot: &mut Option<NodeId>) {
    if let Some(id) = slot.take() {
        ctx.scene.discard(id);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_clock_starts_on_first_frame() {
        let mut clock = RunClock::default();
        assert_eq!(clock.elapsed(5000.0), 0.0);
        assert_eq!(clock.elapsed(5250.0), 250.0);
        clock.reset();
        assert_eq!(clock.elapsed(9000.0), 0.0);
    }

    #[test]
    fn depth_factor_is_one_at_zero_depth() {
        assert_eq!(depth_scale_factor(1.5, 0.0), 1.0);
        assert!(depth_scale_factor(1.5, 0.5) > 1.0);
        assert!(depth_scale_factor(1.5, -0.5) < 1.0);
        assert!(depth_scale_factor(1.5, 10.0).is_finite());
    }
}
