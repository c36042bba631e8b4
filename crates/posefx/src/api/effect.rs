use crate::api::context::EngineContext;
use crate::api::types::EffectKind;
use crate::core::landmark::PoseSnapshot;

/// Why an effect declined to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No snapshot was supplied and none has been tracked yet.
    NoPose,
    /// A required landmark was absent, non-finite or below the visibility gate.
    MissingLandmark(usize),
    /// The effect's asset failed to load.
    AssetUnavailable,
    /// The effect is already running.
    AlreadyRunning,
}

/// Result of `Effect::start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Accepted, but waiting on an asset before anything is shown.
    Queued,
    Skipped(SkipReason),
}

/// The contract every effect state machine fulfills.
///
/// Effects are built once and reused: `start` must reset all per-run state,
/// and `stop` must be safe to call any number of times.
pub trait Effect {
    fn kind(&self) -> EffectKind;

    /// Begin a run. Resources are acquired here, not at construction.
    fn start(&mut self, ctx: &mut EngineContext, pose: Option<&PoseSnapshot>) -> StartOutcome;

    /// Hard stop: remove and dispose every node this effect added.
    fn stop(&mut self, ctx: &mut EngineContext);

    /// Advance one frame. Only called while `is_running()`.
    fn animate(&mut self, ctx: &mut EngineContext);

    fn is_running(&self) -> bool;

    /// Receive the latest snapshot from the continuous landmark feed.
    fn track(&mut self, _pose: &PoseSnapshot) {}
}
