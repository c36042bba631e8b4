//! Owns every effect and routes classifier labels to them.
//!
//! Effects are built once, up front, in registration order. Each frame the
//! orchestrator animates whatever is running, then processes the events the
//! effects emitted: completion callbacks fire, follow-on effects start, and
//! every event is copied to an outbox for the host.

use crate::api::config::{ConfigError, EngineConfig};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectEvent, EffectKind, PoseLabel};
use crate::assets::error::AssetError;
use crate::assets::vector::VectorAsset;
use crate::core::landmark::PoseSnapshot;
use crate::core::time::FrameClock;
use crate::effects::{
    BeamEffect, BodyAuraEffect, DescendingFigureEffect, EnergySphereEffect, HairAuraEffect,
    IntroNarrationEffect, NarrativeBlackoutEffect, RingOverlayEffect, TeleportEffect,
};
use crate::systems::detection::DetectionGate;
use crate::systems::stage::StageError;

/// Invoked once with the triggering label when the primary effect finishes
/// or is stopped.
pub type CompletionCallback = Box<dyn FnOnce(PoseLabel)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `queued` is set when part of the request is waiting on an asset.
    Dispatched { primary: EffectKind, queued: bool },
    /// A blocking effect is already running.
    Rejected { busy: EffectKind },
    /// The primary effect declined to start; no callback is kept.
    Skipped(SkipReason),
    /// The label maps to no effect.
    Ignored,
}

struct PendingCompletion {
    kind: EffectKind,
    label: PoseLabel,
    callback: CompletionCallback,
}

/// Primary effect and optional companion started alongside it.
fn dispatch_plan(label: PoseLabel) -> Option<(EffectKind, Option<EffectKind>)> {
    match label {
        PoseLabel::ChargedSphere | PoseLabel::ChargedSphereLeft => {
            Some((EffectKind::EnergySphere, Some(EffectKind::DescendingFigure)))
        }
        PoseLabel::BeamPose => Some((EffectKind::Beam, None)),
        PoseLabel::Teleport => Some((EffectKind::Teleport, None)),
        PoseLabel::PowerUp => Some((EffectKind::IntroNarration, Some(EffectKind::BodyAura))),
        _ => None,
    }
}

/// One instance of every effect.
pub struct EffectSet {
    pub hair: HairAuraEffect,
    pub energy_sphere: EnergySphereEffect,
    pub descending_figure: DescendingFigureEffect,
    pub body_aura: BodyAuraEffect,
    pub beam: BeamEffect,
    pub ring: RingOverlayEffect,
    pub teleport: TeleportEffect,
    pub blackout: NarrativeBlackoutEffect,
    pub intro: IntroNarrationEffect,
}

impl EffectSet {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let stage_error = |kind: EffectKind| {
            move |source: StageError| ConfigError::Stage {
                effect: kind.name(),
                source,
            }
        };
        Ok(Self {
            hair: HairAuraEffect::new(config.hair.clone()),
            energy_sphere: EnergySphereEffect::new(config.energy_sphere.clone(), config.seed)
                .map_err(stage_error(EffectKind::EnergySphere))?,
            descending_figure: DescendingFigureEffect::new(config.descending_figure.clone()),
            body_aura: BodyAuraEffect::new(config.body_aura.clone()),
            beam: BeamEffect::new(config.beam.clone()).map_err(stage_error(EffectKind::Beam))?,
            ring: RingOverlayEffect::new(config.ring.clone()),
            teleport: TeleportEffect::new(config.teleport.clone()),
            blackout: NarrativeBlackoutEffect::new(config.blackout.clone())
                .map_err(stage_error(EffectKind::NarrativeBlackout))?,
            intro: IntroNarrationEffect::new(config.intro.clone())
                .map_err(stage_error(EffectKind::IntroNarration))?,
        })
    }

    pub fn get(&self, kind: EffectKind) -> &dyn Effect {
        match kind {
            EffectKind::HairAura => &self.hair,
            EffectKind::EnergySphere => &self.energy_sphere,
            EffectKind::DescendingFigure => &self.descending_figure,
            EffectKind::BodyAura => &self.body_aura,
            EffectKind::Beam => &self.beam,
            EffectKind::RingOverlay => &self.ring,
            EffectKind::Teleport => &self.teleport,
            EffectKind::NarrativeBlackout => &self.blackout,
            EffectKind::IntroNarration => &self.intro,
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut dyn Effect {
        match kind {
            EffectKind::HairAura => &mut self.hair,
            EffectKind::EnergySphere => &mut self.energy_sphere,
            EffectKind::DescendingFigure => &mut self.descending_figure,
            EffectKind::BodyAura => &mut self.body_aura,
            EffectKind::Beam => &mut self.beam,
            EffectKind::RingOverlay => &mut self.ring,
            EffectKind::Teleport => &mut self.teleport,
            EffectKind::NarrativeBlackout => &mut self.blackout,
            EffectKind::IntroNarration => &mut self.intro,
        }
    }
}

pub struct Orchestrator {
    effects: EffectSet,
    clock: FrameClock,
    gate: DetectionGate,
    pending: Vec<PendingCompletion>,
    outbox: Vec<EffectEvent>,
    latest_pose: Option<PoseSnapshot>,
}

impl Orchestrator {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            effects: EffectSet::new(config)?,
            clock: FrameClock::new(config.max_frame_dt_ms),
            gate: DetectionGate::new(config.detection.clone()),
            pending: Vec::new(),
            outbox: Vec::new(),
            latest_pose: None,
        })
    }

    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    pub fn gate(&self) -> &DetectionGate {
        &self.gate
    }

    /// The running blocking effect, if any.
    pub fn busy_effect(&self) -> Option<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .find(|k| k.is_blocking() && self.effects.get(*k).is_running())
    }

    pub fn is_effect_in_progress(&self) -> bool {
        self.busy_effect().is_some()
    }

    /// Feed the latest snapshot to every tracking effect.
    pub fn update_landmarks(&mut self, pose: &PoseSnapshot) {
        for kind in EffectKind::ALL {
            self.effects.get_mut(kind).track(pose);
        }
        self.latest_pose = Some(pose.clone());
    }

    /// Start the effect(s) mapped to `label`.
    pub fn show_effect(
        &mut self,
        ctx: &mut EngineContext,
        label: Option<PoseLabel>,
        pose: Option<&PoseSnapshot>,
        on_complete: Option<CompletionCallback>,
    ) -> DispatchOutcome {
        if let Some(pose) = pose {
            self.update_landmarks(pose);
        }
        let Some(label) = label else {
            return DispatchOutcome::Ignored;
        };

        if label == PoseLabel::BeamRelease {
            if self.effects.beam.release_now(ctx) {
                log::info!("beam released");
                self.await_completion(EffectKind::Beam, label, on_complete);
                return DispatchOutcome::Dispatched {
                    primary: EffectKind::Beam,
                    queued: false,
                };
            }
            return DispatchOutcome::Ignored;
        }

        let Some((primary, companion)) = dispatch_plan(label) else {
            log::debug!("no effect for {:?}", label);
            return DispatchOutcome::Ignored;
        };
        if primary.is_blocking() {
            if let Some(busy) = self.busy_effect() {
                log::warn!("{:?} rejected: {} is running", label, busy.name());
                return DispatchOutcome::Rejected { busy };
            }
        }

        let pose = pose.or(self.latest_pose.as_ref());
        let outcome = self.effects.get_mut(primary).start(ctx, pose);
        if let StartOutcome::Skipped(reason) = outcome {
            log::warn!("{} skipped: {:?}", primary.name(), reason);
            return DispatchOutcome::Skipped(reason);
        }
        let mut queued = outcome == StartOutcome::Queued;
        if let Some(companion) = companion {
            match self.effects.get_mut(companion).start(ctx, pose) {
                StartOutcome::Skipped(reason) => {
                    log::debug!("{} skipped: {:?}", companion.name(), reason)
                }
                StartOutcome::Queued => queued = true,
                StartOutcome::Started => {}
            }
        }
        self.await_completion(primary, label, on_complete);
        log::info!("{:?} -> {}", label, primary.name());
        DispatchOutcome::Dispatched { primary, queued }
    }

    /// Run a raw classifier label through the detection gate and dispatch
    /// once it is confirmed. Beam release bypasses the gate.
    pub fn observe_label(
        &mut self,
        ctx: &mut EngineContext,
        label: Option<PoseLabel>,
        pose: Option<&PoseSnapshot>,
        on_complete: Option<CompletionCallback>,
    ) -> DispatchOutcome {
        if label == Some(PoseLabel::BeamRelease) {
            return self.show_effect(ctx, label, pose, on_complete);
        }
        if let Some(pose) = pose {
            self.update_landmarks(pose);
        }
        if self.is_effect_in_progress() {
            return DispatchOutcome::Ignored;
        }
        if label == Some(PoseLabel::PowerUp) && self.effects.hair.is_running() {
            self.gate.reset(&mut ctx.commentary);
            return DispatchOutcome::Ignored;
        }
        if !self.gate.observe(label, &mut ctx.commentary) {
            return DispatchOutcome::Ignored;
        }
        self.show_effect(ctx, label, None, on_complete)
    }

    /// Advance one display frame.
    pub fn animate(&mut self, ctx: &mut EngineContext, now_ms: f64) {
        ctx.frame = self.clock.advance(now_ms);
        for kind in EffectKind::ALL {
            let effect = self.effects.get_mut(kind);
            if effect.is_running() {
                effect.animate(ctx);
            }
        }
        self.process_events(ctx);
    }

    fn process_events(&mut self, ctx: &mut EngineContext) {
        let mut queue = std::mem::take(&mut ctx.events);
        let mut next = 0;
        while next < queue.len() {
            let event = queue[next];
            next += 1;
            match event {
                EffectEvent::Completed(kind) => {
                    self.fire_completions(kind);
                    self.chain_after(ctx, kind);
                }
                EffectEvent::DarkWindow => {
                    let pose = self.latest_pose.as_ref();
                    if let StartOutcome::Skipped(reason) = self.effects.ring.start(ctx, pose) {
                        log::debug!("ring skipped: {:?}", reason);
                    }
                    self.effects.descending_figure.stop(ctx);
                }
                EffectEvent::LightRestored => {}
            }
            self.outbox.push(event);
            queue.append(&mut ctx.events);
        }
    }

    fn chain_after(&mut self, ctx: &mut EngineContext, kind: EffectKind) {
        let pose = self.latest_pose.as_ref();
        let (next, outcome) = match kind {
            EffectKind::EnergySphere => (
                EffectKind::NarrativeBlackout,
                self.effects.blackout.start(ctx, pose),
            ),
            EffectKind::IntroNarration => (EffectKind::HairAura, self.effects.hair.start(ctx, pose)),
            _ => return,
        };
        match outcome {
            StartOutcome::Skipped(reason) => log::warn!("{} skipped: {:?}", next.name(), reason),
            _ => log::debug!("{} follows {}", next.name(), kind.name()),
        }
    }

    fn await_completion(&mut self, kind: EffectKind, label: PoseLabel, on_complete: Option<CompletionCallback>) {
        if let Some(callback) = on_complete {
            self.pending.push(PendingCompletion {
                kind,
                label,
                callback,
            });
        }
    }

    fn fire_completions(&mut self, kind: EffectKind) {
        let (due, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.kind == kind);
        self.pending = keep;
        for p in due {
            (p.callback)(p.label);
        }
    }

    /// Deliver the descending figure's vector art, or its load failure.
    pub fn vector_asset_loaded(&mut self, ctx: &mut EngineContext, asset: Result<VectorAsset, AssetError>) {
        self.effects.descending_figure.provide_asset(ctx, asset);
    }

    /// Hard-stop every effect. Outstanding callbacks fire now.
    pub fn stop_all(&mut self, ctx: &mut EngineContext) {
        for kind in EffectKind::ALL {
            self.effects.get_mut(kind).stop(ctx);
        }
        for p in std::mem::take(&mut self.pending) {
            (p.callback)(p.label);
        }
        self.gate.reset(&mut ctx.commentary);
    }

    /// Events processed since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending_callbacks(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::landmark::{index, Landmark};
    use crate::effects::test_support::{centered_pose, pose_with};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Orchestrator, EngineContext) {
        let config = EngineConfig::default();
        (Orchestrator::new(&config).unwrap(), EngineContext::new(&config))
    }

    fn recorder() -> (Rc<RefCell<Vec<PoseLabel>>>, CompletionCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, Box::new(move |label| sink.borrow_mut().push(label)))
    }

    fn run(orch: &mut Orchestrator, ctx: &mut EngineContext, from_ms: f64, to_ms: f64, step_ms: f64) {
        let mut now = from_ms;
        while now <= to_ms {
            orch.animate(ctx, now);
            now += step_ms;
        }
    }

    fn sphere_pose() -> PoseSnapshot {
        pose_with(&[(
            index::MIDDLE_FINGER_MCP,
            Landmark::new(0.6, 0.5, 0.0, 1.0),
        )])
    }

    #[test]
    fn callback_fires_once_after_completion() {
        let (mut orch, mut ctx) = setup();
        let (log, cb) = recorder();
        let outcome = orch.show_effect(&mut ctx, Some(PoseLabel::Teleport), None, Some(cb));
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                primary: EffectKind::Teleport,
                queued: false
            }
        );
        assert!(log.borrow().is_empty());

        run(&mut orch, &mut ctx, 0.0, 1_000.0, 16.0);
        assert!(log.borrow().is_empty());
        assert!(orch.is_effect_in_progress());

        run(&mut orch, &mut ctx, 1_016.0, 3_000.0, 16.0);
        assert_eq!(*log.borrow(), vec![PoseLabel::Teleport]);
        assert!(!orch.is_effect_in_progress());
        assert_eq!(orch.pending_callbacks(), 0);
        assert_eq!(
            orch.drain_events(),
            vec![EffectEvent::Completed(EffectKind::Teleport)]
        );
    }

    #[test]
    fn blocking_request_rejected_while_busy() {
        let (mut orch, mut ctx) = setup();
        orch.show_effect(&mut ctx, Some(PoseLabel::Teleport), None, None);
        let (log, cb) = recorder();
        let outcome = orch.show_effect(&mut ctx, Some(PoseLabel::BeamPose), Some(&centered_pose()), Some(cb));
        assert_eq!(
            outcome,
            DispatchOutcome::Rejected {
                busy: EffectKind::Teleport
            }
        );
        assert!(!orch.effects().beam.is_running());
        orch.stop_all(&mut ctx);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unmapped_labels_are_ignored() {
        let (mut orch, mut ctx) = setup();
        assert_eq!(orch.show_effect(&mut ctx, None, None, None), DispatchOutcome::Ignored);
        assert_eq!(
            orch.show_effect(&mut ctx, Some(PoseLabel::Walk), None, None),
            DispatchOutcome::Ignored
        );
        assert_eq!(
            orch.show_effect(&mut ctx, Some(PoseLabel::BeamRelease), None, None),
            DispatchOutcome::Ignored
        );
        assert!(ctx.scene.is_empty());
    }

    #[test]
    fn skipped_start_drops_callback() {
        let (mut orch, mut ctx) = setup();
        let (log, cb) = recorder();
        let empty = PoseSnapshot::new(vec![]);
        let outcome = orch.show_effect(&mut ctx, Some(PoseLabel::ChargedSphere), Some(&empty), Some(cb));
        assert_eq!(
            outcome,
            DispatchOutcome::Skipped(SkipReason::MissingLandmark(index::MIDDLE_FINGER_MCP))
        );
        assert_eq!(orch.pending_callbacks(), 0);
        orch.stop_all(&mut ctx);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn sphere_queues_figure_until_asset_arrives() {
        let (mut orch, mut ctx) = setup();
        let outcome = orch.show_effect(&mut ctx, Some(PoseLabel::ChargedSphere), Some(&sphere_pose()), None);
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                primary: EffectKind::EnergySphere,
                queued: true
            }
        );
        assert!(orch.effects().descending_figure.node().is_none());
        orch.vector_asset_loaded(&mut ctx, Err(AssetError::LoadFailed("offline".into())));
        assert!(!orch.effects().descending_figure.is_running());
        assert!(orch.effects().energy_sphere.is_running());
    }

    #[cfg(feature = "vectors")]
    #[test]
    fn queued_figure_starts_on_asset() {
        let (mut orch, mut ctx) = setup();
        orch.show_effect(&mut ctx, Some(PoseLabel::ChargedSphere), Some(&sphere_pose()), None);
        let art = VectorAsset::from_json(
            r##"{ "paths": [{ "fill": "#f4a6c8", "subpaths": [[[0, 0], [10, 0], [10, 20]]] }] }"##,
        );
        orch.vector_asset_loaded(&mut ctx, art);
        assert!(orch.effects().descending_figure.node().is_some());
    }

    #[test]
    fn sphere_chains_into_blackout_and_ring() {
        let (mut orch, mut ctx) = setup();
        let (log, cb) = recorder();
        orch.show_effect(&mut ctx, Some(PoseLabel::ChargedSphereLeft), Some(&sphere_pose()), Some(cb));

        run(&mut orch, &mut ctx, 0.0, 30_000.0, 100.0);
        assert_eq!(*log.borrow(), vec![PoseLabel::ChargedSphereLeft]);
        assert!(orch.effects().blackout.is_running());
        assert!(orch.is_effect_in_progress());

        run(&mut orch, &mut ctx, 30_100.0, 90_000.0, 100.0);
        assert!(!orch.is_effect_in_progress());
        assert!(orch.effects().ring.is_running());
        let events = orch.drain_events();
        assert_eq!(
            events,
            vec![
                EffectEvent::Completed(EffectKind::EnergySphere),
                EffectEvent::DarkWindow,
                EffectEvent::LightRestored,
                EffectEvent::Completed(EffectKind::NarrativeBlackout),
            ]
        );
        assert_eq!(log.borrow().len(), 1);

        orch.stop_all(&mut ctx);
        assert!(ctx.scene.is_empty());
        assert_eq!(ctx.scene.resources().live_count(), 0);
    }

    #[test]
    fn power_up_runs_intro_then_hair() {
        let (mut orch, mut ctx) = setup();
        let outcome = orch.show_effect(&mut ctx, Some(PoseLabel::PowerUp), Some(&centered_pose()), None);
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                primary: EffectKind::IntroNarration,
                queued: false
            }
        );
        assert!(orch.effects().body_aura.is_running());
        assert!(!orch.effects().hair.is_running());

        run(&mut orch, &mut ctx, 0.0, 6_500.0, 50.0);
        assert!(orch.effects().hair.is_running());
        assert!(!orch.is_effect_in_progress());
        assert_eq!(ctx.commentary.message(), "It's a Super Saiyan!!!!!");
    }

    #[test]
    fn beam_release_skips_chant() {
        let (mut orch, mut ctx) = setup();
        orch.show_effect(&mut ctx, Some(PoseLabel::BeamPose), Some(&centered_pose()), None);
        run(&mut orch, &mut ctx, 0.0, 500.0, 16.0);
        assert!(orch.effects().beam.is_charging());
        let outcome = orch.show_effect(&mut ctx, Some(PoseLabel::BeamRelease), None, None);
        assert!(matches!(outcome, DispatchOutcome::Dispatched { primary: EffectKind::Beam, .. }));
        assert!(!orch.effects().beam.is_charging());
        assert_eq!(ctx.commentary.message(), "HAAAAA!!!");
    }

    #[test]
    fn beam_release_callback_fires_on_completion() {
        let (mut orch, mut ctx) = setup();
        orch.show_effect(&mut ctx, Some(PoseLabel::BeamPose), Some(&centered_pose()), None);
        run(&mut orch, &mut ctx, 0.0, 500.0, 16.0);
        let (log, cb) = recorder();
        orch.show_effect(&mut ctx, Some(PoseLabel::BeamRelease), None, Some(cb));
        assert_eq!(orch.pending_callbacks(), 1);

        run(&mut orch, &mut ctx, 516.0, 10_000.0, 16.0);
        assert!(!orch.effects().beam.is_running());
        assert_eq!(*log.borrow(), vec![PoseLabel::BeamRelease]);
        orch.stop_all(&mut ctx);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn ignored_beam_release_drops_callback() {
        let (mut orch, mut ctx) = setup();
        let (log, cb) = recorder();
        assert_eq!(
            orch.show_effect(&mut ctx, Some(PoseLabel::BeamRelease), None, Some(cb)),
            DispatchOutcome::Ignored
        );
        assert_eq!(orch.pending_callbacks(), 0);
        orch.stop_all(&mut ctx);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn stop_all_fires_outstanding_callbacks() {
        let (mut orch, mut ctx) = setup();
        let (log, cb) = recorder();
        orch.show_effect(&mut ctx, Some(PoseLabel::Teleport), None, Some(cb));
        orch.stop_all(&mut ctx);
        orch.stop_all(&mut ctx);
        assert_eq!(*log.borrow(), vec![PoseLabel::Teleport]);
        assert!(ctx.scene.is_empty());
        assert_eq!(ctx.scene.resources().live_count(), 0);
    }

    #[test]
    fn gate_dispatches_on_third_detection() {
        let (mut orch, mut ctx) = setup();
        let label = Some(PoseLabel::Teleport);
        assert_eq!(orch.observe_label(&mut ctx, label, None, None), DispatchOutcome::Ignored);
        assert_eq!(orch.observe_label(&mut ctx, label, None, None), DispatchOutcome::Ignored);
        assert!(matches!(
            orch.observe_label(&mut ctx, label, None, None),
            DispatchOutcome::Dispatched { primary: EffectKind::Teleport, .. }
        ));
        // Detections are ignored while the teleport runs.
        assert_eq!(orch.observe_label(&mut ctx, label, None, None), DispatchOutcome::Ignored);
        assert_eq!(orch.gate().count(), 0);
    }

    #[test]
    fn invalid_stage_table_names_effect() {
        let mut config = EngineConfig::default();
        config.intro.stages.clear();
        match Orchestrator::new(&config) {
            Err(ConfigError::Stage { effect, source }) => {
                assert_eq!(effect, EffectKind::IntroNarration.name());
                assert_eq!(source, StageError::Empty);
            }
            _ => panic!("expected a stage error"),
        }
    }
}
