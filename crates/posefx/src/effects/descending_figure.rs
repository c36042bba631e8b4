//! A vector-art figure that slides down from below the frame edge and
//! settles level with the hand. The art arrives asynchronously; starts
//! requested before then are queued.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{discard_node, RunClock};
use crate::api::context::EngineContext;
use crate::api::effect::{Effect, SkipReason, StartOutcome};
use crate::api::types::{EffectKind, NodeId};
use crate::assets::error::AssetError;
use crate::assets::vector::{TessellatedShape, VectorAsset};
use crate::components::geometry::bounds;
use crate::core::landmark::{index, PoseSnapshot};
use crate::extensions::easing::{lerp, Easing};
use crate::systems::factory::make_shape_group;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DescendingFigureConfig {
    pub target_landmark: usize,
    pub scale: f32,
    /// Gap between the left surface edge and the figure's origin.
    pub margin_x: f32,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Default for DescendingFigureConfig {
    fn default() -> Self {
        Self {
            target_landmark: index::MIDDLE_FINGER_MCP,
            scale: 0.7,
            margin_x: 50.0,
            duration_ms: 10_000.0,
            easing: Easing::Linear,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    Pending,
    Ready { shapes: Vec<TessellatedShape>, size: Vec2 },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FigurePhase {
    Idle,
    /// Waiting on the asset; holds the scene-space target.
    Queued { target: Vec3 },
    Descending { from_y: f32, to_y: f32 },
    /// Arrived; the figure stays on screen until stopped.
    Resting,
}

pub struct DescendingFigureEffect {
    config: DescendingFigureConfig,
    asset: AssetState,
    phase: FigurePhase,
    clock: RunClock,
    node: Option<NodeId>,
}

impl DescendingFigureEffect {
    pub fn new(config: DescendingFigureConfig) -> Self {
        Self {
            config,
            asset: AssetState::Pending,
            phase: FigurePhase::Idle,
            clock: RunClock::default(),
            node: None,
        }
    }

    pub fn phase(&self) -> FigurePhase {
        self.phase
    }

    pub fn asset(&self) -> &AssetState {
        &self.asset
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Deliver the vector art (or its load failure). A queued start proceeds.
    pub fn provide_asset(&mut self, ctx: &mut EngineContext, asset: Result<VectorAsset, AssetError>) {
        self.asset = match asset.and_then(|a| a.tessellate()) {
            Ok(shapes) => {
                let points: Vec<Vec2> = shapes.iter().flat_map(|s| s.triangles.iter().copied()).collect();
                let size = bounds(&points).map_or(Vec2::ZERO, |(min, max)| max - min);
                log::debug!("figure asset ready: {} shapes, {:?}", shapes.len(), size);
                AssetState::Ready { shapes, size }
            }
            Err(e) => {
                log::warn!("figure asset unavailable: {}", e);
                AssetState::Failed
            }
        };
        if let FigurePhase::Queued { target } = self.phase {
            if matches!(self.asset, AssetState::Ready { .. }) {
                self.begin(ctx, target);
            } else {
                self.phase = FigurePhase::Idle;
            }
        }
    }

    fn begin(&mut self, ctx: &mut EngineContext, target: Vec3) {
        let AssetState::Ready { shapes, size } = &self.asset else {
            return;
        };
        discard_node(ctx, &mut self.node);
        let half = size.y * self.config.scale / 2.0;
        let from_y = -ctx.surface.half_height() - half;
        let to_y = target.y + half;
        let x = -(ctx.surface.half_width() - self.config.margin_x);
        let group = make_shape_group(ctx.scene.resources_mut(), shapes)
            .with_tag("descending-figure")
            .with_position(Vec3::new(x, from_y, target.z))
            .with_rotation(Vec3::new(PI, 0.0, 0.0))
            .with_scale(Vec3::new(self.config.scale, self.config.scale, 1.0));
        self.node = Some(ctx.scene.add(group));
        self.clock.reset();
        self.phase = FigurePhase::Descending { from_y, to_y };
        log::info!("figure descending to y={:.1}", to_y);
    }
}

impl Effect for DescendingFigureEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::DescendingFigure
    }

    fn start(&mut self, ctx: &mut EngineContext, pose: Option<&PoseSnapshot>) -> StartOutcome {
        if self.is_running() {
            return StartOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        let Some(pose) = pose else {
            return StartOutcome::Skipped(SkipReason::NoPose);
        };
        let target = match ctx.landmark(pose, self.config.target_landmark) {
            Ok(p) => p,
            Err(reason) => return StartOutcome::Skipped(reason),
        };
        match self.asset {
            AssetState::Pending => {
                log::debug!("figure queued until its asset arrives");
                self.phase = FigurePhase::Queued { target };
                StartOutcome::Queued
            }
            AssetState::Failed => StartOutcome::Skipped(SkipReason::AssetUnavailable),
            AssetState::Ready { .. } => {
                self.begin(ctx, target);
                StartOutcome::Started
            }
        }
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        discard_node(ctx, &mut self.node);
        self.phase = FigurePhase::Idle;
    }

    fn animate(&mut self, ctx: &mut EngineContext) {
        let FigurePhase::Descending { from_y, to_y } = self.phase else {
            return;
        };
        let elapsed = self.clock.elapsed(ctx.frame.now_ms);
        let progress = if self.config.duration_ms > 0.0 {
            (elapsed / self.config.duration_ms).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        let y = lerp(from_y, to_y, self.config.easing.apply(progress));
        if let Some(node) = self.node.and_then(|id| ctx.scene.get_mut(id)) {
            node.position.y = y;
        }
        if progress >= 1.0 {
            log::debug!("figure arrived");
            self.phase = FigurePhase::Resting;
        }
    }

    fn is_running(&self) -> bool {
        matches!(
            self.phase,
            FigurePhase::Queued { .. } | FigurePhase::Descending { .. }
        )
    }
}

#[cfg(all(test, feature = "vectors"))]
mod tests {
    use super::*;
    use crate::effects::test_support::{centered_pose, run_frames};

    const FIGURE: &str = r##"{ "paths": [
        { "fill": "#f4a6c8", "subpaths": [[[0, 0], [100, 0], [100, 200], [0, 200]]] },
        { "fill": "#222222", "subpaths": [[[20, 20], [40, 20], [30, 40]]] },
        { "fill": "#ffffff", "subpaths": [[[60, 20], [80, 20], [70, 40]]] }
    ] }"##;

    fn asset() -> Result<VectorAsset, AssetError> {
        VectorAsset::from_json(FIGURE)
    }

    fn node_y(ctx: &EngineContext, fx: &DescendingFigureEffect) -> f32 {
        fx.node().and_then(|id| ctx.scene.get(id)).map(|n| n.position.y).unwrap()
    }

    #[test]
    fn queued_start_proceeds_when_asset_arrives() {
        let mut ctx = EngineContext::default();
        let mut fx = DescendingFigureEffect::new(DescendingFigureConfig::default());
        assert_eq!(fx.start(&mut ctx, Some(&centered_pose())), StartOutcome::Queued);
        assert!(fx.is_running());
        assert!(ctx.scene.is_empty());

        fx.provide_asset(&mut ctx, asset());
        assert!(matches!(fx.phase(), FigurePhase::Descending { .. }));
        assert_eq!(ctx.scene.len(), 1);
    }

    #[test]
    fn descends_from_below_to_target() {
        let mut ctx = EngineContext::default();
        let mut fx = DescendingFigureEffect::new(DescendingFigureConfig::default());
        fx.provide_asset(&mut ctx, asset());
        assert_eq!(fx.start(&mut ctx, Some(&centered_pose())), StartOutcome::Started);

        // 200 tall at 0.7 scale: half height 70.
        assert!((node_y(&ctx, &fx) - (-300.0 - 70.0)).abs() < 1e-3);
        let node = ctx.scene.get(fx.node().unwrap()).unwrap();
        assert_eq!(node.position.x, -600.0);
        assert_eq!(node.rotation.x, PI);

        run_frames(&mut fx, &mut ctx, 0.0, 5_000.0, 16.0);
        assert!((node_y(&ctx, &fx) - (-370.0 + 440.0 * 0.5)).abs() < 1.0);

        run_frames(&mut fx, &mut ctx, 5_000.0, 12_000.0, 16.0);
        assert_eq!(fx.phase(), FigurePhase::Resting);
        assert!(!fx.is_running());
        assert!((node_y(&ctx, &fx) - 70.0).abs() < 1e-3);
    }

    #[test]
    fn failed_asset_skips_and_dequeues() {
        let mut ctx = EngineContext::default();
        let mut fx = DescendingFigureEffect::new(DescendingFigureConfig::default());
        fx.start(&mut ctx, Some(&centered_pose()));
        fx.provide_asset(&mut ctx, Err(AssetError::LoadFailed("404".into())));
        assert_eq!(fx.phase(), FigurePhase::Idle);
        assert_eq!(
            fx.start(&mut ctx, Some(&centered_pose())),
            StartOutcome::Skipped(SkipReason::AssetUnavailable)
        );
    }

    #[test]
    fn stop_disposes_every_child_once() {
        let mut ctx = EngineContext::default();
        let mut fx = DescendingFigureEffect::new(DescendingFigureConfig::default());
        fx.provide_asset(&mut ctx, asset());
        fx.start(&mut ctx, Some(&centered_pose()));
        assert_eq!(ctx.scene.resources().live_count(), 6);
        fx.stop(&mut ctx);
        fx.stop(&mut ctx);
        assert_eq!(ctx.scene.resources().live_count(), 0);
        assert_eq!(ctx.scene.resources().released_count(), 6);
        assert!(ctx.scene.is_empty());
    }

    #[test]
    fn restart_after_rest_replaces_group() {
        let mut ctx = EngineContext::default();
        let mut fx = DescendingFigureEffect::new(DescendingFigureConfig::default());
        fx.provide_asset(&mut ctx, asset());
        fx.start(&mut ctx, Some(&centered_pose()));
        run_frames(&mut fx, &mut ctx, 0.0, 11_000.0, 100.0);
        assert_eq!(fx.phase(), FigurePhase::Resting);
        fx.start(&mut ctx, Some(&centered_pose()));
        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.scene.resources().live_count(), 6);
    }
}
