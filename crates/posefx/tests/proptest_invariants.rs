//! Property-based invariant tests for the effects engine.
//!
//! Verifies:
//! 1. On-frame landmarks map inside the render surface
//! 2. Stage cursors only move forward and report each stage once
//! 3. The spark pool keeps its size and bounds under any frame sequence
//! 4. Commentary pulses once per distinct message
//! 5. Every effect releases all GPU handles after a hard stop

use posefx::core::landmark::{Landmark, PoseSnapshot, RenderSize};
use posefx::systems::particles::{SparkConfig, SparkField};
use posefx::systems::stage::{Stage, StageCursor, StageTable};
use posefx::{Commentary, EngineConfig, EngineContext, Orchestrator, PoseLabel};
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_on_frame_landmark() -> impl Strategy<Value = Landmark> {
    (0.0f32..=1.0, 0.0f32..=1.0, -1.0f32..=1.0).prop_map(|(x, y, z)| Landmark::new(x, y, z, 1.0))
}

fn arb_stage_table() -> impl Strategy<Value = StageTable> {
    prop::collection::vec(1.0f64..5_000.0, 1..8).prop_map(|widths| {
        let mut start = 0.0;
        let mut stages: Vec<Stage> = widths
            .iter()
            .map(|w| {
                let stage = Stage::new(start, start + w);
                start += w;
                stage
            })
            .collect();
        stages.push(Stage::open(start).finishing());
        StageTable::new(stages).unwrap()
    })
}

fn arb_label() -> impl Strategy<Value = Option<PoseLabel>> {
    prop_oneof![
        Just(None),
        (0usize..PoseLabel::ALL.len()).prop_map(|i| Some(PoseLabel::ALL[i])),
    ]
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn on_frame_landmarks_stay_inside_surface(
        lm in arb_on_frame_landmark(),
        width in 100.0f32..4000.0,
        height in 100.0f32..4000.0,
    ) {
        let size = RenderSize::new(width, height);
        let p = size.to_scene(&lm);
        prop_assert!(p.x.abs() <= size.half_width() + 1e-2);
        prop_assert!(p.y.abs() <= size.half_height() + 1e-2);
        prop_assert_eq!(p.z, lm.z);
    }

    #[test]
    fn stage_cursor_is_monotonic(
        table in arb_stage_table(),
        steps in prop::collection::vec(0.0f64..3_000.0, 1..40),
    ) {
        let mut cursor = StageCursor::new();
        let mut elapsed = 0.0;
        let mut seen = Vec::new();
        for step in steps {
            elapsed += step;
            let before = cursor.current();
            seen.extend(cursor.advance(&table, elapsed));
            prop_assert!(cursor.current() >= before);
        }
        let expected: Vec<usize> = (0..seen.len()).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn spark_pool_is_conserved(
        seed in any::<u64>(),
        count in 1usize..400,
        dts in prop::collection::vec(0.0f32..0.25, 1..60),
    ) {
        let config = SparkConfig { count, ..Default::default() };
        let max_opacity = config.max_opacity;
        let max_travel = config.max_travel;
        let mut ctx = EngineContext::default();
        let mut field = SparkField::new(config, seed);
        field.attach(&mut ctx.scene, Default::default());
        for dt in dts {
            field.tick(dt);
            field.sync(&mut ctx.scene);
            prop_assert_eq!(field.len(), count);
            for spark in field.sparks() {
                prop_assert!(spark.opacity > 0.0 && spark.opacity <= max_opacity);
                prop_assert!(spark.travelled >= 0.0 && spark.travelled <= max_travel);
            }
        }
        let node = ctx.scene.get(field.node().unwrap()).unwrap();
        prop_assert_eq!(node.instances().map(|i| i.len()), Some(count));
        field.detach(&mut ctx.scene);
        prop_assert_eq!(ctx.scene.resources().live_count(), 0);
    }

    #[test]
    fn commentary_pulses_once_per_distinct_message(
        messages in prop::collection::vec("[ab]{0,2}", 1..30),
    ) {
        let mut commentary = Commentary::new();
        let mut expected = 0u64;
        let mut last = String::new();
        for m in &messages {
            if *m != last {
                expected += 1;
                last = m.clone();
            }
            commentary.update_message(m);
        }
        prop_assert_eq!(commentary.generation(), expected);
        prop_assert_eq!(commentary.message(), last.as_str());
    }

    #[test]
    fn stop_all_leaves_no_live_handles(
        labels in prop::collection::vec(arb_label(), 1..12),
        frames in 0usize..200,
    ) {
        let config = EngineConfig::default();
        let mut ctx = EngineContext::new(&config);
        let mut orch = Orchestrator::new(&config).unwrap();
        let pose = PoseSnapshot::new(vec![Landmark::new(0.5, 0.5, 0.0, 1.0); 33]);
        let mut now = 0.0;
        for label in labels {
            orch.show_effect(&mut ctx, label, Some(&pose), None);
            for _ in 0..frames / 4 {
                orch.animate(&mut ctx, now);
                now += 16.0;
            }
        }
        orch.stop_all(&mut ctx);
        prop_assert!(!orch.is_effect_in_progress());
        prop_assert!(ctx.scene.is_empty());
        prop_assert_eq!(ctx.scene.resources().live_count(), 0);
    }
}
