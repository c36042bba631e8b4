use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::rng::Rng;
use crate::api::types::NodeId;
use crate::components::geometry::Geometry;
use crate::components::material::{BlendMode, Material, TextureId};
use crate::core::scene::Scene;
use crate::systems::factory::make_instanced;

/// Y coordinate instances are parked at while the field is inactive.
pub const PARKED_Y: f32 = -10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkConfig {
    /// Pool size, fixed for the field's lifetime (default: 300).
    pub count: usize,
    pub max_opacity: f32,
    pub decay_per_sec: f32,
    /// Outward speed range in units per second.
    pub speed_min: f32,
    pub speed_max: f32,
    /// Distance from the pivot at which a spark respawns.
    pub max_travel: f32,
    /// Streak plane size.
    pub width: f32,
    pub length: f32,
    pub texture: String,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            count: 300,
            max_opacity: 0.5,
            decay_per_sec: 0.6,
            speed_min: 6.0,
            speed_max: 18.0,
            max_travel: 100.0,
            width: 2.0,
            length: 50.0,
            texture: "spark".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
    /// Unit direction away from the pivot.
    pub direction: Vec2,
    pub speed: f32,
    pub opacity: f32,
    pub travelled: f32,
    /// Random in [0, 1); staggers respawns.
    pub phase: f32,
}

/// A fixed pool of sparks streaking away from a movable pivot.
pub struct SparkField {
    config: SparkConfig,
    sparks: Vec<Spark>,
    pivot: Vec3,
    node: Option<NodeId>,
    active: bool,
    rng: Rng,
}

impl SparkField {
    pub fn new(config: SparkConfig, seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let count = config.count;
        let sparks = (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count.max(1) as f32;
                let phase = rng.next_f32();
                Spark {
                    direction: Vec2::from_angle(angle),
                    speed: rng.range(config.speed_min, config.speed_max),
                    opacity: config.max_opacity * (1.0 - phase),
                    travelled: config.max_travel * phase,
                    phase,
                }
            })
            .collect();
        Self {
            config,
            sparks,
            pivot: Vec3::ZERO,
            node: None,
            active: false,
            rng,
        }
    }

    /// Add the instanced node (if absent) and start emitting.
    pub fn attach(&mut self, scene: &mut Scene, texture: TextureId) {
        if self.node.is_none() {
            let material = Material::textured(texture)
                .with_opacity(self.config.max_opacity)
                .with_blend(BlendMode::Additive);
            let node = make_instanced(
                scene.resources_mut(),
                Geometry::plane(self.config.width, self.config.length),
                material,
                self.sparks.len(),
            )
            .with_tag("sparks");
            self.node = Some(scene.add(node));
        }
        self.active = true;
        self.sync(scene);
    }

    /// Stop emitting but keep the node, with every instance parked off-screen.
    pub fn park(&mut self, scene: &mut Scene) {
        self.active = false;
        self.sync(scene);
    }

    /// Remove and dispose the node. Safe to call repeatedly.
    pub fn detach(&mut self, scene: &mut Scene) {
        self.active = false;
        if let Some(id) = self.node.take() {
            scene.discard(id);
        }
    }

    /// Move the emission pivot. Spark phases are untouched.
    pub fn reposition(&mut self, x: f32, y: f32) {
        self.pivot.x = x;
        self.pivot.y = y;
    }

    /// Advance every spark by `dt` seconds, respawning expired ones.
    pub fn tick(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        let decay = self.config.decay_per_sec * dt;
        for spark in &mut self.sparks {
            spark.opacity -= decay;
            spark.travelled += spark.speed * dt;
            if spark.opacity <= 0.0 || spark.travelled > self.config.max_travel {
                spark.phase = self.rng.next_f32();
                spark.opacity = self.config.max_opacity;
                spark.travelled = self.config.max_travel * 0.2 * spark.phase;
            }
        }
    }

    /// Write spark state into the instanced node.
    pub fn sync(&self, scene: &mut Scene) {
        let Some(node) = self.node.and_then(|id| scene.get_mut(id)) else {
            return;
        };
        let Some(instances) = node.instances_mut() else {
            return;
        };
        for (inst, spark) in instances.iter_mut().zip(&self.sparks) {
            if self.active {
                let offset = spark.direction * spark.travelled;
                inst.offset = self.pivot + offset.extend(0.0);
                inst.rotation_z = spark.direction.to_angle() - FRAC_PI_2;
                inst.opacity = spark.opacity.clamp(0.0, self.config.max_opacity);
            } else {
                inst.offset = Vec3::new(0.0, PARKED_Y, 0.0);
                inst.opacity = 0.0;
            }
        }
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn len(&self) -> usize {
        self.sparks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sparks.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }
}
