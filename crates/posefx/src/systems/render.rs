use glam::{Affine3A, EulerRot, Quat, Vec2};

use crate::components::geometry::Geometry;
use crate::components::material::{BlendMode, Material, WrapMode};
use crate::components::node::{Mesh, Node, NodeContent};
use crate::core::scene::Scene;
use crate::renderer::instance::{Primitive, RenderBuffer, RenderInstance, VectorVertex};

fn local_transform(node: &Node) -> Affine3A {
    let rotation = Quat::from_euler(EulerRot::XYZ, node.rotation.x, node.rotation.y, node.rotation.z);
    Affine3A::from_scale_rotation_translation(node.scale, rotation, node.position)
}

fn instance_for(world: &Affine3A, mesh: &Mesh, opacity: f32) -> Option<RenderInstance> {
    let (primitive, anchor) = match &mesh.geometry {
        Geometry::Sphere { .. } => (Primitive::Sphere, Vec2::splat(0.5)),
        Geometry::Plane { .. } => (Primitive::Plane, Vec2::splat(0.5)),
        Geometry::Sprite { anchor } => (Primitive::Sprite, anchor.0),
        Geometry::Shape { .. } => return None,
    };
    let (scale, rotation, translation) = world.to_scale_rotation_translation();
    let (_, _, rotation_z) = rotation.to_euler(EulerRot::XYZ);
    let size = mesh.geometry.size();
    let material: &Material = &mesh.material;
    Some(RenderInstance {
        x: translation.x,
        y: translation.y,
        z: translation.z,
        scale_x: scale.x,
        scale_y: scale.y,
        rotation: rotation_z,
        primitive: primitive as u8 as f32,
        width: size.x,
        height: size.y,
        anchor_x: anchor.x,
        anchor_y: anchor.y,
        r: material.color.r,
        g: material.color.g,
        b: material.color.b,
        alpha: material.opacity * opacity,
        texture: material.texture.map_or(-1.0, |t| t.0 as f32),
        uv_x: material.uv_offset.x,
        uv_y: material.uv_offset.y,
        repeat: if material.wrap == WrapMode::Repeat { 1.0 } else { 0.0 },
        _pad: 0.0,
    })
}

struct Collector<'a> {
    alpha: Vec<RenderInstance>,
    additive: Vec<RenderInstance>,
    vectors: &'a mut Vec<VectorVertex>,
}

impl Collector<'_> {
    fn push(&mut self, blend: BlendMode, instance: RenderInstance) {
        match blend {
            BlendMode::Alpha => self.alpha.push(instance),
            BlendMode::Additive => self.additive.push(instance),
        }
    }

    fn visit(&mut self, node: &Node, parent: &Affine3A) {
        if !node.visible {
            return;
        }
        let world = *parent * local_transform(node);
        match &node.content {
            NodeContent::Empty => {}
            NodeContent::Mesh(mesh) => {
                if let Geometry::Shape { triangles } = &mesh.geometry {
                    let c = mesh.material.color;
                    let a = mesh.material.opacity;
                    self.vectors.extend(triangles.iter().map(|p| {
                        let w = world.transform_point3(p.extend(0.0));
                        VectorVertex { x: w.x, y: w.y, r: c.r, g: c.g, b: c.b, a }
                    }));
                } else if let Some(inst) = instance_for(&world, mesh, 1.0) {
                    self.push(mesh.material.blend, inst);
                }
            }
            NodeContent::Instanced { mesh, instances } => {
                for t in instances {
                    let local = Affine3A::from_rotation_translation(
                        Quat::from_rotation_z(t.rotation_z),
                        t.offset,
                    );
                    if let Some(inst) = instance_for(&(world * local), mesh, t.opacity) {
                        self.push(mesh.material.blend, inst);
                    }
                }
            }
        }
        for child in &node.children {
            self.visit(child, &world);
        }
    }
}

/// Flatten the scene graph into the render buffer.
/// Alpha-blended instances come first, additive ones after `additive_split`.
pub fn build_render_buffer(scene: &Scene, buffer: &mut RenderBuffer) {
    buffer.clear();
    let mut collector = Collector {
        alpha: Vec::new(),
        additive: Vec::new(),
        vectors: &mut buffer.vectors,
    };
    for (_, node) in scene.iter() {
        collector.visit(node, &Affine3A::IDENTITY);
    }
    let Collector { alpha, additive, .. } = collector;
    buffer.additive_split = alpha.len() as u32;
    buffer.instances.extend(alpha);
    buffer.instances.extend(additive);
}
