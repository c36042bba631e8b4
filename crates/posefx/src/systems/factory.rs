//! Builders for the meshes effects add to the scene. Every mesh allocates
//! its GPU handles from the registry passed in.

use crate::assets::vector::TessellatedShape;
use crate::components::geometry::{Anchor, Geometry};
use crate::components::material::{Material, TextureId, WrapMode};
use crate::components::node::{InstanceTransform, Mesh, Node};
use crate::core::resources::GpuResources;

/// Textured sphere. The texture repeats so its offset can scroll.
pub fn make_sphere(
    resources: &mut GpuResources,
    texture: TextureId,
    radius: f32,
    width_segments: u32,
    height_segments: u32,
) -> Node {
    let geometry = Geometry::sphere(radius, width_segments, height_segments);
    let material = Material::textured(texture).with_wrap(WrapMode::Repeat);
    Node::with_mesh(Mesh::new(resources, geometry, material))
}

pub fn make_plane(resources: &mut GpuResources, width: f32, height: f32, material: Material) -> Node {
    Node::with_mesh(Mesh::new(resources, Geometry::plane(width, height), material))
}

/// Camera-facing unit quad. Scale sets its on-screen size.
pub fn make_sprite(resources: &mut GpuResources, texture: TextureId, anchor: Anchor) -> Node {
    Node::with_mesh(Mesh::new(
        resources,
        Geometry::sprite(anchor),
        Material::textured(texture),
    ))
}

/// Group with one solid-color child mesh per tessellated shape.
pub fn make_shape_group(resources: &mut GpuResources, shapes: &[TessellatedShape]) -> Node {
    shapes.iter().fold(Node::group(), |group, shape| {
        let mesh = Mesh::new(
            resources,
            Geometry::Shape {
                triangles: shape.triangles.clone(),
            },
            Material::solid(shape.color),
        );
        group.with_child(Node::with_mesh(mesh))
    })
}

/// Single mesh drawn `count` times.
pub fn make_instanced(
    resources: &mut GpuResources,
    geometry: Geometry,
    material: Material,
    count: usize,
) -> Node {
    let mesh = Mesh::new(resources, geometry, material);
    Node::instanced(mesh, vec![InstanceTransform::default(); count])
}
