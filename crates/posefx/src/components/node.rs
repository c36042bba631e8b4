use glam::Vec3;

use crate::components::geometry::Geometry;
use crate::components::material::Material;
use crate::core::resources::{GpuResources, ResourceHandle, ResourceKind};

/// Geometry + material pair, holding one GPU handle for each.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    geometry_handle: ResourceHandle,
    material_handle: ResourceHandle,
}

impl Mesh {
    pub fn new(resources: &mut GpuResources, geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            geometry_handle: resources.allocate(ResourceKind::Geometry),
            material_handle: resources.allocate(ResourceKind::Material),
        }
    }

    pub fn handles(&self) -> [ResourceHandle; 2] {
        [self.geometry_handle, self.material_handle]
    }

    /// Release both handles. Returns how many were actually live.
    pub fn dispose(self, resources: &mut GpuResources) -> usize {
        self.handles()
            .into_iter()
            .filter(|h| resources.release(*h))
            .count()
    }
}

/// Per-instance transform for instanced meshes, relative to the owning node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub offset: Vec3,
    pub rotation_z: f32,
    pub opacity: f32,
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            rotation_z: 0.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeContent {
    /// Transform-only group.
    Empty,
    Mesh(Mesh),
    /// One mesh drawn once per instance.
    Instanced {
        mesh: Mesh,
        instances: Vec<InstanceTransform>,
    },
}

/// A scene graph node. Children inherit the node's transform.
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub visible: bool,
    pub position: Vec3,
    /// Euler angles (XYZ order) in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub content: NodeContent,
    pub children: Vec<Node>,
}

impl Node {
    fn new(content: NodeContent) -> Self {
        Self {
            tag: String::new(),
            visible: true,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            content,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeContent::Empty)
    }

    pub fn with_mesh(mesh: Mesh) -> Self {
        Self::new(NodeContent::Mesh(mesh))
    }

    pub fn instanced(mesh: Mesh, instances: Vec<InstanceTransform>) -> Self {
        Self::new(NodeContent::Instanced { mesh, instances })
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.content {
            NodeContent::Mesh(mesh) | NodeContent::Instanced { mesh, .. } => Some(mesh),
            NodeContent::Empty => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.content {
            NodeContent::Mesh(mesh) | NodeContent::Instanced { mesh, .. } => Some(mesh),
            NodeContent::Empty => None,
        }
    }

    pub fn instances(&self) -> Option<&[InstanceTransform]> {
        match &self.content {
            NodeContent::Instanced { instances, .. } => Some(instances),
            _ => None,
        }
    }

    pub fn instances_mut(&mut self) -> Option<&mut Vec<InstanceTransform>> {
        match &mut self.content {
            NodeContent::Instanced { instances, .. } => Some(instances),
            _ => None,
        }
    }

    /// Number of meshes in this subtree.
    pub fn mesh_count(&self) -> usize {
        let own = usize::from(self.mesh().is_some());
        own + self.children.iter().map(Node::mesh_count).sum::<usize>()
    }

    /// Consume the subtree, releasing every mesh's handles exactly once.
    /// Returns the number of handles released.
    pub fn dispose(self, resources: &mut GpuResources) -> usize {
        let own = match self.content {
            NodeContent::Mesh(mesh) | NodeContent::Instanced { mesh, .. } => mesh.dispose(resources),
            NodeContent::Empty => 0,
        };
        own + self
            .children
            .into_iter()
            .map(|child| child.dispose(resources))
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::material::Material;

    fn leaf(resources: &mut GpuResources) -> Node {
        Node::with_mesh(Mesh::new(
            resources,
            Geometry::plane(1.0, 1.0),
            Material::default(),
        ))
    }

    #[test]
    fn dispose_walks_nested_children() {
        let mut res = GpuResources::new();
        let inner = Node::group().with_child(leaf(&mut res)).with_child(leaf(&mut res));
        let root = leaf(&mut res).with_child(inner).with_child(leaf(&mut res));
        assert_eq!(root.mesh_count(), 4);
        assert_eq!(res.live_count(), 8);
        assert_eq!(root.dispose(&mut res), 8);
        assert_eq!(res.live_count(), 0);
    }

    #[test]
    fn cloned_node_does_not_double_release() {
        let mut res = GpuResources::new();
        let node = leaf(&mut res);
        let copy = node.clone();
        assert_eq!(node.dispose(&mut res), 2);
        assert_eq!(copy.dispose(&mut res), 0);
    }

    #[test]
    fn instanced_accessors() {
        let mut res = GpuResources::new();
        let mesh = Mesh::new(&mut res, Geometry::plane(2.0, 50.0), Material::default());
        let mut node = Node::instanced(mesh, vec![InstanceTransform::default(); 3]);
        assert_eq!(node.instances().map(|i| i.len()), Some(3));
        node.instances_mut().unwrap()[0].opacity = 0.0;
        assert_eq!(node.instances().unwrap()[0].opacity, 0.0);
        assert!(node.mesh().is_some());
    }
}
