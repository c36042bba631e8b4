use crate::api::types::NodeId;
use crate::components::node::Node;
use crate::core::resources::GpuResources;

/// Top-level node storage using a flat Vec, plus the GPU handle registry
/// every mesh in it was allocated from.
/// Designed for small node counts (tens, not thousands).
pub struct Scene {
    nodes: Vec<(NodeId, Node)>,
    next_id: u32,
    resources: GpuResources,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(32),
            next_id: 1,
            resources: GpuResources::new(),
        }
    }

    /// Add a node to the scene and return its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push((id, node));
        id
    }

    /// Detach a node without releasing its resources.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.nodes.iter().position(|(nid, _)| *nid == id)?;
        Some(self.nodes.remove(idx).1)
    }

    /// Detach a node and dispose it together with all of its descendants.
    /// Returns false if the node was not in the scene.
    pub fn discard(&mut self, id: NodeId) -> bool {
        match self.remove(id) {
            Some(node) => {
                log::trace!("discard {:?} '{}'", id, node.tag);
                node.dispose(&mut self.resources);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|(nid, _)| *nid == id).map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|(nid, _)| *nid == id)
            .map(|(_, n)| n)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over top-level nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut GpuResources {
        &mut self.resources
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
