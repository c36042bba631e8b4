use bytemuck::{Pod, Zeroable};

/// Primitive kind of a `RenderInstance`, stored as a float on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Primitive {
    Sphere = 0,
    Plane = 1,
    Sprite = 2,
}

/// Per-instance render data written to the host's shared buffer.
/// 20 floats = 80 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Rotation about the view axis, in radians.
    pub rotation: f32,
    /// `Primitive` discriminant.
    pub primitive: f32,
    /// Unscaled geometry extent.
    pub width: f32,
    pub height: f32,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub alpha: f32,
    /// Texture id; 0 is the placeholder, -1 means untextured.
    pub texture: f32,
    pub uv_x: f32,
    pub uv_y: f32,
    /// 1.0 when the texture repeats.
    pub repeat: f32,
    pub _pad: f32,
}

impl RenderInstance {
    pub const FLOATS: usize = 20;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Per-vertex data for tessellated shapes.
/// 6 floats = 24 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VectorVertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl VectorVertex {
    pub const FLOATS: usize = 6;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Everything the host draws this frame.
pub struct RenderBuffer {
    /// Instances ordered by blend mode: alpha-blended first, then additive
    /// from `additive_split` on.
    pub instances: Vec<RenderInstance>,
    pub additive_split: u32,
    /// Triangle list for vector shapes, already in scene space.
    pub vectors: Vec<VectorVertex>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            additive_split: 0,
            vectors: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.additive_split = 0;
        self.vectors.clear();
    }

    pub fn push(&mut self, instance: RenderInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn vector_vertex_count(&self) -> u32 {
        self.vectors.len() as u32
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    pub fn vectors_ptr(&self) -> *const f32 {
        self.vectors.as_ptr() as *const f32
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_instance_is_20_floats() {
        assert_eq!(std::mem::size_of::<RenderInstance>(), RenderInstance::STRIDE_BYTES);
        assert_eq!(std::mem::size_of::<VectorVertex>(), 24);
    }

    #[test]
    fn clear_resets_everything() {
        let mut buf = RenderBuffer::new();
        buf.push(RenderInstance::default());
        buf.vectors.push(VectorVertex::default());
        buf.additive_split = 1;
        buf.clear();
        assert_eq!(buf.instance_count(), 0);
        assert_eq!(buf.vector_vertex_count(), 0);
        assert_eq!(buf.additive_split, 0);
    }
}
