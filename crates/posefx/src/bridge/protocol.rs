//! Shared frame buffer layout read by the host renderer.
//!
//! Layout (all values in f32 / 4 bytes):
//! ```text
//! [Header: 12 floats]
//! [Instances: max_instances × 20 floats]
//! [Vectors: max_vector_vertices × 6 floats]
//! [Events: max_events × 4 floats]
//! ```
//!
//! Capacities are written into the header so the host can compute offsets.

use bytemuck::cast_slice;

use crate::api::config::EngineConfig;
use crate::api::types::{EffectEvent, WireEvent};
use crate::renderer::instance::{RenderBuffer, RenderInstance, VectorVertex};

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 12;

/// Header field indices.
pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_MAX_INSTANCES: usize = 2;
pub const HEADER_INSTANCE_COUNT: usize = 3;
pub const HEADER_ADDITIVE_SPLIT: usize = 4;
pub const HEADER_MAX_VECTOR_VERTICES: usize = 5;
pub const HEADER_VECTOR_VERTEX_COUNT: usize = 6;
pub const HEADER_MAX_EVENTS: usize = 7;
pub const HEADER_EVENT_COUNT: usize = 8;
pub const HEADER_SURFACE_WIDTH: usize = 9;
pub const HEADER_SURFACE_HEIGHT: usize = 10;
pub const HEADER_PROTOCOL_VERSION: usize = 11;

pub const PROTOCOL_VERSION: f32 = 1.0;

pub const INSTANCE_FLOATS: usize = RenderInstance::FLOATS;
pub const VECTOR_VERTEX_FLOATS: usize = VectorVertex::FLOATS;
pub const EVENT_FLOATS: usize = WireEvent::FLOATS;

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    pub max_instances: usize,
    pub max_vector_vertices: usize,
    pub max_events: usize,

    pub instance_data_offset: usize,
    pub vector_data_offset: usize,
    pub event_data_offset: usize,

    pub buffer_total_floats: usize,
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    pub fn new(max_instances: usize, max_vector_vertices: usize, max_events: usize) -> Self {
        let instance_data_offset = HEADER_FLOATS;
        let vector_data_offset = instance_data_offset + max_instances * INSTANCE_FLOATS;
        let event_data_offset = vector_data_offset + max_vector_vertices * VECTOR_VERTEX_FLOATS;
        let buffer_total_floats = event_data_offset + max_events * EVENT_FLOATS;

        Self {
            max_instances,
            max_vector_vertices,
            max_events,
            instance_data_offset,
            vector_data_offset,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_instances, config.max_vector_vertices, config.max_events)
    }
}

/// Write one frame into `out`, resizing it to the layout. Sections that
/// exceed their capacity are truncated with a warning.
pub fn pack_frame(
    layout: &ProtocolLayout,
    frame: u64,
    surface: (f32, f32),
    buffer: &RenderBuffer,
    events: &[EffectEvent],
    out: &mut Vec<f32>,
) {
    out.clear();
    out.resize(layout.buffer_total_floats, 0.0);

    let instances = clamp_section("instances", &buffer.instances, layout.max_instances);
    let vectors = clamp_section("vector vertices", &buffer.vectors, layout.max_vector_vertices);
    let wire: Vec<WireEvent> = clamp_section("events", events, layout.max_events)
        .iter()
        .map(|e| e.to_wire())
        .collect();

    let header = &mut out[..HEADER_FLOATS];
    header[HEADER_FRAME_COUNTER] = frame as f32;
    header[HEADER_MAX_INSTANCES] = layout.max_instances as f32;
    header[HEADER_INSTANCE_COUNT] = instances.len() as f32;
    header[HEADER_ADDITIVE_SPLIT] = (buffer.additive_split as usize).min(instances.len()) as f32;
    header[HEADER_MAX_VECTOR_VERTICES] = layout.max_vector_vertices as f32;
    header[HEADER_VECTOR_VERTEX_COUNT] = vectors.len() as f32;
    header[HEADER_MAX_EVENTS] = layout.max_events as f32;
    header[HEADER_EVENT_COUNT] = wire.len() as f32;
    header[HEADER_SURFACE_WIDTH] = surface.0;
    header[HEADER_SURFACE_HEIGHT] = surface.1;
    header[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;

    copy_into(out, layout.instance_data_offset, cast_slice(instances));
    copy_into(out, layout.vector_data_offset, cast_slice(vectors));
    copy_into(out, layout.event_data_offset, cast_slice(&wire));
}

fn clamp_section<'a, T>(name: &str, items: &'a [T], max: usize) -> &'a [T] {
    if items.len() > max {
        log::warn!("{} truncated: {} > {}", name, items.len(), max);
        &items[..max]
    } else {
        items
    }
}

fn copy_into(out: &mut [f32], offset: usize, data: &[f32]) {
    out[offset..offset + data.len()].copy_from_slice(data);
}
