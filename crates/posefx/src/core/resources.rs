use std::collections::HashSet;

/// What a GPU handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
}

/// Opaque handle to a host-side GPU resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub id: u32,
}

/// Tracks which geometry and material handles are live.
///
/// Every mesh allocates its handles here and returns them on dispose, so a
/// non-zero `live_count` after all effects stop means a leak.
#[derive(Debug, Default)]
pub struct GpuResources {
    live: HashSet<ResourceHandle>,
    next_id: u32,
    released: u64,
}

impl GpuResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, kind: ResourceKind) -> ResourceHandle {
        self.next_id += 1;
        let handle = ResourceHandle { kind, id: self.next_id };
        self.live.insert(handle);
        handle
    }

    /// Release a handle. Returns false (and logs) if it was not live.
    pub fn release(&mut self, handle: ResourceHandle) -> bool {
        if self.live.remove(&handle) {
            self.released += 1;
            true
        } else {
            log::warn!("release of stale {:?} handle {}", handle.kind, handle.id);
            false
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total successful releases since creation.
    pub fn released_count(&self) -> u64 {
        self.released
    }
}
