/// Shared surface storage of the memory backend
///
/// Device and contexts share one heap through `Rc<RefCell<..>>`; resources
/// hold a handle to it and remove their surface when dropped.

use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::device::{Resource, ResourceId, ShaderView, TargetKind, TargetView};
use crate::target::TargetDesc;

/// Allocation counters of a memory device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Surfaces ever created
    pub created: u64,
    /// Surfaces destroyed
    pub destroyed: u64,
    /// Surfaces currently alive
    pub live: usize,
}

/// Pixel storage of one resource
pub(crate) struct Surface {
    pub(crate) desc: TargetDesc,
    pub(crate) kind: TargetKind,
    /// Tightly packed bytes, one entry per subresource
    pub(crate) subresources: Vec<Vec<u8>>,
}

impl Surface {
    pub(crate) fn new(desc: TargetDesc, kind: TargetKind) -> Self {
        let subresources = (0..desc.subresource_count())
            .map(|sub| vec![0u8; desc.subresource_size(sub).unwrap_or(0)])
            .collect();
        Self { desc, kind, subresources }
    }

    /// Whether `other` can be the source or destination of a full copy
    pub(crate) fn same_shape(&self, other: &Surface) -> bool {
        let (a, b) = (&self.desc, &other.desc);
        a.width == b.width
            && a.height == b.height
            && a.format == b.format
            && a.samples == b.samples
            && a.count == b.count
            && a.resolved_mip_levels() == b.resolved_mip_levels()
    }
}

#[derive(Default)]
pub(crate) struct Heap {
    pub(crate) surfaces: FxHashMap<ResourceId, Surface>,
    next_id: u64,
    pub(crate) stats: MemoryStats,
}

impl Heap {
    pub(crate) fn insert(&mut self, surface: Surface) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        self.surfaces.insert(id, surface);
        self.stats.created += 1;
        self.stats.live = self.surfaces.len();
        id
    }

    fn remove(&mut self, id: ResourceId) {
        if self.surfaces.remove(&id).is_some() {
            self.stats.destroyed += 1;
            self.stats.live = self.surfaces.len();
        }
    }
}

pub(crate) type SharedHeap = Rc<RefCell<Heap>>;

// ===== RESOURCE / VIEWS =====

/// Texture resource living in a memory device heap
pub struct MemoryResource {
    id: ResourceId,
    heap: SharedHeap,
}

impl MemoryResource {
    pub(crate) fn new(id: ResourceId, heap: SharedHeap) -> Self {
        Self { id, heap }
    }
}

impl Resource for MemoryResource {
    fn id(&self) -> ResourceId {
        self.id
    }
}

impl Drop for MemoryResource {
    fn drop(&mut self) {
        self.heap.borrow_mut().remove(self.id);
    }
}

/// Shader view of a memory resource
pub struct MemoryShaderView {
    pub(crate) resource_id: ResourceId,
}

impl ShaderView for MemoryShaderView {
    fn resource_id(&self) -> ResourceId {
        self.resource_id
    }
}

/// Render-target / depth-stencil view of a memory resource
pub struct MemoryTargetView {
    pub(crate) resource_id: ResourceId,
    pub(crate) slice: Option<u32>,
}

impl TargetView for MemoryTargetView {
    fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    fn slice(&self) -> Option<u32> {
        self.slice
    }
}
