/// MemoryDevice - `Device` implementation backed by CPU memory

use std::cell::RefCell;
use std::rc::Rc;
use crate::error::{Error, Result};
use crate::device::{Device, TargetKind, TargetParts, TargetView};
use crate::target::TargetDesc;
use crate::{engine_bail, engine_error};
use super::memory_context::MemoryContext;
use super::memory_heap::{
    Heap, MemoryResource, MemoryShaderView, MemoryStats, MemoryTargetView, SharedHeap, Surface,
};

const SOURCE: &str = "galaxy3d::memory::MemoryDevice";

/// Largest width or height of a target, in pixels
pub const MAX_DIMENSION: u32 = 16384;

/// Largest number of array slices of a target
pub const MAX_ARRAY_SLICES: u32 = 2048;

/// Headless device creating zero-initialized surfaces in a shared heap
///
/// Enforces the same kind/format rules a GPU driver would:
/// depth formats only for depth-stencil targets, no multisampled staging
/// resources, a single mip level for multisampled targets, no mip level
/// beyond the full chain, and the `MAX_DIMENSION` / `MAX_ARRAY_SLICES` limits.
pub struct MemoryDevice {
    heap: SharedHeap,
    max_resources: Option<usize>,
}

impl MemoryDevice {
    /// Create a device without a resource budget
    pub fn new() -> Self {
        Self {
            heap: Rc::new(RefCell::new(Heap::default())),
            max_resources: None,
        }
    }

    /// Create a device refusing to hold more than `max_resources` live surfaces
    pub fn with_max_resources(max_resources: usize) -> Self {
        Self {
            max_resources: Some(max_resources),
            ..Self::new()
        }
    }

    /// Immediate context operating on this device's surfaces
    pub fn context(&self) -> MemoryContext {
        MemoryContext::new(self.heap.clone())
    }

    /// Allocation counters
    pub fn stats(&self) -> MemoryStats {
        self.heap.borrow().stats
    }

    fn validate(&self, desc: &TargetDesc, kind: TargetKind) -> Result<()> {
        if desc.width == 0 || desc.height == 0 || desc.count == 0 {
            engine_bail!(SOURCE, "Cannot create {} target {}: empty extent", kind, desc);
        }
        if desc.width > MAX_DIMENSION || desc.height > MAX_DIMENSION {
            engine_bail!(SOURCE, "Cannot create {} target {}: larger than {} pixels", kind, desc, MAX_DIMENSION);
        }
        if desc.count > MAX_ARRAY_SLICES {
            engine_bail!(SOURCE, "Cannot create {} target {}: more than {} slices", kind, desc, MAX_ARRAY_SLICES);
        }
        if desc.mip_level_count() > desc.full_mip_chain() {
            engine_bail!(
                SOURCE,
                "Cannot create {} target {}: mip chain has only {} levels",
                kind,
                desc,
                desc.full_mip_chain()
            );
        }
        if desc.samples.count == 0 {
            engine_bail!(SOURCE, "Cannot create {} target {}: zero samples", kind, desc);
        }
        match kind {
            TargetKind::DepthStencil if !desc.format.is_depth_stencil() => {
                engine_bail!(SOURCE, "{:?} is not a depth-stencil format", desc.format);
            }
            TargetKind::Color if desc.format.is_depth_stencil() => {
                engine_bail!(SOURCE, "{:?} cannot be used as a color target", desc.format);
            }
            TargetKind::Stage if desc.samples.is_multisampled() => {
                engine_bail!(SOURCE, "Stage targets cannot be multisampled ({})", desc);
            }
            _ => {}
        }
        if desc.samples.is_multisampled() && desc.resolved_mip_levels() != 1 {
            engine_bail!(SOURCE, "Multisampled target {} must have exactly one mip level", desc);
        }
        Ok(())
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MemoryDevice {
    fn create_target(&self, desc: &TargetDesc, kind: TargetKind) -> Result<TargetParts> {
        self.validate(desc, kind)?;

        let id = {
            let mut heap = self.heap.borrow_mut();
            if let Some(max) = self.max_resources {
                if heap.surfaces.len() >= max {
                    engine_error!(SOURCE, "Resource budget of {} surfaces exhausted", max);
                    return Err(Error::OutOfMemory);
                }
            }
            heap.insert(Surface::new(*desc, kind))
        };
        let resource = Box::new(MemoryResource::new(id, self.heap.clone()));

        if kind == TargetKind::Stage {
            return Ok(TargetParts::stage(resource));
        }

        let targets = if desc.count > 1 {
            (0..desc.count)
                .map(|slice| {
                    Box::new(MemoryTargetView { resource_id: id, slice: Some(slice) })
                        as Box<dyn TargetView>
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(TargetParts {
            resource,
            texture: Some(Box::new(MemoryShaderView { resource_id: id })),
            target: Some(Box::new(MemoryTargetView { resource_id: id, slice: None })),
            targets,
        })
    }
}

#[cfg(test)]
#[path = "memory_device_tests.rs"]
mod tests;
