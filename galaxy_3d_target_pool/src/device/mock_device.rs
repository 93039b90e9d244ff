/// Mock Device for unit tests (no GPU required)
///
/// Lets pool tests count allocations/destructions, inject creation
/// failures and produce ill-formed device output.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use crate::error::{Error, Result};
use crate::device::{
    Device, DeviceContext, MappedSubresource, Resource, ResourceId, ShaderView,
    TargetKind, TargetParts, TargetView,
};
use crate::target::TargetDesc;

// ============================================================================
// Mock Resource / Views
// ============================================================================

/// Shared creation/destruction counters
#[derive(Debug, Default)]
pub struct MockCounters {
    pub created: Cell<u32>,
    pub destroyed: Cell<u32>,
}

pub struct MockResource {
    pub id: ResourceId,
    counters: Rc<MockCounters>,
}

impl Resource for MockResource {
    fn id(&self) -> ResourceId {
        self.id
    }
}

impl Drop for MockResource {
    fn drop(&mut self) {
        self.counters.destroyed.set(self.counters.destroyed.get() + 1);
    }
}

pub struct MockShaderView {
    pub resource_id: ResourceId,
}

impl ShaderView for MockShaderView {
    fn resource_id(&self) -> ResourceId {
        self.resource_id
    }
}

pub struct MockTargetView {
    pub resource_id: ResourceId,
    pub slice: Option<u32>,
}

impl TargetView for MockTargetView {
    fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    fn slice(&self) -> Option<u32> {
        self.slice
    }
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockDevice {
    pub counters: Rc<MockCounters>,
    next_id: Cell<u64>,
    /// Fail the next `create_target` call with OutOfMemory
    pub fail_next: Cell<bool>,
    /// Produce Color/DepthStencil parts without the combined target view
    pub omit_target_view: Cell<bool>,
    /// Attach a shader view to Stage parts
    pub stage_with_view: Cell<bool>,
    /// Produce one per-slice view too few for array targets
    pub short_slice_views: Cell<bool>,
    /// Every (descriptor, kind) passed to `create_target`
    pub requests: RefCell<Vec<(TargetDesc, TargetKind)>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            counters: Rc::new(MockCounters::default()),
            next_id: Cell::new(1),
            fail_next: Cell::new(false),
            omit_target_view: Cell::new(false),
            stage_with_view: Cell::new(false),
            short_slice_views: Cell::new(false),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn created(&self) -> u32 {
        self.counters.created.get()
    }

    pub fn destroyed(&self) -> u32 {
        self.counters.destroyed.get()
    }

    fn next_resource(&self) -> MockResource {
        let id = ResourceId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.counters.created.set(self.counters.created.get() + 1);
        MockResource { id, counters: self.counters.clone() }
    }
}

impl Device for MockDevice {
    fn create_target(&self, desc: &TargetDesc, kind: TargetKind) -> Result<TargetParts> {
        self.requests.borrow_mut().push((*desc, kind));

        if self.fail_next.replace(false) {
            return Err(Error::OutOfMemory);
        }

        let resource = self.next_resource();
        let id = resource.id;

        if kind == TargetKind::Stage {
            let mut parts = TargetParts::stage(Box::new(resource));
            if self.stage_with_view.get() {
                parts.texture = Some(Box::new(MockShaderView { resource_id: id }));
            }
            return Ok(parts);
        }

        let target: Option<Box<dyn TargetView>> = if self.omit_target_view.get() {
            None
        } else {
            Some(Box::new(MockTargetView { resource_id: id, slice: None }))
        };

        let mut slice_count = if desc.count > 1 { desc.count } else { 0 };
        if self.short_slice_views.get() && slice_count > 0 {
            slice_count -= 1;
        }
        let targets = (0..slice_count)
            .map(|slice| {
                Box::new(MockTargetView { resource_id: id, slice: Some(slice) }) as Box<dyn TargetView>
            })
            .collect();

        Ok(TargetParts {
            resource: Box::new(resource),
            texture: Some(Box::new(MockShaderView { resource_id: id })),
            target,
            targets,
        })
    }
}

// ============================================================================
// Mock DeviceContext
// ============================================================================

pub struct MockContext {
    /// Bytes returned by `map`
    pub data: Vec<u8>,
    /// Row pitch reported by `map`
    pub row_pitch: u32,
    pub fail_copy: bool,
    pub fail_map: bool,
    /// Call log ("copy", "map", "unmap")
    pub calls: Vec<String>,
}

impl MockContext {
    pub fn new(data: Vec<u8>, row_pitch: u32) -> Self {
        Self {
            data,
            row_pitch,
            fail_copy: false,
            fail_map: false,
            calls: Vec::new(),
        }
    }
}

impl DeviceContext for MockContext {
    fn copy_resource(&mut self, _dst: &dyn Resource, _src: &dyn Resource) -> Result<()> {
        self.calls.push("copy".to_string());
        if self.fail_copy {
            return Err(Error::BackendError("mock copy failure".to_string()));
        }
        Ok(())
    }

    fn map(&mut self, _resource: &dyn Resource, subresource: u32) -> Result<MappedSubresource<'_>> {
        self.calls.push(format!("map {}", subresource));
        if self.fail_map {
            return Err(Error::BackendError("mock map failure".to_string()));
        }
        Ok(MappedSubresource {
            data: &self.data,
            row_pitch: self.row_pitch,
            depth_pitch: self.data.len() as u32,
        })
    }

    fn unmap(&mut self, _resource: &dyn Resource, subresource: u32) {
        self.calls.push(format!("unmap {}", subresource));
    }
}
