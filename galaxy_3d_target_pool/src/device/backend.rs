/// Device and DeviceContext traits - resource creation and readback plumbing

use std::fmt;
use crate::error::Result;
use crate::device::{Resource, ShaderView, TargetView};
use crate::target::TargetDesc;

/// Kind of pooled target, selecting which views the device must create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Color render target (shader view + render-target view(s))
    Color,
    /// Depth-stencil target (shader view + depth-stencil view(s))
    DepthStencil,
    /// CPU readback staging resource (no views)
    Stage,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Color => write!(f, "color"),
            TargetKind::DepthStencil => write!(f, "depth-stencil"),
            TargetKind::Stage => write!(f, "stage"),
        }
    }
}

/// Everything a device produces for one target
///
/// The pool takes ownership of the parts and checks that they fit the
/// requested `TargetKind` before a target becomes observable.
pub struct TargetParts {
    /// Backing texture resource
    pub resource: Box<dyn Resource>,
    /// Optional shader-visible view
    pub texture: Option<Box<dyn ShaderView>>,
    /// Combined render/depth view over every slice
    pub target: Option<Box<dyn TargetView>>,
    /// Per-slice render/depth views (empty when only the combined view applies)
    pub targets: Vec<Box<dyn TargetView>>,
}

impl TargetParts {
    /// Parts for a staging resource (no views)
    pub fn stage(resource: Box<dyn Resource>) -> Self {
        Self {
            resource,
            texture: None,
            target: None,
            targets: Vec::new(),
        }
    }
}

/// Resource factory used by the target pool on cache misses
///
/// Implemented by backend-specific devices (e.g., `MemoryDevice`).
/// Creation takes `&self`: like a D3D11 device, resource creation is
/// independent of any command recording state.
pub trait Device {
    /// Create the resource and the views required for `kind`
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; the pool propagates it as is.
    fn create_target(&self, desc: &TargetDesc, kind: TargetKind) -> Result<TargetParts>;
}

/// CPU-visible memory of a mapped subresource
///
/// Borrowed from the context until dropped; call `DeviceContext::unmap`
/// afterwards.
pub struct MappedSubresource<'a> {
    /// Mapped bytes, at least `depth_pitch` long
    pub data: &'a [u8],
    /// Distance in bytes between the starts of two rows
    pub row_pitch: u32,
    /// Distance in bytes between the starts of two depth slices
    pub depth_pitch: u32,
}

/// Immediate command context used by the readback path
pub trait DeviceContext {
    /// Copy every subresource of `src` into `dst` (identical shapes required)
    fn copy_resource(&mut self, dst: &dyn Resource, src: &dyn Resource) -> Result<()>;

    /// Map a subresource of a staging resource for CPU reads
    fn map(&mut self, resource: &dyn Resource, subresource: u32) -> Result<MappedSubresource<'_>>;

    /// Release a mapping obtained with `map`
    fn unmap(&mut self, resource: &dyn Resource, subresource: u32);
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
