/// Pooled texture targets - base target plus the three pooled kinds
///
/// A target owns its GPU resource and views exclusively. Callers only ever
/// see targets through `PooledTarget` guards handed out by `TargetPool`.
///
/// The usage counter is a plain `Cell<u32>`: targets (and therefore the
/// pool) are `!Sync` and must stay on the thread that owns the pool.

use std::cell::Cell;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::device::{Resource, ShaderView, TargetKind, TargetParts, TargetView};
use crate::engine_error;
use super::target_desc::TargetDesc;

bitflags! {
    /// Views and roles a target offers
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TargetCapabilities: u32 {
        /// Has a shader-visible view
        const SHADER_VIEW = 1 << 0;
        /// Has a combined render/depth view
        const TARGET_VIEW = 1 << 1;
        /// Has one render/depth view per array slice
        const SLICE_VIEWS = 1 << 2;
        /// CPU readback staging resource
        const STAGING = 1 << 3;
    }
}

// ===== BASE TARGET =====

/// State shared by every target kind: descriptor, resource, shader view, usage counter
pub struct TextureTarget {
    desc: TargetDesc,
    resource: Box<dyn Resource>,
    texture: Option<Box<dyn ShaderView>>,
    references: Cell<u32>,
}

impl TextureTarget {
    pub(crate) fn new(
        desc: TargetDesc,
        resource: Box<dyn Resource>,
        texture: Option<Box<dyn ShaderView>>,
    ) -> Self {
        Self {
            desc,
            resource,
            texture,
            references: Cell::new(0),
        }
    }

    /// Descriptor this target was created from
    pub fn desc(&self) -> &TargetDesc {
        &self.desc
    }

    /// Backing GPU resource
    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// Shader-visible view (None for staging targets)
    pub fn texture(&self) -> Option<&dyn ShaderView> {
        self.texture.as_deref()
    }

    /// Mark the target as in use
    pub fn add_ref(&self) {
        self.references.set(self.references.get() + 1);
    }

    /// Mark one use of the target as finished
    ///
    /// # Panics
    ///
    /// Panics in debug builds when called more often than `add_ref`.
    pub fn release(&self) {
        let references = self.references.get();
        debug_assert!(references > 0, "release() without matching add_ref() on {}", self.desc);
        self.references.set(references.saturating_sub(1));
    }

    /// Whether the target is currently handed out
    pub fn is_in_use(&self) -> bool {
        self.references.get() != 0
    }

    /// Current usage count
    pub fn references(&self) -> u32 {
        self.references.get()
    }
}

// ===== TARGET TRAIT =====

/// Common accessors of the three pooled target kinds
pub trait Target {
    /// Shared base state
    fn base(&self) -> &TextureTarget;

    /// Kind of this target
    fn kind(&self) -> TargetKind;

    /// Views and roles this target offers
    fn capabilities(&self) -> TargetCapabilities;

    /// Descriptor this target was created from
    fn desc(&self) -> &TargetDesc {
        self.base().desc()
    }

    /// Backing GPU resource
    fn resource(&self) -> &dyn Resource {
        self.base().resource()
    }

    /// Shader-visible view, if any
    fn texture(&self) -> Option<&dyn ShaderView> {
        self.base().texture()
    }

    /// Whether the target is currently handed out
    fn is_in_use(&self) -> bool {
        self.base().is_in_use()
    }
}

/// Construction of a target kind from device output (pool internal)
pub(crate) trait PoolTarget: Target + Sized {
    /// Kind requested from the device
    const KIND: TargetKind;

    /// Wrap device output; fails without side effects if the parts don't fit the kind
    fn from_parts(desc: TargetDesc, parts: TargetParts) -> Result<Self>;
}

fn invalid_parts(desc: &TargetDesc, kind: TargetKind, reason: &str) -> Error {
    let message = format!("Device returned a {} target for {} {}", kind, desc, reason);
    engine_error!("galaxy3d::TargetPool", "{}", message);
    Error::InvalidResource(message)
}

// ===== RENDER VIEWS =====

/// Combined view plus optional per-slice views (color and depth-stencil kinds)
struct RenderViews {
    target: Box<dyn TargetView>,
    targets: Vec<Box<dyn TargetView>>,
}

impl RenderViews {
    fn from_parts(
        desc: &TargetDesc,
        kind: TargetKind,
        resource: &dyn Resource,
        target: Option<Box<dyn TargetView>>,
        targets: Vec<Box<dyn TargetView>>,
    ) -> Result<Self> {
        let target = target.ok_or_else(|| invalid_parts(desc, kind, "without a target view"))?;

        if !targets.is_empty() && targets.len() != desc.count as usize {
            return Err(invalid_parts(
                desc,
                kind,
                &format!("with {} slice views", targets.len()),
            ));
        }

        let id = resource.id();
        let foreign = std::iter::once(&target)
            .chain(targets.iter())
            .any(|view| view.resource_id() != id);
        if foreign {
            return Err(invalid_parts(desc, kind, "with views of another resource"));
        }

        Ok(Self { target, targets })
    }

    fn at(&self, slice: u32) -> &dyn TargetView {
        if self.targets.is_empty() {
            self.target.as_ref()
        } else {
            self.targets[slice as usize].as_ref()
        }
    }

    fn capabilities(&self) -> TargetCapabilities {
        if self.targets.is_empty() {
            TargetCapabilities::TARGET_VIEW
        } else {
            TargetCapabilities::TARGET_VIEW | TargetCapabilities::SLICE_VIEWS
        }
    }
}

fn shader_view_capability(base: &TextureTarget) -> TargetCapabilities {
    if base.texture().is_some() {
        TargetCapabilities::SHADER_VIEW
    } else {
        TargetCapabilities::empty()
    }
}

fn check_texture(
    desc: &TargetDesc,
    kind: TargetKind,
    resource: &dyn Resource,
    texture: &Option<Box<dyn ShaderView>>,
) -> Result<()> {
    match texture {
        Some(view) if view.resource_id() != resource.id() => {
            Err(invalid_parts(desc, kind, "with a shader view of another resource"))
        }
        _ => Ok(()),
    }
}

// ===== COLOR TARGET =====

/// Color render target
pub struct ColorTarget {
    base: TextureTarget,
    views: RenderViews,
}

impl ColorTarget {
    /// Render-target view covering every slice
    pub fn target_view(&self) -> &dyn TargetView {
        self.views.target.as_ref()
    }

    /// Render-target view of the n-th slice
    ///
    /// Falls back to the combined view when the target has no per-slice views.
    ///
    /// # Panics
    ///
    /// Panics if per-slice views exist and `slice` is out of range.
    pub fn target_view_at(&self, slice: u32) -> &dyn TargetView {
        self.views.at(slice)
    }

    /// Number of per-slice views (0 when only the combined view exists)
    pub fn slice_view_count(&self) -> usize {
        self.views.targets.len()
    }
}

impl Target for ColorTarget {
    fn base(&self) -> &TextureTarget {
        &self.base
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Color
    }

    fn capabilities(&self) -> TargetCapabilities {
        shader_view_capability(&self.base) | self.views.capabilities()
    }
}

impl PoolTarget for ColorTarget {
    const KIND: TargetKind = TargetKind::Color;

    fn from_parts(desc: TargetDesc, parts: TargetParts) -> Result<Self> {
        let TargetParts { resource, texture, target, targets } = parts;
        check_texture(&desc, Self::KIND, resource.as_ref(), &texture)?;
        let views = RenderViews::from_parts(&desc, Self::KIND, resource.as_ref(), target, targets)?;
        Ok(Self {
            base: TextureTarget::new(desc, resource, texture),
            views,
        })
    }
}

// ===== DEPTH-STENCIL TARGET =====

/// Depth-stencil target
pub struct DepthStencilTarget {
    base: TextureTarget,
    views: RenderViews,
}

impl DepthStencilTarget {
    /// Depth-stencil view covering every slice
    pub fn target_view(&self) -> &dyn TargetView {
        self.views.target.as_ref()
    }

    /// Depth-stencil view of the n-th slice
    ///
    /// Falls back to the combined view when the target has no per-slice views.
    ///
    /// # Panics
    ///
    /// Panics if per-slice views exist and `slice` is out of range.
    pub fn target_view_at(&self, slice: u32) -> &dyn TargetView {
        self.views.at(slice)
    }

    /// Number of per-slice views (0 when only the combined view exists)
    pub fn slice_view_count(&self) -> usize {
        self.views.targets.len()
    }
}

impl Target for DepthStencilTarget {
    fn base(&self) -> &TextureTarget {
        &self.base
    }

    fn kind(&self) -> TargetKind {
        TargetKind::DepthStencil
    }

    fn capabilities(&self) -> TargetCapabilities {
        shader_view_capability(&self.base) | self.views.capabilities()
    }
}

impl PoolTarget for DepthStencilTarget {
    const KIND: TargetKind = TargetKind::DepthStencil;

    fn from_parts(desc: TargetDesc, parts: TargetParts) -> Result<Self> {
        let TargetParts { resource, texture, target, targets } = parts;
        check_texture(&desc, Self::KIND, resource.as_ref(), &texture)?;
        let views = RenderViews::from_parts(&desc, Self::KIND, resource.as_ref(), target, targets)?;
        Ok(Self {
            base: TextureTarget::new(desc, resource, texture),
            views,
        })
    }
}

// ===== STAGE TARGET =====

/// CPU readback staging target (no views)
pub struct StageTarget {
    base: TextureTarget,
}

impl Target for StageTarget {
    fn base(&self) -> &TextureTarget {
        &self.base
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Stage
    }

    fn capabilities(&self) -> TargetCapabilities {
        TargetCapabilities::STAGING
    }
}

impl PoolTarget for StageTarget {
    const KIND: TargetKind = TargetKind::Stage;

    fn from_parts(desc: TargetDesc, parts: TargetParts) -> Result<Self> {
        let TargetParts { resource, texture, target, targets } = parts;
        if texture.is_some() || target.is_some() || !targets.is_empty() {
            return Err(invalid_parts(&desc, Self::KIND, "with views"));
        }
        Ok(Self {
            base: TextureTarget::new(desc, resource, None),
        })
    }
}

#[cfg(test)]
#[path = "texture_target_tests.rs"]
mod tests;
