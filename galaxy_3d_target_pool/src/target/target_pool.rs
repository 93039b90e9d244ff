/// Transient render-target pool
///
/// Hands out color, depth-stencil and stage targets by exact descriptor
/// match, reusing idle targets and allocating through the `Device` on a miss.
/// Targets are only destroyed when the pool itself is dropped.

use std::rc::Rc;
use slotmap::Key;
use crate::error::Result;
use crate::device::{Device, DeviceContext, TargetKind};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};
use super::config::PoolConfig;
use super::readback;
use super::target_desc::TargetDesc;
use super::target_store::{
    ColorTargetKey, DepthStencilTargetKey, PooledTarget, StageTargetKey, TargetStore,
};
use super::texture_target::{ColorTarget, DepthStencilTarget, PoolTarget, StageTarget, Target};

/// Guard for a pooled color target
pub type ColorTargetRef<'pool> = PooledTarget<'pool, ColorTargetKey, ColorTarget>;
/// Guard for a pooled depth-stencil target
pub type DepthStencilTargetRef<'pool> = PooledTarget<'pool, DepthStencilTargetKey, DepthStencilTarget>;
/// Guard for a pooled stage target
pub type StageTargetRef<'pool> = PooledTarget<'pool, StageTargetKey, StageTarget>;

/// Allocation counts of one target kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindStats {
    /// Targets ever allocated (never decreases)
    pub allocated: usize,
    /// Targets currently handed out
    pub in_use: usize,
}

/// Allocation counts of the whole pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetPoolStats {
    pub color: KindStats,
    pub depth_stencil: KindStats,
    pub stage: KindStats,
}

impl TargetPoolStats {
    /// Targets ever allocated, all kinds
    pub fn total_allocated(&self) -> usize {
        self.color.allocated + self.depth_stencil.allocated + self.stage.allocated
    }

    /// Targets currently handed out, all kinds
    pub fn total_in_use(&self) -> usize {
        self.color.in_use + self.depth_stencil.in_use + self.stage.in_use
    }
}

/// Exact-match cache and lifetime owner of texture targets
///
/// # Thread Safety
///
/// The pool is neither `Send` nor `Sync`: usage counters are plain cells.
/// Keep it on the render thread; wrap it in your own synchronization
/// if several threads must share targets.
///
/// # Example
///
/// ```no_run
/// use std::rc::Rc;
/// use galaxy_3d_target_pool::galaxy3d::{device::TargetFormat, memory::MemoryDevice, target::{TargetDesc, TargetPool}};
///
/// let pool = TargetPool::new(Rc::new(MemoryDevice::new()));
/// let desc = TargetDesc::simple(256, 256, TargetFormat::R8G8B8A8_UNORM);
/// let hdr = pool.acquire_color(&desc)?;
/// // render into hdr.target_view() ...
/// drop(hdr); // back to the pool, kept for the next acquire
/// # Ok::<(), galaxy_3d_target_pool::galaxy3d::Error>(())
/// ```
pub struct TargetPool {
    device: Rc<dyn Device>,
    config: PoolConfig,
    source: String,
    color_targets: TargetStore<ColorTargetKey, ColorTarget>,
    depth_stencil_targets: TargetStore<DepthStencilTargetKey, DepthStencilTarget>,
    stage_targets: TargetStore<StageTargetKey, StageTarget>,
}

impl TargetPool {
    /// Create an empty pool with the default configuration
    pub fn new(device: Rc<dyn Device>) -> Self {
        Self::with_config(device, PoolConfig::default())
    }

    /// Create an empty pool
    pub fn with_config(device: Rc<dyn Device>, config: PoolConfig) -> Self {
        let source = format!("galaxy3d::{}", config.label);
        Self {
            device,
            config,
            source,
            color_targets: TargetStore::new(),
            depth_stencil_targets: TargetStore::new(),
            stage_targets: TargetStore::new(),
        }
    }

    /// Device used for allocations on cache misses
    pub fn device(&self) -> &Rc<dyn Device> {
        &self.device
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // ===== ACQUIRE =====

    /// Acquire a color target matching `desc` exactly
    ///
    /// # Errors
    ///
    /// Propagates the device error on allocation failure; the pool is left unchanged.
    pub fn acquire_color(&self, desc: &TargetDesc) -> Result<ColorTargetRef<'_>> {
        self.acquire(&self.color_targets, desc)
    }

    /// Acquire a depth-stencil target matching `desc` exactly
    ///
    /// # Errors
    ///
    /// Propagates the device error on allocation failure; the pool is left unchanged.
    pub fn acquire_depth_stencil(&self, desc: &TargetDesc) -> Result<DepthStencilTargetRef<'_>> {
        self.acquire(&self.depth_stencil_targets, desc)
    }

    /// Acquire a stage (CPU readback) target matching `desc` exactly
    ///
    /// # Errors
    ///
    /// Propagates the device error on allocation failure; the pool is left unchanged.
    pub fn acquire_stage(&self, desc: &TargetDesc) -> Result<StageTargetRef<'_>> {
        self.acquire(&self.stage_targets, desc)
    }

    fn acquire<'pool, K: Key, T: PoolTarget>(
        &'pool self,
        store: &'pool TargetStore<K, T>,
        desc: &TargetDesc,
    ) -> Result<PooledTarget<'pool, K, T>> {
        if let Some((key, target)) = store.find_idle(desc) {
            target.base().add_ref();
            engine_trace!(&self.source, "Reusing {} target {}", T::KIND, desc);
            return Ok(PooledTarget::new(store, key, target));
        }

        let parts = self.device.create_target(desc, T::KIND).map_err(|err| {
            engine_error!(&self.source, "Failed to allocate {} target {}: {}", T::KIND, desc, err);
            err
        })?;
        let target = T::from_parts(*desc, parts)?;

        target.base().add_ref();
        let (key, target) = store.insert(target);

        let allocated = store.len();
        engine_debug!(&self.source, "Allocated {} target {} ({} total)", T::KIND, desc, allocated);
        self.check_growth(T::KIND, allocated);

        Ok(PooledTarget::new(store, key, target))
    }

    fn check_growth(&self, kind: TargetKind, allocated: usize) {
        let threshold = self.config.growth_warning_threshold;
        if threshold > 0 && allocated == threshold + 1 {
            engine_warn!(
                &self.source,
                "Pool now holds {} {} targets; idle targets are never evicted",
                allocated,
                kind
            );
        }
    }

    // ===== READBACK =====

    /// Read a subresource of `target` back into `memory`
    ///
    /// Copies through a pooled stage target with the same descriptor. At most
    /// `memory.len()` bytes are written, rows tightly packed. Returns false if
    /// any device step fails; in that case `memory` is left untouched.
    pub fn read_back(
        &self,
        target: &dyn Target,
        memory: &mut [u8],
        context: &mut dyn DeviceContext,
        subresource: u32,
    ) -> bool {
        match readback::read_back(self, target, memory, context, subresource) {
            Ok(copied) => {
                engine_trace!(&self.source, "Read back {} bytes of {}", copied, target.desc());
                true
            }
            Err(err) => {
                engine_warn!(
                    &self.source,
                    "Read back of subresource {} of {} failed: {}",
                    subresource,
                    target.desc(),
                    err
                );
                false
            }
        }
    }

    // ===== STATISTICS =====

    /// Allocation counts per kind
    pub fn stats(&self) -> TargetPoolStats {
        TargetPoolStats {
            color: KindStats {
                allocated: self.color_targets.len(),
                in_use: self.color_targets.in_use_count(),
            },
            depth_stencil: KindStats {
                allocated: self.depth_stencil_targets.len(),
                in_use: self.depth_stencil_targets.in_use_count(),
            },
            stage: KindStats {
                allocated: self.stage_targets.len(),
                in_use: self.stage_targets.in_use_count(),
            },
        }
    }

    /// Number of color targets ever allocated
    pub fn color_target_count(&self) -> usize {
        self.color_targets.len()
    }

    /// Number of depth-stencil targets ever allocated
    pub fn depth_stencil_target_count(&self) -> usize {
        self.depth_stencil_targets.len()
    }

    /// Number of stage targets ever allocated
    pub fn stage_target_count(&self) -> usize {
        self.stage_targets.len()
    }
}

impl Drop for TargetPool {
    fn drop(&mut self) {
        let stats = self.stats();
        if stats.total_in_use() > 0 {
            engine_warn!(
                &self.source,
                "Destroying pool with {} targets still marked in use",
                stats.total_in_use()
            );
        }
        engine_debug!(&self.source, "Destroying {} pooled targets", stats.total_allocated());
    }
}

#[cfg(test)]
#[path = "target_pool_tests.rs"]
mod tests;
