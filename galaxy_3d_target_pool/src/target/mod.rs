//! Render target pooling module
//!
//! Provides the target descriptor, the three pooled target kinds
//! (color, depth-stencil, stage) and the pool that caches them by
//! exact descriptor match.

mod config;
mod readback;
mod target_desc;
mod target_pool;
mod target_store;
mod texture_target;

pub use config::PoolConfig;
pub use target_desc::{TargetDesc, AUTO_GENERATE_MIPS};
pub use target_pool::{
    ColorTargetRef, DepthStencilTargetRef, KindStats, StageTargetRef, TargetPool, TargetPoolStats,
};
pub use target_store::{ColorTargetKey, DepthStencilTargetKey, PooledTarget, StageTargetKey};
pub use texture_target::{
    ColorTarget, DepthStencilTarget, StageTarget, Target, TargetCapabilities, TextureTarget,
};
