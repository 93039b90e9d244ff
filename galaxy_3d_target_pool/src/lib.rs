/*!
# Galaxy 3D Target Pool

Transient render-target pooling for the Galaxy 3D renderer.

The pool hands out color, depth-stencil and stage (CPU readback) targets by
exact descriptor match, reusing idle targets and allocating new ones through
a backend `Device` only on a cache miss. Targets are destroyed when the pool
is dropped, never individually.

## Architecture

- **Device / DeviceContext**: backend traits for resource creation and readback
- **TargetDesc**: exact-match key (size, mips + auto-mips flag, format, samples, slices)
- **ColorTarget / DepthStencilTarget / StageTarget**: pooled targets with a usage counter
- **TargetPool**: per-kind stable storage, acquire, read back, statistics
- **MemoryDevice / MemoryContext**: headless CPU-memory backend

The pool is single-threaded: it is neither `Send` nor `Sync`.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod device;
pub mod target;
pub mod memory;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging hub)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Device sub-module (backend traits)
    pub mod device {
        pub use crate::device::*;
    }

    // Target sub-module (descriptor, targets, pool)
    pub mod target {
        pub use crate::target::*;
    }

    // Memory backend sub-module
    pub mod memory {
        pub use crate::memory::*;
    }
}
