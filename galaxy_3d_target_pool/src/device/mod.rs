/// Device module - the GPU collaborator boundary used by the target pool
///
/// The pool never talks to a graphics API directly. Backends implement
/// `Device` (resource + view creation) and `DeviceContext` (copy/map/unmap).

// Module declarations
pub mod format;
pub mod resource;
pub mod backend;

// Re-export everything
pub use format::*;
pub use resource::*;
pub use backend::*;

// Mock device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
