/// Memory module - headless backend storing surfaces in CPU memory
///
/// `MemoryDevice` and `MemoryContext` implement the device traits without a
/// GPU, so the target pool can run in tools, servers and tests.

mod memory_heap;
mod memory_device;
mod memory_context;

pub use memory_heap::{MemoryResource, MemoryShaderView, MemoryStats, MemoryTargetView};
pub use memory_device::{MemoryDevice, MAX_ARRAY_SLICES, MAX_DIMENSION};
pub use memory_context::{MemoryContext, MAP_ROW_ALIGNMENT};
