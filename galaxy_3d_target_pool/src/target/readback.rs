/// CPU readback through a pooled stage target
///
/// copy target -> stage, map stage, copy rows tightly packed into the
/// caller's buffer, unmap. The stage guard goes back to the pool on return.

use crate::error::{Error, Result};
use crate::device::{DeviceContext, MappedSubresource};
use super::target_desc::TargetDesc;
use super::target_pool::TargetPool;
use super::texture_target::Target;

/// Read a subresource of `target` into `memory`, returning the byte count written
pub(crate) fn read_back(
    pool: &TargetPool,
    target: &dyn Target,
    memory: &mut [u8],
    context: &mut dyn DeviceContext,
    subresource: u32,
) -> Result<usize> {
    let desc = target.desc();
    let (mip_level, _) = desc.subresource_location(subresource).ok_or_else(|| {
        Error::InvalidResource(format!(
            "subresource {} out of range ({} subresources)",
            subresource,
            desc.subresource_count()
        ))
    })?;

    let stage = pool.acquire_stage(desc)?;
    context.copy_resource(stage.resource(), target.resource())?;

    let copied = {
        let mapped = context.map(stage.resource(), subresource)?;
        copy_rows(desc, mip_level, &mapped, memory)
    };
    context.unmap(stage.resource(), subresource);
    copied
}

/// Copy up to `memory.len()` bytes of a mapped mip level, dropping row padding
///
/// Nothing is written unless the mapping holds every byte to be copied.
pub(crate) fn copy_rows(
    desc: &TargetDesc,
    mip_level: u32,
    mapped: &MappedSubresource<'_>,
    memory: &mut [u8],
) -> Result<usize> {
    let row_size = desc.row_size(mip_level);
    let (_, height) = desc.mip_extent(mip_level);
    let len = memory.len().min(row_size * height as usize);
    if len == 0 {
        return Ok(0);
    }

    let row_pitch = mapped.row_pitch as usize;
    if row_pitch < row_size {
        return Err(Error::InvalidResource(format!(
            "row pitch {} smaller than row size {}",
            row_pitch, row_size
        )));
    }

    let rows = len.div_ceil(row_size);
    let last_row = len - (rows - 1) * row_size;
    let required = (rows - 1) * row_pitch + last_row;
    if mapped.data.len() < required {
        return Err(Error::InvalidResource(format!(
            "mapped {} bytes, {} required",
            mapped.data.len(),
            required
        )));
    }

    for (row, chunk) in memory[..len].chunks_mut(row_size).enumerate() {
        let start = row * row_pitch;
        chunk.copy_from_slice(&mapped.data[start..start + chunk.len()]);
    }
    Ok(len)
}

#[cfg(test)]
#[path = "readback_tests.rs"]
mod tests;
