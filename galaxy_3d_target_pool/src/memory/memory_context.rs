/// MemoryContext - `DeviceContext` implementation backed by CPU memory
///
/// Besides copy/map/unmap it offers the few "draw" operations a headless
/// renderer needs to put known content into targets.

use crate::error::Result;
use crate::device::{DeviceContext, MappedSubresource, Resource, ResourceId, TargetFormat, TargetKind, TargetView};
use crate::{engine_bail, engine_err, engine_warn};
use super::memory_heap::{SharedHeap, Surface};

const SOURCE: &str = "galaxy3d::memory::MemoryContext";

/// Row pitch alignment of mapped subresources, in bytes
pub const MAP_ROW_ALIGNMENT: u32 = 256;

struct Mapping {
    resource: ResourceId,
    subresource: u32,
    row_pitch: u32,
    data: Vec<u8>,
}

/// Immediate context of a `MemoryDevice`
///
/// Only one subresource can be mapped at a time.
pub struct MemoryContext {
    heap: SharedHeap,
    mapping: Option<Mapping>,
}

impl MemoryContext {
    pub(crate) fn new(heap: SharedHeap) -> Self {
        Self { heap, mapping: None }
    }

    /// Whether a subresource is currently mapped
    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    /// Fill mip 0 of the slice(s) addressed by a color target view
    pub fn clear_render_target(&mut self, view: &dyn TargetView, rgba: [f32; 4]) -> Result<()> {
        let mut heap = self.heap.borrow_mut();
        let surface = surface_mut(&mut heap.surfaces, view.resource_id())?;
        if surface.kind != TargetKind::Color {
            engine_bail!(SOURCE, "clear_render_target: resource {} is a {} target", view.resource_id(), surface.kind);
        }
        let pixel = encode_color(surface.desc.format, rgba);
        fill_slices(surface, view.slice(), &pixel)
    }

    /// Fill mip 0 of the slice(s) addressed by a depth-stencil view
    pub fn clear_depth_stencil(&mut self, view: &dyn TargetView, depth: f32, stencil: u8) -> Result<()> {
        let mut heap = self.heap.borrow_mut();
        let surface = surface_mut(&mut heap.surfaces, view.resource_id())?;
        if surface.kind != TargetKind::DepthStencil {
            engine_bail!(SOURCE, "clear_depth_stencil: resource {} is a {} target", view.resource_id(), surface.kind);
        }
        let pixel = encode_depth(surface.desc.format, depth, stencil);
        fill_slices(surface, view.slice(), &pixel)
    }

    /// Overwrite a subresource with `data`, rows `row_pitch` bytes apart
    pub fn update_subresource(
        &mut self,
        resource: &dyn Resource,
        subresource: u32,
        data: &[u8],
        row_pitch: u32,
    ) -> Result<()> {
        let mut heap = self.heap.borrow_mut();
        let surface = surface_mut(&mut heap.surfaces, resource.id())?;
        let desc = surface.desc;
        let (mip_level, _) = desc.subresource_location(subresource).ok_or_else(|| {
            engine_err!(SOURCE, "update_subresource: subresource {} out of range for {}", subresource, desc)
        })?;

        let row_size = desc.row_size(mip_level);
        let (_, height) = desc.mip_extent(mip_level);
        let row_pitch = row_pitch as usize;
        if row_pitch < row_size {
            engine_bail!(SOURCE, "update_subresource: row pitch {} smaller than row size {}", row_pitch, row_size);
        }
        let required = (height as usize - 1) * row_pitch + row_size;
        if data.len() < required {
            engine_bail!(SOURCE, "update_subresource: {} bytes given, {} required", data.len(), required);
        }

        let target = &mut surface.subresources[subresource as usize];
        for (row, chunk) in target.chunks_mut(row_size).enumerate() {
            let start = row * row_pitch;
            chunk.copy_from_slice(&data[start..start + row_size]);
        }
        Ok(())
    }
}

impl DeviceContext for MemoryContext {
    fn copy_resource(&mut self, dst: &dyn Resource, src: &dyn Resource) -> Result<()> {
        let (dst_id, src_id) = (dst.id(), src.id());
        if dst_id == src_id {
            engine_bail!(SOURCE, "copy_resource: source and destination are both {}", src_id);
        }

        let mut heap = self.heap.borrow_mut();
        let source = heap
            .surfaces
            .get(&src_id)
            .ok_or_else(|| engine_err!(SOURCE, "copy_resource: unknown source {}", src_id))?;
        let destination = heap
            .surfaces
            .get(&dst_id)
            .ok_or_else(|| engine_err!(SOURCE, "copy_resource: unknown destination {}", dst_id))?;
        if !destination.same_shape(source) {
            engine_bail!(
                SOURCE,
                "copy_resource: shape mismatch ({} -> {})",
                source.desc,
                destination.desc
            );
        }

        let subresources = source.subresources.clone();
        if let Some(destination) = heap.surfaces.get_mut(&dst_id) {
            destination.subresources = subresources;
        }
        Ok(())
    }

    fn map(&mut self, resource: &dyn Resource, subresource: u32) -> Result<MappedSubresource<'_>> {
        let id = resource.id();
        if let Some(mapping) = &self.mapping {
            engine_bail!(
                SOURCE,
                "map: subresource {} of {} is already mapped",
                mapping.subresource,
                mapping.resource
            );
        }

        let heap = self.heap.borrow();
        let surface = heap
            .surfaces
            .get(&id)
            .ok_or_else(|| engine_err!(SOURCE, "map: unknown resource {}", id))?;
        if surface.kind != TargetKind::Stage {
            engine_bail!(SOURCE, "map: resource {} is a {} target, only stage targets can be mapped", id, surface.kind);
        }
        let desc = surface.desc;
        let (mip_level, _) = desc.subresource_location(subresource).ok_or_else(|| {
            engine_err!(SOURCE, "map: subresource {} out of range for {}", subresource, desc)
        })?;

        let row_size = desc.row_size(mip_level);
        let (_, height) = desc.mip_extent(mip_level);
        let row_pitch = align_row(row_size);
        let mut data = vec![0u8; row_pitch * height as usize];
        let packed = &surface.subresources[subresource as usize];
        for (row, chunk) in packed.chunks(row_size).enumerate() {
            let start = row * row_pitch;
            data[start..start + row_size].copy_from_slice(chunk);
        }
        drop(heap);

        let mapping = self.mapping.insert(Mapping {
            resource: id,
            subresource,
            row_pitch: row_pitch as u32,
            data,
        });
        Ok(MappedSubresource {
            data: &mapping.data,
            row_pitch: mapping.row_pitch,
            depth_pitch: mapping.data.len() as u32,
        })
    }

    fn unmap(&mut self, resource: &dyn Resource, subresource: u32) {
        let mapped = self
            .mapping
            .as_ref()
            .is_some_and(|mapping| mapping.resource == resource.id() && mapping.subresource == subresource);
        if mapped {
            self.mapping = None;
        } else {
            engine_warn!(SOURCE, "unmap: subresource {} of {} is not mapped", subresource, resource.id());
        }
    }
}

fn surface_mut(
    surfaces: &mut rustc_hash::FxHashMap<ResourceId, Surface>,
    id: ResourceId,
) -> Result<&mut Surface> {
    surfaces
        .get_mut(&id)
        .ok_or_else(|| engine_err!(SOURCE, "Unknown resource {}", id))
}

fn align_row(row_size: usize) -> usize {
    let alignment = MAP_ROW_ALIGNMENT as usize;
    row_size.div_ceil(alignment) * alignment
}

/// Fill mip 0 of one slice (or every slice) with a repeated pixel
fn fill_slices(surface: &mut Surface, slice: Option<u32>, pixel: &[u8]) -> Result<()> {
    let desc = surface.desc;
    let slices = match slice {
        Some(slice) if slice >= desc.count => {
            engine_bail!(SOURCE, "Slice {} out of range for {}", slice, desc);
        }
        Some(slice) => slice..slice + 1,
        None => 0..desc.count,
    };
    for slice in slices {
        let sub = desc.subresource(0, slice) as usize;
        for texel in surface.subresources[sub].chunks_exact_mut(pixel.len()) {
            texel.copy_from_slice(pixel);
        }
    }
    Ok(())
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Bytes of one texel of `format` holding `rgba`
///
/// sRGB formats store the given values without conversion.
fn encode_color(format: TargetFormat, rgba: [f32; 4]) -> Vec<u8> {
    let [r, g, b, a] = rgba;
    match format {
        TargetFormat::R8_UNORM => vec![unorm8(r)],
        TargetFormat::R8G8B8A8_UNORM | TargetFormat::R8G8B8A8_SRGB => {
            vec![unorm8(r), unorm8(g), unorm8(b), unorm8(a)]
        }
        TargetFormat::B8G8R8A8_UNORM | TargetFormat::B8G8R8A8_SRGB => {
            vec![unorm8(b), unorm8(g), unorm8(r), unorm8(a)]
        }
        TargetFormat::R32_FLOAT => bytemuck::bytes_of(&r).to_vec(),
        TargetFormat::R32G32_FLOAT => bytemuck::cast_slice::<f32, u8>(&[r, g]).to_vec(),
        TargetFormat::R32G32B32A32_FLOAT => bytemuck::cast_slice::<f32, u8>(&rgba).to_vec(),
        TargetFormat::D16_UNORM | TargetFormat::D32_FLOAT | TargetFormat::D24_UNORM_S8_UINT => {
            encode_depth(format, r, 0)
        }
    }
}

/// Bytes of one texel of a depth(-stencil) format
fn encode_depth(format: TargetFormat, depth: f32, stencil: u8) -> Vec<u8> {
    let depth = depth.clamp(0.0, 1.0);
    match format {
        TargetFormat::D16_UNORM => bytemuck::bytes_of(&((depth * 65535.0 + 0.5) as u16)).to_vec(),
        TargetFormat::D24_UNORM_S8_UINT => {
            let packed = ((depth * 16_777_215.0 + 0.5) as u32) | ((stencil as u32) << 24);
            bytemuck::bytes_of(&packed).to_vec()
        }
        TargetFormat::D32_FLOAT => bytemuck::bytes_of(&depth).to_vec(),
        color => encode_color(color, [depth; 4]),
    }
}

#[cfg(test)]
#[path = "memory_context_tests.rs"]
mod tests;
