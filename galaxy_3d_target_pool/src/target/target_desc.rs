/// Target descriptor - the exact-match key of the target pool
///
/// Two descriptors match only when every field is equal, including the
/// auto-generate-mips flag stored in the top bit of `mip_levels`.

use std::fmt;
use crate::device::{SampleDesc, TargetFormat};

/// Flag in `TargetDesc::mip_levels` requesting automatic mip generation
pub const AUTO_GENERATE_MIPS: u32 = 1 << 31;

/// Descriptor of a pooled texture target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Mip level count (0 = full chain); set `AUTO_GENERATE_MIPS` for auto-generation
    pub mip_levels: u32,
    /// Pixel format
    pub format: TargetFormat,
    /// Multisampling options
    pub samples: SampleDesc,
    /// Number of texture array elements
    pub count: u32,
}

impl TargetDesc {
    /// Create a descriptor from all of its fields
    pub fn new(
        width: u32,
        height: u32,
        mip_levels: u32,
        format: TargetFormat,
        samples: SampleDesc,
        count: u32,
    ) -> Self {
        Self {
            width,
            height,
            mip_levels,
            format,
            samples,
            count,
        }
    }

    /// Single-mip, single-sample, single-slice descriptor
    pub fn simple(width: u32, height: u32, format: TargetFormat) -> Self {
        Self::new(width, height, 1, format, SampleDesc::default(), 1)
    }

    /// Copy of this descriptor with the auto-generate-mips flag set
    pub fn with_auto_mips(self) -> Self {
        Self {
            mip_levels: self.mip_levels | AUTO_GENERATE_MIPS,
            ..self
        }
    }

    /// Copy of this descriptor with `count` array elements
    pub fn with_count(self, count: u32) -> Self {
        Self { count, ..self }
    }

    /// Copy of this descriptor with the given multisampling options
    pub fn with_samples(self, samples: SampleDesc) -> Self {
        Self { samples, ..self }
    }

    /// Requested mip level count without the auto-generation flag
    pub fn mip_level_count(&self) -> u32 {
        self.mip_levels & !AUTO_GENERATE_MIPS
    }

    /// Whether mips are generated automatically
    pub fn auto_generate_mips(&self) -> bool {
        self.mip_levels & AUTO_GENERATE_MIPS != 0
    }

    /// Length of the complete mip chain for this size
    pub fn full_mip_chain(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Actual number of mip levels (a requested count of 0 means the full chain)
    pub fn resolved_mip_levels(&self) -> u32 {
        match self.mip_level_count() {
            0 => self.full_mip_chain(),
            n => n,
        }
    }

    /// Size in pixels of the given mip level
    pub fn mip_extent(&self, level: u32) -> (u32, u32) {
        let shift = level.min(31);
        ((self.width >> shift).max(1), (self.height >> shift).max(1))
    }

    /// Number of subresources (mip levels x array elements)
    pub fn subresource_count(&self) -> u32 {
        self.resolved_mip_levels().saturating_mul(self.count)
    }

    /// Subresource index of a mip level within an array slice
    pub fn subresource(&self, mip_level: u32, slice: u32) -> u32 {
        mip_level + slice * self.resolved_mip_levels()
    }

    /// `(mip_level, slice)` of a subresource index, or None if out of range
    pub fn subresource_location(&self, subresource: u32) -> Option<(u32, u32)> {
        if subresource >= self.subresource_count() {
            return None;
        }
        let mips = self.resolved_mip_levels();
        Some((subresource % mips, subresource / mips))
    }

    /// Tightly packed byte size of one row of the given mip level
    pub fn row_size(&self, mip_level: u32) -> usize {
        let (width, _) = self.mip_extent(mip_level);
        width as usize * self.format.bytes_per_pixel() as usize
    }

    /// Tightly packed byte size of a subresource, or None if out of range
    pub fn subresource_size(&self, subresource: u32) -> Option<usize> {
        let (mip_level, _) = self.subresource_location(subresource)?;
        let (_, height) = self.mip_extent(mip_level);
        Some(self.row_size(mip_level) * height as usize)
    }
}

impl fmt::Display for TargetDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {:?} mips={}{} samples={} count={}",
            self.width,
            self.height,
            self.format,
            self.mip_level_count(),
            if self.auto_generate_mips() { "(auto)" } else { "" },
            self.samples,
            self.count
        )
    }
}

#[cfg(test)]
#[path = "target_desc_tests.rs"]
mod tests;
