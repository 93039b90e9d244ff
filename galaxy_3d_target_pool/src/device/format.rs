/// Pixel formats and multisampling options for pooled targets

use std::fmt;

/// Pixel format of a texture target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TargetFormat {
    // Color formats
    R8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R32_FLOAT,
    R32G32_FLOAT,
    R32G32B32A32_FLOAT,

    // Depth/stencil formats
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

impl TargetFormat {
    /// Returns size in bytes of one texel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TargetFormat::R8_UNORM => 1,
            TargetFormat::D16_UNORM => 2,
            TargetFormat::R8G8B8A8_UNORM
            | TargetFormat::R8G8B8A8_SRGB
            | TargetFormat::B8G8R8A8_UNORM
            | TargetFormat::B8G8R8A8_SRGB
            | TargetFormat::R32_FLOAT
            | TargetFormat::D32_FLOAT
            | TargetFormat::D24_UNORM_S8_UINT => 4,
            TargetFormat::R32G32_FLOAT => 8,
            TargetFormat::R32G32B32A32_FLOAT => 16,
        }
    }

    /// Returns true for formats usable only as depth/stencil attachments
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            TargetFormat::D16_UNORM | TargetFormat::D32_FLOAT | TargetFormat::D24_UNORM_S8_UINT
        )
    }
}

/// Multisampling options (sample count + quality level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleDesc {
    /// Samples per pixel (1 = no multisampling)
    pub count: u32,
    /// Vendor-specific quality level
    pub quality: u32,
}

impl SampleDesc {
    /// Multisampling with the given count and quality
    pub fn new(count: u32, quality: u32) -> Self {
        Self { count, quality }
    }

    /// Returns true if more than one sample per pixel is stored
    pub fn is_multisampled(&self) -> bool {
        self.count > 1
    }
}

impl Default for SampleDesc {
    fn default() -> Self {
        Self { count: 1, quality: 0 }
    }
}

impl fmt::Display for SampleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x(q{})", self.count, self.quality)
    }
}
