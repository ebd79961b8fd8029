//! Image descriptors, canonical accumulation descriptors and their fingerprints.

use xxhash_rust::xxh3::Xxh3;

use crate::format::{select_accumulation_format, PixelFormat};
use crate::host::FormatSupport;

const XXH3_SEED: u64 = 0x4f52_5441_4148_4953;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    #[default]
    D2,
    D2Array,
    D3,
    Cube,
}

/// How an image is used by an XR device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VrUsage {
    #[default]
    None,
    OneEye,
    TwoEyes,
    DeviceSpecific,
}

/// Shape and usage of a render image, as supplied by the camera.
///
/// Width and height are signed because the camera may hand over a not-yet-
/// sized target; such descriptors are treated as "not ready".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: i32,
    pub height: i32,
    pub format: PixelFormat,
    pub msaa_samples: u32,
    /// Array layers (or depth for 3D images).
    pub volume_depth: u32,
    pub mip_count: u32,
    pub srgb: bool,
    pub depth_buffer_bits: u32,
    pub dimension: TextureDimension,
    pub vr_usage: VrUsage,
    pub memoryless: bool,
    pub use_mip_map: bool,
    pub auto_generate_mips: bool,
    pub enable_random_write: bool,
    pub bind_ms: bool,
    pub use_dynamic_scale: bool,
}

impl Default for ImageDescriptor {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::None,
            msaa_samples: 1,
            volume_depth: 1,
            mip_count: 0,
            srgb: false,
            depth_buffer_bits: 0,
            dimension: TextureDimension::D2,
            vr_usage: VrUsage::None,
            memoryless: false,
            use_mip_map: false,
            auto_generate_mips: false,
            enable_random_write: false,
            bind_ms: false,
            use_dynamic_scale: false,
        }
    }
}

impl ImageDescriptor {
    /// Plain 2D color target.
    pub fn color_2d(width: i32, height: i32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            srgb: format.is_srgb(),
            ..Self::default()
        }
    }

    /// True once the camera target has a size and a format.
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.format.is_none()
    }

    pub fn fingerprint(&self) -> DescriptorFingerprint {
        let mut h = StableHasher::new();
        h.write_i32(self.width);
        h.write_i32(self.height);
        h.write_u8(self.format.code());
        h.write_u32(self.msaa_samples);
        h.write_u32(self.volume_depth);
        h.write_u8(match self.dimension {
            TextureDimension::D2 => 0,
            TextureDimension::D2Array => 1,
            TextureDimension::D3 => 2,
            TextureDimension::Cube => 3,
        });
        h.write_u8(match self.vr_usage {
            VrUsage::None => 0,
            VrUsage::OneEye => 1,
            VrUsage::TwoEyes => 2,
            VrUsage::DeviceSpecific => 3,
        });
        h.finish()
    }
}

/// Derive the accumulation-buffer descriptor from the camera target.
///
/// Single sample, no mips, linear color, no depth, no memoryless or dynamic
/// scaling. Size, array depth, dimension and VR usage are kept. If the
/// resulting format cannot be rendered to, the fallback list is consulted; the
/// returned format is [`PixelFormat::None`] when nothing fits.
pub fn accumulation_descriptor(
    camera: &ImageDescriptor,
    support: &impl FormatSupport,
) -> ImageDescriptor {
    let linear = camera.format.remove_srgb_suffix();
    ImageDescriptor {
        width: camera.width,
        height: camera.height,
        format: select_accumulation_format(linear, support),
        msaa_samples: 1,
        volume_depth: camera.volume_depth,
        mip_count: 0,
        srgb: false,
        depth_buffer_bits: 0,
        dimension: camera.dimension,
        vr_usage: camera.vr_usage,
        memoryless: false,
        use_mip_map: false,
        auto_generate_mips: false,
        enable_random_write: false,
        bind_ms: false,
        use_dynamic_scale: false,
    }
}

/// Stable hash of an accumulation descriptor's shape. Equal fingerprints mean
/// the existing images can be reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorFingerprint {
    pub hi: u64,
    pub lo: u64,
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> DescriptorFingerprint {
        let v = self.inner.digest128();
        DescriptorFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
