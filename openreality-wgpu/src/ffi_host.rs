//! History image allocation through engine-supplied C callbacks.
//!
//! The scripting host owns its render textures; it registers callbacks once
//! with `or_taa_host_create` and passes the returned handle to `or_taa_update`.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use openreality_taa::{
    FormatSupport, ImageAllocator, ImageDescriptor, ImageHandle, PixelFormat, TaaError, TaaResult,
    TextureDimension, VrUsage,
};

/// Image shape across the C ABI. `format` uses [`PixelFormat::code`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrTaaImageDesc {
    pub width: i32,
    pub height: i32,
    pub format: i32,
    pub msaa_samples: u32,
    pub volume_depth: u32,
    pub mip_count: u32,
    pub srgb: i32,
    pub depth_buffer_bits: u32,
    /// 0: 2D, 1: 2D array, 2: 3D, 3: cube.
    pub dimension: i32,
    /// 0: none, 1: one eye, 2: two eyes, 3: device specific.
    pub vr_usage: i32,
}

impl OrTaaImageDesc {
    /// `None` when the format, dimension or VR usage code is unknown.
    pub fn to_descriptor(&self) -> Option<ImageDescriptor> {
        Some(ImageDescriptor {
            width: self.width,
            height: self.height,
            format: PixelFormat::from_code(self.format)?,
            msaa_samples: self.msaa_samples.max(1),
            volume_depth: self.volume_depth.max(1),
            mip_count: self.mip_count,
            srgb: self.srgb != 0,
            depth_buffer_bits: self.depth_buffer_bits,
            dimension: match self.dimension {
                0 => TextureDimension::D2,
                1 => TextureDimension::D2Array,
                2 => TextureDimension::D3,
                3 => TextureDimension::Cube,
                _ => return None,
            },
            vr_usage: match self.vr_usage {
                0 => VrUsage::None,
                1 => VrUsage::OneEye,
                2 => VrUsage::TwoEyes,
                3 => VrUsage::DeviceSpecific,
                _ => return None,
            },
            ..ImageDescriptor::default()
        })
    }

    pub fn from_descriptor(desc: &ImageDescriptor) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format.code() as i32,
            msaa_samples: desc.msaa_samples,
            volume_depth: desc.volume_depth,
            mip_count: desc.mip_count,
            srgb: desc.srgb as i32,
            depth_buffer_bits: desc.depth_buffer_bits,
            dimension: match desc.dimension {
                TextureDimension::D2 => 0,
                TextureDimension::D2Array => 1,
                TextureDimension::D3 => 2,
                TextureDimension::Cube => 3,
            },
            vr_usage: match desc.vr_usage {
                VrUsage::None => 0,
                VrUsage::OneEye => 1,
                VrUsage::TwoEyes => 2,
                VrUsage::DeviceSpecific => 3,
            },
        }
    }
}

/// Engine callbacks. `allocate` returns 0 on failure. Callbacks must not
/// call back into `or_taa_*`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OrTaaHostCallbacks {
    pub user_data: *mut c_void,
    pub is_format_supported: Option<extern "C" fn(*mut c_void, i32) -> i32>,
    pub allocate: Option<extern "C" fn(*mut c_void, *const OrTaaImageDesc, *const c_char) -> u64>,
    pub release: Option<extern "C" fn(*mut c_void, u64)>,
}

type SupportedFn = extern "C" fn(*mut c_void, i32) -> i32;
type AllocateFn = extern "C" fn(*mut c_void, *const OrTaaImageDesc, *const c_char) -> u64;
type ReleaseFn = extern "C" fn(*mut c_void, u64);

/// Validated callback set, stored in the host handle store.
pub struct FfiHost {
    user_data: *mut c_void,
    is_format_supported: SupportedFn,
    allocate: AllocateFn,
    release: ReleaseFn,
}

// The engine guarantees `user_data` may be used from whichever thread calls
// `or_taa_*`; all access is serialised by the store mutex.
unsafe impl Send for FfiHost {}

impl FfiHost {
    /// `None` if any callback is missing.
    pub fn new(callbacks: &OrTaaHostCallbacks) -> Option<Self> {
        Some(Self {
            user_data: callbacks.user_data,
            is_format_supported: callbacks.is_format_supported?,
            allocate: callbacks.allocate?,
            release: callbacks.release?,
        })
    }
}

impl FormatSupport for FfiHost {
    fn is_render_format_supported(&self, format: PixelFormat) -> bool {
        !format.is_none() && (self.is_format_supported)(self.user_data, format.code() as i32) != 0
    }
}

impl ImageAllocator for FfiHost {
    fn allocate(&mut self, desc: &ImageDescriptor, name: &str) -> TaaResult<ImageHandle> {
        let label = CString::new(name).map_err(|e| TaaError::allocation(e.to_string()))?;
        let raw = OrTaaImageDesc::from_descriptor(desc);
        match (self.allocate)(self.user_data, &raw, label.as_ptr()) {
            0 => Err(TaaError::allocation(format!("host returned no image for {name}"))),
            handle => Ok(ImageHandle(handle)),
        }
    }

    fn release(&mut self, handle: ImageHandle) {
        (self.release)(self.user_data, handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_conversion_round_trips() {
        let desc = ImageDescriptor {
            volume_depth: 2,
            dimension: TextureDimension::D2Array,
            vr_usage: VrUsage::TwoEyes,
            ..ImageDescriptor::color_2d(1280, 720, PixelFormat::Rgba8UnormSrgb)
        };
        let raw = OrTaaImageDesc::from_descriptor(&desc);
        assert_eq!(raw.format, 2);
        assert_eq!(raw.srgb, 1);
        assert_eq!(raw.to_descriptor(), Some(desc));
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        let base = OrTaaImageDesc::from_descriptor(&ImageDescriptor::color_2d(
            64,
            64,
            PixelFormat::Rgba16Float,
        ));
        assert!(OrTaaImageDesc { format: 42, ..base }.to_descriptor().is_none());
        assert!(OrTaaImageDesc { dimension: 9, ..base }.to_descriptor().is_none());
        assert!(OrTaaImageDesc { vr_usage: -1, ..base }.to_descriptor().is_none());
    }

    #[test]
    fn test_missing_callback_is_rejected() {
        let callbacks = OrTaaHostCallbacks {
            user_data: std::ptr::null_mut(),
            is_format_supported: None,
            allocate: None,
            release: None,
        };
        assert!(FfiHost::new(&callbacks).is_none());
    }
}
