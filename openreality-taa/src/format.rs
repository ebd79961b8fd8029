//! Pixel formats for accumulation targets and the render-format fallback policy.

use crate::host::FormatSupport;

/// Color formats a camera target or accumulation image can use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// No format selected; a descriptor with this format is never allocated.
    #[default]
    None,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgb10a2Unorm,
    Rg11b10Ufloat,
    Rgba16Float,
    Rgba32Float,
}

/// Accumulation formats in order of preference when the requested one cannot
/// be rendered to.
pub const ACCUMULATION_FORMATS: [PixelFormat; 4] = [
    PixelFormat::Rgba16Float,
    PixelFormat::Rg11b10Ufloat,
    PixelFormat::Rgba8Unorm,
    PixelFormat::Bgra8Unorm,
];

impl PixelFormat {
    pub fn is_none(self) -> bool {
        self == PixelFormat::None
    }

    pub fn is_srgb(self) -> bool {
        matches!(self, PixelFormat::Rgba8UnormSrgb | PixelFormat::Bgra8UnormSrgb)
    }

    /// Linear counterpart of an sRGB format; other formats are returned as-is.
    pub fn remove_srgb_suffix(self) -> Self {
        match self {
            PixelFormat::Rgba8UnormSrgb => PixelFormat::Rgba8Unorm,
            PixelFormat::Bgra8UnormSrgb => PixelFormat::Bgra8Unorm,
            other => other,
        }
    }

    /// Formats whose precision is too low for YCoCg history accumulation.
    /// The resolve shader switches to its low-precision path for these.
    pub fn is_low_precision(self) -> bool {
        matches!(
            self,
            PixelFormat::Rg11b10Ufloat | PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Unorm
        )
    }

    /// Stable numeric code, used for fingerprints and across the C ABI.
    pub fn code(self) -> u8 {
        match self {
            PixelFormat::None => 0,
            PixelFormat::Rgba8Unorm => 1,
            PixelFormat::Rgba8UnormSrgb => 2,
            PixelFormat::Bgra8Unorm => 3,
            PixelFormat::Bgra8UnormSrgb => 4,
            PixelFormat::Rgb10a2Unorm => 5,
            PixelFormat::Rg11b10Ufloat => 6,
            PixelFormat::Rgba16Float => 7,
            PixelFormat::Rgba32Float => 8,
        }
    }

    /// Inverse of [`PixelFormat::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => PixelFormat::None,
            1 => PixelFormat::Rgba8Unorm,
            2 => PixelFormat::Rgba8UnormSrgb,
            3 => PixelFormat::Bgra8Unorm,
            4 => PixelFormat::Bgra8UnormSrgb,
            5 => PixelFormat::Rgb10a2Unorm,
            6 => PixelFormat::Rg11b10Ufloat,
            7 => PixelFormat::Rgba16Float,
            8 => PixelFormat::Rgba32Float,
            _ => return None,
        })
    }
}

/// Keep `requested` when the device can render to it, otherwise take the first
/// renderable entry of [`ACCUMULATION_FORMATS`]. Returns [`PixelFormat::None`]
/// when nothing in the list is supported.
pub fn select_accumulation_format(
    requested: PixelFormat,
    support: &impl FormatSupport,
) -> PixelFormat {
    if !requested.is_none() && support.is_render_format_supported(requested) {
        return requested;
    }

    match ACCUMULATION_FORMATS
        .iter()
        .copied()
        .find(|&f| support.is_render_format_supported(f))
    {
        Some(fallback) => {
            log::warn!("TAA accumulation format {requested:?} is not renderable, using {fallback:?}");
            fallback
        }
        None => {
            log::warn!("No renderable TAA accumulation format available (requested {requested:?})");
            PixelFormat::None
        }
    }
}
