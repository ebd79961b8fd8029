//! Render target creation for the TAA accumulation history and the
//! zero-motion fallback texture.

use openreality_taa::{ImageDescriptor, PixelFormat, TextureDimension};

/// Motion vector format (RG16F velocity buffer).
pub const MOTION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// Map a core pixel format onto wgpu. `PixelFormat::None` has no counterpart.
pub fn to_wgpu_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
    Some(match format {
        PixelFormat::None => return None,
        PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        PixelFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        PixelFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        PixelFormat::Rgb10a2Unorm => wgpu::TextureFormat::Rgb10a2Unorm,
        PixelFormat::Rg11b10Ufloat => wgpu::TextureFormat::Rg11b10Ufloat,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
    })
}

/// Inverse of [`to_wgpu_format`]; formats TAA never uses map to `None`.
pub fn from_wgpu_format(format: wgpu::TextureFormat) -> PixelFormat {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => PixelFormat::Rgba8Unorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => PixelFormat::Rgba8UnormSrgb,
        wgpu::TextureFormat::Bgra8Unorm => PixelFormat::Bgra8Unorm,
        wgpu::TextureFormat::Bgra8UnormSrgb => PixelFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgb10a2Unorm => PixelFormat::Rgb10a2Unorm,
        wgpu::TextureFormat::Rg11b10Ufloat => PixelFormat::Rg11b10Ufloat,
        wgpu::TextureFormat::Rgba16Float => PixelFormat::Rgba16Float,
        wgpu::TextureFormat::Rgba32Float => PixelFormat::Rgba32Float,
        _ => PixelFormat::None,
    }
}

/// Describe a wgpu camera color texture for the history store.
pub fn camera_descriptor(texture: &wgpu::Texture, stereo_layers: u32) -> ImageDescriptor {
    let format = from_wgpu_format(texture.format());
    ImageDescriptor {
        width: texture.width() as i32,
        height: texture.height() as i32,
        format,
        msaa_samples: texture.sample_count(),
        volume_depth: stereo_layers.max(1),
        mip_count: texture.mip_level_count(),
        srgb: format.is_srgb(),
        dimension: if stereo_layers > 1 {
            TextureDimension::D2Array
        } else {
            TextureDimension::D2
        },
        ..ImageDescriptor::default()
    }
}

/// One accumulation texture. Array layers are used for single-pass stereo.
pub struct AccumulationTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

impl AccumulationTarget {
    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.layers,
        }
    }
}

/// Create an accumulation texture from a canonical descriptor.
pub fn create_accumulation_target(
    device: &wgpu::Device,
    desc: &ImageDescriptor,
    label: &str,
) -> Option<AccumulationTarget> {
    let format = to_wgpu_format(desc.format)?;
    let width = desc.width.max(1) as u32;
    let height = desc.height.max(1) as u32;
    let layers = desc.volume_depth.max(1);

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(view_dimension(desc.dimension, layers)),
        ..Default::default()
    });

    Some(AccumulationTarget {
        texture,
        view,
        format,
        width,
        height,
        layers,
    })
}

pub fn view_dimension(dimension: TextureDimension, layers: u32) -> wgpu::TextureViewDimension {
    match dimension {
        TextureDimension::D2Array => wgpu::TextureViewDimension::D2Array,
        _ if layers > 1 => wgpu::TextureViewDimension::D2Array,
        _ => wgpu::TextureViewDimension::D2,
    }
}

/// Create a 1x1 zero motion texture, bound when a frame is rendered again.
pub fn create_zero_motion_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("TAA Zero Motion 1x1"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: MOTION_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    // Two f16 zeros.
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[0u8; 4],
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openreality_taa::ACCUMULATION_FORMATS;

    #[test]
    fn test_format_mapping_round_trips_accumulation_formats() {
        for format in ACCUMULATION_FORMATS {
            let wgpu_format = to_wgpu_format(format).unwrap();
            assert_eq!(from_wgpu_format(wgpu_format), format);
        }
        assert_eq!(to_wgpu_format(PixelFormat::None), None);
        assert_eq!(
            from_wgpu_format(wgpu::TextureFormat::Depth32Float),
            PixelFormat::None
        );
    }

    #[test]
    fn test_srgb_formats_keep_their_encoding() {
        assert_eq!(
            to_wgpu_format(PixelFormat::Rgba8UnormSrgb),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(
            to_wgpu_format(PixelFormat::Rgba8UnormSrgb.remove_srgb_suffix()),
            Some(wgpu::TextureFormat::Rgba8Unorm)
        );
    }

    #[test]
    fn test_view_dimension_follows_layers() {
        assert_eq!(
            view_dimension(TextureDimension::D2, 1),
            wgpu::TextureViewDimension::D2
        );
        assert_eq!(
            view_dimension(TextureDimension::D2, 2),
            wgpu::TextureViewDimension::D2Array
        );
        assert_eq!(
            view_dimension(TextureDimension::D2Array, 1),
            wgpu::TextureViewDimension::D2Array
        );
    }
}
