//! wgpu device state for TAA: format capabilities and accumulation texture
//! allocation through the handle store.

use openreality_taa::{
    FormatSupport, ImageAllocator, ImageDescriptor, ImageHandle, PixelFormat, TaaError, TaaResult,
    ACCUMULATION_FORMATS,
};

use crate::handle::HandleStore;
use crate::pipeline::TaaResources;
use crate::render_targets::{self, AccumulationTarget};

/// Formats whose render support is probed at startup.
const PROBED_FORMATS: [PixelFormat; 8] = [
    PixelFormat::Rgba8Unorm,
    PixelFormat::Rgba8UnormSrgb,
    PixelFormat::Bgra8Unorm,
    PixelFormat::Bgra8UnormSrgb,
    PixelFormat::Rgb10a2Unorm,
    PixelFormat::Rg11b10Ufloat,
    PixelFormat::Rgba16Float,
    PixelFormat::Rgba32Float,
];

fn effective_format_features(
    format: wgpu::TextureFormat,
    device_features: wgpu::Features,
    adapter: Option<&wgpu::Adapter>,
) -> wgpu::TextureFormatFeatures {
    if device_features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
        if let Some(adapter) = adapter {
            return adapter.get_texture_format_features(format);
        }
    }
    format.guaranteed_format_features(device_features)
}

/// Render-attachment support per pixel format, queried once per device.
#[derive(Clone, Debug, Default)]
pub struct FormatCaps {
    renderable: Vec<PixelFormat>,
}

impl FormatCaps {
    pub fn query(device_features: wgpu::Features, adapter: Option<&wgpu::Adapter>) -> Self {
        let renderable = PROBED_FORMATS
            .into_iter()
            .filter(|&format| {
                render_targets::to_wgpu_format(format).is_some_and(|f| {
                    let features = effective_format_features(f, device_features, adapter);
                    features
                        .allowed_usages
                        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
                })
            })
            .collect::<Vec<_>>();
        log::info!("TAA renderable formats: {renderable:?}");
        Self { renderable }
    }

    /// Capabilities from an explicit list, for hosts that already know them.
    pub fn from_formats(renderable: impl IntoIterator<Item = PixelFormat>) -> Self {
        Self {
            renderable: renderable.into_iter().collect(),
        }
    }

    pub fn has_accumulation_format(&self) -> bool {
        ACCUMULATION_FORMATS.iter().any(|f| self.renderable.contains(f))
    }
}

impl FormatSupport for FormatCaps {
    fn is_render_format_supported(&self, format: PixelFormat) -> bool {
        self.renderable.contains(&format)
    }
}

/// Borrowed allocator view over the device and the accumulation textures.
pub struct WgpuHistoryHost<'a> {
    pub device: &'a wgpu::Device,
    pub caps: &'a FormatCaps,
    pub targets: &'a mut HandleStore<AccumulationTarget>,
}

impl FormatSupport for WgpuHistoryHost<'_> {
    fn is_render_format_supported(&self, format: PixelFormat) -> bool {
        self.caps.is_render_format_supported(format)
    }
}

impl ImageAllocator for WgpuHistoryHost<'_> {
    fn allocate(&mut self, desc: &ImageDescriptor, name: &str) -> TaaResult<ImageHandle> {
        let limits = self.device.limits();
        check_limits(desc, &limits)?;

        let target = render_targets::create_accumulation_target(self.device, desc, name)
            .ok_or_else(|| TaaError::allocation(format!("{name}: no wgpu format for {:?}", desc.format)))?;
        log::debug!(
            "Created {name} ({}x{}x{} {:?})",
            target.width,
            target.height,
            target.layers,
            target.format
        );
        Ok(ImageHandle(self.targets.insert(target)))
    }

    fn release(&mut self, handle: ImageHandle) {
        match self.targets.remove(handle.0) {
            Some(target) => target.texture.destroy(),
            None => log::warn!("Release of unknown accumulation texture {}", handle.0),
        }
    }
}

fn check_limits(desc: &ImageDescriptor, limits: &wgpu::Limits) -> TaaResult<()> {
    let max = limits.max_texture_dimension_2d as i32;
    if desc.width > max || desc.height > max {
        return Err(TaaError::allocation(format!(
            "{}x{} exceeds max texture dimension {max}",
            desc.width, desc.height
        )));
    }
    if desc.volume_depth > limits.max_texture_array_layers {
        return Err(TaaError::allocation(format!(
            "{} layers exceeds max array layers {}",
            desc.volume_depth, limits.max_texture_array_layers
        )));
    }
    Ok(())
}

/// TAA state for one wgpu device.
pub struct WgpuTaaBackend {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub caps: FormatCaps,
    pub targets: HandleStore<AccumulationTarget>,
    pub resources: TaaResources,
}

impl WgpuTaaBackend {
    /// `shader` must provide the resolve and history-copy entry points named
    /// in [`crate::pipeline`]; `output_format` is the resolve destination format.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter: Option<&wgpu::Adapter>,
        shader: wgpu::ShaderModule,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self, String> {
        let caps = FormatCaps::query(device.features(), adapter);
        if !caps.has_accumulation_format() {
            return Err("device cannot render to any TAA accumulation format".into());
        }

        log::info!("Creating TAA pipelines for {output_format:?}...");
        let resources = TaaResources::new(&device, &queue, shader, output_format);
        log::info!("TAA backend ready");

        Ok(Self {
            device,
            queue,
            caps,
            targets: HandleStore::new(),
            resources,
        })
    }

    pub fn history_host(&mut self) -> WgpuHistoryHost<'_> {
        WgpuHistoryHost {
            device: &self.device,
            caps: &self.caps,
            targets: &mut self.targets,
        }
    }

    pub fn target(&self, handle: ImageHandle) -> Option<&AccumulationTarget> {
        self.targets.get(handle.0)
    }
}
