//! TAA render pipeline and bind group layout creation.
//!
//! The WGSL module is supplied by the engine. It must export `vs_main`
//! (fullscreen triangle), one resolve fragment entry point per quality tier
//! and the history-copy entry point, all in pass-index order.

use std::collections::HashMap;

use openreality_gpu_shared::uniforms::TaaResolveUniforms;
use openreality_taa::{TaaQuality, HISTORY_COPY_PASS};

use crate::render_targets;

/// Fragment entry points indexed by shader pass index.
pub const PASS_ENTRY_POINTS: [&str; TaaQuality::COUNT + 1] = [
    "fs_resolve_very_low",
    "fs_resolve_low",
    "fs_resolve_medium",
    "fs_resolve_high",
    "fs_resolve_very_high",
    "fs_copy_history",
];

fn fullscreen_vertex_state(module: &wgpu::ShaderModule) -> wgpu::VertexState<'_> {
    wgpu::VertexState {
        module,
        entry_point: Some("vs_main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        buffers: &[],
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

/// TAA resolve bind group layout:
///   0: uniform TaaResolveUniforms
///   1: texture_2d<f32>  (current color)
///   2: texture_2d<f32>  (history)
///   3: texture_2d<f32>  (motion vectors)
///   4: texture_depth_2d (depth)
///   5: sampler           (color sampler)
///   6: sampler           (depth sampler)
pub fn create_taa_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let float = wgpu::TextureSampleType::Float { filterable: true };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("TAA BGL"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<TaaResolveUniforms>() as u64,
                    ),
                },
                count: None,
            },
            texture_entry(1, float),
            texture_entry(2, float),
            texture_entry(3, float),
            texture_entry(4, wgpu::TextureSampleType::Depth),
            sampler_entry(5, wgpu::SamplerBindingType::Filtering),
            sampler_entry(6, wgpu::SamplerBindingType::NonFiltering),
        ],
    })
}

/// History copy bind group layout:
///   0: texture_2d<f32> (resolved frame)
///   1: sampler
pub fn create_history_copy_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("TAA History Copy BGL"),
        entries: &[
            texture_entry(0, wgpu::TextureSampleType::Float { filterable: true }),
            sampler_entry(1, wgpu::SamplerBindingType::Filtering),
        ],
    })
}

/// Create a fullscreen pipeline for one entry point of the TAA module.
pub fn create_fullscreen_effect_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    frag_entry: &str,
    bgl: &wgpu::BindGroupLayout,
    output_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Layout")),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: fullscreen_vertex_state(module),
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(frag_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: output_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Pipelines, layouts and shared inputs of the TAA passes.
pub struct TaaResources {
    pub shader: wgpu::ShaderModule,
    pub taa_bgl: wgpu::BindGroupLayout,
    pub copy_bgl: wgpu::BindGroupLayout,
    /// Resolve pipelines indexed by quality pass index.
    pub resolve_pipelines: Vec<wgpu::RenderPipeline>,
    /// History copy pipelines keyed by accumulation format.
    copy_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    pub output_format: wgpu::TextureFormat,
    /// One uniform buffer per eye so both eyes can be recorded before submit.
    pub params_buffers: [wgpu::Buffer; 2],
    pub linear_sampler: wgpu::Sampler,
    pub point_sampler: wgpu::Sampler,
    pub zero_motion_texture: wgpu::Texture,
    pub zero_motion_view: wgpu::TextureView,
}

impl TaaResources {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shader: wgpu::ShaderModule,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let taa_bgl = create_taa_bind_group_layout(device);
        let copy_bgl = create_history_copy_bind_group_layout(device);

        let resolve_pipelines = PASS_ENTRY_POINTS[..HISTORY_COPY_PASS]
            .iter()
            .map(|entry| {
                create_fullscreen_effect_pipeline(
                    device,
                    &format!("TAA Resolve ({entry})"),
                    &shader,
                    entry,
                    &taa_bgl,
                    output_format,
                )
            })
            .collect();

        let params_buffers = [0, 1].map(|eye| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("TAA Params Eye {eye}")),
                size: std::mem::size_of::<TaaResolveUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("TAA Linear Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let point_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("TAA Point Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let (zero_motion_texture, zero_motion_view) =
            render_targets::create_zero_motion_texture(device, queue);

        Self {
            shader,
            taa_bgl,
            copy_bgl,
            resolve_pipelines,
            copy_pipelines: HashMap::new(),
            output_format,
            params_buffers,
            linear_sampler,
            point_sampler,
            zero_motion_texture,
            zero_motion_view,
        }
    }

    pub fn resolve_pipeline(&self, pass_index: usize) -> Option<&wgpu::RenderPipeline> {
        self.resolve_pipelines.get(pass_index)
    }

    /// History copy pipeline writing `format`, built on first use.
    pub fn copy_pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let Self {
            copy_pipelines,
            shader,
            copy_bgl,
            ..
        } = self;
        copy_pipelines.entry(format).or_insert_with(|| {
            log::info!("Creating TAA history copy pipeline for {format:?}");
            create_fullscreen_effect_pipeline(
                device,
                "TAA History Copy",
                shader,
                PASS_ENTRY_POINTS[HISTORY_COPY_PASS],
                copy_bgl,
                format,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_follow_pass_indices() {
        assert_eq!(PASS_ENTRY_POINTS.len(), HISTORY_COPY_PASS + 1);
        assert_eq!(PASS_ENTRY_POINTS[TaaQuality::VeryLow.pass_index()], "fs_resolve_very_low");
        assert_eq!(PASS_ENTRY_POINTS[TaaQuality::VeryHigh.pass_index()], "fs_resolve_very_high");
        assert_eq!(PASS_ENTRY_POINTS[HISTORY_COPY_PASS], "fs_copy_history");
    }
}
