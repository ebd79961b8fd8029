//! wgpu implementation of the TAA resolve executor.

use openreality_gpu_shared::uniforms::TaaResolveUniforms;
use openreality_taa::{Eye, ImageHandle, MotionInput, ResolveExecutor, ResolveRequest, HISTORY_COPY_PASS};

use crate::handle::HandleStore;
use crate::passes::taa as taa_pass;
use crate::pipeline::TaaResources;
use crate::render_targets::AccumulationTarget;

/// This frame's camera inputs for one eye.
pub struct FrameTargets<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    pub motion: &'a wgpu::TextureView,
    /// Resolve destination; also the source of the history copy.
    pub output: &'a wgpu::Texture,
    pub output_view: &'a wgpu::TextureView,
}

/// Build the resolve uniforms for a request.
pub fn resolve_uniforms(request: &ResolveRequest, width: u32, height: u32) -> TaaResolveUniforms {
    let (filter_weights, has_filter_weights) = match &request.filter_weights {
        Some(w) => (TaaResolveUniforms::pack_filter_weights(w), 1),
        None => ([[0.0; 4]; 3], 0),
    };
    TaaResolveUniforms {
        filter_weights,
        frame_influence: request.frame_influence,
        variance_clamp_scale: request.variance_clamp_scale,
        mip_bias: request.mip_bias,
        sharpening: request.sharpening,
        low_precision_source: request.low_precision_source as i32,
        has_filter_weights,
        screen_width: width as f32,
        screen_height: height as f32,
    }
}

/// True if the resolved frame can be copied into history without a shader.
pub fn can_raw_copy(output: &wgpu::Texture, history: &AccumulationTarget) -> bool {
    output.format() == history.format
        && output.width() == history.width
        && output.height() == history.height
        && output.usage().contains(wgpu::TextureUsages::COPY_SRC)
}

/// Records TAA work for one camera eye into a caller-owned encoder.
pub struct WgpuTaaResolver<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub resources: &'a mut TaaResources,
    pub targets: &'a HandleStore<AccumulationTarget>,
    pub frame: FrameTargets<'a>,
    eye: Eye,
}

impl<'a> WgpuTaaResolver<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        encoder: &'a mut wgpu::CommandEncoder,
        resources: &'a mut TaaResources,
        targets: &'a HandleStore<AccumulationTarget>,
        frame: FrameTargets<'a>,
    ) -> Self {
        Self {
            device,
            queue,
            encoder,
            resources,
            targets,
            frame,
            eye: Eye::Left,
        }
    }

    fn history_layer(&self, history: &AccumulationTarget) -> u32 {
        (self.eye.index() as u32).min(history.layers - 1)
    }

    fn layer_view(history: &AccumulationTarget, layer: u32) -> wgpu::TextureView {
        history.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("TAA History Layer"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_array_layer: layer,
            array_layer_count: Some(1),
            ..Default::default()
        })
    }
}

impl ResolveExecutor for WgpuTaaResolver<'_> {
    fn resolve(&mut self, request: &ResolveRequest) {
        self.eye = request.eye;
        let Some(history) = self.targets.get(request.accumulation.0) else {
            log::error!("TAA resolve: unknown accumulation texture {}", request.accumulation.0);
            return;
        };
        let Some(pipeline) = self.resources.resolve_pipeline(request.pass_index) else {
            log::error!("TAA resolve: no pipeline for pass {}", request.pass_index);
            return;
        };

        let uniforms = resolve_uniforms(request, self.frame.output.width(), self.frame.output.height());
        let params = &self.resources.params_buffers[request.eye.index()];
        self.queue.write_buffer(params, 0, bytemuck::bytes_of(&uniforms));

        let motion = match request.motion {
            MotionInput::Vectors => self.frame.motion,
            MotionInput::Zero => &self.resources.zero_motion_view,
        };
        let history_view = Self::layer_view(history, self.history_layer(history));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TAA BG"),
            layout: &self.resources.taa_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: params.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(self.frame.color) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&history_view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(motion) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(self.frame.depth) },
                wgpu::BindGroupEntry { binding: 5, resource: wgpu::BindingResource::Sampler(&self.resources.linear_sampler) },
                wgpu::BindGroupEntry { binding: 6, resource: wgpu::BindingResource::Sampler(&self.resources.point_sampler) },
            ],
        });

        taa_pass::render_taa_pass(self.encoder, self.frame.output_view, pipeline, &bind_group);
    }

    fn copy_to_history(&mut self, accumulation: ImageHandle, pass_index: usize) {
        if pass_index != HISTORY_COPY_PASS {
            log::warn!("TAA history copy requested with pass {pass_index}, using {HISTORY_COPY_PASS}");
        }
        let Some(history) = self.targets.get(accumulation.0) else {
            log::error!("TAA history copy: unknown accumulation texture {}", accumulation.0);
            return;
        };
        let layer = self.history_layer(history);

        if can_raw_copy(self.frame.output, history) {
            taa_pass::copy_taa_to_history(self.encoder, self.frame.output, history, layer);
            return;
        }

        let layer_view = Self::layer_view(history, layer);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TAA History Copy BG"),
            layout: &self.resources.copy_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(self.frame.output_view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.resources.linear_sampler) },
            ],
        });
        let pipeline = self.resources.copy_pipeline(self.device, history.format);
        taa_pass::render_history_copy_pass(self.encoder, &layer_view, pipeline, &bind_group);
    }
}
