//! TAA passes: resolve against history, then write the result back.

use crate::render_targets::AccumulationTarget;

/// Resolve: blend the current frame with reprojected history into `output`.
pub fn render_taa_pass(
    encoder: &mut wgpu::CommandEncoder,
    output: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("TAA Resolve Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: output,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

/// Raw copy of the resolved frame into one history layer. Source and
/// history must share format and size.
pub fn copy_taa_to_history(
    encoder: &mut wgpu::CommandEncoder,
    source: &wgpu::Texture,
    history: &AccumulationTarget,
    layer: u32,
) {
    encoder.copy_texture_to_texture(
        wgpu::ImageCopyTexture {
            texture: source,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyTexture {
            texture: &history.texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::Extent3d {
            width: history.width,
            height: history.height,
            depth_or_array_layers: 1,
        },
    );
}

/// Shader copy into one history layer, converting format as needed.
pub fn render_history_copy_pass(
    encoder: &mut wgpu::CommandEncoder,
    history_layer: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("TAA History Copy Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: history_layer,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
