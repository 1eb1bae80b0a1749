use crate::assets::Vertex;
use crate::driver::{FilterMode, SamplerDesc, ShaderDesc, WrapMode};

/// Builds the render pipeline for a shader module targeting `format`.
///
/// The layout is derived from the shader, so bind groups must be created from
/// `pipeline.get_bind_group_layout(n)`.
pub(super) fn build_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("kiln shader pipeline"),
        layout: None,

        vertex: wgpu::VertexState {
            module,
            entry_point: Some(ShaderDesc::VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(ShaderDesc::FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

pub(super) fn sampler_descriptor(desc: SamplerDesc) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("kiln texture sampler"),
        address_mode_u: address_mode(desc.wrap_s),
        address_mode_v: address_mode(desc.wrap_t),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode(desc.mag_filter),
        min_filter: filter_mode(desc.min_filter),
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_maps_wrap_axes() {
        let d = sampler_descriptor(SamplerDesc {
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Linear,
            wrap_s: WrapMode::MirroredRepeat,
            wrap_t: WrapMode::ClampToEdge,
        });
        assert_eq!(d.address_mode_u, wgpu::AddressMode::MirrorRepeat);
        assert_eq!(d.address_mode_v, wgpu::AddressMode::ClampToEdge);
        assert_eq!(d.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(d.mag_filter, wgpu::FilterMode::Linear);
    }
}
