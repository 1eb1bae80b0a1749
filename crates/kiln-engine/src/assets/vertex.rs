use bytemuck::{Pod, Zeroable};

/// Vertex layout shared by every vertex buffer.
///
/// Shader inputs: `@location(0)` position, `@location(1)` normal, `@location(2)` texture
/// coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // tex_coords
    ];

    /// Vertex at `position`, facing +Z, with zero texture coordinates.
    pub const fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0, 0.0, 1.0],
            tex_coords: [0.0, 0.0],
        }
    }

    pub const fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = normal;
        self
    }

    pub const fn with_tex_coords(mut self, tex_coords: [f32; 2]) -> Self {
        self.tex_coords = tex_coords;
        self
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new([0.0; 3])
    }
}
