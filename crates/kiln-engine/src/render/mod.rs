//! Draw submission.
//!
//! The renderer resolves asset ids through a context's registry and turns them into
//! driver draw calls:
//! - indexed draw when the vertex array has indices, array draw otherwise
//! - the shader's uniform block at `@group(0) @binding(0)`
//! - textures at `@group(1)`, view and sampler per texture

mod renderer;

pub use renderer::Renderer;
