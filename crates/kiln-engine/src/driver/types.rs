use std::borrow::Cow;

use super::{DriverError, RawHandle};

/// How a buffer is bound at draw time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
}

#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: Option<&'a str>,
    pub usage: BufferUsage,
    pub contents: &'a [u8],
}

/// Vertex + fragment program source (WGSL).
///
/// Entry points are `vs_main` and `fs_main`.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    pub label: Option<&'a str>,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl ShaderDesc<'_> {
    pub const VERTEX_ENTRY: &'static str = "vs_main";
    pub const FRAGMENT_ENTRY: &'static str = "fs_main";

    /// Both stages as one module; identical sources are not duplicated.
    pub fn module_source(&self) -> Cow<'_, str> {
        if self.vertex == self.fragment {
            Cow::Borrowed(self.vertex)
        } else {
            Cow::Owned(format!("{}\n{}", self.vertex, self.fragment))
        }
    }

    pub fn bindings(&self) -> ShaderBindings {
        ShaderBindings::scan(&self.module_source())
    }
}

/// Resource groups a WGSL module declares that a draw has to supply.
///
/// `@group(0)` is the uniform block; every two `@group(1)` bindings are one texture
/// (view and sampler).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ShaderBindings {
    pub uniform_block: bool,
    pub textures: usize,
}

impl ShaderBindings {
    pub fn scan(source: &str) -> Self {
        let mut uniform_block = false;
        let mut texture_bindings = 0;
        for line in source.lines() {
            let code = line.split_once("//").map_or(line, |(code, _)| code);
            uniform_block |= code.contains("@group(0)");
            texture_bindings += code.matches("@group(1)").count();
        }
        Self {
            uniform_block,
            textures: texture_bindings.div_ceil(2),
        }
    }

    /// Rejects a draw that leaves a declared group unbound.
    pub fn check(&self, call: &DrawCall<'_>) -> Result<(), DriverError> {
        if self.uniform_block && call.uniforms.is_empty() {
            return Err(DriverError::InvalidDraw(
                "shader declares a uniform block but no uniforms are set".to_string(),
            ));
        }
        if call.textures.len() < self.textures {
            return Err(DriverError::InvalidDraw(format!(
                "shader samples {} textures, draw binds {}",
                self.textures,
                call.textures.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Texture sampling parameters.
///
/// `wrap_s` / `wrap_t` address the horizontal and vertical texture axes.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SamplerDesc {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

/// Tightly packed RGBA8 image.
#[derive(Debug, Clone)]
pub struct TextureDesc<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
    pub sampler: SamplerDesc,
}

impl TextureDesc<'_> {
    /// Checks that `pixels` holds exactly `width * height` RGBA8 texels.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.width == 0 || self.height == 0 {
            return Err(DriverError::InvalidTexture(format!(
                "zero-sized texture ({}x{})",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(DriverError::InvalidTexture(format!(
                "expected {expected} bytes of RGBA8, got {}",
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

/// One draw with a shader and a vertex buffer, optionally indexed.
///
/// `uniforms` is the packed uniform block bound at `@group(0) @binding(0)` when
/// non-empty. Texture `i` is bound at `@group(1)` with its view at binding `2 * i` and
/// its sampler at binding `2 * i + 1`.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub shader: RawHandle,
    pub vertex_buffer: RawHandle,
    pub index_buffer: Option<RawHandle>,
    /// Number of vertices (array draw) or indices (indexed draw).
    pub count: u32,
    pub uniforms: &'a [u8],
    pub textures: &'a [RawHandle],
}

/// Outcome of [`Driver::begin_frame`](super::Driver::begin_frame).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// Frame is open; draws may be recorded.
    Ready,
    /// Transient surface problem; skip rendering this frame.
    Skipped,
}
