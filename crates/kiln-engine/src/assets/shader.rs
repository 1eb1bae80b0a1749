use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::color::Color;
use crate::driver::{Driver, DriverError, RawHandle, ShaderDesc};
use crate::uuid::Uuid;

use super::{Asset, AssetCtx, AssetError, AssetKind, AssetType};

/// Where a shader's WGSL comes from.
///
/// Vertex and fragment stages may live in one module (pass the same source twice) or in
/// two; they are compiled together, with entry points `vs_main` and `fs_main`.
#[derive(Debug, Clone)]
pub enum ShaderSource {
    Wgsl { vertex: String, fragment: String },
    Files { vertex: PathBuf, fragment: PathBuf },
}

impl ShaderSource {
    /// Single WGSL module holding both stages.
    pub fn wgsl(source: impl Into<String>) -> Self {
        let source = source.into();
        Self::Wgsl {
            vertex: source.clone(),
            fragment: source,
        }
    }

    pub fn wgsl_stages(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::Wgsl {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Single WGSL file holding both stages.
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::Files {
            vertex: path.clone(),
            fragment: path,
        }
    }

    pub fn files(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Self {
        Self::Files {
            vertex: vertex.as_ref().to_path_buf(),
            fragment: fragment.as_ref().to_path_buf(),
        }
    }

    fn load(self) -> Result<(String, String), AssetError> {
        let (vertex, fragment) = match self {
            Self::Wgsl { vertex, fragment } => (vertex, fragment),
            Self::Files { vertex, fragment } => (read(&vertex)?, read(&fragment)?),
        };

        if vertex.trim().is_empty() || fragment.trim().is_empty() {
            return Err(AssetError::invalid(AssetKind::Shader, "empty shader source"));
        }
        Ok((vertex, fragment))
    }
}

fn read(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A uniform value as seen by the shader.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Vec2([f32; 2]),
    IVec2([i32; 2]),
    UVec2([u32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat4([[f32; 4]; 4]),
    /// Uploaded as normalized `vec4<f32>`.
    Color(Color),
}

impl UniformValue {
    /// WGSL uniform-address-space alignment.
    fn align(&self) -> usize {
        match self {
            Self::F32(_) | Self::I32(_) | Self::U32(_) => 4,
            Self::Vec2(_) | Self::IVec2(_) | Self::UVec2(_) => 8,
            Self::Vec3(_) | Self::Vec4(_) | Self::Mat4(_) | Self::Color(_) => 16,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::F32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::I32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::U32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::IVec2(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::UVec2(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::Vec3(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::Vec4(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::Mat4(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
            Self::Color(c) => out.extend_from_slice(bytemuck::cast_slice(&c.normalized())),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<[[f32; 4]; 4]> for UniformValue {
    fn from(m: [[f32; 4]; 4]) -> Self {
        Self::Mat4(m)
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

/// A compiled vertex + fragment program and its named uniform values.
///
/// Uniforms are laid out in a single block at `@group(0) @binding(0)`, ordered by name.
/// A shader declaring `a: vec3<f32>` and `b: f32` therefore reads `set_uniform("a", ..)`
/// at offset 0 and `set_uniform("b", ..)` at offset 12.
pub struct Shader {
    uuid: Uuid,
    context: Uuid,
    driver: Rc<dyn Driver>,
    handle: Cell<RawHandle>,
    uniforms: RefCell<BTreeMap<String, UniformValue>>,
}

fn compile(
    driver: &dyn Driver,
    uuid: Uuid,
    vertex: &str,
    fragment: &str,
) -> Result<RawHandle, AssetError> {
    let label = format!("shader {uuid}");
    driver
        .create_shader(&ShaderDesc {
            label: Some(&label),
            vertex,
            fragment,
        })
        .map_err(|err| {
            if let DriverError::ShaderCompilation(diagnostic) = &err {
                log::error!("shader {uuid}: {diagnostic}");
            }
            AssetError::construction(AssetKind::Shader)(err)
        })
}

impl Shader {
    /// Recompiles from `source`, keeping the identifier and uniforms.
    ///
    /// Makes the owning context current. On failure the previous program stays in use.
    pub fn set_source(&self, source: ShaderSource) -> Result<(), AssetError> {
        let (vertex, fragment) = source.load()?;
        self.driver.make_current(self.context);
        let handle = compile(&*self.driver, self.uuid, &vertex, &fragment)?;
        self.driver.release(self.handle.replace(handle));
        Ok(())
    }

    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> &Self {
        self.uniforms
            .borrow_mut()
            .insert(name.to_owned(), value.into());
        self
    }

    pub fn remove_uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.borrow_mut().remove(name)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.borrow().get(name).copied()
    }

    /// Packed uniform block, empty when no uniform is set.
    pub fn uniform_bytes(&self) -> Vec<u8> {
        let uniforms = self.uniforms.borrow();
        let mut out = Vec::new();
        for value in uniforms.values() {
            out.resize(out.len().next_multiple_of(value.align()), 0);
            value.write(&mut out);
        }
        // Uniform buffer bindings are sized in multiples of 16 bytes.
        out.resize(out.len().next_multiple_of(16), 0);
        out
    }

    pub fn raw_handle(&self) -> RawHandle {
        self.handle.get()
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.driver.release(self.handle.get());
    }
}

impl Asset for Shader {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> AssetKind {
        Self::KIND
    }
}

impl AssetType for Shader {
    const KIND: AssetKind = AssetKind::Shader;
    type Desc = ShaderSource;

    fn construct(ctx: AssetCtx<'_>, source: ShaderSource) -> Result<Self, AssetError> {
        let (vertex, fragment) = source.load()?;
        let handle = compile(&**ctx.driver(), ctx.uuid(), &vertex, &fragment)?;

        Ok(Self {
            uuid: ctx.uuid(),
            context: ctx.context(),
            driver: Rc::clone(ctx.driver()),
            handle: Cell::new(handle),
            uniforms: RefCell::new(BTreeMap::new()),
        })
    }
}
