use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::color::Color;
use crate::uuid::Uuid;

use super::handle::HandleAllocator;
use super::{
    BufferDesc, BufferUsage, DrawCall, Driver, DriverError, FrameStatus, RawHandle, SamplerDesc,
    ShaderDesc, TextureDesc,
};

/// CPU-side mirror of an object owned by the [`HeadlessDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessObject {
    Buffer {
        usage: BufferUsage,
        contents: Vec<u8>,
    },
    Shader {
        vertex: String,
        fragment: String,
    },
    Texture {
        width: u32,
        height: u32,
        sampler: SamplerDesc,
    },
}

impl HeadlessObject {
    fn name(&self) -> &'static str {
        match self {
            Self::Buffer { .. } => "buffer",
            Self::Shader { .. } => "shader",
            Self::Texture { .. } => "texture",
        }
    }
}

/// A draw captured by the [`HeadlessDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub context: Uuid,
    pub shader: RawHandle,
    pub vertex_buffer: RawHandle,
    pub index_buffer: Option<RawHandle>,
    pub count: u32,
    pub uniforms: Vec<u8>,
    pub textures: Vec<RawHandle>,
}

#[derive(Debug)]
struct Owned {
    context: Uuid,
    object: HeadlessObject,
}

#[derive(Debug, Default)]
struct State {
    current: Option<Uuid>,
    bind_count: usize,
    handles: HandleAllocator,
    objects: HashMap<RawHandle, Owned>,
    open_frames: HashMap<Uuid, Color>,
    draws: Vec<RecordedDraw>,
    frames_presented: usize,
    detached: HashSet<Uuid>,
}

impl State {
    fn require_current(&self) -> Result<Uuid, DriverError> {
        self.current.ok_or(DriverError::NoCurrentContext)
    }

    fn insert(&mut self, object: HeadlessObject) -> Result<RawHandle, DriverError> {
        let context = self.require_current()?;
        let handle = self.handles.next();
        log::trace!("headless: {} {handle} created on context {context}", object.name());
        self.objects.insert(handle, Owned { context, object });
        Ok(handle)
    }

    fn expect_kind(
        &self,
        context: Uuid,
        handle: RawHandle,
        kind: &'static str,
    ) -> Result<(), DriverError> {
        let owned = self
            .objects
            .get(&handle)
            .ok_or(DriverError::UnknownHandle(handle))?;
        if owned.object.name() != kind {
            return Err(DriverError::WrongObject(handle, kind));
        }
        if owned.context != context {
            return Err(DriverError::ForeignHandle(handle));
        }
        Ok(())
    }
}

/// In-memory driver with no GPU behind it.
///
/// Enforces the same rules as a real driver (a context must be current to create
/// objects, draws need an open frame) and records everything for inspection.
#[derive(Debug, Default)]
pub struct HeadlessDriver {
    state: RefCell<State>,
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `make_current` calls so far.
    pub fn bind_count(&self) -> usize {
        self.state.borrow().bind_count
    }

    /// Number of objects allocated and not yet released.
    pub fn live_objects(&self) -> usize {
        self.state.borrow().objects.len()
    }

    pub fn is_live(&self, handle: RawHandle) -> bool {
        self.state.borrow().objects.contains_key(&handle)
    }

    pub fn object(&self, handle: RawHandle) -> Option<HeadlessObject> {
        self.state.borrow().objects.get(&handle).map(|o| o.object.clone())
    }

    /// Context that was current when `handle` was created.
    pub fn owner(&self, handle: RawHandle) -> Option<Uuid> {
        self.state.borrow().objects.get(&handle).map(|o| o.context)
    }

    pub fn buffer_contents(&self, handle: RawHandle) -> Option<Vec<u8>> {
        match self.object(handle)? {
            HeadlessObject::Buffer { contents, .. } => Some(contents),
            _ => None,
        }
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.state.borrow().draws.clone()
    }

    pub fn frames_presented(&self) -> usize {
        self.state.borrow().frames_presented
    }

    /// Clear color of the frame currently open on `context`.
    pub fn open_frame(&self, context: Uuid) -> Option<Color> {
        self.state.borrow().open_frames.get(&context).copied()
    }

    pub fn is_detached(&self, context: Uuid) -> bool {
        self.state.borrow().detached.contains(&context)
    }
}

fn check_stage(stage: &str, source: &str, entry: &str) -> Result<(), DriverError> {
    if source.trim().is_empty() {
        return Err(DriverError::ShaderCompilation(format!("{stage} stage source is empty")));
    }
    if !source.contains(&format!("fn {entry}")) {
        return Err(DriverError::ShaderCompilation(format!(
            "{stage} stage has no entry point `{entry}`"
        )));
    }
    Ok(())
}

impl Driver for HeadlessDriver {
    fn make_current(&self, context: Uuid) {
        let mut state = self.state.borrow_mut();
        state.current = Some(context);
        state.bind_count += 1;
    }

    fn current(&self) -> Option<Uuid> {
        self.state.borrow().current
    }

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<RawHandle, DriverError> {
        self.state.borrow_mut().insert(HeadlessObject::Buffer {
            usage: desc.usage,
            contents: desc.contents.to_vec(),
        })
    }

    fn write_buffer(&self, handle: RawHandle, data: &[u8]) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(&handle).map(|o| &mut o.object) {
            Some(HeadlessObject::Buffer { contents, .. }) => {
                contents.clear();
                contents.extend_from_slice(data);
                Ok(())
            }
            Some(_) => Err(DriverError::WrongObject(handle, "buffer")),
            None => Err(DriverError::UnknownHandle(handle)),
        }
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<RawHandle, DriverError> {
        let mut state = self.state.borrow_mut();
        state.require_current()?;
        check_stage("vertex", desc.vertex, ShaderDesc::VERTEX_ENTRY)?;
        check_stage("fragment", desc.fragment, ShaderDesc::FRAGMENT_ENTRY)?;

        state.insert(HeadlessObject::Shader {
            vertex: desc.vertex.to_owned(),
            fragment: desc.fragment.to_owned(),
        })
    }

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<RawHandle, DriverError> {
        let mut state = self.state.borrow_mut();
        state.require_current()?;

        desc.validate()?;

        state.insert(HeadlessObject::Texture {
            width: desc.width,
            height: desc.height,
            sampler: desc.sampler,
        })
    }

    fn set_sampler(&self, handle: RawHandle, new: SamplerDesc) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(&handle).map(|o| &mut o.object) {
            Some(HeadlessObject::Texture { sampler, .. }) => {
                *sampler = new;
                Ok(())
            }
            Some(_) => Err(DriverError::WrongObject(handle, "texture")),
            None => Err(DriverError::UnknownHandle(handle)),
        }
    }

    fn release(&self, handle: RawHandle) {
        if self.state.borrow_mut().objects.remove(&handle).is_some() {
            log::trace!("headless: released {handle}");
        }
    }

    fn begin_frame(&self, context: Uuid, clear: Color) -> Result<FrameStatus, DriverError> {
        let mut state = self.state.borrow_mut();
        if state.detached.contains(&context) {
            return Err(DriverError::UnknownContext(context));
        }
        state.open_frames.insert(context, clear);
        Ok(FrameStatus::Ready)
    }

    fn draw(&self, call: &DrawCall<'_>) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        let context = state.require_current()?;
        if !state.open_frames.contains_key(&context) {
            return Err(DriverError::NoFrame(context));
        }

        state.expect_kind(context, call.shader, "shader")?;
        state.expect_kind(context, call.vertex_buffer, "buffer")?;
        if let Some(index_buffer) = call.index_buffer {
            state.expect_kind(context, index_buffer, "buffer")?;
        }
        for &texture in call.textures {
            state.expect_kind(context, texture, "texture")?;
        }
        if let Some(Owned {
            object: HeadlessObject::Shader { vertex, fragment },
            ..
        }) = state.objects.get(&call.shader)
        {
            ShaderDesc {
                label: None,
                vertex,
                fragment,
            }
            .bindings()
            .check(call)?;
        }

        state.draws.push(RecordedDraw {
            context,
            shader: call.shader,
            vertex_buffer: call.vertex_buffer,
            index_buffer: call.index_buffer,
            count: call.count,
            uniforms: call.uniforms.to_vec(),
            textures: call.textures.to_vec(),
        });
        Ok(())
    }

    fn end_frame(&self, context: Uuid) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        if state.open_frames.remove(&context).is_none() {
            return Err(DriverError::NoFrame(context));
        }
        state.frames_presented += 1;
        Ok(())
    }

    fn detach(&self, context: Uuid) {
        let mut state = self.state.borrow_mut();
        state.open_frames.remove(&context);
        if state.current == Some(context) {
            state.current = None;
        }
        state.detached.insert(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADER: &str = "fn vs_main() {} fn fs_main() {}";

    fn bound() -> (HeadlessDriver, Uuid) {
        let driver = HeadlessDriver::new();
        let ctx = Uuid::from_raw(1);
        driver.make_current(ctx);
        (driver, ctx)
    }

    #[test]
    fn creation_requires_a_current_context() {
        let driver = HeadlessDriver::new();
        let err = driver
            .create_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, contents: &[] })
            .unwrap_err();
        assert_eq!(err, DriverError::NoCurrentContext);
        assert_eq!(driver.live_objects(), 0);
    }

    #[test]
    fn objects_remember_their_owner() {
        let (driver, ctx) = bound();
        let h = driver
            .create_buffer(&BufferDesc { label: None, usage: BufferUsage::Index, contents: &[1, 2] })
            .unwrap();
        assert_eq!(driver.owner(h), Some(ctx));
        assert_eq!(driver.buffer_contents(h), Some(vec![1, 2]));

        driver.write_buffer(h, &[9, 9, 9]).unwrap();
        assert_eq!(driver.buffer_contents(h), Some(vec![9, 9, 9]));

        driver.release(h);
        assert!(!driver.is_live(h));
        // Double release is ignored.
        driver.release(h);
    }

    #[test]
    fn shader_without_entry_point_fails_to_compile() {
        let (driver, _) = bound();
        let err = driver
            .create_shader(&ShaderDesc { label: None, vertex: "fn main() {}", fragment: SHADER })
            .unwrap_err();
        assert!(matches!(err, DriverError::ShaderCompilation(msg) if msg.contains("vs_main")));
        assert_eq!(driver.live_objects(), 0);
    }

    #[test]
    fn texture_size_is_validated() {
        let (driver, _) = bound();
        let desc = TextureDesc {
            label: None,
            width: 2,
            height: 2,
            pixels: &[0; 15],
            sampler: SamplerDesc::default(),
        };
        assert!(matches!(driver.create_texture(&desc), Err(DriverError::InvalidTexture(_))));
    }

    #[test]
    fn draws_need_an_open_frame() {
        let (driver, ctx) = bound();
        let shader = driver
            .create_shader(&ShaderDesc { label: None, vertex: SHADER, fragment: SHADER })
            .unwrap();
        let vbo = driver
            .create_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, contents: &[0; 4] })
            .unwrap();
        let call = DrawCall {
            shader,
            vertex_buffer: vbo,
            index_buffer: None,
            count: 3,
            uniforms: &[],
            textures: &[],
        };

        assert_eq!(driver.draw(&call), Err(DriverError::NoFrame(ctx)));

        driver.begin_frame(ctx, Color::black()).unwrap();
        assert_eq!(driver.open_frame(ctx), Some(Color::black()));
        driver.draw(&call).unwrap();
        driver.end_frame(ctx).unwrap();

        assert_eq!(driver.draws().len(), 1);
        assert_eq!(driver.frames_presented(), 1);
        assert_eq!(driver.end_frame(ctx), Err(DriverError::NoFrame(ctx)));
    }

    #[test]
    fn draw_rejects_mismatched_handles() {
        let (driver, ctx) = bound();
        let vbo = driver
            .create_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, contents: &[] })
            .unwrap();
        driver.begin_frame(ctx, Color::white()).unwrap();
        let call = DrawCall {
            shader: vbo,
            vertex_buffer: vbo,
            index_buffer: None,
            count: 0,
            uniforms: &[],
            textures: &[],
        };
        assert_eq!(driver.draw(&call), Err(DriverError::WrongObject(vbo, "shader")));
    }

    #[test]
    fn draw_rejects_handles_from_other_contexts() {
        let driver = HeadlessDriver::new();
        let (a, b) = (Uuid::from_raw(1), Uuid::from_raw(2));

        driver.make_current(a);
        let shader = driver
            .create_shader(&ShaderDesc { label: None, vertex: SHADER, fragment: SHADER })
            .unwrap();
        let vbo = driver
            .create_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, contents: &[] })
            .unwrap();

        driver.make_current(b);
        driver.begin_frame(b, Color::white()).unwrap();
        let call = DrawCall {
            shader,
            vertex_buffer: vbo,
            index_buffer: None,
            count: 0,
            uniforms: &[],
            textures: &[],
        };
        assert_eq!(driver.draw(&call), Err(DriverError::ForeignHandle(shader)));
    }

    #[test]
    fn draw_rejects_unbound_shader_groups() {
        let (driver, ctx) = bound();
        let source = "
@group(0) @binding(0) var<uniform> tint: vec4<f32>;
@group(1) @binding(0) var albedo: texture_2d<f32>;
@group(1) @binding(1) var albedo_sampler: sampler;
fn vs_main() {} fn fs_main() {}";
        let shader = driver
            .create_shader(&ShaderDesc { label: None, vertex: source, fragment: source })
            .unwrap();
        let vbo = driver
            .create_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, contents: &[0; 4] })
            .unwrap();
        let texture = driver
            .create_texture(&TextureDesc {
                label: None,
                width: 1,
                height: 1,
                pixels: &[0; 4],
                sampler: SamplerDesc::default(),
            })
            .unwrap();
        driver.begin_frame(ctx, Color::black()).unwrap();

        let textures = [texture];
        let mut call = DrawCall {
            shader,
            vertex_buffer: vbo,
            index_buffer: None,
            count: 3,
            uniforms: &[],
            textures: &textures,
        };
        assert!(matches!(driver.draw(&call), Err(DriverError::InvalidDraw(_))));

        call.uniforms = &[0; 16];
        call.textures = &[];
        assert!(matches!(driver.draw(&call), Err(DriverError::InvalidDraw(_))));

        call.textures = &textures;
        driver.draw(&call).unwrap();
        assert_eq!(driver.draws().len(), 1);
    }

    #[test]
    fn detach_unbinds_context() {
        let (driver, ctx) = bound();
        driver.detach(ctx);
        assert_eq!(driver.current(), None);
        assert!(driver.is_detached(ctx));
        assert_eq!(driver.begin_frame(ctx, Color::white()), Err(DriverError::UnknownContext(ctx)));
    }
}
