//! Graphics driver seam.
//!
//! Resources and contexts talk to the GPU exclusively through [`Driver`]. The model is
//! the classic "current context" one:
//! - a context must be made current before objects are created for it
//! - objects are named by opaque [`RawHandle`]s and released explicitly
//! - one frame per context is open between `begin_frame` and `end_frame`
//!
//! Two implementations ship with the engine: [`WgpuDriver`] for windows and
//! [`HeadlessDriver`] for tooling and tests.

mod error;
mod gpu;
mod handle;
mod headless;
mod types;

pub use error::DriverError;
pub use gpu::{GpuInit, WgpuDriver};
pub use handle::RawHandle;
pub use headless::{HeadlessDriver, HeadlessObject, RecordedDraw};
pub use types::{
    BufferDesc, BufferUsage, DrawCall, FilterMode, FrameStatus, SamplerDesc, ShaderBindings,
    ShaderDesc, TextureDesc, WrapMode,
};

use crate::color::Color;
use crate::uuid::Uuid;

/// Operations the engine needs from a graphics backend.
///
/// All methods take `&self`; implementations use interior mutability and are expected
/// to be driven from a single thread.
pub trait Driver {
    /// Makes `context` the target of subsequent object creation and draws.
    fn make_current(&self, context: Uuid);

    /// Currently bound context, if any.
    fn current(&self) -> Option<Uuid>;

    /// Allocates a buffer on the current context, initialized with `desc.contents`.
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<RawHandle, DriverError>;

    /// Replaces the contents of a buffer, growing it if required.
    fn write_buffer(&self, handle: RawHandle, contents: &[u8]) -> Result<(), DriverError>;

    /// Compiles a vertex + fragment program on the current context.
    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<RawHandle, DriverError>;

    /// Uploads an RGBA8 image on the current context.
    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<RawHandle, DriverError>;

    /// Replaces the sampling parameters of a texture.
    fn set_sampler(&self, handle: RawHandle, sampler: SamplerDesc) -> Result<(), DriverError>;

    /// Releases a driver object. Unknown handles are ignored.
    fn release(&self, handle: RawHandle);

    /// Opens a frame on `context` and clears it.
    fn begin_frame(&self, context: Uuid, clear: Color) -> Result<FrameStatus, DriverError>;

    /// Records one draw into the current context's open frame.
    fn draw(&self, call: &DrawCall<'_>) -> Result<(), DriverError>;

    /// Submits and presents the open frame of `context`.
    fn end_frame(&self, context: Uuid) -> Result<(), DriverError>;

    /// Forgets per-context state once the context is destroyed.
    fn detach(&self, context: Uuid) {
        let _ = context;
    }
}
