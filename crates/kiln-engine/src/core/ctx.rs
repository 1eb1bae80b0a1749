use winit::window::{Window, WindowId};

use crate::context::RenderContext;
use crate::driver::DriverError;
use crate::input::{CursorMode, InputState, platform};
use crate::time::FrameTime;
use crate::uuid::Uuid;
use crate::window::RuntimeCtx;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Returns the logical window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(scale);
        (logi.width as f32, logi.height as f32)
    }

    /// Shows, hides, confines or locks the cursor for this window.
    pub fn set_cursor_mode(&self, mode: CursorMode) {
        platform::winit::apply_cursor_mode(self.window, mode);
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// The frame is already open and cleared when the app sees it; draws issued through
/// [`context`](Self::context) land on this window.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub context: &'a mut RenderContext,
    pub input: &'a InputState,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_> {
    /// Shorthand for [`RenderContext::render`].
    pub fn render(&mut self, vertex_array: Uuid, shader: Uuid) -> Result<(), DriverError> {
        self.context.render(vertex_array, shader)
    }

    /// Shorthand for [`RenderContext::render_textured`].
    pub fn render_textured(
        &mut self,
        vertex_array: Uuid,
        shader: Uuid,
        textures: &[Uuid],
    ) -> Result<(), DriverError> {
        self.context.render_textured(vertex_array, shader, textures)
    }
}
