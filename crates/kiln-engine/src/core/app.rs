use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::context::RenderContext;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once per window, after its context is attached and before its first frame.
    ///
    /// This is where assets get registered. An error closes the window.
    fn on_start(&mut self, context: &mut RenderContext) -> anyhow::Result<()> {
        let _ = context;
        Ok(())
    }

    /// Called when a window closes, while its context and assets still exist.
    fn on_stop(&mut self, context: &mut RenderContext) {
        let _ = context;
    }

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame per window, between the clear and the present.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
