use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::context::{ContextManager, ContextProperties, WindowProperties};
use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::driver::{Driver, FrameStatus, GpuInit, WgpuDriver};
use crate::input::{InputState, platform};
use crate::time::Clock;
use crate::uuid::Uuid;

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    /// Opens another window with its own context.
    pub fn create_window(&mut self, properties: ContextProperties) {
        self.commands.push(Command::CreateWindow(properties));
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.commands.push(Command::CloseWindow(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    CreateWindow(ContextProperties),
    CloseWindow(WindowId),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window for `initial`, then drives `app` until every window is closed
    /// or the app asks to exit.
    pub fn run<A>(initial: ContextProperties, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

/// A platform window bound to one render context.
struct WindowEntry {
    window: Arc<Window>,
    context: Uuid,
    input: InputState,
    clock: Clock,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    initial: ContextProperties,
    app: A,

    driver: Rc<WgpuDriver>,
    contexts: ContextManager,
    windows: HashMap<WindowId, WindowEntry>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(initial: ContextProperties, gpu_init: GpuInit, app: A) -> Self {
        let driver = Rc::new(WgpuDriver::new(gpu_init));
        let contexts = ContextManager::new(Rc::clone(&driver) as Rc<dyn Driver>);
        Self {
            initial,
            app,
            driver,
            contexts,
            windows: HashMap::new(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(
        &mut self,
        event_loop: &ActiveEventLoop,
        properties: ContextProperties,
    ) -> Result<WindowId> {
        let window = event_loop
            .create_window(window_attributes(&properties.window))
            .context("failed to create window")?;
        let window = Arc::new(window);
        let id = window.id();
        let cursor_mode = properties.window.cursor_mode;

        let context = self.contexts.create_context(properties);
        if let Err(e) = self.driver.attach_window(context, Arc::clone(&window)) {
            self.contexts.destroy_context(context);
            return Err(e.context("GPU initialization failed for window"));
        }

        platform::winit::apply_cursor_mode(&window, cursor_mode);

        let started = match self.contexts.get_context_mut(context) {
            Some(ctx) => self.app.on_start(ctx),
            None => Err(anyhow::anyhow!("context {context} vanished during creation")),
        };
        if let Err(e) = started {
            self.contexts.destroy_context(context);
            return Err(e.context("application failed to start"));
        }

        self.windows.insert(
            id,
            WindowEntry {
                window,
                context,
                input: InputState::new(),
                clock: Clock::new(),
            },
        );
        Ok(id)
    }

    /// Destroys the context first so its assets go while the surface still exists.
    fn destroy_window_entry(&mut self, id: WindowId) {
        if let Some(entry) = self.windows.remove(&id) {
            if let Some(context) = self.contexts.get_context_mut(entry.context) {
                self.app.on_stop(context);
            }
            self.contexts.destroy_context(entry.context);
            log::debug!("window {id:?} closed");
        }
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::CreateWindow(props) => {
                    if let Err(e) = self.create_window_entry(event_loop, props) {
                        log::error!("failed to create window: {e:#}");
                    }
                }
                Command::CloseWindow(id) => self.destroy_window_entry(id),
                Command::Exit => self.request_exit(),
            }
        }

        if self.windows.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn redraw(&mut self, window_id: WindowId, runtime_ctx: &mut RuntimeCtx) -> AppControl {
        let Self {
            app,
            contexts,
            windows,
            ..
        } = self;

        let Some(entry) = windows.get_mut(&window_id) else {
            return AppControl::Continue;
        };
        let Some(context) = contexts.get_context_mut(entry.context) else {
            log::warn!("window {window_id:?} has no context; closing it");
            runtime_ctx.close_window(window_id);
            return AppControl::Continue;
        };

        let time = entry.clock.tick();

        match context.begin_frame() {
            Ok(FrameStatus::Ready) => {}
            // Input keeps accumulating until a frame actually consumes it.
            Ok(FrameStatus::Skipped) => return AppControl::Continue,
            Err(e) => {
                log::error!("cannot render window {window_id:?}: {e}");
                runtime_ctx.close_window(window_id);
                return AppControl::Continue;
            }
        }

        let control = {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: &entry.window,
                },
                context: &mut *context,
                input: &entry.input,
                time,
                runtime: &mut *runtime_ctx,
            };
            app.on_frame(&mut ctx)
        };

        if let Err(e) = context.end_frame() {
            log::error!("failed to present window {window_id:?}: {e}");
        }

        // Clear per-frame deltas after the frame is consumed.
        entry.input.end_frame();
        control
    }
}

fn window_attributes(props: &WindowProperties) -> winit::window::WindowAttributes {
    let mut attrs = Window::default_attributes()
        .with_title(props.title.clone())
        .with_inner_size(LogicalSize::new(props.width as f64, props.height as f64))
        .with_resizable(props.resizable)
        .with_decorations(props.decorated)
        .with_visible(props.visible);

    if let Some((x, y)) = props.position {
        attrs = attrs.with_position(PhysicalPosition::new(x, y));
    }
    attrs
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop, self.initial.clone()) {
            log::error!("failed to create initial window: {e:#}");
            self.request_exit();
            event_loop.exit();
            return;
        }

        for entry in self.windows.values() {
            entry.window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        for entry in self.windows.values() {
            entry.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.windows.get_mut(&window_id) else {
            return;
        };

        if let Some(ev) = platform::winit::translate_window_event(&entry.window, &event) {
            entry.input.apply_event(ev);
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit();
            event_loop.exit();
            return;
        }

        // Runtime-managed window lifecycle / resize / redraw handling.
        match &event {
            WindowEvent::CloseRequested => {
                self.destroy_window_entry(window_id);
                if self.windows.is_empty() {
                    self.request_exit();
                    event_loop.exit();
                }
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.windows.get(&window_id) {
                    self.driver.resize(entry.context, *new_size);
                    entry.window.request_redraw();
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.windows.get(&window_id) {
                    self.driver.resize(entry.context, entry.window.inner_size());
                    entry.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();

                if self.redraw(window_id, &mut runtime_ctx) == AppControl::Exit {
                    runtime_ctx.exit();
                }

                self.apply_commands(event_loop, runtime_ctx);
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            self.destroy_window_entry(id);
        }
        log::info!("runtime stopped");
    }
}
