//! Render contexts and their manager.
//!
//! A context pairs a window-sized render target on the driver with the registry of
//! assets created for it and the renderer drawing them.

mod binding;
mod manager;
mod properties;
mod render_context;

pub use binding::ContextBinding;
pub use manager::ContextManager;
pub use properties::{ContextProperties, WindowProperties};
pub use render_context::RenderContext;
