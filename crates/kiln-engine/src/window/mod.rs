//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and binds each window to a render context.

mod runtime;

pub use runtime::{Runtime, RuntimeCtx};
