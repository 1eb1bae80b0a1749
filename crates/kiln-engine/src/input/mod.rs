//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code translates platform events into `InputEvent`s (see [`platform`]).

mod frame;
pub mod platform;
mod state;
mod types;

pub use state::InputState;
pub use types::{
    CursorMode, InputEvent, KeyCode, KeyMode, KeyState, Modifiers, MouseButton, MouseWheelDelta,
};
