use ::winit::dpi::PhysicalPosition;
use ::winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use ::winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use ::winit::window::{CursorGrabMode, Window};

use crate::input::{CursorMode, InputEvent, KeyCode as K, KeyState, Modifiers, MouseButton, MouseWheelDelta};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
pub fn translate_window_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::ModifiersChanged(m) => Some(InputEvent::ModifiersChanged(map_modifiers(m.state()))),

        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::CursorLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            Some(InputEvent::CursorMoved { x, y })
        }

        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::MouseButton {
            button: map_mouse_button(*button),
            state: map_state(*state),
        }),

        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                MouseScrollDelta::PixelDelta(p) => {
                    let (x, y) = to_logical_f32(window, *p);
                    MouseWheelDelta::Pixel { x, y }
                }
            };
            Some(InputEvent::MouseWheel(delta))
        }

        WindowEvent::KeyboardInput { event, .. } => {
            if event.state == ElementState::Pressed && !event.repeat {
                log::trace!("key down: {:?}", event.physical_key);
            }
            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state: map_state(event.state),
                repeat: event.repeat,
            })
        }

        WindowEvent::Ime(::winit::event::Ime::Commit(text)) if !text.is_empty() => {
            Some(InputEvent::Text(text.clone()))
        }

        _ => None,
    }
}

/// Applies a cursor mode to `window`.
///
/// Lock and confine support varies by platform; the other grab mode is tried before
/// giving up.
pub fn apply_cursor_mode(window: &Window, mode: CursorMode) {
    let (visible, grab) = match mode {
        CursorMode::Normal => (true, CursorGrabMode::None),
        CursorMode::Hidden => (false, CursorGrabMode::None),
        CursorMode::Disabled => (false, CursorGrabMode::Locked),
        CursorMode::Captured => (true, CursorGrabMode::Confined),
    };

    window.set_cursor_visible(visible);

    let result = window.set_cursor_grab(grab).or_else(|_| match grab {
        CursorGrabMode::Locked => window.set_cursor_grab(CursorGrabMode::Confined),
        CursorGrabMode::Confined => window.set_cursor_grab(CursorGrabMode::Locked),
        CursorGrabMode::None => Ok(()),
    });
    if let Err(err) = result {
        log::warn!("cursor mode {mode:?} unsupported: {err}");
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = pos.to_logical::<f64>(window.scale_factor());
    (logical.x as f32, logical.y as f32)
}

fn map_state(state: ElementState) -> KeyState {
    match state {
        ElementState::Pressed => KeyState::Pressed,
        ElementState::Released => KeyState::Released,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> K {
    let PhysicalKey::Code(code) = pk else {
        // Native codes carry no stable numeric value.
        return K::Unknown(0);
    };

    match code {
        KeyCode::Space => K::Space,
        KeyCode::Quote => K::Apostrophe,
        KeyCode::Comma => K::Comma,
        KeyCode::Minus => K::Minus,
        KeyCode::Period => K::Period,
        KeyCode::Slash => K::Slash,
        KeyCode::Digit0 => K::Num0,
        KeyCode::Digit1 => K::Num1,
        KeyCode::Digit2 => K::Num2,
        KeyCode::Digit3 => K::Num3,
        KeyCode::Digit4 => K::Num4,
        KeyCode::Digit5 => K::Num5,
        KeyCode::Digit6 => K::Num6,
        KeyCode::Digit7 => K::Num7,
        KeyCode::Digit8 => K::Num8,
        KeyCode::Digit9 => K::Num9,
        KeyCode::Semicolon => K::Semicolon,
        KeyCode::Equal => K::Equal,
        KeyCode::KeyA => K::A,
        KeyCode::KeyB => K::B,
        KeyCode::KeyC => K::C,
        KeyCode::KeyD => K::D,
        KeyCode::KeyE => K::E,
        KeyCode::KeyF => K::F,
        KeyCode::KeyG => K::G,
        KeyCode::KeyH => K::H,
        KeyCode::KeyI => K::I,
        KeyCode::KeyJ => K::J,
        KeyCode::KeyK => K::K,
        KeyCode::KeyL => K::L,
        KeyCode::KeyM => K::M,
        KeyCode::KeyN => K::N,
        KeyCode::KeyO => K::O,
        KeyCode::KeyP => K::P,
        KeyCode::KeyQ => K::Q,
        KeyCode::KeyR => K::R,
        KeyCode::KeyS => K::S,
        KeyCode::KeyT => K::T,
        KeyCode::KeyU => K::U,
        KeyCode::KeyV => K::V,
        KeyCode::KeyW => K::W,
        KeyCode::KeyX => K::X,
        KeyCode::KeyY => K::Y,
        KeyCode::KeyZ => K::Z,
        KeyCode::BracketLeft => K::LeftBracket,
        KeyCode::Backslash => K::Backslash,
        KeyCode::BracketRight => K::RightBracket,
        KeyCode::Backquote => K::GraveAccent,
        KeyCode::Escape => K::Escape,
        KeyCode::Enter => K::Enter,
        KeyCode::Tab => K::Tab,
        KeyCode::Backspace => K::Backspace,
        KeyCode::Insert => K::Insert,
        KeyCode::Delete => K::Delete,
        KeyCode::ArrowRight => K::Right,
        KeyCode::ArrowLeft => K::Left,
        KeyCode::ArrowDown => K::Down,
        KeyCode::ArrowUp => K::Up,
        KeyCode::PageUp => K::PageUp,
        KeyCode::PageDown => K::PageDown,
        KeyCode::Home => K::Home,
        KeyCode::End => K::End,
        KeyCode::CapsLock => K::CapsLock,
        KeyCode::ScrollLock => K::ScrollLock,
        KeyCode::NumLock => K::NumLock,
        KeyCode::PrintScreen => K::PrintScreen,
        KeyCode::Pause => K::Pause,
        KeyCode::F1 => K::F1,
        KeyCode::F2 => K::F2,
        KeyCode::F3 => K::F3,
        KeyCode::F4 => K::F4,
        KeyCode::F5 => K::F5,
        KeyCode::F6 => K::F6,
        KeyCode::F7 => K::F7,
        KeyCode::F8 => K::F8,
        KeyCode::F9 => K::F9,
        KeyCode::F10 => K::F10,
        KeyCode::F11 => K::F11,
        KeyCode::F12 => K::F12,
        KeyCode::Numpad0 => K::Keypad0,
        KeyCode::Numpad1 => K::Keypad1,
        KeyCode::Numpad2 => K::Keypad2,
        KeyCode::Numpad3 => K::Keypad3,
        KeyCode::Numpad4 => K::Keypad4,
        KeyCode::Numpad5 => K::Keypad5,
        KeyCode::Numpad6 => K::Keypad6,
        KeyCode::Numpad7 => K::Keypad7,
        KeyCode::Numpad8 => K::Keypad8,
        KeyCode::Numpad9 => K::Keypad9,
        KeyCode::NumpadDecimal => K::KeypadDecimal,
        KeyCode::NumpadDivide => K::KeypadDivide,
        KeyCode::NumpadMultiply => K::KeypadMultiply,
        KeyCode::NumpadSubtract => K::KeypadSubtract,
        KeyCode::NumpadAdd => K::KeypadAdd,
        KeyCode::NumpadEnter => K::KeypadEnter,
        KeyCode::NumpadEqual => K::KeypadEqual,
        KeyCode::ShiftLeft => K::LeftShift,
        KeyCode::ControlLeft => K::LeftControl,
        KeyCode::AltLeft => K::LeftAlt,
        KeyCode::SuperLeft => K::LeftSuper,
        KeyCode::ShiftRight => K::RightShift,
        KeyCode::ControlRight => K::RightControl,
        KeyCode::AltRight => K::RightAlt,
        KeyCode::SuperRight => K::RightSuper,
        KeyCode::ContextMenu => K::Menu,
        other => K::Unknown(other as u32),
    }
}
