use std::collections::HashSet;
use std::hash::Hash;

use super::frame::InputFrame;
use super::types::{InputEvent, KeyCode, KeyMode, KeyState, Modifiers, MouseButton, MouseWheelDelta};

/// Input state of one window, polled once per frame.
///
/// The runtime feeds events through [`apply_event`](Self::apply_event) and calls
/// [`end_frame`](Self::end_frame) after the application's frame callback, so
/// `Pressed`/`Released` are visible for exactly one frame.
#[derive(Debug, Default)]
pub struct InputState {
    modifiers: Modifiers,
    focused: bool,
    cursor: Option<(f32, f32)>,
    keys_down: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    frame: InputFrame,
}

fn mode<T: Eq + Hash>(down: &HashSet<T>, pressed: &HashSet<T>, released: &HashSet<T>, x: &T) -> KeyMode {
    if pressed.contains(x) {
        KeyMode::Pressed
    } else if released.contains(x) {
        KeyMode::Released
    } else if down.contains(x) {
        KeyMode::Held
    } else {
        KeyMode::None
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(focused) => {
                self.focused = *focused;
                if !focused {
                    // Releases are not delivered to unfocused windows; avoid stuck keys.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::CursorMoved { x, y } => self.cursor = Some((*x, *y)),
            InputEvent::CursorLeft => self.cursor = None,

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(*key) {
                        self.frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    if self.keys_down.remove(key) {
                        self.frame.keys_released.insert(*key);
                    }
                }
            },

            InputEvent::MouseButton { button, state } => match state {
                KeyState::Pressed => {
                    if self.buttons_down.insert(*button) {
                        self.frame.buttons_pressed.insert(*button);
                    }
                }
                KeyState::Released => {
                    if self.buttons_down.remove(button) {
                        self.frame.buttons_released.insert(*button);
                    }
                }
            },

            InputEvent::MouseWheel(MouseWheelDelta::Line { x, y } | MouseWheelDelta::Pixel { x, y }) => {
                self.frame.scroll.0 += x;
                self.frame.scroll.1 += y;
            }

            InputEvent::Text(text) => self.frame.text.push_str(text),
        }

        self.frame.events.push(ev);
    }

    /// Clears the one-frame transitions.
    pub fn end_frame(&mut self) {
        self.frame.clear();
    }

    pub fn key_mode(&self, key: KeyCode) -> KeyMode {
        let f = &self.frame;
        mode(&self.keys_down, &f.keys_pressed, &f.keys_released, &key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.frame.keys_pressed.contains(&key)
    }

    /// True while the key is down, including the frame it went down.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.frame.keys_released.contains(&key)
    }

    pub fn button_mode(&self, button: MouseButton) -> KeyMode {
        let f = &self.frame;
        mode(&self.buttons_down, &f.buttons_pressed, &f.buttons_released, &button)
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.frame.buttons_pressed.contains(&button)
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn is_button_released(&self, button: MouseButton) -> bool {
        self.frame.buttons_released.contains(&button)
    }

    /// Cursor position in logical pixels; `None` while outside the window.
    pub fn cursor_position(&self) -> Option<(f32, f32)> {
        self.cursor
    }

    /// Wheel movement accumulated this frame.
    pub fn scroll_delta(&self) -> (f32, f32) {
        self.frame.scroll
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Text committed this frame.
    pub fn text(&self) -> &str {
        &self.frame.text
    }

    /// Raw events of this frame in arrival order.
    pub fn events(&self) -> &[InputEvent] {
        &self.frame.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: KeyCode, state: KeyState) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            repeat: false,
        }
    }

    #[test]
    fn key_modes_follow_frames() {
        let mut input = InputState::new();
        assert_eq!(input.key_mode(KeyCode::W), KeyMode::None);

        input.apply_event(key(KeyCode::W, KeyState::Pressed));
        assert_eq!(input.key_mode(KeyCode::W), KeyMode::Pressed);
        assert!(input.is_key_pressed(KeyCode::W) && input.is_key_held(KeyCode::W));

        input.end_frame();
        assert_eq!(input.key_mode(KeyCode::W), KeyMode::Held);
        assert!(!input.is_key_pressed(KeyCode::W));

        // Repeats do not re-trigger the press edge.
        input.apply_event(key(KeyCode::W, KeyState::Pressed));
        assert_eq!(input.key_mode(KeyCode::W), KeyMode::Held);

        input.apply_event(key(KeyCode::W, KeyState::Released));
        assert_eq!(input.key_mode(KeyCode::W), KeyMode::Released);
        assert!(input.is_key_released(KeyCode::W));

        input.end_frame();
        assert_eq!(input.key_mode(KeyCode::W), KeyMode::None);
    }

    #[test]
    fn focus_loss_clears_held_state() {
        let mut input = InputState::new();
        input.apply_event(key(KeyCode::LeftShift, KeyState::Pressed));
        input.apply_event(InputEvent::MouseButton {
            button: MouseButton::Left,
            state: KeyState::Pressed,
        });
        input.end_frame();

        input.apply_event(InputEvent::Focused(false));
        assert!(!input.is_key_held(KeyCode::LeftShift));
        assert_eq!(input.button_mode(MouseButton::Left), KeyMode::None);
    }

    #[test]
    fn cursor_scroll_and_text() {
        let mut input = InputState::new();
        input.apply_event(InputEvent::CursorMoved { x: 3.0, y: 4.0 });
        input.apply_event(InputEvent::MouseWheel(MouseWheelDelta::Line { x: 0.0, y: 1.0 }));
        input.apply_event(InputEvent::MouseWheel(MouseWheelDelta::Line { x: 0.0, y: 2.0 }));
        input.apply_event(InputEvent::Text("hi".into()));

        assert_eq!(input.cursor_position(), Some((3.0, 4.0)));
        assert_eq!(input.scroll_delta(), (0.0, 3.0));
        assert_eq!(input.text(), "hi");
        assert_eq!(input.events().len(), 4);

        input.apply_event(InputEvent::CursorLeft);
        input.end_frame();
        assert_eq!(input.cursor_position(), None);
        assert_eq!(input.scroll_delta(), (0.0, 0.0));
        assert!(input.events().is_empty());
    }
}
