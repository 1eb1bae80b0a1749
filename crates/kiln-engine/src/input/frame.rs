use std::collections::HashSet;

use super::types::{InputEvent, KeyCode, MouseButton};

/// Transitions and events collected during one frame.
#[derive(Debug, Default)]
pub(super) struct InputFrame {
    pub(super) events: Vec<InputEvent>,
    pub(super) keys_pressed: HashSet<KeyCode>,
    pub(super) keys_released: HashSet<KeyCode>,
    pub(super) buttons_pressed: HashSet<MouseButton>,
    pub(super) buttons_released: HashSet<MouseButton>,
    pub(super) scroll: (f32, f32),
    pub(super) text: String,
}

impl InputFrame {
    pub(super) fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.scroll = (0.0, 0.0);
        self.text.clear();
    }
}
