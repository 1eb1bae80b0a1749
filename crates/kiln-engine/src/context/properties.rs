use crate::color::Color;
use crate::input::CursorMode;

/// Window a context renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowProperties {
    pub title: String,
    /// Inner size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub decorated: bool,
    pub visible: bool,
    /// Outer position in physical pixels; platform default when `None`.
    pub position: Option<(i32, i32)>,
    pub cursor_mode: CursorMode,
}

impl Default for WindowProperties {
    fn default() -> Self {
        Self {
            title: "kiln".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
            decorated: true,
            visible: true,
            position: None,
            cursor_mode: CursorMode::Normal,
        }
    }
}

impl WindowProperties {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    pub fn with_cursor_mode(mut self, mode: CursorMode) -> Self {
        self.cursor_mode = mode;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextProperties {
    pub window: WindowProperties,
    pub clear_color: Color,
}

impl Default for ContextProperties {
    fn default() -> Self {
        Self {
            window: WindowProperties::default(),
            clear_color: Color::black(),
        }
    }
}

impl ContextProperties {
    pub fn new(window: WindowProperties, clear_color: Color) -> Self {
        Self {
            window,
            clear_color,
        }
    }
}
