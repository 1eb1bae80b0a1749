use std::fmt;

/// Physical keyboard key (US layout names).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyCode {
    Space,
    Apostrophe,
    Comma,
    Minus,
    Period,
    Slash,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Semicolon,
    Equal,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    LeftBracket,
    Backslash,
    RightBracket,
    GraveAccent,

    Escape,
    Enter,
    Tab,
    Backspace,
    Insert,
    Delete,
    Right, Left, Down, Up,
    PageUp, PageDown, Home, End,
    CapsLock, ScrollLock, NumLock,
    PrintScreen, Pause,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Keypad0, Keypad1, Keypad2, Keypad3, Keypad4,
    Keypad5, Keypad6, Keypad7, Keypad8, Keypad9,
    KeypadDecimal,
    KeypadDivide,
    KeypadMultiply,
    KeypadSubtract,
    KeypadAdd,
    KeypadEnter,
    KeypadEqual,

    LeftShift, LeftControl, LeftAlt, LeftSuper,
    RightShift, RightControl, RightAlt, RightSuper,
    Menu,

    /// Key not represented above, with its platform code.
    Unknown(u32),
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Edge reported by a key or button event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Polled state of a key or button within the current frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum KeyMode {
    #[default]
    None,
    /// Went down this frame.
    Pressed,
    /// Down since an earlier frame.
    Held,
    /// Went up this frame.
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// How the cursor behaves over a window.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CursorMode {
    #[default]
    Normal,
    /// Invisible while over the window, free to leave it.
    Hidden,
    /// Invisible and locked to the window (relative motion, e.g. camera control).
    Disabled,
    /// Visible and confined to the window.
    Captured,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Mouse wheel delta.
///
/// `Line` corresponds to "scroll lines" style input; `Pixel` is high precision.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

/// Platform-agnostic input events emitted by the runtime.
///
/// Positions are in logical pixels, origin top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: KeyCode,
        state: KeyState,
        /// True when the event is an OS key-repeat.
        repeat: bool,
    },

    CursorMoved { x: f32, y: f32 },
    CursorLeft,

    MouseButton { button: MouseButton, state: KeyState },

    MouseWheel(MouseWheelDelta),

    /// Committed text (IME or plain typing).
    Text(String),

    Focused(bool),
}
