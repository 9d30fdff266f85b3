use std::fmt;

/// Keyboard key identifier.
///
/// Covers what a first-person viewer binds. Other keys arrive as
/// `Key::Unknown` carrying the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input events handed to the frame loop by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The host asked the application to stop.
    Quit,

    Key {
        key: Key,
        state: KeyState,
        /// True when the event is an auto-repeat.
        repeat: bool,
    },

    /// Relative pointer movement, unaffected by cursor clamping.
    PointerMotion { dx: f32, dy: f32 },

    Focused(bool),
}
