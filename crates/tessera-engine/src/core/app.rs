use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`FrameLoop`](super::FrameLoop).
pub trait App {
    /// Called for each input event before it is folded into the input state.
    fn on_event(&mut self, event: &InputEvent) {
        let _ = event;
    }

    /// Called once per frame after the target was cleared and before it is
    /// presented.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
