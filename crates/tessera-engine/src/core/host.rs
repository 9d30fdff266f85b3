use crate::input::InputEvent;

/// The window and context owner the frame loop runs against.
///
/// A host creates the window and graphics context, pumps the OS event queue
/// and swaps buffers. The core never does any of these itself.
pub trait Host {
    /// False once the window is gone or the host wants to stop.
    fn should_continue(&self) -> bool;

    /// Appends the events received since the last call to `events`.
    fn poll_events(&mut self, events: &mut Vec<InputEvent>);

    /// Presents the finished frame.
    fn present(&mut self) -> anyhow::Result<()>;
}
