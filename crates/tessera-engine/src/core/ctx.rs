use std::rc::Rc;

use crate::device::Device;
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
pub struct FrameCtx<'a> {
    pub device: &'a Rc<dyn Device>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    #[inline]
    pub fn dt(&self) -> f32 {
        self.time.dt
    }
}
