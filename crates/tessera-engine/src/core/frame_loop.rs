use std::rc::Rc;

use anyhow::{Context, Result};
use glam::Vec4;

use crate::device::Device;
use crate::input::{InputEvent, InputFrame, InputState};
use crate::time::{FrameClock, FrameClockConfig};

use super::app::{App, AppControl};
use super::ctx::FrameCtx;
use super::host::Host;

#[derive(Debug, Clone)]
pub struct FrameLoopConfig {
    /// Color the target is cleared to before each frame.
    pub clear_color: Vec4,
    /// Stop after this many frames; `None` runs until told to stop.
    pub max_frames: Option<u64>,
    pub clock: FrameClockConfig,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            max_frames: None,
            clock: FrameClockConfig::default(),
        }
    }
}

/// Why [`FrameLoop::run`] returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StopReason {
    /// The app returned [`AppControl::Exit`].
    AppExit,
    /// A [`InputEvent::Quit`] arrived.
    Quit,
    /// [`Host::should_continue`] returned false.
    HostClosed,
    FrameLimit,
}

/// Drives an [`App`] against a [`Host`] one frame at a time.
pub struct FrameLoop {
    config: FrameLoopConfig,
    clock: FrameClock,
    input: InputState,
    input_frame: InputFrame,
    events: Vec<InputEvent>,
    frames: u64,
}

impl FrameLoop {
    pub fn new(config: FrameLoopConfig) -> Self {
        let clock = FrameClock::with_config(config.clock.clone());
        Self {
            config,
            clock,
            input: InputState {
                focused: true,
                ..Default::default()
            },
            input_frame: InputFrame::default(),
            events: Vec::new(),
            frames: 0,
        }
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs frames until the app exits, a quit event arrives, the host stops
    /// or the frame limit is reached.
    ///
    /// Each frame polls and applies input, clears, calls
    /// [`App::on_frame`] and presents.
    pub fn run(
        &mut self,
        host: &mut dyn Host,
        device: &Rc<dyn Device>,
        app: &mut dyn App,
    ) -> Result<StopReason> {
        self.clock.reset();
        loop {
            if self.config.max_frames.is_some_and(|max| self.frames >= max) {
                log::debug!("frame limit of {} reached", self.frames);
                return Ok(StopReason::FrameLimit);
            }
            if !host.should_continue() {
                return Ok(StopReason::HostClosed);
            }

            let time = self.clock.tick();

            self.input_frame.clear();
            self.events.clear();
            host.poll_events(&mut self.events);
            for event in self.events.drain(..) {
                app.on_event(&event);
                self.input.apply_event(&mut self.input_frame, event);
            }
            if self.input_frame.quit_requested {
                log::info!("quit requested after {} frame(s)", self.frames);
                return Ok(StopReason::Quit);
            }

            device.clear(self.config.clear_color);
            let control = {
                let mut ctx = FrameCtx {
                    device,
                    input: &self.input,
                    input_frame: &self.input_frame,
                    time,
                };
                app.on_frame(&mut ctx)
            };

            host.present()
                .with_context(|| format!("failed to present frame {}", time.frame_index))?;
            self.frames += 1;

            if control == AppControl::Exit {
                return Ok(StopReason::AppExit);
            }
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(FrameLoopConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::device::HeadlessDevice;
    use crate::device::headless::Command;
    use crate::input::{Key, KeyState};

    #[derive(Default)]
    struct ScriptedHost {
        frames: VecDeque<Vec<InputEvent>>,
        presented: usize,
        fail_present: bool,
    }

    impl Host for ScriptedHost {
        fn should_continue(&self) -> bool {
            !self.frames.is_empty()
        }

        fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
            if let Some(batch) = self.frames.pop_front() {
                events.extend(batch);
            }
        }

        fn present(&mut self) -> anyhow::Result<()> {
            anyhow::ensure!(!self.fail_present, "swap chain lost");
            self.presented += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen_events: usize,
        w_pressed_on: Vec<u64>,
        exit_after: Option<u64>,
    }

    impl App for Recorder {
        fn on_event(&mut self, _event: &InputEvent) {
            self.seen_events += 1;
        }

        fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
            if ctx.input_frame.keys_pressed.contains(&Key::W) {
                self.w_pressed_on.push(ctx.time.frame_index);
            }
            match self.exit_after {
                Some(n) if ctx.time.frame_index + 1 >= n => AppControl::Exit,
                _ => AppControl::Continue,
            }
        }
    }

    fn press(key: Key) -> InputEvent {
        InputEvent::Key {
            key,
            state: KeyState::Pressed,
            repeat: false,
        }
    }

    fn device() -> (Rc<HeadlessDevice>, Rc<dyn Device>) {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Rc<dyn Device> = headless.clone();
        (headless, device)
    }

    #[test]
    fn quit_event_stops_before_drawing() {
        let (headless, device) = device();
        let mut host = ScriptedHost {
            frames: VecDeque::from([vec![], vec![InputEvent::Quit]]),
            ..Default::default()
        };
        let mut app = Recorder::default();
        let mut frame_loop = FrameLoop::default();

        let reason = frame_loop.run(&mut host, &device, &mut app).unwrap();
        assert_eq!(reason, StopReason::Quit);
        assert_eq!(host.presented, 1);
        let clears = headless
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Clear(_)))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn events_reach_app_and_input_frame() {
        let (_headless, device) = device();
        let mut host = ScriptedHost {
            frames: VecDeque::from([vec![], vec![press(Key::W)], vec![]]),
            ..Default::default()
        };
        let mut app = Recorder::default();
        let mut frame_loop = FrameLoop::default();

        let reason = frame_loop.run(&mut host, &device, &mut app).unwrap();
        assert_eq!(reason, StopReason::HostClosed);
        assert_eq!(app.seen_events, 1);
        assert_eq!(app.w_pressed_on, vec![1]);
        assert_eq!(frame_loop.frames(), 3);
    }

    #[test]
    fn app_exit_and_frame_limit_stop_the_loop() {
        let (_headless, device) = device();
        let endless = || ScriptedHost {
            frames: (0..100).map(|_| Vec::new()).collect(),
            ..Default::default()
        };

        let mut app = Recorder {
            exit_after: Some(2),
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::default();
        let reason = frame_loop.run(&mut endless(), &device, &mut app).unwrap();
        assert_eq!(reason, StopReason::AppExit);
        assert_eq!(frame_loop.frames(), 2);

        let mut limited = FrameLoop::new(FrameLoopConfig {
            max_frames: Some(5),
            ..Default::default()
        });
        let reason = limited.run(&mut endless(), &device, &mut Recorder::default()).unwrap();
        assert_eq!(reason, StopReason::FrameLimit);
        assert_eq!(limited.frames(), 5);
    }

    #[test]
    fn present_failure_is_reported_with_frame() {
        let (_headless, device) = device();
        let mut host = ScriptedHost {
            frames: VecDeque::from([vec![]]),
            fail_present: true,
            ..Default::default()
        };
        let err = FrameLoop::default()
            .run(&mut host, &device, &mut Recorder::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to present frame 0");
        assert_eq!(err.root_cause().to_string(), "swap chain lost");
    }
}
