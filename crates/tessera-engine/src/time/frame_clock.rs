use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Index of this frame, starting at 0.
    pub frame_index: u64,
}

/// Delta-time clamps for a [`FrameClock`].
#[derive(Debug, Clone)]
pub struct FrameClockConfig {
    pub dt_min: Duration,
    /// Upper bound applied after stalls such as a debugger break.
    pub dt_max: Duration,
}

impl Default for FrameClockConfig {
    fn default() -> Self {
        Self {
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }
}

/// Produces one [`FrameTime`] per frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    config: FrameClockConfig,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_config(FrameClockConfig::default())
    }

    pub fn with_config(config: FrameClockConfig) -> Self {
        debug_assert!(config.dt_min <= config.dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            config,
        }
    }

    /// Restarts delta measurement from now, e.g. after the window was hidden.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.config.dt_min, self.config.dt_max);
        self.last = now;

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
