//! Frame pacing for the replay loop.
//!
//! Timestamps are monotonic milliseconds since the clock started, the same
//! base the network feeder stamps its reports with.

use std::time::{Duration, Instant};

use contrail_aircraft::FrameTick;
use tracing::warn;

/// Longest frame the trackers are allowed to see. A stall beyond this is
/// replayed as a slow frame rather than a jump.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Smoothing factor of the frame-rate estimate.
const FRAME_RATE_SMOOTHING: f32 = 0.1;

/// Clamps `frame_time` (seconds) to [`MAX_FRAME_TIME`].
pub fn clamp_frame_time(frame_time: f64) -> f64 {
    if frame_time > MAX_FRAME_TIME {
        warn!(
            "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
            frame_time * 1000.0,
            MAX_FRAME_TIME * 1000.0
        );
        MAX_FRAME_TIME
    } else {
        frame_time.max(0.0)
    }
}

/// Exponentially smoothed frames per second.
#[derive(Clone, Debug)]
pub struct FrameRateMeter {
    rate: f32,
}

impl FrameRateMeter {
    pub fn new(initial: f32) -> Self {
        Self { rate: initial }
    }

    /// Folds in one frame of `frame_time` seconds.
    pub fn record(&mut self, frame_time: f64) -> f32 {
        if frame_time > 0.0 {
            let instant = (1.0 / frame_time) as f32;
            self.rate += (instant - self.rate) * FRAME_RATE_SMOOTHING;
        }
        self.rate
    }
}

/// Where the next frame's time comes from.
pub trait FrameSource {
    /// Time of the next frame.
    fn next_frame(&mut self) -> FrameTick;
}

/// Frames paced by the wall clock at a target rate.
///
/// `now_ms` is the sum of the clamped frame times, so after a stall the
/// timestamps fall behind the wall clock by the clamped-away time and stay
/// consistent with `elapsed_secs`.
pub struct WallClock {
    previous: Instant,
    frame_time: Duration,
    frame_interval: Duration,
    meter: FrameRateMeter,
}

impl WallClock {
    pub fn new(frame_rate: u32, start: Instant) -> Self {
        let frame_rate = frame_rate.max(1);
        Self {
            previous: start,
            frame_time: Duration::ZERO,
            frame_interval: Duration::from_secs(1) / frame_rate,
            meter: FrameRateMeter::new(frame_rate as f32),
        }
    }
}

impl FrameSource for WallClock {
    fn next_frame(&mut self) -> FrameTick {
        let target = self.previous + self.frame_interval;
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        }
        let current = Instant::now();
        let elapsed = clamp_frame_time(current.duration_since(self.previous).as_secs_f64());
        self.previous = current;
        self.frame_time += Duration::from_secs_f64(elapsed);
        let now_ms = self.frame_time.as_millis() as u64;
        FrameTick::new(now_ms, elapsed, self.meter.record(elapsed))
    }
}

/// Frames at an exact fixed step, without sleeping.
#[derive(Clone, Debug)]
pub struct FixedStepClock {
    frame: u64,
    frame_rate: u32,
}

impl FixedStepClock {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame: 0,
            frame_rate: frame_rate.max(1),
        }
    }
}

impl FrameSource for FixedStepClock {
    fn next_frame(&mut self) -> FrameTick {
        let rate = self.frame_rate as u64;
        let now_ms = self.frame * 1_000 / rate;
        let elapsed_secs = if self.frame == 0 {
            0.0
        } else {
            (now_ms - (self.frame - 1) * 1_000 / rate) as f64 / 1_000.0
        };
        self.frame += 1;
        FrameTick::new(now_ms, elapsed_secs, self.frame_rate as f32)
    }
}
