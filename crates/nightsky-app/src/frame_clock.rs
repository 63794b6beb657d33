//! Variable-rate frame clock.
//!
//! Every scene component is driven by the wall-clock delta of the display
//! frame. Long stalls (window drags, debugger breaks) are clamped so easing
//! and motion never jump.

use std::time::Instant;
use tracing::warn;

/// Maximum frame time fed to the scene.
pub const MAX_FRAME_TIME: f64 = 0.25; // 250ms = 4 FPS minimum

/// Length of the window the frame rate is averaged over.
const FPS_WINDOW: f64 = 1.0;

/// Measures per-frame deltas and keeps running totals.
pub struct FrameClock {
    previous_time: Instant,
    total_time: f64,
    frame_count: u64,
    window_time: f64,
    window_frames: u32,
    fps: f64,
}

impl FrameClock {
    /// Creates a new `FrameClock` starting from the current instant.
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            total_time: 0.0,
            frame_count: 0,
            window_time: 0.0,
            window_frames: 0,
            fps: 0.0,
        }
    }

    /// Measures the time since the previous call and returns the clamped delta
    /// in seconds.
    pub fn tick(&mut self) -> f32 {
        let current_time = Instant::now();
        let frame_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f64();
        self.previous_time = current_time;
        self.advance(frame_time)
    }

    /// Advance by an explicit frame time. Returns the delta handed to the scene.
    pub fn advance(&mut self, frame_time: f64) -> f32 {
        let mut frame_time = frame_time.max(0.0);

        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.total_time += frame_time;
        self.frame_count += 1;

        self.window_time += frame_time;
        self.window_frames += 1;
        if self.window_time >= FPS_WINDOW {
            self.fps = f64::from(self.window_frames) / self.window_time;
            self.window_time = 0.0;
            self.window_frames = 0;
        }

        frame_time as f32
    }

    /// Returns the total number of frames measured.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the sum of all clamped deltas in seconds.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Frames per second averaged over the last completed window. Zero until
    /// the first window completes.
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_delta_passes_through() {
        let mut clock = FrameClock::new();
        let delta = clock.advance(DT);
        assert!((f64::from(delta) - DT).abs() < 1e-7);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_max_frame_time_clamp() {
        let mut clock = FrameClock::new();
        let delta = clock.advance(1.0);
        assert!(
            (f64::from(delta) - MAX_FRAME_TIME).abs() < 1e-7,
            "1s frame should clamp to {MAX_FRAME_TIME}, got {delta}"
        );
        assert!((clock.total_time() - MAX_FRAME_TIME).abs() < 1e-12);
    }

    #[test]
    fn test_negative_frame_time_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-0.5), 0.0);
        assert_eq!(clock.total_time(), 0.0);
    }

    #[test]
    fn test_total_time_accumulates() {
        let mut clock = FrameClock::new();
        let frame_times = [0.017, 0.015, 0.020, 0.016, 0.033, 0.008, 0.018];
        for &ft in &frame_times {
            clock.advance(ft);
        }
        let expected: f64 = frame_times.iter().sum();
        assert!(
            (clock.total_time() - expected).abs() < 1e-12,
            "total_time {} != expected {}",
            clock.total_time(),
            expected
        );
        assert_eq!(clock.frame_count(), frame_times.len() as u64);
    }

    #[test]
    fn test_fps_after_one_second() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.fps(), 0.0, "no estimate before the first window");
        for _ in 0..61 {
            clock.advance(DT);
        }
        assert!(
            (clock.fps() - 60.0).abs() < 1.5,
            "fps should be ~60, got {}",
            clock.fps()
        );
    }

    #[test]
    fn test_frame_clock_default() {
        let clock = FrameClock::default();
        assert_eq!(clock.frame_count(), 0);
        assert!((clock.total_time() - 0.0).abs() < f64::EPSILON);
    }
}
