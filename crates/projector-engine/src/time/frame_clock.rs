use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Accumulated clamped time since the clock started, in seconds.
    ///
    /// Sum of every `dt` handed out so far, so it never decreases and never
    /// jumps by more than the delta clamp.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f64,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps (100 µs .. 250 ms).
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock whose baseline is `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            elapsed: 0.0,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    /// Advances the clock to `now`.
    ///
    /// A `now` earlier than the previous tick yields the minimum delta.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;
        self.elapsed += dt.as_secs_f64();

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed as f32,
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
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

    #[test]
    fn elapsed_accumulates_deltas() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let a = clock.tick_at(start + Duration::from_millis(16));
        let b = clock.tick_at(start + Duration::from_millis(32));

        assert!((a.dt - 0.016).abs() < 1e-6);
        assert!((b.elapsed - 0.032).abs() < 1e-6);
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
    }

    #[test]
    fn delta_is_clamped_after_stall() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert!((ft.elapsed - 0.25).abs() < 1e-6);
    }

    #[test]
    fn elapsed_never_decreases() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::starting_at(start);

        let first = clock.tick_at(start + Duration::from_millis(10));
        // Going backwards in time still produces the minimum positive delta.
        let second = clock.tick_at(start);
        assert!(second.elapsed > first.elapsed);
        assert!(second.dt > 0.0);
    }
}
