//! Deterministic looping tweens.
//!
//! A tween is a small state machine (phase, direction, bounds) advanced by frame
//! delta. No timers or callbacks are involved, so a given sequence of deltas
//! always produces the same values.

/// Easing applied to the normalized phase.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Ease {
    Linear,
    /// Decelerating quadratic, `1 - (1 - t)^2`.
    #[default]
    QuadOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// What happens when a cycle completes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Repeat {
    /// Jump back to `from` and play forward again.
    #[default]
    Restart,
    /// Reverse direction at each end.
    Yoyo,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Endlessly repeating interpolation between two values.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopingTween {
    from: f32,
    to: f32,
    duration: f32,
    ease: Ease,
    repeat: Repeat,

    phase: f32,
    direction: Direction,
    cycles: u64,
}

impl LoopingTween {
    /// Creates a tween starting at `from`. A non-positive duration is clamped to 1 ms.
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.001),
            ease: Ease::default(),
            repeat: Repeat::default(),
            phase: 0.0,
            direction: Direction::Forward,
            cycles: 0,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// `(min, max)` envelope every produced value stays within.
    pub fn bounds(&self) -> (f32, f32) {
        (self.from.min(self.to), self.from.max(self.to))
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Completed cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        let t = self.ease.apply(self.phase);
        let (lo, hi) = self.bounds();
        (self.from + (self.to - self.from) * t).clamp(lo, hi)
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return self.value();
        }

        let mut remaining = dt / self.duration;
        while remaining > 0.0 {
            let to_edge = match self.direction {
                Direction::Forward => 1.0 - self.phase,
                Direction::Backward => self.phase,
            };

            if remaining < to_edge {
                match self.direction {
                    Direction::Forward => self.phase += remaining,
                    Direction::Backward => self.phase -= remaining,
                }
                break;
            }

            remaining -= to_edge;
            self.cycles = self.cycles.saturating_add(1);
            match (self.repeat, self.direction) {
                (Repeat::Restart, _) => self.phase = 0.0,
                (Repeat::Yoyo, Direction::Forward) => {
                    self.phase = 1.0;
                    self.direction = Direction::Backward;
                }
                (Repeat::Yoyo, Direction::Backward) => {
                    self.phase = 0.0;
                    self.direction = Direction::Forward;
                }
            }
        }

        self.value()
    }
}

/// Position-x and opacity tweens driven together, one pair per element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementAnimation {
    pub x: LoopingTween,
    pub opacity: LoopingTween,
}

impl ElementAnimation {
    /// Slides `x` by `offset` and fades `opacity` to zero over the same `duration`.
    pub fn drift_and_fade(x: f32, offset: f32, opacity: f32, duration: f32) -> Self {
        Self {
            x: LoopingTween::new(x, x + offset, duration),
            opacity: LoopingTween::new(opacity, 0.0, duration),
        }
    }

    /// Returns `(x, opacity)` after advancing both tweens by `dt`.
    pub fn advance(&mut self, dt: f32) -> (f32, f32) {
        (self.x.advance(dt), self.opacity.advance(dt))
    }
}
