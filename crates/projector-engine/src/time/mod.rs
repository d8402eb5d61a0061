//! Time subsystem.
//!
//! One `FrameClock` per render loop, owned by the orchestrator; `tick_at(now)` once
//! per frame yields a `FrameTime` carrying both the frame delta and accumulated elapsed time.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
