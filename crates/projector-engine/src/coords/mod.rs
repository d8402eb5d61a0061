//! Output-space sizes.

mod viewport;

pub use viewport::Viewport;
