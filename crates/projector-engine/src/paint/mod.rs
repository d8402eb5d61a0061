//! Colors.

mod color;

pub use color::{Color, ParseColorError};
pub(crate) use color::{linear_to_srgb, srgb_to_linear};
