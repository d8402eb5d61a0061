//! GPU rendering subsystem.
//!
//! Passes, in frame order:
//! - [`OffscreenPass`]: background scene into its own target,
//! - [`PrimaryPass`]: full-screen triangle sampling that target and the overlays,
//! - [`PostChain`]: optional full-screen effects, the last one writing the surface.
//!
//! Each pass owns its GPU resources and builds pipelines lazily for the output format.
//! [`software`] renders the background scene on the CPU for tests.

mod common;
mod ctx;
mod frame;
mod offscreen;
mod post;
mod primary;
pub mod software;
mod target;
mod texture;

pub use ctx::RenderCtx;
pub use frame::{GpuFrameRenderer, PassSet};
pub use offscreen::{OffscreenPass, MAX_LIGHTS};
pub use post::{routing, FilmEffect, FilmSettings, PostChain, PostEffect, Slot};
pub use primary::{PrimaryInputs, PrimaryPass, PrimaryUniforms};
pub use target::OffscreenTarget;
pub use texture::{OverlayTexture, TextureCache};
