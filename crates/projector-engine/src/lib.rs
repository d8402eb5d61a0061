//! Projector engine crate.
//!
//! A background scene of image planes, each textured by projecting a slide from a
//! camera, is rendered offscreen and then sampled by a full-screen primary pass
//! (stripes, noise, text and pointer-trail masks), optionally followed by a post
//! chain. The [`orchestrator`] drives a frame; [`window`] and [`device`] own the
//! platform and GPU runtime.

pub mod assets;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod events;
pub mod logging;
pub mod material;
pub mod orchestrator;
pub mod overlay;
pub mod paint;
pub mod params;
pub mod render;
pub mod resize;
pub mod scene;
pub mod time;
pub mod window;
