//! Scene model: cameras, lights, elements and their animation.
//!
//! Cameras live in a [`CameraRegistry`] and are referenced by [`CameraId`].
//! A [`Scene`] owns its [`SceneElement`]s and keeps insertion order.
//! [`OrbitControls`] move a camera from pointer input.

mod animation;
mod camera;
mod element;
mod graph;
mod light;
mod orbit;
mod registry;
mod transform;

pub use animation::{Direction, Ease, ElementAnimation, LoopingTween, Repeat};
pub use camera::{Camera, Projection, Ray};
pub use element::{Geometry, SceneElement};
pub use graph::{NodeId, Scene};
pub use light::PointLight;
pub use orbit::OrbitControls;
pub use registry::{CameraId, CameraRegistry};
pub use transform::Transform;
