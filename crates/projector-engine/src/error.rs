//! Engine error taxonomy.
//!
//! - [`ConfigurationError`]: an element could not be set up; only that element is skipped.
//! - [`ResourceLoadError`]: an asset failed to load; the scene continues without it.
//! - [`FrameError`]: one frame could not be completed; the loop carries on.
//!
//! Resize races have no error type: resizes are only applied between frames.

use std::path::PathBuf;

use crate::assets::TextureId;
use crate::scene::CameraId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("projected material requires a reference camera")]
    MissingCamera,

    #[error("projected material requires a source texture")]
    MissingTexture,

    #[error("camera {0:?} is not registered")]
    UnknownCamera(CameraId),

    #[error("texture {0:?} is not loaded")]
    UnknownTexture(TextureId),

    #[error("texture scale must be finite and positive, got {0}")]
    InvalidTextureScale(f32),
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceLoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("loader worker for {path} exited without a result")]
    WorkerGone { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame requested before the orchestrator was initialized")]
    NotInitialized,

    #[error("{pass} pass camera is not registered")]
    MissingCamera { pass: &'static str },

    #[error("{pass} pass has no render target")]
    MissingTarget { pass: &'static str },

    #[error("{pass} pass could not bind texture {texture:?}")]
    MissingTexture { pass: &'static str, texture: TextureId },
}
