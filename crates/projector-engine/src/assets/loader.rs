use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::ResourceLoadError;

use super::ImageData;

/// Identifies one `load_texture` request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// A finished load, delivered by [`AssetLoader::poll`].
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub path: PathBuf,
    pub result: Result<ImageData, ResourceLoadError>,
}

type Message = (LoadTicket, Result<ImageData, ResourceLoadError>);

struct Pending {
    path: PathBuf,
    worker: JoinHandle<()>,
}

/// Decodes images on worker threads.
///
/// Results are only handed out by [`poll`](Self::poll), which the orchestrator
/// calls between frames, so the scene is never mutated mid-pass.
pub struct AssetLoader {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    next_ticket: u64,
    pending: HashMap<LoadTicket, Pending>,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            next_ticket: 0,
            pending: HashMap::new(),
        }
    }

    /// Starts decoding `path` in the background.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> LoadTicket {
        let path = path.as_ref().to_path_buf();
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        let tx = self.tx.clone();
        let worker_path = path.clone();
        let worker = thread::spawn(move || {
            let result = decode_file(&worker_path);
            // The loader may have been dropped; nobody is waiting then.
            let _ = tx.send((ticket, result));
        });

        log::debug!("loading texture {} ({:?})", path.display(), ticket);
        self.pending.insert(ticket, Pending { path, worker });
        ticket
    }

    /// Number of loads that have not been delivered yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Collects every completed load without blocking.
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        // Workers that had already exited before draining must have sent their result.
        let finished: Vec<LoadTicket> = self
            .pending
            .iter()
            .filter(|(_, p)| p.worker.is_finished())
            .map(|(t, _)| *t)
            .collect();

        let mut outcomes: Vec<LoadOutcome> = Vec::new();
        while let Ok((ticket, result)) = self.rx.try_recv() {
            outcomes.extend(self.deliver(ticket, result));
        }

        for ticket in finished {
            if let Some(pending) = self.pending.get(&ticket) {
                let path = pending.path.clone();
                log::warn!("loader worker for {} died", path.display());
                outcomes.extend(self.deliver(ticket, Err(ResourceLoadError::WorkerGone { path })));
            }
        }

        outcomes
    }

    /// Blocks until every pending load has been delivered.
    pub fn wait_all(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while !self.pending.is_empty() {
            if let Ok((ticket, result)) = self.rx.recv_timeout(Duration::from_millis(5)) {
                outcomes.extend(self.deliver(ticket, result));
            }
            outcomes.extend(self.poll());
        }
        outcomes
    }

    fn deliver(
        &mut self,
        ticket: LoadTicket,
        result: Result<ImageData, ResourceLoadError>,
    ) -> Option<LoadOutcome> {
        let pending = self.pending.remove(&ticket)?;
        let _ = pending.worker.join();
        Some(LoadOutcome {
            ticket,
            path: pending.path,
            result,
        })
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and decodes an image file into RGBA8.
pub fn decode_file(path: &Path) -> Result<ImageData, ResourceLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ResourceLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(path, &bytes)
}

fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<ImageData, ResourceLoadError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| ResourceLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageData::from_rgba8(width, height, rgba.into_raw()).ok_or_else(|| {
        ResourceLoadError::Decode {
            path: path.to_path_buf(),
            source: image::ImageError::Limits(image::error::LimitError::from_kind(
                image::error::LimitErrorKind::DimensionError,
            )),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("projector-{}-{name}", std::process::id()))
    }

    #[test]
    fn decodes_png_on_worker() {
        let path = temp_path("slide.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut loader = AssetLoader::new();
        let ticket = loader.load_texture(&path);
        let outcomes = loader.wait_all();
        let _ = std::fs::remove_file(&path);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].ticket, ticket);
        let image = outcomes[0].result.as_ref().unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixel(2, 1), [10, 20, 30, 255]);
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut loader = AssetLoader::new();
        loader.load_texture(temp_path("does-not-exist.jpg"));
        let outcomes = loader.wait_all();
        assert!(matches!(outcomes[0].result, Err(ResourceLoadError::Io { .. })));
    }

    #[test]
    fn garbage_is_decode_error() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();
        let result = decode_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ResourceLoadError::Decode { .. })));
    }
}
