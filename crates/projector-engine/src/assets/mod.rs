//! Images and their background loader.

mod image_data;
mod loader;
mod store;

pub use image_data::ImageData;
pub use loader::{decode_file, AssetLoader, LoadOutcome, LoadTicket};
pub use store::{TextureId, TextureStore};
