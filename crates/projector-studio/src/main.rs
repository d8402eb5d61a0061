mod app;
mod cli;

use anyhow::Result;
use clap::Parser;
use projector_engine::device::GpuInit;
use projector_engine::logging::{init_logging, LoggingConfig};
use projector_engine::overlay::TextCanvas;
use projector_engine::window::{Runtime, RuntimeConfig};

use app::ProjectionApp;
use cli::Cli;

fn main() -> Result<()> {
    let options = Cli::parse().into_options();
    init_logging(LoggingConfig::default());

    let font = load_font().and_then(|bytes| match TextCanvas::load_font(&bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("{e}; overlay text disabled");
            None
        }
    });

    Runtime::run(
        RuntimeConfig::default(),
        GpuInit::default(),
        ProjectionApp::new(options, font),
    )
}

fn load_font() -> Option<Vec<u8>> {
    [
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
}
