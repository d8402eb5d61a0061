use projector_engine::core::{App, AppControl, FrameCtx};
use projector_engine::orchestrator::{Orchestrator, Phase, StageConfig};
use projector_engine::render::{FilmEffect, FilmSettings, GpuFrameRenderer, PassSet};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

pub struct StudioOptions {
    pub stage: StageConfig,
    pub film: bool,
    pub params: Vec<(String, f32)>,
}

/// Drives the orchestrator from the window runtime.
///
/// The orchestrator and the GPU passes are created on the first frame, once the
/// surface exists and the event channel can be subscribed to.
pub struct ProjectionApp {
    orchestrator: Orchestrator,
    passes: Option<PassSet>,
    font: Option<fontdue::Font>,
    film: bool,
    params: Vec<(String, f32)>,
    title: String,
}

impl ProjectionApp {
    pub fn new(options: StudioOptions, font: Option<fontdue::Font>) -> Self {
        Self {
            orchestrator: Orchestrator::new(options.stage),
            passes: None,
            font,
            film: options.film,
            params: options.params,
            title: String::new(),
        }
    }

    fn start(&mut self, ctx: &mut FrameCtx<'_, '_>) {
        let size = ctx.window.viewport();
        self.orchestrator
            .init(size, ctx.events, self.font.take(), ctx.now);

        for (name, value) in self.params.drain(..) {
            match self.orchestrator.set_param(&name, value) {
                Ok(change) => log::info!("{} = {:.4}", change.name, change.value),
                Err(e) => log::warn!("{e}"),
            }
        }

        let mut passes = PassSet::new(size);
        if self.film {
            passes.add_post_effect(Box::new(FilmEffect::new(FilmSettings::default())));
        }
        self.passes = Some(passes);
    }

    /// Window title doubles as the parameter readout.
    fn panel_title(&self) -> String {
        let panel = self.orchestrator.panel();
        let name = panel.selected();
        format!("projector  [{name} = {:.3}]", panel.get(name).value)
    }
}

impl App for ProjectionApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.orchestrator.phase() == Phase::Uninitialized {
            self.start(ctx);
        }

        let Some(passes) = self.passes.as_mut() else {
            return AppControl::Continue;
        };
        let orchestrator = &mut self.orchestrator;
        let now = ctx.now;

        let control = ctx.render(|rctx, encoder, view| {
            let mut renderer = GpuFrameRenderer::new(rctx, encoder, view, passes);
            orchestrator.frame(&mut renderer, now).map(|_| ())
        });

        let title = self.panel_title();
        if title != self.title {
            ctx.runtime.set_title(title.clone());
            self.title = title;
        }

        control
    }
}
