//! Frame orchestrator.
//!
//! Owns the stage (cameras, scenes, textures, overlays, uniforms) and drives one
//! frame at a time through a [`FrameRenderer`]:
//!
//! 1. advance the clock,
//! 2. drain viewport events and finished texture loads,
//! 3. orbit the background camera from pointer input, then apply a debounced
//!    resize if one is due,
//! 4. animate and push uniforms,
//! 5. offscreen pass, primary pass, then the post chain if it has stages.
//!
//! A failing step aborts the rest of that frame only.

mod config;
mod stage;

pub use config::StageConfig;
pub use stage::Stage;

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{AssetLoader, LoadTicket};
use crate::coords::Viewport;
use crate::error::FrameError;
use crate::events::{EventChannel, Key, Subscription, ViewportEvent};
use crate::overlay::DynamicTexture;
use crate::params::{ParamChange, ParamPanel, UnknownParam};
use crate::resize::ResizeDebouncer;
use crate::scene::OrbitControls;
use crate::time::{FrameClock, FrameTime};

/// Shader time runs at half of wall time.
pub const SHADER_TIME_SCALE: f32 = 0.5;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Uninitialized,
    Running,
}

/// GPU side of a frame. Called by the orchestrator in fixed order.
pub trait FrameRenderer {
    /// Reallocates output-sized resources. Called between frames only.
    fn resize(&mut self, size: Viewport) -> Result<(), FrameError>;

    fn render_offscreen(&mut self, stage: &mut Stage) -> Result<(), FrameError>;

    fn render_primary(&mut self, stage: &mut Stage) -> Result<(), FrameError>;

    fn post_stage_count(&self) -> usize;

    fn render_post(&mut self, stage: &mut Stage) -> Result<(), FrameError>;
}

pub struct Orchestrator {
    config: StageConfig,
    phase: Phase,
    clock: FrameClock,
    stage: Option<Stage>,

    debouncer: ResizeDebouncer,
    subscription: Option<Subscription<ViewportEvent>>,
    orbit: Option<OrbitControls>,

    loader: AssetLoader,
    slide_ticket: Option<LoadTicket>,
    panel: ParamPanel,
    rng: StdRng,
}

impl Orchestrator {
    pub fn new(config: StageConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let debouncer = ResizeDebouncer::new(Viewport::default(), config.resize_debounce);
        Self {
            config,
            phase: Phase::Uninitialized,
            clock: FrameClock::new(),
            stage: None,
            debouncer,
            subscription: None,
            orbit: None,
            loader: AssetLoader::new(),
            slide_ticket: None,
            panel: ParamPanel::new(),
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn panel(&self) -> &ParamPanel {
        &self.panel
    }

    /// Builds the stage and subscribes to `events`.
    ///
    /// Order: cameras and scenes, lights, targets and overlays, the slide load that
    /// later creates the materials, and finally the event subscription.
    pub fn init(
        &mut self,
        size: Viewport,
        events: &EventChannel<ViewportEvent>,
        font: Option<fontdue::Font>,
        now: Instant,
    ) {
        if self.phase == Phase::Running {
            log::warn!("orchestrator already initialized");
            return;
        }

        let size = Viewport::new(size.width.max(1), size.height.max(1));
        let stage = Stage::build(&self.config, size, self.panel.values(), font);
        self.orbit = match stage.cameras.get(stage.background_camera) {
            Some(camera) if self.config.orbit_controls => Some(OrbitControls::from_camera(camera)),
            _ => None,
        };
        self.stage = Some(stage);
        self.debouncer = ResizeDebouncer::new(size, self.config.resize_debounce);

        let path = self.config.texture_path.clone();
        log::info!("loading slide {}", path.display());
        self.slide_ticket = Some(self.loader.load_texture(path));

        self.subscription = Some(events.subscribe());
        self.clock = FrameClock::starting_at(now);
        self.phase = Phase::Running;
        log::info!("orchestrator running at {}x{}", size.width, size.height);
    }

    /// Inserts an already decoded slide and spawns its elements. Returns how many were added.
    pub fn insert_slide(&mut self, image: crate::assets::ImageData) -> Result<usize, FrameError> {
        let stage = self.stage.as_mut().ok_or(FrameError::NotInitialized)?;
        let texture = stage.textures.insert(image);
        let added = stage.populate(&self.config, texture, &mut self.rng);
        log::info!("slide ready: {added} elements projected");
        Ok(added)
    }

    /// Sets a panel parameter by name and forwards it to the primary uniforms.
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<ParamChange, UnknownParam> {
        let change = self.panel.set(name, value)?;
        self.push_params();
        Ok(change)
    }

    /// Runs one frame. Errors are logged here and abort only this frame.
    pub fn frame(&mut self, renderer: &mut dyn FrameRenderer, now: Instant) -> Result<FrameTime, FrameError> {
        let result = self.run_frame(renderer, now);
        if let Err(e) = &result {
            log::warn!("frame aborted: {e}");
        }
        result
    }

    fn run_frame(&mut self, renderer: &mut dyn FrameRenderer, now: Instant) -> Result<FrameTime, FrameError> {
        if self.phase != Phase::Running {
            return Err(FrameError::NotInitialized);
        }

        let time = self.clock.tick_at(now);
        self.drain_events(now);
        self.drain_loads();
        self.apply_orbit();

        if let Some(size) = self.debouncer.poll(now) {
            self.apply_resize(size, renderer)?;
        }

        let stage = self.stage.as_mut().ok_or(FrameError::NotInitialized)?;
        stage.animate(time.dt);
        stage.shader_time = time.elapsed * SHADER_TIME_SCALE;
        stage.primary.time = stage.shader_time;
        stage.text.update(stage.shader_time, time.dt);
        stage.trail.update(stage.shader_time, time.dt);

        renderer.render_offscreen(stage)?;
        renderer.render_primary(stage)?;
        if renderer.post_stage_count() > 0 {
            renderer.render_post(stage)?;
        }
        Ok(time)
    }

    fn drain_events(&mut self, now: Instant) {
        let Some(subscription) = self.subscription.as_ref() else { return };
        let events: Vec<ViewportEvent> = subscription.drain().collect();

        for event in events {
            match event {
                ViewportEvent::Resized { width, height } => {
                    self.debouncer.push(Viewport::new(width, height), now);
                }
                ViewportEvent::PointerMoved { x, y } => {
                    if let Some(stage) = self.stage.as_mut() {
                        stage.trail.add_touch(x, y);
                    }
                    if let Some(orbit) = self.orbit.as_mut() {
                        orbit.pointer_moved(x, y);
                    }
                }
                ViewportEvent::PointerButton { pressed } => {
                    if let Some(orbit) = self.orbit.as_mut() {
                        orbit.set_dragging(pressed);
                    }
                }
                ViewportEvent::Scrolled { lines } => {
                    if let Some(orbit) = self.orbit.as_mut() {
                        orbit.scroll(lines);
                    }
                }
                ViewportEvent::KeyPressed(key) => self.handle_key(key),
            }
        }
    }

    /// Moves the background camera only. Bound materials keep the matrices captured
    /// when they were projected.
    fn apply_orbit(&mut self) {
        let (Some(orbit), Some(stage)) = (self.orbit.as_mut(), self.stage.as_mut()) else {
            return;
        };
        if let Some(camera) = stage.cameras.get_mut(stage.background_camera) {
            if orbit.apply(camera) {
                log::trace!("background camera at {} (zoom {:.2})", camera.position(), orbit.zoom());
            }
        }
    }

    fn handle_key(&mut self, key: Key) {
        let change = match key {
            Key::Digit(d @ 1..=5) => {
                self.panel.select(d as usize - 1);
                None
            }
            Key::ArrowUp | Key::ArrowRight => Some(self.panel.nudge(1)),
            Key::ArrowDown | Key::ArrowLeft => Some(self.panel.nudge(-1)),
            _ => None,
        };
        if let Some(change) = change {
            log::info!("{} = {:.4}", change.name, change.value);
            self.push_params();
        }
    }

    fn push_params(&mut self) {
        if let Some(stage) = self.stage.as_mut() {
            stage.primary.set_params(self.panel.values());
        }
    }

    fn drain_loads(&mut self) {
        for outcome in self.loader.poll() {
            if Some(outcome.ticket) != self.slide_ticket {
                continue;
            }
            self.slide_ticket = None;
            match outcome.result {
                Ok(image) => {
                    if let Err(e) = self.insert_slide(image) {
                        log::warn!("slide {} dropped: {e}", outcome.path.display());
                    }
                }
                Err(e) => {
                    log::warn!("{e}; continuing without projected elements");
                }
            }
        }
    }

    fn apply_resize(&mut self, size: Viewport, renderer: &mut dyn FrameRenderer) -> Result<(), FrameError> {
        let stage = self.stage.as_mut().ok_or(FrameError::NotInitialized)?;
        renderer.resize(size)?;
        stage.resize(size);
        log::info!("resized to {}x{}", size.width, size.height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec3;

    use super::*;
    use crate::assets::ImageData;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Resize(Viewport),
        Offscreen,
        Primary,
        Post,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        post_stages: usize,
        fail_offscreen: bool,
    }

    impl FrameRenderer for Recorder {
        fn resize(&mut self, size: Viewport) -> Result<(), FrameError> {
            self.calls.push(Call::Resize(size));
            Ok(())
        }

        fn render_offscreen(&mut self, _stage: &mut Stage) -> Result<(), FrameError> {
            self.calls.push(Call::Offscreen);
            if self.fail_offscreen {
                return Err(FrameError::MissingTarget { pass: "offscreen" });
            }
            Ok(())
        }

        fn render_primary(&mut self, _stage: &mut Stage) -> Result<(), FrameError> {
            self.calls.push(Call::Primary);
            Ok(())
        }

        fn post_stage_count(&self) -> usize {
            self.post_stages
        }

        fn render_post(&mut self, _stage: &mut Stage) -> Result<(), FrameError> {
            self.calls.push(Call::Post);
            Ok(())
        }
    }

    fn config() -> StageConfig {
        StageConfig {
            seed: Some(7),
            texture_path: "does-not-exist.jpg".into(),
            ..StageConfig::default()
        }
    }

    fn running(events: &EventChannel<ViewportEvent>, t0: Instant) -> Orchestrator {
        let mut orchestrator = Orchestrator::new(config());
        orchestrator.init(Viewport::new(800, 600), events, None, t0);
        orchestrator
    }

    #[test]
    fn frame_before_init_is_an_error() {
        let mut orchestrator = Orchestrator::new(config());
        let mut recorder = Recorder::default();
        let result = orchestrator.frame(&mut recorder, Instant::now());
        assert!(matches!(result, Err(FrameError::NotInitialized)));
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn passes_run_in_order() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder { post_stages: 1, ..Recorder::default() };

        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16)).unwrap();
        assert_eq!(recorder.calls, vec![Call::Offscreen, Call::Primary, Call::Post]);
    }

    #[test]
    fn empty_post_chain_is_skipped() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16)).unwrap();
        assert_eq!(recorder.calls, vec![Call::Offscreen, Call::Primary]);
    }

    #[test]
    fn failing_step_aborts_only_that_frame() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder { fail_offscreen: true, ..Recorder::default() };

        assert!(orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16)).is_err());
        assert_eq!(recorder.calls, vec![Call::Offscreen]);

        recorder.fail_offscreen = false;
        recorder.calls.clear();
        let time = orchestrator.frame(&mut recorder, t0 + Duration::from_millis(32)).unwrap();
        assert_eq!(recorder.calls, vec![Call::Offscreen, Call::Primary]);
        assert_eq!(time.frame_index, 1);
    }

    #[test]
    fn debounced_resize_applies_once() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        events.publish(ViewportEvent::Resized { width: 1000, height: 500 });
        events.publish(ViewportEvent::Resized { width: 1200, height: 600 });
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(10)).unwrap();
        assert!(!recorder.calls.contains(&Call::Resize(Viewport::new(1200, 600))));

        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(600)).unwrap();
        let resizes: Vec<&Call> =
            recorder.calls.iter().filter(|c| matches!(c, Call::Resize(_))).collect();
        assert_eq!(resizes, vec![&Call::Resize(Viewport::new(1200, 600))]);

        let stage = orchestrator.stage().unwrap();
        let camera = stage.cameras.get(stage.background_camera).unwrap();
        assert_eq!(camera.aspect(), 1200.0 / 600.0);
        assert_eq!(stage.target_size, Viewport::new(1200, 600));
        assert_eq!(stage.primary.resolution, [1200.0, 600.0]);
        assert_eq!(stage.primary.frustum, [-2.0, 2.0, -1.0, 1.0]);
        assert_eq!(stage.trail.size(), Viewport::new(300, 150));

        // Same size again: nothing to do.
        events.publish(ViewportEvent::Resized { width: 1200, height: 600 });
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(700)).unwrap();
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(1300)).unwrap();
        let resizes = recorder.calls.iter().filter(|c| matches!(c, Call::Resize(_))).count();
        assert_eq!(resizes, 1);
    }

    #[test]
    fn resize_before_window_elapses_waits() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        events.publish(ViewportEvent::Resized { width: 640, height: 480 });
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(100)).unwrap();
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(400)).unwrap();
        let stage = orchestrator.stage().unwrap();
        assert_eq!(stage.target_size, Viewport::new(800, 600));
    }

    #[test]
    fn slide_spawns_elements_within_bounds() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);

        let added = orchestrator.insert_slide(ImageData::solid(4, 3, [200, 100, 50, 255])).unwrap();
        assert_eq!(added, 51);

        let stage = orchestrator.stage().unwrap();
        let animated: Vec<_> = stage
            .background
            .iter()
            .filter(|(_, e)| e.animation.is_some())
            .collect();
        assert_eq!(animated.len(), 50);
        for (_, element) in animated {
            let p = element.transform.position;
            assert!((-1.0..=1.0).contains(&p.x));
            assert!((-2.0..=2.0).contains(&p.y));
            assert!((1.0..=2.0).contains(&p.z));
            assert!(element.material.is_bound());
        }
    }

    #[test]
    fn animation_stays_in_envelope_over_many_cycles() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        orchestrator.insert_slide(ImageData::solid(2, 2, [255; 4])).unwrap();

        let envelopes: Vec<(f32, f32)> = orchestrator
            .stage()
            .unwrap()
            .background
            .iter()
            .filter_map(|(_, e)| e.animation.as_ref().map(|a| a.x.bounds()))
            .collect();

        let mut recorder = Recorder::default();
        // 40 s of frames: at least ten cycles of the longest tween.
        for i in 1..=2500u64 {
            orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16 * i)).unwrap();
        }

        let stage = orchestrator.stage().unwrap();
        let animated = stage.background.iter().filter(|(_, e)| e.animation.is_some());
        for ((_, element), (lo, hi)) in animated.zip(envelopes) {
            let x = element.transform.position.x;
            assert!(lo <= x && x <= hi, "x {x} escaped [{lo}, {hi}]");
            let opacity = element.material.opacity();
            assert!((0.0..=1.0).contains(&opacity));
        }
    }

    #[test]
    fn failed_slide_load_keeps_running_without_elements() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        // The missing file fails on the worker; frames pick the failure up through polling.
        let mut frames = 0u64;
        while orchestrator.slide_ticket.is_some() {
            assert!(frames < 400, "failed load never reached the frame loop");
            std::thread::sleep(Duration::from_millis(5));
            frames += 1;
            orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16 * frames)).unwrap();
        }

        assert_eq!(orchestrator.loader.pending(), 0);
        assert!(orchestrator.stage().unwrap().background.is_empty());
        for i in 1..=3 {
            orchestrator
                .frame(&mut recorder, t0 + Duration::from_millis(16 * (frames + i)))
                .unwrap();
        }
        assert!(orchestrator.stage().unwrap().background.is_empty());
    }

    #[test]
    fn orbiting_the_camera_keeps_projections_baked() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        orchestrator.insert_slide(ImageData::solid(4, 4, [255; 4])).unwrap();

        let stage = orchestrator.stage().unwrap();
        let before: Vec<_> = stage.background.iter().map(|(_, e)| *e.material.uniforms()).collect();
        let bindings: Vec<_> = stage.background.iter().map(|(_, e)| e.material.binding().copied()).collect();
        let camera_before = stage.cameras.get(stage.background_camera).unwrap().view_projection();

        events.publish(ViewportEvent::PointerMoved { x: 0.0, y: 0.0 });
        events.publish(ViewportEvent::PointerButton { pressed: true });
        events.publish(ViewportEvent::PointerMoved { x: 0.4, y: -0.3 });
        events.publish(ViewportEvent::PointerButton { pressed: false });
        events.publish(ViewportEvent::Scrolled { lines: 2.0 });

        let mut recorder = Recorder::default();
        orchestrator.frame(&mut recorder, t0).unwrap();

        let stage = orchestrator.stage().unwrap();
        let camera = stage.cameras.get(stage.background_camera).unwrap();
        assert_ne!(camera.view_projection(), camera_before);
        assert_ne!(camera.position(), Vec3::new(0.0, 0.0, 3.0));

        let after: Vec<_> = stage.background.iter().map(|(_, e)| e.material.uniforms()).collect();
        assert_eq!(before.len(), after.len());
        // Tint carries the animated opacity; everything captured by `project` must hold.
        for (a, b) in before.iter().zip(after) {
            assert_eq!(a.projector, b.projector);
            assert_eq!(a.camera_position, b.camera_position);
            assert_eq!(a.params, b.params);
        }
        let bindings_after: Vec<_> = stage.background.iter().map(|(_, e)| e.material.binding().copied()).collect();
        assert_eq!(bindings, bindings_after);
    }

    #[test]
    fn orbit_controls_can_be_disabled() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = Orchestrator::new(StageConfig {
            orbit_controls: false,
            ..config()
        });
        orchestrator.init(Viewport::new(800, 600), &events, None, t0);

        events.publish(ViewportEvent::Scrolled { lines: 3.0 });
        orchestrator.frame(&mut Recorder::default(), t0).unwrap();

        let stage = orchestrator.stage().unwrap();
        let camera = stage.cameras.get(stage.background_camera).unwrap();
        assert_eq!(camera.frustum_bounds().map(|(_, _, _, top)| top), Some(1.5));
    }

    #[test]
    fn keys_drive_the_panel() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        events.publish(ViewportEvent::KeyPressed(Key::Digit(3)));
        events.publish(ViewportEvent::KeyPressed(Key::ArrowUp));
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16)).unwrap();

        let repeat = orchestrator.stage().unwrap().primary.repeat;
        assert!((repeat - 4.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_param_is_rejected() {
        let events = EventChannel::new();
        let mut orchestrator = running(&events, Instant::now());
        assert!(orchestrator.set_param("bloom", 1.0).is_err());
        assert_eq!(orchestrator.set_param("rotation", 9.0).unwrap().value, 6.0);
        assert_eq!(orchestrator.stage().unwrap().primary.rotation, 6.0);
    }

    #[test]
    fn pointer_events_reach_the_trail() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        events.publish(ViewportEvent::PointerMoved { x: 0.0, y: 0.0 });
        orchestrator.frame(&mut recorder, t0 + Duration::from_millis(16)).unwrap();
        assert_eq!(orchestrator.stage().unwrap().trail.touch_count(), 1);
    }

    #[test]
    fn dropping_orchestrator_releases_subscription() {
        let events = EventChannel::new();
        let orchestrator = running(&events, Instant::now());
        assert_eq!(events.subscriber_count(), 1);
        drop(orchestrator);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn shader_time_is_half_of_elapsed() {
        let events = EventChannel::new();
        let t0 = Instant::now();
        let mut orchestrator = running(&events, t0);
        let mut recorder = Recorder::default();

        let time = orchestrator.frame(&mut recorder, t0 + Duration::from_millis(200)).unwrap();
        let stage = orchestrator.stage().unwrap();
        assert!((stage.primary.time - time.elapsed * 0.5).abs() < 1e-6);
    }
}
