//! The windowed visualization loop.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::basemap::BaseMap;
use crate::budget::ParticleBudget;
use crate::config::WindConfig;
use crate::cursor::CursorInfo;
use crate::error::{GpuError, VisError};
use crate::field::VectorField;
use crate::forecast::{ForecastPlayer, ForecastSet};
use crate::gpu::{FrameParams, GpuState};
use crate::input::{Command, Input};
use crate::particles::ParticleSet;
use crate::projection::{ScreenPoint, Viewport};
use crate::time::FrameClock;

/// Frames between window title refreshes.
const TITLE_INTERVAL: u64 = 15;

type SurfaceCallback = Box<dyn FnMut(&GpuError)>;

/// Animated wind map over a [`ForecastSet`].
///
/// ```ignore
/// let forecast = windvis::synthetic::forecast(20, 3)?;
/// Visualization::new(forecast)
///     .with_config(WindConfig::default().with_trail_frames(40))
///     .with_base_map(BaseMap::load("globe.png")?)
///     .on_surface_unavailable(|e| eprintln!("falling back: {e}"))
///     .run()?;
/// ```
pub struct Visualization {
    forecast: ForecastSet,
    config: WindConfig,
    title: String,
    base_map: Option<BaseMap>,
    on_surface_unavailable: Option<SurfaceCallback>,
}

impl Visualization {
    pub fn new(forecast: ForecastSet) -> Self {
        Self {
            forecast,
            config: WindConfig::default(),
            title: "windvis".to_string(),
            base_map: None,
            on_surface_unavailable: None,
        }
    }

    pub fn with_config(mut self, config: WindConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// World image drawn under the other layers.
    pub fn with_base_map(mut self, map: BaseMap) -> Self {
        self.base_map = Some(map);
        self
    }

    /// Called once if no GPU surface can be set up. The loop then exits
    /// and [`run`](Self::run) returns the error.
    pub fn on_surface_unavailable<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&GpuError) + 'static,
    {
        self.on_surface_unavailable = Some(Box::new(callback));
        self
    }

    /// Open the window and animate until it is closed.
    pub fn run(self) -> Result<(), VisError> {
        self.config.validate()?;
        let tau = self.forecast.first_tau().ok_or(VisError::NoData)?;
        let field = self.forecast.get(tau).ok_or(VisError::NoData)?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self, tau, field);
        event_loop.run_app(&mut app)?;
        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct App {
    forecast: ForecastSet,
    config: WindConfig,
    title: String,
    base_map: Option<BaseMap>,
    on_surface_unavailable: Option<SurfaceCallback>,

    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    error: Option<VisError>,

    viewport: Viewport,
    input: Input,
    clock: FrameClock,
    budget: ParticleBudget,
    player: ForecastPlayer,
    field: Arc<VectorField>,
    rng: StdRng,

    display_particles: bool,
    display_speeds: bool,
    display_vectors: bool,
    scatter_pending: bool,
}

impl App {
    fn new(vis: Visualization, tau: u32, field: Arc<VectorField>) -> Self {
        let config = vis.config;
        Self {
            forecast: vis.forecast,
            title: vis.title,
            base_map: vis.base_map,
            on_surface_unavailable: vis.on_surface_unavailable,
            window: None,
            gpu_state: None,
            error: None,
            viewport: Viewport::default(),
            input: Input::new(),
            clock: FrameClock::new(),
            budget: config.budget(),
            player: ForecastPlayer::new(tau, config.tau_step, config.tau_interval_ms),
            field,
            rng: StdRng::from_entropy(),
            display_particles: config.display_particles,
            display_speeds: config.display_speeds,
            display_vectors: config.display_vectors,
            scatter_pending: false,
            config,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: VisError) {
        error!("{}", e);
        self.error = Some(e);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), VisError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(window.clone());

        let size = window.inner_size();
        self.viewport = Viewport::new(size.width.max(1), size.height.max(1));

        let mut gpu_state =
            match pollster::block_on(GpuState::new(window, &self.config, self.viewport)) {
                Ok(state) => state,
                Err(e) => {
                    if let Some(mut callback) = self.on_surface_unavailable.take() {
                        callback(&e);
                    }
                    return Err(e.into());
                }
            };

        let particles = ParticleSet::new(
            self.budget.count() as usize,
            self.config.lifetime_ms,
            &mut self.rng,
        );
        gpu_state.upload_particles(&particles, &mut self.rng);
        gpu_state.set_field(&self.field, self.forecast.max_speed());
        // The image lives on the GPU from here on
        if let Some(map) = self.base_map.take() {
            gpu_state.set_base_map(&map);
        }
        info!(
            particles = particles.len(),
            tau = self.player.current(),
            "visualization ready"
        );
        self.gpu_state = Some(gpu_state);
        Ok(())
    }

    /// Swap in the field for `tau`.
    fn publish(&mut self, tau: u32) {
        let Some(field) = self.forecast.get(tau) else {
            return;
        };
        self.field = field;
        if let Some(gpu_state) = &mut self.gpu_state {
            gpu_state.set_field(&self.field, self.forecast.max_speed());
        }
        if self.config.reset_on_field_change {
            self.scatter_pending = true;
        }
    }

    fn apply_input(&mut self, event_loop: &ActiveEventLoop) {
        for command in self.input.take_commands() {
            match command {
                Command::TogglePause => self.clock.toggle_pause(),
                Command::ToggleParticles => self.display_particles = !self.display_particles,
                Command::ToggleSpeeds => self.display_speeds = !self.display_speeds,
                Command::ToggleVectors => self.display_vectors = !self.display_vectors,
                Command::NextTau | Command::PrevTau => {
                    let forward = command == Command::NextTau;
                    if let Some(tau) = self.player.step_by(&self.forecast, forward) {
                        info!(tau, "forecast step selected");
                        self.publish(tau);
                    }
                }
                Command::ResetParticles => self.scatter_pending = true,
                Command::Quit => event_loop.exit(),
            }
        }

        let drag = self.input.take_drag();
        if drag.x != 0.0 || drag.y != 0.0 {
            self.viewport.pan_by_pixels(drag.x, drag.y);
        }
        let zoom = self.input.take_zoom();
        if zoom != 0.0 {
            self.viewport
                .zoom_by(zoom, self.config.min_zoom, self.config.max_zoom);
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let dt_ms = self.clock.tick();
        self.apply_input(event_loop);

        if let Some(count) = self.budget.observe(self.clock.uptime(), self.clock.fps()) {
            if let Some(gpu_state) = &mut self.gpu_state {
                gpu_state.set_particle_count(count, &mut self.rng);
            }
        }

        if let Some(tau) = self.player.advance(&self.forecast, dt_ms) {
            self.publish(tau);
        }

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        let scatter = std::mem::take(&mut self.scatter_pending);
        if scatter {
            gpu_state.clear_trails(self.viewport);
        }
        let params = FrameParams {
            viewport: self.viewport,
            dt_ms,
            draw_count: self.config.draw_count(
                self.viewport.width as u32,
                self.viewport.height as u32,
                gpu_state.particle_count(),
            ),
            display_particles: self.display_particles,
            display_speeds: self.display_speeds,
            display_vectors: self.display_vectors,
            scatter,
            frame: self.clock.frame(),
        };

        match gpu_state.render(&params) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                gpu_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => error!("Render error: {:?}", e),
        }

        if self.clock.frame() % TITLE_INTERVAL == 0 {
            self.update_title();
        }
    }

    fn update_title(&self) {
        let (Some(window), Some(gpu_state)) = (&self.window, &self.gpu_state) else {
            return;
        };
        let mut title = format!(
            "{} | {:.0} fps | {} particles | tau {}h",
            self.title,
            self.clock.fps(),
            gpu_state.particle_count(),
            self.player.current()
        );
        if self.clock.is_paused() {
            title.push_str(" | paused");
        }
        let info = self.input.cursor().and_then(|c| {
            CursorInfo::query(&self.viewport, &self.field, ScreenPoint::new(c.x, c.y))
        });
        if let Some(info) = info {
            title.push_str(&format!(" | {}", info));
        }
        window.set_title(&title);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.viewport
                    .resize(physical_size.width, physical_size.height);
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size, self.viewport);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
