//! Native host
//!
//! Drives the scene from a `winit` event loop. The window opens on the
//! loading view, switches to the scene once the GPU is up and falls back to
//! the error view if the rendering context fails. The countdown text is
//! refreshed by a one-second `IntervalTimer`, independent of the frame rate.

pub mod text_mode;

use std::sync::Arc;

use web_time::Instant;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use crate::config::AppConfig;
use crate::countdown::{Countdown, IntervalTimer};
use crate::error::{AppError, AppResult};
use crate::input::PointerState;
use crate::render::{create_instance, GpuState};
use crate::scene::{FrameLoop, Scene};
use crate::view::{activate_reload, ErrorFlag, FallbackView, PageHost, ViewController, Visible};

/// Reload requests from the error view, served on the next loop turn
#[derive(Debug, Default)]
struct ReloadRequest {
    pending: bool,
}

impl PageHost for ReloadRequest {
    fn reload(&mut self) {
        self.pending = true;
    }
}

struct NativeApp {
    window: Arc<Window>,
    instance: wgpu::Instance,
    gpu: Option<GpuState>,
    scene: Scene,
    view: ViewController,
    pointer: PointerState,
    frame_loop: FrameLoop,
    ticker: IntervalTimer,
    countdown: Countdown,
    config: AppConfig,
    /// GPU init waits for the next loop turn so the loading view shows first
    gpu_pending: bool,
    shown: Option<Visible>,
    reload: ReloadRequest,
}

/// Fresh field, camera and text for the current window size
fn build_scene(config: &AppConfig, width: u32, height: u32, countdown: &Countdown) -> AppResult<Scene> {
    let mut rng = config.rng();
    Scene::new(
        &mut rng,
        config.torus_count,
        &config.title,
        width,
        height,
        &countdown.remaining_now(),
    )
}

impl NativeApp {
    fn new(window: Arc<Window>, config: &AppConfig) -> AppResult<Self> {
        let countdown = config.countdown()?;
        let size = window.inner_size();
        let scene = build_scene(config, size.width, size.height, &countdown)?;
        let now = Instant::now();

        let mut app = Self {
            window,
            instance: create_instance(wgpu::Backends::all()),
            gpu: None,
            scene,
            view: ViewController::new(ErrorFlag::new()),
            pointer: PointerState::new(),
            frame_loop: FrameLoop::new(now),
            ticker: IntervalTimer::every_second(now),
            countdown,
            config: config.clone(),
            gpu_pending: true,
            shown: None,
            reload: ReloadRequest::default(),
        };
        app.refresh_title();
        Ok(app)
    }

    /// Create the surface and GPU state; failures land on the error view
    fn init_gpu(&mut self) {
        let size = self.window.inner_size();
        log::info!(
            "[NativeApp::init_gpu] Initializing at {}x{} (scale factor {:.2})",
            size.width,
            size.height,
            self.window.scale_factor()
        );

        let result = self
            .instance
            .create_surface(self.window.clone())
            .map_err(|e| AppError::SurfaceCreation(e.to_string()))
            .and_then(|surface| {
                pollster::block_on(GpuState::new(
                    &self.instance,
                    surface,
                    size.width,
                    size.height,
                    &self.scene,
                    self.view.error_flag().clone(),
                ))
            });

        match result {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                self.view.scene_ready();
                self.frame_loop.restart(Instant::now());
                self.window.request_redraw();
            }
            Err(e) => {
                log::error!("[NativeApp::init_gpu] GPU state creation failed: {}", e);
                self.view.fail(&e.to_string());
            }
        }
        self.refresh_title();
    }

    /// Start over as a page reload would: new scene, new rendering context
    fn reload(&mut self) {
        log::info!("[NativeApp::reload] Rebuilding scene and rendering context");
        self.gpu = None;
        self.view.reset();
        self.pointer.reset();

        let size = self.window.inner_size();
        match build_scene(&self.config, size.width, size.height, &self.countdown) {
            Ok(scene) => {
                self.scene = scene;
                self.gpu_pending = true;
            }
            Err(e) => {
                log::error!("[NativeApp::reload] Scene rebuild failed: {}", e);
                self.view.fail(&e.to_string());
            }
        }
        self.refresh_title();
    }

    fn refresh_countdown(&mut self) {
        let remaining = self.countdown.remaining_now();
        if self.scene.set_remaining(&remaining) {
            log::trace!("[NativeApp] Countdown {}", remaining);
        }
        self.shown = None;
        self.refresh_title();
    }

    /// Mirror the visible view into the window title
    fn refresh_title(&mut self) {
        let visible = self.view.visible();
        if self.shown == Some(visible) {
            return;
        }

        let title = match visible {
            Visible::Scene => format!("{} - {}", self.config.title, self.scene.countdown.text),
            Visible::Fallback(view) => view.lines().join(" - "),
        };
        if let Visible::Fallback(FallbackView::Error) = visible {
            for line in FallbackView::Error.lines() {
                log::error!("[NativeApp] {}", line);
            }
        }
        self.window.set_title(&title);
        self.shown = Some(visible);
    }

    fn redraw(&mut self) {
        if self.view.visible() != Visible::Scene {
            self.refresh_title();
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let (_, height) = gpu.size();
        self.pointer.apply(&mut self.scene.controls, height as f32);
        self.frame_loop.drive(Instant::now(), &mut self.scene);

        if let Err(e) = gpu.render(&self.scene) {
            log::error!("[NativeApp::redraw] Render failed: {}", e);
            self.view.fail(&e.to_string());
            self.gpu = None;
        }
        self.refresh_title();
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.scene.resize(width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
    }

    fn teardown(&mut self) {
        log::info!(
            "[NativeApp::teardown] Stopping after {} frames and {} countdown updates",
            self.frame_loop.frames(),
            self.ticker.fired()
        );
        self.ticker.cancel();
        self.frame_loop.stop();
        self.gpu = None;
    }

    fn handle_window_event(&mut self, event: &WindowEvent, elwt: &EventLoopWindowTarget<()>) {
        match event {
            WindowEvent::CloseRequested => {
                self.teardown();
                elwt.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.resize(physical_size.width, physical_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => {
                        self.teardown();
                        elwt.exit();
                    }
                    PhysicalKey::Code(KeyCode::KeyR) => {
                        if let Visible::Fallback(view) = self.view.visible() {
                            activate_reload(view, &mut self.reload);
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.pointer
                    .process_primary_button(*state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer
                    .process_cursor(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => self.pointer.process_wheel_lines(*y),
                MouseScrollDelta::PixelDelta(position) => {
                    self.pointer.process_wheel_pixels(position.y as f32)
                }
            },
            WindowEvent::Focused(false) => self.pointer.reset(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, elwt: &EventLoopWindowTarget<()>) {
        if std::mem::take(&mut self.reload.pending) {
            self.reload();
        } else if std::mem::take(&mut self.gpu_pending) {
            self.init_gpu();
        }

        if self.ticker.poll(Instant::now()).is_some() {
            self.refresh_countdown();
        }

        match self.view.visible() {
            Visible::Scene => {
                elwt.set_control_flow(ControlFlow::Poll);
                self.window.request_redraw();
            }
            Visible::Fallback(_) => {
                self.refresh_title();
                if self.gpu_pending {
                    elwt.set_control_flow(ControlFlow::Poll);
                    return;
                }
                match self.ticker.next_deadline() {
                    Some(next) => elwt.set_control_flow(ControlFlow::WaitUntil(next)),
                    None => elwt.set_control_flow(ControlFlow::Wait),
                }
            }
        }
    }
}

/// Open the window and run the scene until it is closed
pub fn run_scene(config: &AppConfig) -> AppResult<()> {
    log::info!("[app::run_scene] Starting, deadline {}", config.deadline);

    let event_loop = EventLoop::new().map_err(|e| AppError::Window(e.to_string()))?;

    log::info!("[app::run_scene] Creating window...");
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
            .build(&event_loop)
            .map_err(|e| {
                log::error!("[app::run_scene] Window creation failed: {}", e);
                AppError::Window(e.to_string())
            })?,
    );

    let mut app = NativeApp::new(window.clone(), config)?;

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => app.handle_window_event(event, elwt),
            Event::AboutToWait => app.about_to_wait(elwt),
            _ => {}
        })
        .map_err(|e| AppError::Window(e.to_string()))?;

    log::info!("[app::run_scene] Event loop finished");
    Ok(())
}
