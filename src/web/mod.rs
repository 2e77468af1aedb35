//! Browser host
//!
//! Renders the scene into `#scene-canvas` through the WebGL backend. The
//! countdown line lives in the DOM (`#countdown`) and is refreshed by a
//! one-second `setInterval`; the scene animates on `requestAnimationFrame`.
//! Loading and error views are plain DOM overlays.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement};
use web_time::Instant;

use crate::config::AppConfig;
use crate::constants::surface::FIXED_DEVICE_PIXEL_RATIO;
use crate::countdown::Countdown;
use crate::error::{AppError, AppResult};
use crate::input::PointerState;
use crate::render::{create_instance, surface_extent, GpuState};
use crate::scene::{FrameLoop, Scene};
use crate::view::{activate_reload, ErrorFlag, FallbackView, PageHost, ViewController, Visible};

pub const CANVAS_ID: &str = "scene-canvas";
pub const COUNTDOWN_ID: &str = "countdown";
const FALLBACK_ID: &str = "scene-fallback";

type JsCallback = Closure<dyn FnMut()>;
type EventCallback = Closure<dyn FnMut(web_sys::Event)>;

/// Reloads the page through `window.location`
struct BrowserPage {
    window: web_sys::Window,
}

impl PageHost for BrowserPage {
    fn reload(&mut self) {
        if let Err(e) = self.window.location().reload() {
            log::error!("[BrowserPage::reload] location.reload() failed: {:?}", e);
        }
    }
}

fn js_error(context: &str) -> impl Fn(JsValue) -> AppError + '_ {
    move |value| AppError::Js(format!("{}: {:?}", context, value))
}

/// Scene state shared by the browser callbacks
struct WebScene {
    window: web_sys::Window,
    document: Document,
    canvas: HtmlCanvasElement,
    gpu: Option<GpuState>,
    scene: Scene,
    view: ViewController,
    pointer: PointerState,
    frame_loop: FrameLoop,
    countdown: Countdown,
    logical_size: (f64, f64),
    error_shown: bool,
    reload_click: Option<JsCallback>,
}

impl WebScene {
    fn viewport(window: &web_sys::Window) -> (f64, f64) {
        let width = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0);
        let height = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0);
        (width, height)
    }

    /// Size the canvas backing store for the viewport; returns physical size
    fn fit_canvas(&mut self, max_dimension: u32) -> (u32, u32) {
        let (width, height) = Self::viewport(&self.window);
        self.logical_size = (width, height);
        let (physical_width, physical_height) =
            surface_extent(width, height, FIXED_DEVICE_PIXEL_RATIO, max_dimension);
        self.canvas.set_width(physical_width);
        self.canvas.set_height(physical_height);
        (physical_width, physical_height)
    }

    fn sync_size(&mut self) {
        if Self::viewport(&self.window) == self.logical_size {
            return;
        }
        let Some(max_dimension) = self.gpu.as_ref().map(|gpu| gpu.max_dimension()) else {
            return;
        };
        let (width, height) = self.fit_canvas(max_dimension);
        log::debug!("[WebScene] Viewport resized to {}x{}", width, height);
        self.scene.resize(width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
    }

    /// One animation frame; returns whether another should be requested
    fn frame(&mut self) -> bool {
        if !self.frame_loop.is_running() {
            return false;
        }
        self.sync_size();

        match self.view.visible() {
            Visible::Fallback(FallbackView::Loading) => true,
            Visible::Fallback(FallbackView::Error) => {
                self.show_error();
                false
            }
            Visible::Scene => {
                let Some(gpu) = self.gpu.as_mut() else {
                    return false;
                };
                let (_, height) = gpu.size();
                self.pointer.apply(&mut self.scene.controls, height as f32);
                self.frame_loop.drive(Instant::now(), &mut self.scene);

                if let Err(e) = gpu.render(&self.scene) {
                    self.view.fail(&e.to_string());
                    self.gpu = None;
                    self.show_error();
                    return false;
                }
                true
            }
        }
    }

    fn refresh_countdown(&mut self) {
        let remaining = self.countdown.remaining_now();
        self.scene.set_remaining(&remaining);
        if let Some(element) = self.document.get_element_by_id(COUNTDOWN_ID) {
            element.set_text_content(Some(&remaining.label()));
        }
    }

    fn show_loading(&self) -> AppResult<()> {
        let overlay = self.fallback_overlay()?;
        let heading = self
            .document
            .create_element("h2")
            .map_err(js_error("create heading"))?;
        heading.set_text_content(Some(FallbackView::Loading.heading()));
        overlay
            .append_child(&heading)
            .map_err(js_error("append heading"))?;
        Ok(())
    }

    fn hide_fallback(&self) {
        if let Some(overlay) = self.document.get_element_by_id(FALLBACK_ID) {
            overlay.remove();
        }
    }

    /// Replace the canvas with the error view; idempotent
    fn show_error(&mut self) {
        if self.error_shown {
            return;
        }
        self.error_shown = true;
        if let Err(e) = self.build_error_view() {
            log::error!("[WebScene::show_error] Could not build error view: {}", e);
        }
    }

    fn build_error_view(&mut self) -> AppResult<()> {
        self.canvas
            .style()
            .set_property("display", "none")
            .map_err(js_error("hide canvas"))?;

        let view = FallbackView::Error;
        let overlay = self.fallback_overlay()?;

        let heading = self
            .document
            .create_element("h2")
            .map_err(js_error("create heading"))?;
        heading.set_text_content(Some(view.heading()));
        overlay
            .append_child(&heading)
            .map_err(js_error("append heading"))?;

        if let Some(detail) = view.detail() {
            let paragraph = self
                .document
                .create_element("p")
                .map_err(js_error("create detail"))?;
            paragraph.set_text_content(Some(detail));
            overlay
                .append_child(&paragraph)
                .map_err(js_error("append detail"))?;
        }

        if let Some(label) = view.action_label() {
            let button = self
                .document
                .create_element("button")
                .map_err(js_error("create button"))?
                .dyn_into::<web_sys::HtmlButtonElement>()
                .map_err(|_| AppError::Js("button is not an HtmlButtonElement".into()))?;
            button.set_text_content(Some(label));

            let mut page = BrowserPage {
                window: self.window.clone(),
            };
            let on_click = Closure::wrap(Box::new(move || {
                activate_reload(view, &mut page);
            }) as Box<dyn FnMut()>);
            button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
            self.reload_click = Some(on_click);

            overlay
                .append_child(&button)
                .map_err(js_error("append button"))?;
        }
        Ok(())
    }

    /// Fresh, empty overlay element in the body
    fn fallback_overlay(&self) -> AppResult<Element> {
        self.hide_fallback();
        let body = self
            .document
            .body()
            .ok_or_else(|| AppError::Js("document has no body".into()))?;
        let overlay = self
            .document
            .create_element("div")
            .map_err(js_error("create overlay"))?;
        overlay.set_id(FALLBACK_ID);
        overlay
            .set_attribute(
                "style",
                "position:fixed;inset:0;display:flex;flex-direction:column;\
                 align-items:center;justify-content:center;background:#000;color:#fff;\
                 font-family:sans-serif",
            )
            .map_err(js_error("style overlay"))?;
        body.append_child(&overlay)
            .map_err(js_error("append overlay"))?;
        Ok(overlay)
    }
}

/// Running browser app; dropping it without `teardown` leaks the callbacks
#[wasm_bindgen]
pub struct WebApp {
    state: Rc<RefCell<WebScene>>,
    animation: Rc<RefCell<Option<JsCallback>>>,
    animation_handle: Rc<RefCell<Option<i32>>>,
    interval: Option<(i32, JsCallback)>,
    listeners: Vec<(web_sys::EventTarget, &'static str, EventCallback)>,
}

#[wasm_bindgen]
impl WebApp {
    /// Cancel the animation frame, clear the interval and drop listeners
    pub fn teardown(&mut self) {
        log::info!("[WebApp::teardown] Stopping scene");
        let window = self.state.borrow().window.clone();

        if let Some(handle) = self.animation_handle.borrow_mut().take() {
            if let Err(e) = window.cancel_animation_frame(handle) {
                log::warn!("[WebApp::teardown] cancelAnimationFrame failed: {:?}", e);
            }
        }
        // Breaks the closure's reference to itself
        self.animation.borrow_mut().take();

        if let Some((handle, _callback)) = self.interval.take() {
            window.clear_interval_with_handle(handle);
        }

        for (target, kind, callback) in self.listeners.drain(..) {
            if let Err(e) =
                target.remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            {
                log::warn!("[WebApp::teardown] removeEventListener({}) failed: {:?}", kind, e);
            }
        }

        let mut state = self.state.borrow_mut();
        state.frame_loop.stop();
        state.gpu = None;
    }
}

fn request_animation_frame(window: &web_sys::Window, f: &JsCallback) -> Option<i32> {
    match window.request_animation_frame(f.as_ref().unchecked_ref()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("[request_animation_frame] Failed: {:?}", e);
            None
        }
    }
}

fn start_render_loop(app: &WebApp) {
    let f = app.animation.clone();
    let g = f.clone();
    let handle = app.animation_handle.clone();
    let state = app.state.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let (keep_going, window) = {
            let mut state = state.borrow_mut();
            (state.frame(), state.window.clone())
        };
        if !keep_going {
            handle.borrow_mut().take();
            return;
        }
        if let Some(callback) = f.borrow().as_ref() {
            *handle.borrow_mut() = request_animation_frame(&window, callback);
        }
    }) as Box<dyn FnMut()>));

    let window = app.state.borrow().window.clone();
    if let Some(callback) = g.borrow().as_ref() {
        *app.animation_handle.borrow_mut() = request_animation_frame(&window, callback);
    }
}

fn start_countdown_interval(app: &mut WebApp) -> AppResult<()> {
    let state = app.state.clone();
    let callback = Closure::wrap(Box::new(move || {
        state.borrow_mut().refresh_countdown();
    }) as Box<dyn FnMut()>);

    let window = app.state.borrow().window.clone();
    let handle = window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            crate::constants::countdown::TICK_PERIOD_MS as i32,
        )
        .map_err(js_error("setInterval"))?;
    app.interval = Some((handle, callback));
    Ok(())
}

fn listen(
    app: &mut WebApp,
    target: web_sys::EventTarget,
    kind: &'static str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> AppResult<()> {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target
        .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        .map_err(js_error(kind))?;
    app.listeners.push((target, kind, callback));
    Ok(())
}

fn attach_pointer_listeners(app: &mut WebApp) -> AppResult<()> {
    let (canvas, window) = {
        let state = app.state.borrow();
        (state.canvas.clone(), state.window.clone())
    };
    let dpr = FIXED_DEVICE_PIXEL_RATIO as f32;

    let state = app.state.clone();
    listen(app, canvas.clone().into(), "mousedown", move |event| {
        if let Some(event) = event.dyn_ref::<web_sys::MouseEvent>() {
            if event.button() == 0 {
                let mut state = state.borrow_mut();
                state
                    .pointer
                    .process_cursor(event.client_x() as f32 * dpr, event.client_y() as f32 * dpr);
                state.pointer.process_primary_button(true);
            }
        }
    })?;

    let state = app.state.clone();
    listen(app, window.clone().into(), "mousemove", move |event| {
        if let Some(event) = event.dyn_ref::<web_sys::MouseEvent>() {
            state
                .borrow_mut()
                .pointer
                .process_cursor(event.client_x() as f32 * dpr, event.client_y() as f32 * dpr);
        }
    })?;

    let state = app.state.clone();
    listen(app, window.into(), "mouseup", move |event| {
        if let Some(event) = event.dyn_ref::<web_sys::MouseEvent>() {
            if event.button() == 0 {
                state.borrow_mut().pointer.process_primary_button(false);
            }
        }
    })?;

    let state = app.state.clone();
    listen(app, canvas.into(), "wheel", move |event| {
        event.prevent_default();
        if let Some(event) = event.dyn_ref::<web_sys::WheelEvent>() {
            // Browsers report scrolling towards the user as positive
            let amount = -event.delta_y() as f32;
            let mut state = state.borrow_mut();
            match event.delta_mode() {
                web_sys::WheelEvent::DOM_DELTA_LINE => state.pointer.process_wheel_lines(amount),
                _ => state.pointer.process_wheel_pixels(amount),
            }
        }
    })?;

    Ok(())
}

async fn build(config: AppConfig) -> AppResult<WebApp> {
    let window = web_sys::window().ok_or_else(|| AppError::Js("No window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| AppError::Js("No document".into()))?;
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| AppError::Js(format!("Canvas #{} not found", CANVAS_ID)))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| AppError::Js(format!("#{} is not a canvas element", CANVAS_ID)))?;

    let countdown = config.countdown()?;
    let mut rng = config.rng();
    let scene = Scene::new(
        &mut rng,
        config.torus_count,
        &config.title,
        1,
        1,
        &countdown.remaining_now(),
    )?;

    let mut web_scene = WebScene {
        window,
        document,
        canvas: canvas.clone(),
        gpu: None,
        scene,
        view: ViewController::new(ErrorFlag::new()),
        pointer: PointerState::new(),
        frame_loop: FrameLoop::new(Instant::now()),
        countdown,
        logical_size: (0.0, 0.0),
        error_shown: false,
        reload_click: None,
    };
    web_scene.refresh_countdown();
    web_scene.show_loading()?;

    let webgl_max = wgpu::Limits::downlevel_webgl2_defaults().max_texture_dimension_2d;
    let (width, height) = web_scene.fit_canvas(webgl_max);
    web_scene.scene.resize(width, height);
    log::info!(
        "[web::build] Canvas {}x{} at device pixel ratio {}",
        width,
        height,
        FIXED_DEVICE_PIXEL_RATIO
    );

    let instance = create_instance(wgpu::Backends::GL);
    let gpu = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas)) {
        Ok(surface) => {
            GpuState::new(
                &instance,
                surface,
                width,
                height,
                &web_scene.scene,
                web_scene.view.error_flag().clone(),
            )
            .await
        }
        Err(e) => Err(AppError::SurfaceCreation(e.to_string())),
    };

    match gpu {
        Ok(gpu) => {
            web_scene.gpu = Some(gpu);
            web_scene.view.scene_ready();
            web_scene.hide_fallback();
            web_scene.frame_loop.restart(Instant::now());
        }
        Err(e) => {
            log::error!("[web::build] GPU initialization failed: {}", e);
            web_scene.view.fail(&e.to_string());
            web_scene.show_error();
        }
    }

    let mut app = WebApp {
        state: Rc::new(RefCell::new(web_scene)),
        animation: Rc::new(RefCell::new(None)),
        animation_handle: Rc::new(RefCell::new(None)),
        interval: None,
        listeners: Vec::new(),
    };

    start_countdown_interval(&mut app)?;
    attach_pointer_listeners(&mut app)?;
    start_render_loop(&app);
    Ok(app)
}

/// Entry point for web builds
#[wasm_bindgen]
pub async fn start() -> Result<WebApp, JsValue> {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("console_log already initialized: {}", e).into());
    }
    log::info!("[web::start] Torus countdown starting");

    build(AppConfig::default())
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
