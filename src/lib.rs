pub mod config;
pub mod constants;
pub mod countdown;
pub mod error;
pub mod input;
pub mod render;
pub mod scene;
pub mod view;

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub mod app;
#[cfg(not(target_arch = "wasm32"))]
pub mod panic_handler;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use config::{AppConfig, Mode};
pub use countdown::{Countdown, Deadline, IntervalTimer, PastDeadline, Remaining};
pub use error::{AppError, AppResult};
pub use render::GpuState;
pub use scene::{FrameCallback, FrameLoop, FrameTick, Scene};
pub use view::{activate_reload, ErrorFlag, FallbackView, PageHost, ViewController, ViewState};
