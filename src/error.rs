//! Crate-wide error type
//!
//! Every fallible operation returns `AppResult<T>`. Only rendering-context
//! failures reach the user, and they do so as the error fallback view; the
//! remaining variants surface at startup (bad config, bad deadline).

/// Errors raised by the countdown, configuration and rendering layers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to create rendering surface: {0}")]
    SurfaceCreation(String),

    #[error("No compatible GPU adapter found")]
    AdapterUnavailable,

    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),

    #[error("Surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("Rendering context lost: {0}")]
    ContextLost(String),

    #[error("Invalid deadline '{input}': {reason}")]
    InvalidDeadline { input: String, reason: String },

    #[error("Interval period must be non-zero")]
    InvalidInterval,

    #[error("Failed to load font: {0}")]
    Font(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Window error: {0}")]
    Window(String),

    #[error("JavaScript error: {0}")]
    Js(String),
}

/// Type alias for results produced by this crate
pub type AppResult<T> = Result<T, AppError>;
