// Torus Countdown Constants - SINGLE SOURCE OF TRUTH
//
// Every tunable number used by the scene, the countdown and the surface
// lives here. Shaders receive these through uniforms, never as literals.

/// Countdown constants
pub mod countdown {
    /// Deadline shown when no config or flag overrides it
    pub const DEFAULT_DEADLINE: &str = "2025-05-31T21:59:00+02:00";

    pub const SECONDS_PER_MINUTE: i64 = 60;
    pub const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
    pub const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

    /// Period of the countdown refresh timer (milliseconds)
    pub const TICK_PERIOD_MS: u64 = 1000;
}

/// Torus field constants
pub mod field {
    /// Number of tori generated at mount
    pub const TORUS_COUNT: usize = 200;

    /// Edge length of the cube the tori are scattered in
    pub const WORLD_SIZE: f32 = 20.0;

    /// Per-axis spin of every torus (radians per second)
    pub const SPIN_RATE: f32 = 0.3;

    /// Rotation of the whole group around y and z (radians per second of elapsed time)
    pub const GROUP_DRIFT_RATE: f32 = 0.02;

    pub const MIN_SCALE: f32 = 0.5;
    pub const SCALE_RANGE: f32 = 0.5;
}

/// Torus geometry constants
pub mod torus {
    pub const RADIUS: f32 = 0.5;
    pub const TUBE: f32 = 0.2;
    pub const RADIAL_SEGMENTS: u32 = 8;
    pub const TUBULAR_SEGMENTS: u32 = 16;
}

/// Camera constants
pub mod camera {
    pub const FOV_Y_DEGREES: f32 = 60.0;
    pub const INITIAL_POSITION: [f32; 3] = [0.0, 0.0, 5.0];
    pub const ZNEAR: f32 = 0.1;
    pub const ZFAR: f32 = 1000.0;

    /// Time scale applied to elapsed seconds before the sine/cosine drift
    pub const DRIFT_TIME_SCALE: f32 = 0.2;

    /// Amplitude of the drift path in world units
    pub const DRIFT_AMPLITUDE: f32 = 1.5;
}

/// Orbit control constants
pub mod orbit {
    pub const MIN_DISTANCE: f32 = 3.0;
    pub const MAX_DISTANCE: f32 = 8.0;
    pub const DAMPING_FACTOR: f32 = 0.05;
    pub const ROTATE_SPEED: f32 = 1.0;
    pub const ZOOM_SPEED: f32 = 1.0;

    /// Keeps the polar angle off the poles so look-at stays well defined
    pub const POLAR_EPSILON: f32 = 1.0e-6;
}

/// Extruded text constants
pub mod text {
    pub const TITLE: &str = "I love Ronja";
    pub const TITLE_POSITION: [f32; 3] = [0.0, 0.5, 0.0];
    pub const TITLE_SIZE: f32 = 0.3;

    pub const COUNTDOWN_POSITION: [f32; 3] = [0.0, -0.5, 0.0];
    pub const COUNTDOWN_SIZE: f32 = 0.2;

    /// Extrusion depth of every glyph
    pub const DEPTH: f32 = 0.05;

    /// Glyphs are rasterized at this pixel height per em; each pixel is one cell
    pub const RASTER_PX: f32 = 16.0;

    /// Coverage at or above which a pixel becomes a filled cell
    pub const COVERAGE_THRESHOLD: u8 = 128;
}

/// Surface constants
pub mod surface {
    /// Device pixel ratio the canvas backing store is locked to
    pub const FIXED_DEVICE_PIXEL_RATIO: f64 = 2.0;

    /// Clear colour (#000)
    pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

    /// Antialiasing disabled
    pub const SAMPLE_COUNT: u32 = 1;

    pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
    pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;
}

