//! Pointer input for the orbit controls
//!
//! Hosts feed raw button, cursor and wheel events in; once per frame the
//! accumulated drag and zoom are handed to `OrbitControls`. Only the
//! primary button rotates. Panning is not supported.

use crate::scene::OrbitControls;

/// Wheel pixels that make one zoom step
pub const WHEEL_PIXELS_PER_STEP: f32 = 100.0;
/// Pixels per wheel line when the host reports lines
pub const WHEEL_PIXELS_PER_LINE: f32 = 16.0;

#[derive(Debug, Default)]
pub struct PointerState {
    dragging: bool,
    last_pos: Option<(f32, f32)>,
    drag_delta: (f32, f32),
    wheel_steps: f32,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_primary_button(&mut self, pressed: bool) {
        self.dragging = pressed;
        if !pressed {
            self.last_pos = None;
        }
    }

    /// Absolute cursor position in physical pixels
    pub fn process_cursor(&mut self, x: f32, y: f32) {
        if self.dragging {
            if let Some((last_x, last_y)) = self.last_pos {
                self.drag_delta.0 += x - last_x;
                self.drag_delta.1 += y - last_y;
            }
        }
        self.last_pos = Some((x, y));
    }

    /// Scroll in pixels; positive scrolls towards the scene and zooms in
    pub fn process_wheel_pixels(&mut self, pixels: f32) {
        self.wheel_steps += pixels / WHEEL_PIXELS_PER_STEP;
    }

    pub fn process_wheel_lines(&mut self, lines: f32) {
        self.process_wheel_pixels(lines * WHEEL_PIXELS_PER_LINE);
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn get_drag_delta(&self) -> (f32, f32) {
        self.drag_delta
    }

    /// Hand accumulated input to `controls` and clear it
    pub fn apply(&mut self, controls: &mut OrbitControls, viewport_height: f32) {
        let (dx, dy) = self.drag_delta;
        if dx != 0.0 || dy != 0.0 {
            controls.rotate_by_pixels(dx, dy, viewport_height);
        }
        if self.wheel_steps != 0.0 {
            controls.zoom_by_steps(self.wheel_steps);
        }
        self.drag_delta = (0.0, 0.0);
        self.wheel_steps = 0.0;
    }

    /// Forget all state, e.g. when the window loses focus
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::camera::init_camera;

    #[test]
    fn test_motion_without_button_does_not_drag() {
        let mut pointer = PointerState::new();
        pointer.process_cursor(10.0, 10.0);
        pointer.process_cursor(50.0, 10.0);
        assert_eq!(pointer.get_drag_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_drag_accumulates_until_applied() {
        let mut pointer = PointerState::new();
        pointer.process_cursor(10.0, 10.0);
        pointer.process_primary_button(true);
        pointer.process_cursor(20.0, 15.0);
        pointer.process_cursor(30.0, 20.0);
        assert_eq!(pointer.get_drag_delta(), (20.0, 10.0));

        let mut controls = OrbitControls::new();
        pointer.apply(&mut controls, 600.0);
        assert_eq!(pointer.get_drag_delta(), (0.0, 0.0));
        assert!(controls.has_pending_motion());
    }

    #[test]
    fn test_release_stops_drag() {
        let mut pointer = PointerState::new();
        pointer.process_primary_button(true);
        pointer.process_cursor(0.0, 0.0);
        pointer.process_primary_button(false);
        pointer.process_cursor(100.0, 0.0);
        assert!(!pointer.is_dragging());
        assert_eq!(pointer.get_drag_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_wheel_zoom_is_clamped_by_controls() {
        let mut pointer = PointerState::new();
        let mut controls = OrbitControls::new();
        controls.enable_damping = false;
        let mut camera = init_camera(800, 600);

        for _ in 0..50 {
            pointer.process_wheel_lines(10.0);
            pointer.apply(&mut controls, 600.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - controls.min_distance).abs() < 1e-4);

        for _ in 0..50 {
            pointer.process_wheel_pixels(-500.0);
            pointer.apply(&mut controls, 600.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - controls.max_distance).abs() < 1e-4);
    }
}
