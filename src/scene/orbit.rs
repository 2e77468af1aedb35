//! Orbit controls
//!
//! Rotates and zooms the camera around its target. Panning is not
//! supported. Input accumulates into a spherical delta that decays by the
//! damping factor on every update, so a drag keeps coasting briefly after
//! the pointer stops.

use glam::Vec3;

use crate::constants::orbit::*;
use crate::scene::camera::CameraData;

/// Spherical coordinates around the target, y-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    /// Polar angle from +y
    pub phi: f32,
    /// Azimuth around +y, measured from +z
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit control settings and pending input
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            min_distance: MIN_DISTANCE,
            max_distance: MAX_DISTANCE,
            enable_damping: true,
            damping_factor: DAMPING_FACTOR,
            enable_rotate: true,
            enable_zoom: true,
            rotate_speed: ROTATE_SPEED,
            zoom_speed: ZOOM_SPEED,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer drag of (dx, dy) pixels on a viewport `viewport_height` pixels tall
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        let per_pixel = std::f32::consts::TAU * self.rotate_speed / viewport_height;
        self.delta_theta -= dx * per_pixel;
        self.delta_phi -= dy * per_pixel;
    }

    /// Wheel input; positive steps zoom in
    pub fn zoom_by_steps(&mut self, steps: f32) {
        if !self.enable_zoom || steps == 0.0 {
            return;
        }
        let step_scale = 0.95_f32.powf(self.zoom_speed);
        self.scale *= step_scale.powf(steps);
    }

    /// Apply pending input to the camera; returns whether the camera moved
    pub fn update(&mut self, camera: &mut CameraData) -> bool {
        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.enable_damping {
            spherical.theta += self.delta_theta * self.damping_factor;
            spherical.phi += self.delta_phi * self.damping_factor;
        } else {
            spherical.theta += self.delta_theta;
            spherical.phi += self.delta_phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let new_position = camera.target + spherical.to_offset();
        let moved = new_position.distance_squared(camera.position) > 1e-12;
        camera.position = new_position;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        moved
    }

    pub fn has_pending_motion(&self) -> bool {
        self.delta_theta.abs() > 1e-6 || self.delta_phi.abs() > 1e-6 || self.scale != 1.0
    }
}
