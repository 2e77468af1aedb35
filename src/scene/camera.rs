//! Data-Oriented Camera
//!
//! Plain camera data plus free functions that build matrices from it.
//! The drift rig is the only thing that writes the position each frame;
//! orbit controls then re-project it around the target.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::constants::camera::*;
use crate::scene::frame::{FrameCallback, FrameTick};

/// Camera data as a plain old data structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    pub position: Vec3,
    pub target: Vec3,
    pub aspect_ratio: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

/// Camera uniform buffer for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_matrix: [[f32; 4]; 4],
    pub projection_matrix: [[f32; 4]; 4],
    pub view_projection_matrix: [[f32; 4]; 4],
    pub position: [f32; 3],
    _padding: f32,
}

/// Camera at the initial position looking at the origin
pub fn init_camera(width: u32, height: u32) -> CameraData {
    CameraData {
        position: Vec3::from(INITIAL_POSITION),
        target: Vec3::ZERO,
        aspect_ratio: aspect_ratio(width, height),
        fovy_radians: FOV_Y_DEGREES.to_radians(),
        znear: ZNEAR,
        zfar: ZFAR,
    }
}

/// Width over height, guarding against minimised windows
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Update camera aspect ratio for window resize
pub fn update_aspect_ratio(camera: &CameraData, width: u32, height: u32) -> CameraData {
    let mut updated = *camera;
    updated.aspect_ratio = aspect_ratio(width, height);
    updated
}

pub fn build_view_matrix(camera: &CameraData) -> Mat4 {
    Mat4::look_at_rh(camera.position, camera.target, Vec3::Y)
}

pub fn build_projection_matrix(camera: &CameraData) -> Mat4 {
    Mat4::perspective_rh(camera.fovy_radians, camera.aspect_ratio, camera.znear, camera.zfar)
}

pub fn build_camera_uniform(camera: &CameraData) -> CameraUniform {
    let view = build_view_matrix(camera);
    let proj = build_projection_matrix(camera);

    CameraUniform {
        view_matrix: view.to_cols_array_2d(),
        projection_matrix: proj.to_cols_array_2d(),
        view_projection_matrix: (proj * view).to_cols_array_2d(),
        position: camera.position.to_array(),
        _padding: 0.0,
    }
}

/// Point on the bounded drift path after `elapsed` seconds (x and y only)
pub fn drift_offset(elapsed: f32) -> (f32, f32) {
    let t = elapsed * DRIFT_TIME_SCALE;
    (t.cos() * DRIFT_AMPLITUDE, t.sin() * DRIFT_AMPLITUDE)
}

/// Moves the camera along the drift path every frame
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: CameraData,
}

impl CameraRig {
    pub fn new(camera: CameraData) -> Self {
        Self { camera }
    }
}

impl FrameCallback for CameraRig {
    fn on_frame(&mut self, tick: &FrameTick) {
        let (x, y) = drift_offset(tick.elapsed);
        self.camera.position.x = x;
        self.camera.position.y = y;
    }
}
