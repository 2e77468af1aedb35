//! Torus Field
//!
//! A fixed set of torus instances scattered once at mount. Instances carry
//! no identity beyond their index; the frame callback spins each one and
//! turns the whole group.

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;

use crate::constants::field::*;
use crate::scene::frame::{FrameCallback, FrameTick};

/// Transform of one torus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusInstance {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order
    pub rotation: Vec3,
    pub scale: f32,
}

impl TorusInstance {
    /// Local model matrix, before the group rotation
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// Scatter `count` tori inside a cube of edge `world_size` centred at the origin
pub fn generate_field<R: Rng + ?Sized>(rng: &mut R, count: usize, world_size: f32) -> Vec<TorusInstance> {
    let pi = std::f32::consts::PI;

    (0..count)
        .map(|_| {
            let position = Vec3::new(
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
            ) * world_size;

            let rotation = Vec3::new(
                rng.gen::<f32>() * pi,
                rng.gen::<f32>() * pi,
                rng.gen::<f32>() * pi,
            );

            let scale = MIN_SCALE + rng.gen::<f32>() * SCALE_RANGE;

            TorusInstance {
                position,
                rotation,
                scale,
            }
        })
        .collect()
}

/// Rotation added to each axis of every torus for a frame of `delta` seconds
pub fn spin_increment(delta: f32) -> f32 {
    delta * SPIN_RATE
}

/// Group rotation (radians around y and z) after `elapsed` seconds
pub fn group_rotation(elapsed: f32) -> Vec3 {
    let angle = elapsed * GROUP_DRIFT_RATE;
    Vec3::new(0.0, angle, angle)
}

/// The animated field: instances plus the group transform
#[derive(Debug, Clone)]
pub struct TorusField {
    instances: Vec<TorusInstance>,
    group_rotation: Vec3,
}

impl TorusField {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        let instances = generate_field(rng, count, WORLD_SIZE);
        log::info!("[TorusField::new] Generated {} tori in a {}-unit cube", instances.len(), WORLD_SIZE);
        Self::from_instances(instances)
    }

    pub fn from_instances(instances: Vec<TorusInstance>) -> Self {
        Self {
            instances,
            group_rotation: Vec3::ZERO,
        }
    }

    pub fn instances(&self) -> &[TorusInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn group_rotation(&self) -> Vec3 {
        self.group_rotation
    }

    pub fn group_matrix(&self) -> Mat4 {
        Mat4::from_euler(
            EulerRot::XYZ,
            self.group_rotation.x,
            self.group_rotation.y,
            self.group_rotation.z,
        )
    }

    /// World matrices for every instance, written into `out` to reuse its allocation
    pub fn write_model_matrices(&self, out: &mut Vec<Mat4>) {
        let group = self.group_matrix();
        out.clear();
        out.extend(self.instances.iter().map(|instance| group * instance.model_matrix()));
    }
}

impl FrameCallback for TorusField {
    fn on_frame(&mut self, tick: &FrameTick) {
        let step = spin_increment(tick.delta);
        for instance in &mut self.instances {
            instance.rotation += Vec3::splat(step);
        }
        self.group_rotation = group_rotation(tick.elapsed);
    }
}
