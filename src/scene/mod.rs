//! Scene Module
//!
//! Everything the renderer draws, as CPU-side data: the torus field, the
//! drifting camera under orbit controls and the two text blocks. The scene
//! never touches the GPU; `render::GpuState` reads it once per frame.

pub mod camera;
pub mod frame;
pub mod orbit;
pub mod text;
pub mod torus_field;

pub use camera::{build_camera_uniform, init_camera, CameraData, CameraRig, CameraUniform};
pub use frame::{FrameCallback, FrameLoop, FrameTick};
pub use orbit::OrbitControls;
pub use text::{PixelFont, TextBlock};
pub use torus_field::{TorusField, TorusInstance};

use rand::Rng;

use crate::countdown::Remaining;
use crate::error::AppResult;

pub struct Scene {
    pub field: TorusField,
    pub rig: CameraRig,
    pub controls: OrbitControls,
    pub title: TextBlock,
    pub countdown: TextBlock,
}

impl Scene {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        torus_count: usize,
        title: &str,
        width: u32,
        height: u32,
        remaining: &Remaining,
    ) -> AppResult<Self> {
        Ok(Self {
            field: TorusField::new(rng, torus_count),
            rig: CameraRig::new(init_camera(width, height)),
            controls: OrbitControls::new(),
            title: TextBlock::title(title)?,
            countdown: TextBlock::countdown(&remaining.label())?,
        })
    }

    pub fn camera(&self) -> &CameraData {
        &self.rig.camera
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.rig.camera = camera::update_aspect_ratio(&self.rig.camera, width, height);
    }

    /// Refresh the countdown text; returns whether its mesh changed
    pub fn set_remaining(&mut self, remaining: &Remaining) -> bool {
        self.countdown.set_text(&remaining.label())
    }
}

impl FrameCallback for Scene {
    fn on_frame(&mut self, tick: &FrameTick) {
        self.field.on_frame(tick);
        self.rig.on_frame(tick);
        self.controls.update(&mut self.rig.camera);

        if tick.frame % 600 == 0 {
            let p = self.rig.camera.position;
            log::debug!(
                "[Scene] Frame {}: camera ({:.2}, {:.2}, {:.2}), elapsed {:.1}s",
                tick.frame,
                p.x,
                p.y,
                p.z,
                tick.elapsed
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::orbit::{MAX_DISTANCE, MIN_DISTANCE};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene() -> Scene {
        let mut rng = StdRng::seed_from_u64(7);
        Scene::new(&mut rng, 12, "I love Ronja", 800, 600, &Remaining::from_total_seconds(90_061))
            .unwrap()
    }

    #[test]
    fn test_frames_keep_camera_in_orbit_range() {
        let mut scene = scene();
        let mut elapsed = 0.0;
        for frame in 1..=600 {
            elapsed += 0.016;
            scene.on_frame(&FrameTick::new(0.016, elapsed, frame));
            let distance = scene.camera().position.length();
            assert!(distance >= MIN_DISTANCE - 1e-4 && distance <= MAX_DISTANCE + 1e-4);
        }
    }

    #[test]
    fn test_countdown_text_follows_remaining() {
        let mut scene = scene();
        assert_eq!(scene.countdown.text, "1d 1h 1m 1s");
        assert!(scene.set_remaining(&Remaining::from_total_seconds(90_060)));
        assert_eq!(scene.countdown.text, "1d 1h 1m 0s");
        assert!(!scene.set_remaining(&Remaining::from_total_seconds(90_060)));
    }
}
