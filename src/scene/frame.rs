use web_time::Instant;

/// Timing data handed to every frame callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since the loop started
    pub elapsed: f32,
    /// Frames produced so far, including this one
    pub frame: u64,
}

impl FrameTick {
    /// Tick built from raw values, used by hosts that own their own clock
    pub fn new(delta: f32, elapsed: f32, frame: u64) -> Self {
        Self {
            delta,
            elapsed,
            frame,
        }
    }
}

/// Anything that mutates its transforms once per rendered frame
pub trait FrameCallback {
    fn on_frame(&mut self, tick: &FrameTick);
}

/// Converts host timestamps into `FrameTick`s.
///
/// The host calls `tick` once per display refresh. After `stop` the loop
/// produces nothing, which is how views tear the callback down.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    start: Instant,
    last: Instant,
    frames: u64,
    running: bool,
}

impl FrameLoop {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            last: start,
            frames: 0,
            running: true,
        }
    }

    /// Advance the clock to `now` and return the tick for this frame
    pub fn tick(&mut self, now: Instant) -> Option<FrameTick> {
        if !self.running {
            return None;
        }

        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        self.last = now;
        self.frames += 1;

        Some(FrameTick {
            delta,
            elapsed,
            frame: self.frames,
        })
    }

    /// Advance and dispatch to a callback in one step
    pub fn drive<C: FrameCallback + ?Sized>(&mut self, now: Instant, callback: &mut C) -> Option<FrameTick> {
        let tick = self.tick(now)?;
        callback.on_frame(&tick);
        Some(tick)
    }

    /// Start over from `now`: the next tick measures its delta from here.
    /// Hosts call this once the scene becomes visible, so time spent
    /// loading or on the error view never reaches a callback.
    pub fn restart(&mut self, now: Instant) {
        self.start = now;
        self.last = now;
        self.frames = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("[FrameLoop] Stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Counter {
        calls: u32,
        total_delta: f32,
    }

    impl FrameCallback for Counter {
        fn on_frame(&mut self, tick: &FrameTick) {
            self.calls += 1;
            self.total_delta += tick.delta;
        }
    }

    #[test]
    fn test_ticks_carry_delta_and_elapsed() {
        let t0 = Instant::now();
        let mut frames = FrameLoop::new(t0);

        let first = frames.tick(t0 + Duration::from_millis(16)).unwrap();
        assert!((first.delta - 0.016).abs() < 1e-6);
        assert_eq!(first.frame, 1);

        let second = frames.tick(t0 + Duration::from_millis(50)).unwrap();
        assert!((second.delta - 0.034).abs() < 1e-6);
        assert!((second.elapsed - 0.050).abs() < 1e-6);
        assert_eq!(second.frame, 2);
    }

    #[test]
    fn test_restart_drops_the_gap() {
        let t0 = Instant::now();
        let mut frames = FrameLoop::new(t0);

        // Scene becomes visible 2.5s after the loop was created
        let shown = t0 + Duration::from_millis(2_500);
        frames.restart(shown);
        let first = frames.tick(shown + Duration::from_millis(16)).unwrap();
        assert!((first.delta - 0.016).abs() < 1e-6);
        assert!((first.elapsed - 0.016).abs() < 1e-6);
        assert_eq!(first.frame, 1);
    }

    #[test]
    fn test_restart_resumes_a_stopped_loop() {
        let t0 = Instant::now();
        let mut frames = FrameLoop::new(t0);
        frames.tick(t0 + Duration::from_millis(16));
        frames.stop();

        let reload = t0 + Duration::from_secs(60);
        frames.restart(reload);
        assert!(frames.is_running());
        let tick = frames.tick(reload + Duration::from_millis(16)).unwrap();
        assert!(tick.delta < 0.02);
        assert_eq!(frames.frames(), 1);
    }

    #[test]
    fn test_stopped_loop_invokes_nothing() {
        let t0 = Instant::now();
        let mut frames = FrameLoop::new(t0);
        let mut counter = Counter { calls: 0, total_delta: 0.0 };

        frames.drive(t0 + Duration::from_millis(10), &mut counter);
        frames.stop();
        assert!(frames.drive(t0 + Duration::from_millis(20), &mut counter).is_none());

        assert_eq!(counter.calls, 1);
        assert!((counter.total_delta - 0.010).abs() < 1e-6);
        assert!(!frames.is_running());
    }
}
