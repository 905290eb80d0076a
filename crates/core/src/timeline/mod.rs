use std::time::{Duration, Instant};

/// Phase accumulator driving ghost motion. Advances by the wall-clock time of
/// each rendered frame.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f32,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, delta: f32) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }

    pub fn phase(&self) -> f32 {
        self.time_seconds
    }
}

/// Caps the render loop at a target frame rate and reports how long the
/// previous frame took.
#[derive(Debug, Clone)]
pub struct FramePacer {
    target: Duration,
    frame_start: Instant,
    last_frame: Duration,
}

impl FramePacer {
    pub fn new(target_fps: u32) -> Self {
        let target = Duration::from_secs(1) / target_fps.max(1);
        Self {
            target,
            frame_start: Instant::now(),
            last_frame: Duration::ZERO,
        }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    /// Seconds the previous frame took, including any pacing sleep.
    pub fn frame_time(&self) -> f32 {
        self.last_frame.as_secs_f32()
    }

    /// Sleeps off the rest of the frame budget, then starts timing the next
    /// frame.
    pub fn wait(&mut self) {
        let elapsed = self.frame_start.elapsed();
        if let Some(remaining) = self.target.checked_sub(elapsed) {
            std::thread::sleep(remaining);
        }
        let now = Instant::now();
        self.last_frame = now - self.frame_start;
        self.frame_start = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accumulates_and_never_goes_negative() {
        let mut clock = PlaybackClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert!((clock.phase() - 0.75).abs() < f32::EPSILON);

        clock.advance(-10.0);
        assert_eq!(clock.phase(), 0.0);
    }

    #[test]
    fn pacer_budget_matches_frame_rate() {
        let pacer = FramePacer::new(60);
        assert_eq!(pacer.target(), Duration::from_secs(1) / 60);
        assert_eq!(pacer.frame_time(), 0.0);
    }

    #[test]
    fn pacer_waits_at_least_one_budget() {
        let mut pacer = FramePacer::new(200);
        pacer.wait();
        assert!(pacer.frame_time() >= pacer.target().as_secs_f32() * 0.99);
    }
}
