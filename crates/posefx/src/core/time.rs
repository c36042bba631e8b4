/// Timing for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Host timestamp in milliseconds.
    pub now_ms: f64,
    /// Seconds since the previous frame, clamped.
    pub dt: f32,
}

impl FrameTime {
    pub fn new(now_ms: f64, dt: f32) -> Self {
        Self { now_ms, dt }
    }
}

/// Variable-rate frame clock.
/// The first frame has zero delta; large gaps (suspended tabs) are clamped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    /// Maximum delta in seconds.
    max_dt: f32,
}

impl FrameClock {
    pub fn new(max_dt_ms: f32) -> Self {
        Self {
            last_ms: None,
            max_dt: (max_dt_ms / 1000.0).max(0.0),
        }
    }

    /// Advance to `now_ms` and return this frame's timing.
    pub fn advance(&mut self, now_ms: f64) -> FrameTime {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last).max(0.0) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        FrameTime::new(now_ms, dt.min(self.max_dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_zero_dt() {
        let mut clock = FrameClock::new(250.0);
        let t = clock.advance(1000.0);
        assert_eq!(t.dt, 0.0);
        assert_eq!(t.now_ms, 1000.0);
    }

    #[test]
    fn dt_is_seconds_between_frames() {
        let mut clock = FrameClock::new(250.0);
        clock.advance(0.0);
        let t = clock.advance(16.0);
        assert!((t.dt - 0.016).abs() < 1e-6, "dt was {}", t.dt);
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut clock = FrameClock::new(250.0);
        clock.advance(0.0);
        let t = clock.advance(5000.0);
        assert_eq!(t.dt, 0.25);
    }

    #[test]
    fn backwards_time_yields_zero() {
        let mut clock = FrameClock::new(250.0);
        clock.advance(100.0);
        let t = clock.advance(50.0);
        assert_eq!(t.dt, 0.0);
        assert!((clock.advance(66.0).dt - 0.016).abs() < 1e-6);
    }
}
