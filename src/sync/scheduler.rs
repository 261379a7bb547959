//! Frame scheduling and resize debouncing
//!
//! Playback runs as a single cooperative task: the host calls
//! [`Player::tick`](super::player::Player::tick) once per animation frame, and
//! the player asks for the next frame only at the end of a tick while it is
//! still playing. Stopping is simply not asking again.

/// Host animation scheduler (e.g. `requestAnimationFrame`)
pub trait FrameScheduler {
    /// Arrange for exactly one future call to `Player::tick`
    fn request_frame(&mut self);
}

/// What a tick did about the next frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Another frame was requested
    Continue,
    /// Playback is not running; no frame was requested
    Halt,
}

/// Coalesces bursts of notifications into one
///
/// Every `trigger` pushes the deadline out to `now + delay`; `poll` fires once
/// when the deadline has passed.
#[derive(Clone, Debug, PartialEq)]
pub struct Debouncer {
    delay_ms: f64,
    deadline_ms: Option<f64>,
}

impl Debouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            deadline_ms: None,
        }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    pub fn trigger(&mut self, now_ms: f64) {
        self.deadline_ms = Some(now_ms + self.delay_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// True exactly once per burst, when the quiet period has elapsed
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_fires_once() {
        let mut debouncer = Debouncer::new(100.0);
        debouncer.trigger(0.0);
        debouncer.trigger(40.0);
        debouncer.trigger(80.0);

        assert!(!debouncer.poll(150.0));
        assert!(debouncer.poll(180.0));
        assert!(!debouncer.poll(500.0));
    }

    #[test]
    fn test_idle_never_fires() {
        let mut debouncer = Debouncer::new(100.0);
        assert!(!debouncer.poll(1000.0));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::new(100.0);
        debouncer.trigger(0.0);
        debouncer.cancel();
        assert!(!debouncer.poll(200.0));
    }
}
