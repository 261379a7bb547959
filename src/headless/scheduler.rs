use std::cell::Cell;
use std::rc::Rc;

use crate::sync::FrameScheduler;

/// Frame scheduler that only counts requests
///
/// The driver calls [`ManualFrames::take`] to consume one pending request and,
/// if there was one, runs a player tick.
#[derive(Clone, Debug, Default)]
pub struct ManualFrames {
    pending: Rc<Cell<usize>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Consume one pending request
    pub fn take(&self) -> bool {
        match self.pending.get() {
            0 => false,
            n => {
                self.pending.set(n - 1);
                true
            }
        }
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) {
        self.pending.set(self.pending.get() + 1);
    }
}
