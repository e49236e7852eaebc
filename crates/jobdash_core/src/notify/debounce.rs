//! Trailing-edge debounce timer driven by an external clock.

/// Explicit timer handle. The host loop asks `take_due(now)` whether the
/// window since the last `schedule` has closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceTimer {
    window_ms: i64,
    deadline: Option<i64>,
    coalesced: u32,
}

impl DebounceTimer {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            deadline: None,
            coalesced: 0,
        }
    }

    /// Arms the timer, or pushes an armed deadline out to `now + window`.
    pub fn schedule(&mut self, now_ms: i64) {
        if self.deadline.is_some() {
            self.coalesced += 1;
        }
        self.deadline = Some(now_ms + self.window_ms);
    }

    /// Disarms the timer. Returns whether it was armed.
    pub fn cancel(&mut self) -> bool {
        self.coalesced = 0;
        self.deadline.take().is_some()
    }

    /// Disarms and returns `true` once the deadline has passed.
    pub fn take_due(&mut self, now_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    /// Schedules folded into the currently armed deadline.
    pub fn coalesced(&self) -> u32 {
        self.coalesced
    }
}
