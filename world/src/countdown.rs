//! Countdown window started by each disaster.

use disaster_survival_core::COUNTDOWN_TICKS;

/// Countdown state owned exclusively by the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Countdown {
    time_left: u32,
    active: bool,
}

impl Countdown {
    /// Creates an inactive countdown showing the full window.
    pub(crate) const fn new() -> Self {
        Self {
            time_left: COUNTDOWN_TICKS,
            active: false,
        }
    }

    /// Restarts the countdown at the full window.
    pub(crate) fn start(&mut self) {
        self.time_left = COUNTDOWN_TICKS;
        self.active = true;
    }

    /// Freezes the countdown at its current value.
    pub(crate) fn stop(&mut self) {
        self.active = false;
    }

    /// Decrements the countdown, returning `true` when it just expired.
    ///
    /// An inactive countdown never changes.
    pub(crate) fn advance(&mut self) -> bool {
        if !self.active {
            return false;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.active = false;
            return true;
        }
        false
    }

    pub(crate) const fn time_left(&self) -> u32 {
        self.time_left
    }

    pub(crate) const fn is_active(&self) -> bool {
        self.active
    }
}
