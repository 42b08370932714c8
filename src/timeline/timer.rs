//! Injected clock and cancellable deadline timers.
//!
//! The engine never reads the system clock directly. "Now" is a monotonic
//! offset used for debounce and guard windows; "today" is the calendar day
//! used for the today marker. Timers are plain deadlines that the engine
//! fires from its `tick`, which keeps everything on the UI thread.

use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

/// Source of time for one engine instance.
pub trait Clock {
    /// Monotonic time since an arbitrary epoch.
    fn now(&self) -> Duration;
    /// The current calendar day.
    fn today(&self) -> NaiveDate;
}

/// Wall clock backed by [`Instant`] and the local calendar.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Duration>,
    today: Cell<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            today: Cell::new(today),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// A single-shot deadline. Re-arming replaces the pending deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Duration>,
}

impl Timer {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedule the timer `delay` after `now`, superseding any pending deadline.
    /// A deadline past `Duration::MAX` saturates and never fires.
    pub fn arm(&mut self, now: Duration, delay: Duration) {
        self.deadline = Some(now.checked_add(delay).unwrap_or(Duration::MAX));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns `true` exactly once, when `now` has reached the deadline.
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the deadline, if armed.
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_sub(now))
    }
}

/// Earliest of several optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Duration>>) -> Option<Duration> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once_after_deadline() {
        let mut timer = Timer::new();
        timer.arm(Duration::from_millis(10), Duration::from_millis(16));
        assert!(!timer.fire_if_due(Duration::from_millis(25)));
        assert!(timer.fire_if_due(Duration::from_millis(26)));
        assert!(!timer.fire_if_due(Duration::from_millis(40)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn rearming_supersedes_pending_deadline() {
        let mut timer = Timer::new();
        timer.arm(Duration::ZERO, Duration::from_millis(16));
        timer.arm(Duration::from_millis(10), Duration::from_millis(16));
        assert!(!timer.fire_if_due(Duration::from_millis(16)));
        assert_eq!(timer.remaining(Duration::from_millis(16)), Some(Duration::from_millis(10)));
        assert!(timer.fire_if_due(Duration::from_millis(26)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = Timer::new();
        timer.arm(Duration::ZERO, Duration::from_millis(1));
        timer.cancel();
        assert!(!timer.fire_if_due(Duration::from_secs(1)));
    }

    #[test]
    fn huge_delay_saturates() {
        let mut timer = Timer::new();
        timer.arm(Duration::from_secs(5), Duration::MAX);
        assert_eq!(timer.deadline(), Some(Duration::MAX));
        assert!(!timer.fire_if_due(Duration::from_secs(3600)));
        assert_eq!(timer.remaining(Duration::ZERO), Some(Duration::MAX));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        clock.advance_ms(40);
        assert_eq!(clock.now(), Duration::from_millis(40));
        assert_eq!(
            earliest([None, Some(Duration::from_millis(5)), Some(Duration::from_millis(3))]),
            Some(Duration::from_millis(3))
        );
    }
}
