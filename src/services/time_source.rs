//! Clock seam for the two rate-limited loops.
//!
//! The refresher and the viewer only ever ask for the current instant and
//! sleep through a [`TimeSource`]. Production uses the OS clock. Tests use
//! [`LogicalClock`], where sleeping advances a counter and is recorded, so a
//! loop throttled to one run every two seconds runs instantly and its sleep
//! pattern can be asserted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub trait TimeSource: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

pub type SharedTimeSource = Arc<dyn TimeSource>;

/// The OS monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeSource;

impl RealTimeSource {
    pub fn shared() -> SharedTimeSource {
        Arc::new(Self)
    }
}

impl TimeSource for RealTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced by hand.
///
/// Shared between threads: a refresher sleeping on it moves time for the
/// viewer too.
///
/// ```
/// use watchl::services::time_source::{LogicalClock, TimeSource};
/// use std::time::Duration;
///
/// let clock = LogicalClock::new();
/// clock.sleep(Duration::from_millis(100));
/// clock.sleep(Duration::from_millis(40));
///
/// assert_eq!(clock.elapsed(), Duration::from_millis(140));
/// assert_eq!(clock.sleeps().len(), 2);
/// ```
#[derive(Debug)]
pub struct LogicalClock {
    origin: Instant,
    state: Mutex<ClockState>,
}

#[derive(Debug, Default)]
struct ClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicalClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ClockState::default()),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move time forward without recording a sleep, e.g. to stand in for a
    /// command that takes a while.
    pub fn advance(&self, duration: Duration) {
        self.state().elapsed += duration;
    }

    /// Logical time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.state().elapsed
    }

    /// Every sleep taken so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().sleeps.clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.state().sleeps.len()
    }
}

impl TimeSource for LogicalClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        {
            let mut state = self.state();
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
        // Logical sleeps never block, so give the other loop a turn.
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::{StopSignal, Throttle, MAX_SLEEP_SLICE};

    #[test]
    fn test_real_clock_moves_forward() {
        let clock = RealTimeSource;
        let before = clock.now();
        clock.sleep(Duration::from_millis(2));
        assert!(clock.now() >= before + Duration::from_millis(2));
    }

    #[test]
    fn test_advance_is_not_a_sleep() {
        let clock = LogicalClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(3));

        assert_eq!(clock.now() - start, Duration::from_secs(3));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_throttle_wait_sleeps_in_bounded_slices() {
        let clock = LogicalClock::new();
        let mut throttle = Throttle::new(Duration::from_millis(750));
        throttle.mark(clock.now());

        assert!(throttle.wait(&clock, &StopSignal::new()));

        let sleeps = clock.sleeps();
        assert!(sleeps.iter().all(|s| *s <= MAX_SLEEP_SLICE), "{:?}", sleeps);
        assert_eq!(sleeps.iter().sum::<Duration>(), Duration::from_millis(750));
        assert_eq!(sleeps.last(), Some(&Duration::from_millis(50)));
    }

    #[test]
    fn test_throttle_wait_credits_time_already_spent() {
        let clock = LogicalClock::new();
        let mut throttle = Throttle::new(Duration::from_secs(2));
        throttle.mark(clock.now());
        // A slow command ate most of the period.
        clock.advance(Duration::from_millis(1950));

        assert!(throttle.wait(&clock, &StopSignal::new()));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(50)]);
    }

    #[test]
    fn test_stop_from_another_thread_ends_wait_within_a_slice() {
        const DAY: Duration = Duration::from_secs(24 * 60 * 60);
        let clock = LogicalClock::shared();
        let stop = StopSignal::new();
        let waiter = {
            let clock = clock.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut throttle = Throttle::new(DAY);
                throttle.mark(clock.now());
                throttle.wait(clock.as_ref(), &stop)
            })
        };

        while clock.sleep_count() < 3 {
            std::thread::yield_now();
        }
        stop.stop();

        assert!(!waiter.join().unwrap());
        // Every slice is short, so the stop was seen long before the day ended.
        assert!(clock.elapsed() < DAY);
        assert!(clock.sleeps().iter().all(|s| *s <= MAX_SLEEP_SLICE));
    }

    #[test]
    fn test_sleep_on_one_thread_moves_time_for_another() {
        let clock = LogicalClock::shared();
        let start = clock.now();
        let sleeper = {
            let clock = clock.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    clock.sleep(Duration::from_millis(20));
                }
            })
        };
        sleeper.join().unwrap();

        assert_eq!(clock.now() - start, Duration::from_millis(200));
    }
}
