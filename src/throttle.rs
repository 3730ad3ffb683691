//! Rate limiting and cooperative stop for the background loops.

use crate::services::time_source::TimeSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single sleep taken while waiting, so a stop request is noticed
/// within this bound.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared stop request for a loop that otherwise runs forever.
///
/// Production code never raises it for the refresher; tests do, so that the
/// thread can be joined deterministically.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caps how often an operation may run.
///
/// The caller marks the instant an operation finished; `wait` then sleeps
/// for whatever is left of the period.
#[derive(Debug, Clone)]
pub struct Throttle {
    period: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// Throttle allowing at most `rate` operations per second.
    ///
    /// A period too long for `Duration` (a rate of zero or close to it)
    /// saturates to `Duration::MAX`, so the operation effectively never
    /// repeats. A negative or NaN rate yields no throttling; configuration
    /// validation rejects such rates before they get here.
    pub fn from_rate(rate: f64) -> Self {
        let secs = 1.0 / rate;
        let period = match Duration::try_from_secs_f64(secs) {
            Ok(period) => period,
            Err(_) if secs > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        };
        Self::new(period)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn last(&self) -> Option<Instant> {
        self.last
    }

    /// Record that the throttled operation happened at `at`.
    pub fn mark(&mut self, at: Instant) {
        self.last = Some(at);
    }

    /// Time left before the next operation is allowed. Zero before the first
    /// `mark`.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self
                .period
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the next operation is allowed.
    ///
    /// Returns `false` if `stop` was raised while waiting.
    pub fn wait(&self, time: &dyn TimeSource, stop: &StopSignal) -> bool {
        loop {
            if stop.is_stopped() {
                return false;
            }
            let remaining = self.remaining(time.now());
            if remaining.is_zero() {
                return true;
            }
            time.sleep(remaining.min(MAX_SLEEP_SLICE));
        }
    }
}
