//! Busy-wait strategies for blocking queue operations.
//!
//! When a producer finds the queue full, or a consumer finds it empty, the
//! blocking loop idles through a [`BusyWaitStrategy`]: the queue calls
//! [`reset`](BusyWaitStrategy::reset) once on entry, then
//! [`tick`](BusyWaitStrategy::tick) after every failed re-check until the
//! condition clears. The strategy decides what one unit of idling costs -
//! anywhere from a pause instruction to a millisecond of sleep.
//!
//! # Choosing a Strategy
//!
//! | Strategy | Latency | CPU burn | Use when |
//! |----------|---------|----------|----------|
//! | [`Spin`] | lowest | 100% of a core | the other side is always hot |
//! | [`Yield`] | low | high | cores are oversubscribed but waits are short |
//! | [`Backoff`] | low on bursts | adaptive | unsure (the default) |
//! | [`Park`] | bounded by timeout | near zero | waits can be long |
//! | [`Sleep`] | ~1 ms | near zero | throughput matters, latency does not |
//!
//! # Example
//!
//! ```
//! use spindle::wait::{Backoff, BusyWaitStrategy, Park};
//!
//! // The default composite: spin, then yield, then park.
//! let mut wait = Backoff::default();
//!
//! wait.reset();
//! wait.tick(); // one idle unit
//!
//! // Or escalate into a custom fallback.
//! let mut wait = Backoff::new(Park::default());
//! wait.reset();
//! wait.tick();
//! ```

use std::fmt;
use std::hint;
use std::thread;
use std::time::Duration;

/// Decides how a blocked producer or consumer idles between retries.
///
/// Implementations must be infallible: `tick` may spin, yield, sleep, or
/// park, but must not panic. Waking early is always harmless because the
/// blocking loop re-checks its condition after every tick.
///
/// Custom strategies can observe external state (a cancellation flag, a
/// deadline) inside `tick` and arrange for control to return to an outer
/// loop; the queue itself never signals cancellation.
pub trait BusyWaitStrategy {
    /// Returns the strategy to its initial state.
    ///
    /// Called once each time a blocking loop is entered, before the first
    /// `tick`. Stateless strategies can rely on the default empty body.
    fn reset(&mut self) {}

    /// Performs one unit of idling.
    fn tick(&mut self);
}

/// Sleeps for a fixed duration on every tick.
///
/// The cheapest strategy in CPU terms and the worst in wake-up latency.
#[derive(Debug, Clone)]
pub struct Sleep {
    duration: Duration,
}

impl Sleep {
    /// Creates a strategy sleeping for `duration` per tick.
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for Sleep {
    /// One millisecond per tick.
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl BusyWaitStrategy for Sleep {
    fn tick(&mut self) {
        thread::sleep(self.duration);
    }
}

/// Yields the current thread to the OS scheduler on every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yield;

impl BusyWaitStrategy for Yield {
    fn tick(&mut self) {
        thread::yield_now();
    }
}

/// Spins with a pause hint on every tick.
///
/// Burns a full core while waiting. Only worth it when the opposite side is
/// pinned to another core and waits are expected to last nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin;

impl BusyWaitStrategy for Spin {
    fn tick(&mut self) {
        hint::spin_loop();
    }
}

/// Parks the current thread for a bounded duration on every tick.
///
/// This queue variant has no cross-side wake-up channel, so the park is
/// always bounded by the timeout; the thread self-wakes and the blocking
/// loop re-checks. Spurious earlier wake-ups are equally harmless.
#[derive(Debug, Clone)]
pub struct Park {
    timeout: Duration,
}

impl Park {
    /// Creates a strategy parking for at most `timeout` per tick.
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for Park {
    /// One millisecond per tick.
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl BusyWaitStrategy for Park {
    fn tick(&mut self) {
        thread::park_timeout(self.timeout);
    }
}

/// Escalating strategy: spins, then yields, then delegates to a fallback.
///
/// The first ticks after a `reset` spin with a pause hint, later ones yield
/// to the scheduler (both via [`crossbeam_utils::Backoff`]), and once the
/// backoff is exhausted every further tick goes to the wrapped fallback
/// strategy. `reset` returns to the spin phase and resets the fallback.
///
/// `Backoff::default()` wraps [`Park`] and is the strategy installed on
/// both sides by [`spsc::ring_buffer`](crate::spsc::ring_buffer).
pub struct Backoff {
    spin: crossbeam_utils::Backoff,
    fallback: Box<dyn BusyWaitStrategy + Send>,
}

impl Backoff {
    /// Creates a backoff escalating into `fallback` once spinning and
    /// yielding are exhausted.
    pub fn new(fallback: impl BusyWaitStrategy + Send + 'static) -> Self {
        Self {
            spin: crossbeam_utils::Backoff::new(),
            fallback: Box::new(fallback),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Park::default())
    }
}

impl BusyWaitStrategy for Backoff {
    fn reset(&mut self) {
        self.spin = crossbeam_utils::Backoff::new();
        self.fallback.reset();
    }

    fn tick(&mut self) {
        if self.spin.is_completed() {
            self.fallback.tick();
        } else {
            self.spin.snooze();
        }
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("spin_completed", &self.spin.is_completed())
            .finish_non_exhaustive()
    }
}
