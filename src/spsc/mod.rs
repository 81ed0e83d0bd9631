//! Blocking single-producer single-consumer (SPSC) bounded queue.
//!
//! `put` and `take` apply back-pressure by blocking, idling through the
//! [busy-wait strategies](crate::wait) installed at construction. The hot
//! path stays lock-free: no compare-and-swap anywhere, and no atomic loads
//! at all while the cached index mirrors stay valid.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Shared:                                                     │
//! │   read:  CachePadded<AtomicUsize>   ← Consumer publishes    │
//! │   write: CachePadded<AtomicUsize>   ← Producer publishes    │
//! │   slots: Box<[Slot<T>]>                                     │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ Producer:           │     │ Consumer:           │
//! │   write (local)     │     │   read (local)      │
//! │   cached_read       │     │   cached_write      │
//! │   write strategy    │     │   read strategy     │
//! └─────────────────────┘     └─────────────────────┘
//! ```
//!
//! Positions march *downward* through the slot array, wrapping from 0 back
//! to `capacity - 1`. The producer stores into the slot at its current
//! position and then release-publishes the decremented position, so the
//! shared `write` always names the next slot to be written and the occupied
//! region runs from `read` down to one past `write`. Publication order
//! gives the memory-ordering contract:
//!
//! - slot store happens-before the release-store of `write`, which
//!   happens-before the consumer's acquire-load of `write` and its read of
//!   the slot;
//! - slot clear happens-before the release-store of `read`, which
//!   happens-before the producer's acquire-load of `read` and its reuse of
//!   the slot.
//!
//! Each side keeps a private mirror of the opposite position and only
//! acquire-loads the shared value when the mirror suggests the ring is
//! full (producer) or empty (consumer).
//!
//! One slot stays reserved to tell "full" from "empty", so a queue built
//! with capacity `C` buffers at most `C - 1` elements.
//!
//! # Example
//!
//! ```
//! use spindle::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
//!
//! tx.put(1);
//! tx.put(2);
//!
//! assert_eq!(rx.take(), 1);
//! assert_eq!(rx.take(), 2);
//! ```

mod ring;

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::Unsupported;
use crate::wait::{Backoff, BusyWaitStrategy};
use ring::RingBuffer;

/// Creates a blocking SPSC queue with the given capacity and the default
/// [`Backoff`] strategy on both sides.
///
/// The capacity is rounded up to the next power of two (minimum 2). One
/// slot is reserved, so at most `capacity - 1` elements are buffered.
///
/// # Panics
///
/// Panics if `capacity` is zero.
///
/// # Example
///
/// ```
/// use spindle::spsc;
///
/// let (mut tx, mut rx) = spsc::ring_buffer::<String>(100);
/// // Actual capacity is 128 (next power of two).
/// assert_eq!(tx.capacity(), 128);
///
/// tx.put("hello".to_string());
/// assert_eq!(rx.take(), "hello");
/// ```
pub fn ring_buffer<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    Builder::new(capacity).build()
}

/// Configures and builds a blocking SPSC queue.
///
/// The builder owns the capacity validation and the per-side wait
/// strategies; the queue itself trusts what it is handed.
///
/// # Example
///
/// ```
/// use spindle::spsc::Builder;
/// use spindle::wait::{Sleep, Spin};
///
/// let (mut tx, mut rx) = Builder::new(64)
///     .read_wait(Spin)
///     .write_wait(Sleep::default())
///     .build::<u64>();
///
/// tx.put(9);
/// assert_eq!(rx.take(), 9);
/// ```
pub struct Builder {
    capacity: usize,
    read_wait: Box<dyn BusyWaitStrategy + Send>,
    write_wait: Box<dyn BusyWaitStrategy + Send>,
}

impl Builder {
    /// Starts a builder for a queue of (at least) the given capacity.
    ///
    /// The capacity is rounded up to the next power of two, with a minimum
    /// of 2 so that the ring has a usable slot beside the reserved one.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be non-zero");

        Self {
            capacity: capacity.next_power_of_two().max(2),
            read_wait: Box::new(Backoff::default()),
            write_wait: Box::new(Backoff::default()),
        }
    }

    /// Installs the strategy the consumer idles with while the queue is
    /// empty or under-sized.
    pub fn read_wait(mut self, strategy: impl BusyWaitStrategy + Send + 'static) -> Self {
        self.read_wait = Box::new(strategy);
        self
    }

    /// Installs the strategy the producer idles with while the queue is
    /// full.
    pub fn write_wait(mut self, strategy: impl BusyWaitStrategy + Send + 'static) -> Self {
        self.write_wait = Box::new(strategy);
        self
    }

    /// Allocates the ring and returns the endpoint pair.
    ///
    /// Every slot starts at the empty sentinel and all four positions start
    /// at `capacity - 1`.
    pub fn build<T>(self) -> (Producer<T>, Consumer<T>) {
        let shared = Arc::new(RingBuffer::new(self.capacity));
        let start = shared.capacity_minus_one();

        (
            Producer {
                write: start,
                cached_read: start,
                wait: self.write_wait,
                shared: Arc::clone(&shared),
            },
            Consumer {
                read: start,
                cached_write: start,
                wait: self.read_wait,
                shared,
            },
        )
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// The producing half of a blocking SPSC queue.
///
/// Takes `&mut self` to statically ensure single-producer access; the
/// endpoint can be sent to another thread but not shared (`Send`, not
/// `Sync`).
pub struct Producer<T> {
    /// Our write position (authoritative, only we update it).
    write: usize,
    /// Snapshot of the consumer's published position, refreshed only when
    /// the ring looks full.
    cached_read: usize,
    wait: Box<dyn BusyWaitStrategy + Send>,
    shared: Arc<RingBuffer<T>>,
}

impl<T> Producer<T> {
    /// Publishes an element, blocking while the queue is full.
    ///
    /// Back-pressure is applied through the write strategy: it is reset
    /// once, then ticked after every failed fullness re-check.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
    /// tx.put(1);
    /// tx.put(2);
    /// assert_eq!(rx.len(), 2);
    /// # assert_eq!(rx.take(), 1);
    /// ```
    pub fn put(&mut self, value: T) {
        let write = self.write;
        let next = self.shared.wrap_dec(write);

        self.wait.reset();
        while self.is_full_at(next) {
            self.wait.tick();
        }

        // Safety: the consumer never touches slots outside the region we
        // have published, and `write` itself is not published yet.
        unsafe { self.shared.slot(write).put(value) };

        self.shared.publish_write(next);
        self.write = next;
    }

    /// Fullness test against the cached mirror: only on a collision is the
    /// shared position acquire-loaded and the test repeated.
    #[inline]
    fn is_full_at(&mut self, next_write: usize) -> bool {
        if self.cached_read == next_write {
            self.cached_read = self.shared.load_read();
            return self.cached_read == next_write;
        }
        false
    }

    /// Returns the capacity of the queue (one slot of which is reserved).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Returns the number of buffered elements.
    ///
    /// Computed from acquire-loads of both shared positions; the result
    /// may lag the consumer (and overreport after a `take_last`, which
    /// defers publishing the consumer position), but it never exceeds
    /// `capacity - 1`.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared
            .occupancy(self.shared.load_read(), self.shared.load_write())
    }

    /// Returns `true` if the queue appears empty. Same staleness caveats
    /// as [`len`](Producer::len).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// The consuming half of a blocking SPSC queue.
///
/// Takes `&mut self` for consuming operations; the endpoint can be sent to
/// another thread but not shared (`Send`, not `Sync`). The traversing
/// observers ([`contains`](Consumer::contains), [`for_each`](Consumer::for_each),
/// the [`Display`](fmt::Display) dump) walk the occupied region from oldest
/// to newest and are best-effort: they see a consistent snapshot of the two
/// positions but not of the elements, and they skip any slot observed at
/// the empty sentinel.
pub struct Consumer<T> {
    /// Our read position (authoritative, only we update it).
    read: usize,
    /// Snapshot of the producer's published position, refreshed only when
    /// the ring looks empty.
    cached_write: usize,
    wait: Box<dyn BusyWaitStrategy + Send>,
    shared: Arc<RingBuffer<T>>,
}

impl<T> Consumer<T> {
    /// Takes the oldest element, blocking while the queue is empty.
    ///
    /// The read strategy is reset once, then ticked after every failed
    /// emptiness re-check.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
    /// tx.put(7);
    /// assert_eq!(rx.take(), 7);
    /// ```
    pub fn take(&mut self) -> T {
        let read = self.read;

        self.wait.reset();
        if self.is_empty_at(read) {
            // Re-publish our position before idling: a producer blocked on
            // a stale view of it (take_last defers publication) can only
            // make progress once the fresh value lands.
            self.shared.publish_read(read);
            loop {
                self.wait.tick();
                if !self.is_empty_at(read) {
                    break;
                }
            }
        }

        // Safety: `read` is inside the region the producer has published
        // and not yet reclaimed.
        let value = unsafe { self.shared.slot(read).take() }.expect("published slot was empty");

        let next = self.shared.wrap_dec(read);
        self.shared.publish_read(next);
        self.read = next;

        value
    }

    /// Takes the oldest element without blocking or refreshing the cached
    /// position.
    ///
    /// Intended for draining a batch whose presence was already
    /// established by [`take_batch`](Consumer::take_batch).
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty. Callers must know it is not, e.g.
    /// from a preceding `take_batch`.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
    /// tx.put(1);
    /// tx.put(2);
    ///
    /// rx.take_batch(2);
    /// assert_eq!(rx.take_plain(), 1);
    /// assert_eq!(rx.take_plain(), 2);
    /// ```
    pub fn take_plain(&mut self) -> T {
        let read = self.read;

        // Safety: the caller guarantees the queue is non-empty, so `read`
        // is inside the published region.
        let value = unsafe { self.shared.slot(read).take() }.expect("take_plain on an empty queue");

        let next = self.shared.wrap_dec(read);
        self.shared.publish_read(next);
        self.read = next;

        value
    }

    /// Blocks until at least `n` elements are buffered. Consumes nothing.
    ///
    /// Amortizes the wait cost ahead of a burst of
    /// [`take_plain`](Consumer::take_plain) calls: once this returns, `n`
    /// plain takes succeed without blocking.
    ///
    /// A `n` greater than `capacity - 1` can never be satisfied and blocks
    /// forever.
    pub fn take_batch(&mut self, n: usize) {
        let read = self.read;

        self.wait.reset();
        let mut write = self.shared.load_write();
        if self.shared.occupancy(read, write) < n {
            self.shared.publish_read(read);
            loop {
                self.wait.tick();
                write = self.shared.load_write();
                if self.shared.occupancy(read, write) >= n {
                    break;
                }
            }
        }

        // Re-sync the cached mirror to the write position just observed:
        // the plain takes that follow advance our read position without
        // refreshing it, and the next blocking take trusts it.
        self.cached_write = write;
    }

    /// Blocks until at least one element exists, then drains everything
    /// and returns the most recently published element.
    ///
    /// All older elements are discarded (their slots cleared); afterwards
    /// the queue is empty. The updated read position is deliberately *not*
    /// published to the producer; the next blocking take publishes it, and
    /// until then the producer sees a stale, overly full view of the ring.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
    /// tx.put(1);
    /// tx.put(2);
    /// tx.put(3);
    ///
    /// assert_eq!(rx.take_last(), 3);
    /// assert!(rx.is_empty());
    /// ```
    pub fn take_last(&mut self) -> T {
        let read = self.read;

        self.wait.reset();
        let mut write = self.shared.load_write();
        if write == read {
            self.shared.publish_read(read);
            loop {
                self.wait.tick();
                write = self.shared.load_write();
                if write != read {
                    break;
                }
            }
        }

        // The newest element sits one step behind the write cursor.
        let newest = self.shared.wrap_inc(write);

        // Safety (all three blocks): every touched slot lies between our
        // read position and the acquired write position, a region the
        // producer cannot reach until we publish.
        if newest <= read {
            for position in newest + 1..=read {
                unsafe { self.shared.slot(position).clear() };
            }
        } else {
            for position in 0..=read {
                unsafe { self.shared.slot(position).clear() };
            }
            for position in newest + 1..=self.shared.capacity_minus_one() {
                unsafe { self.shared.slot(position).clear() };
            }
        }

        let value = unsafe { self.shared.slot(newest).take() }.expect("published slot was empty");

        self.read = write;
        self.cached_write = write;

        value
    }

    /// Emptiness test against the cached mirror: only on a collision is
    /// the shared position acquire-loaded and the test repeated.
    #[inline]
    fn is_empty_at(&mut self, read: usize) -> bool {
        if self.cached_write == read {
            self.cached_write = self.shared.load_write();
            return self.cached_write == read;
        }
        false
    }

    /// Returns the capacity of the queue (one slot of which is reserved).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Returns the number of buffered elements.
    ///
    /// Exact on this endpoint: our own position is authoritative and the
    /// producer's is acquire-loaded. The result can only lag by elements
    /// published after the load.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.occupancy(self.read, self.shared.load_write())
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.load_write() == self.read
    }

    /// Returns `true` if some buffered element equals `value`.
    ///
    /// Walks the occupied region from oldest to newest; best-effort, like
    /// all traversing observers.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle::spsc;
    ///
    /// let (mut tx, rx) = spsc::ring_buffer::<u64>(8);
    /// tx.put(5);
    /// assert!(rx.contains(&5));
    /// assert!(!rx.contains(&6));
    /// ```
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let mut found = false;
        self.scan(|element| {
            if element == value {
                found = true;
            }
            !found
        });
        found
    }

    /// Applies `f` to every buffered element, oldest first.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle::spsc;
    ///
    /// let (mut tx, rx) = spsc::ring_buffer::<u64>(8);
    /// tx.put(1);
    /// tx.put(2);
    ///
    /// let mut seen = Vec::new();
    /// rx.for_each(|v| seen.push(*v));
    /// assert_eq!(seen, [1, 2]);
    /// ```
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        self.scan(|element| {
            f(element);
            true
        });
    }

    /// Walks the occupied region from oldest to newest, stopping early
    /// when `f` returns `false`. Splits into two passes when the region
    /// crosses the wrap seam. Slots observed at the sentinel are skipped.
    fn scan(&self, mut f: impl FnMut(&T) -> bool) {
        let read = self.read;
        let write = self.shared.load_write();

        // Safety (both branches): the scanned positions lie between our
        // read position and the acquired write position; the producer
        // cannot write there and only this thread clears.
        if write <= read {
            for position in (write + 1..=read).rev() {
                if let Some(element) = unsafe { self.shared.slot(position).peek() } {
                    if !f(element) {
                        return;
                    }
                }
            }
        } else {
            for position in (0..=read).rev() {
                if let Some(element) = unsafe { self.shared.slot(position).peek() } {
                    if !f(element) {
                        return;
                    }
                }
            }
            for position in (write + 1..=self.shared.capacity_minus_one()).rev() {
                if let Some(element) = unsafe { self.shared.slot(position).peek() } {
                    if !f(element) {
                        return;
                    }
                }
            }
        }
    }

    /// Takes an element using a caller-supplied strategy.
    ///
    /// Always fails for this variant: the installed read strategy is part
    /// of the queue's construction, and per-call strategies are reserved
    /// for queue variants that synchronize consumers through a lock.
    pub fn take_with(&mut self, _wait: &mut dyn BusyWaitStrategy) -> Result<T, Unsupported> {
        Err(Unsupported)
    }

    /// Returns the monitor serializing consumers.
    ///
    /// Always fails for this variant: there is exactly one consumer and no
    /// lock to hand out.
    pub fn read_monitor(&self) -> Result<&Mutex<()>, Unsupported> {
        Err(Unsupported)
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Renders the buffered elements oldest first, as `[e1, e2, ...]`.
impl<T: fmt::Display> fmt::Display for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;

        let mut first = true;
        let mut result = Ok(());
        self.scan(|element| {
            if !first {
                result = f.write_str(", ");
            }
            if result.is_ok() {
                result = write!(f, "{element}");
            }
            first = false;
            result.is_ok()
        });
        result?;

        f.write_str("]")
    }
}
