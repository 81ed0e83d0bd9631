//! The backing storage for the blocking SPSC queue.
//!
//! A single allocation holding:
//! - the two shared position counters, each on its own cache line
//! - the slot array
//!
//! The ring carries no synchronization of its own beyond the two counters;
//! slot accesses are plain, and all cross-thread visibility rides on the
//! release-store / acquire-load pairing of the positions.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// One slot of the ring: either an element or the empty sentinel.
///
/// Access is "plain": no per-slot ordering is attached. The index protocol
/// guarantees that at any instant at most one thread touches a given slot,
/// so the inner value needs no atomicity of its own.
pub(crate) struct Slot<T> {
    value: UnsafeCell<Option<T>>,
}

// Safety: slots are shared between the producer and consumer threads, but
// the index protocol serializes all access to any individual slot. The
// happens-before edges come from the surrounding position publications.
unsafe impl<T: Send> Sync for Slot<T> {}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            value: UnsafeCell::new(None),
        }
    }

    /// Stores an element into the slot.
    ///
    /// # Safety
    ///
    /// Caller must have exclusive access to this slot under the index
    /// protocol, and the slot must currently hold the sentinel.
    #[inline(always)]
    pub(crate) unsafe fn put(&self, value: T) {
        // Safety: exclusive access guaranteed by the caller.
        unsafe { *self.value.get() = Some(value) }
    }

    /// Moves the slot's content out, leaving the sentinel behind.
    ///
    /// # Safety
    ///
    /// Caller must have exclusive access to this slot under the index
    /// protocol.
    #[inline(always)]
    pub(crate) unsafe fn take(&self) -> Option<T> {
        // Safety: exclusive access guaranteed by the caller.
        unsafe { (*self.value.get()).take() }
    }

    /// Drops the slot's content in place, leaving the sentinel behind.
    ///
    /// # Safety
    ///
    /// Caller must have exclusive access to this slot under the index
    /// protocol.
    #[inline(always)]
    pub(crate) unsafe fn clear(&self) {
        // Safety: exclusive access guaranteed by the caller.
        unsafe { *self.value.get() = None }
    }

    /// Reads the slot without consuming it.
    ///
    /// # Safety
    ///
    /// Caller must guarantee no concurrent writer for this slot; observer
    /// traversals satisfy this by staying inside the published region.
    #[inline(always)]
    pub(crate) unsafe fn peek(&self) -> Option<&T> {
        // Safety: no concurrent writer, guaranteed by the caller.
        unsafe { (*self.value.get()).as_ref() }
    }
}

/// Shared state between the producer and consumer endpoints.
///
/// Memory layout:
/// ```text
/// ┌─────────────────────────────────────────────────────────┐
/// │ read  (cache-line padded) - published by the consumer   │
/// ├─────────────────────────────────────────────────────────┤
/// │ write (cache-line padded) - published by the producer   │
/// ├─────────────────────────────────────────────────────────┤
/// │ slots: [Slot<T>; capacity]                              │
/// │ capacity_minus_one                                      │
/// └─────────────────────────────────────────────────────────┘
/// ```
///
/// Positions live in `[0, capacity)` and advance by *decrementing*, wrapping
/// from 0 back to `capacity - 1`. The queue is empty when `read == write`
/// and full when decrementing `write` would land on `read`; one slot stays
/// reserved to tell the two states apart, so at most `capacity - 1` elements
/// are ever buffered.
pub(crate) struct RingBuffer<T> {
    read: CachePadded<AtomicUsize>,
    write: CachePadded<AtomicUsize>,
    slots: Box<[Slot<T>]>,
    capacity_minus_one: usize,
}

impl<T> RingBuffer<T> {
    /// Builds a ring with every slot at the sentinel and both positions at
    /// `capacity - 1`.
    ///
    /// `capacity` must be a power of two >= 2; the builder validates it.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 2 && capacity.is_power_of_two());

        let slots: Box<[Slot<T>]> = (0..capacity).map(|_| Slot::empty()).collect();
        let capacity_minus_one = capacity - 1;

        Self {
            read: CachePadded::new(AtomicUsize::new(capacity_minus_one)),
            write: CachePadded::new(AtomicUsize::new(capacity_minus_one)),
            slots,
            capacity_minus_one,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity_minus_one + 1
    }

    #[inline]
    pub(crate) fn capacity_minus_one(&self) -> usize {
        self.capacity_minus_one
    }

    /// The next position in advance direction: decrement, wrapping to the
    /// top of the ring at zero.
    #[inline(always)]
    pub(crate) fn wrap_dec(&self, position: usize) -> usize {
        if position == 0 {
            self.capacity_minus_one
        } else {
            position - 1
        }
    }

    /// One step *against* the advance direction; from a write position this
    /// is the most recently written slot.
    #[inline(always)]
    pub(crate) fn wrap_inc(&self, position: usize) -> usize {
        if position == self.capacity_minus_one {
            0
        } else {
            position + 1
        }
    }

    /// Number of published elements between a read and a write position.
    ///
    /// Bounded by `capacity - 1` for any pair of in-range positions.
    #[inline]
    pub(crate) fn occupancy(&self, read: usize, write: usize) -> usize {
        if write <= read {
            read - write
        } else {
            self.capacity() - (write - read)
        }
    }

    // === Index operations ===

    #[inline(always)]
    pub(crate) fn load_read(&self) -> usize {
        self.read.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn load_write(&self) -> usize {
        self.write.load(Ordering::Acquire)
    }

    /// Publishes a new read position. Slot clears performed by the consumer
    /// before this call become visible to the producer with it.
    #[inline(always)]
    pub(crate) fn publish_read(&self, read: usize) {
        self.read.store(read, Ordering::Release);
    }

    /// Publishes a new write position. The slot written by the producer
    /// before this call becomes visible to the consumer with it.
    #[inline(always)]
    pub(crate) fn publish_write(&self, write: usize) {
        self.write.store(write, Ordering::Release);
    }

    // === Slot access ===

    /// The slot at `position`; positions stay in `[0, capacity)` by
    /// construction, so no masking is needed.
    #[inline(always)]
    pub(crate) fn slot(&self, position: usize) -> &Slot<T> {
        &self.slots[position]
    }
}
