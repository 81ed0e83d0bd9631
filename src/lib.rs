//! Blocking bounded SPSC queues for latency-critical pipelines.
//!
//! `spindle` provides a single-producer single-consumer ring buffer whose
//! `put` and `take` block under back-pressure instead of failing, idling
//! through a pluggable [busy-wait strategy](wait::BusyWaitStrategy).
//!
//! # Quick Start
//!
//! ```
//! use spindle::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);
//!
//! tx.put(42);
//! assert_eq!(rx.take(), 42);
//! ```
//!
//! # Blocking Model
//!
//! The hot path is lock-free: when the queue is neither full nor empty, an
//! operation costs no atomic loads (cached indices) and a single release
//! store to publish. Only when a side runs out of room does it enter a wait
//! loop, and *how* it idles there is up to the installed strategy: spin,
//! yield, sleep, park, or an escalating combination. Both sides get their
//! own strategy, chosen at construction:
//!
//! ```
//! use spindle::spsc::Builder;
//! use spindle::wait::{Sleep, Spin};
//!
//! // Spin-hungry consumer, polite producer.
//! let (mut tx, mut rx) = Builder::new(1024)
//!     .read_wait(Spin)
//!     .write_wait(Sleep::default())
//!     .build::<u64>();
//!
//! tx.put(7);
//! assert_eq!(rx.take(), 7);
//! ```
//!
//! # Threading
//!
//! The [`Producer`] and [`Consumer`] endpoints are `Send` but not `Sync`:
//! exactly one thread drives each side, and the type system enforces it.
//!
//! ```
//! use std::thread;
//! use spindle::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..100 {
//!         tx.put(i); // blocks while the queue is full
//!     }
//! });
//!
//! let consumer = thread::spawn(move || {
//!     let mut sum = 0;
//!     for _ in 0..100 {
//!         sum += rx.take(); // blocks while the queue is empty
//!     }
//!     sum
//! });
//!
//! producer.join().unwrap();
//! assert_eq!(consumer.join().unwrap(), 4950);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

use core::fmt;

pub mod spsc;
pub mod wait;

pub use spsc::{Builder, Consumer, Producer, ring_buffer};

/// Error returned by queue-family operations this variant does not support.
///
/// The queue family shares a uniform contract; monitor-based accessors are
/// only meaningful for variants that synchronize consumers through a lock,
/// and this variant opts out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported;

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation not supported by this queue variant")
    }
}

impl std::error::Error for Unsupported {}
