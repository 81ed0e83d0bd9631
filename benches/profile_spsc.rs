//! Latency and throughput profile for the blocking SPSC queue.
//!
//! Run with:
//!   cargo bench --bench profile_spsc
//!
//! Or for perf analysis:
//!   cargo build --release --bench profile_spsc
//!   perf stat -e cycles,instructions,cache-misses,branch-misses \
//!       ./target/release/deps/profile_spsc-*
//!
//! Latency is measured as ping-pong round-trip over two queues divided by
//! two, recorded into an HDR histogram. Pin producer and consumer to
//! separate physical cores for stable numbers.

use std::thread;
use std::time::Instant;

use hdrhistogram::Histogram;
use spindle::spsc;
use spindle::spsc::Builder;
use spindle::wait::Spin;

const WARMUP: usize = 10_000;
const SAMPLES: usize = 100_000;
const CAPACITY: usize = 1024;
const THROUGHPUT_COUNT: u64 = 10_000_000;

#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtscp() -> u64 {
    unsafe {
        let mut aux: u32 = 0;
        core::arch::x86_64::__rdtscp(&mut aux)
    }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn rdtscp() -> u64 {
    // Fallback: nanoseconds instead of cycles.
    use std::time::UNIX_EPOCH;
    std::time::SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

fn latency_benchmark() {
    println!("=== Latency (ping-pong RTT/2, spin waits) ===");
    println!("{SAMPLES} samples after {WARMUP} warmup, capacity {CAPACITY}");
    println!();

    let (mut tx_fwd, mut rx_fwd) = Builder::new(CAPACITY)
        .read_wait(Spin)
        .write_wait(Spin)
        .build::<u64>();
    let (mut tx_ret, mut rx_ret) = Builder::new(CAPACITY)
        .read_wait(Spin)
        .write_wait(Spin)
        .build::<u64>();

    let total = WARMUP + SAMPLES;

    // Echo thread: take from the forward queue, put into the return queue.
    let echo = thread::spawn(move || {
        for _ in 0..total {
            let value = rx_fwd.take();
            tx_ret.put(value);
        }
    });

    let mut hist = Histogram::<u64>::new_with_max(1_000_000, 3).unwrap();

    for i in 0..total {
        let start = rdtscp();

        tx_fwd.put(i as u64);
        let _ = rx_ret.take();

        let elapsed = rdtscp().wrapping_sub(start) / 2;

        if i >= WARMUP {
            let _ = hist.record(elapsed.min(1_000_000));
        }
    }

    echo.join().unwrap();

    println!(
        "One-way latency, cycles: mean {:.0} (min {}, max {})",
        hist.mean(),
        hist.min(),
        hist.max()
    );
    for (label, quantile) in [
        ("p50", 0.50),
        ("p95", 0.95),
        ("p99", 0.99),
        ("p99.9", 0.999),
    ] {
        println!("  {label:<6} {}", hist.value_at_quantile(quantile));
    }
    println!();
}

fn throughput_benchmark() {
    println!("=== Throughput (unidirectional, default waits) ===");
    println!("{THROUGHPUT_COUNT} messages, capacity {CAPACITY}");
    println!();

    let (mut tx, mut rx) = spsc::ring_buffer::<u64>(CAPACITY);

    let producer = thread::spawn(move || {
        for i in 0..THROUGHPUT_COUNT {
            tx.put(i);
        }
    });

    let consumer = thread::spawn(move || {
        let start = Instant::now();
        let mut sum = 0u64;
        for _ in 0..THROUGHPUT_COUNT {
            sum = sum.wrapping_add(rx.take());
        }
        (start.elapsed(), sum)
    });

    producer.join().unwrap();
    let (elapsed, sum) = consumer.join().unwrap();

    assert_eq!(sum, THROUGHPUT_COUNT * (THROUGHPUT_COUNT - 1) / 2);

    let per_sec = THROUGHPUT_COUNT as f64 / elapsed.as_secs_f64();
    println!("  elapsed: {:.3} s", elapsed.as_secs_f64());
    println!("  rate:    {:.1} M msgs/sec", per_sec / 1_000_000.0);
    println!();
}

fn main() {
    latency_benchmark();
    throughput_benchmark();
}
