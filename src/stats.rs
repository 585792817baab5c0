use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::oracle::SolveResponse;

/// Time buckets the engine attributes elapsed wall-clock time to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bucket {
    Flip,
    Check,
}

const NO_SOLVE: u64 = u64::MAX;

/// Counters and time accumulators of a backbone run.
///
/// Everything is atomic so the signal thread can render a consistent
/// statistics snapshot while the driver is working; the driver is the only
/// writer. Times are nanoseconds relative to `epoch`.
#[derive(Debug)]
pub struct Stats {
    epoch: Instant,

    pub backbones: AtomicU64,
    pub dropped: AtomicU64,
    pub filtered: AtomicU64,
    pub flipped: AtomicU64,
    pub fixed: AtomicU64,
    pub checked: AtomicU64,

    pub calls: AtomicU64,
    pub sat_calls: AtomicU64,
    pub unsat_calls: AtomicU64,
    pub unknown_calls: AtomicU64,

    pub first_time: AtomicU64,
    pub sat_time: AtomicU64,
    pub sat_max_time: AtomicU64,
    pub unsat_time: AtomicU64,
    pub unsat_max_time: AtomicU64,
    pub flip_time: AtomicU64,
    pub check_time: AtomicU64,
    pub unknown_time: AtomicU64,
    pub solving_time: AtomicU64,

    /// Start mark of the in-flight solve, `NO_SOLVE` when none is running.
    solve_started: AtomicU64,
}

impl Stats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            epoch: Instant::now(),
            backbones: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            flipped: AtomicU64::new(0),
            fixed: AtomicU64::new(0),
            checked: AtomicU64::new(0),
            calls: AtomicU64::new(0),
            sat_calls: AtomicU64::new(0),
            unsat_calls: AtomicU64::new(0),
            unknown_calls: AtomicU64::new(0),
            first_time: AtomicU64::new(0),
            sat_time: AtomicU64::new(0),
            sat_max_time: AtomicU64::new(0),
            unsat_time: AtomicU64::new(0),
            unsat_max_time: AtomicU64::new(0),
            flip_time: AtomicU64::new(0),
            check_time: AtomicU64::new(0),
            unknown_time: AtomicU64::new(0),
            solving_time: AtomicU64::new(0),
            solve_started: AtomicU64::new(NO_SOLVE),
        })
    }

    pub fn bump(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn now(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    pub fn process_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Mark a solve as in flight; must be paired with `solve_finished`.
    pub fn solve_started(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.solve_started.store(self.now(), Ordering::Relaxed);
    }

    /// Attribute the finished solve to its result bucket.
    pub fn solve_finished(&self, response: SolveResponse) {
        let started = self.solve_started.swap(NO_SOLVE, Ordering::Relaxed);
        debug_assert_ne!(started, NO_SOLVE);
        let delta = self.now().saturating_sub(started);

        if self.calls.load(Ordering::Relaxed) == 1 {
            self.first_time.store(delta, Ordering::Relaxed);
        }
        match response {
            SolveResponse::Sat => {
                self.sat_calls.fetch_add(1, Ordering::Relaxed);
                self.sat_time.fetch_add(delta, Ordering::Relaxed);
                self.sat_max_time.fetch_max(delta, Ordering::Relaxed);
            }
            SolveResponse::Unsat => {
                self.unsat_calls.fetch_add(1, Ordering::Relaxed);
                self.unsat_time.fetch_add(delta, Ordering::Relaxed);
                self.unsat_max_time.fetch_max(delta, Ordering::Relaxed);
            }
            SolveResponse::Interrupted => {
                self.unknown_calls.fetch_add(1, Ordering::Relaxed);
                self.unknown_time.fetch_add(delta, Ordering::Relaxed);
            }
        }
        self.solving_time.fetch_add(delta, Ordering::Relaxed);
    }

    /// Close an in-flight solve interrupted by a signal: its elapsed time is
    /// accounted as unknown. Safe to call when no solve is running.
    pub fn interrupt(&self) {
        let started = self.solve_started.swap(NO_SOLVE, Ordering::Relaxed);
        if started == NO_SOLVE {
            return;
        }
        let delta = self.now().saturating_sub(started);
        self.unknown_calls.fetch_add(1, Ordering::Relaxed);
        self.unknown_time.fetch_add(delta, Ordering::Relaxed);
        self.solving_time.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn add_time(&self, bucket: Bucket, duration: Duration) {
        let nanos = duration.as_nanos() as u64;
        match bucket {
            Bucket::Flip => self.flip_time.fetch_add(nanos, Ordering::Relaxed),
            Bucket::Check => self.check_time.fetch_add(nanos, Ordering::Relaxed),
        };
    }

    pub fn count(&self, counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn seconds(&self, time: &AtomicU64) -> f64 {
        time.load(Ordering::Relaxed) as f64 / 1e9
    }
}

/// Stack of timing frames. Starting a nested frame pauses the enclosing one
/// (its elapsed share is flushed to its bucket), and stopping resumes it, so
/// wall-clock time is attributed to exactly one bucket at a time.
#[derive(Debug)]
pub struct Timer {
    stats: Arc<Stats>,
    frames: Vec<(Bucket, Instant)>,
}

impl Timer {
    pub fn new(stats: Arc<Stats>) -> Self {
        Self { stats, frames: Vec::new() }
    }

    pub fn start(&mut self, bucket: Bucket) {
        let now = Instant::now();
        if let Some((outer, started)) = self.frames.last_mut() {
            self.stats.add_time(*outer, now - *started);
            *started = now;
        }
        self.frames.push((bucket, now));
    }

    pub fn stop(&mut self) {
        let now = Instant::now();
        let (bucket, started) = self.frames.pop().expect("timer frame to stop");
        self.stats.add_time(bucket, now - started);
        if let Some((_, resumed)) = self.frames.last_mut() {
            *resumed = now;
        }
    }
}
