//! Metrics collection and cycle recording for load runs.
//!
//! Two independent paths:
//! - **CycleRecorder:** Lock-free queue (16K capacity) → background CSV export of every cycle.
//! - **Metrics:** Shared mutex buffer aggregated by the collector thread (bounded to 1000 points per series).
//!
//! A third, contention-free path tallies HTTP status codes: VUs bump atomic
//! per-code counters in a DashMap without touching the metrics mutex.

use std::{
    collections::VecDeque,
    fs::File,
    io::BufWriter,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_queue::ArrayQueue;
use dashmap::DashMap;
use log::error;
use serde::Serialize;

use crate::emitter::CycleOutcome;

/// Per-cycle result sent from a VU to the collector.
#[derive(Debug, Clone, Copy)]
pub struct CycleResult {
    pub vu: u32,
    pub seq: u64,
    pub outcome: CycleOutcome,
}

/// One row of the per-cycle CSV log.
/// `status` serializes to an empty field for transport-level failures.
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    pub vu: u32,
    pub seq: u64,
    pub ts_ns: u64,
    pub status: Option<u16>,
    pub passed: bool,
    pub latency_us: u64,
}

const CYCLE_QUEUE_CAPACITY: usize = 16_384;

/// Non-blocking cycle recorder with background CSV export.
///
/// Timestamps via `now_ns()` (elapsed nanos from recorder creation).
/// `record()` appends to a lock-free queue and returns immediately.
/// `start_exporter()` spawns a thread draining the queue into a CSV file;
/// it exits once the running flag clears and the queue is empty.
///
/// Capacity: 16K cycles; drops silently if the queue is full so a slow disk
/// never blocks a VU.
pub struct CycleRecorder {
    queue: Arc<ArrayQueue<CycleRecord>>,
    run_start: Instant,
}

impl CycleRecorder {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(CYCLE_QUEUE_CAPACITY)),
            run_start: Instant::now(),
        }
    }

    /// Appends a record to the queue (lock-free). Silently drops if full.
    #[inline]
    pub fn record(&self, record: CycleRecord) {
        let _ = self.queue.push(record);
    }

    /// Nanosecond timestamp since recorder creation.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.run_start.elapsed().as_nanos() as u64
    }

    /// Spawns a background thread draining the queue into a CSV file.
    /// Runs until `running` clears and the queue is drained.
    pub fn start_exporter(
        &self,
        output_csv: String,
        running: Arc<AtomicBool>,
    ) -> thread::JoinHandle<()> {
        let queue = self.queue.clone();

        thread::spawn(move || {
            let file = match File::create(&output_csv) {
                Ok(f) => f,
                Err(e) => {
                    error!("Failed to create cycle CSV {}: {}", output_csv, e);
                    return;
                }
            };

            let mut writer = csv::Writer::from_writer(BufWriter::new(file));

            loop {
                match queue.pop() {
                    Some(record) => {
                        if let Err(e) = writer.serialize(&record) {
                            error!("Failed to write cycle CSV row: {}", e);
                        }
                    }
                    None => {
                        if !running.load(Ordering::Relaxed) && queue.is_empty() {
                            break;
                        }
                        thread::sleep(Duration::from_millis(10));
                    }
                }
            }

            let _ = writer.flush();
        })
    }
}

impl Clone for CycleRecorder {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            run_start: self.run_start,
        }
    }
}

impl Default for CycleRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Contention-free HTTP status tally: per-code atomic counters in a DashMap,
/// plus a global counter for transport-level failures. VUs bump these on the
/// hot path without taking the metrics mutex.
#[derive(Default)]
pub struct StatusTally {
    counts: DashMap<u16, AtomicU64>,
    transport_errors: AtomicU64,
}

impl StatusTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self, status: Option<u16>) {
        match status {
            Some(code) => {
                self.counts
                    .entry(code)
                    .or_insert_with(|| AtomicU64::new(0))
                    .fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.transport_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Snapshot sorted by status code, plus the transport failure count.
    pub fn snapshot(&self) -> (Vec<(u16, u64)>, u64) {
        let mut codes: Vec<(u16, u64)> = self
            .counts
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect();
        codes.sort_by_key(|(code, _)| *code);

        (codes, self.transport_errors.load(Ordering::Relaxed))
    }
}

/// Aggregated run metrics, updated by the collector thread.
/// Bounded to the 1000 most recent points per series.
#[derive(Default, Clone)]
pub struct Metrics {
    pub total_cycles: u64,
    pub checks_passed: u64,
    pub checks_failed: u64,

    /// Request round-trip times (last 1000 cycles, microseconds)
    pub latency_us: VecDeque<u64>,
    /// Measurements carried by the readings (last 1000 cycles)
    pub measurements: VecDeque<f64>,

    pub vus: usize,
}

impl Metrics {
    /// Records one cycle outcome into the aggregates.
    pub fn record_cycle(&mut self, outcome: &CycleOutcome) {
        self.total_cycles += 1;
        if outcome.passed {
            self.checks_passed += 1;
        } else {
            self.checks_failed += 1;
        }

        push_capped_u64(&mut self.latency_us, outcome.latency.as_micros() as u64);
        push_capped(&mut self.measurements, outcome.measurement);
    }

    /// Fraction of cycles whose "status is 200" check passed.
    pub fn pass_rate(&self) -> f64 {
        if self.total_cycles == 0 {
            return 0.0;
        }
        self.checks_passed as f64 / self.total_cycles as f64
    }
}

pub type SharedMetrics = Arc<Mutex<Metrics>>;

pub const MAX_POINTS: usize = 1_000;

/// Appends value to metrics buffer; removes oldest if at capacity (FIFO).
#[inline]
pub fn push_capped(buf: &mut VecDeque<f64>, val: f64) {
    if buf.len() >= MAX_POINTS {
        buf.pop_front();
    }
    buf.push_back(val);
}

/// Appends u64 value to metrics buffer; removes oldest if at capacity.
#[inline]
pub fn push_capped_u64(buf: &mut VecDeque<u64>, val: u64) {
    if buf.len() >= MAX_POINTS {
        buf.pop_front();
    }
    buf.push_back(val);
}

/// Statistics summary for a dataset.
#[derive(Debug, Clone)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

/// Computes min, max, mean for float buffer.
pub fn calculate_stats(data: &VecDeque<f64>) -> Option<Stats> {
    if data.is_empty() {
        return None;
    }

    let count = data.len();
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = data.iter().sum::<f64>() / count as f64;

    Some(Stats { min, max, mean, count })
}

/// Computes min, max, mean for u64 buffer (cast to f64).
pub fn calculate_stats_u64(data: &VecDeque<u64>) -> Option<Stats> {
    if data.is_empty() {
        return None;
    }

    let count = data.len();
    let min = data.iter().map(|&x| x as f64).fold(f64::INFINITY, f64::min);
    let max = data.iter().map(|&x| x as f64).fold(f64::NEG_INFINITY, f64::max);
    let mean = data.iter().map(|&x| x as f64).sum::<f64>() / count as f64;

    Some(Stats { min, max, mean, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(passed: bool, status: Option<u16>) -> CycleOutcome {
        CycleOutcome {
            status,
            passed,
            latency: Duration::from_millis(3),
            measurement: 70.5,
        }
    }

    #[test]
    fn push_capped_evicts_oldest() {
        let mut buf = VecDeque::new();
        for i in 0..(MAX_POINTS + 10) {
            push_capped(&mut buf, i as f64);
        }
        assert_eq!(buf.len(), MAX_POINTS);
        assert_eq!(buf.front().copied(), Some(10.0));
    }

    #[test]
    fn stats_over_known_values() {
        let buf: VecDeque<f64> = vec![1.0, 2.0, 3.0, 4.0].into();
        let stats = calculate_stats(&buf).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.count, 4);

        assert!(calculate_stats(&VecDeque::new()).is_none());
    }

    #[test]
    fn metrics_counts_passes_and_failures() {
        let mut m = Metrics::default();
        m.record_cycle(&outcome(true, Some(200)));
        m.record_cycle(&outcome(true, Some(200)));
        m.record_cycle(&outcome(false, Some(500)));
        m.record_cycle(&outcome(false, None));

        assert_eq!(m.total_cycles, 4);
        assert_eq!(m.checks_passed, 2);
        assert_eq!(m.checks_failed, 2);
        assert_eq!(m.pass_rate(), 0.5);
        assert_eq!(m.latency_us.len(), 4);
    }

    #[test]
    fn status_tally_separates_codes_and_transport_errors() {
        let tally = StatusTally::new();
        tally.bump(Some(200));
        tally.bump(Some(200));
        tally.bump(Some(500));
        tally.bump(None);

        let (codes, transport) = tally.snapshot();
        assert_eq!(codes, vec![(200, 2), (500, 1)]);
        assert_eq!(transport, 1);
    }
}
