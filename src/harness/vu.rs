//! vu.rs
//! One virtual user: repeatedly runs an emission cycle to completion, then
//! sleeps the pacing interval, until the run's shutdown flag clears.
//! - SpinSleeper keeps the 1 s pacing consistent across VU threads
//! - Results flow out non-blocking: lock-free recorder, atomic tally, bounded channel

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use crossbeam::channel::Sender;
use log::debug;
use spin_sleep::{SpinSleeper, SpinStrategy};

use crate::emitter::Emitter;
use crate::utils::metrics::{CycleRecord, CycleRecorder, CycleResult, StatusTally};

pub struct VirtualUser {
    pub id: u32,
    pub emitter: Emitter,
    pub pacing: Duration,
    pub running: Arc<AtomicBool>,
    pub tx: Sender<CycleResult>,
    pub recorder: Arc<CycleRecorder>,
    pub tally: Arc<StatusTally>,
}

impl VirtualUser {
    /// Main VU loop: cycle → report → pace. A failed cycle is reported like
    /// any other; nothing here aborts the run.
    pub fn run(&self) {
        let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);
        let mut seq: u64 = 1;

        while self.running.load(Ordering::Acquire) {
            let outcome = self.emitter.emit_cycle();

            self.tally.bump(outcome.status);
            self.recorder.record(CycleRecord {
                vu: self.id,
                seq,
                ts_ns: self.recorder.now_ns(),
                status: outcome.status,
                passed: outcome.passed,
                latency_us: outcome.latency.as_micros() as u64,
            });

            // Non-blocking send to the collector; a full channel drops the
            // sample rather than stalling the emission loop
            let result = CycleResult {
                vu: self.id,
                seq,
                outcome,
            };
            if let Err(e) = self.tx.try_send(result) {
                debug!("[VU {}] result send failed: {:?}", self.id, e);
                if e.is_disconnected() {
                    break;
                }
            }

            seq += 1;
            sleeper.sleep(self.pacing);
        }

        debug!("[VU {}] stopped.", self.id);
    }
}
