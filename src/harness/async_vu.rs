// //! Asynchronous virtual user.
// //! Task-based variant of the threaded VU loop, enabling direct comparison
// //! between tokio scheduling and one-thread-per-VU under identical pacing
// //! and target endpoints.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};

use crate::emitter::reading::{SensorKind, SensorReading};
use crate::emitter::CycleOutcome;
use crate::utils::metrics::{CycleRecord, CycleRecorder, CycleResult, StatusTally};

/// Async emission loop with sensor-emitter semantics: per-cycle success and
/// failure log lines, identical failure handling to the threaded VU.
#[allow(clippy::too_many_arguments)]
pub async fn async_virtual_user(
    id: u32,
    client: reqwest::Client,
    target_url: String,
    kind: SensorKind,
    pacing: Duration,
    running: Arc<AtomicBool>,
    tx: mpsc::Sender<CycleResult>,
    recorder: Arc<CycleRecorder>,
    tally: Arc<StatusTally>,
) {
    let mut interval = time::interval(pacing);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seq: u64 = 1;

    while running.load(Ordering::Relaxed) {
        interval.tick().await;

        let reading = SensorReading::generate(kind);
        let measurement = reading.measurement;

        let started = Instant::now();
        let status = match client.post(&target_url).json(&reading).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                error!("[VU {}] failed to send sensor data: {}", id, e);
                None
            }
        };
        let latency = started.elapsed();

        if let Some(code) = status {
            if code == 200 {
                info!("[VU {}] sensor sent data successfully", id);
            } else {
                error!("[VU {}] failed to send sensor data, status code: {}", id, code);
            }
        }

        let outcome = CycleOutcome {
            status,
            passed: status == Some(200),
            latency,
            measurement,
        };

        tally.bump(status);
        recorder.record(CycleRecord {
            vu: id,
            seq,
            ts_ns: recorder.now_ns(),
            status,
            passed: outcome.passed,
            latency_us: latency.as_micros() as u64,
        });

        // Mirror the threaded VU: never block the loop on a full channel
        let result = CycleResult { vu: id, seq, outcome };
        if tx.try_send(result).is_err() {
            debug!("[VU {}] result send failed", id);
        }

        seq += 1;
    }
}
