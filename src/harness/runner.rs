//! runner.rs
//! Scenario orchestration: spawns the collector and one thread per VU, lets
//! them run for the configured duration, then flips the shutdown flag, joins
//! everything, and produces the end-of-run summary.

use std::{
    fs::create_dir_all,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use crossbeam::channel::{bounded, Receiver};
use log::{error, info};

use crate::emitter::{
    monitor::MonitorEmitter, reading::SensorKind, sensor::SensorEmitter, Emitter,
};
use crate::utils::{
    export::{export_summary_csv, print_summary},
    metrics::{CycleRecorder, CycleResult, Metrics, SharedMetrics, StatusTally},
};
use crate::harness::vu::VirtualUser;

pub const BROKER_URL: &str = "http://localhost:5559";
pub const MONITOR_URL: &str = "http://localhost:5555";

pub const DEFAULT_BROKER_VUS: usize = 30;
pub const DEFAULT_MONITOR_VUS: usize = 10;
pub const DEFAULT_DURATION_SECS: u64 = 30;
pub const DEFAULT_PACING_SECS: u64 = 1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// Collector channel size: 2048 accommodates a burst from every VU finishing a
// cycle in the same tick with plenty of headroom.
const RESULT_CHANNEL_CAPACITY: usize = 2_048;

/// Which emitter flavor a scenario runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Sensor emitters posting to the broker, logging per cycle.
    Broker,
    /// Monitor emitters posting to the monitor, silent 200 check.
    Monitor,
}

/// Full configuration for one load run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub kind: ScenarioKind,
    pub target_url: String,
    pub vus: usize,
    pub duration: Duration,
    pub pacing: Duration,
    pub sensor_kind: SensorKind,
    pub request_timeout: Duration,
}

impl Scenario {
    /// Broker scenario defaults: 30 VUs posting to port 5559 for 30 s.
    pub fn broker() -> Self {
        Self {
            name: "broker".to_string(),
            kind: ScenarioKind::Broker,
            target_url: BROKER_URL.to_string(),
            vus: DEFAULT_BROKER_VUS,
            duration: Duration::from_secs(DEFAULT_DURATION_SECS),
            pacing: Duration::from_secs(DEFAULT_PACING_SECS),
            sensor_kind: SensorKind::Temperatura,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Monitor scenario defaults: 10 VUs posting to port 5555 for 30 s.
    pub fn monitor() -> Self {
        Self {
            name: "monitor".to_string(),
            kind: ScenarioKind::Monitor,
            target_url: MONITOR_URL.to_string(),
            vus: DEFAULT_MONITOR_VUS,
            ..Self::broker()
        }
    }
}

/// Runs one scenario to completion and returns its aggregated metrics.
///
/// Spawn order: CSV exporter → collector → VU threads. Shutdown order: clear
/// running flag → join VUs → drop last sender (collector sees EOF) → join
/// collector and exporter → summary.
pub fn run_scenario(scenario: &Scenario) -> SharedMetrics {
    info!(
        "[{}] starting: {} VUs, duration {:?}, target {}",
        scenario.name, scenario.vus, scenario.duration, scenario.target_url
    );

    let metrics: SharedMetrics = Arc::new(Mutex::new(Metrics::default()));
    {
        let mut m = metrics.lock().unwrap_or_else(|e| e.into_inner());
        m.vus = scenario.vus;
    }

    let tally = Arc::new(StatusTally::new());
    let recorder = Arc::new(CycleRecorder::new());
    let running = Arc::new(AtomicBool::new(true));

    create_dir_all("data/logs").ok();
    let exporter_handle = recorder.start_exporter(
        format!("data/logs/cycles_{}.csv", scenario.name),
        running.clone(),
    );

    let (tx, rx) = bounded::<CycleResult>(RESULT_CHANNEL_CAPACITY);
    let collector_handle = spawn_collector(rx, metrics.clone());

    let mut vu_handles = Vec::with_capacity(scenario.vus);
    for i in 0..scenario.vus {
        let emitter = match build_emitter(scenario, i as u32) {
            Ok(e) => e,
            Err(e) => {
                error!("[{}] failed to build HTTP client for VU {}: {}", scenario.name, i, e);
                continue;
            }
        };

        let vu = VirtualUser {
            id: i as u32,
            emitter,
            pacing: scenario.pacing,
            running: running.clone(),
            tx: tx.clone(),
            recorder: recorder.clone(),
            tally: tally.clone(),
        };

        vu_handles.push(thread::spawn(move || vu.run()));
    }

    info!(
        "[{}] running {} VUs for {} seconds...",
        scenario.name,
        vu_handles.len(),
        scenario.duration.as_secs()
    );
    thread::sleep(scenario.duration);

    info!("[{}] time's up, stopping VUs", scenario.name);
    running.store(false, Ordering::Release);

    for handle in vu_handles {
        let _ = handle.join();
    }

    // Last sender drops here; collector's recv() returns Err and it exits
    drop(tx);
    let _ = collector_handle.join();
    let _ = exporter_handle.join();

    print_summary(&scenario.name, &metrics, &tally);
    export_summary_csv(&scenario.name, &metrics, &tally);

    metrics
}

/// Drains VU results into the shared metrics until every sender is gone.
fn spawn_collector(rx: Receiver<CycleResult>, metrics: SharedMetrics) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(result) = rx.recv() {
            let mut m = metrics.lock().unwrap_or_else(|e| e.into_inner());
            m.record_cycle(&result.outcome);
        }
    })
}

fn build_emitter(scenario: &Scenario, vu_id: u32) -> Result<Emitter, reqwest::Error> {
    let name = format!("{}-vu-{}", scenario.name, vu_id);

    match scenario.kind {
        ScenarioKind::Broker => Ok(Emitter::Sensor(SensorEmitter::new(
            &name,
            &scenario.target_url,
            scenario.sensor_kind,
            scenario.request_timeout,
        )?)),
        ScenarioKind::Monitor => Ok(Emitter::Monitor(MonitorEmitter::new(
            &name,
            &scenario.target_url,
            scenario.sensor_kind,
            scenario.request_timeout,
        )?)),
    }
}
