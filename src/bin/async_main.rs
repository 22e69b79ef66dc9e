//! Async load run: task-based alternative to the threaded harness (async_main binary).
//!
//! Runs the broker scenario on tokio tasks (one per VU) with the async HTTP
//! client → bridges results to the sync collector via a blocking thread.
//! 30-second baseline run. For comparison with the threaded binary.

use std::{
    fs::create_dir_all,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};

use log::{error, info};
use tokio::sync::mpsc;

use sensor_loadgen::harness::async_vu::async_virtual_user;
use sensor_loadgen::harness::runner::Scenario;
use sensor_loadgen::utils::export::{export_summary_csv, print_summary};
use sensor_loadgen::utils::metrics::{
    CycleRecorder, CycleResult, Metrics, SharedMetrics, StatusTally,
};

/// Async harness entry point: tokio multi-threaded runtime (4 workers)
///
/// **Execution:**
/// 1. Initialize runtime + metrics/tally/recorder
/// 2. Spawn one async VU task per virtual user (shared reqwest client)
/// 3. Spawn blocking collector thread (drains results into shared metrics)
/// 4. Sleep for the run duration
/// 5. Graceful shutdown: clear running flag → join tasks → flush CSV → summary
///
/// **Output:**
/// - data/logs/cycles_broker_async.csv — every cycle with nanosecond timestamps
/// - data/run_results.csv — appended one-row summary
#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    env_logger::init();
    println!("=== ASYNC LOAD RUN START ===");

    let mut scenario = Scenario::broker();
    scenario.name = "broker_async".to_string();

    let running = Arc::new(AtomicBool::new(true));
    let metrics: SharedMetrics = Arc::new(Mutex::new(Metrics::default()));
    {
        let mut m = metrics.lock().unwrap_or_else(|e| e.into_inner());
        m.vus = scenario.vus;
    }
    let tally = Arc::new(StatusTally::new());

    let recorder = Arc::new(CycleRecorder::new());
    create_dir_all("data/logs").ok();
    let exporter_handle = recorder.start_exporter(
        format!("data/logs/cycles_{}.csv", scenario.name),
        running.clone(),
    );

    // One shared client for all tasks; connection pooling is per-host anyway
    let client = match reqwest::Client::builder()
        .timeout(scenario.request_timeout)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    // Channel: async VUs → blocking collector (1024 buffered results)
    let (tx, mut rx) = mpsc::channel::<CycleResult>(1024);

    let mut vu_tasks = Vec::with_capacity(scenario.vus);
    for i in 0..scenario.vus {
        vu_tasks.push(tokio::spawn(async_virtual_user(
            i as u32,
            client.clone(),
            scenario.target_url.clone(),
            scenario.sensor_kind,
            scenario.pacing,
            running.clone(),
            tx.clone(),
            recorder.clone(),
            tally.clone(),
        )));
    }
    drop(tx);

    // Blocking collector thread: bridges async VUs to the sync metrics path
    let metrics_bridge = metrics.clone();
    let collector_handle = thread::spawn(move || {
        while let Some(result) = rx.blocking_recv() {
            let mut m = metrics_bridge.lock().unwrap_or_else(|e| e.into_inner());
            m.record_cycle(&result.outcome);
        }
    });

    info!(
        "[{}] running {} async VUs for {} seconds...",
        scenario.name,
        scenario.vus,
        scenario.duration.as_secs()
    );
    tokio::time::sleep(scenario.duration).await;

    println!("Stopping async load run...");
    running.store(false, Ordering::Relaxed);

    for task in vu_tasks {
        let _ = task.await;
    }
    // All senders are gone once the tasks finish; collector drains and exits
    let _ = collector_handle.join();
    let _ = exporter_handle.join();

    print_summary(&scenario.name, &metrics, &tally);
    export_summary_csv(&scenario.name, &metrics, &tally);

    println!("=== ASYNC LOAD RUN FINISHED ===");
}
