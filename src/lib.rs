//! IoT sensor load generator.
//!
//! Simulates fleets of sensors posting randomized readings to the broker and
//! monitor HTTP endpoints of the water-quality monitoring system. Each virtual
//! user (VU) runs its own emission loop: build one reading, POST it as JSON,
//! check the response status, sleep one second, repeat.
//!
//! ## Scenarios
//! - **Broker:** 30 VUs → `http://localhost:5559`, per-cycle success/failure log lines.
//! - **Monitor:** 10 VUs → `http://localhost:5555`, "status is 200" check feeding pass/fail stats.
//!
//! ## Concurrency
//! - One thread per VU; shared `AtomicBool` running flag cleared after the run duration.
//! - VUs push per-cycle results to a collector over a bounded crossbeam channel.
//! - Lock-free cycle recorder (bounded queue) → background CSV export under `data/logs/`.
//!
//! An async variant of the broker scenario lives in the `async_main` binary
//! (tokio tasks instead of threads, same cycle semantics).

pub mod emitter;
pub mod harness;
pub mod utils;
