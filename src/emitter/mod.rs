//! Emitters: one emission cycle = build reading → POST JSON → check status.
//!
//! Two flavors with identical wire behavior:
//! - [`sensor::SensorEmitter`] logs a success/failure line per cycle.
//! - [`monitor::MonitorEmitter`] evaluates a silent "status is 200" check.
//!
//! Transport errors and non-200 statuses are one failure class: logged or
//! counted, never retried, never escalated.

pub mod monitor;
pub mod reading;
pub mod sensor;

use std::time::Duration;

use monitor::MonitorEmitter;
use sensor::SensorEmitter;

/// Result of one emission cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
    /// HTTP status code, or `None` for a transport-level failure.
    pub status: Option<u16>,
    /// The "status is 200" check.
    pub passed: bool,
    /// Request round-trip time.
    pub latency: Duration,
    /// Measurement carried by the reading (kept for run statistics).
    pub measurement: f64,
}

/// Emitter flavor selected by the scenario. Both run the same cycle; they
/// differ only in target endpoint and in how a failure is surfaced.
pub enum Emitter {
    Sensor(SensorEmitter),
    Monitor(MonitorEmitter),
}

impl Emitter {
    pub fn emit_cycle(&self) -> CycleOutcome {
        match self {
            Emitter::Sensor(e) => e.emit_cycle(),
            Emitter::Monitor(e) => e.emit_cycle(),
        }
    }
}
