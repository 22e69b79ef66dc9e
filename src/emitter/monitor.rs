//! monitor.rs
//! Monitor-style emitter: same wire behavior as the sensor emitter, but the
//! 200 check is evaluated silently and fed into the run's pass/fail stats
//! instead of producing a log line per cycle.

use std::time::{Duration, Instant};

use log::debug;

use crate::emitter::reading::{SensorKind, SensorReading};
use crate::emitter::CycleOutcome;

pub struct MonitorEmitter {
    pub name: String,
    pub target_url: String,
    pub kind: SensorKind,
    client: reqwest::blocking::Client,
}

impl MonitorEmitter {
    pub fn new(
        name: &str,
        target_url: &str,
        kind: SensorKind,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            name: name.to_string(),
            target_url: target_url.to_string(),
            kind,
            client,
        })
    }

    /// One emission cycle. The check result lands in the outcome; control
    /// flow is identical whether it passes or fails.
    pub fn emit_cycle(&self) -> CycleOutcome {
        let reading = SensorReading::generate(self.kind);
        let measurement = reading.measurement;

        let started = Instant::now();
        let status = match self.client.post(&self.target_url).json(&reading).send() {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                debug!("[{}] send failed: {}", self.name, e);
                None
            }
        };
        let latency = started.elapsed();

        CycleOutcome {
            status,
            passed: status == Some(200),
            latency,
            measurement,
        }
    }
}
