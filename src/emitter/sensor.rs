//! sensor.rs
//! Sensor-style emitter: POSTs one reading to the broker per cycle and logs
//! the outcome. Mirrors the original sensor processes, which printed
//! "sent data successfully" or the returned status code on every send.

use std::time::{Duration, Instant};

use log::{error, info};

use crate::emitter::reading::{SensorKind, SensorReading};
use crate::emitter::CycleOutcome;

pub struct SensorEmitter {
    pub name: String,
    pub target_url: String,
    pub kind: SensorKind,
    client: reqwest::blocking::Client,
}

impl SensorEmitter {
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

    /// One emission cycle: build, serialize, POST, inspect status, log.
    /// A failed cycle is reported in the outcome; it never aborts the run.
    pub fn emit_cycle(&self) -> CycleOutcome {
        let reading = SensorReading::generate(self.kind);
        let measurement = reading.measurement;

        let started = Instant::now();
        // .json() serializes the body and sets Content-Type: application/json
        let status = match self.client.post(&self.target_url).json(&reading).send() {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                error!("[{}] failed to send sensor data: {}", self.name, e);
                None
            }
        };
        let latency = started.elapsed();

        if let Some(code) = status {
            if code == 200 {
                info!("[{}] sensor sent data successfully", self.name);
            } else {
                error!(
                    "[{}] failed to send sensor data, status code: {}",
                    self.name, code
                );
            }
        }

        CycleOutcome {
            status,
            passed: status == Some(200),
            latency,
            measurement,
        }
    }
}
