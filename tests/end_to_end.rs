//! End-to-end emitter tests against a stub HTTP server.
//!
//! The stub binds an ephemeral port, captures each request (method, headers,
//! body), and answers with a fixed status code. Covers the three response
//! classes the emitters see: 200, non-200, and connection refused.

use std::{
    io::Read,
    net::TcpListener,
    sync::mpsc,
    thread,
    time::Duration,
};

use chrono::DateTime;
use tiny_http::{Response, Server};

use sensor_loadgen::emitter::monitor::MonitorEmitter;
use sensor_loadgen::emitter::reading::SensorKind;
use sensor_loadgen::emitter::sensor::SensorEmitter;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct CapturedRequest {
    method: String,
    content_type: Option<String>,
    body: String,
}

/// Starts a stub server answering `expected` requests with `status`.
/// Returns the bound port and a channel of captured requests.
fn spawn_stub(status: u16, expected: usize) -> (u16, mpsc::Receiver<CapturedRequest>) {
    let server = Server::http("127.0.0.1:0").expect("failed to bind stub server");
    let port = server.server_addr().to_ip().expect("stub must bind a TCP port").port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for _ in 0..expected {
            let mut request = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };

            let method = request.method().to_string();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);

            let _ = request.respond(Response::from_string("").with_status_code(status));
            let _ = tx.send(CapturedRequest {
                method,
                content_type,
                body,
            });
        }
    });

    (port, rx)
}

/// A port that nothing is listening on.
fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[test]
fn one_cycle_posts_one_wellformed_json_reading() {
    let (port, rx) = spawn_stub(200, 1);
    let emitter = SensorEmitter::new(
        "test-vu-0",
        &format!("http://127.0.0.1:{}", port),
        SensorKind::Temperatura,
        TEST_TIMEOUT,
    )
    .unwrap();

    let outcome = emitter.emit_cycle();
    assert!(outcome.passed);
    assert_eq!(outcome.status, Some(200));

    let captured = rx.recv_timeout(TEST_TIMEOUT).expect("stub saw no request");
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));

    let value: serde_json::Value = serde_json::from_str(&captured.body).expect("body must be JSON");
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    assert_eq!(obj["sensorType"], "temperatura");

    let measurement = obj["measurement"].as_f64().unwrap();
    assert!((68.0..88.0).contains(&measurement));

    let timestamp = obj["timestamp"].as_str().unwrap();
    DateTime::parse_from_rfc3339(timestamp).expect("timestamp must be ISO-8601");

    // Exactly one POST for one cycle
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn sensor_emitter_treats_non_200_as_failure() {
    let (port, rx) = spawn_stub(500, 1);
    let emitter = SensorEmitter::new(
        "test-vu-1",
        &format!("http://127.0.0.1:{}", port),
        SensorKind::Temperatura,
        TEST_TIMEOUT,
    )
    .unwrap();

    let outcome = emitter.emit_cycle();
    assert!(!outcome.passed);
    assert_eq!(outcome.status, Some(500));

    // The request itself still went out
    assert!(rx.recv_timeout(TEST_TIMEOUT).is_ok());
}

#[test]
fn monitor_check_passes_on_200() {
    let (port, _rx) = spawn_stub(200, 1);
    let emitter = MonitorEmitter::new(
        "test-mon-0",
        &format!("http://127.0.0.1:{}", port),
        SensorKind::Temperatura,
        TEST_TIMEOUT,
    )
    .unwrap();

    let outcome = emitter.emit_cycle();
    assert!(outcome.passed);
    assert_eq!(outcome.status, Some(200));
}

#[test]
fn monitor_check_fails_on_500() {
    let (port, _rx) = spawn_stub(500, 1);
    let emitter = MonitorEmitter::new(
        "test-mon-1",
        &format!("http://127.0.0.1:{}", port),
        SensorKind::Temperatura,
        TEST_TIMEOUT,
    )
    .unwrap();

    let outcome = emitter.emit_cycle();
    assert!(!outcome.passed);
    assert_eq!(outcome.status, Some(500));
}

#[test]
fn connection_refused_is_an_ordinary_failure() {
    let url = format!("http://127.0.0.1:{}", refused_port());

    let sensor =
        SensorEmitter::new("test-vu-2", &url, SensorKind::Temperatura, TEST_TIMEOUT).unwrap();
    let outcome = sensor.emit_cycle();
    assert!(!outcome.passed);
    assert_eq!(outcome.status, None);

    let monitor =
        MonitorEmitter::new("test-mon-2", &url, SensorKind::Temperatura, TEST_TIMEOUT).unwrap();
    let outcome = monitor.emit_cycle();
    assert!(!outcome.passed);
    assert_eq!(outcome.status, None);
}
