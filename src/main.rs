//! # Sensor Load Generator Entry Point
//! Simulates fleets of IoT sensors posting randomized readings to the
//! broker and monitor endpoints of the water-quality monitoring system.
//!
//! ## Scenarios
//! - **Broker:** 30 VUs → http://localhost:5559, success/failure log line per cycle.
//! - **Monitor:** 10 VUs → http://localhost:5555, silent "status is 200" check.
//! - **Both:** runs the two scenarios concurrently, one runner thread each.
//!
//! ## Concurrency
//! - One thread per VU, 1 s pacing between emission cycles.
//! - Atomic running flag cleared after the run duration (graceful shutdown).
//! - Lock-free cycle log → `data/logs/cycles_<scenario>.csv`.
//!
//! ## Outputs
//! - Console summary per scenario (checks, request counts, latency).
//! - `data/run_results.csv` — one appended row per run.

use std::{
    io::{stdin, stdout, Write},
    thread,
    time::Duration,
};

use log::info;

use sensor_loadgen::harness::runner::{run_scenario, Scenario, DEFAULT_DURATION_SECS};

// Main entry point for the load generator.
fn main() {
    env_logger::init();
    info!("=== SENSOR LOAD GENERATOR START ===");

    loop {
        let choice = prompt_menu();
        match choice.as_str() {
            "1" | "" => {
                let scenario = configure(Scenario::broker());
                run_scenario(&scenario);
                println!("\n Run completed. Returning to menu...\n");
                thread::sleep(Duration::from_secs(2));
            }
            "2" => {
                let scenario = configure(Scenario::monitor());
                run_scenario(&scenario);
                println!("\n Run completed. Returning to menu...\n");
                thread::sleep(Duration::from_secs(2));
            }
            "3" => {
                println!("Running broker and monitor scenarios concurrently.");
                run_both();
                println!("\n Runs completed. Returning to menu...\n");
                thread::sleep(Duration::from_secs(2));
            }
            "4" => {
                println!("Exiting. Goodbye!");
                info!("=== SENSOR LOAD GENERATOR FINISHED ===");
                return;
            }
            other => {
                println!("Unrecognized option '{}', please try again.", other);
            }
        }
    }
}

// interactive menu for scenario selection (threaded only)
fn prompt_menu() -> String {
    println!("\n┌─────────────────────────────────────────────┐");
    println!("│     SELECT LOAD SCENARIO                │");
    println!("├─────────────────────────────────────────────┤");
    println!("│  1) BROKER  (sensors → port 5559)      │");
    println!("│  2) MONITOR (checks  → port 5555)      │");
    println!("│  3) BOTH concurrently                  │");
    println!("│  4) Exit                               │");
    println!("└─────────────────────────────────────────────┘");
    print!("Select [1/2/3/4] (default: 1): ");
    let _ = stdout().flush();

    let mut input = String::new();
    let _ = stdin().read_line(&mut input);
    input.trim().to_string()
}

/// Applies interactive VU count / duration overrides to a scenario's defaults.
fn configure(mut scenario: Scenario) -> Scenario {
    scenario.vus = prompt_vus(scenario.vus);
    scenario.duration = Duration::from_secs(prompt_duration_secs());
    scenario
}

fn prompt_vus(default: usize) -> usize {
    print!("Enter number of virtual users [default: {}]: ", default);
    let _ = stdout().flush();
    let mut input = String::new();
    let _ = stdin().read_line(&mut input);
    input.trim().parse::<usize>().unwrap_or(default)
}

fn prompt_duration_secs() -> u64 {
    print!("Enter run duration in seconds [default: {}]: ", DEFAULT_DURATION_SECS);
    let _ = stdout().flush();
    let mut input = String::new();
    let _ = stdin().read_line(&mut input);
    input.trim().parse::<u64>().unwrap_or(DEFAULT_DURATION_SECS)
}

/// Runs broker and monitor scenarios side by side, one runner thread each.
/// The scenarios share nothing; each gets its own VUs, metrics, and summary.
fn run_both() {
    let broker = Scenario::broker();
    let monitor = Scenario::monitor();

    let broker_handle = thread::spawn(move || run_scenario(&broker));
    let monitor_handle = thread::spawn(move || run_scenario(&monitor));

    let _ = broker_handle.join();
    let _ = monitor_handle.join();
}
