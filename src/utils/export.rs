//! End-of-run reporting: console summary plus an appended one-row-per-run CSV.
//!
//! The summary mirrors what the external load tool used to print: check pass
//! rate, request counts, status code breakdown, and latency min/avg/max.

use std::{
    fs::{create_dir_all, OpenOptions},
    io::Write,
    path::Path,
    sync::Arc,
};

use log::{error, info};

use crate::utils::metrics::{calculate_stats, calculate_stats_u64, SharedMetrics, StatusTally};

/// Prints the k6-style end-of-run summary for one scenario.
pub fn print_summary(scenario_name: &str, metrics: &SharedMetrics, tally: &Arc<StatusTally>) {
    let m = match metrics.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let (codes, transport_errors) = tally.snapshot();

    println!("\n=== {} SUMMARY ===", scenario_name.to_uppercase());
    println!(
        "  checks..............: {:.2}% ({} passed, {} failed)",
        m.pass_rate() * 100.0,
        m.checks_passed,
        m.checks_failed
    );
    println!("  http_reqs...........: {}", m.total_cycles);
    println!("  vus.................: {}", m.vus);

    for (code, count) in &codes {
        println!("  status {}..........: {}", code, count);
    }
    if transport_errors > 0 {
        println!("  transport errors....: {}", transport_errors);
    }

    if let Some(latency) = calculate_stats_u64(&m.latency_us) {
        println!(
            "  http_req_duration...: min={:.2}ms avg={:.2}ms max={:.2}ms (n={})",
            latency.min / 1_000.0,
            latency.mean / 1_000.0,
            latency.max / 1_000.0,
            latency.count
        );
    }

    if let Some(measurement) = calculate_stats(&m.measurements) {
        println!(
            "  measurement.........: min={:.2} avg={:.2} max={:.2}",
            measurement.min, measurement.mean, measurement.max
        );
    }

    info!(
        "[{}] run complete: {} cycles, {:.2}% passed",
        scenario_name,
        m.total_cycles,
        m.pass_rate() * 100.0
    );
}

/// Appends aggregated metrics for one run to `data/run_results.csv`.
/// Creates the file with a header on first write.
pub fn export_summary_csv(scenario_name: &str, metrics: &SharedMetrics, tally: &Arc<StatusTally>) {
    let _ = create_dir_all("data");

    let csv_path = "data/run_results.csv";
    let file_exists = Path::new(csv_path).exists();

    // Lock metrics; recover from poisoned state (shouldn't happen but safe)
    let m = match metrics.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let (_, transport_errors) = tally.snapshot();

    let avg_latency_us = if m.latency_us.is_empty() {
        0
    } else {
        m.latency_us.iter().sum::<u64>() / m.latency_us.len() as u64
    };
    let max_latency_us = m.latency_us.iter().copied().max().unwrap_or(0);

    let header =
        "scenario,vus,total_cycles,checks_passed,checks_failed,transport_errors,avg_latency_us,max_latency_us\n";
    let row = format!(
        "{},{},{},{},{},{},{},{}\n",
        scenario_name,
        m.vus,
        m.total_cycles,
        m.checks_passed,
        m.checks_failed,
        transport_errors,
        avg_latency_us,
        max_latency_us
    );

    // Append to CSV; write header if new file
    match OpenOptions::new().create(true).append(true).open(csv_path) {
        Ok(mut file) => {
            if !file_exists {
                if let Err(e) = file.write_all(header.as_bytes()) {
                    error!("Failed to write summary CSV header: {}", e);
                    return;
                }
            }

            match file.write_all(row.as_bytes()) {
                Ok(_) => info!("Summary exported to: {}", csv_path),
                Err(e) => error!("Failed to write summary CSV row: {}", e),
            }
        }
        Err(e) => error!("Failed to open summary CSV file: {}", e),
    }
}
