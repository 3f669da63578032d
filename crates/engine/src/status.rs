//! Periodic status reporter
//!
//! Runs on its own thread for the duration of a phase, logging
//! `"<timestamp> <secs> sec: <status message>"` every interval and once more
//! when the completion latch opens.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use strata_bench_concurrency::CountDownLatch;
use strata_bench_measurement::Measurements;
use tracing::info;

/// Timestamp layout of status lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render one status line
pub fn format_status_line(now: DateTime<Local>, elapsed: Duration, msg: &str) -> String {
    format!(
        "{} {} sec: {}",
        now.format(TIMESTAMP_FORMAT),
        elapsed.as_secs(),
        msg
    )
}

/// Log status lines until `done` opens, then log a final line
///
/// Returns the number of lines logged.
pub fn report_status(
    done: &CountDownLatch,
    measurements: &dyn Measurements,
    interval: Duration,
    started: Instant,
) -> usize {
    let mut lines = 0;
    loop {
        let finished = done.wait_timeout(interval);
        let line = format_status_line(Local::now(), started.elapsed(), &measurements.status_msg());
        info!("{}", line);
        lines += 1;
        if finished {
            return lines;
        }
    }
}
