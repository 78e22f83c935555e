//! Session metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.
//!
//! - `chat_sends_total`: counter of sends by surface and outcome
//! - `chat_send_duration_seconds`: histogram of send latency by surface
//! - `chat_recoveries_total`: counter of conversation recoveries by result
//! - `chat_initializations_total`: counter of initializations by outcome

use metrics::{histogram, increment_counter};
use std::time::Duration;

/// Record the terminal outcome of one `send`
pub fn record_send(surface: &str, outcome: &'static str, elapsed: Duration) {
    increment_counter!(
        "chat_sends_total",
        "surface" => surface.to_string(),
        "outcome" => outcome
    );
    histogram!(
        "chat_send_duration_seconds",
        elapsed.as_secs_f64(),
        "surface" => surface.to_string()
    );
}

/// Record a recovery attempt; `result` is `rebound` or `failed`
pub fn record_recovery(surface: &str, result: &'static str) {
    increment_counter!(
        "chat_recoveries_total",
        "surface" => surface.to_string(),
        "result" => result
    );
}

/// Record the outcome of `initialize`
pub fn record_initialization(surface: &str, outcome: &'static str) {
    increment_counter!(
        "chat_initializations_total",
        "surface" => surface.to_string(),
        "outcome" => outcome
    );
}
