use chrono::Utc;

/// Millisecond timestamp used on telemetry and debug-log entries.
pub fn time_millis() -> i64 {
    Utc::now().timestamp_millis()
}
