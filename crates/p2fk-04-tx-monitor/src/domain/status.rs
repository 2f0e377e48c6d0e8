//! Status messages and event summaries.

/// Emitted when `start()` begins.
pub const STATUS_STARTED: &str = "Monitoring started";

/// First connectivity check failed.
pub const STATUS_NOT_CONNECTED: &str = "Peer network not connected - will retry connection";

/// Second connectivity check failed.
pub const STATUS_CONNECTION_FAILED: &str = "Peer network connection failed - please check network";

/// The feed is being consumed.
pub const STATUS_RUNNING: &str = "Monitoring transactions...";

/// Monitoring ended by request.
pub const STATUS_STOPPED: &str = "Monitoring stopped";

/// Monitoring ended by a fault.
#[must_use]
pub fn status_error(detail: &str) -> String {
    format!("Monitoring error: {detail}")
}

/// Summary of a downloaded content item.
#[must_use]
pub fn downloaded_summary(file_name: &str) -> String {
    format!("Downloaded: {file_name}")
}

/// First `max_chars` characters of a message.
#[must_use]
pub fn summarize(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
