use std::fmt::Write as _;

use revdb_core::{format_month, AppConfig};
use revdb_monthly::{RetryTracker, RetryTracking};

use super::run::resolve_period;

/// Print the tracked failures for a month.
pub(crate) fn run_monthly_retries(config: &AppConfig, month: Option<&str>) -> anyhow::Result<()> {
    let period = resolve_period(month)?;
    let month = format_month(&period);
    let tracker = RetryTracker::new(&config.retry_file);
    let tracking = tracker.load();

    print!(
        "{}",
        format_retries(&tracking, &month, config.max_retry_attempts)
    );
    Ok(())
}

fn format_retries(tracking: &RetryTracking, month: &str, max_attempts: u32) -> String {
    let entries = tracking.for_month(month);
    if entries.is_empty() {
        return format!("No tracked failures for {month}\n");
    }

    let mut out = format!("Tracked failures for {month}:\n");
    for (client_id, entry) in entries {
        let status = if entry.attempts >= max_attempts {
            "exhausted"
        } else {
            "retryable"
        };
        let _ = writeln!(
            out,
            "  client {client_id}: {}/{max_attempts} attempts ({status}) last error: {}",
            entry.attempts, entry.last_error
        );
    }
    out
}
