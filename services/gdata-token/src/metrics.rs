//! Prometheus metrics rendering
//!
//! - `gdata_token_commands_total` (counter): labels `command`, `outcome`
//! - `token_store_lookups_total` (counter): label `result`, emitted by the store
//!
//! The CLI is short-lived, so instead of serving `/metrics` it renders the
//! text exposition to stderr when `--print-metrics` is given.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Record a finished command.
pub fn record_command(command: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!("gdata_token_commands_total", "command" => command, "outcome" => outcome)
        .increment(1);
}
