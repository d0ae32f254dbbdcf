//! Prometheus metrics exposition
//!
//! - `oauth_callbacks_total` (counter): labels `provider`, `outcome`
//! - `token_refresh_total` (counter): labels `provider`, `outcome`, emitted
//!   by the token lifecycle manager
//! - `session_rejections_total` (counter): label `reason`

use anyhow::Context;
use common::Provider;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Record the outcome of an OAuth callback.
pub fn record_callback(provider: Provider, outcome: &'static str) {
    metrics::counter!("oauth_callbacks_total", "provider" => provider.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record a session cookie that was present but discarded.
pub fn record_session_rejection(reason: &'static str) {
    metrics::counter!("session_rejections_total", "reason" => reason).increment(1);
}
