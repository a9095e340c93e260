//! # Metrics Collection
//!
//! Prometheus metrics for discovery passes and the units processed in them.

use crate::config::ObservabilityConfig;
use crate::errors::{DiscoveryError, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Outcome of processing one service or route within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Published,
    Unchanged,
    NoEndpoints,
    NoSpec,
    Filtered,
    Error,
}

impl UnitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOutcome::Published => "published",
            UnitOutcome::Unchanged => "unchanged",
            UnitOutcome::NoEndpoints => "no_endpoints",
            UnitOutcome::NoSpec => "no_spec",
            UnitOutcome::Filtered => "filtered",
            UnitOutcome::Error => "error",
        }
    }
}

/// Metrics recorder for the discovery agent
///
/// Recording is a no-op until a global recorder is installed by [`init_metrics`].
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record a finished discovery pass
    pub fn record_pass(&self, success: bool, duration: f64) {
        let status = if success { "success" } else { "error" };
        let labels = [("status", status.to_string())];
        counter!("discovery_passes_total", &labels).increment(1);
        histogram!("discovery_pass_duration_seconds").record(duration);
    }

    /// Record the outcome of one service
    pub fn record_service(&self, outcome: UnitOutcome) {
        let labels = [("outcome", outcome.as_str().to_string())];
        counter!("discovery_services_total", &labels).increment(1);
    }

    /// Record the outcome of one route
    pub fn record_route(&self, outcome: UnitOutcome) {
        let labels = [("outcome", outcome.as_str().to_string())];
        counter!("discovery_routes_total", &labels).increment(1);
    }

    /// Update the change-detection cache size gauge
    pub fn update_cache_entries(&self, entries: usize) {
        gauge!("discovery_cache_entries").set(entries as f64);
    }

    /// Register metric descriptions so exports appear before events occur
    pub fn register_discovery_metrics(&self) {
        describe_counter!("discovery_passes_total", Unit::Count, "Completed discovery passes");
        describe_histogram!(
            "discovery_pass_duration_seconds",
            Unit::Seconds,
            "Wall-clock duration of a discovery pass"
        );
        describe_counter!(
            "discovery_services_total",
            Unit::Count,
            "Services examined, by outcome"
        );
        describe_counter!("discovery_routes_total", Unit::Count, "Routes examined, by outcome");
        describe_gauge!(
            "discovery_cache_entries",
            Unit::Count,
            "Distinct API snapshots held by the change-detection cache"
        );
    }
}

/// Initialize the Prometheus exporter
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        DiscoveryError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| {
            DiscoveryError::config(format!("Failed to initialize metrics exporter: {}", e))
        })?;

    MetricsRecorder::new().register_discovery_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}
