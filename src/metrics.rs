//! Prometheus metrics collection for flarerelay
//!
//! Tracks upstream calls by provider and outcome, plus upstream latency.
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::upstream::Provider;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// How an upstream call ended
///
/// Keeps the `outcome` label to a fixed set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// 2xx from the provider
    Success,
    /// Provider answered with a non-2xx status
    UpstreamError,
    /// No usable HTTP answer (connect, TLS, timeout, body read)
    TransportError,
}

impl UpstreamOutcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamOutcome::Success => "success",
            UpstreamOutcome::UpstreamError => "upstream_error",
            UpstreamOutcome::TransportError => "transport_error",
        }
    }
}

/// Metrics collector for flarerelay
pub struct Metrics {
    registry: Registry,
    upstream_requests: IntCounterVec,
    upstream_duration: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 2 providers × 3 outcomes = 6 time series
        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "flarerelay_upstream_requests_total",
                "Total number of upstream inference calls by provider and outcome",
            ),
            &["provider", "outcome"],
        )?;

        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "flarerelay_upstream_duration_ms",
                "Upstream call latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
            ]),
            &["provider"],
        )?;

        registry.register(Box::new(upstream_requests.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;

        Ok(Self {
            registry,
            upstream_requests,
            upstream_duration,
        })
    }

    /// Record one finished upstream call
    pub fn record_upstream(
        &self,
        provider: Provider,
        outcome: UpstreamOutcome,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        self.upstream_requests
            .get_metric_with_label_values(&[provider.as_str(), outcome.as_str()])?
            .inc();
        self.upstream_duration
            .get_metric_with_label_values(&[provider.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Current count for one provider/outcome pair
    pub fn upstream_request_count(&self, provider: Provider, outcome: UpstreamOutcome) -> u64 {
        self.upstream_requests
            .get_metric_with_label_values(&[provider.as_str(), outcome.as_str()])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    /// Encode all registered metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("metrics output is not valid UTF-8: {}", e))
        })
    }
}
