//! Metrics collection for observability
//!
//! Prometheus metrics recorded by the points actor. Each collector lives in
//! its own [`Registry`] so several instances can coexist (one per test).
//!
//! # Metrics
//!
//! - `points_purchases_total` - Purchases recorded
//! - `points_spends_total` - Spend requests committed
//! - `points_allocated_total` - Points removed by spends
//! - `points_unfulfilled_total` - Requested points no payer could cover
//! - `points_rejected_total` - Requests that failed validation
//! - `points_spend_duration_seconds` - Histogram of spend latencies

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Purchases recorded
    pub purchases_total: IntCounter,

    /// Spends committed
    pub spends_total: IntCounter,

    /// Points allocated by spends
    pub allocated_total: IntCounter,

    /// Points requested but not covered
    pub unfulfilled_total: IntCounter,

    /// Failed requests
    pub rejected_total: IntCounter,

    /// Spend duration histogram
    pub spend_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let purchases_total =
            IntCounter::new("points_purchases_total", "Total number of purchases recorded")?;
        registry.register(Box::new(purchases_total.clone()))?;

        let spends_total =
            IntCounter::new("points_spends_total", "Total number of spends committed")?;
        registry.register(Box::new(spends_total.clone()))?;

        let allocated_total =
            IntCounter::new("points_allocated_total", "Total points removed by spends")?;
        registry.register(Box::new(allocated_total.clone()))?;

        let unfulfilled_total = IntCounter::new(
            "points_unfulfilled_total",
            "Total requested points that could not be covered",
        )?;
        registry.register(Box::new(unfulfilled_total.clone()))?;

        let rejected_total =
            IntCounter::new("points_rejected_total", "Total number of failed requests")?;
        registry.register(Box::new(rejected_total.clone()))?;

        let spend_duration = Histogram::with_opts(
            HistogramOpts::new(
                "points_spend_duration_seconds",
                "Histogram of spend latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(spend_duration.clone()))?;

        Ok(Self {
            purchases_total,
            spends_total,
            allocated_total,
            unfulfilled_total,
            rejected_total,
            spend_duration,
            registry,
        })
    }

    /// Record purchase
    pub fn record_purchase(&self) {
        self.purchases_total.inc();
    }

    /// Record committed spend
    pub fn record_spend(&self, allocated: i64, unfulfilled: i64, duration_seconds: f64) {
        self.spends_total.inc();
        self.allocated_total.inc_by(allocated.max(0) as u64);
        self.unfulfilled_total.inc_by(unfulfilled.max(0) as u64);
        self.spend_duration.observe(duration_seconds);
    }

    /// Record failed request
    pub fn record_rejected(&self) {
        self.rejected_total.inc();
    }

    /// Render in Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
