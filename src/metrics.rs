//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "examdesk_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");

    // Commerce Metrics
    pub static ref ORDERS_CREATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_orders_created_total", "Total number of payment orders created"),
        &["item_type"]
    ).expect("metric can be created");
    pub static ref PAYMENTS_VERIFIED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_payments_verified_total", "Payment verification attempts by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref PURCHASES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_purchases_total", "Total number of purchases recorded"),
        &["item_type"]
    ).expect("metric can be created");
    pub static ref DOWNLOADS_TOTAL: IntCounter = IntCounter::new(
        "examdesk_material_downloads_total",
        "Total number of material downloads"
    ).expect("metric can be created");
    pub static ref TEST_ATTEMPTS_TOTAL: IntCounter = IntCounter::new(
        "examdesk_test_attempts_total",
        "Total number of submitted test attempts"
    ).expect("metric can be created");
    pub static ref USERS_REGISTERED_TOTAL: IntCounter = IntCounter::new(
        "examdesk_users_registered_total",
        "Total number of user registrations"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("examdesk_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; registration happens on the first call.
pub fn init_metrics() {
    INIT.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(HTTP_REQUESTS_TOTAL.clone()),
            Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
            Box::new(CACHE_HITS_TOTAL.clone()),
            Box::new(CACHE_MISSES_TOTAL.clone()),
            Box::new(ORDERS_CREATED_TOTAL.clone()),
            Box::new(PAYMENTS_VERIFIED_TOTAL.clone()),
            Box::new(PURCHASES_TOTAL.clone()),
            Box::new(DOWNLOADS_TOTAL.clone()),
            Box::new(TEST_ATTEMPTS_TOTAL.clone()),
            Box::new(USERS_REGISTERED_TOTAL.clone()),
            Box::new(ERRORS_TOTAL.clone()),
        ];

        for collector in collectors {
            if let Err(error) = REGISTRY.register(collector) {
                tracing::warn!(%error, "Failed to register metric");
            }
        }

        tracing::info!("Metrics registry initialized");
    });
}
