//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Fulfillment (attempts, duration)
//! - Queue (batches, retries, dead letters)
//! - Counter actor (mutations, subscriber churn)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Fulfillment Metrics
// =============================================================================

/// Fulfillment attempts total by result.
pub static FULFILLMENT_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orderline_fulfillment_attempts_total",
            "Total fulfillment attempts",
        ),
        &["result"], // "completed", "cancelled", "duplicate"
    )
    .unwrap()
});

/// Fulfillment attempt duration in seconds.
pub static FULFILLMENT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "orderline_fulfillment_duration_seconds",
            "Duration of one fulfillment attempt",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics
// =============================================================================

/// Batches delivered to the handler.
pub static BATCHES_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderline_queue_batches_delivered_total",
        "Total batches delivered to the fulfillment worker",
    )
    .unwrap()
});

/// Messages per delivered batch.
pub static BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "orderline_queue_batch_size",
            "Number of messages per delivered batch",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Messages scheduled for redelivery.
pub static MESSAGES_RETRIED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderline_queue_messages_retried_total",
        "Total messages scheduled for redelivery",
    )
    .unwrap()
});

/// Messages routed to the dead-letter destination.
pub static MESSAGES_DEAD_LETTERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderline_queue_messages_dead_lettered_total",
        "Total messages routed to the dead-letter destination",
    )
    .unwrap()
});

// =============================================================================
// Counter Metrics
// =============================================================================

/// Counter mutations by operation.
pub static COUNTER_MUTATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orderline_counter_mutations_total",
            "Total counter mutations",
        ),
        &["operation"], // "increment_queued", "increment_completed", "reset"
    )
    .unwrap()
});

/// Subscribers pruned after a failed push.
pub static COUNTER_SUBSCRIBERS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderline_counter_subscribers_dropped_total",
        "Total counter subscribers pruned after a failed push",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Fulfillment
        Box::new(FULFILLMENT_ATTEMPTS.clone()),
        Box::new(FULFILLMENT_DURATION.clone()),
        // Queue
        Box::new(BATCHES_DELIVERED.clone()),
        Box::new(BATCH_SIZE.clone()),
        Box::new(MESSAGES_RETRIED.clone()),
        Box::new(MESSAGES_DEAD_LETTERED.clone()),
        // Counter
        Box::new(COUNTER_MUTATIONS.clone()),
        Box::new(COUNTER_SUBSCRIBERS_DROPPED.clone()),
    ]
}
