//! Prometheus metrics for consensus
//!
//! Exports:
//! - `consensus_blocks_validated_total` - Blocks that passed the pipeline
//! - `consensus_blocks_rejected_total{reason}` - Rejections by error kind
//! - `consensus_validation_latency_seconds` - Pipeline latency for accepted blocks
//! - `consensus_approval_rounds_total{path,result}` - Committee rounds per path
//! - `consensus_approval_latency_seconds` - Committee round latency
//!
//! Without the `metrics` feature every recorder is a no-op.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;
#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_VALIDATED: IntCounter = register_int_counter!(
        "consensus_blocks_validated_total",
        "Total blocks that passed validation"
    )
    .expect("metric can be registered");

    pub static ref BLOCKS_REJECTED: CounterVec = register_counter_vec!(
        "consensus_blocks_rejected_total",
        "Total blocks rejected, by error kind",
        &["reason"]
    )
    .expect("metric can be registered");

    pub static ref VALIDATION_LATENCY: Histogram = register_histogram!(
        "consensus_validation_latency_seconds",
        "Block validation latency in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("metric can be registered");

    pub static ref APPROVAL_ROUNDS: CounterVec = register_counter_vec!(
        "consensus_approval_rounds_total",
        "Committee approval rounds, by path and result",
        &["path", "result"]
    )
    .expect("metric can be registered");

    pub static ref APPROVAL_LATENCY: Histogram = register_histogram!(
        "consensus_approval_latency_seconds",
        "Committee approval round latency in seconds",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("metric can be registered");
}

#[cfg(feature = "metrics")]
pub fn record_block_validated() {
    BLOCKS_VALIDATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_validation_latency(seconds: f64) {
    VALIDATION_LATENCY.observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn record_approval_round(path: &str, approved: bool) {
    let result = if approved { "approved" } else { "rejected" };
    APPROVAL_ROUNDS.with_label_values(&[path, result]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_approval_latency(seconds: f64) {
    APPROVAL_LATENCY.observe(seconds);
}

// No-op implementations when metrics disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_validated() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_validation_latency(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_approval_round(_path: &str, _approved: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_approval_latency(_seconds: f64) {}
