//! Prometheus metrics for the relayer
//!
//! Registered in the default registry; `gather_text` renders them in the
//! text exposition format.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref RECORDS_BUILT: IntCounterVec = register_int_counter_vec!(
        "relayer_records_built_total",
        "Relay records built and signed",
        &["path"]
    ).unwrap();

    pub static ref DONATION_SUBSTITUTIONS: IntCounter = register_int_counter!(
        "relayer_donation_substitutions_total",
        "Transfers whose invalid recipient was replaced by the donation address"
    ).unwrap();

    pub static ref ESCALATIONS: IntCounterVec = register_int_counter_vec!(
        "relayer_gas_escalations_total",
        "Gas price escalation requests",
        &["outcome"]
    ).unwrap();

    pub static ref BROADCASTS: IntCounterVec = register_int_counter_vec!(
        "relayer_broadcasts_total",
        "Signed transaction broadcasts",
        &["outcome"]
    ).unwrap();

    pub static ref SIGNATURE_COLLECTION_SECONDS: Histogram = register_histogram!(
        "relayer_signature_collection_seconds",
        "Time to collect the full authorization signature set",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).unwrap();
}

/// Build path label for `RECORDS_BUILT`
pub const PATH_MULTISIG: &str = "multisig";
pub const PATH_DIRECT: &str = "direct";
pub const PATH_OWNERSHIP: &str = "ownership";

/// Render every registered metric in text exposition format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
