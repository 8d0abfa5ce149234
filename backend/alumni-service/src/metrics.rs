//! Service-level Prometheus metrics

use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

lazy_static::lazy_static! {
    /// Read acknowledgments by outcome (`advanced` or `unchanged`)
    pub static ref READ_ACKNOWLEDGMENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "alumni_read_acknowledgments_total",
        "Read acknowledgments processed",
        &["outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Messages persisted by conversation kind (`group` or `direct`)
    pub static ref MESSAGES_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        "alumni_messages_sent_total",
        "Messages persisted",
        &["kind"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Open WebSocket sessions
    pub static ref WS_CONNECTIONS: IntGauge = register_int_gauge!(
        "alumni_ws_connections",
        "Open WebSocket sessions"
    ).expect("Prometheus metrics registration should succeed at startup");
}

pub fn record_acknowledgment(advanced: bool) {
    let outcome = if advanced { "advanced" } else { "unchanged" };
    READ_ACKNOWLEDGMENTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_message_sent(kind: &str) {
    MESSAGES_SENT_TOTAL.with_label_values(&[kind]).inc();
}
