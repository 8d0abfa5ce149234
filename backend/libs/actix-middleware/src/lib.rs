//! # Actix Middleware Library
//!
//! Middleware shared by the alumni HTTP services
//!
//! ## Modules
//! - `correlation_id`: request correlation ids (`x-correlation-id`)
//! - `logging`: request/response logging through `tracing`
//! - `metrics`: Prometheus HTTP metrics

pub mod correlation_id;
pub mod logging;
pub mod metrics;

pub use correlation_id::{CorrelationId, CorrelationIdMiddleware, CORRELATION_ID_HEADER};
pub use logging::Logging;
pub use metrics::{render_metrics, MetricsMiddleware};
