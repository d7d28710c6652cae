//! # Observability Infrastructure
//!
//! Structured logging for certificate store jobs via the `tracing` ecosystem.

pub mod logging;

pub use logging::{init_logging, log_store_config, LogFormat};
