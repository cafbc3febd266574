//! Clients for the downstream analysis services.
//!
//! The gateway fronts four independent microservices: Localization
//! (face coordinates + crops), Recognition (identity), Attention
//! (focus classification), and HandRaising (raised-hand detection).
//! This crate holds the read-only service registry, one typed client
//! method per downstream operation, and the raw passthrough used by
//! the proxy routes.

pub mod client;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod types;

pub use client::{ClientConfig, DownstreamClient};
pub use error::{DownstreamError, DownstreamResult};
pub use registry::{ConfigError, Service, ServiceRegistry};
