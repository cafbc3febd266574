//! Axum HTTP gateway server.
//!
//! This crate provides:
//! - The aggregate `POST /api/process-frame` endpoint
//! - The frame orchestration pipeline (localize, fan out per face, join)
//! - Reverse-proxy passthrough to the downstream services
//! - Rate limiting, CORS, request logging, Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
