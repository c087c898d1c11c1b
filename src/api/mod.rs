//! HTTP/WebSocket front-end
//!
//! Provides:
//! - WebSocket endpoint for live dashboard updates
//! - Agent registration endpoints
//! - Metrics and health checks

pub mod server;
pub mod ws;

pub use server::{router, ApiServer, AppState};
