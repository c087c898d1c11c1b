//! Solar Dash - live-state engine for the AI agent dashboard
//!
//! Keeps the registry of known agents and the set of connected dashboard
//! clients, and runs three independent periodic tasks over them:
//! - **Health monitor**: probes every agent, records status transitions
//! - **Metrics collector**: counts agents and subscribers
//! - **Broadcaster**: pushes the full agent state to every client
//!
//! A failing cycle never stops its task and never affects the others.
//!
//! # Example
//!
//! ```ignore
//! use solar_dash_core::{DashConfig, Engine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Arc::new(Engine::new(DashConfig::default()));
//!     engine.register_or_update_agent("planner", Default::default()).await;
//!
//!     let handle = engine.start()?;
//!     // ... serve front-end clients ...
//!     handle.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod registry;
pub mod sink;
pub mod subscribers;
pub mod tasks;

// Re-export commonly used types
pub use channel::{ChannelError, ChannelId, ClientChannel, MpscChannel};
pub use config::DashConfig;
pub use engine::{Engine, EngineHandle};
pub use error::{DashError, Result, TaskError};
pub use events::{ClientMessage, DashboardMessage, HealthTransition};
pub use metrics::{HealthCounts, MetricsSnapshot};
pub use probe::{FnProbe, HealthProbe, ProbeError, StaticProbe};
pub use registry::{AgentPayload, AgentRecord, AgentRegistry, HealthStatus};
pub use sink::{EventSink, TracingSink, ACTIVITY_TARGET};
pub use subscribers::SubscriberSet;
