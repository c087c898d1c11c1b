//! Pluggable agent health probes
//!
//! The monitor only needs "given an agent id, what is its health?". How that
//! is answered (HTTP ping, heartbeat table, process check) belongs to the
//! probe implementation.

use crate::registry::HealthStatus;
use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("agent {agent_id} unreachable: {reason}")]
    Unreachable { agent_id: String, reason: String },

    #[error("invalid probe response from {agent_id}: {reason}")]
    InvalidResponse { agent_id: String, reason: String },
}

/// Health check for a single agent
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, agent_id: &str) -> Result<HealthStatus, ProbeError>;
}

/// Probe that reports the same status for every agent
///
/// Default for the binary until a real check is wired in.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub HealthStatus);

impl Default for StaticProbe {
    fn default() -> Self {
        Self(HealthStatus::Healthy)
    }
}

#[async_trait]
impl HealthProbe for StaticProbe {
    async fn probe(&self, _agent_id: &str) -> Result<HealthStatus, ProbeError> {
        Ok(self.0)
    }
}

/// Adapter turning an async closure into a probe
pub struct FnProbe<F> {
    f: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HealthStatus, ProbeError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> HealthProbe for FnProbe<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HealthStatus, ProbeError>> + Send,
{
    async fn probe(&self, agent_id: &str) -> Result<HealthStatus, ProbeError> {
        (self.f)(agent_id.to_string()).await
    }
}
