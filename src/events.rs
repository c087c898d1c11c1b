//! Messages exchanged with dashboard clients and events reported to the sink

use crate::channel::ChannelId;
use crate::registry::{AgentRecord, HealthStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outbound message pushed to dashboard clients
///
/// Timestamps go over the wire as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    /// Full agent state, sent every broadcast cycle
    DashboardUpdate {
        agents: HashMap<String, AgentRecord>,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// First message on a new connection
    Connected {
        channel_id: ChannelId,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// Reply to a client ping
    Pong {
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
}

impl DashboardMessage {
    /// Create dashboard update from a registry snapshot
    pub fn dashboard_update(agents: HashMap<String, AgentRecord>) -> Self {
        DashboardMessage::DashboardUpdate {
            agents,
            timestamp: Utc::now(),
        }
    }

    /// Create connected greeting
    pub fn connected(channel_id: ChannelId) -> Self {
        DashboardMessage::Connected {
            channel_id,
            timestamp: Utc::now(),
        }
    }

    /// Create pong reply
    pub fn pong() -> Self {
        DashboardMessage::Pong {
            timestamp: Utc::now(),
        }
    }

    /// Agents carried by an update, if this is one
    pub fn agents(&self) -> Option<&HashMap<String, AgentRecord>> {
        match self {
            DashboardMessage::DashboardUpdate { agents, .. } => Some(agents),
            _ => None,
        }
    }
}

/// Inbound message from a dashboard client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness check, answered with a pong
    Ping,
    /// Ask for the current state without waiting for the next cycle
    Snapshot,
}

/// Health change observed by the monitor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthTransition {
    pub agent_id: String,
    /// None on the first check of an agent
    pub old_status: Option<HealthStatus>,
    pub new_status: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthTransition {
    pub fn new(
        agent_id: impl Into<String>,
        old_status: Option<HealthStatus>,
        new_status: HealthStatus,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            old_status,
            new_status,
            timestamp: Utc::now(),
        }
    }
}
