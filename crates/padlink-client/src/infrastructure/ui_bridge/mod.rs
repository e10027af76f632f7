//! Status bridge: what the UI shows about the connection.
//!
//! The indicator mirrors the connection state as a CSS-style class plus a
//! human-readable title. [`ClientStatusDto`] is the serializable snapshot
//! that the event loop publishes on a `watch` channel for any status
//! consumer (a tray icon, a web page, a log line).

use serde::{Deserialize, Serialize};

use crate::infrastructure::network::connection_manager::{
    ConnectionManager, ConnectionState, Connector, Scheduler,
};

/// Visual indicator for one connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIndicator {
    /// Style class; always the lowercase state name.
    pub class: &'static str,
    /// Tooltip text.
    pub title: &'static str,
}

impl StatusIndicator {
    pub fn for_state(state: ConnectionState) -> Self {
        let title = match state {
            ConnectionState::Connected => "Connected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Disconnected => "Failed to connect, restart to retry",
        };
        Self {
            class: state.as_str(),
            title,
        }
    }
}

impl From<ConnectionState> for StatusIndicator {
    fn from(state: ConnectionState) -> Self {
        Self::for_state(state)
    }
}

/// Serializable snapshot of the connection for UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatusDto {
    pub state: ConnectionState,
    pub title: String,
    pub retries: u32,
    pub max_retries: u32,
    pub endpoint: String,
}

impl ClientStatusDto {
    /// Snapshot of `manager` as it is right now.
    pub fn from_manager<C: Connector, S: Scheduler>(manager: &ConnectionManager<C, S>) -> Self {
        let state = manager.state();
        Self {
            state,
            title: StatusIndicator::for_state(state).title.to_string(),
            retries: manager.retries(),
            max_retries: manager.max_retries(),
            endpoint: manager.endpoint().to_string(),
        }
    }
}
