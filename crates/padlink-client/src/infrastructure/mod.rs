//! Infrastructure layer for the client application.
//!
//! # Sub-modules
//!
//! - **`network`** – the connection manager, its WebSocket and timer adapters,
//!   and the event loop that drives them.
//!
//! - **`input_capture`** – raw contact events, the per-mode capture strategy,
//!   and the sources that produce events (a JSON-lines feed, or a mock for
//!   tests).
//!
//! - **`storage`** – TOML configuration persistence.
//!
//! - **`ui_bridge`** – the connection status indicator and its serializable
//!   snapshot.

pub mod input_capture;
pub mod network;
pub mod storage;
pub mod ui_bridge;
