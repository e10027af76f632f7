//! padlink-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does padlink-client do?
//!
//! The client turns a touch screen or pointer device into a remote trackpad.
//! It:
//!
//! 1. Opens a WebSocket to the trackpad server and keeps it open, reconnecting
//!    with exponential backoff until a lifetime retry budget is spent.
//! 2. Sends the capture surface size every time the connection opens and
//!    whenever the surface is resized.
//! 3. Forwards each contact update and contact end as one JSON text frame,
//!    dropping events that arrive while the connection is not open.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: network, input capture, storage, and status.
pub mod infrastructure;
