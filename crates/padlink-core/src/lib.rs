//! # padlink-core
//!
//! Shared library for Padlink containing the wire message types, the JSON
//! envelope codec, and the domain helpers that turn raw contact samples into
//! outbound messages.
//!
//! Padlink turns a touch screen (or any pointer device) into a remote
//! trackpad: the client streams contact positions to a trackpad server over a
//! single WebSocket, and the server replays them as a multitouch device.
//!
//! This crate has zero dependencies on sockets, async runtimes, or OS APIs.
//!
//! - **`protocol`** – The closed set of [`OutboundMessage`] variants and the
//!   codec that renders each one as a `{"t": tag, "d": payload}` text frame.
//!
//! - **`domain`** – Contact derivation (one record per changed contact, in
//!   event order) and viewport geometry (the resolution estimate sent with
//!   every dimensions update).

pub mod domain;
pub mod protocol;

pub use domain::contact::{ContactEvent, PointerSample, TouchPoint, TouchSample};
pub use domain::geometry::Viewport;
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Contact, ContactId, DimensionsData, MessageTag, OutboundMessage};
