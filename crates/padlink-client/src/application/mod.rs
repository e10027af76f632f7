//! Application layer use cases for the client.
//!
//! - **`forward_input`** – Turns captured contact events into `PointerUpdate`
//!   and `PointerEnd` messages, drops them while the connection is not open,
//!   and re-sends the surface dimensions whenever the connection (re)opens or
//!   the surface is resized.

pub mod forward_input;
