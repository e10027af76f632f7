//! Domain layer: pure logic with no I/O.
//!
//! - **`contact`** – Raw pointer/touch samples and their conversion into
//!   `PointerUpdate` / `PointerEnd` messages.
//! - **`geometry`** – The capture surface size and its resolution estimate.

pub mod contact;
pub mod geometry;
