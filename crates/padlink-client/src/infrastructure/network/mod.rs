//! Network infrastructure for the client application.
//!
//! - **`connection_manager`** – the reconnecting state machine. Pure logic;
//!   every effect goes through the `Connector`, `Link` and `Scheduler` seams.
//! - **`websocket`** – `tokio-tungstenite` implementation of those seams.
//! - **`scheduler`** – reconnect timers on `tokio::time`.
//! - **`driver`** – the event loop that ties the above to captured input.

pub mod connection_manager;
pub mod driver;
pub mod scheduler;
pub mod websocket;

pub use connection_manager::{
    ConnectionConfig, ConnectionError, ConnectionManager, ConnectionState, Outbound, SendError,
    TransportError,
};
pub use driver::ConnectionDriver;
