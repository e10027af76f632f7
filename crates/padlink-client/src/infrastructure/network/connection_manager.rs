//! ConnectionManager: owns the single WebSocket link to the trackpad server,
//! gates outbound sends, and reconnects with exponential backoff.
//!
//! The manager is a plain state machine with no I/O of its own. It talks to
//! the outside world through three seams:
//!
//! - [`Connector`] opens a connection attempt and hands back a [`Link`].
//! - [`Scheduler`] runs the reconnect timers.
//! - The runtime feeds transport lifecycle signals back in through
//!   [`ConnectionManager::handle_signal`] and timer firings through
//!   [`ConnectionManager::handle_timer`].
//!
//! ```text
//!                 Opened
//!   Connecting ──────────────> Connected
//!      ^  │                        │
//!      │  │ Closed/Failed          │ Closed/Failed
//!      │  │ (retries left)         │ (retries left)
//!      └──┘<───────────────────────┘
//!      │
//!      │ Closed/Failed (budget spent)
//!      v
//!   Disconnected (terminal)
//! ```
//!
//! The retry budget is lifetime-total: a successful open does not give
//! retries back.

use std::fmt;
use std::time::Duration;

use padlink_core::{encode_message, OutboundMessage, ProtocolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// Delay unit for the reconnect backoff: attempt `n` waits `2^n * BASE_DELAY`.
pub const BASE_DELAY: Duration = Duration::from_millis(500);

/// Default number of reconnects tolerated over the manager's lifetime.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default trackpad server endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080/api/socket";

// ── State ─────────────────────────────────────────────────────────────────────

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// An attempt is in flight or a reconnect is scheduled.
    Connecting,
    /// The link is open; sends are accepted.
    Connected,
    /// The retry budget is spent. Terminal.
    Disconnected,
}

impl ConnectionState {
    /// Lowercase state name, as shown by the status indicator.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one connection attempt (and the link it produced).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one scheduled reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Configuration for the connection manager. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// WebSocket URL of the trackpad server.
    pub endpoint: String,
    /// Reconnects tolerated over the manager's lifetime.
    pub max_retries: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Lifetime-total retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max_retries: u32,
    retries: u32,
}

impl RetryBudget {
    /// A fresh budget with no retries spent.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            retries: 0,
        }
    }

    /// Retries allowed over the budget's lifetime.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Failed attempts retried so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// `true` once every allowed retry has been spent.
    pub fn is_exhausted(&self) -> bool {
        self.retries >= self.max_retries
    }

    /// Spends one retry and returns the new count.
    fn consume(&mut self) -> u32 {
        self.retries = self.retries.saturating_add(1);
        self.retries
    }
}

/// Returns the delay before reconnect number `retries` (1-based).
///
/// `2^retries * 500ms` with no jitter and no cap; saturates at
/// [`Duration::MAX`] rather than overflowing.
pub fn backoff_delay(retries: u32) -> Duration {
    2u32.checked_pow(retries)
        .and_then(|factor| BASE_DELAY.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures reported by the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("connection closed: {0}")]
    Closed(String),
    #[error("transport I/O error: {0}")]
    Io(String),
}

/// Error returned by [`ConnectionManager::send`].
#[derive(Debug, Error)]
pub enum SendError {
    #[error("socket not ready (state: {state})")]
    NotReady { state: ConnectionState },
    #[error(transparent)]
    Encode(#[from] ProtocolError),
    #[error("transport rejected frame: {0}")]
    Transport(#[from] TransportError),
}

/// The unrecoverable condition raised when the retry budget is spent.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection to {endpoint} failed after {retries} retries: {source}")]
    RetriesExhausted {
        endpoint: String,
        retries: u32,
        #[source]
        source: TransportError,
    },
}

// ── Seams ─────────────────────────────────────────────────────────────────────

/// Lifecycle signal for one attempt, delivered asynchronously by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    Opened,
    Closed { reason: String },
    Failed(TransportError),
}

/// A live connection handle. Dropping it discards the connection.
pub trait Link: Send {
    /// Queues one text frame for transmission.
    fn send_text(&mut self, frame: String) -> Result<(), TransportError>;
}

/// Opens connection attempts.
pub trait Connector: Send {
    type Link: Link;

    /// Starts an attempt. Later signals for it are tagged with `attempt`.
    ///
    /// An `Err` is an attempt that failed before it could start.
    fn connect(&mut self, endpoint: &str, attempt: AttemptId) -> Result<Self::Link, TransportError>;
}

/// Runs reconnect timers.
#[cfg_attr(test, mockall::automock)]
pub trait Scheduler: Send {
    /// Arranges for `timer` to fire after `delay`.
    fn schedule(&mut self, timer: TimerId, delay: Duration);
    /// Cancels `timer` if it has not fired yet.
    fn cancel(&mut self, timer: TimerId);
}

/// The view of the manager that observers and the capture layer get.
pub trait Outbound {
    fn state(&self) -> ConnectionState;
    fn send(&mut self, message: &OutboundMessage) -> Result<(), SendError>;
}

/// Called once per actual state change, after the state field is updated.
pub type StateObserver = Box<dyn FnMut(ConnectionState, &mut dyn Outbound) + Send>;

// ── Manager ───────────────────────────────────────────────────────────────────

/// The connection manager.
pub struct ConnectionManager<C: Connector, S: Scheduler> {
    endpoint: String,
    state: ConnectionState,
    budget: RetryBudget,
    connector: C,
    scheduler: S,
    link: Option<C::Link>,
    attempt: AttemptId,
    /// A failure has already been processed for `attempt`.
    attempt_failed: bool,
    pending_timer: Option<TimerId>,
    next_timer: u64,
    observers: Vec<StateObserver>,
}

impl<C: Connector, S: Scheduler> ConnectionManager<C, S> {
    /// Creates the manager in `Connecting` and starts the first attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::RetriesExhausted`] only when the first
    /// attempt fails synchronously and `max_retries` is zero.
    pub fn new(config: ConnectionConfig, connector: C, scheduler: S) -> Result<Self, ConnectionError> {
        let mut manager = Self {
            endpoint: config.endpoint,
            state: ConnectionState::Connecting,
            budget: RetryBudget::new(config.max_retries),
            connector,
            scheduler,
            link: None,
            attempt: AttemptId(0),
            attempt_failed: false,
            pending_timer: None,
            next_timer: 0,
            observers: Vec::new(),
        };
        manager.start_attempt()?;
        Ok(manager)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.budget.retries()
    }

    pub fn max_retries(&self) -> u32 {
        self.budget.max_retries()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The attempt whose signals are currently accepted.
    pub fn current_attempt(&self) -> AttemptId {
        self.attempt
    }

    /// The reconnect timer that is scheduled and not yet fired, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending_timer
    }

    /// Registers a state-change observer.
    pub fn subscribe(&mut self, observer: StateObserver) {
        self.observers.push(observer);
    }

    /// Encodes `message` and transmits it as one text frame.
    ///
    /// Fire-and-forget: success means the frame was handed to the link.
    ///
    /// # Errors
    ///
    /// [`SendError::NotReady`] unless the state is `Connected`; nothing is
    /// transmitted in that case.
    pub fn send(&mut self, message: &OutboundMessage) -> Result<(), SendError> {
        let state = self.state;
        let link = match (state, self.link.as_mut()) {
            (ConnectionState::Connected, Some(link)) => link,
            _ => return Err(SendError::NotReady { state }),
        };
        let frame = encode_message(message)?;
        trace!(tag = %message.tag(), len = frame.len(), "sending frame");
        link.send_text(frame)?;
        Ok(())
    }

    /// Applies a transport signal for `attempt`.
    ///
    /// Signals from superseded attempts, a second failure for the same
    /// attempt, and anything arriving after `Disconnected` are ignored.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`ConnectionError`] exactly once, on the failure
    /// that spends the last of the retry budget.
    pub fn handle_signal(
        &mut self,
        attempt: AttemptId,
        signal: TransportSignal,
    ) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Disconnected {
            debug!(%attempt, ?signal, "ignoring signal after disconnect");
            return Ok(());
        }
        if attempt != self.attempt {
            debug!(%attempt, current = %self.attempt, ?signal, "ignoring signal from superseded attempt");
            return Ok(());
        }
        if self.attempt_failed {
            debug!(%attempt, ?signal, "ignoring signal for already failed attempt");
            return Ok(());
        }

        match signal {
            TransportSignal::Opened => {
                self.transition(ConnectionState::Connected);
                Ok(())
            }
            TransportSignal::Closed { reason } => self.fail_attempt(TransportError::Closed(reason)),
            TransportSignal::Failed(err) => self.fail_attempt(err),
        }
    }

    /// Applies a timer firing. Only the pending reconnect timer starts a new
    /// attempt; cancelled or superseded timers are ignored.
    ///
    /// # Errors
    ///
    /// Propagates the fatal error if the new attempt fails synchronously with
    /// no retries left.
    pub fn handle_timer(&mut self, timer: TimerId) -> Result<(), ConnectionError> {
        if self.pending_timer != Some(timer) {
            debug!(?timer, "ignoring stale reconnect timer");
            return Ok(());
        }
        self.pending_timer = None;
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }
        self.start_attempt()
    }

    /// Cancels any pending reconnect and drops the link. Used when the
    /// process is shutting down; the state is left as it is.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        if self.link.take().is_some() {
            info!(endpoint = %self.endpoint, "connection closed for shutdown");
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn start_attempt(&mut self) -> Result<(), ConnectionError> {
        // The previous handle is discarded, never reused.
        self.link = None;
        self.attempt = AttemptId(self.attempt.0 + 1);
        self.attempt_failed = false;
        debug!(attempt = %self.attempt, endpoint = %self.endpoint, "opening connection");

        match self.connector.connect(&self.endpoint, self.attempt) {
            Ok(link) => {
                self.link = Some(link);
                Ok(())
            }
            Err(err) => self.fail_attempt(err),
        }
    }

    fn fail_attempt(&mut self, cause: TransportError) -> Result<(), ConnectionError> {
        self.attempt_failed = true;
        self.link = None;

        if self.budget.is_exhausted() {
            self.cancel_pending();
            self.transition(ConnectionState::Disconnected);
            error!(
                endpoint = %self.endpoint,
                retries = self.budget.retries(),
                "giving up on connection: {cause}"
            );
            return Err(ConnectionError::RetriesExhausted {
                endpoint: self.endpoint.clone(),
                retries: self.budget.retries(),
                source: cause,
            });
        }

        self.transition(ConnectionState::Connecting);
        let retry = self.budget.consume();
        let delay = backoff_delay(retry);
        warn!(
            "connection attempt {} failed ({cause}); retry {retry}/{} in {delay:?}",
            self.attempt,
            self.budget.max_retries()
        );
        self.schedule_reconnect(delay);
        Ok(())
    }

    fn schedule_reconnect(&mut self, delay: Duration) {
        self.cancel_pending();
        self.next_timer += 1;
        let timer = TimerId(self.next_timer);
        self.pending_timer = Some(timer);
        self.scheduler.schedule(timer, delay);
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    /// The only writer of `state`. Notifies observers iff the value changes.
    fn transition(&mut self, new_state: ConnectionState) -> bool {
        if self.state == new_state {
            return false;
        }
        let old_state = std::mem::replace(&mut self.state, new_state);
        info!(endpoint = %self.endpoint, "connection state {old_state} -> {new_state}");

        // Observers get `&mut self` as an `Outbound`, so they are moved out
        // for the duration of the notification.
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer(new_state, &mut *self);
        }
        self.observers = observers;
        true
    }
}

impl<C: Connector, S: Scheduler> Outbound for ConnectionManager<C, S> {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), SendError> {
        ConnectionManager::send(self, message)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
