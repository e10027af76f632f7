//! ForwardInputUseCase: turns captured contact events into outbound messages.
//!
//! Every send is gated on the connection being `Connected`; events captured
//! while connecting or after giving up are dropped, never queued. The current
//! surface size is re-sent each time the connection (re)opens and whenever
//! the surface is resized.

use std::sync::{Arc, Mutex, PoisonError};

use padlink_core::{OutboundMessage, Viewport};
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::input_capture::{
    select_strategy, CaptureStrategy, ContactAction, InputMode, RawInputEvent,
};
use crate::infrastructure::network::connection_manager::{
    ConnectionState, Outbound, SendError, StateObserver,
};

/// Error type for forwarding operations.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to send {what}: {source}")]
    Send {
        what: &'static str,
        #[source]
        source: SendError,
    },
}

/// Why an event produced no message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The connection is not open.
    NotConnected(ConnectionState),
    /// A pointer hovering with zero pressure.
    Hover,
    /// The event belongs to the input API the active mode does not capture.
    OtherMode(InputMode),
    /// A state change other than entering `Connected`.
    NotOnConnect,
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Sent,
    Skipped(SkipReason),
}

/// Forwards captured contacts to the trackpad server.
pub struct ForwardInputUseCase {
    strategy: Box<dyn CaptureStrategy>,
    viewport: Mutex<Viewport>,
}

impl ForwardInputUseCase {
    pub fn new(mode: InputMode, viewport: Viewport) -> Self {
        Self::with_strategy(select_strategy(mode), viewport)
    }

    pub fn with_strategy(strategy: Box<dyn CaptureStrategy>, viewport: Viewport) -> Self {
        Self {
            strategy,
            viewport: Mutex::new(viewport),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.strategy.mode()
    }

    /// The most recently reported surface size.
    pub fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles one captured event.
    pub fn handle_event(
        &self,
        event: RawInputEvent,
        outbound: &mut dyn Outbound,
    ) -> Result<ForwardOutcome, ForwardError> {
        if let RawInputEvent::Resize(viewport) = event {
            *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
            debug!(width = viewport.width, height = viewport.height, "capture surface resized");
            return self.send_dimensions(outbound);
        }

        let Some(action) = self.strategy.classify(&event) else {
            return Ok(ForwardOutcome::Skipped(SkipReason::OtherMode(self.mode())));
        };

        let state = outbound.state();
        if state != ConnectionState::Connected {
            return Ok(ForwardOutcome::Skipped(SkipReason::NotConnected(state)));
        }

        let (message, what) = match action {
            ContactAction::Update(contact) => {
                if contact.is_hover() {
                    return Ok(ForwardOutcome::Skipped(SkipReason::Hover));
                }
                (contact.update_message(), "pointer update")
            }
            ContactAction::End(contact) => (contact.end_message(), "pointer end"),
        };
        send(outbound, &message, what)
    }

    /// Sends the surface size when the connection has just opened.
    pub fn on_state_change(
        &self,
        state: ConnectionState,
        outbound: &mut dyn Outbound,
    ) -> Result<ForwardOutcome, ForwardError> {
        if state != ConnectionState::Connected {
            return Ok(ForwardOutcome::Skipped(SkipReason::NotOnConnect));
        }
        self.send_dimensions(outbound)
    }

    fn send_dimensions(&self, outbound: &mut dyn Outbound) -> Result<ForwardOutcome, ForwardError> {
        let state = outbound.state();
        if state != ConnectionState::Connected {
            return Ok(ForwardOutcome::Skipped(SkipReason::NotConnected(state)));
        }
        let viewport = self.viewport();
        let outcome = send(outbound, &OutboundMessage::dimensions(&viewport), "dimensions")?;
        info!(
            "sent dimensions: width {} height {} resolution {}",
            viewport.width,
            viewport.height,
            viewport.resolution()
        );
        Ok(outcome)
    }
}

fn send(
    outbound: &mut dyn Outbound,
    message: &OutboundMessage,
    what: &'static str,
) -> Result<ForwardOutcome, ForwardError> {
    outbound
        .send(message)
        .map(|()| ForwardOutcome::Sent)
        .map_err(|source| ForwardError::Send { what, source })
}

/// Builds the observer that re-sends dimensions on every (re)connect.
pub fn dimensions_observer(use_case: Arc<ForwardInputUseCase>) -> StateObserver {
    Box::new(move |state, outbound| {
        if let Err(e) = use_case.on_state_change(state, outbound) {
            tracing::warn!("{e}");
        }
    })
}
