//! The client event loop.
//!
//! One task owns the [`ConnectionManager`] and the forward-input use case.
//! Transport signals, reconnect timers, captured events and the shutdown
//! signal are all multiplexed through a single `select!`, so the manager is
//! only ever touched from one place at a time.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, trace, warn};

use crate::application::forward_input::{dimensions_observer, ForwardInputUseCase, ForwardOutcome};
use crate::infrastructure::input_capture::RawInputEvent;
use crate::infrastructure::ui_bridge::{ClientStatusDto, StatusIndicator};

use super::connection_manager::{
    ConnectionConfig, ConnectionError, ConnectionManager, ConnectionState,
};
use super::scheduler::{TimerFired, TokioScheduler};
use super::websocket::{TransportEvent, WsConnector};

/// The concrete manager the driver runs.
pub type WsConnectionManager = ConnectionManager<WsConnector, TokioScheduler>;

/// Owns the connection and drives it from runtime events.
pub struct ConnectionDriver {
    manager: WsConnectionManager,
    forward: Arc<ForwardInputUseCase>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    timers: mpsc::UnboundedReceiver<TimerFired>,
    status: watch::Sender<ClientStatusDto>,
}

impl ConnectionDriver {
    /// Builds the manager and starts the first connection attempt.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the fatal error if the first attempt fails synchronously with
    /// a zero retry budget.
    pub fn start(
        config: ConnectionConfig,
        forward: Arc<ForwardInputUseCase>,
    ) -> Result<Self, ConnectionError> {
        let (connector, transport_events) = WsConnector::channel();
        let (scheduler, timers) = TokioScheduler::channel();
        info!(endpoint = %config.endpoint, max_retries = config.max_retries, "connecting");

        let mut manager = ConnectionManager::new(config, connector, scheduler)?;
        manager.subscribe(Box::new(|state, _| {
            let indicator = StatusIndicator::for_state(state);
            info!(status = indicator.class, "{}", indicator.title);
        }));
        manager.subscribe(dimensions_observer(Arc::clone(&forward)));

        let (status, _) = watch::channel(ClientStatusDto::from_manager(&manager));
        Ok(Self {
            manager,
            forward,
            transport_events,
            timers,
            status,
        })
    }

    /// Receiver for status snapshots; updated after every handled event.
    pub fn subscribe_status(&self) -> watch::Receiver<ClientStatusDto> {
        self.status.subscribe()
    }

    /// Runs until `shutdown` resolves or the retry budget is spent.
    ///
    /// Captured input is not read until the first connection opens, so a
    /// feed that is ready up front is not drained while still connecting.
    /// When the input channel closes the connection is kept up.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::RetriesExhausted`] when the connection is
    /// given up on.
    pub async fn run<F>(
        mut self,
        mut input: mpsc::Receiver<RawInputEvent>,
        shutdown: F,
    ) -> Result<(), ConnectionError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut input_open = true;
        let mut has_connected = self.manager.state() == ConnectionState::Connected;

        let result = loop {
            tokio::select! {
                Some(event) = self.transport_events.recv() => {
                    if let Err(e) = self.manager.handle_signal(event.attempt, event.signal) {
                        break Err(e);
                    }
                }
                Some(TimerFired(timer)) = self.timers.recv() => {
                    if let Err(e) = self.manager.handle_timer(timer) {
                        break Err(e);
                    }
                }
                event = input.recv(), if input_open && has_connected => match event {
                    Some(event) => self.forward_event(event),
                    None => {
                        info!("input source ended");
                        input_open = false;
                    }
                },
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
            }
            has_connected |= self.manager.state() == ConnectionState::Connected;
            self.publish_status();
        };

        self.publish_status();
        self.manager.shutdown();
        result
    }

    fn forward_event(&mut self, event: RawInputEvent) {
        match self.forward.handle_event(event, &mut self.manager) {
            Ok(ForwardOutcome::Sent) => {}
            Ok(ForwardOutcome::Skipped(reason)) => trace!(?reason, "event not forwarded"),
            Err(e) => warn!("{e}"),
        }
    }

    fn publish_status(&self) {
        let snapshot = ClientStatusDto::from_manager(&self.manager);
        self.status.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
