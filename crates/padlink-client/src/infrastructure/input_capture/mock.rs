//! Mock input source for tests.
//!
//! Lets tests inject synthetic [`RawInputEvent`]s without a real capture
//! surface.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError, Sender};

use super::{CaptureError, InputSource, RawInputEvent, EVENT_CHANNEL_CAPACITY};

/// An [`InputSource`] driven by [`MockInputSource::inject_event`].
///
/// Clones share the same channel, so a test can keep one handle for
/// injection after moving another into the code under test.
#[derive(Clone, Default)]
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<RawInputEvent>>>>,
}

impl MockInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event, as if captured from the surface.
    pub fn inject_event(&self, event: RawInputEvent) -> Result<(), CaptureError> {
        let guard = self.sender.lock().map_err(|_| CaptureError::NotRunning)?;
        let sender = guard.as_ref().ok_or(CaptureError::NotRunning)?;
        sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) | TrySendError::Closed(_) => CaptureError::NotRunning,
        })
    }

    /// Closes the channel, ending the event stream.
    pub fn stop(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            *guard = None;
        }
    }
}

impl InputSource for MockInputSource {
    fn start(&mut self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut guard = self.sender.lock().map_err(|_| CaptureError::NotRunning)?;
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        *guard = Some(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use padlink_core::{PointerSample, Viewport};

    use super::*;

    #[tokio::test]
    async fn test_mock_input_source_starts_and_receives_events() {
        // Arrange
        let mut source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source
            .inject_event(RawInputEvent::PointerDown(PointerSample {
                pointer_id: 4,
                pressure: 1.0,
                ..Default::default()
            }))
            .unwrap();

        // Assert
        let event = rx.recv().await.expect("should receive event");
        assert!(matches!(event, RawInputEvent::PointerDown(p) if p.pointer_id == 4));
    }

    #[tokio::test]
    async fn test_mock_input_source_stop_closes_channel() {
        // Arrange
        let mut source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert – channel should be closed after stop()
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_mock_input_source_inject_before_start_fails() {
        let source = MockInputSource::new();
        let result = source.inject_event(RawInputEvent::Resize(Viewport::default()));
        assert!(matches!(result, Err(CaptureError::NotRunning)));
    }

    #[tokio::test]
    async fn test_mock_input_source_clone_shares_channel() {
        let mut source = MockInputSource::new();
        let injector = source.clone();
        let mut rx = source.start().unwrap();

        injector.inject_event(RawInputEvent::Resize(Viewport::default())).unwrap();

        assert!(matches!(rx.recv().await, Some(RawInputEvent::Resize(_))));
    }
}
