//! Input capture infrastructure for the client application.
//!
//! Raw contact events come from an [`InputSource`] on a Tokio channel. Which
//! events are meaningful depends on the capture mode the environment supports:
//! a touch screen reports touch events, everything else reports pointer
//! events. The mode is chosen once at startup and injected as a
//! [`CaptureStrategy`].
//!
//! # Testability
//!
//! [`mock::MockInputSource`] lets tests inject synthetic events.

use std::fmt;
use std::str::FromStr;

use padlink_core::{ContactEvent, PointerSample, TouchSample, Viewport};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub mod jsonl;
pub mod mock;

/// Capacity of the channel between a source and the event loop.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A raw event from the capture surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawInputEvent {
    PointerDown(PointerSample),
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    PointerCancel(PointerSample),
    TouchStart(TouchSample),
    TouchMove(TouchSample),
    TouchEnd(TouchSample),
    TouchCancel(TouchSample),
    /// The capture surface changed size.
    Resize(Viewport),
}

/// Which input API the environment delivers contacts through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Touch,
    #[default]
    Pointer,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Touch => "touch",
            InputMode::Pointer => "pointer",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "touch" => Ok(InputMode::Touch),
            "pointer" => Ok(InputMode::Pointer),
            other => Err(CaptureError::UnknownMode(other.to_string())),
        }
    }
}

/// What a contact event asks the server to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactAction {
    /// Contacts were added or moved.
    Update(ContactEvent),
    /// Contacts were lifted or cancelled.
    End(ContactEvent),
}

/// Decides which raw events carry contacts in the active mode.
pub trait CaptureStrategy: Send + Sync {
    fn mode(&self) -> InputMode;

    /// Returns `None` for events this mode does not capture, including
    /// [`RawInputEvent::Resize`].
    fn classify(&self, event: &RawInputEvent) -> Option<ContactAction>;
}

/// Captures touch-API events only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TouchStrategy;

impl CaptureStrategy for TouchStrategy {
    fn mode(&self) -> InputMode {
        InputMode::Touch
    }

    fn classify(&self, event: &RawInputEvent) -> Option<ContactAction> {
        match event {
            RawInputEvent::TouchStart(t) | RawInputEvent::TouchMove(t) => {
                Some(ContactAction::Update(ContactEvent::Touch(t.clone())))
            }
            RawInputEvent::TouchEnd(t) | RawInputEvent::TouchCancel(t) => {
                Some(ContactAction::End(ContactEvent::Touch(t.clone())))
            }
            _ => None,
        }
    }
}

/// Captures pointer-API events only.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerStrategy;

impl CaptureStrategy for PointerStrategy {
    fn mode(&self) -> InputMode {
        InputMode::Pointer
    }

    fn classify(&self, event: &RawInputEvent) -> Option<ContactAction> {
        match event {
            RawInputEvent::PointerDown(p) | RawInputEvent::PointerMove(p) => {
                Some(ContactAction::Update(ContactEvent::Pointer(*p)))
            }
            RawInputEvent::PointerUp(p) | RawInputEvent::PointerCancel(p) => {
                Some(ContactAction::End(ContactEvent::Pointer(*p)))
            }
            _ => None,
        }
    }
}

/// Returns the strategy for `mode`.
pub fn select_strategy(mode: InputMode) -> Box<dyn CaptureStrategy> {
    match mode {
        InputMode::Touch => Box::new(TouchStrategy),
        InputMode::Pointer => Box::new(PointerStrategy),
    }
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("unknown input mode {0:?} (expected \"touch\" or \"pointer\")")]
    UnknownMode(String),
    #[error("failed to open event source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("input source has already been started")]
    AlreadyStarted,
    #[error("input source is not running")]
    NotRunning,
}

/// Produces raw capture events.
pub trait InputSource: Send {
    /// Starts the source and returns the receiver events arrive on.
    /// The channel closes when the source runs out of events.
    fn start(&mut self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError>;
}

#[cfg(test)]
mod tests {
    use padlink_core::TouchPoint;

    use super::*;

    fn pointer(pressure: f32) -> PointerSample {
        PointerSample {
            pointer_id: 1,
            offset_x: 10.0,
            offset_y: 20.0,
            width: 1.0,
            height: 1.0,
            pressure,
        }
    }

    fn touch() -> TouchSample {
        TouchSample {
            changed_touches: vec![TouchPoint {
                identifier: 3,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_pointer_strategy_maps_down_and_move_to_update() {
        let strategy = PointerStrategy;
        for event in [RawInputEvent::PointerDown(pointer(0.5)), RawInputEvent::PointerMove(pointer(0.5))] {
            assert!(matches!(strategy.classify(&event), Some(ContactAction::Update(_))));
        }
    }

    #[test]
    fn test_pointer_strategy_maps_up_and_cancel_to_end() {
        let strategy = PointerStrategy;
        for event in [RawInputEvent::PointerUp(pointer(0.0)), RawInputEvent::PointerCancel(pointer(0.0))] {
            assert!(matches!(strategy.classify(&event), Some(ContactAction::End(_))));
        }
    }

    #[test]
    fn test_pointer_strategy_ignores_touch_and_resize() {
        let strategy = PointerStrategy;
        assert_eq!(strategy.classify(&RawInputEvent::TouchStart(touch())), None);
        assert_eq!(strategy.classify(&RawInputEvent::Resize(Viewport::default())), None);
    }

    #[test]
    fn test_touch_strategy_maps_touch_events() {
        // Arrange
        let strategy = TouchStrategy;

        // Act
        let start = strategy.classify(&RawInputEvent::TouchStart(touch()));
        let cancel = strategy.classify(&RawInputEvent::TouchCancel(touch()));
        let pointer_down = strategy.classify(&RawInputEvent::PointerDown(pointer(1.0)));

        // Assert
        assert_eq!(start, Some(ContactAction::Update(ContactEvent::Touch(touch()))));
        assert_eq!(cancel, Some(ContactAction::End(ContactEvent::Touch(touch()))));
        assert_eq!(pointer_down, None);
    }

    #[test]
    fn test_select_strategy_matches_mode() {
        assert_eq!(select_strategy(InputMode::Touch).mode(), InputMode::Touch);
        assert_eq!(select_strategy(InputMode::Pointer).mode(), InputMode::Pointer);
    }

    #[test]
    fn test_input_mode_parses_case_insensitively() {
        assert_eq!("Touch".parse::<InputMode>().unwrap(), InputMode::Touch);
        assert_eq!("pointer".parse::<InputMode>().unwrap(), InputMode::Pointer);
        assert!(matches!("mouse".parse::<InputMode>(), Err(CaptureError::UnknownMode(_))));
    }

    #[test]
    fn test_raw_input_event_json_uses_kind_tag() {
        let json = r#"{"kind":"resize","width":800,"height":600,"device_pixel_ratio":2.0}"#;
        let event: RawInputEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            RawInputEvent::Resize(Viewport {
                width: 800,
                height: 600,
                device_pixel_ratio: 2.0,
            })
        );
    }
}
