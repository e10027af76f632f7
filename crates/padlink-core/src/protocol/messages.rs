//! All Padlink outbound message types.
//!
//! Every message travels as one WebSocket text frame holding a JSON object
//! with exactly two keys: `t` (the short type tag) and `d` (the payload).
//! The tag alone tells the receiver how to decode the payload.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::Viewport;

/// Identifier of one active contact, stable for the contact's lifetime.
pub type ContactId = i32;

// ── Message tags ──────────────────────────────────────────────────────────────

/// The fixed mapping from message variant to wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// `d` – viewport dimensions.
    Dimensions,
    /// `tu` – pointer/touch update.
    PointerUpdate,
    /// `te` – pointer/touch end.
    PointerEnd,
}

impl MessageTag {
    /// Returns the tag string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageTag::Dimensions => "d",
            MessageTag::PointerUpdate => "tu",
            MessageTag::PointerEnd => "te",
        }
    }
}

impl std::fmt::Display for MessageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payload structs ───────────────────────────────────────────────────────────

/// DIMENSIONS (`d`): size of the capture surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsData {
    /// Surface width in capture units.
    pub width: i32,
    /// Surface height in capture units.
    pub height: i32,
    /// Capture units per millimetre.
    pub resolution: i32,
}

/// One contact record inside a `tu` payload.
///
/// Field order is the wire key order: `id, x, y, rx, ry, ra, p`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "rx")]
    pub radius_x: f32,
    #[serde(rename = "ry")]
    pub radius_y: f32,
    #[serde(rename = "ra")]
    pub rotation_angle: f32,
    #[serde(rename = "p")]
    pub pressure: f32,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// The closed set of messages the client can put on the wire.
///
/// Serialized adjacently tagged, so `Dimensions` becomes
/// `{"t":"d","d":{"width":..,"height":..,"resolution":..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "d")]
pub enum OutboundMessage {
    #[serde(rename = "d")]
    Dimensions(DimensionsData),

    /// One record per simultaneous contact, in event order.
    #[serde(rename = "tu")]
    PointerUpdate(Vec<Contact>),

    /// Identifiers of the contacts that lifted, in event order.
    #[serde(rename = "te")]
    PointerEnd(Vec<ContactId>),
}

impl OutboundMessage {
    /// Returns the wire tag for this message.
    pub fn tag(&self) -> MessageTag {
        match self {
            OutboundMessage::Dimensions(_) => MessageTag::Dimensions,
            OutboundMessage::PointerUpdate(_) => MessageTag::PointerUpdate,
            OutboundMessage::PointerEnd(_) => MessageTag::PointerEnd,
        }
    }

    /// Builds a `Dimensions` message for the given viewport.
    pub fn dimensions(viewport: &Viewport) -> Self {
        OutboundMessage::Dimensions(viewport.dimensions())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
