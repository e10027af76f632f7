//! Raw contact samples and their conversion into outbound messages.
//!
//! Two input APIs produce contacts:
//!
//! - A **pointer** event describes exactly one contact, so it always yields a
//!   one-element sequence.
//! - A **touch** event lists every contact that changed, so it yields one
//!   record per changed contact.
//!
//! Order is whatever the event enumerates; nothing is re-sorted.

use serde::{Deserialize, Serialize};

use crate::protocol::messages::{Contact, ContactId, OutboundMessage};

/// One pointer-API event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerSample {
    pub pointer_id: ContactId,
    /// X relative to the capture surface.
    pub offset_x: f64,
    /// Y relative to the capture surface.
    pub offset_y: f64,
    /// Contact width; reported as the X radius.
    pub width: f32,
    /// Contact height; reported as the Y radius.
    pub height: f32,
    /// Normalised pressure in `[0, 1]`. Zero means hover.
    pub pressure: f32,
}

/// One changed contact inside a touch-API event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TouchPoint {
    pub identifier: ContactId,
    pub client_x: f64,
    pub client_y: f64,
    pub radius_x: f32,
    pub radius_y: f32,
    pub rotation_angle: f32,
    pub force: f32,
}

/// One touch-API event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TouchSample {
    /// The contacts that changed in this event, in event order.
    pub changed_touches: Vec<TouchPoint>,
}

/// A contact event from either input API.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactEvent {
    Pointer(PointerSample),
    Touch(TouchSample),
}

impl ContactEvent {
    /// The contact records carried by this event.
    pub fn contacts(&self) -> Vec<Contact> {
        match self {
            ContactEvent::Pointer(p) => vec![Contact::from(p)],
            ContactEvent::Touch(t) => t.changed_touches.iter().map(Contact::from).collect(),
        }
    }

    /// The identifiers of the contacts carried by this event.
    pub fn contact_ids(&self) -> Vec<ContactId> {
        match self {
            ContactEvent::Pointer(p) => vec![p.pointer_id],
            ContactEvent::Touch(t) => t.changed_touches.iter().map(|t| t.identifier).collect(),
        }
    }

    /// Builds a `PointerUpdate` message from this event.
    pub fn update_message(&self) -> OutboundMessage {
        OutboundMessage::PointerUpdate(self.contacts())
    }

    /// Builds a `PointerEnd` message from this event.
    pub fn end_message(&self) -> OutboundMessage {
        OutboundMessage::PointerEnd(self.contact_ids())
    }

    /// `true` for a pointer that is hovering rather than touching.
    pub fn is_hover(&self) -> bool {
        matches!(self, ContactEvent::Pointer(p) if p.pressure == 0.0)
    }
}

impl From<&PointerSample> for Contact {
    fn from(p: &PointerSample) -> Self {
        Contact {
            id: p.pointer_id,
            x: p.offset_x,
            y: p.offset_y,
            radius_x: p.width,
            radius_y: p.height,
            // Pointer events carry no rotation.
            rotation_angle: 0.0,
            pressure: p.pressure,
        }
    }
}

impl From<&TouchPoint> for Contact {
    fn from(t: &TouchPoint) -> Self {
        Contact {
            id: t.identifier,
            x: t.client_x,
            y: t.client_y,
            radius_x: t.radius_x,
            radius_y: t.radius_y,
            rotation_angle: t.rotation_angle,
            pressure: t.force,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
