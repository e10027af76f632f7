//! JSON envelope codec for Padlink messages.
//!
//! Wire format (one text frame per message):
//! ```text
//! {"t":"<tag>","d":<payload>}
//! ```
//! The output is compact (no whitespace), `t` always precedes `d`, and payload
//! keys follow struct declaration order, so the same message always encodes to
//! the same text.

use thiserror::Error;

use crate::protocol::messages::OutboundMessage;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The serializer rejected the message.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The text is not a valid envelope: bad JSON, unknown tag, or a payload
    /// that does not match the tag.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`OutboundMessage`] into its canonical text form.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails. The message types
/// contain only numbers and sequences, so this does not happen in practice.
///
/// # Examples
///
/// ```rust
/// use padlink_core::{encode_message, DimensionsData, OutboundMessage};
///
/// let msg = OutboundMessage::Dimensions(DimensionsData { width: 800, height: 600, resolution: 157 });
/// assert_eq!(
///     encode_message(&msg).unwrap(),
///     r#"{"t":"d","d":{"width":800,"height":600,"resolution":157}}"#
/// );
/// ```
pub fn encode_message(msg: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

/// Decodes one envelope back into an [`OutboundMessage`].
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the text is not valid JSON, the tag
/// is unknown, or the payload shape does not match the tag.
pub fn decode_message(text: &str) -> Result<OutboundMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
