//! The message protocol crossing the sandbox/host isolation boundary.
//!
//! Every interaction between the host and the embedded document surface is a
//! flat, JSON-serialized envelope sent over an asynchronous, fire-and-forget
//! channel. Events flow sandbox → host; commands flow host → sandbox. There
//! is no request/response correlation and no acknowledgment in either
//! direction.
//!
//! The channel is shared with unrelated sandbox diagnostics, so inbound
//! payloads that fail to decode are dropped silently rather than treated as
//! protocol errors.

use serde::{Deserialize, Serialize};

use crate::models::HighlightColor;

/// Viewport rectangle of a selection, reported by the surface when available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Events emitted by the document surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SandboxEvent {
    /// A settled, word-aligned text selection.
    #[serde(rename = "TEXT_SELECTED")]
    TextSelected {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rect: Option<SelectionRect>,
    },
    /// The active selection became empty or expired.
    #[serde(rename = "SELECTION_CLEARED")]
    SelectionCleared,
    /// The user tapped a painted highlight span.
    #[serde(rename = "HIGHLIGHT_CLICKED")]
    HighlightClicked { text: String, color: HighlightColor },
}

/// A `{text, color}` pair for batched highlight restoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRef {
    pub text: String,
    pub color: HighlightColor,
}

/// Commands the host issues to the document surface.
///
/// These are unacknowledged procedure invocations; the surface applies them
/// best-effort and never reports failure back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostCommand {
    /// Paint the first occurrence of `text` in the given palette color.
    AddHighlight { text: String, color: HighlightColor },
    /// Unpaint every span carrying exactly `text`.
    RemoveHighlight { text: String },
    /// Batched restoration after a document (re)load.
    LoadHighlights { highlights: Vec<HighlightRef> },
    /// Scroll the span carrying `text` into view and flash it.
    LocateHighlight { text: String },
}

/// Decode an inbound surface message.
///
/// Returns `None` for anything that is not one of the known envelopes; the
/// surface posts unrelated diagnostics on the same channel.
#[must_use]
pub fn decode_event(raw: &str) -> Option<SandboxEvent> {
    match serde_json::from_str(raw) {
        Ok(event) => Some(event),
        Err(error) => {
            tracing::debug!("Ignoring undecodable surface message: {error}");
            None
        }
    }
}

/// Decode an inbound host command on the surface side.
///
/// Mirrors [`decode_event`]: malformed command payloads are dropped, never
/// surfaced as errors inside the sandbox.
#[must_use]
pub fn decode_command(raw: &str) -> Option<HostCommand> {
    match serde_json::from_str(raw) {
        Ok(command) => Some(command),
        Err(error) => {
            tracing::debug!("Ignoring undecodable host command: {error}");
            None
        }
    }
}

/// Serialize an event for the `postMessage`-style primitive.
pub fn encode_event(event: &SandboxEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

/// Serialize a command for injection into the surface.
pub fn encode_command(command: &HostCommand) -> serde_json::Result<String> {
    serde_json::to_string(command)
}

/// Host-side transport primitive for issuing commands into the sandbox.
pub trait CommandSink {
    fn send(&mut self, command: &HostCommand);
}

/// Sandbox-side transport primitive for posting events to the host.
pub trait EventSink {
    fn post(&mut self, event: &SandboxEvent);
}
