//! Surface runtime: dispatches host commands and forwards normalizer events.
//!
//! This is the sandbox side of the channel. Commands arrive as raw JSON and
//! are applied best-effort; events leave through the `postMessage`-style
//! [`EventSink`]. Malformed command payloads are dropped silently, mirroring
//! the host's tolerance for unrelated surface diagnostics.

use std::time::Instant;

use dogear_core::protocol::{decode_command, EventSink, HostCommand, SandboxEvent};

use crate::document::{Document, RawSelection};
use crate::painter::{self, LocateOutcome};
use crate::selection::SelectionNormalizer;

pub struct SurfaceRuntime<E> {
    document: Document,
    normalizer: SelectionNormalizer,
    events: E,
    /// Text last scrolled-to-and-flashed, kept for inspection.
    flashed: Option<String>,
}

impl<E: EventSink> SurfaceRuntime<E> {
    pub fn new(document: Document, events: E) -> Self {
        Self {
            document,
            normalizer: SelectionNormalizer::new(),
            events,
            flashed: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn last_flashed(&self) -> Option<&str> {
        self.flashed.as_deref()
    }

    /// Entry point for raw injected commands.
    pub fn handle_raw_command(&mut self, raw: &str) {
        if let Some(command) = decode_command(raw) {
            self.apply(command);
        }
    }

    /// Apply a decoded host command. Never fails; paint misses are no-ops.
    pub fn apply(&mut self, command: HostCommand) {
        match command {
            HostCommand::AddHighlight { text, color } => {
                if !painter::add_highlight(&mut self.document, &text, color) {
                    tracing::debug!("addHighlight: text not found, nothing painted");
                }
            }
            HostCommand::RemoveHighlight { text } => {
                painter::remove_highlight(&mut self.document, &text);
            }
            HostCommand::LoadHighlights { highlights } => {
                painter::load_highlights(&mut self.document, &highlights);
            }
            HostCommand::LocateHighlight { text } => {
                match painter::locate_highlight(&self.document, &text) {
                    LocateOutcome::Span | LocateOutcome::TextSearch => {
                        self.flashed = Some(text);
                    }
                    LocateOutcome::NotFound => {}
                }
            }
        }
    }

    /// A pointer/touch/copy selection signal with the given active range.
    pub fn select(&mut self, selection: RawSelection, now: Instant) {
        self.document.set_selection(selection);
        let event = self.normalizer.on_selection_signal(&mut self.document, now);
        self.emit(event);
    }

    /// Tap elsewhere, escape key, or programmatic selection clear.
    pub fn clear_selection(&mut self) {
        let event = self.normalizer.on_selection_cleared(&mut self.document);
        self.emit(event);
    }

    /// Advance normalizer deadlines (settle window, idle expiry).
    pub fn tick(&mut self, now: Instant) {
        let event = self.normalizer.poll(now);
        self.emit(event);
    }

    /// A tap on a painted span; emits `HIGHLIGHT_CLICKED` when one carries
    /// the text.
    pub fn click_highlight(&mut self, text: &str) {
        let Some(color) = painter::span_color(&self.document, text) else {
            return;
        };
        self.events.post(&SandboxEvent::HighlightClicked {
            text: text.to_string(),
            color,
        });
    }

    fn emit(&mut self, event: Option<SandboxEvent>) {
        if let Some(event) = event {
            self.events.post(&event);
        }
    }
}
