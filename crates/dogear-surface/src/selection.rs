//! Selection normalizer: raw pointer/touch selections to canonical candidates.
//!
//! Pointer-up, touch-end, selection-change and copy signals all funnel into
//! [`SelectionNormalizer::on_selection_signal`]. Bursts coalesce inside a
//! settle window so drag-select does not flood the channel; one
//! `TEXT_SELECTED` is emitted per settled selection, and `SELECTION_CLEARED`
//! fires when the selection empties or a candidate sits idle too long.
//!
//! Everything is deadline-based against caller-supplied instants; the
//! normalizer owns no timers.

use std::time::{Duration, Instant};

use dogear_core::protocol::SandboxEvent;

use crate::document::Document;

/// Settle window for coalescing selection-changed bursts.
pub const SETTLE_WINDOW: Duration = Duration::from_millis(300);

/// Inactivity window after which an unconfirmed candidate expires.
pub const CANDIDATE_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Selections shorter than this are incidental taps, not candidates.
pub const MIN_SELECTION_CHARS: usize = 3;

#[derive(Debug, Clone)]
struct PendingSelection {
    text: String,
    settles_at: Instant,
}

/// Per-surface selection state.
#[derive(Debug, Default)]
pub struct SelectionNormalizer {
    pending: Option<PendingSelection>,
    emitted: Option<String>,
    idle_deadline: Option<Instant>,
}

impl SelectionNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a selection signal against the current document selection.
    ///
    /// Extends the active range to whole-word boundaries (updating the
    /// visible selection to match), trims, applies the noise filter, and
    /// arms the settle window. An emptied selection clears immediately.
    pub fn on_selection_signal(
        &mut self,
        document: &mut Document,
        now: Instant,
    ) -> Option<SandboxEvent> {
        let Some(raw) = document.selection() else {
            return self.clear();
        };

        let Some(extended) = document.extend_to_word_boundaries(raw) else {
            return self.clear();
        };
        // Replace the visual selection so it matches what will be highlighted.
        document.set_selection(extended);

        let text = document.selection_text(extended)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return self.clear();
        }
        if trimmed.chars().count() < MIN_SELECTION_CHARS {
            self.pending = None;
            return None;
        }

        self.pending = Some(PendingSelection {
            text: trimmed.to_string(),
            settles_at: now + SETTLE_WINDOW,
        });
        None
    }

    /// Explicit clear: tap elsewhere, escape key, or programmatic clear.
    pub fn on_selection_cleared(&mut self, document: &mut Document) -> Option<SandboxEvent> {
        document.clear_selection();
        self.clear()
    }

    /// Advance deadlines: emits a settled `TEXT_SELECTED`, or a
    /// `SELECTION_CLEARED` once an unconfirmed candidate has idled out.
    pub fn poll(&mut self, now: Instant) -> Option<SandboxEvent> {
        if let Some(pending) = &self.pending {
            if pending.settles_at <= now {
                let text = pending.text.clone();
                self.pending = None;
                self.emitted = Some(text.clone());
                self.idle_deadline = Some(now + CANDIDATE_IDLE_TIMEOUT);
                return Some(SandboxEvent::TextSelected { text, rect: None });
            }
            return None;
        }

        if self.emitted.is_some() && self.idle_deadline.is_some_and(|deadline| deadline <= now) {
            self.reset();
            return Some(SandboxEvent::SelectionCleared);
        }
        None
    }

    fn clear(&mut self) -> Option<SandboxEvent> {
        let had_activity = self.pending.is_some() || self.emitted.is_some();
        self.reset();
        if had_activity {
            Some(SandboxEvent::SelectionCleared)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.pending = None;
        self.emitted = None;
        self.idle_deadline = None;
    }
}
