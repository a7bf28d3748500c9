//! Host-side annotation controller for one open document.
//!
//! Owns the in-memory highlight state, interprets channel events from the
//! document surface, drives the painter via commands, and hands mutations to
//! the reconciliation engine. All user-visible mutations are synchronous
//! against the local store; network effects drain through [`Self::drain_sync`]
//! and never block or roll back a create.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::models::{Highlight, HighlightColor, HighlightId};
use crate::protocol::{decode_event, CommandSink, HighlightRef, HostCommand, SandboxEvent};
use crate::store::LocalStore;
use crate::sync::{CreateOutcome, DeleteOutcome, ReconciliationEngine, RemoteHighlights};
use crate::util::preview_text;

/// How long a selection candidate survives without further activity.
pub const SELECTION_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum candidate length; shorter selections are incidental taps.
const MIN_CANDIDATE_CHARS: usize = 3;

/// Non-blocking notices for the enclosing UI, drained via
/// [`AnnotationController::take_notices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The user tapped a painted highlight; offer remove/locate actions.
    HighlightTapped { id: HighlightId },
    /// A remote delete failed and the highlight was restored locally.
    RemoveFailed { id: HighlightId, preview: String },
}

/// A settled selection waiting for user confirmation.
#[derive(Debug, Clone)]
struct SelectionCandidate {
    text: String,
    expires_at: Instant,
}

enum SyncOp {
    Create { id: HighlightId },
    Delete { highlight: Highlight, position: usize },
}

pub struct AnnotationController<R, C> {
    store: LocalStore,
    engine: ReconciliationEngine<R>,
    commands: C,
    queue: VecDeque<SyncOp>,
    candidate: Option<SelectionCandidate>,
    notices: Vec<Notice>,
}

impl<R: RemoteHighlights, C: CommandSink> AnnotationController<R, C> {
    pub fn new(engine: ReconciliationEngine<R>, commands: C) -> Self {
        Self {
            store: LocalStore::new(),
            engine,
            commands,
            queue: VecDeque::new(),
            candidate: None,
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.engine.is_online()
    }

    /// The current selection candidate, if one is active.
    #[must_use]
    pub fn candidate(&self) -> Option<&str> {
        self.candidate.as_ref().map(|candidate| candidate.text.as_str())
    }

    /// Drain accumulated non-blocking notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Entry point for raw surface messages; undecodable payloads are dropped.
    pub fn on_raw_message(&mut self, raw: &str) {
        if let Some(event) = decode_event(raw) {
            self.on_channel_event(event);
        }
    }

    /// Dispatch a decoded channel event.
    pub fn on_channel_event(&mut self, event: SandboxEvent) {
        match event {
            SandboxEvent::TextSelected { text, .. } => {
                let trimmed = text.trim();
                if trimmed.chars().count() < MIN_CANDIDATE_CHARS {
                    return;
                }
                self.candidate = Some(SelectionCandidate {
                    text: trimmed.to_string(),
                    expires_at: Instant::now() + SELECTION_IDLE_TIMEOUT,
                });
            }
            SandboxEvent::SelectionCleared => {
                self.candidate = None;
            }
            SandboxEvent::HighlightClicked { text, .. } => {
                if let Some(highlight) = self.store.find_by_text(&text) {
                    self.notices.push(Notice::HighlightTapped { id: highlight.id });
                }
            }
        }
    }

    /// Clear a candidate whose inactivity window has elapsed, as if
    /// `SELECTION_CLEARED` had fired. Called from the host loop's tick.
    pub fn expire_stale_candidate(&mut self, now: Instant) {
        if self
            .candidate
            .as_ref()
            .is_some_and(|candidate| candidate.expires_at <= now)
        {
            self.candidate = None;
        }
    }

    /// Create a highlight from confirmed text.
    ///
    /// The highlight lands in the local store and the painter immediately;
    /// the remote mirror attempt is enqueued and this returns without
    /// awaiting any network work. `color` accepts a palette name or a fill
    /// hex value (as color pickers supply).
    pub fn confirm_highlight(&mut self, text: &str, color: &str) -> Result<Highlight> {
        let highlight = Highlight::new(
            text,
            self.engine.document_id(),
            self.engine.document_title(),
            self.engine.owner_id(),
            HighlightColor::parse(color),
        )?;

        self.store.insert_head(highlight.clone());
        self.candidate = None;
        self.commands.send(&HostCommand::AddHighlight {
            text: highlight.text.clone(),
            color: highlight.color,
        });
        self.queue.push_back(SyncOp::Create { id: highlight.id });
        Ok(highlight)
    }

    /// Optimistically delete a highlight.
    ///
    /// The local removal and unpaint happen now; the remote delete is
    /// enqueued. If that attempt later fails, the highlight is restored at
    /// its exact prior position and a [`Notice::RemoveFailed`] is emitted.
    pub fn remove_highlight(&mut self, id: &HighlightId) -> Result<()> {
        let (highlight, position) = self
            .store
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.commands.send(&HostCommand::RemoveHighlight {
            text: highlight.text.clone(),
        });
        self.queue.push_back(SyncOp::Delete { highlight, position });
        Ok(())
    }

    /// Ask the surface to scroll a highlight into view and flash it.
    ///
    /// Resolution is by text match; the surface falls back to its native
    /// text search when no painted span carries the text anymore.
    pub fn locate_highlight(&mut self, id: &HighlightId) -> Result<()> {
        let highlight = self
            .store
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.commands.send(&HostCommand::LocateHighlight {
            text: highlight.text.clone(),
        });
        Ok(())
    }

    /// Repaint the full store contents after the document finishes rendering.
    pub fn restore_all(&mut self) {
        let highlights = self
            .store
            .highlights()
            .iter()
            .map(|highlight| HighlightRef {
                text: highlight.text.clone(),
                color: highlight.color,
            })
            .collect();
        self.commands.send(&HostCommand::LoadHighlights { highlights });
    }

    /// Document-open flow: fetch-and-merge, opportunistic retry, repaint.
    ///
    /// The fetch is bounded and failure-tolerant; the store is left as-is
    /// when the remote set cannot be read, and the document stays usable.
    pub async fn open_document(&mut self) {
        if let Some(remote) = self.engine.fetch_remote().await {
            self.store.merge_remote(remote);
        }
        for id in self.store.reset_failed_to_pending() {
            self.queue.push_back(SyncOp::Create { id });
        }
        self.drain_sync().await;
        self.restore_all();
    }

    /// Process enqueued mirror attempts, applying outcomes through the
    /// store's synchronous mutation entry points.
    ///
    /// Called opportunistically by the host loop; a queue left undrained only
    /// delays reconciliation, never correctness of local state.
    pub async fn drain_sync(&mut self) {
        while let Some(op) = self.queue.pop_front() {
            match op {
                SyncOp::Create { id } => {
                    // The highlight may have been removed before the attempt
                    // ran; skipping here is what keeps create/delete ordered
                    // per highlight.
                    let Some(highlight) = self.store.get(&id).cloned() else {
                        continue;
                    };
                    match self.engine.create(&highlight).await {
                        CreateOutcome::Synced { remote_id } => {
                            self.store.mark_synced(&id, remote_id);
                            self.engine.push_stats(self.store.len()).await;
                        }
                        CreateOutcome::Failed => {
                            self.store.mark_sync_failed(&id);
                        }
                        CreateOutcome::Deferred => {}
                    }
                }
                SyncOp::Delete { highlight, position } => {
                    match self.engine.delete(&highlight).await {
                        DeleteOutcome::Deleted => {
                            self.engine.push_stats(self.store.len()).await;
                        }
                        DeleteOutcome::LocalOnly | DeleteOutcome::Diverged => {}
                        DeleteOutcome::Failed => {
                            let preview = preview_text(&highlight.text, 50);
                            let id = highlight.id;
                            let color = highlight.color;
                            let text = highlight.text.clone();
                            if self.store.insert_at(position, highlight) {
                                // Restore the cosmetic span as well.
                                self.commands.send(&HostCommand::AddHighlight { text, color });
                            }
                            self.notices.push(Notice::RemoveFailed { id, preview });
                        }
                    }
                }
            }
        }
    }

    /// Session teardown: drop all per-document state. In-flight fetches are
    /// abandoned by dropping their futures; nothing is merged afterwards.
    pub fn close_document(&mut self) {
        self.store.clear();
        self.queue.clear();
        self.candidate = None;
        self.notices.clear();
    }
}
