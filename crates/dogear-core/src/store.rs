//! Local-first highlight store.
//!
//! The authoritative state for the currently open document. Every user-visible
//! mutation lands here synchronously before any network attempt; the
//! reconciliation engine only touches it through the same entry points, so
//! there is a single mutation path and no concurrent writer.

use crate::models::{Highlight, HighlightId, SyncStatus};

/// In-memory, session-scoped highlight state for one open document.
#[derive(Debug, Default)]
pub struct LocalStore {
    highlights: Vec<Highlight>,
}

impl LocalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    /// All highlights, newest-created first.
    #[must_use]
    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    #[must_use]
    pub fn get(&self, id: &HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|highlight| highlight.id == *id)
    }

    /// Resolve a highlight by its verbatim text, as highlight-click events
    /// identify spans by text rather than id.
    #[must_use]
    pub fn find_by_text(&self, text: &str) -> Option<&Highlight> {
        self.highlights.iter().find(|highlight| highlight.text == text)
    }

    /// Insert a new highlight at the head of the list.
    ///
    /// Ids are unique within the store at all times; a duplicate insert is
    /// refused and logged rather than creating a second entry.
    pub fn insert_head(&mut self, highlight: Highlight) -> bool {
        if self.get(&highlight.id).is_some() {
            tracing::warn!("Refusing duplicate insert of highlight {}", highlight.id);
            return false;
        }
        self.highlights.insert(0, highlight);
        true
    }

    /// Remove a highlight, returning it together with its position so a
    /// failed remote delete can restore it exactly where it was.
    pub fn remove(&mut self, id: &HighlightId) -> Option<(Highlight, usize)> {
        let position = self
            .highlights
            .iter()
            .position(|highlight| highlight.id == *id)?;
        Some((self.highlights.remove(position), position))
    }

    /// Reinsert a highlight at its prior position (delete rollback).
    ///
    /// The position is clamped to the current length, which only matters if
    /// other highlights were removed while the delete attempt was in flight.
    pub fn insert_at(&mut self, position: usize, highlight: Highlight) -> bool {
        if self.get(&highlight.id).is_some() {
            tracing::warn!("Refusing duplicate reinsert of highlight {}", highlight.id);
            return false;
        }
        let position = position.min(self.highlights.len());
        self.highlights.insert(position, highlight);
        true
    }

    /// Record a confirmed remote create: attach the canonical remote id and
    /// transition `pending`/`sync_failed` → `synced` in place.
    ///
    /// The local id is untouched; only the internal remote-id mapping updates.
    pub fn mark_synced(&mut self, id: &HighlightId, remote_id: impl Into<String>) -> bool {
        let Some(highlight) = self.get_mut(id) else {
            return false;
        };
        if highlight.sync_status == SyncStatus::Synced {
            return false;
        }
        highlight.remote_id = Some(remote_id.into());
        highlight.sync_status = SyncStatus::Synced;
        true
    }

    /// Record a failed remote create; the highlight stays local and retryable.
    pub fn mark_sync_failed(&mut self, id: &HighlightId) -> bool {
        let Some(highlight) = self.get_mut(id) else {
            return false;
        };
        if highlight.sync_status == SyncStatus::Synced {
            return false;
        }
        highlight.sync_status = SyncStatus::SyncFailed;
        true
    }

    /// Re-enter failed creates into the attempt state, returning their ids so
    /// the caller can enqueue fresh attempts.
    pub fn reset_failed_to_pending(&mut self) -> Vec<HighlightId> {
        let mut retried = Vec::new();
        for highlight in &mut self.highlights {
            if highlight.sync_status == SyncStatus::SyncFailed {
                highlight.sync_status = SyncStatus::Pending;
                retried.push(highlight.id);
            }
        }
        retried
    }

    /// Merge the server's highlight set into the store.
    ///
    /// The server is authoritative for synced items: a local synced highlight
    /// absent from `remote` is dropped, and one present is refreshed from the
    /// server record while keeping its local identity. Local `pending` and
    /// `sync_failed` highlights are preserved ahead of the merged set.
    pub fn merge_remote(&mut self, remote: Vec<Highlight>) {
        let locals = std::mem::take(&mut self.highlights);
        let mut merged = Vec::with_capacity(locals.len() + remote.len());
        let mut synced_locals = Vec::new();

        for local in locals {
            match local.sync_status {
                SyncStatus::Pending | SyncStatus::SyncFailed => merged.push(local),
                SyncStatus::Synced => synced_locals.push(local),
            }
        }

        for record in remote {
            let existing = record.remote_id.as_deref().and_then(|remote_id| {
                synced_locals
                    .iter()
                    .position(|local| local.remote_id.as_deref() == Some(remote_id))
            });
            match existing {
                Some(position) => {
                    let local = synced_locals.swap_remove(position);
                    merged.push(Highlight {
                        id: local.id,
                        ..record
                    });
                }
                None => merged.push(record),
            }
        }

        // Whatever is left was deleted remotely out of band.
        for stale in synced_locals {
            tracing::debug!("Dropping remotely deleted highlight {}", stale.id);
        }

        self.highlights = merged;
    }

    /// Session teardown: drop all in-memory state.
    pub fn clear(&mut self) {
        self.highlights.clear();
    }

    fn get_mut(&mut self, id: &HighlightId) -> Option<&mut Highlight> {
        self.highlights
            .iter_mut()
            .find(|highlight| highlight.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HighlightColor;

    fn highlight(text: &str) -> Highlight {
        Highlight::new(text, "doc-1", "A Book", "user-1", HighlightColor::Yellow).unwrap()
    }

    fn synced(text: &str, remote_id: &str) -> Highlight {
        let mut h = highlight(text);
        h.remote_id = Some(remote_id.to_string());
        h.sync_status = SyncStatus::Synced;
        h
    }

    #[test]
    fn test_insert_head_orders_newest_first() {
        let mut store = LocalStore::new();
        store.insert_head(highlight("first"));
        store.insert_head(highlight("second"));

        assert_eq!(store.highlights()[0].text, "second");
        assert_eq!(store.highlights()[1].text, "first");
    }

    #[test]
    fn test_insert_head_refuses_duplicate_id() {
        let mut store = LocalStore::new();
        let h = highlight("once");
        assert!(store.insert_head(h.clone()));
        assert!(!store.insert_head(h));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_reports_position_and_reinsert_restores_it() {
        let mut store = LocalStore::new();
        store.insert_head(highlight("c"));
        store.insert_head(highlight("b"));
        store.insert_head(highlight("a"));

        let middle = store.highlights()[1].id;
        let (removed, position) = store.remove(&middle).unwrap();
        assert_eq!(position, 1);
        assert_eq!(store.len(), 2);

        assert!(store.insert_at(position, removed));
        let texts: Vec<_> = store.highlights().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mark_synced_transitions_once_and_keeps_local_id() {
        let mut store = LocalStore::new();
        let h = highlight("excerpt");
        let id = h.id;
        store.insert_head(h);

        assert!(store.mark_synced(&id, "remote-1"));
        let stored = store.get(&id).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.remote_id.as_deref(), Some("remote-1"));
        assert_eq!(stored.sync_status, SyncStatus::Synced);

        // Second confirmation is a no-op; the transition happens exactly once.
        assert!(!store.mark_synced(&id, "remote-2"));
        assert_eq!(store.get(&id).unwrap().remote_id.as_deref(), Some("remote-1"));
    }

    #[test]
    fn test_mark_sync_failed_keeps_highlight_retryable() {
        let mut store = LocalStore::new();
        let h = highlight("excerpt");
        let id = h.id;
        store.insert_head(h);

        assert!(store.mark_sync_failed(&id));
        assert_eq!(store.get(&id).unwrap().sync_status, SyncStatus::SyncFailed);

        let retried = store.reset_failed_to_pending();
        assert_eq!(retried, vec![id]);
        assert_eq!(store.get(&id).unwrap().sync_status, SyncStatus::Pending);
    }

    #[test]
    fn test_merge_remote_does_not_duplicate_synced_items() {
        let mut store = LocalStore::new();
        let local = synced("shared excerpt", "remote-1");
        let local_id = local.id;
        store.insert_head(local);

        store.merge_remote(vec![synced("shared excerpt", "remote-1")]);

        assert_eq!(store.len(), 1);
        // Displayed identity is the local id even though the record came back
        // from the server.
        assert_eq!(store.highlights()[0].id, local_id);
    }

    #[test]
    fn test_merge_remote_keeps_pending_ahead_and_drops_stale_synced() {
        let mut store = LocalStore::new();
        store.insert_head(synced("deleted elsewhere", "remote-gone"));
        store.insert_head(highlight("still pending"));

        store.merge_remote(vec![synced("from server", "remote-new")]);

        let texts: Vec<_> = store.highlights().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["still pending", "from server"]);
    }

    #[test]
    fn test_find_by_text() {
        let mut store = LocalStore::new();
        store.insert_head(highlight("needle in a haystack"));
        assert!(store.find_by_text("needle in a haystack").is_some());
        assert!(store.find_by_text("absent").is_none());
    }

    #[test]
    fn test_clear() {
        let mut store = LocalStore::new();
        store.insert_head(highlight("gone on teardown"));
        store.clear();
        assert!(store.is_empty());
    }
}
