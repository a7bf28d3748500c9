//! Reconciliation engine: mirrors local-first mutations to the remote store.
//!
//! Every attempt is best-effort and never blocks a user-visible mutation.
//! Create and delete each follow a small explicit state machine:
//!
//! - create: `pending → synced` on success, `pending → sync_failed` on any
//!   failure, `sync_failed → pending` when a retry re-enters the attempt.
//! - delete: the local deletion always stands immediately; an attempted
//!   remote delete that fails is reported so the caller can roll back, while
//!   a delete that cannot be attempted at all leaves a logged divergence.

mod api;

use chrono::Utc;

pub use api::{
    CreateHighlightRequest, DocumentStatsUpdate, HighlightsApi, RemoteHighlight, RemoteHighlights,
};

use crate::auth::{AuthSession, OFFLINE_OWNER};
use crate::models::Highlight;
use crate::util::preview_text;

/// Result of one create-mirror attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The remote store confirmed the record under this canonical id.
    Synced { remote_id: String },
    /// Attempted and failed; the highlight moves to `sync_failed`.
    Failed,
    /// No attempt was made (offline belief or no credential); stays `pending`.
    Deferred,
}

/// Result of one delete-mirror attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The remote store confirmed the delete.
    Deleted,
    /// The highlight never reached the remote store; nothing to mirror.
    LocalOnly,
    /// Attempted and failed; the caller rolls the local deletion back.
    Failed,
    /// No attempt was possible; the local deletion stands and the remote
    /// record is left diverged.
    Diverged,
}

/// Per-document reconciliation state.
///
/// "Online" is a soft belief updated by the outcome of the most recent
/// attempt, not a reachability probe; session-scoped flags live here rather
/// than in any module-level global.
pub struct ReconciliationEngine<R> {
    remote: R,
    session: Option<AuthSession>,
    online: bool,
    document_id: String,
    document_title: String,
}

impl<R: RemoteHighlights> ReconciliationEngine<R> {
    pub fn new(
        remote: R,
        document_id: impl Into<String>,
        document_title: impl Into<String>,
        session: Option<AuthSession>,
    ) -> Self {
        Self {
            remote,
            session,
            // Optimistic until an attempt says otherwise.
            online: true,
            document_id: document_id.into(),
            document_title: document_title.into(),
        }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    #[must_use]
    pub fn document_title(&self) -> &str {
        &self.document_title
    }

    /// The acting owner id: the session user, or the offline sentinel.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        self.session
            .as_ref()
            .map_or(OFFLINE_OWNER, |session| session.user.id.as_str())
    }

    fn record_failure(&mut self, error: &crate::Error) {
        if error.is_connectivity() {
            self.online = false;
        }
    }

    /// Mirror a locally created highlight to the remote store.
    pub async fn create(&mut self, highlight: &Highlight) -> CreateOutcome {
        let Some(session) = self.session.clone() else {
            return CreateOutcome::Deferred;
        };
        if !self.online {
            return CreateOutcome::Deferred;
        }
        let request = CreateHighlightRequest::from_highlight(highlight);
        match self.remote.create(&session.token, &request).await {
            Ok(record) => {
                self.online = true;
                tracing::debug!("Highlight {} synced as {}", highlight.id, record.id);
                CreateOutcome::Synced { remote_id: record.id }
            }
            Err(error) => {
                self.record_failure(&error);
                tracing::warn!(
                    "Could not sync highlight \"{}\": {error}",
                    preview_text(&highlight.text, 50)
                );
                CreateOutcome::Failed
            }
        }
    }

    /// Mirror a local deletion to the remote store.
    pub async fn delete(&mut self, highlight: &Highlight) -> DeleteOutcome {
        let Some(remote_id) = highlight.remote_id.clone() else {
            // Never reached the server; the local removal is the whole story.
            return DeleteOutcome::LocalOnly;
        };
        let session = match &self.session {
            Some(session) if self.online => session.clone(),
            _ => {
                tracing::warn!(
                    "Deleted highlight {} locally while offline; remote record {} remains",
                    highlight.id,
                    remote_id
                );
                return DeleteOutcome::Diverged;
            }
        };
        match self.remote.delete(&session.token, &remote_id).await {
            Ok(()) => {
                self.online = true;
                DeleteOutcome::Deleted
            }
            Err(error) => {
                self.record_failure(&error);
                tracing::warn!("Remote delete of highlight {} failed: {error}", highlight.id);
                DeleteOutcome::Failed
            }
        }
    }

    /// Fetch the server's highlight set for this document on open.
    ///
    /// Returns the converted records on success; on any failure (timeout,
    /// network, non-2xx) returns `None` and flags the session offline - the
    /// document stays fully usable against local state. When the engine
    /// already believes itself offline, a cheap health probe runs first so a
    /// recovered connection is noticed before the bounded fetch.
    pub async fn fetch_remote(&mut self) -> Option<Vec<Highlight>> {
        let Some(session) = self.session.clone() else {
            self.online = false;
            return None;
        };

        if !self.online && !self.remote.health().await {
            tracing::info!("Remote store unreachable; staying in offline mode");
            return None;
        }

        match self
            .remote
            .list(&session.token, &session.user.id, &self.document_id)
            .await
        {
            Ok(records) => {
                self.online = true;
                let owner = session.user.id.as_str();
                Some(
                    records
                        .into_iter()
                        .filter(|record| !record.text.trim().is_empty())
                        .map(|record| record.into_highlight(owner))
                        .collect(),
                )
            }
            Err(error) => {
                self.online = false;
                tracing::warn!("Working offline - could not fetch highlights: {error}");
                None
            }
        }
    }

    /// Best-effort reading-stats upkeep after a successful mirror attempt.
    pub async fn push_stats(&self, highlights_count: usize) {
        let Some(session) = &self.session else {
            return;
        };
        let update = DocumentStatsUpdate {
            user_id: session.user.id.clone(),
            document_id: self.document_id.clone(),
            document_title: self.document_title.clone(),
            last_read_at: Utc::now(),
            highlights_count,
        };
        if let Err(error) = self.remote.update_stats(&session.token, &update).await {
            tracing::debug!("Stats update will sync when server is available: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::error::Error;
    use crate::models::HighlightColor;
    use crate::Result;
    use std::cell::RefCell;

    /// Scripted in-memory remote for engine tests.
    #[derive(Default)]
    struct FakeRemote {
        records: RefCell<Vec<RemoteHighlight>>,
        fail_create: bool,
        fail_delete: bool,
        fail_list: bool,
        connectivity_error: bool,
        healthy: bool,
        calls: RefCell<Vec<&'static str>>,
    }

    impl FakeRemote {
        async fn error(&self) -> Error {
            if self.connectivity_error {
                // An invalid URL yields a genuine reqwest transport error
                // without touching the network.
                let err = reqwest::Client::new().get("http://").send().await.unwrap_err();
                Error::Http(err)
            } else {
                Error::Api("HTTP 500".to_string())
            }
        }
    }

    impl RemoteHighlights for &FakeRemote {
        async fn list(&self, _: &str, _: &str, _: &str) -> Result<Vec<RemoteHighlight>> {
            self.calls.borrow_mut().push("list");
            if self.fail_list {
                return Err(self.error().await);
            }
            Ok(self.records.borrow().clone())
        }

        async fn create(
            &self,
            _: &str,
            request: &CreateHighlightRequest,
        ) -> Result<RemoteHighlight> {
            self.calls.borrow_mut().push("create");
            if self.fail_create {
                return Err(self.error().await);
            }
            let record = RemoteHighlight {
                id: format!("remote-{}", self.records.borrow().len() + 1),
                text: request.text.clone(),
                document_id: request.document_id.clone(),
                document_title: request.document_title.clone(),
                user_id: None,
                color: Some(request.color.name().to_string()),
                created_at: None,
            };
            self.records.borrow_mut().push(record.clone());
            Ok(record)
        }

        async fn delete(&self, _: &str, remote_id: &str) -> Result<()> {
            self.calls.borrow_mut().push("delete");
            if self.fail_delete {
                return Err(self.error().await);
            }
            self.records.borrow_mut().retain(|record| record.id != remote_id);
            Ok(())
        }

        async fn update_stats(&self, _: &str, _: &DocumentStatsUpdate) -> Result<()> {
            self.calls.borrow_mut().push("stats");
            Ok(())
        }

        async fn health(&self) -> bool {
            self.calls.borrow_mut().push("health");
            self.healthy
        }
    }

    fn session() -> AuthSession {
        AuthSession {
            token: "bearer".to_string(),
            user: AuthUser {
                id: "user-1".to_string(),
                name: None,
            },
        }
    }

    fn pending(text: &str) -> Highlight {
        Highlight::new(text, "doc-1", "A Book", "user-1", HighlightColor::Yellow).unwrap()
    }

    #[tokio::test]
    async fn test_create_without_session_is_deferred() {
        let remote = FakeRemote::default();
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", None);

        let outcome = engine.create(&pending("offline excerpt")).await;
        assert_eq!(outcome, CreateOutcome::Deferred);
        assert!(remote.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_create_success_reports_remote_id() {
        let remote = FakeRemote::default();
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        let outcome = engine.create(&pending("excerpt")).await;
        assert_eq!(
            outcome,
            CreateOutcome::Synced {
                remote_id: "remote-1".to_string()
            }
        );
        assert!(engine.is_online());
    }

    #[tokio::test]
    async fn test_create_connectivity_failure_flips_belief_offline() {
        let remote = FakeRemote {
            fail_create: true,
            connectivity_error: true,
            ..FakeRemote::default()
        };
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        assert_eq!(engine.create(&pending("excerpt")).await, CreateOutcome::Failed);
        assert!(!engine.is_online());

        // Further attempts are deferred until something flips belief back.
        let outcome = engine.create(&pending("another")).await;
        assert_eq!(outcome, CreateOutcome::Deferred);
        assert_eq!(remote.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_create_server_error_fails_but_stays_online() {
        let remote = FakeRemote {
            fail_create: true,
            ..FakeRemote::default()
        };
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        assert_eq!(engine.create(&pending("excerpt")).await, CreateOutcome::Failed);
        // The server responded; the connection itself is fine.
        assert!(engine.is_online());
    }

    #[tokio::test]
    async fn test_delete_of_local_only_highlight_skips_network() {
        let remote = FakeRemote::default();
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        let outcome = engine.delete(&pending("never synced")).await;
        assert_eq!(outcome, DeleteOutcome::LocalOnly);
        assert!(remote.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_requests_rollback() {
        let remote = FakeRemote {
            fail_delete: true,
            ..FakeRemote::default()
        };
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        let mut highlight = pending("synced excerpt");
        highlight.remote_id = Some("remote-1".to_string());

        assert_eq!(engine.delete(&highlight).await, DeleteOutcome::Failed);
    }

    #[tokio::test]
    async fn test_delete_without_session_diverges() {
        let remote = FakeRemote::default();
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", None);

        let mut highlight = pending("synced excerpt");
        highlight.remote_id = Some("remote-1".to_string());

        assert_eq!(engine.delete(&highlight).await, DeleteOutcome::Diverged);
        assert!(remote.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_remote_without_session_flags_offline() {
        let remote = FakeRemote::default();
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", None);

        assert!(engine.fetch_remote().await.is_none());
        assert!(!engine.is_online());
        assert_eq!(engine.owner_id(), OFFLINE_OWNER);
    }

    #[tokio::test]
    async fn test_fetch_remote_failure_keeps_document_usable_offline() {
        let remote = FakeRemote {
            fail_list: true,
            ..FakeRemote::default()
        };
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        assert!(engine.fetch_remote().await.is_none());
        assert!(!engine.is_online());
    }

    #[tokio::test]
    async fn test_fetch_remote_probes_health_when_believed_offline() {
        let remote = FakeRemote {
            fail_list: true,
            ..FakeRemote::default()
        };
        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));

        // First fetch fails and flips belief to offline.
        assert!(engine.fetch_remote().await.is_none());
        // Second fetch probes health first; the probe fails, so no fetch runs.
        assert!(engine.fetch_remote().await.is_none());
        assert_eq!(*remote.calls.borrow(), vec!["list", "health"]);
    }

    #[tokio::test]
    async fn test_fetch_remote_converts_and_filters_records() {
        let remote = FakeRemote::default();
        remote.records.borrow_mut().push(RemoteHighlight {
            id: "remote-1".to_string(),
            text: "kept".to_string(),
            document_id: "doc-1".to_string(),
            document_title: "A Book".to_string(),
            user_id: None,
            color: Some("blue".to_string()),
            created_at: None,
        });
        remote.records.borrow_mut().push(RemoteHighlight {
            id: "remote-2".to_string(),
            text: "   ".to_string(),
            document_id: "doc-1".to_string(),
            document_title: "A Book".to_string(),
            user_id: None,
            color: None,
            created_at: None,
        });

        let mut engine = ReconciliationEngine::new(&remote, "doc-1", "A Book", Some(session()));
        let fetched = engine.fetch_remote().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].text, "kept");
        assert_eq!(fetched[0].owner_id, "user-1");
    }
}
