//! Highlight model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::HighlightColor;

/// Maximum accepted highlight text length, in characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// A unique identifier for a highlight, using UUID v7 (time-sortable).
///
/// This is the highlight's local identity. It is assigned at creation and
/// never changes, even after the remote collaborator assigns its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightId(Uuid);

impl HighlightId {
    /// Create a new unique highlight ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for HighlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HighlightId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Per-highlight reconciliation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Exists locally only; no remote attempt has succeeded yet.
    #[default]
    Pending,
    /// Confirmed by the remote collaborator.
    Synced,
    /// A remote attempt was made and failed; eligible for retry.
    SyncFailed,
}

/// A user annotation over a verbatim text excerpt of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Local identity, stable for the highlight's lifetime
    pub id: HighlightId,
    /// Canonical id assigned by the remote collaborator once synced
    pub remote_id: Option<String>,
    /// Normalized (word-boundary-extended, trimmed) excerpt. Immutable after creation.
    pub text: String,
    /// Owning document
    pub document_id: String,
    pub document_title: String,
    /// Acting user, or the offline sentinel when no session exists
    pub owner_id: String,
    pub color: HighlightColor,
    pub created_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
}

impl Highlight {
    /// Create a new local highlight in the `Pending` state.
    ///
    /// Fails with a validation error when the text is empty, whitespace-only,
    /// or longer than [`MAX_TEXT_CHARS`] characters. The stored text is the
    /// trimmed candidate.
    pub fn new(
        text: &str,
        document_id: impl Into<String>,
        document_title: impl Into<String>,
        owner_id: impl Into<String>,
        color: HighlightColor,
    ) -> Result<Self> {
        let text = validate_text(text)?;
        Ok(Self {
            id: HighlightId::new(),
            remote_id: None,
            text,
            document_id: document_id.into(),
            document_title: document_title.into(),
            owner_id: owner_id.into(),
            color,
            created_at: Utc::now(),
            sync_status: SyncStatus::Pending,
        })
    }
}

/// Validate and normalize candidate highlight text.
pub fn validate_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(
            "highlight text must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TEXT_CHARS {
        return Err(Error::Validation(format!(
            "highlight text exceeds {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str) -> Result<Highlight> {
        Highlight::new(text, "doc-1", "A Book", "user-1", HighlightColor::Yellow)
    }

    #[test]
    fn test_highlight_id_unique() {
        let id1 = HighlightId::new();
        let id2 = HighlightId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_highlight_id_parse() {
        let id = HighlightId::new();
        let parsed: HighlightId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_new_highlight_starts_pending() {
        let highlight = sample("the quick brown fox").unwrap();
        assert_eq!(highlight.sync_status, SyncStatus::Pending);
        assert!(highlight.remote_id.is_none());
        assert_eq!(highlight.text, "the quick brown fox");
    }

    #[test]
    fn test_new_highlight_trims_text() {
        let highlight = sample("  spaced out  ").unwrap();
        assert_eq!(highlight.text, "spaced out");
    }

    #[test]
    fn test_rejects_empty_and_whitespace_text() {
        assert!(sample("").is_err());
        assert!(sample("   \n\t").is_err());
    }

    #[test]
    fn test_rejects_oversized_text() {
        let long = "x".repeat(MAX_TEXT_CHARS + 1);
        assert!(sample(&long).is_err());
        let max = "x".repeat(MAX_TEXT_CHARS);
        assert!(sample(&max).is_ok());
    }

    #[test]
    fn test_sync_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::SyncFailed).unwrap(),
            "\"sync_failed\""
        );
        assert_eq!(
            serde_json::to_string(&SyncStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
