//! Data models for dogear-core

mod color;
mod highlight;

pub use color::HighlightColor;
pub use highlight::{validate_text, Highlight, HighlightId, SyncStatus, MAX_TEXT_CHARS};
