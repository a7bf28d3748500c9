//! dogear-surface - Sandbox-side document runtime for Dogear
//!
//! Runs inside the embedded document surface, isolated from the host: the
//! document node model, the selection normalizer, and the highlight painter.
//! All communication with the host crosses the JSON message channel defined
//! in `dogear-core::protocol`.

pub mod document;
pub mod painter;
pub mod runtime;
pub mod selection;

pub use document::{Document, Element, Node, RawSelection, SelectionPoint};
pub use runtime::SurfaceRuntime;
