//! # Deskwise Knowledge Base
//!
//! In-memory curated Q&A entry set, loaded from a JSON source file (or the
//! built-in set) at startup and on explicit reload.
//!
//! ## Design
//! - **Validate fully, publish once** — a reload builds the complete new
//!   entry set before a single `Arc` swap; readers never see a half-loaded
//!   state, and a failed reload keeps the previous snapshot.
//! - **Immutable entries** — matchers hold by-id references into the
//!   snapshot, never ownership.
//! - RAM: a few hundred KB for a typical curated set.

pub mod builtin;
pub mod source;
pub mod store;

pub use store::{KnowledgeSource, KnowledgeStore};
