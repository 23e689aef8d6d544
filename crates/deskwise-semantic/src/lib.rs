//! # Deskwise Semantic
//!
//! Tier B of the answering pipeline, in two interchangeable variants:
//! - **Embedding index** — word-vector sentence embeddings + cosine top-K
//!   (primary), backed by a memory-mapped vector table.
//! - **Lexical engine** — tf-idf token similarity (fallback), zero model
//!   dependency, same external contract.
//!
//! The [`router::ServiceRouter`] decides at startup and on failure which
//! variant serves traffic. Once degraded to the fallback, the mode is
//! monotonic until an explicit reload re-attempts the embedding tier.

pub mod embedder;
pub mod index;
pub mod lexical;
pub mod router;

pub use embedder::{Embedder, WordVecEmbedder};
pub use index::EmbeddingIndex;
pub use lexical::LexicalEngine;
pub use router::{MatchCandidate, ServiceRouter};
