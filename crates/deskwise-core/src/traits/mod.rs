//! Strategy traits — the seams where the engine swaps implementations.

pub mod semantic;

pub use semantic::{SearchHit, SemanticSearch};
