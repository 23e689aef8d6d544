//! The semantic search contract shared by the embedding index and the
//! lexical fallback engine. Callers cannot tell which variant answered
//! except via `name()` and the approach tag on the final result.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Role;

/// One ranked candidate from a semantic search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub entry_id: String,
    /// Similarity in [0, 1], higher is better.
    pub score: f32,
}

#[async_trait]
pub trait SemanticSearch: Send + Sync {
    /// Implementation tag, used only for observability.
    fn name(&self) -> &str;

    /// Rank entries visible to `role` against `question`, best first.
    /// An empty result set is a normal outcome, not an error.
    async fn search(&self, question: &str, role: Role, top_k: usize) -> Result<Vec<SearchHit>>;
}
