//! Embedding index — cosine top-K over entry vectors (primary tier).

use std::sync::Arc;

use async_trait::async_trait;
use rayon::prelude::*;

use deskwise_core::error::{DeskwiseError, Result};
use deskwise_core::traits::{SearchHit, SemanticSearch};
use deskwise_core::types::{KnowledgeEntry, Role};

use crate::embedder::Embedder;

/// Cosine similarity, 0.0 for mismatched or degenerate vectors.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

struct IndexRow {
    entry_id: String,
    role_scope: Vec<Role>,
    vector: Vec<f32>,
}

/// Holds by-id references into the knowledge snapshot plus one vector per
/// entry. Rebuilt wholesale on reload, never mutated.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    rows: Arc<Vec<IndexRow>>,
    dim: usize,
}

impl EmbeddingIndex {
    /// Encode every entry (parallel) and assemble the index. Entries with a
    /// precomputed vector of the right dimension skip the encoder.
    pub fn build(embedder: Arc<dyn Embedder>, entries: &[Arc<KnowledgeEntry>]) -> Result<Self> {
        if entries.is_empty() {
            return Err(DeskwiseError::EmbeddingUnavailable(
                "Cannot index an empty knowledge set".into(),
            ));
        }
        let dim = embedder.dimension();
        let rows: Result<Vec<IndexRow>> = entries
            .par_iter()
            .map(|entry| {
                let vector = match &entry.embedding {
                    Some(v) if v.len() == dim => v.clone(),
                    _ => embedder.encode(&entry.indexable_text())?,
                };
                Ok(IndexRow {
                    entry_id: entry.id.clone(),
                    role_scope: entry.role_scope.clone(),
                    vector,
                })
            })
            .collect();
        let rows = rows?;
        tracing::debug!("Embedding index built: {} rows, dim={dim}", rows.len());
        Ok(Self {
            embedder,
            rows: Arc::new(rows),
            dim,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SemanticSearch for EmbeddingIndex {
    fn name(&self) -> &str {
        "embedding-index"
    }

    async fn search(&self, question: &str, role: Role, top_k: usize) -> Result<Vec<SearchHit>> {
        let embedder = self.embedder.clone();
        let rows = self.rows.clone();
        let question = question.to_string();
        // Encoding + scan are CPU-bound; keep them off the async workers so
        // concurrent queries are never blocked behind each other.
        let hits = tokio::task::spawn_blocking(move || -> Result<Vec<SearchHit>> {
            let query = embedder.encode(&question)?;
            let mut scored: Vec<SearchHit> = rows
                .iter()
                .filter(|row| row.role_scope.contains(&role))
                .map(|row| SearchHit {
                    entry_id: row.entry_id.clone(),
                    score: cosine_similarity(&query, &row.vector),
                })
                .collect();
            scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(top_k);
            Ok(scored)
        })
        .await
        .map_err(|e| DeskwiseError::Internal(format!("search task failed: {e}")))??;
        Ok(hits)
    }
}
