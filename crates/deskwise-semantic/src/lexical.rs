//! Lexical fallback engine — tf-idf token similarity (fallback tier).
//!
//! Approximates the embedding index with no model dependency: entry and
//! question become idf-weighted token vectors, similarity is their cosine.
//! Same contract as the embedding index, reduced precision.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use deskwise_core::error::{DeskwiseError, Result};
use deskwise_core::traits::{SearchHit, SemanticSearch};
use deskwise_core::types::{KnowledgeEntry, Role};

use deskwise_match::significant_tokens;

struct LexRow {
    entry_id: String,
    role_scope: Vec<Role>,
    /// token → tf·idf weight
    weights: HashMap<String, f32>,
    norm: f32,
}

pub struct LexicalEngine {
    rows: Vec<LexRow>,
    /// Corpus idf per token; unseen question tokens get `default_idf`.
    idf: HashMap<String, f32>,
    default_idf: f32,
}

impl LexicalEngine {
    pub fn build(entries: &[Arc<KnowledgeEntry>]) -> Result<Self> {
        if entries.is_empty() {
            return Err(DeskwiseError::ServiceUnavailable(
                "Cannot build lexical engine over an empty knowledge set".into(),
            ));
        }

        // Document frequency over entry texts.
        let mut df: HashMap<String, usize> = HashMap::new();
        let tokenized: Vec<Vec<String>> = entries
            .iter()
            .map(|e| significant_tokens(&e.indexable_text()))
            .collect();
        for tokens in &tokenized {
            let mut seen = std::collections::HashSet::new();
            for t in tokens {
                if seen.insert(t.as_str()) {
                    *df.entry(t.clone()).or_insert(0) += 1;
                }
            }
        }
        let n = entries.len() as f32;
        let idf: HashMap<String, f32> = df
            .into_iter()
            .map(|(t, d)| (t, (1.0 + n / d as f32).ln()))
            .collect();
        let default_idf = (1.0 + n).ln();

        let rows = entries
            .iter()
            .zip(tokenized)
            .map(|(entry, tokens)| {
                let mut tf: HashMap<String, f32> = HashMap::new();
                for t in tokens {
                    *tf.entry(t).or_insert(0.0) += 1.0;
                }
                let weights: HashMap<String, f32> = tf
                    .into_iter()
                    .map(|(t, count)| {
                        let w = (1.0 + count.ln()) * idf.get(&t).copied().unwrap_or(default_idf);
                        (t, w)
                    })
                    .collect();
                let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
                LexRow {
                    entry_id: entry.id.clone(),
                    role_scope: entry.role_scope.clone(),
                    weights,
                    norm,
                }
            })
            .collect();

        Ok(Self {
            rows,
            idf,
            default_idf,
        })
    }

    fn score(&self, question_weights: &HashMap<String, f32>, q_norm: f32, row: &LexRow) -> f32 {
        if q_norm == 0.0 || row.norm == 0.0 {
            return 0.0;
        }
        let dot: f32 = question_weights
            .iter()
            .filter_map(|(t, wq)| row.weights.get(t).map(|wr| wq * wr))
            .sum();
        dot / (q_norm * row.norm)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SemanticSearch for LexicalEngine {
    fn name(&self) -> &str {
        "lexical-fallback"
    }

    async fn search(&self, question: &str, role: Role, top_k: usize) -> Result<Vec<SearchHit>> {
        let tokens = significant_tokens(question);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut tf: HashMap<String, f32> = HashMap::new();
        for t in tokens {
            *tf.entry(t).or_insert(0.0) += 1.0;
        }
        let weights: HashMap<String, f32> = tf
            .into_iter()
            .map(|(t, count)| {
                let w = (1.0 + count.ln()) * self.idf.get(&t).copied().unwrap_or(self.default_idf);
                (t, w)
            })
            .collect();
        let q_norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();

        let mut scored: Vec<SearchHit> = self
            .rows
            .iter()
            .filter(|row| row.role_scope.contains(&role))
            .map(|row| SearchHit {
                entry_id: row.entry_id.clone(),
                score: self.score(&weights, q_norm, row),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, patterns: &[&str]) -> Arc<KnowledgeEntry> {
        Arc::new(KnowledgeEntry {
            id: id.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            canonical_question: patterns[0].to_string(),
            answer: format!("réponse {id}"),
            category: "test".to_string(),
            role_scope: vec![Role::Admin, Role::Enterprise],
            embedding: None,
        })
    }

    #[tokio::test]
    async fn related_question_outranks_unrelated() {
        let engine = LexicalEngine::build(&[
            entry("conges", &["solde de congés", "combien de congés me reste-t-il"]),
            entry("rapport", &["générer un rapport pdf"]),
        ])
        .unwrap();

        let hits = engine
            .search("quel est mon solde de congés ?", Role::Enterprise, 2)
            .await
            .unwrap();
        assert_eq!(hits[0].entry_id, "conges");
        assert!(hits[0].score > 0.35, "score: {}", hits[0].score);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn zero_overlap_scores_near_zero() {
        let engine = LexicalEngine::build(&[entry("conges", &["solde de congés"])]).unwrap();
        let hits = engine
            .search("météo à Lyon demain", Role::Admin, 1)
            .await
            .unwrap();
        assert!(hits[0].score < 0.01);
    }

    #[tokio::test]
    async fn scores_bounded_by_one() {
        let engine = LexicalEngine::build(&[entry("conges", &["solde de congés"])]).unwrap();
        let hits = engine.search("solde de congés", Role::Admin, 1).await.unwrap();
        assert!(hits[0].score > 0.99 && hits[0].score <= 1.0 + 1e-5);
    }

    #[test]
    fn empty_set_fails_build() {
        assert!(LexicalEngine::build(&[]).is_err());
    }
}
