//! Rule matcher — tier A.
//!
//! Compares the normalized question against every pattern variant of every
//! role-visible entry: exact equality, substring containment, then
//! token-overlap ratio against a configured threshold. Deterministic:
//! the best overlap wins, ties resolve to the first-declared entry.

use std::sync::Arc;

use deskwise_core::types::{KnowledgeEntry, MatchApproach, MatchResult, Role};

use crate::normalize::{normalize, overlap_ratio, significant_tokens};

#[derive(Clone)]
pub struct RuleMatcher {
    overlap_threshold: f32,
}

impl RuleMatcher {
    pub fn new(overlap_threshold: f32) -> Self {
        Self { overlap_threshold }
    }

    /// Match a question against the entry set. `None` means "defer to the
    /// semantic tier", not failure.
    pub fn match_question(
        &self,
        question: &str,
        role: Role,
        entries: &[Arc<KnowledgeEntry>],
    ) -> Option<MatchResult> {
        let normalized = normalize(question);
        if normalized.is_empty() {
            return None;
        }
        let question_tokens = significant_tokens(question);

        let mut best: Option<(f32, &Arc<KnowledgeEntry>)> = None;
        for entry in entries.iter().filter(|e| e.allows(role)) {
            let mut entry_score = 0.0f32;
            for pattern in &entry.patterns {
                let pattern_norm = normalize(pattern);
                if pattern_norm.is_empty() {
                    continue;
                }
                if pattern_norm == normalized {
                    entry_score = 1.0;
                    break;
                }
                let pattern_tokens = significant_tokens(pattern);
                let overlap = overlap_ratio(&question_tokens, &pattern_tokens);
                let contained = normalized.contains(&pattern_norm)
                    || pattern_norm.contains(&normalized);
                if contained || overlap >= self.overlap_threshold {
                    // Containment clears the gate even with a low ratio;
                    // confidence still reports the actual overlap.
                    let score = if contained {
                        overlap.max(self.overlap_threshold)
                    } else {
                        overlap
                    };
                    entry_score = entry_score.max(score);
                }
            }
            if entry_score > 0.0 {
                // Strict > keeps the first-declared entry on ties.
                match best {
                    Some((s, _)) if s >= entry_score => {}
                    _ => best = Some((entry_score, entry)),
                }
                if entry_score >= 1.0 {
                    break;
                }
            }
        }

        best.map(|(score, entry)| MatchResult {
            answer: entry.answer.clone(),
            approach: MatchApproach::Rule,
            confidence: score.min(1.0),
            entry_id: Some(entry.id.clone()),
            category: Some(entry.category.clone()),
        })
    }
}
