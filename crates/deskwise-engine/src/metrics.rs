//! Engine metrics — lock-free counters per approach plus response-time
//! aggregates, snapshotted for the admin surface.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use deskwise_core::types::MatchApproach;

#[derive(Default)]
pub struct EngineMetrics {
    total: AtomicU64,
    rule: AtomicU64,
    embedding: AtomicU64,
    fallback: AtomicU64,
    unmatched: AtomicU64,
    errors: AtomicU64,
    cache_hits: AtomicU64,
    validation_rejects: AtomicU64,
    response_time_total_ms: AtomicU64,
}

/// Point-in-time counter values.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub rule: u64,
    pub embedding: u64,
    pub fallback: u64,
    pub unmatched: u64,
    pub errors: u64,
    pub cache_hits: u64,
    pub validation_rejects: u64,
    pub avg_response_time_ms: f64,
    /// Share of questions answered with real content (any tier).
    pub success_rate: f64,
}

impl EngineMetrics {
    pub fn record_answer(&self, approach: MatchApproach, from_cache: bool, response_time_ms: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.response_time_total_ms
            .fetch_add(response_time_ms, Ordering::Relaxed);
        if from_cache {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        let counter = match approach {
            MatchApproach::Rule => &self.rule,
            MatchApproach::Embedding => &self.embedding,
            MatchApproach::Fallback => &self.fallback,
            MatchApproach::None => &self.unmatched,
            MatchApproach::Error => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_reject(&self) {
        self.validation_rejects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let rule = self.rule.load(Ordering::Relaxed);
        let embedding = self.embedding.load(Ordering::Relaxed);
        let fallback = self.fallback.load(Ordering::Relaxed);
        let answered = rule + embedding + fallback;
        MetricsSnapshot {
            total,
            rule,
            embedding,
            fallback,
            unmatched: self.unmatched.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            validation_rejects: self.validation_rejects.load(Ordering::Relaxed),
            avg_response_time_ms: if total == 0 {
                0.0
            } else {
                self.response_time_total_ms.load(Ordering::Relaxed) as f64 / total as f64
            },
            success_rate: if total == 0 {
                0.0
            } else {
                answered as f64 / total as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_aggregate_per_approach() {
        let metrics = EngineMetrics::default();
        metrics.record_answer(MatchApproach::Rule, false, 10);
        metrics.record_answer(MatchApproach::Rule, true, 2);
        metrics.record_answer(MatchApproach::Fallback, false, 30);
        metrics.record_answer(MatchApproach::None, false, 18);
        metrics.record_validation_reject();

        let snap = metrics.snapshot();
        assert_eq!(snap.total, 4);
        assert_eq!(snap.rule, 2);
        assert_eq!(snap.fallback, 1);
        assert_eq!(snap.unmatched, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.validation_rejects, 1);
        assert!((snap.avg_response_time_ms - 15.0).abs() < 1e-9);
        assert!((snap.success_rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_has_no_nan() {
        let snap = EngineMetrics::default().snapshot();
        assert_eq!(snap.avg_response_time_ms, 0.0);
        assert_eq!(snap.success_rate, 0.0);
    }
}
