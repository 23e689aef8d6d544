//! Response cache and request deduplication.
//!
//! Short-TTL cache keyed by (normalized question, role, scope), plus an
//! in-flight map guaranteeing at most one computation per key. Concurrent
//! callers with the same key all receive the one eventual result. The
//! computation runs in a spawned task, so a caller abandoning its wait
//! never cancels work other waiters depend on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, broadcast};

use deskwise_core::types::{MatchResult, Role};

/// Shared result of one computation. Errors travel as strings so every
/// waiter can clone the outcome.
pub type ComputeOutcome = std::result::Result<MatchResult, String>;

/// What a cache lookup produced.
pub struct CacheLookup {
    pub outcome: ComputeOutcome,
    /// True only for a live pre-existing entry; waiters that joined an
    /// in-flight computation report false.
    pub from_cache: bool,
}

/// Cache key: sha-256 over the normalized question, role, and scope.
pub fn cache_key(question: &str, role: Role, scope_id: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(deskwise_match::normalize(question));
    hasher.update([0x1f]);
    hasher.update(role.as_str());
    hasher.update([0x1f]);
    hasher.update(scope_id.unwrap_or(""));
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

struct CacheSlot {
    value: MatchResult,
    created: Instant,
}

struct CacheInner {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheSlot>>,
    in_flight: Mutex<HashMap<String, broadcast::Sender<ComputeOutcome>>>,
}

#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<CacheInner>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                ttl,
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Return a live cached value, join an in-flight computation, or start
    /// one. The in-flight registration is removed on success and failure
    /// alike — the map never leaks entries.
    pub async fn get_or_compute<F, Fut>(&self, key: String, compute: F) -> CacheLookup
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ComputeOutcome> + Send + 'static,
    {
        {
            let entries = self.inner.entries.lock().await;
            if let Some(slot) = entries.get(&key) {
                if slot.created.elapsed() < self.inner.ttl {
                    return CacheLookup {
                        outcome: Ok(slot.value.clone()),
                        from_cache: true,
                    };
                }
            }
        }

        let mut rx = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    in_flight.insert(key.clone(), tx.clone());
                    let inner = self.inner.clone();
                    let fut = compute();
                    tokio::spawn(async move {
                        // catch_unwind so a panicking computation still
                        // clears its registration and wakes its waiters.
                        let outcome = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                            Ok(outcome) => outcome,
                            Err(_) => Err("computation panicked".to_string()),
                        };
                        if let Ok(value) = &outcome {
                            inner.entries.lock().await.insert(
                                key.clone(),
                                CacheSlot {
                                    value: value.clone(),
                                    created: Instant::now(),
                                },
                            );
                        }
                        inner.in_flight.lock().await.remove(&key);
                        // Waiters may all be gone; that is fine.
                        let _ = tx.send(outcome);
                    });
                    rx
                }
            }
        };

        let outcome = match rx.recv().await {
            Ok(outcome) => outcome,
            Err(e) => Err(format!("computation abandoned: {e}")),
        };
        CacheLookup {
            outcome,
            from_cache: false,
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.inner.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, slot| slot.created.elapsed() < self.inner.ttl);
        before - entries.len()
    }

    /// Drop everything (knowledge reload invalidates all answers).
    pub async fn clear(&self) {
        self.inner.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.inner.in_flight.lock().await.len()
    }

    /// Background sweep loop, in the gateway's lifetime.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = cache.sweep().await;
                if removed > 0 {
                    tracing::debug!("🧹 Cache sweep: {removed} expired entries removed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskwise_core::types::MatchApproach;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result(answer: &str) -> MatchResult {
        MatchResult {
            answer: answer.to_string(),
            approach: MatchApproach::Rule,
            confidence: 1.0,
            entry_id: None,
            category: None,
        }
    }

    #[test]
    fn key_is_stable_under_formatting() {
        let a = cache_key("Bonjour !", Role::Admin, None);
        let b = cache_key("  bonjour", Role::Admin, None);
        assert_eq!(a, b);
        assert_ne!(a, cache_key("bonjour", Role::Enterprise, None));
        assert_ne!(a, cache_key("bonjour", Role::Admin, Some("scope-1")));
    }

    #[tokio::test]
    async fn concurrent_identical_requests_compute_once() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let computations = Arc::new(AtomicUsize::new(0));

        let calls = (0..50).map(|_| {
            let cache = cache.clone();
            let computations = computations.clone();
            async move {
                cache
                    .get_or_compute("k".to_string(), move || async move {
                        computations.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(result("unique"))
                    })
                    .await
            }
        });
        let lookups = join_all(calls).await;

        assert_eq!(computations.load(Ordering::SeqCst), 1);
        assert_eq!(lookups.len(), 50);
        for lookup in lookups {
            assert_eq!(lookup.outcome.unwrap().answer, "unique");
        }
        assert_eq!(cache.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn expired_entries_are_never_served() {
        let cache = ResponseCache::new(Duration::from_millis(40));
        let computations = Arc::new(AtomicUsize::new(0));

        for expected_from_cache in [false, true] {
            let computations = computations.clone();
            let lookup = cache
                .get_or_compute("k".to_string(), move || async move {
                    computations.fetch_add(1, Ordering::SeqCst);
                    Ok(result("v"))
                })
                .await;
            assert_eq!(lookup.from_cache, expected_from_cache);
        }
        assert_eq!(computations.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let computations2 = computations.clone();
        let lookup = cache
            .get_or_compute("k".to_string(), move || async move {
                computations2.fetch_add(1, Ordering::SeqCst);
                Ok(result("v2"))
            })
            .await;
        assert!(!lookup.from_cache);
        assert_eq!(lookup.outcome.unwrap().answer, "v2");
        assert_eq!(computations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_shared_and_not_cached() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let lookup = cache
            .get_or_compute("k".to_string(), || async { Err("boom".to_string()) })
            .await;
        assert!(lookup.outcome.is_err());
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.in_flight_len().await, 0);

        // Next call recomputes instead of replaying the failure.
        let lookup = cache
            .get_or_compute("k".to_string(), || async { Ok(result("recovered")) })
            .await;
        assert_eq!(lookup.outcome.unwrap().answer, "recovered");
    }

    #[tokio::test]
    async fn sweep_bounds_growth() {
        let cache = ResponseCache::new(Duration::from_millis(10));
        for i in 0..5 {
            cache
                .get_or_compute(format!("k{i}"), move || async move { Ok(result("v")) })
                .await;
        }
        assert_eq!(cache.len().await, 5);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.sweep().await, 5);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn abandoned_caller_does_not_cancel_the_computation() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let computations = Arc::new(AtomicUsize::new(0));

        let c2 = computations.clone();
        let first = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute("k".to_string(), move || async move {
                        c2.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(80)).await;
                        Ok(result("slow"))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        first.abort();

        // The computation keeps running; its value lands in the cache.
        tokio::time::sleep(Duration::from_millis(120)).await;
        let lookup = cache
            .get_or_compute("k".to_string(), || async { Ok(result("fresh")) })
            .await;
        assert!(lookup.from_cache);
        assert_eq!(lookup.outcome.unwrap().answer, "slow");
        assert_eq!(computations.load(Ordering::SeqCst), 1);
    }
}
