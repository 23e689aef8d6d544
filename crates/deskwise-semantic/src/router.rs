//! Service degradation router.
//!
//! Decides at startup, and on failure, which tier B variant serves
//! traffic. Transitions are monotonic at runtime: a primary failure
//! permanently routes to the fallback for the remainder of the process
//! so a broken embedding subsystem is not hit on every request. Only an
//! explicit reload re-attempts primary initialization.

use std::sync::{Arc, RwLock};

use deskwise_core::config::SemanticConfig;
use deskwise_core::error::{DeskwiseError, Result};
use deskwise_core::traits::SemanticSearch;
use deskwise_core::types::{KnowledgeEntry, MatchApproach, Role, ServiceMode};

use crate::embedder::WordVecEmbedder;
use crate::index::EmbeddingIndex;
use crate::lexical::LexicalEngine;

/// A confidence-gated answer candidate from tier B.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub entry_id: String,
    pub score: f32,
    pub approach: MatchApproach,
}

pub struct ServiceRouter {
    config: SemanticConfig,
    mode: RwLock<ServiceMode>,
    primary: RwLock<Option<Arc<dyn SemanticSearch>>>,
    fallback: RwLock<Option<Arc<dyn SemanticSearch>>>,
}

impl ServiceRouter {
    /// Attempt primary (embedding) initialization, degrade to the lexical
    /// fallback on failure. `Failed` only when both tiers are unusable.
    pub fn initialize(config: SemanticConfig, entries: &[Arc<KnowledgeEntry>]) -> Arc<Self> {
        let router = Arc::new(Self {
            config,
            mode: RwLock::new(ServiceMode::Uninitialized),
            primary: RwLock::new(None),
            fallback: RwLock::new(None),
        });
        router.rebuild(entries);
        router
    }

    /// Build from preconstructed engines. Used by tests and by callers
    /// that bring their own embedding backend.
    pub fn with_engines(
        config: SemanticConfig,
        primary: Option<Arc<dyn SemanticSearch>>,
        fallback: Option<Arc<dyn SemanticSearch>>,
    ) -> Arc<Self> {
        let mode = match (&primary, &fallback) {
            (Some(_), _) => ServiceMode::Primary,
            (None, Some(_)) => ServiceMode::Fallback,
            (None, None) => ServiceMode::Failed,
        };
        Arc::new(Self {
            config,
            mode: RwLock::new(mode),
            primary: RwLock::new(primary),
            fallback: RwLock::new(fallback),
        })
    }

    pub fn mode(&self) -> ServiceMode {
        *self.mode.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-attempt both tiers against a fresh knowledge snapshot. This is
    /// the only path that can restore `Primary` after a degradation.
    pub fn reload(&self, entries: &[Arc<KnowledgeEntry>]) -> ServiceMode {
        self.rebuild(entries)
    }

    fn rebuild(&self, entries: &[Arc<KnowledgeEntry>]) -> ServiceMode {
        let primary: Option<Arc<dyn SemanticSearch>> =
            match WordVecEmbedder::load(&self.config.resolved_model_path())
                .and_then(|embedder| EmbeddingIndex::build(Arc::new(embedder), entries))
            {
                Ok(index) => Some(Arc::new(index)),
                Err(e) => {
                    tracing::warn!("⚠️ Embedding subsystem unavailable: {e} — using lexical fallback");
                    None
                }
            };

        let fallback: Option<Arc<dyn SemanticSearch>> = match LexicalEngine::build(entries) {
            Ok(engine) => Some(Arc::new(engine)),
            Err(e) => {
                tracing::error!("❌ Lexical fallback unavailable: {e}");
                None
            }
        };

        let new_mode = match (&primary, &fallback) {
            (Some(_), _) => ServiceMode::Primary,
            (None, Some(_)) => ServiceMode::Fallback,
            (None, None) => ServiceMode::Failed,
        };

        *self.primary.write().unwrap_or_else(|e| e.into_inner()) = primary;
        *self.fallback.write().unwrap_or_else(|e| e.into_inner()) = fallback;
        *self.mode.write().unwrap_or_else(|e| e.into_inner()) = new_mode;

        match new_mode {
            ServiceMode::Primary => tracing::info!("✅ Semantic service initialized (primary)"),
            ServiceMode::Fallback => tracing::info!("🔄 Semantic service degraded (fallback)"),
            _ => tracing::error!("❌ Semantic service failed to initialize"),
        }
        new_mode
    }

    /// Monotonic `Primary → Fallback`; never flips back without a reload.
    fn degrade(&self, reason: &str) {
        let mut mode = self.mode.write().unwrap_or_else(|e| e.into_inner());
        if *mode == ServiceMode::Primary {
            tracing::warn!("🔄 Degrading to fallback mode: {reason}");
            *mode = ServiceMode::Fallback;
        }
    }

    fn engine(&self, mode: ServiceMode) -> Option<Arc<dyn SemanticSearch>> {
        match mode {
            ServiceMode::Primary => self.primary.read().unwrap_or_else(|e| e.into_inner()).clone(),
            ServiceMode::Fallback => self.fallback.read().unwrap_or_else(|e| e.into_inner()).clone(),
            _ => None,
        }
    }

    /// Run a tier B search and gate the best hit by the mode's acceptance
    /// threshold. `Ok(None)` is the normal "no confident answer" outcome.
    /// A primary runtime failure degrades the mode and transparently
    /// retries the same request on the fallback.
    pub async fn search(&self, question: &str, role: Role) -> Result<Option<MatchCandidate>> {
        match self.mode() {
            ServiceMode::Primary => {
                let Some(engine) = self.engine(ServiceMode::Primary) else {
                    return Err(DeskwiseError::ServiceUnavailable(
                        "Primary engine missing".into(),
                    ));
                };
                match engine.search(question, role, self.config.top_k).await {
                    Ok(hits) => Ok(self.gate(hits, self.config.accept_threshold, MatchApproach::Embedding)),
                    Err(e) => {
                        self.degrade(&e.to_string());
                        self.fallback_search(question, role).await
                    }
                }
            }
            ServiceMode::Fallback => self.fallback_search(question, role).await,
            ServiceMode::Uninitialized | ServiceMode::Failed => Err(
                DeskwiseError::ServiceUnavailable("No matching tier available".into()),
            ),
        }
    }

    async fn fallback_search(&self, question: &str, role: Role) -> Result<Option<MatchCandidate>> {
        let Some(engine) = self.engine(ServiceMode::Fallback) else {
            return Err(DeskwiseError::ServiceUnavailable(
                "Fallback engine missing".into(),
            ));
        };
        let hits = engine.search(question, role, self.config.top_k).await?;
        Ok(self.gate(hits, self.config.fallback_threshold, MatchApproach::Fallback))
    }

    fn gate(
        &self,
        hits: Vec<deskwise_core::traits::SearchHit>,
        threshold: f32,
        approach: MatchApproach,
    ) -> Option<MatchCandidate> {
        hits.into_iter()
            .find(|hit| hit.score >= threshold)
            .map(|hit| MatchCandidate {
                entry_id: hit.entry_id,
                score: hit.score.clamp(0.0, 1.0),
                approach,
            })
    }
}
