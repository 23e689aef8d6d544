//! # Deskwise Engine
//!
//! The answer orchestrator: validation → cache/dedup → rule matcher →
//! semantic tier (primary or fallback) → generic help response, with
//! metrics and bounded conversation memory around the pipeline.
//!
//! The orchestrator never raises past its boundary: every internal
//! failure becomes a low-confidence `error` answer. Only an empty
//! question surfaces as a `Validation` error.

pub mod cache;
pub mod memory;
pub mod metrics;

use std::sync::Arc;
use std::time::Instant;

use deskwise_core::config::DeskwiseConfig;
use deskwise_core::error::{DeskwiseError, Result};
use deskwise_core::types::{
    ConversationTurn, EngineAnswer, MatchApproach, MatchResult, Role, ServiceMode,
};
use deskwise_knowledge::{KnowledgeSource, KnowledgeStore};
use deskwise_match::RuleMatcher;
use deskwise_semantic::ServiceRouter;

use crate::cache::{ComputeOutcome, ResponseCache};
use crate::memory::ConversationMemory;
use crate::metrics::EngineMetrics;

/// Generic help answer when no tier produced a confident match.
const NO_MATCH_ANSWER: &str = "Je n'ai pas trouvé de réponse précise à votre question. \
     Reformulez-la avec d'autres mots, ou contactez le support via l'onglet « Assistance ».";

/// Graceful answer when the engine itself failed.
const ERROR_ANSWER: &str = "Le service d'assistance rencontre un problème technique. \
     Merci de réessayer dans quelques instants.";

/// One inbound question.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,
    pub role: Role,
    pub scope_id: Option<String>,
    pub session_id: Option<String>,
}

pub struct AnswerEngine {
    knowledge: Arc<KnowledgeStore>,
    rules: RuleMatcher,
    router: Arc<ServiceRouter>,
    cache: ResponseCache,
    memory: ConversationMemory,
    metrics: EngineMetrics,
}

impl AnswerEngine {
    /// Assemble an engine from parts. `from_config` is the usual entry.
    pub fn new(
        config: &DeskwiseConfig,
        knowledge: Arc<KnowledgeStore>,
        router: Arc<ServiceRouter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            knowledge,
            rules: RuleMatcher::new(config.matching.overlap_threshold),
            router,
            cache: ResponseCache::new(std::time::Duration::from_secs(config.cache.ttl_secs)),
            memory: ConversationMemory::new(
                config.memory.max_turns,
                std::time::Duration::from_secs(config.memory.max_idle_secs),
            ),
            metrics: EngineMetrics::default(),
        })
    }

    /// Load the knowledge source and initialize the semantic tiers.
    /// A failed knowledge load keeps the process alive with an empty
    /// store (the router then reports `failed` until an admin reload).
    pub fn from_config(config: &DeskwiseConfig) -> Arc<Self> {
        let source = match config.knowledge.resolved_source() {
            Some(path) => KnowledgeSource::File(path),
            None => KnowledgeSource::Builtin,
        };
        let knowledge = Arc::new(KnowledgeStore::new(source));
        if let Err(e) = knowledge.load() {
            tracing::warn!("⚠️ Knowledge load failed: {e} — starting with an empty base");
        }
        let router = ServiceRouter::initialize(config.semantic.clone(), &knowledge.snapshot());
        Self::new(config, knowledge, router)
    }

    /// Answer a question. Never fails except for an empty question.
    pub async fn answer(&self, req: AskRequest) -> Result<EngineAnswer> {
        let question = req.question.trim().to_string();
        if question.is_empty() {
            self.metrics.record_validation_reject();
            return Err(DeskwiseError::Validation("Question is empty".into()));
        }

        let start = Instant::now();
        let key = cache::cache_key(&question, req.role, req.scope_id.as_deref());

        let knowledge = self.knowledge.clone();
        let router = self.router.clone();
        let rules = self.rules.clone();
        let role = req.role;
        let q = question.clone();
        let lookup = self
            .cache
            .get_or_compute(key, move || async move {
                compute_answer(q, role, rules, knowledge, router).await
            })
            .await;

        let result = match lookup.outcome {
            Ok(result) => result,
            Err(msg) => {
                tracing::error!("❌ Answer computation failed: {msg}");
                MatchResult {
                    answer: ERROR_ANSWER.to_string(),
                    approach: MatchApproach::Error,
                    confidence: 0.0,
                    entry_id: None,
                    category: None,
                }
            }
        };

        let response_time_ms = start.elapsed().as_millis() as u64;
        self.metrics
            .record_answer(result.approach, lookup.from_cache, response_time_ms);

        if let Some(session_id) = &req.session_id {
            self.memory
                .append_turn(session_id, req.role, ConversationTurn::user(question.as_str()));
            self.memory.append_turn(
                session_id,
                req.role,
                ConversationTurn::assistant(
                    result.answer.as_str(),
                    result.approach,
                    result.confidence,
                ),
            );
        }

        tracing::debug!(
            approach = result.approach.as_str(),
            confidence = result.confidence,
            from_cache = lookup.from_cache,
            response_time_ms,
            "question answered"
        );

        Ok(EngineAnswer {
            answer: result.answer,
            approach: result.approach,
            confidence: result.confidence,
            response_time_ms,
            from_cache: lookup.from_cache,
            entry_id: result.entry_id,
            category: result.category,
        })
    }

    /// Admin reload: rebuild the knowledge snapshot, re-attempt the
    /// semantic tiers against it, and drop now-stale cached answers.
    pub async fn reload_knowledge(&self) -> Result<usize> {
        let count = self.knowledge.reload()?;
        let mode = self.router.reload(&self.knowledge.snapshot());
        self.cache.clear().await;
        tracing::info!("🔄 Knowledge reloaded: {count} entries, service mode {mode}");
        Ok(count)
    }

    pub fn service_mode(&self) -> ServiceMode {
        self.router.mode()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }
}

/// The compute path behind the cache: tier A, then tier B, then the
/// generic help response. Errors come back as strings so concurrent
/// waiters can share the outcome.
async fn compute_answer(
    question: String,
    role: Role,
    rules: RuleMatcher,
    knowledge: Arc<KnowledgeStore>,
    router: Arc<ServiceRouter>,
) -> ComputeOutcome {
    let entries = knowledge.entries_for(role);

    if let Some(result) = rules.match_question(&question, role, &entries) {
        return Ok(result);
    }

    match router.search(&question, role).await {
        Ok(Some(candidate)) => {
            let Some(entry) = knowledge.get(&candidate.entry_id) else {
                // Snapshot raced a reload; treat as a normal miss.
                return Ok(no_match_result());
            };
            Ok(MatchResult {
                answer: entry.answer.clone(),
                approach: candidate.approach,
                confidence: candidate.score,
                entry_id: Some(entry.id.clone()),
                category: Some(entry.category.clone()),
            })
        }
        Ok(None) => Ok(no_match_result()),
        Err(e) => Err(e.to_string()),
    }
}

fn no_match_result() -> MatchResult {
    MatchResult {
        answer: NO_MATCH_ANSWER.to_string(),
        approach: MatchApproach::None,
        confidence: 0.1,
        entry_id: None,
        category: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskwise_semantic::LexicalEngine;

    fn test_config() -> DeskwiseConfig {
        let mut cfg = DeskwiseConfig::default();
        // Point at a missing model so initialization degrades cleanly.
        cfg.semantic.model_path = "/nonexistent/model.dwv".into();
        cfg
    }

    fn builtin_engine() -> Arc<AnswerEngine> {
        let cfg = test_config();
        let knowledge = Arc::new(KnowledgeStore::new(KnowledgeSource::Builtin));
        knowledge.load().unwrap();
        let router = ServiceRouter::initialize(cfg.semantic.clone(), &knowledge.snapshot());
        AnswerEngine::new(&cfg, knowledge, router)
    }

    fn ask(question: &str, role: Role) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            role,
            scope_id: None,
            session_id: None,
        }
    }

    #[tokio::test]
    async fn greeting_answers_via_rule_with_full_confidence() {
        let engine = builtin_engine();
        let answer = engine.answer(ask("Bonjour", Role::Enterprise)).await.unwrap();
        assert_eq!(answer.approach, MatchApproach::Rule);
        assert_eq!(answer.confidence, 1.0);
        assert!(answer.answer.contains("Bonjour"));
    }

    #[tokio::test]
    async fn every_canonical_question_round_trips_via_rule() {
        let engine = builtin_engine();
        for entry in engine.knowledge().snapshot().iter() {
            let role = entry.role_scope[0];
            let answer = engine
                .answer(ask(&entry.canonical_question, role))
                .await
                .unwrap();
            assert_eq!(answer.approach, MatchApproach::Rule, "entry {}", entry.id);
            assert_eq!(answer.confidence, 1.0, "entry {}", entry.id);
            assert_eq!(answer.entry_id.as_deref(), Some(entry.id.as_str()));
        }
    }

    #[tokio::test]
    async fn empty_question_is_a_validation_error() {
        let engine = builtin_engine();
        let err = engine.answer(ask("   ", Role::Admin)).await.unwrap_err();
        assert!(matches!(err, DeskwiseError::Validation(_)));
    }

    #[tokio::test]
    async fn unrelated_question_gets_generic_help_not_a_crash() {
        let engine = builtin_engine();
        assert_eq!(engine.service_mode(), ServiceMode::Fallback);
        let answer = engine
            .answer(ask("xylophone quantique zéphyr", Role::Enterprise))
            .await
            .unwrap();
        assert!(matches!(
            answer.approach,
            MatchApproach::None | MatchApproach::Fallback
        ));
        assert!(answer.confidence < 0.35);
        assert!(!answer.answer.is_empty());
    }

    #[tokio::test]
    async fn degraded_mode_still_answers_semantic_questions() {
        let engine = builtin_engine();
        assert_eq!(engine.service_mode(), ServiceMode::Fallback);
        let answer = engine
            .answer(ask(
                "je voudrais déposer un nouveau document sur la plateforme",
                Role::Enterprise,
            ))
            .await
            .unwrap();
        assert!(!answer.answer.is_empty());
        assert!(answer.approach != MatchApproach::Error);
    }

    #[tokio::test]
    async fn admin_only_entries_hidden_from_enterprise() {
        let engine = builtin_engine();
        let admin = engine
            .answer(ask("comment créer une entreprise ?", Role::Admin))
            .await
            .unwrap();
        assert_eq!(admin.approach, MatchApproach::Rule);

        let enterprise = engine
            .answer(ask("comment créer une entreprise ?", Role::Enterprise))
            .await
            .unwrap();
        assert_ne!(enterprise.entry_id, admin.entry_id);
    }

    #[tokio::test]
    async fn total_failure_becomes_error_answer_not_panic() {
        let cfg = test_config();
        let knowledge = Arc::new(KnowledgeStore::new(KnowledgeSource::Builtin));
        knowledge.load().unwrap();
        // Both tiers missing: every semantic query is service-unavailable.
        let router = ServiceRouter::with_engines(cfg.semantic.clone(), None, None);
        let engine = AnswerEngine::new(&cfg, knowledge, router);

        let answer = engine
            .answer(ask("xylophone quantique zéphyr", Role::Admin))
            .await
            .unwrap();
        assert_eq!(answer.approach, MatchApproach::Error);
        assert_eq!(answer.confidence, 0.0);
        assert!(!answer.answer.is_empty());
    }

    #[tokio::test]
    async fn session_records_both_turns() {
        let engine = builtin_engine();
        let mut req = ask("Bonjour", Role::Enterprise);
        req.session_id = Some("s-1".into());
        engine.answer(req).await.unwrap();

        let turns = engine.memory().recent_turns("s-1", 10);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, deskwise_core::types::TurnRole::User);
        assert_eq!(turns[1].role, deskwise_core::types::TurnRole::Assistant);
        assert_eq!(turns[1].approach, Some(MatchApproach::Rule));
    }

    #[tokio::test]
    async fn identical_questions_hit_the_cache() {
        let engine = builtin_engine();
        let first = engine.answer(ask("Bonjour", Role::Enterprise)).await.unwrap();
        assert!(!first.from_cache);
        let second = engine.answer(ask("Bonjour", Role::Enterprise)).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.answer, first.answer);
    }

    #[tokio::test]
    async fn reload_keeps_answering() {
        let engine = builtin_engine();
        let before = engine.answer(ask("Bonjour", Role::Admin)).await.unwrap();
        let count = engine.reload_knowledge().await.unwrap();
        assert!(count > 0);
        let after = engine.answer(ask("Bonjour", Role::Admin)).await.unwrap();
        assert_eq!(after.answer, before.answer);
        assert!(!after.from_cache, "reload must drop cached answers");
    }

    #[tokio::test]
    async fn primary_runtime_failure_is_transparent_to_the_caller() {
        use async_trait::async_trait;
        use deskwise_core::traits::{SearchHit, SemanticSearch};

        struct FailingSearch;
        #[async_trait]
        impl SemanticSearch for FailingSearch {
            fn name(&self) -> &str {
                "failing"
            }
            async fn search(&self, _q: &str, _r: Role, _k: usize) -> Result<Vec<SearchHit>> {
                Err(DeskwiseError::EmbeddingUnavailable("boom".into()))
            }
        }

        let cfg = test_config();
        let knowledge = Arc::new(KnowledgeStore::new(KnowledgeSource::Builtin));
        knowledge.load().unwrap();
        let fallback: Arc<dyn SemanticSearch> =
            Arc::new(LexicalEngine::build(&knowledge.snapshot()).unwrap());
        let router = ServiceRouter::with_engines(
            cfg.semantic.clone(),
            Some(Arc::new(FailingSearch)),
            Some(fallback),
        );
        let engine = AnswerEngine::new(&cfg, knowledge, router);

        let answer = engine
            .answer(ask(
                "je voudrais déposer un nouveau document sur la plateforme",
                Role::Enterprise,
            ))
            .await
            .unwrap();
        assert_ne!(answer.approach, MatchApproach::Error);
        assert_eq!(engine.service_mode(), ServiceMode::Fallback);
    }
}
