//! Bounded conversation memory.
//!
//! Per-session sliding window of recent turns, used for continuity and the
//! admin session listing. Advisory context only: answers never depend on
//! it. Oldest turns evict on overflow; idle sessions are purged.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use deskwise_core::types::{ConversationTurn, Role};

struct Session {
    role: Role,
    turns: VecDeque<ConversationTurn>,
    last_activity: Instant,
    last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// Summary row for the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub role: Role,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

struct MemoryInner {
    max_turns: usize,
    max_idle: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

#[derive(Clone)]
pub struct ConversationMemory {
    inner: Arc<MemoryInner>,
}

impl ConversationMemory {
    pub fn new(max_turns: usize, max_idle: Duration) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                max_turns: max_turns.max(1),
                max_idle,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Append a turn, creating the session on first use. The window never
    /// exceeds `max_turns`; the oldest turn is evicted first.
    pub fn append_turn(&self, session_id: &str, role: Role, turn: ConversationTurn) {
        let mut sessions = self.inner.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                role,
                turns: VecDeque::with_capacity(self.inner.max_turns),
                last_activity: Instant::now(),
                last_activity_at: Utc::now(),
                created_at: Utc::now(),
            });
        if session.turns.len() == self.inner.max_turns {
            session.turns.pop_front();
        }
        session.turns.push_back(turn);
        session.last_activity = Instant::now();
        session.last_activity_at = Utc::now();
    }

    /// The `n` most recent turns, oldest first. Empty for unknown sessions.
    pub fn recent_turns(&self, session_id: &str, n: usize) -> Vec<ConversationTurn> {
        let sessions = self.inner.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .map(|s| s.turns.iter().rev().take(n).rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Purge sessions idle beyond the configured window.
    pub fn evict_stale(&self) -> usize {
        let mut sessions = self.inner.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity.elapsed() < self.inner.max_idle);
        before - sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.inner.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, s)| SessionSummary {
                session_id: id.clone(),
                role: s.role,
                turn_count: s.turns.len(),
                created_at: s.created_at,
                last_activity: s.last_activity_at,
            })
            .collect();
        rows.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        rows
    }

    /// Background eviction loop, in the gateway's lifetime.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let memory = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = memory.evict_stale();
                if removed > 0 {
                    tracing::debug!("🧹 Session sweep: {removed} idle session(s) purged");
                }
            }
        })
    }
}
