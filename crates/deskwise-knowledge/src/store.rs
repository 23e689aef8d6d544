//! The knowledge store: owns the entry snapshot, publishes atomically.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use deskwise_core::error::{DeskwiseError, Result};
use deskwise_core::types::{KnowledgeEntry, Role};

/// Where entries come from.
#[derive(Debug, Clone)]
pub enum KnowledgeSource {
    /// External JSON entry file.
    File(PathBuf),
    /// The curated built-in set.
    Builtin,
}

/// One published snapshot. Readers clone the outer `Arc` and keep a
/// consistent view for as long as they need it.
struct Snapshot {
    entries: Arc<Vec<Arc<KnowledgeEntry>>>,
    loaded_at: DateTime<Utc>,
}

pub struct KnowledgeStore {
    source: KnowledgeSource,
    snapshot: RwLock<Option<Snapshot>>,
}

impl KnowledgeStore {
    pub fn new(source: KnowledgeSource) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
        }
    }

    /// Initial load. Fails without publishing anything if the source is
    /// unreadable or empty.
    pub fn load(&self) -> Result<usize> {
        self.reload()
    }

    /// Build the replacement set fully, then publish with a single swap.
    /// On failure the previous snapshot (or empty state) is retained.
    pub fn reload(&self) -> Result<usize> {
        let entries = match &self.source {
            KnowledgeSource::File(path) => crate::source::load_file(path)?,
            KnowledgeSource::Builtin => crate::source::validate(crate::builtin::default_entries())?,
        };
        let count = entries.len();
        let snapshot = Snapshot {
            entries: Arc::new(entries.into_iter().map(Arc::new).collect()),
            loaded_at: Utc::now(),
        };
        *self
            .snapshot
            .write()
            .map_err(|_| DeskwiseError::Internal("knowledge lock poisoned".into()))? =
            Some(snapshot);
        tracing::info!("📚 Knowledge base loaded: {count} entries");
        Ok(count)
    }

    /// Current published snapshot (empty before the first successful load).
    pub fn snapshot(&self) -> Arc<Vec<Arc<KnowledgeEntry>>> {
        self.snapshot
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.entries.clone()))
            .unwrap_or_default()
    }

    /// Entries visible to a role, in declaration order.
    pub fn entries_for(&self, role: Role) -> Vec<Arc<KnowledgeEntry>> {
        self.snapshot()
            .iter()
            .filter(|e| e.allows(role))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Arc<KnowledgeEntry>> {
        self.snapshot().iter().find(|e| e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamp of the last successful load, for the admin surface.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.loaded_at))
    }

    /// Entry counts per category, for the admin surface and the CLI.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for entry in self.snapshot().iter() {
            *counts.entry(entry.category.clone()).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Distinct per-test files so parallel tests never collide.
    fn file_with(tag: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "deskwise-kb-{tag}-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    const VALID: &str = r#"[
        {"id":"greet","patterns":["bonjour","salut"],"question":"bonjour","answer":"Bonjour !","category":"general"},
        {"id":"kpi","patterns":["ajouter un kpi"],"question":"ajouter un kpi","answer":"Menu KPI.","category":"kpi","roles":["admin"]}
    ]"#;

    #[test]
    fn load_from_file() {
        let store = KnowledgeStore::new(KnowledgeSource::File(file_with("load", VALID)));
        assert_eq!(store.load().unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries_for(Role::Enterprise).len(), 1);
        assert_eq!(store.entries_for(Role::Admin).len(), 2);
        assert!(store.get("greet").is_some());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn reload_is_idempotent() {
        let store = KnowledgeStore::new(KnowledgeSource::Builtin);
        let first = store.load().unwrap();
        let ids: Vec<String> = store.snapshot().iter().map(|e| e.id.clone()).collect();
        for _ in 0..3 {
            assert_eq!(store.reload().unwrap(), first);
        }
        let ids_after: Vec<String> = store.snapshot().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, ids_after);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let path = file_with("reload", VALID);
        let store = KnowledgeStore::new(KnowledgeSource::File(path.clone()));
        store.load().unwrap();

        std::fs::write(&path, "[]").unwrap();
        let err = store.reload().unwrap_err();
        assert!(matches!(err, DeskwiseError::KnowledgeLoad(_)));
        // Previous snapshot still served.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unreadable_source_never_publishes() {
        let store =
            KnowledgeStore::new(KnowledgeSource::File(PathBuf::from("/nonexistent/kb.json")));
        assert!(store.load().is_err());
        assert!(store.is_empty());
    }
}
