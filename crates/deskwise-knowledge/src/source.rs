//! JSON source parsing and validation.
//!
//! The source is an external document set; this module turns it into a
//! fully validated entry list or fails without side effects.

use std::path::Path;

use deskwise_core::error::{DeskwiseError, Result};
use deskwise_core::types::KnowledgeEntry;

/// Read and validate a JSON entry file.
pub fn load_file(path: &Path) -> Result<Vec<KnowledgeEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DeskwiseError::KnowledgeLoad(format!("Cannot read {}: {e}", path.display()))
    })?;
    let entries: Vec<KnowledgeEntry> = serde_json::from_str(&content).map_err(|e| {
        DeskwiseError::KnowledgeLoad(format!("Cannot parse {}: {e}", path.display()))
    })?;
    validate(entries)
}

/// Validate an entry list: non-empty set, non-empty patterns/answers,
/// unique ids (derived from category + first pattern when absent).
pub fn validate(entries: Vec<KnowledgeEntry>) -> Result<Vec<KnowledgeEntry>> {
    if entries.is_empty() {
        return Err(DeskwiseError::KnowledgeLoad(
            "Source contains no entries".into(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    let mut validated = Vec::with_capacity(entries.len());
    for (idx, mut entry) in entries.into_iter().enumerate() {
        entry.patterns.retain(|p| !p.trim().is_empty());
        if entry.patterns.is_empty() {
            return Err(DeskwiseError::KnowledgeLoad(format!(
                "Entry #{idx} has no usable pattern"
            )));
        }
        if entry.answer.trim().is_empty() {
            return Err(DeskwiseError::KnowledgeLoad(format!(
                "Entry #{idx} has an empty answer"
            )));
        }
        if entry.canonical_question.trim().is_empty() {
            entry.canonical_question = entry.patterns[0].clone();
        }
        if entry.id.trim().is_empty() {
            entry.id = derive_id(&entry.category, &entry.patterns[0]);
        }
        if !seen.insert(entry.id.clone()) {
            return Err(DeskwiseError::KnowledgeLoad(format!(
                "Duplicate entry id: {}",
                entry.id
            )));
        }
        if entry.role_scope.is_empty() {
            return Err(DeskwiseError::KnowledgeLoad(format!(
                "Entry '{}' has an empty role scope",
                entry.id
            )));
        }
        validated.push(entry);
    }
    Ok(validated)
}

/// Slug id from category + pattern, e.g. `rh-solde-conges`.
fn derive_id(category: &str, pattern: &str) -> String {
    let slug: String = pattern
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(4)
        .collect::<Vec<_>>()
        .join("-");
    if category.is_empty() {
        slug
    } else {
        format!("{category}-{slug}")
    }
}
