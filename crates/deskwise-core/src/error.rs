//! Deskwise error taxonomy.
//!
//! Only two variants ever reach an end caller: `Validation` (bad question)
//! and `KnowledgeLoad` (admin reload failure). Everything else is recovered
//! inside the engine and converted into a degraded textual answer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskwiseError {
    /// Empty or malformed question — surfaced to the caller, never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Knowledge source unreadable or empty — previous snapshot retained.
    #[error("Knowledge load error: {0}")]
    KnowledgeLoad(String),

    /// Embedding subsystem failed to initialize or answer — triggers the
    /// switch to the lexical fallback tier.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Both matching tiers are down; queries get a service-unavailable answer.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeskwiseError>;
