//! # Deskwise Match
//!
//! Tier A of the answering pipeline: deterministic pattern matching.
//! Fast, high precision, zero external dependencies — a miss here is the
//! normal signal to defer to the semantic tier, not an error.

pub mod normalize;
pub mod rule;

pub use normalize::{normalize, significant_tokens};
pub use rule::RuleMatcher;
