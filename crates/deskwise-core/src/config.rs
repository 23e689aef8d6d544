//! Deskwise configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeskwiseConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl DeskwiseConfig {
    /// Load config from the default path (~/.deskwise/config.toml),
    /// honoring the DESKWISE_CONFIG env override.
    pub fn load() -> Result<Self> {
        let path = std::env::var("DESKWISE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::DeskwiseError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::DeskwiseError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::DeskwiseError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Deskwise home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deskwise")
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Protect the admin surface (reload/metrics/sessions) with a pairing code.
    #[serde(default = "bool_true")]
    pub require_pairing: bool,
}

fn default_port() -> u16 {
    3100
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn bool_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            require_pairing: true,
        }
    }
}

/// Knowledge source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeConfig {
    /// Path to a JSON entry file. When unset the built-in entry set is used.
    #[serde(default)]
    pub source_path: Option<String>,
}

impl KnowledgeConfig {
    /// Resolve the source path, expanding a leading `~`.
    pub fn resolved_source(&self) -> Option<PathBuf> {
        self.source_path.as_ref().map(|raw| {
            if let Some(rest) = raw.strip_prefix("~/") {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(rest)
            } else {
                PathBuf::from(raw)
            }
        })
    }
}

/// Rule matcher (tier A) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum shared-significant-token ratio for a rule match.
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f32,
}

fn default_overlap_threshold() -> f32 {
    0.6
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: default_overlap_threshold(),
        }
    }
}

/// Semantic tier (embedding index + lexical fallback) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Word-vector table path. A missing file degrades the service to the
    /// lexical tier instead of failing startup.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Minimum cosine similarity accepted as an answer in primary mode.
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f32,
    /// Minimum lexical similarity accepted in fallback mode.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f32,
    /// Candidates returned by a semantic search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_model_path() -> String {
    "~/.deskwise/models/wordvec-fr-256.dwv".into()
}
fn default_accept_threshold() -> f32 {
    0.55
}
fn default_fallback_threshold() -> f32 {
    0.35
}
fn default_top_k() -> usize {
    3
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            accept_threshold: default_accept_threshold(),
            fallback_threshold: default_fallback_threshold(),
            top_k: default_top_k(),
        }
    }
}

impl SemanticConfig {
    /// Resolve the model path, expanding a leading `~`.
    pub fn resolved_model_path(&self) -> PathBuf {
        if let Some(rest) = self.model_path.strip_prefix("~/") {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest)
        } else {
            PathBuf::from(&self.model_path)
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached answer, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Interval of the expired-entry sweep loop, in seconds.
    #[serde(default = "default_cache_sweep")]
    pub sweep_interval_secs: u64,
}

fn default_cache_ttl() -> u64 {
    300
}
fn default_cache_sweep() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            sweep_interval_secs: default_cache_sweep(),
        }
    }
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum turns kept per session (oldest evicted first).
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Idle window after which a session is purged, in seconds.
    #[serde(default = "default_max_idle")]
    pub max_idle_secs: u64,
    /// Interval of the stale-session sweep loop, in seconds.
    #[serde(default = "default_memory_sweep")]
    pub sweep_interval_secs: u64,
}

fn default_max_turns() -> usize {
    20
}
fn default_max_idle() -> u64 {
    1800
}
fn default_memory_sweep() -> u64 {
    300
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_idle_secs: default_max_idle(),
            sweep_interval_secs: default_memory_sweep(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = DeskwiseConfig::default();
        assert_eq!(cfg.gateway.port, 3100);
        assert!(cfg.matching.overlap_threshold > 0.0 && cfg.matching.overlap_threshold <= 1.0);
        assert!(cfg.semantic.accept_threshold > cfg.semantic.fallback_threshold);
        assert!(cfg.memory.max_turns > 0);
    }

    #[test]
    fn roundtrip_toml() {
        let cfg = DeskwiseConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: DeskwiseConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.cache.ttl_secs, cfg.cache.ttl_secs);
        assert_eq!(back.semantic.top_k, cfg.semantic.top_k);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: DeskwiseConfig = toml::from_str("[gateway]\nport = 8200\n").unwrap();
        assert_eq!(cfg.gateway.port, 8200);
        assert_eq!(cfg.cache.ttl_secs, 300);
    }
}
