//! Environment-driven configuration surface (spec §6). Every option has a
//! sensible default and can be overridden by an environment variable of the
//! same name, upper-cased.

pub mod error;

pub use error::ConfigError;

use std::env;
use std::time::Duration;

const EMBEDDING_DIMENSION: usize = 768;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Per-operation timeouts (seconds), overridable as `TIMEOUT_<OP>`.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub lexical_search: Duration,
    pub vector_search: Duration,
    pub batch_subprocess: Duration,
    pub embedding: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lexical_search: Duration::from_secs(env_or("TIMEOUT_LEXICAL_SEARCH", 5)),
            vector_search: Duration::from_secs(env_or("TIMEOUT_VECTOR_SEARCH", 5)),
            batch_subprocess: Duration::from_secs(env_or("TIMEOUT_BATCH_SUBPROCESS", 300)),
            embedding: Duration::from_secs(env_or("TIMEOUT_EMBEDDING", 30)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MnemoliteConfig {
    pub max_chunk_size: usize,
    pub embedding_dimension: usize,
    pub timeouts: Timeouts,
    pub cache_l1_max_mb: usize,
    pub cache_l2_url: Option<String>,
    pub rerank_model: Option<String>,
    pub batch_size: usize,
    pub batch_timeout: Duration,
    pub include_tests: bool,
    pub database_url: String,
}

impl Default for MnemoliteConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: env_or("MAX_CHUNK_SIZE", 2000),
            embedding_dimension: env_or("EMBEDDING_DIMENSION", EMBEDDING_DIMENSION),
            timeouts: Timeouts::default(),
            cache_l1_max_mb: env_or("CACHE_L1_MAX_MB", 256),
            cache_l2_url: env_opt_string("CACHE_L2_URL"),
            rerank_model: env_opt_string("RERANK_MODEL"),
            batch_size: env_or("BATCH_SIZE", 40),
            batch_timeout: Duration::from_secs(env_or("BATCH_TIMEOUT", 300)),
            include_tests: env_or("INCLUDE_TESTS", false),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/mnemolite".to_string()),
        }
    }
}

impl MnemoliteConfig {
    /// Loads from the environment and validates. `embedding_dimension` is
    /// the one option enforced at start-up (spec §6): any value other than
    /// 768 would silently corrupt the shared HNSW index layout.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension != EMBEDDING_DIMENSION {
            return Err(ConfigError::WrongEmbeddingDimension {
                actual: self.embedding_dimension,
            });
        }
        if self.max_chunk_size == 0 {
            return Err(ConfigError::invalid_value("max_chunk_size", "must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_value("batch_size", "must be > 0"));
        }
        Ok(())
    }

    pub fn reranking_enabled(&self) -> bool {
        self.rerank_model.is_some()
    }

    pub fn l2_enabled(&self) -> bool {
        self.cache_l2_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = MnemoliteConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn wrong_embedding_dimension_fails_validation() {
        let mut config = MnemoliteConfig::default();
        config.embedding_dimension = 384;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WrongEmbeddingDimension { actual: 384 })
        ));
    }

    #[test]
    fn empty_cache_l2_url_means_l1_only() {
        let config = MnemoliteConfig {
            cache_l2_url: None,
            ..MnemoliteConfig::default()
        };
        assert!(!config.l2_enabled());
    }

    #[test]
    fn empty_rerank_model_disables_reranking() {
        let config = MnemoliteConfig {
            rerank_model: None,
            ..MnemoliteConfig::default()
        };
        assert!(!config.reranking_enabled());
    }
}
