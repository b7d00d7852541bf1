//! Embedder (C5) facade: dual TEXT/CODE domains over one
//! [`EmbeddingProvider`], with role-aware prefixing for the TEXT domain and
//! per-operation timeouts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mnemolite_resilience::with_timeout;

use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, SearchError};

/// TEXT-domain role. Query/passage prefixing is a configuration concern for
/// model families that require it (e.g. E5); Jina models ignore the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Query,
    Passage,
}

pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    single_timeout: Duration,
    batch_timeout: Duration,
    use_prefixes: bool,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            single_timeout: Duration::from_secs(30),
            batch_timeout: Duration::from_secs(60),
            use_prefixes: false,
        }
    }

    pub fn with_prefixes(mut self, use_prefixes: bool) -> Self {
        self.use_prefixes = use_prefixes;
        self
    }

    fn prefix(&self, role: Role, text: &str) -> String {
        if !self.use_prefixes {
            return text.to_string();
        }
        match role {
            Role::Query => format!("query: {text}"),
            Role::Passage => format!("passage: {text}"),
        }
    }

    /// TEXT domain: docstrings, memory content, and query strings.
    pub async fn embed_text(&self, texts: Vec<String>, role: Role) -> Result<Vec<Vec<f32>>> {
        let timeout = if texts.len() > 1 { self.batch_timeout } else { self.single_timeout };
        let prefixed: Vec<String> = texts.iter().map(|t| self.prefix(role, t)).collect();
        let provider = Arc::clone(&self.provider);

        with_timeout("embed_text", timeout, HashMap::new(), async move {
            provider.encode_semantic(prefixed).await
        })
        .await
        .map_err(|e| SearchError::Timeout(e.to_string()))?
    }

    /// CODE domain: source text, never prefixed.
    pub async fn embed_code(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let timeout = if texts.len() > 1 { self.batch_timeout } else { self.single_timeout };
        let provider = Arc::clone(&self.provider);

        with_timeout("embed_code", timeout, HashMap::new(), async move {
            provider.encode_code(texts).await
        })
        .await
        .map_err(|e| SearchError::Timeout(e.to_string()))?
    }

    pub fn embedding_dim(&self) -> usize {
        self.provider.embedding_dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixing_disabled_leaves_text_untouched() {
        let embedder_prefix = |use_prefixes: bool, role: Role, text: &str| -> String {
            if !use_prefixes {
                return text.to_string();
            }
            match role {
                Role::Query => format!("query: {text}"),
                Role::Passage => format!("passage: {text}"),
            }
        };
        assert_eq!(embedder_prefix(false, Role::Query, "find auth"), "find auth");
        assert_eq!(embedder_prefix(true, Role::Query, "find auth"), "query: find auth");
        assert_eq!(embedder_prefix(true, Role::Passage, "fn auth()"), "passage: fn auth()");
    }
}
