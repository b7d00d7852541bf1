//! Cross-encoder reranker (C12): lazy-loaded, scores `(query, candidate)`
//! pairs with a sequence-classification head over the same JinaBERT encoder
//! family used for embeddings, and returns the reordering without mutating
//! the original similarity scores.

use std::path::PathBuf;
use std::sync::Arc;

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::jina_bert::{BertModel, Config as JinaConfig};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use once_cell::sync::OnceCell;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, SearchError};

const DTYPE: DType = DType::F32;

#[derive(Debug, Clone)]
pub struct RerankCandidate {
    pub chunk_id: Uuid,
    pub text: String,
    /// Fused RRF score carried through untouched — reranking adds
    /// `rerank_score`, it never overwrites the original.
    pub fused_score: f64,
}

#[derive(Debug, Clone)]
pub struct RerankedResult {
    pub chunk_id: Uuid,
    pub fused_score: f64,
    pub rerank_score: f32,
}

struct LoadedModel {
    encoder: BertModel,
    head: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

pub struct CrossEncoderReranker {
    model_id: String,
    model: Arc<OnceCell<LoadedModel>>,
    device: Device,
}

impl CrossEncoderReranker {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model: Arc::new(OnceCell::new()),
            device: Device::Cpu,
        }
    }

    /// Scores the top-N fused candidates against `query`, in batches, and
    /// returns them reordered by `rerank_score` descending. ~10 ms/pair is
    /// the overhead target; batching is left to the caller via `candidates`
    /// chunking since pool sizes are already bounded upstream.
    pub async fn rerank(&self, query: &str, candidates: Vec<RerankCandidate>) -> Result<Vec<RerankedResult>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }
        let query = query.to_string();
        let this_model_id = self.model_id.clone();
        let this = Arc::clone(&self.model);
        let device = self.device.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<RerankedResult>> {
            let model = this
                .get_or_try_init(|| load_model(&this_model_id, &device))?;
            let scores = score_pairs(model, &query, &candidates)?;

            let mut reranked: Vec<RerankedResult> = candidates
                .into_iter()
                .zip(scores)
                .map(|(c, score)| RerankedResult {
                    chunk_id: c.chunk_id,
                    fused_score: c.fused_score,
                    rerank_score: score,
                })
                .collect();
            reranked.sort_by(|a, b| b.rerank_score.partial_cmp(&a.rerank_score).unwrap_or(std::cmp::Ordering::Equal));
            Ok(reranked)
        })
        .await
        .map_err(|e| SearchError::Embedding(format!("rerank task panicked: {e}")))?
    }
}

fn download(model_id: &str, file: &str) -> Result<PathBuf> {
    let api = Api::new().map_err(|e| SearchError::Embedding(format!("HF API unavailable: {e}")))?;
    let repo = Repo::with_revision(model_id.to_string(), RepoType::Model, "main".to_string());
    api.repo(repo)
        .get(file)
        .map_err(|e| SearchError::Embedding(format!("failed to download {file}: {e}")))
}

fn load_model(model_id: &str, device: &Device) -> Result<LoadedModel> {
    info!("loading cross-encoder reranker ({model_id})");

    let config_path = download(model_id, "config.json")?;
    let tokenizer_path = download(model_id, "tokenizer.json")?;
    let weights_path = download(model_id, "model.safetensors")?;

    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| SearchError::Embedding(format!("failed to read config: {e}")))?;
    let config: JinaConfig = serde_json::from_str(&config_str)
        .map_err(|e| SearchError::Embedding(format!("failed to parse config: {e}")))?;

    let tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| SearchError::Embedding(format!("failed to load tokenizer: {e}")))?;

    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, device)
            .map_err(|e| SearchError::Embedding(format!("failed to load weights: {e}")))?
    };

    let encoder = BertModel::new(vb.pp("bert"), &config)
        .map_err(|e| SearchError::Embedding(format!("failed to build encoder: {e}")))?;
    let head = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))
        .map_err(|e| SearchError::Embedding(format!("failed to build classification head: {e}")))?;

    Ok(LoadedModel {
        encoder,
        head,
        tokenizer,
        device: device.clone(),
    })
}

fn score_pairs(model: &LoadedModel, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<f32>> {
    let mut tokenizer = model.tokenizer.clone();
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..Default::default()
    }));

    let pairs: Vec<(String, String)> = candidates
        .iter()
        .map(|c| (query.to_string(), c.text.clone()))
        .collect();

    let encodings = tokenizer
        .encode_batch(pairs, true)
        .map_err(|e| SearchError::Embedding(format!("tokenization failed: {e}")))?;

    let token_ids: Vec<Tensor> = encodings
        .iter()
        .map(|enc| Tensor::new(enc.get_ids(), &model.device))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| SearchError::Embedding(format!("failed to build token tensor: {e}")))?;
    let token_ids = Tensor::stack(&token_ids, 0)
        .map_err(|e| SearchError::Embedding(format!("failed to stack tokens: {e}")))?;

    let hidden = model
        .encoder
        .forward(&token_ids)
        .map_err(|e| SearchError::Embedding(format!("encoder forward failed: {e}")))?;
    // [CLS] pooling: classification heads on BERT-family encoders read the
    // first token's hidden state.
    let cls = hidden
        .i((.., 0, ..))
        .map_err(|e| SearchError::Embedding(format!("CLS slice failed: {e}")))?;
    let logits = model
        .head
        .forward(&cls)
        .map_err(|e| SearchError::Embedding(format!("classification head failed: {e}")))?;

    logits
        .squeeze(1)
        .and_then(|t| t.to_vec1::<f32>())
        .map_err(|e| SearchError::Embedding(format!("failed to read logits: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidates_never_touch_the_model() {
        let reranker = CrossEncoderReranker::new("jinaai/jina-reranker-v1-tiny-en");
        let result = tokio_test_block_on(reranker.rerank("query", vec![]));
        assert!(result.unwrap().is_empty());
    }

    fn tokio_test_block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }
}
