//! MiniLM sentence embedder using Candle.
//!
//! Uses sentence-transformers/all-MiniLM-L6-v2:
//! - 384 dimensions
//! - 256 max tokens
//! - mean pooling, L2 normalized

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{EmbedError, SentenceEmbedder};

/// Model identifier on HuggingFace Hub.
pub const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

const MAX_TOKENS: usize = 256;

const MODEL_FILES: [&str; 3] = ["tokenizer.json", "config.json", "model.safetensors"];

pub struct CandleEmbedder {
    device: Device,
    model: BertModel,
    tokenizer: Tokenizer,
}

impl CandleEmbedder {
    /// Loads the model from `model_dir` when given, otherwise from the Hub cache
    /// (downloading on first use).
    pub fn load(model_dir: Option<&Path>) -> Result<Self, EmbedError> {
        let [tokenizer_path, config_path, weights_path] = match model_dir {
            Some(dir) => {
                info!("Loading embedding model from {:?}", dir);
                MODEL_FILES.map(|file| dir.join(file))
            }
            None => {
                info!("Loading embedding model {} from HuggingFace Hub", MODEL_ID);
                fetch_from_hub()?
            }
        };

        let device = Device::Cpu;

        debug!("Loading tokenizer...");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to load tokenizer: {e}")))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to configure truncation: {e}")))?;

        debug!("Loading config...");
        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to read config: {e}")))?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to parse config: {e}")))?;

        debug!("Loading model weights...");
        // SAFETY: read-only memory map of the model weights.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| EmbedError::ModelLoad(format!("Failed to load weights: {e}")))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to create BERT model: {e}")))?;

        info!("CandleEmbedder initialized successfully");
        Ok(Self {
            device,
            model,
            tokenizer,
        })
    }

    /// Mean pooling with attention mask.
    fn mean_pooling(&self, token_embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbedError> {
        let mask = attention_mask
            .unsqueeze(2)
            .and_then(|m| m.broadcast_as(token_embeddings.shape()))
            .and_then(|m| m.to_dtype(DType::F32))
            .map_err(|e| EmbedError::Inference(format!("mask expansion failed: {e}")))?;

        let sum = token_embeddings
            .mul(&mask)
            .and_then(|masked| masked.sum(1))
            .map_err(|e| EmbedError::Inference(format!("masked sum failed: {e}")))?;
        let count = mask
            .sum(1)
            .and_then(|s| s.clamp(1e-9, f64::MAX))
            .map_err(|e| EmbedError::Inference(format!("mask sum failed: {e}")))?;

        sum.div(&count)
            .map_err(|e| EmbedError::Inference(format!("div failed: {e}")))
    }

    /// L2 normalize embeddings.
    fn normalize(&self, embeddings: &Tensor) -> Result<Tensor, EmbedError> {
        let norm = embeddings
            .sqr()
            .and_then(|t| t.sum_keepdim(1))
            .and_then(|t| t.sqrt())
            .and_then(|t| t.clamp(1e-12, f64::MAX))
            .map_err(|e| EmbedError::Inference(format!("norm failed: {e}")))?;

        embeddings
            .broadcast_div(&norm)
            .map_err(|e| EmbedError::Inference(format!("div failed: {e}")))
    }
}

impl SentenceEmbedder for CandleEmbedder {
    fn model_name(&self) -> &str {
        MODEL_ID
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbedError::Inference(format!("Tokenization failed: {e}")))?;

        let ids = encoding.get_ids();
        let len = ids.len();
        let input_ids = Tensor::from_vec(ids.to_vec(), (1, len), &self.device)
            .map_err(|e| EmbedError::Inference(format!("Failed to create input_ids tensor: {e}")))?;
        let attention_mask = Tensor::from_vec(encoding.get_attention_mask().to_vec(), (1, len), &self.device)
            .map_err(|e| EmbedError::Inference(format!("Failed to create attention_mask tensor: {e}")))?;
        let token_type_ids = input_ids
            .zeros_like()
            .map_err(|e| EmbedError::Inference(format!("Failed to create token_type_ids tensor: {e}")))?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbedError::Inference(format!("Model forward failed: {e}")))?;

        let pooled = self.mean_pooling(&output, &attention_mask)?;
        self.normalize(&pooled)?
            .get(0)
            .and_then(|row| row.to_vec1::<f32>())
            .map_err(|e| EmbedError::Inference(format!("Failed to convert to vec: {e}")))
    }
}

fn fetch_from_hub() -> Result<[PathBuf; 3], EmbedError> {
    let api = Api::new().map_err(|e| EmbedError::ModelLoad(format!("Failed to create HF API: {e}")))?;
    let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

    let mut paths = Vec::with_capacity(MODEL_FILES.len());
    for file in MODEL_FILES {
        debug!("Fetching {file}...");
        let path = repo
            .get(file)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download {file}: {e}")))?;
        paths.push(path);
    }

    paths
        .try_into()
        .map_err(|_| EmbedError::ModelLoad("incomplete model download".to_string()))
}
