//! BERT token-classification NER via Candle.
//!
//! Loads a Hugging Face `BertForTokenClassification` checkpoint from a local directory
//! (`config.json`, `tokenizer.json`, `model.safetensors`). Tag names come from the config's
//! `id2label`, so both CoNLL (`B-ORG`) and OntoNotes (`B-WORK_OF_ART`) models work.
//! Noun chunks are still produced by the rule-based chunker.

use std::path::Path;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::rules::RuleBasedPipeline;
use super::{Analysis, Entity, EntityLabel, LanguagePipeline, NlpError};

const MAX_TOKENS: usize = 512;
/// Long CVs are tagged in windows of this many words.
const WINDOW_WORDS: usize = 200;

pub struct BertNerPipeline {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    tags: Vec<String>,
    device: Device,
    chunker: RuleBasedPipeline,
}

impl BertNerPipeline {
    pub fn load(model_dir: &Path) -> Result<Self, NlpError> {
        info!("Loading NER model from {:?}", model_dir);
        let device = Device::Cpu;

        let config_str = std::fs::read_to_string(model_dir.join("config.json"))
            .map_err(|e| NlpError::ModelLoad(format!("Failed to read config: {e}")))?;
        let raw: serde_json::Value = serde_json::from_str(&config_str)
            .map_err(|e| NlpError::ModelLoad(format!("Failed to parse config: {e}")))?;
        let config: Config = serde_json::from_value(raw.clone())
            .map_err(|e| NlpError::ModelLoad(format!("Failed to parse BERT config: {e}")))?;
        let hidden_size = raw
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| NlpError::ModelLoad("config has no hidden_size".to_string()))?
            as usize;
        let tags = parse_id2label(&raw)?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| NlpError::ModelLoad(format!("Failed to load tokenizer: {e}")))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| NlpError::ModelLoad(format!("Failed to configure truncation: {e}")))?;

        let weights = model_dir.join("model.safetensors");
        // SAFETY: read-only memory map of a local weights file.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)
                .map_err(|e| NlpError::ModelLoad(format!("Failed to load weights: {e}")))?
        };

        let model = BertModel::load(vb.pp("bert"), &config)
            .map_err(|e| NlpError::ModelLoad(format!("Failed to create BERT model: {e}")))?;
        let classifier = candle_nn::linear(hidden_size, tags.len(), vb.pp("classifier"))
            .map_err(|e| NlpError::ModelLoad(format!("Failed to load classifier head: {e}")))?;

        info!("NER model ready ({} tags)", tags.len());
        Ok(Self {
            model,
            classifier,
            tokenizer,
            tags,
            device,
            chunker: RuleBasedPipeline::new(),
        })
    }

    fn tag_window(&self, window: &str, offset: usize) -> Result<Vec<(usize, Entity)>, NlpError> {
        let encoding = self
            .tokenizer
            .encode(window, true)
            .map_err(|e| NlpError::Inference(format!("Tokenization failed: {e}")))?;

        let ids = encoding.get_ids();
        let input_ids = Tensor::new(ids, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference)?;
        let token_type_ids = input_ids.zeros_like().map_err(inference)?;
        let attention_mask = input_ids.ones_like().map_err(inference)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(inference)?;
        let predictions = self
            .classifier
            .forward(&hidden)
            .and_then(|logits| logits.squeeze(0))
            .and_then(|logits| logits.argmax(D::Minus1))
            .and_then(|ids| ids.to_vec1::<u32>())
            .map_err(inference)?;

        let tagged: Vec<TaggedToken> = encoding
            .get_offsets()
            .iter()
            .zip(encoding.get_special_tokens_mask())
            .zip(&predictions)
            .filter(|((_, special), _)| **special == 0)
            .map(|((&(start, end), _), &pred)| TaggedToken {
                start,
                end,
                tag: self.tags.get(pred as usize).map(String::as_str).unwrap_or("O"),
            })
            .collect();

        Ok(merge_bio(&tagged)
            .into_iter()
            .filter_map(|(start, end, kind)| {
                let text = window.get(start..end)?.trim();
                (!text.is_empty())
                    .then(|| (offset + start, Entity::new(text, EntityLabel::from_tag(kind))))
            })
            .collect())
    }
}

impl LanguagePipeline for BertNerPipeline {
    fn name(&self) -> &str {
        "bert-ner"
    }

    fn analyze(&self, text: &str) -> Result<Analysis, NlpError> {
        let mut found = Vec::new();
        for (start, end) in word_windows(text, WINDOW_WORDS) {
            found.extend(self.tag_window(&text[start..end], start)?);
        }
        found.sort_by_key(|(start, _)| *start);
        debug!("NER found {} entities", found.len());

        Ok(Analysis {
            noun_chunks: self.chunker.noun_chunks(text),
            entities: found.into_iter().map(|(_, e)| e).collect(),
        })
    }
}

fn inference(e: candle_core::Error) -> NlpError {
    NlpError::Inference(e.to_string())
}

/// Reads `id2label` (`{"0": "O", "1": "B-PER", ...}`) into an index-ordered tag list.
fn parse_id2label(config: &serde_json::Value) -> Result<Vec<String>, NlpError> {
    let map = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| NlpError::ModelLoad("config has no id2label".to_string()))?;

    let mut tags = vec![String::from("O"); map.len()];
    for (id, label) in map {
        let index: usize = id
            .parse()
            .map_err(|_| NlpError::ModelLoad(format!("bad id2label key '{id}'")))?;
        let label = label
            .as_str()
            .ok_or_else(|| NlpError::ModelLoad(format!("bad id2label value for '{id}'")))?;
        if index >= tags.len() {
            return Err(NlpError::ModelLoad(format!("id2label index {index} out of range")));
        }
        tags[index] = label.to_string();
    }
    Ok(tags)
}

#[derive(Debug, Clone, Copy)]
struct TaggedToken<'a> {
    start: usize,
    end: usize,
    tag: &'a str,
}

/// Groups BIO-tagged word pieces into `(start, end, type)` byte spans.
/// A piece glued to the previous one (no gap) always extends the open entity.
fn merge_bio<'a>(tokens: &[TaggedToken<'a>]) -> Vec<(usize, usize, &'a str)> {
    let mut spans = Vec::new();
    let mut open: Option<(usize, usize, &'a str)> = None;

    for token in tokens {
        if let Some((_, end, _)) = open.as_mut() {
            if token.start == *end {
                *end = token.end;
                continue;
            }
        }

        let (prefix, kind) = match token.tag.split_once('-') {
            Some((prefix, kind)) => (prefix, kind),
            None => ("", token.tag),
        };

        if kind == "O" {
            spans.extend(open.take());
            continue;
        }

        let continues = matches!(open, Some((_, _, open_kind)) if prefix == "I" && open_kind == kind);
        if continues {
            if let Some((_, end, _)) = open.as_mut() {
                *end = token.end;
            }
        } else {
            spans.extend(open.take());
            open = Some((token.start, token.end, kind));
        }
    }
    spans.extend(open);

    spans
}

/// Byte ranges covering at most `size` whitespace-separated words each.
fn word_windows(text: &str, size: usize) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    let mut words = 0;
    let mut current: Option<(usize, usize)> = None;

    for (start, word) in text
        .split_whitespace()
        .map(|w| (w.as_ptr() as usize - text.as_ptr() as usize, w))
    {
        let end = start + word.len();
        if words == size {
            windows.extend(current.take());
            words = 0;
        }
        current = Some(match current {
            Some((window_start, _)) => (window_start, end),
            None => (start, end),
        });
        words += 1;
    }
    windows.extend(current);

    windows
}
