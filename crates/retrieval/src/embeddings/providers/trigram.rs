//! Trigram embedding provider using character trigram-based content-aware embeddings.

use std::collections::{BTreeMap, HashSet};

use crate::embeddings::provider::EmbeddingProvider;
use crate::text::word_tokens;
use docqa_core::AppResult;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "did", "does", "what", "where", "when", "who", "how",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Vectors are content-dependent but not semantic, which is
/// enough for lexical retrieval over a single document.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
    normalize: bool,
    stop_words: HashSet<&'static str>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            normalize: true,
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Enable or disable unit-length normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    fn bucket(&self, bytes: &[u8], seed: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, b| acc.wrapping_mul(seed).wrapping_add(*b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn generate_trigram_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        // ordered so bucket sums are accumulated the same way on every call
        let mut word_freq: BTreeMap<String, u32> = BTreeMap::new();
        for word in word_tokens(text) {
            if word.chars().count() > 2 && !self.stop_words.contains(word.as_str()) {
                *word_freq.entry(word).or_insert(0) += 1;
            }
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                let trigram: String = trigram.iter().collect();
                let dim = self.bucket(trigram.as_bytes(), 37);
                // sqrt keeps frequent words from dominating the trigram buckets
                embedding[dim] += (*freq as f32).sqrt();
            }

            let dim = self.bucket(word.as_bytes(), 31);
            embedding[dim] += *freq as f32;
        }

        if self.normalize {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect())
    }
}
