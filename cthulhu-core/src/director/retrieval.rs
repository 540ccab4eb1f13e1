//! Optional retrieval stage: embedding similarity over prior scenes.
//!
//! When an embedder is configured, the director embeds each new scene's
//! text and retrieves the most similar earlier scenes as context for a
//! consistency rewrite. Without one, retrieval returns no context and the
//! rewrite never runs.

use crate::scene::Scene;
use async_trait::async_trait;
use textgen::GenerationError;

/// How many related scenes the consistency pass sees.
pub const TOP_RELATED: usize = 3;

/// Scenes below this cosine similarity are not considered related.
pub const MIN_SIMILARITY: f32 = 0.1;

/// A model that turns text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError>;
}

/// An embedder that produces no vector, disabling retrieval.
#[derive(Debug, Default)]
pub struct NoopEmbedder;

#[async_trait]
impl Embedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, GenerationError> {
        Ok(Vec::new())
    }
}

/// Cosine similarity; zero for mismatched lengths or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// The `top_n` stored scenes most similar to the query vector, above the
/// minimum similarity. Scenes without a stored embedding are skipped.
pub fn top_relevant<'a>(
    scenes: &'a [Scene],
    query: &[f32],
    top_n: usize,
    min_similarity: f32,
) -> Vec<&'a Scene> {
    let mut scored: Vec<(f32, &Scene)> = scenes
        .iter()
        .filter_map(|scene| {
            let embedding = scene.embedding.as_ref()?;
            let similarity = cosine_similarity(query, embedding);
            (similarity > min_similarity).then_some((similarity, scene))
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(top_n).map(|(_, s)| s).collect()
}
