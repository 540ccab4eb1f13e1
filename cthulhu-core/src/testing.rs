//! Testing utilities for the story engine.
//!
//! - `ScriptedGenerator` answers generation requests from a queue, for
//!   deterministic tests without network calls
//! - `ScriptedEmbedder` / `ScriptedImager` do the same for the optional
//!   capabilities
//! - `StoryHarness` wires a director to in-memory stores
//! - assertion helpers for verifying story state

use crate::counters::WinCounters;
use crate::director::retrieval::Embedder;
use crate::director::{DirectorConfig, DirectorError, StoryDirector};
use crate::scene::{NewsArticle, Scene};
use crate::store::{CounterStore, MemoryCounterStore, MemorySceneStore, SceneStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration as StdDuration;
use textgen::{GeneratedImage, GenerationError, ImageGenerator, TextGenerator};

/// A text generator that returns scripted JSON responses in order.
///
/// Every request is recorded, so tests can assert on the prompts the
/// engine composed. When the script runs dry, requests fail the way a
/// broken provider would.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<serde_json::Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// One recorded generation request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system_role: String,
    pub user_prompt: String,
    pub model: String,
    pub max_tokens: usize,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<serde_json::Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append a response to the script.
    pub fn queue(&self, response: serde_json::Value) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// All requests made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_json(
        &self,
        system_role: &str,
        user_prompt: &str,
        model: &str,
        max_tokens: usize,
    ) -> Result<serde_json::Value, GenerationError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system_role: system_role.to_string(),
            user_prompt: user_prompt.to_string(),
            model: model.to_string(),
            max_tokens,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Transport("no scripted responses left".to_string()))
    }
}

/// An embedder that returns scripted vectors in order.
#[derive(Debug, Default)]
pub struct ScriptedEmbedder {
    vectors: Mutex<VecDeque<Vec<f32>>>,
}

impl ScriptedEmbedder {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self {
            vectors: Mutex::new(vectors.into()),
        }
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, GenerationError> {
        self.vectors
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Transport("no scripted embeddings left".to_string()))
    }
}

/// An image generator that returns scripted byte payloads in order.
#[derive(Debug, Default)]
pub struct ScriptedImager {
    images: Mutex<VecDeque<Vec<u8>>>,
}

impl ScriptedImager {
    pub fn new(images: Vec<Vec<u8>>) -> Self {
        Self {
            images: Mutex::new(images.into()),
        }
    }
}

#[async_trait]
impl ImageGenerator for ScriptedImager {
    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, GenerationError> {
        let bytes = self
            .images
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Transport("no scripted images left".to_string()))?;
        Ok(GeneratedImage {
            bytes,
            revised_prompt: None,
        })
    }
}

/// The scene-prose response shape.
pub fn scene_response(title: &str, text: &str) -> serde_json::Value {
    json!({ "scene_title": title, "scene_text": text })
}

/// The story-summary response shape.
pub fn summary_response(summary: &str) -> serde_json::Value {
    json!({ "story_summary": summary })
}

/// A fully well-behaved moderation response; tests override fields as
/// needed.
pub fn moderation_response(scene_update: &str) -> serde_json::Value {
    json!({
        "censored_comment": "A cleaned comment.",
        "scene_update": scene_update,
        "pertinence": "high",
        "stylistic_quality": "high",
        "novelty": "medium",
        "unsafe": "no",
        "contradicting": "no",
        "sentiment": "neutral",
        "aggressive": "no",
        "sexual": "no",
        "spam": "no",
        "illegal": "no",
    })
}

/// A minimal valid article for tests.
pub fn sample_article(title: &str, published_at: DateTime<Utc>) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        summary: format!("Summary of '{title}'."),
        url: format!("https://example.com/{}", crate::images::slugify(title)),
        source: "Test Courier".to_string(),
        published_at,
        tags: Default::default(),
    }
}

/// Test harness wiring a director to in-memory stores.
pub struct StoryHarness {
    pub director: StoryDirector<ScriptedGenerator>,
    pub scene_store: MemorySceneStore,
    pub counter_store: MemoryCounterStore,
    clock: DateTime<Utc>,
}

impl StoryHarness {
    /// A harness with an empty script and zero inter-scene pause.
    pub fn new() -> Self {
        let config = DirectorConfig::new().with_scene_pause(StdDuration::ZERO);
        Self {
            director: StoryDirector::new(ScriptedGenerator::default()).with_config(config),
            scene_store: MemorySceneStore::new(),
            counter_store: MemoryCounterStore::new(),
            clock: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Queue the prose + summary responses for one scene.
    pub fn expect_scene(&mut self, title: &str, text: &str, summary: &str) -> &mut Self {
        self.director.generator().queue(scene_response(title, text));
        self.director.generator().queue(summary_response(summary));
        self
    }

    /// Generate scenes for `count` fresh articles and persist them.
    pub async fn run_articles(&mut self, count: usize) -> Result<Vec<Scene>, DirectorError> {
        let history = self.scene_store.load_scenes().expect("load history");
        let mut inputs = Vec::new();
        for _ in 0..count {
            self.clock += Duration::hours(12);
            inputs.push((
                sample_article(&format!("Headline at {}", self.clock), self.clock),
                self.clock,
            ));
        }
        let new_scenes = self
            .director
            .generate_scenes(&history, &inputs, &mut self.counter_store)
            .await?;
        self.scene_store
            .insert_scenes(&new_scenes)
            .expect("insert scenes");
        Ok(new_scenes)
    }

    /// Current totals from the counter store.
    pub fn totals(&self) -> WinCounters {
        self.counter_store.current().expect("current counters")
    }

    /// Number of persisted scenes.
    pub fn scene_count(&self) -> usize {
        self.scene_store.load_scenes().expect("load scenes").len()
    }
}

impl Default for StoryHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert two counter sets are equal within floating-point noise.
#[track_caller]
pub fn assert_counters_close(actual: &WinCounters, expected: &WinCounters) {
    assert!(
        (actual.cultists - expected.cultists).abs() < 1e-9
            && (actual.detectives - expected.detectives).abs() < 1e-9,
        "expected counters {expected:?}, got {actual:?}"
    );
}
