//! The story director: turn-by-turn scene production.
//!
//! Drives one story run over a batch of news articles: decides whose turn
//! it is, drafts the scene parameters, requests prose and a running
//! summary from the text-generation capability, validates everything, and
//! folds the scene's counter contribution into the durable totals. A
//! finished story is never continued.

pub mod moderation;
pub mod prompts;
pub mod retrieval;

use crate::draft::draft_scene;
use crate::faction::Faction;
use crate::scene::{IncompleteScene, NewsArticle, Scene};
use crate::store::{CounterStore, StoreError};
use chrono::{DateTime, Utc};
use retrieval::Embedder;
use std::time::Duration;
use textgen::{GenerationError, TextGenerator};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a director run.
///
/// All of these abort the current run; retry policy belongs to whatever
/// scheduler invoked it.
#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("generation response field '{field}' is missing or empty")]
    BadResponse { field: &'static str },

    #[error("generated scene failed its integrity check: {0}")]
    Incomplete(#[from] IncompleteScene),

    #[error("counter store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration for the director.
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// Model used for scene prose and the consistency rewrite.
    pub writer_model: String,

    /// Model used for story summaries.
    pub summarizer_model: String,

    /// Token budget per request.
    pub max_tokens: usize,

    /// Pause between consecutive scenes, throttling outbound calls.
    pub scene_pause: Duration,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            writer_model: "gpt-4o".to_string(),
            summarizer_model: "gpt-4o-mini".to_string(),
            max_tokens: 2048,
            scene_pause: Duration::from_millis(500),
        }
    }
}

impl DirectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_writer_model(mut self, model: impl Into<String>) -> Self {
        self.writer_model = model.into();
        self
    }

    pub fn with_summarizer_model(mut self, model: impl Into<String>) -> Self {
        self.summarizer_model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_scene_pause(mut self, pause: Duration) -> Self {
        self.scene_pause = pause;
        self
    }
}

/// The scene generation orchestrator.
pub struct StoryDirector<G: TextGenerator> {
    generator: G,
    config: DirectorConfig,
    embedder: Option<Box<dyn Embedder>>,
}

impl<G: TextGenerator> StoryDirector<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            config: DirectorConfig::default(),
            embedder: None,
        }
    }

    pub fn with_config(mut self, config: DirectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable the retrieval + consistency-rewrite stage.
    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Whose turn the next scene belongs to, given the history.
    ///
    /// Turns alternate from the previous scene's protagonists; the very
    /// first scene always belongs to the cultists. Alternation follows the
    /// last *finalized* scene, so a run resumed after a mid-batch failure
    /// stays consistent with what was actually persisted.
    pub fn next_protagonists(scenes_so_far: &[Scene]) -> Faction {
        match scenes_so_far.last() {
            None => Faction::Cultists,
            Some(last) => last.protagonists.opponent(),
        }
    }

    /// Produce scenes for a batch of `(article, timestamp)` inputs,
    /// strictly in order, one at a time.
    ///
    /// Counters are read from the store at the start and written back
    /// after every scene; callers must not run two directors over the
    /// same story concurrently. Returns only the newly created scenes.
    pub async fn generate_scenes(
        &self,
        scenes_so_far: &[Scene],
        inputs: &[(NewsArticle, DateTime<Utc>)],
        counter_store: &mut dyn CounterStore,
    ) -> Result<Vec<Scene>, DirectorError> {
        let mut scenes = scenes_so_far.to_vec();
        let n_initial = scenes.len();
        let mut scene_number = scenes.len() as u64 + 1;
        let mut current = counter_store.current()?;

        for (article, timestamp) in inputs {
            if scenes.last().map(|s| s.scene_ends_story).unwrap_or(false) {
                info!("the story has already ended, skipping scene creation");
                break;
            }

            let protagonists = Self::next_protagonists(&scenes);
            let mut scene = draft_scene(article, scene_number, protagonists, &current, *timestamp);

            let (title, text) = self.request_scene_prose(&scenes, &scene).await?;
            scene.scene_title = title;
            scene.scene_text = text;
            debug!(
                scene_number,
                title = %scene.scene_title,
                "received generated scene prose"
            );

            if let Some(embedder) = &self.embedder {
                self.consistency_pass(&mut scene, &scenes, embedder.as_ref())
                    .await?;
            }

            scene.story_summary = self.request_story_summary(&scenes, &scene).await?;
            debug!(scene_number, "received generated story summary");

            scene.validate_complete()?;

            counter_store.increment_counters(&scene.scene_counters)?;
            current.add(&scene.scene_counters);

            let ends_story = scene.scene_ends_story;
            if let Some(winner) = scene.story_winner {
                info!(winner = %winner, "story winner decided");
            }
            scenes.push(scene);

            if ends_story {
                break;
            }

            scene_number += 1;
            if !self.config.scene_pause.is_zero() {
                tokio::time::sleep(self.config.scene_pause).await;
            }
        }

        let new_scenes = scenes.split_off(n_initial);
        info!(count = new_scenes.len(), "finished director run");
        Ok(new_scenes)
    }

    async fn request_scene_prose(
        &self,
        history: &[Scene],
        draft: &Scene,
    ) -> Result<(String, String), DirectorError> {
        let prompt = prompts::scene_prompt(history, draft);
        let response = self
            .generator
            .generate_json(
                prompts::SCENE_ROLE,
                &prompt,
                &self.config.writer_model,
                self.config.max_tokens,
            )
            .await?;
        let title = expect_string(&response, "scene_title")?;
        let text = expect_string(&response, "scene_text")?;
        Ok((title, text))
    }

    async fn request_story_summary(
        &self,
        history: &[Scene],
        new_scene: &Scene,
    ) -> Result<String, DirectorError> {
        let mut all: Vec<Scene> = history.to_vec();
        all.push(new_scene.clone());
        let prompt = prompts::summary_prompt(&all);
        let response = self
            .generator
            .generate_json(
                prompts::SUMMARY_ROLE,
                &prompt,
                &self.config.summarizer_model,
                self.config.max_tokens,
            )
            .await?;
        expect_string(&response, "story_summary")
    }

    /// Embed the new scene, retrieve the most similar earlier scenes, and
    /// let the writer reconcile contradictions. The stored embedding
    /// always reflects the final text.
    async fn consistency_pass(
        &self,
        scene: &mut Scene,
        history: &[Scene],
        embedder: &dyn Embedder,
    ) -> Result<(), DirectorError> {
        let vector = embedder.embed(&scene.scene_text).await?;
        if vector.is_empty() {
            return Ok(());
        }

        let related = retrieval::top_relevant(
            history,
            &vector,
            retrieval::TOP_RELATED,
            retrieval::MIN_SIMILARITY,
        );
        if related.is_empty() {
            scene.embedding = Some(vector);
            return Ok(());
        }

        debug!(
            scene_number = scene.scene_number,
            related = related.len(),
            "running consistency rewrite against related scenes"
        );
        let prompt = prompts::fact_check_prompt(scene, &related);
        let response = self
            .generator
            .generate_json(
                prompts::FACT_CHECK_ROLE,
                &prompt,
                &self.config.writer_model,
                self.config.max_tokens,
            )
            .await?;
        scene.scene_text = expect_string(&response, "scene_text")?;
        scene.embedding = Some(embedder.embed(&scene.scene_text).await?);
        Ok(())
    }
}

/// Strict field extraction: the field must exist, be a string, and be
/// non-empty after trimming.
fn expect_string(
    response: &serde_json::Value,
    field: &'static str,
) -> Result<String, DirectorError> {
    match response.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(DirectorError::BadResponse { field }),
    }
}
