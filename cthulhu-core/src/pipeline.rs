//! One scheduled generation cycle.
//!
//! The external scheduler (cron-like) invokes `run_once` periodically:
//! pick the next unused article inside the lookback window, run the
//! director over it, optionally attach an illustration, and persist the
//! result. Runs over the same story must be serialized by the caller.

use crate::director::{DirectorError, StoryDirector};
use crate::images::{self, ImageError};
use crate::news::NewsFeed;
use crate::store::{self, CounterStore, SceneStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use textgen::{ImageGenerator, TextGenerator};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from a pipeline cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no news articles found to process")]
    NoArticles,

    #[error(transparent)]
    Director(#[from] DirectorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Configuration for a pipeline cycle.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How far back to look for an unused article.
    pub lookback: Duration,

    /// Whether a cycle with no eligible article is an error or a zero
    /// count.
    pub raise_on_empty: bool,

    /// Run the counter reconciliation sweep before generating.
    pub reconcile_first: bool,

    /// Where to write illustrations; `None` skips the illustration step.
    pub image_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(24),
            raise_on_empty: false,
            reconcile_first: true,
            image_dir: None,
        }
    }
}

/// Run one generation cycle at `now`. Returns the number of scenes
/// persisted.
pub async fn run_once<G: TextGenerator>(
    director: &StoryDirector<G>,
    feed: &dyn NewsFeed,
    scenes: &mut dyn SceneStore,
    counters: &mut dyn CounterStore,
    imager: Option<&dyn ImageGenerator>,
    now: DateTime<Utc>,
    config: &PipelineConfig,
) -> Result<usize, PipelineError> {
    if config.reconcile_first {
        store::reconcile_counters(scenes, counters)?;
    }

    let history = scenes.load_scenes()?;
    let used_titles = scenes.used_titles()?;
    let articles = feed
        .fetch(Some(now - config.lookback), Some(now), 1, &used_titles)
        .await?;

    let Some(article) = articles.into_iter().next() else {
        if config.raise_on_empty {
            return Err(PipelineError::NoArticles);
        }
        warn!("no news articles found to process");
        return Ok(0);
    };

    info!(title = %article.title, "processing news article");
    let mut new_scenes = director
        .generate_scenes(&history, &[(article, now)], counters)
        .await?;

    if let (Some(imager), Some(image_dir)) = (imager, &config.image_dir) {
        images::attach_illustrations(&mut new_scenes, imager, image_dir).await?;
    }

    let inserted = scenes.insert_scenes(&new_scenes)?;
    info!(inserted, "finished generation cycle");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::MemoryNewsFeed;
    use crate::store::{MemoryCounterStore, MemorySceneStore};
    use crate::testing::{sample_article, scene_response, summary_response, ScriptedGenerator};
    use chrono::TimeZone;

    fn quiet_director(generator: ScriptedGenerator) -> StoryDirector<ScriptedGenerator> {
        StoryDirector::new(generator).with_config(
            crate::director::DirectorConfig::new().with_scene_pause(std::time::Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_run_once_generates_and_persists() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let generator = ScriptedGenerator::new(vec![
            scene_response("The Pier", "But the record omits much."),
            summary_response("A story begins."),
        ]);
        let director = quiet_director(generator);
        let feed = MemoryNewsFeed::new(vec![sample_article("Fresh headline", now - Duration::hours(2))]);
        let mut scenes = MemorySceneStore::new();
        let mut counters = MemoryCounterStore::new();

        let inserted = run_once(
            &director,
            &feed,
            &mut scenes,
            &mut counters,
            None,
            now,
            &PipelineConfig::default(),
        )
        .await
        .expect("cycle");

        assert_eq!(inserted, 1);
        assert_eq!(scenes.load_scenes().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_once_skips_used_titles() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let generator = ScriptedGenerator::new(vec![
            scene_response("The Pier", "But the record omits much."),
            summary_response("A story begins."),
        ]);
        let director = quiet_director(generator);
        let feed = MemoryNewsFeed::new(vec![sample_article("Only headline", now - Duration::hours(2))]);
        let mut scenes = MemorySceneStore::new();
        let mut counters = MemoryCounterStore::new();

        let config = PipelineConfig::default();
        let first = run_once(&director, &feed, &mut scenes, &mut counters, None, now, &config)
            .await
            .unwrap();
        assert_eq!(first, 1);

        // The only article is now used; the next cycle finds nothing.
        let second = run_once(&director, &feed, &mut scenes, &mut counters, None, now, &config)
            .await
            .unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_run_once_raises_on_empty_when_asked() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let director = quiet_director(ScriptedGenerator::new(vec![]));
        let feed = MemoryNewsFeed::new(vec![]);
        let mut scenes = MemorySceneStore::new();
        let mut counters = MemoryCounterStore::new();

        let config = PipelineConfig {
            raise_on_empty: true,
            ..Default::default()
        };
        let result = run_once(&director, &feed, &mut scenes, &mut counters, None, now, &config).await;
        assert!(matches!(result, Err(PipelineError::NoArticles)));
    }
}
