//! Persistent store contracts and in-memory implementations.
//!
//! The engine talks to two stores: a scene store with unique constraints on
//! scene number and news title, and a per-faction counter store. Both are
//! expected to make individual updates atomic per key; there are no
//! cross-key transactions, and `reconcile_counters` is the recovery path
//! when the totals are suspected to have drifted.

use crate::catalog;
use crate::counters::{self, WinCounters};
use crate::faction::Faction;
use crate::scene::{Comment, Scene, VoteKind, Votes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("scene {0} not found")]
    SceneNotFound(u64),

    #[error("counter row for faction '{0}' not found")]
    CounterNotFound(Faction),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// One faction's durable counter row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterRow {
    pub faction: Faction,
    pub counter: f64,
    /// Victory threshold; re-syncable from the catalog without touching
    /// the counter itself.
    pub limit_value: f64,
}

/// Store of finalized scenes.
///
/// Inserts are idempotent: a scene whose number or news title already
/// exists is skipped, not an error.
pub trait SceneStore: Send {
    /// All scenes, ordered by scene number.
    fn load_scenes(&self) -> Result<Vec<Scene>, StoreError>;

    /// One scene by number.
    fn load_scene(&self, scene_number: u64) -> Result<Option<Scene>, StoreError>;

    /// Insert scenes, skipping conflicts. Returns how many were inserted.
    fn insert_scenes(&mut self, scenes: &[Scene]) -> Result<usize, StoreError>;

    /// Record a reader vote; returns the new tally.
    fn record_vote(
        &mut self,
        scene_number: u64,
        vote: VoteKind,
        voter: Option<&str>,
    ) -> Result<Votes, StoreError>;

    /// Append a reader comment.
    fn submit_comment(&mut self, scene_number: u64, comment: Comment) -> Result<(), StoreError>;

    /// Append an accepted scene update.
    fn add_scene_update(&mut self, scene_number: u64, update: &str) -> Result<(), StoreError>;

    /// Overwrite a scene's reconciled counter contribution.
    fn set_scene_counters(
        &mut self,
        scene_number: u64,
        scene_counters: WinCounters,
    ) -> Result<(), StoreError>;

    /// News titles already turned into scenes, for feed exclusion.
    fn used_titles(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .load_scenes()?
            .into_iter()
            .map(|s| s.news.title)
            .collect())
    }

    /// Timestamp of the most recent scene, if any.
    fn latest_scene_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .load_scenes()?
            .iter()
            .map(|s| s.scene_timestamp)
            .max())
    }
}

/// Store of the per-faction running totals.
pub trait CounterStore: Send {
    /// Both counter rows.
    fn get_counters(&self) -> Result<[CounterRow; 2], StoreError>;

    /// Overwrite both totals (limits unchanged).
    fn set_counters(&mut self, counters: &WinCounters) -> Result<(), StoreError>;

    /// Add a delta to both totals (limits unchanged).
    fn increment_counters(&mut self, delta: &WinCounters) -> Result<(), StoreError>;

    /// Refresh the limit values from the catalog seeds without resetting
    /// the counters.
    fn sync_limits(&mut self) -> Result<(), StoreError>;

    /// The totals as a `WinCounters`.
    fn current(&self) -> Result<WinCounters, StoreError> {
        let rows = self.get_counters()?;
        let mut counters = WinCounters::zero();
        for row in rows {
            counters[row.faction] = row.counter;
        }
        Ok(counters)
    }
}

/// Recompute every scene's counters from its own vote tally, rewrite them
/// in the scene store, and reset the totals to seed + sum.
///
/// Votes never trigger lazy recomputation; this sweep is the only path
/// that folds vote changes back into the totals, which keeps the totals
/// auditable against the scene history at any time.
pub fn reconcile_counters(
    scenes: &mut dyn SceneStore,
    counter_store: &mut dyn CounterStore,
) -> Result<WinCounters, StoreError> {
    let all = scenes.load_scenes()?;
    let mut contributions = Vec::with_capacity(all.len());
    for scene in &all {
        let recomputed = counters::compute_scene_counters(scene);
        scenes.set_scene_counters(scene.scene_number, recomputed)?;
        contributions.push(recomputed);
    }

    let mut totals = seeded_counters();
    totals.add(&counters::sum_scene_counters(&contributions));
    counter_store.set_counters(&totals)?;
    info!(
        cultists = totals.cultists,
        detectives = totals.detectives,
        scenes = all.len(),
        "reconciled win counters from scene history"
    );
    Ok(totals)
}

/// The catalog seed values as a `WinCounters`.
pub fn seeded_counters() -> WinCounters {
    let mut counters = WinCounters::zero();
    for faction in Faction::ALL {
        counters[faction] = catalog::counter_seed(faction).init_value;
    }
    counters
}

/// In-memory scene store, ordered by scene number.
#[derive(Debug, Default)]
pub struct MemorySceneStore {
    scenes: Vec<Scene>,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with existing history.
    pub fn with_scenes(scenes: Vec<Scene>) -> Self {
        let mut store = Self::new();
        // Route through insert to enforce the unique constraints.
        let _ = store.insert_scenes(&scenes);
        store
    }

    fn scene_mut(&mut self, scene_number: u64) -> Result<&mut Scene, StoreError> {
        self.scenes
            .iter_mut()
            .find(|s| s.scene_number == scene_number)
            .ok_or(StoreError::SceneNotFound(scene_number))
    }
}

impl SceneStore for MemorySceneStore {
    fn load_scenes(&self) -> Result<Vec<Scene>, StoreError> {
        Ok(self.scenes.clone())
    }

    fn load_scene(&self, scene_number: u64) -> Result<Option<Scene>, StoreError> {
        Ok(self
            .scenes
            .iter()
            .find(|s| s.scene_number == scene_number)
            .cloned())
    }

    fn insert_scenes(&mut self, scenes: &[Scene]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for scene in scenes {
            let conflict = self.scenes.iter().any(|existing| {
                existing.scene_number == scene.scene_number
                    || existing.news.title == scene.news.title
            });
            if conflict {
                debug!(
                    scene_number = scene.scene_number,
                    title = %scene.news.title,
                    "skipping conflicting scene insert"
                );
                continue;
            }
            self.scenes.push(scene.clone());
            inserted += 1;
        }
        self.scenes.sort_by_key(|s| s.scene_number);
        info!(count = inserted, "inserted scenes");
        Ok(inserted)
    }

    fn record_vote(
        &mut self,
        scene_number: u64,
        vote: VoteKind,
        voter: Option<&str>,
    ) -> Result<Votes, StoreError> {
        let scene = self.scene_mut(scene_number)?;
        scene.record_vote(vote, voter);
        Ok(scene.reactions.votes.clone())
    }

    fn submit_comment(&mut self, scene_number: u64, comment: Comment) -> Result<(), StoreError> {
        self.scene_mut(scene_number)?.add_comment(comment);
        Ok(())
    }

    fn add_scene_update(&mut self, scene_number: u64, update: &str) -> Result<(), StoreError> {
        let scene = self.scene_mut(scene_number)?;
        scene.scene_updates.push(update.to_string());
        info!(scene_number, "added scene update");
        Ok(())
    }

    fn set_scene_counters(
        &mut self,
        scene_number: u64,
        scene_counters: WinCounters,
    ) -> Result<(), StoreError> {
        self.scene_mut(scene_number)?.scene_counters = scene_counters;
        Ok(())
    }
}

/// In-memory counter store seeded from the catalog.
#[derive(Debug)]
pub struct MemoryCounterStore {
    rows: [CounterRow; 2],
}

impl MemoryCounterStore {
    /// A store with both rows at their catalog seed values.
    pub fn new() -> Self {
        let rows = Faction::ALL.map(|faction| {
            let seed = catalog::counter_seed(faction);
            CounterRow {
                faction,
                counter: seed.init_value,
                limit_value: seed.limit_value,
            }
        });
        Self { rows }
    }

    fn row_mut(&mut self, faction: Faction) -> &mut CounterRow {
        self.rows
            .iter_mut()
            .find(|r| r.faction == faction)
            .expect("both faction rows exist by construction")
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterStore for MemoryCounterStore {
    fn get_counters(&self) -> Result<[CounterRow; 2], StoreError> {
        Ok(self.rows)
    }

    fn set_counters(&mut self, counters: &WinCounters) -> Result<(), StoreError> {
        for faction in Faction::ALL {
            self.row_mut(faction).counter = counters.get(faction);
        }
        info!(
            cultists = counters.cultists,
            detectives = counters.detectives,
            "set total counters"
        );
        Ok(())
    }

    fn increment_counters(&mut self, delta: &WinCounters) -> Result<(), StoreError> {
        for faction in Faction::ALL {
            self.row_mut(faction).counter += delta.get(faction);
        }
        info!(
            cultists = delta.cultists,
            detectives = delta.detectives,
            "incremented total counters"
        );
        Ok(())
    }

    fn sync_limits(&mut self) -> Result<(), StoreError> {
        for faction in Faction::ALL {
            let limit = catalog::counter_seed(faction).limit_value;
            self.row_mut(faction).limit_value = limit;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::truth_factor;
    use crate::draft::draft_scene_with_rng;
    use crate::scene::NewsArticle;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_scene(number: u64, title: &str) -> Scene {
        let article = NewsArticle {
            title: title.to_string(),
            summary: "Summary.".to_string(),
            url: "https://example.com".to_string(),
            source: "Courier".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            tags: Default::default(),
        };
        let mut rng = StdRng::seed_from_u64(number);
        draft_scene_with_rng(
            &article,
            number,
            Faction::Cultists,
            &WinCounters::zero(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            &mut rng,
        )
    }

    #[test]
    fn test_insert_skips_duplicate_scene_number() {
        let mut store = MemorySceneStore::new();
        let a = sample_scene(1, "First article");
        let b = sample_scene(1, "Different article");

        assert_eq!(store.insert_scenes(&[a]).unwrap(), 1);
        assert_eq!(store.insert_scenes(&[b]).unwrap(), 0);
        assert_eq!(store.load_scenes().unwrap().len(), 1);
    }

    #[test]
    fn test_insert_skips_duplicate_news_title() {
        let mut store = MemorySceneStore::new();
        let a = sample_scene(1, "Same headline");
        let b = sample_scene(2, "Same headline");

        assert_eq!(store.insert_scenes(&[a, b]).unwrap(), 1);
    }

    #[test]
    fn test_counter_store_seeded_and_incremented() {
        let mut store = MemoryCounterStore::new();
        assert_eq!(store.current().unwrap(), seeded_counters());

        store
            .increment_counters(&WinCounters {
                cultists: 1.0,
                detectives: -0.2,
            })
            .unwrap();
        let current = store.current().unwrap();
        assert_eq!(current.cultists, 2.0);
        assert_eq!(current.detectives, 0.8);

        // Limits survive increments and re-sync.
        store.sync_limits().unwrap();
        for row in store.get_counters().unwrap() {
            assert_eq!(row.limit_value, 30.0);
        }
        assert_eq!(store.current().unwrap(), current);
    }

    #[test]
    fn test_reconcile_matches_incremental_totals() {
        let mut scenes = MemorySceneStore::new();
        let mut counter_store = MemoryCounterStore::new();

        for n in 1..=4 {
            let scene = sample_scene(n, &format!("Article {n}"));
            counter_store
                .increment_counters(&scene.scene_counters)
                .unwrap();
            scenes.insert_scenes(&[scene]).unwrap();
        }

        let incremental = counter_store.current().unwrap();
        let reconciled = reconcile_counters(&mut scenes, &mut counter_store).unwrap();

        // No votes were cast, so the sweep must reproduce the running
        // totals exactly.
        assert_eq!(reconciled, incremental);
        assert_eq!(counter_store.current().unwrap(), incremental);
    }

    #[test]
    fn test_reconcile_applies_vote_factor() {
        let mut scenes = MemorySceneStore::new();
        let mut counter_store = MemoryCounterStore::new();

        let scene = sample_scene(1, "Voted article");
        let raw = scene.scene_counters;
        scenes.insert_scenes(&[scene]).unwrap();

        for _ in 0..10 {
            scenes.record_vote(1, VoteKind::Truth, None).unwrap();
        }

        let totals = reconcile_counters(&mut scenes, &mut counter_store).unwrap();
        let factor = truth_factor(10, 0);
        let stored = scenes.load_scene(1).unwrap().unwrap().scene_counters;
        assert_eq!(stored, raw.scaled(factor));

        let mut expected = seeded_counters();
        expected.add(&stored);
        assert_eq!(totals, expected);
    }

    #[test]
    fn test_used_titles_and_latest_timestamp() {
        let mut store = MemorySceneStore::new();
        assert!(store.latest_scene_timestamp().unwrap().is_none());

        store
            .insert_scenes(&[sample_scene(1, "One"), sample_scene(2, "Two")])
            .unwrap();
        let titles = store.used_titles().unwrap();
        assert!(titles.contains(&"One".to_string()));
        assert!(titles.contains(&"Two".to_string()));
        assert!(store.latest_scene_timestamp().unwrap().is_some());
    }
}
