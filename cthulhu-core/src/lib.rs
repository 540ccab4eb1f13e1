//! Two-faction Cthulhu-mythos story engine driven by real news.
//!
//! This crate provides:
//! - A scene director that turns news articles into story scenes through a
//!   text-generation capability
//! - A two-faction win-counter engine with crowd-vote feedback
//! - Counter-gated story progression with win detection
//! - A comment moderation gate that admits reader rumors into canon
//! - Store contracts with in-memory implementations and JSON persistence
//!
//! # Quick Start
//!
//! ```ignore
//! use cthulhu_core::{DirectorConfig, StoryDirector};
//! use cthulhu_core::store::{MemoryCounterStore, SceneStore};
//!
//! # async fn run(generator: impl textgen::TextGenerator) {
//! let director = StoryDirector::new(generator)
//!     .with_config(DirectorConfig::new().with_writer_model("gpt-4o"));
//!
//! let mut counters = MemoryCounterStore::new();
//! let new_scenes = director
//!     .generate_scenes(&[], &[(article, timestamp)], &mut counters)
//!     .await?;
//! # }
//! ```

pub mod catalog;
pub mod conditions;
pub mod counters;
pub mod director;
pub mod draft;
pub mod faction;
pub mod images;
pub mod news;
pub mod persist;
pub mod pipeline;
pub mod scene;
pub mod store;
pub mod testing;

// Primary public API
pub use catalog::OutcomeKind;
pub use counters::{compute_scene_counters, sum_scene_counters, truth_factor, WinCounters};
pub use director::moderation::{accept_or_refuse, CensoredComment, CommentGate};
pub use director::{DirectorConfig, DirectorError, StoryDirector};
pub use draft::draft_scene;
pub use faction::Faction;
pub use scene::{Comment, NewsArticle, Scene, VoteKind};
pub use store::{CounterStore, MemoryCounterStore, MemorySceneStore, SceneStore};
