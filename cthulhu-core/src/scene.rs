//! The scene data model and its inputs.
//!
//! A `Scene` is one persisted unit of generated narrative, tied to one real
//! news article. Prose fields are immutable once the scene is finalized;
//! only reactions, scene updates, and the reconciled counters may change
//! afterwards.

use crate::catalog::OutcomeKind;
use crate::counters::WinCounters;
use crate::faction::Faction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// A finalized scene is missing or has emptied a required field.
#[derive(Debug, Error)]
#[error("scene field '{0}' is empty")]
pub struct IncompleteScene(pub &'static str);

/// A crowd vote on whether a scene is "true".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Truth,
    Lie,
}

/// Vote tally for a scene or a comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Votes {
    pub truth: u32,
    pub lie: u32,
    /// Voter ids that already counted, used to drop repeat votes.
    #[serde(default)]
    pub voted_by: Vec<String>,
}

impl Votes {
    /// Record one vote. Returns false (and changes nothing) when the voter
    /// id has already been counted.
    pub fn record(&mut self, vote: VoteKind, voter: Option<&str>) -> bool {
        if let Some(id) = voter {
            if self.voted_by.iter().any(|v| v == id) {
                return false;
            }
            self.voted_by.push(id.to_string());
        }
        match vote {
            VoteKind::Truth => self.truth += 1,
            VoteKind::Lie => self.lie += 1,
        }
        true
    }
}

/// A reader comment on a scene. Never deleted; may be hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub hidden: bool,
    /// Set by the moderation gate when the comment became canon.
    pub accepted: bool,
    pub votes: Votes,
}

impl Comment {
    /// A fresh, visible, unaccepted comment.
    pub fn new(author: impl Into<String>, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            created_at,
            hidden: false,
            accepted: false,
            votes: Votes::default(),
        }
    }
}

/// All reader activity attached to a scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reactions {
    pub votes: Votes,
    pub comments: Vec<Comment>,
}

/// The news article a scene is anchored to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsLink {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

/// Bookkeeping for a scene's generated illustration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMeta {
    pub prompt: String,
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// One persisted unit of generated narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// 1-based, strictly increasing, no gaps.
    pub scene_number: u64,
    pub scene_timestamp: DateTime<Utc>,
    pub news: NewsLink,

    pub scene_type: String,
    pub scene_type_description: String,
    pub protagonists: Faction,
    pub characters: Vec<String>,
    pub character_descriptions: Vec<String>,
    pub narrator: String,
    pub narrator_description: String,
    pub writing_style: String,
    pub progression_step: String,
    pub progression_step_description: String,
    pub subgoal: String,
    pub outcome: OutcomeKind,
    pub outcome_description: String,
    pub first_sentence: String,

    /// Generated prose; empty on a draft, filled by the director.
    pub scene_title: String,
    pub scene_text: String,
    /// Running summary of the whole story up to and including this scene.
    pub story_summary: String,

    /// This scene's counter contribution (outcome delta x truth factor).
    pub scene_counters: WinCounters,
    pub scene_ends_story: bool,
    /// `None` while the story is undecided.
    pub story_winner: Option<Faction>,

    /// Embedding of the final scene text, when an embedder is configured.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    #[serde(default)]
    pub reactions: Reactions,
    /// Canon-admitted facts from moderated comments, capped by the gate.
    #[serde(default)]
    pub scene_updates: Vec<String>,
    #[serde(default)]
    pub image_meta: Option<ImageMeta>,
}

impl Scene {
    /// Integrity check run after generation: every textual field of a
    /// finalized scene must be non-empty. A violation aborts the run
    /// before anything is persisted.
    pub fn validate_complete(&self) -> Result<(), IncompleteScene> {
        fn check(field: &'static str, value: &str) -> Result<(), IncompleteScene> {
            if value.trim().is_empty() {
                Err(IncompleteScene(field))
            } else {
                Ok(())
            }
        }

        if self.scene_number == 0 {
            return Err(IncompleteScene("scene_number"));
        }
        check("news.title", &self.news.title)?;
        check("news.summary", &self.news.summary)?;
        check("news.url", &self.news.url)?;
        check("news.source", &self.news.source)?;
        check("scene_type", &self.scene_type)?;
        check("scene_type_description", &self.scene_type_description)?;
        if self.characters.is_empty() {
            return Err(IncompleteScene("characters"));
        }
        for c in &self.characters {
            check("characters", c)?;
        }
        for d in &self.character_descriptions {
            check("character_descriptions", d)?;
        }
        check("narrator", &self.narrator)?;
        check("narrator_description", &self.narrator_description)?;
        check("writing_style", &self.writing_style)?;
        check("progression_step", &self.progression_step)?;
        check(
            "progression_step_description",
            &self.progression_step_description,
        )?;
        check("subgoal", &self.subgoal)?;
        check("outcome_description", &self.outcome_description)?;
        check("first_sentence", &self.first_sentence)?;
        check("scene_title", &self.scene_title)?;
        check("scene_text", &self.scene_text)?;
        check("story_summary", &self.story_summary)?;
        Ok(())
    }

    /// Record a reader vote on this scene.
    pub fn record_vote(&mut self, vote: VoteKind, voter: Option<&str>) -> bool {
        self.reactions.votes.record(vote, voter)
    }

    /// Attach a reader comment.
    pub fn add_comment(&mut self, comment: Comment) {
        self.reactions.comments.push(comment);
    }
}

/// LLM-derived classification tags on an incoming article. All optional;
/// the tag parser keeps whatever validated and drops the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleTags {
    pub mood: Option<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    pub breaking_news: Option<bool>,
    pub like_a_hollywood_movie: Option<bool>,
    pub trustworthy: Option<bool>,
    pub economic_impact: Option<String>,
}

/// An externally supplied news article, read-only input to the director.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: ArticleTags,
}

/// Parse classification tags out of an enrichment response, leniently.
///
/// Unlike the strict scene/summary/moderation validators, an invalid or
/// missing field here is logged and dropped; the remaining fields are kept.
/// Boolean fields tolerate the string spellings models produce.
pub fn parse_article_tags(response: &serde_json::Value) -> ArticleTags {
    let mut tags = ArticleTags::default();

    tags.mood = lenient_string(response, "mood");
    tags.economic_impact = lenient_string(response, "economic_impact");
    tags.breaking_news = lenient_bool(response, "breaking_news");
    tags.like_a_hollywood_movie = lenient_bool(response, "like_a_hollywood_movie");
    tags.trustworthy = lenient_bool(response, "trustworthy");

    match response.get("sectors") {
        None => {}
        Some(serde_json::Value::String(s)) => {
            tags.sectors = s
                .split(',')
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect();
        }
        Some(serde_json::Value::Array(items)) => {
            for item in items {
                match item.as_str() {
                    Some(s) => tags.sectors.push(s.trim().to_lowercase()),
                    None => warn!(value = %item, "dropping non-string sector tag"),
                }
            }
        }
        Some(other) => warn!(value = %other, "dropping malformed field 'sectors'"),
    }

    tags
}

fn lenient_string(response: &serde_json::Value, field: &str) -> Option<String> {
    match response.get(field) {
        None => None,
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
            Some(s.trim().to_lowercase())
        }
        Some(other) => {
            warn!(%field, value = %other, "dropping malformed tag field");
            None
        }
    }
}

fn lenient_bool(response: &serde_json::Value, field: &str) -> Option<bool> {
    match response.get(field) {
        None => None,
        Some(serde_json::Value::Bool(b)) => Some(*b),
        Some(serde_json::Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => {
                warn!(%field, value = %s, "dropping malformed tag field");
                None
            }
        },
        Some(other) => {
            warn!(%field, value = %other, "dropping malformed tag field");
            None
        }
    }
}
