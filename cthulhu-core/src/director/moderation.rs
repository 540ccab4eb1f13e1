//! Comment moderation and the scene-update gate.
//!
//! A reader comment is judged by the text-generation capability; if it
//! clears every bar it becomes a "scene update", a short canon-admitted
//! rumor appended to the scene. Validation here is strict: a missing field
//! or a categorical value outside its set fails the whole call. The
//! lenient parser used for article tags lives elsewhere and must stay
//! separate.

use crate::director::prompts;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use textgen::{GenerationError, TextGenerator};
use thiserror::Error;
use tracing::info;

/// Canonical opening of an admissible scene update.
pub const SCENE_UPDATE_PREFIX: &str = "There is a rumor that";

/// Maximum accepted updates per scene.
pub const SCENE_UPDATES_CAP: usize = 5;

/// Errors from the moderation gate.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("moderation response invalid: {0}")]
    BadResponse(String),
}

/// A three-step quality rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    High,
    Medium,
    Low,
    Unclear,
}

impl Rating {
    /// Whether the rating clears the preselection bar.
    pub fn acceptable(self) -> bool {
        matches!(self, Rating::High | Rating::Medium)
    }
}

/// A yes/no judgement that may come back undecided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Yes,
    No,
    Unclear,
}

/// Overall tone of the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unclear,
}

/// The raw moderation response. Deserialization is the strict validator:
/// every field must be present and inside its enumerated set.
#[derive(Debug, Deserialize)]
struct ModerationResponse {
    censored_comment: String,
    scene_update: String,
    pertinence: Rating,
    stylistic_quality: Rating,
    novelty: Rating,
    #[serde(rename = "unsafe")]
    unsafe_content: Flag,
    contradicting: Flag,
    sentiment: Sentiment,
    aggressive: Flag,
    sexual: Flag,
    spam: Flag,
    illegal: Flag,
}

/// A moderated comment with its preselection verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensoredComment {
    /// The cleaned comment text.
    pub censored_comment: String,
    /// The normalized candidate scene update; empty when inadmissible.
    pub scene_update: String,
    pub pertinence: Rating,
    pub stylistic_quality: Rating,
    pub novelty: Rating,
    pub unsafe_content: Flag,
    pub contradicting: Flag,
    pub sentiment: Sentiment,
    pub aggressive: Flag,
    pub sexual: Flag,
    pub spam: Flag,
    pub illegal: Flag,
    /// Whether the comment cleared every bar at moderation time.
    pub preselected: bool,
}

/// Configuration for the moderation gate.
#[derive(Debug, Clone)]
pub struct CommentGate {
    model: String,
    max_tokens: usize,
}

impl Default for CommentGate {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 1024,
        }
    }
}

impl CommentGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different model for moderation.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different token budget.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Judge a comment against its scene.
    pub async fn censor_comment<G: TextGenerator + ?Sized>(
        &self,
        comment: &str,
        scene: &Scene,
        generator: &G,
    ) -> Result<CensoredComment, ModerationError> {
        let prompt = prompts::moderation_prompt(comment, scene);
        let response = generator
            .generate_json(prompts::MODERATION_ROLE, &prompt, &self.model, self.max_tokens)
            .await?;

        let parsed: ModerationResponse = serde_json::from_value(response)
            .map_err(|e| ModerationError::BadResponse(e.to_string()))?;

        let scene_update = normalize_scene_update(&parsed.scene_update);
        let preselected = scene.scene_updates.len() < SCENE_UPDATES_CAP
            && !scene_update.is_empty()
            && parsed.pertinence.acceptable()
            && parsed.stylistic_quality.acceptable()
            && parsed.novelty.acceptable()
            && parsed.unsafe_content == Flag::No;

        info!(
            scene_number = scene.scene_number,
            preselected,
            "moderated reader comment"
        );

        Ok(CensoredComment {
            censored_comment: parsed.censored_comment,
            scene_update,
            pertinence: parsed.pertinence,
            stylistic_quality: parsed.stylistic_quality,
            novelty: parsed.novelty,
            unsafe_content: parsed.unsafe_content,
            contradicting: parsed.contradicting,
            sentiment: parsed.sentiment,
            aggressive: parsed.aggressive,
            sexual: parsed.sexual,
            spam: parsed.spam,
            illegal: parsed.illegal,
            preselected,
        })
    }
}

/// Trim whitespace and stray quotes; discard anything that does not start
/// with the canonical rumor prefix.
pub fn normalize_scene_update(raw: &str) -> String {
    let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.starts_with(SCENE_UPDATE_PREFIX) {
        cleaned.to_string()
    } else {
        String::new()
    }
}

/// The authoritative gate before appending to `scene_updates`.
///
/// Re-checks the cap at acceptance time: another comment may have been
/// accepted between moderation and acceptance.
pub fn accept_or_refuse(censored: &CensoredComment, scene: &Scene) -> bool {
    censored.preselected && scene.scene_updates.len() < SCENE_UPDATES_CAP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_scene_update_prefix_required() {
        assert_eq!(
            normalize_scene_update("  \"There is a rumor that the pier sang.\"  "),
            "There is a rumor that the pier sang."
        );
        assert_eq!(normalize_scene_update("The pier sang."), "");
        assert_eq!(normalize_scene_update("   "), "");
    }

    #[test]
    fn test_strict_response_rejects_bad_values() {
        let bad_rating = serde_json::json!({
            "censored_comment": "ok",
            "scene_update": "There is a rumor that it rains.",
            "pertinence": "very high",
            "stylistic_quality": "high",
            "novelty": "high",
            "unsafe": "no",
            "contradicting": "no",
            "sentiment": "neutral",
            "aggressive": "no",
            "sexual": "no",
            "spam": "no",
            "illegal": "no",
        });
        assert!(serde_json::from_value::<ModerationResponse>(bad_rating).is_err());

        let missing_field = serde_json::json!({
            "censored_comment": "ok",
            "scene_update": "",
            "pertinence": "high",
        });
        assert!(serde_json::from_value::<ModerationResponse>(missing_field).is_err());
    }

    fn censored(preselected: bool) -> CensoredComment {
        CensoredComment {
            censored_comment: "ok".to_string(),
            scene_update: "There is a rumor that the tide turned.".to_string(),
            pertinence: Rating::High,
            stylistic_quality: Rating::High,
            novelty: Rating::Medium,
            unsafe_content: Flag::No,
            contradicting: Flag::No,
            sentiment: Sentiment::Neutral,
            aggressive: Flag::No,
            sexual: Flag::No,
            spam: Flag::No,
            illegal: Flag::No,
            preselected,
        }
    }

    fn scene_with_updates(n: usize) -> Scene {
        let mut scene = crate::director::prompts::SAMPLE_SCENES[0].clone();
        scene.scene_updates = (0..n)
            .map(|i| format!("There is a rumor that update {i} happened."))
            .collect();
        scene
    }

    #[test]
    fn test_accept_refuses_at_cap() {
        let full = scene_with_updates(SCENE_UPDATES_CAP);
        // Even a preselected comment is refused once the cap is reached.
        assert!(!accept_or_refuse(&censored(true), &full));

        let open = scene_with_updates(SCENE_UPDATES_CAP - 1);
        assert!(accept_or_refuse(&censored(true), &open));
    }

    #[test]
    fn test_accept_requires_preselection() {
        let open = scene_with_updates(0);
        assert!(!accept_or_refuse(&censored(false), &open));
    }
}
