//! Scene parameter generation.
//!
//! Rolls the narrative parameters for the next scene: characters, type,
//! narrator, progression step (subject to counter gating), subgoal and
//! outcome. Prose fields are left empty for the director to fill.

use crate::catalog::{self, OutcomeKind};
use crate::conditions::conditions_hold;
use crate::counters::{self, WinCounters};
use crate::faction::Faction;
use crate::scene::{NewsArticle, NewsLink, Reactions, Scene};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// Draft the next scene's parameters with the thread-local RNG.
pub fn draft_scene(
    article: &NewsArticle,
    scene_number: u64,
    protagonists: Faction,
    counters: &WinCounters,
    timestamp: DateTime<Utc>,
) -> Scene {
    draft_scene_with_rng(
        article,
        scene_number,
        protagonists,
        counters,
        timestamp,
        &mut rand::thread_rng(),
    )
}

/// Draft the next scene's parameters with a caller-supplied RNG.
///
/// Selection is uniform over the catalogs: 1 or 2 roster characters without
/// replacement, one scene type, one narrator, one gated progression step,
/// one of its subgoals, and one outcome. The first progression step of each
/// faction is ungated, so the gating filter never leaves an empty set.
pub fn draft_scene_with_rng<R: Rng + ?Sized>(
    article: &NewsArticle,
    scene_number: u64,
    protagonists: Faction,
    counters: &WinCounters,
    timestamp: DateTime<Utc>,
    rng: &mut R,
) -> Scene {
    let n_characters = *[1usize, 2].choose(rng).unwrap();
    let characters: Vec<_> = catalog::characters(protagonists)
        .choose_multiple(rng, n_characters)
        .collect();

    let scene_type = catalog::scene_types().choose(rng).unwrap();
    let narrator = catalog::narrators().choose(rng).unwrap();

    let open_steps: Vec<_> = catalog::progression_steps(protagonists)
        .iter()
        .filter(|step| conditions_hold(step.conditions, counters))
        .collect();
    let step = open_steps.choose(rng).unwrap();
    let subgoal = step.subgoals.choose(rng).unwrap();

    let outcome = *OutcomeKind::ALL.choose(rng).unwrap();

    let scene_ends_story = step.wins && outcome == OutcomeKind::Success;
    let story_winner = scene_ends_story.then_some(protagonists);

    let mut scene = Scene {
        scene_number,
        scene_timestamp: timestamp,
        news: NewsLink {
            title: article.title.clone(),
            summary: article.summary.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            published_at: article.published_at,
        },
        scene_type: scene_type.name.to_string(),
        scene_type_description: scene_type.description.to_string(),
        protagonists,
        characters: characters.iter().map(|c| c.alias.to_string()).collect(),
        character_descriptions: characters
            .iter()
            .map(|c| c.description.to_string())
            .collect(),
        narrator: narrator.alias.to_string(),
        narrator_description: narrator.description.to_string(),
        writing_style: narrator.writing_style.to_string(),
        progression_step: step.name.to_string(),
        progression_step_description: step.description.to_string(),
        subgoal: subgoal.to_string(),
        outcome,
        outcome_description: outcome.description().to_string(),
        first_sentence: narrator.first_sentence.to_string(),
        scene_title: String::new(),
        scene_text: String::new(),
        story_summary: String::new(),
        scene_counters: WinCounters::zero(),
        scene_ends_story,
        story_winner,
        embedding: None,
        reactions: Reactions::default(),
        scene_updates: Vec::new(),
        image_meta: None,
    };

    // A fresh scene has no votes, so the truth factor is exactly neutral
    // and this is the raw outcome delta.
    scene.scene_counters = counters::compute_scene_counters(&scene);

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn article() -> NewsArticle {
        NewsArticle {
            title: "Harbor crane toppled by freak wave".to_string(),
            summary: "A container crane collapsed during calm weather.".to_string(),
            url: "https://example.com/crane".to_string(),
            source: "Harbor Courier".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap(),
            tags: Default::default(),
        }
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_draft_fills_parameters() {
        let mut rng = StdRng::seed_from_u64(7);
        let counters = WinCounters::zero();
        let scene = draft_scene_with_rng(&article(), 1, Faction::Cultists, &counters, ts(), &mut rng);

        assert_eq!(scene.scene_number, 1);
        assert_eq!(scene.protagonists, Faction::Cultists);
        assert!(!scene.characters.is_empty() && scene.characters.len() <= 2);
        assert!(!scene.narrator.is_empty());
        assert!(!scene.progression_step.is_empty());
        assert!(!scene.subgoal.is_empty());
        // Prose is the director's job.
        assert!(scene.scene_title.is_empty());
        assert!(scene.scene_text.is_empty());
        assert!(scene.story_summary.is_empty());
    }

    #[test]
    fn test_draft_counters_are_raw_outcome_delta() {
        let mut rng = StdRng::seed_from_u64(11);
        let counters = WinCounters::zero();
        let scene =
            draft_scene_with_rng(&article(), 1, Faction::Detectives, &counters, ts(), &mut rng);

        // Zero votes means a neutral truth factor.
        let expected = scene.outcome.counter_change(Faction::Detectives);
        assert_eq!(scene.scene_counters, expected);
    }

    #[test]
    fn test_gated_steps_unreachable_at_low_counters() {
        let counters = WinCounters {
            cultists: 0.0,
            detectives: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let scene =
                draft_scene_with_rng(&article(), 1, Faction::Cultists, &counters, ts(), &mut rng);
            // Only the five ungated steps are available at zero counters.
            let open: Vec<_> = catalog::progression_steps(Faction::Cultists)
                .iter()
                .filter(|s| s.conditions.is_empty())
                .map(|s| s.name)
                .collect();
            assert!(open.contains(&scene.progression_step.as_str()));
        }
    }

    #[test]
    fn test_final_step_needs_threshold() {
        // Just below the victory threshold the story-ending step must be
        // impossible to select, no matter how the dice land.
        let below = WinCounters {
            cultists: 29.999,
            detectives: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..300 {
            let scene =
                draft_scene_with_rng(&article(), 1, Faction::Cultists, &below, ts(), &mut rng);
            assert_ne!(scene.progression_step, "The Grand Conjuration");
        }

        // At the threshold it becomes reachable.
        let at = WinCounters {
            cultists: 30.0,
            detectives: 0.0,
        };
        let reachable = (0..300).any(|i| {
            let mut rng = StdRng::seed_from_u64(i);
            let scene = draft_scene_with_rng(&article(), 1, Faction::Cultists, &at, ts(), &mut rng);
            scene.progression_step == "The Grand Conjuration"
        });
        assert!(reachable);
    }

    #[test]
    fn test_story_only_ends_on_winning_success() {
        let at = WinCounters {
            cultists: 35.0,
            detectives: 0.0,
        };
        for i in 0..300 {
            let mut rng = StdRng::seed_from_u64(i);
            let scene = draft_scene_with_rng(&article(), 1, Faction::Cultists, &at, ts(), &mut rng);
            let winning_step = scene.progression_step == "The Grand Conjuration";
            let expected = winning_step && scene.outcome == OutcomeKind::Success;
            assert_eq!(scene.scene_ends_story, expected);
            assert_eq!(scene.story_winner.is_some(), expected);
        }
    }
}
