//! Prompt composition for the director's generation requests.
//!
//! Prompts are assembled from the catalog, the recent scene history, and
//! the drafted parameters. Field expectations for each request live next
//! to the prompt that asks for them.

use crate::catalog::{self, GroupCharacter};
use crate::faction::Faction;
use crate::scene::{NewsLink, Reactions, Scene};
use chrono::TimeZone;
use chrono::Utc;
use lazy_static::lazy_static;

/// System role for the scene-writing request.
pub const SCENE_ROLE: &str = "You are a fiction writer who writes captivating \
    suspenseful stories inspired by the Cthulhu stories of H. P. Lovecraft.";

/// System role for the story-summary request.
pub const SUMMARY_ROLE: &str = "You are a fiction writer and story summarizer expert.";

/// System role for the consistency rewrite request.
pub const FACT_CHECK_ROLE: &str = "You are a meticulous continuity editor for a \
    serialized Cthulhu mythos story.";

/// System role for the comment moderation request.
pub const MODERATION_ROLE: &str = "You are the moderator of a collaborative \
    Cthulhu mythos fiction site, judging reader comments for admission into \
    the story's canon.";

/// How many trailing scenes the writer sees verbatim.
pub const HISTORY_WINDOW: usize = 10;

/// Sample scenes are shown only while the history holds at most this many
/// scenes.
pub const SAMPLE_SCENE_THRESHOLD: usize = 2;

fn format_group_members(members: &[GroupCharacter]) -> String {
    members
        .iter()
        .map(|m| format!("- {}. {}", m.alias, m.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One scene rendered as a story-so-far block.
pub fn format_scene(s: &Scene) -> String {
    let title = if s.scene_title.is_empty() {
        "..."
    } else {
        s.scene_title.as_str()
    };
    let text = if s.scene_text.is_empty() {
        "..."
    } else {
        s.scene_text.as_str()
    };
    format!(
        "Scene #{number}. {date}.\n\n\
         Today's news article: '{news_title}'. {news_summary}\n\
         (source: {news_source})\n\n\
         Truth: '{title}'. {text}\n\
         (written by: {narrator})\n\n\
         (debug: progression_step={step} outcome={outcome} \
         cultists_diff={cultists} detectives_diff={detectives})\n\
         -----------\n",
        number = s.scene_number,
        date = s.scene_timestamp.format("%Y-%m-%d"),
        news_title = s.news.title,
        news_summary = s.news.summary,
        news_source = s.news.source,
        title = title,
        text = text,
        narrator = s.narrator,
        step = s.progression_step.replace(' ', "_").to_lowercase(),
        outcome = s.outcome.key(),
        cultists = s.scene_counters.cultists,
        detectives = s.scene_counters.detectives,
    )
}

/// A list of scenes rendered as story-so-far blocks.
pub fn format_scenes(scenes: &[Scene]) -> String {
    scenes
        .iter()
        .map(format_scene)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The opening sentence for a drafted scene, with the protagonist group's
/// public name substituted into the narrator's template.
pub fn opening_sentence(s: &Scene) -> String {
    s.first_sentence
        .replace("{true_culprit}", catalog::group_name(s.protagonists))
}

/// The parameter block describing the scene to be written.
pub fn format_scene_parameters(s: &Scene) -> String {
    format!(
        "Scene #{number} parameters:\n\
         - Task: Tell a story in first person as {narrator}, who is writing a \
         blog post about events allegedly related to the {protagonists} \
         (\"Scene {number}\"). The narrator never reveals their own identity.\n\
         - Connections: Build upon previous events where appropriate, and link \
         to today's news article by revealing the hidden truth behind it.\n\
         - Focus: Colorful but minimalistic exposition; leave details out to \
         keep the mystery. A short engaging scene that develops the characters \
         and moves the plot forward.\n\
         - Narrator's writing style: {style}.\n\
         - Narrator's background: {narrator_description}\n\
         - Scene type: {scene_type} ({scene_type_description})\n\
         - Scene protagonists: {protagonists} ({characters})\n\
         - Protagonists' goal for this scene: {subgoal}\n\
         - Protagonists' bigger goal: {step} ({step_description})\n\
         - Today's news article: {news_title}. ({news_summary})\n\
         - Scene outcome: {outcome} ({outcome_description})\n\
         - Scene text must start with: {opening}\n",
        number = s.scene_number,
        narrator = s.narrator,
        protagonists = s.protagonists,
        style = s.writing_style,
        narrator_description = s.narrator_description,
        scene_type = s.scene_type,
        scene_type_description = s.scene_type_description,
        characters = s.characters.join(", "),
        subgoal = s.subgoal,
        step = s.progression_step,
        step_description = s.progression_step_description,
        news_title = s.news.title,
        news_summary = s.news.summary,
        outcome = s.outcome.key(),
        outcome_description = s.outcome_description,
        opening = opening_sentence(s),
    )
}

fn story_outline() -> String {
    format!(
        "This is a story about a cloak-and-dagger fight between two groups: a \
         secret international cult and an esoteric detective agency. The story \
         connects fictional events to real-world news.\n\n\
         I. The cultists.\n{cult_name}\n{cult_intro}\n\n\
         The prominent cultists:\n{cult_members}\n\n\
         II. The detectives.\n{det_name}\n{det_intro}\n\n\
         The prominent detectives:\n{det_members}\n\n\
         III. The witnesses.\n\
         The story is narrated through the media posts of witnesses with \
         connections in both groups, drawing on leaked reports, emails, and \
         rumors.",
        cult_name = catalog::group_name(Faction::Cultists),
        cult_intro = catalog::group_intro(Faction::Cultists),
        cult_members = format_group_members(catalog::characters(Faction::Cultists)),
        det_name = catalog::group_name(Faction::Detectives),
        det_intro = catalog::group_intro(Faction::Detectives),
        det_members = format_group_members(catalog::characters(Faction::Detectives)),
    )
}

/// The full scene-writing prompt.
///
/// The last `HISTORY_WINDOW` scenes appear verbatim; the two sample scenes
/// are included only while the story is still short enough to need them.
pub fn scene_prompt(scenes_so_far: &[Scene], new_scene: &Scene) -> String {
    let window_start = scenes_so_far.len().saturating_sub(HISTORY_WINDOW);
    let mut story_so_far = format_scenes(&scenes_so_far[window_start..]);
    if !story_so_far.is_empty() {
        story_so_far.push_str("\n\n");
    }
    story_so_far.push_str(&format_scene(new_scene));

    let sample_scenes = if scenes_so_far.len() <= SAMPLE_SCENE_THRESHOLD {
        format_scenes(&SAMPLE_SCENES)
    } else {
        "N/A".to_string()
    };

    let story_summary = scenes_so_far
        .last()
        .map(|s| s.story_summary.as_str())
        .unwrap_or("N/A");

    format!(
        "Please finish the last scene of the following story based on the \
         story outline and the provided parameters.\n\
         The new scene must be linked to the provided news article, revealing \
         the macabre truth behind the events described in the article.\n\n\
         ## STORY OUTLINE\n{outline}\n\n\
         ## SAMPLE SCENES (to guide the writer)\n{samples}\n\n\
         ## STORY SO FAR\n\n\
         ### STORY SUMMARY\n{summary}\n\n\
         ### LAST SCENES\n{story_so_far}\n\n\
         ## NEW SCENE PARAMETERS\n{parameters}\n\n\
         Return JSON describing the new scene according to the NEW SCENE \
         PARAMETERS with the following fields:\n\
         - scene_title: title of the new scene\n\
         - scene_text: one paragraph (4 to 7 sentences) describing the events \
         of the new scene\n",
        outline = story_outline(),
        samples = sample_scenes,
        summary = story_summary,
        story_so_far = story_so_far,
        parameters = format_scene_parameters(new_scene),
    )
}

/// The story-summary prompt over the full history.
pub fn summary_prompt(scenes: &[Scene]) -> String {
    format!(
        "Summarize the story below:\n\
         - No longer than 2000 words;\n\
         - Include the most important facts and events, and reduce \
         descriptive details to the minimum;\n\
         - No additional information or text other than the summary.\n\n\
         Return a JSON with the following fields:\n\
         - story_summary: a story summary\n\n\
         STORY:\n\n{story}",
        story = format_scenes(scenes)
    )
}

/// The consistency rewrite prompt over retrieved related scenes.
pub fn fact_check_prompt(scene: &Scene, context: &[&Scene]) -> String {
    let related = context
        .iter()
        .map(|s| format_scene(s))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "The new scene below may contradict earlier scenes of the same story. \
         Rewrite the scene text only as far as needed to stay consistent with \
         the related scenes; keep the plot, style, length and opening sentence \
         unchanged.\n\n\
         ## RELATED SCENES\n{related}\n\n\
         ## NEW SCENE\n'{title}'. {text}\n\n\
         Return JSON with the following fields:\n\
         - scene_text: the checked (and possibly corrected) scene text\n",
        related = related,
        title = scene.scene_title,
        text = scene.scene_text,
    )
}

/// The comment-moderation prompt.
pub fn moderation_prompt(comment: &str, scene: &Scene) -> String {
    format!(
        "A reader commented on a scene of the story. Judge the comment and \
         decide whether it could enter the story's canon as a rumor.\n\n\
         ## SCENE\n'{title}'. {text}\n\n\
         ## READER COMMENT\n{comment}\n\n\
         Return JSON with the following fields:\n\
         - censored_comment: the comment, cleaned of insults and personal data\n\
         - scene_update: one sentence starting with 'There is a rumor that' \
         restating the comment as an in-world rumor, or an empty string if \
         that is impossible\n\
         - pertinence: high, medium, low, or unclear\n\
         - stylistic_quality: high, medium, low, or unclear\n\
         - novelty: high, medium, low, or unclear\n\
         - unsafe: yes, no, or unclear\n\
         - contradicting: yes, no, or unclear\n\
         - sentiment: positive, neutral, negative, or unclear\n\
         - aggressive: yes, no, or unclear\n\
         - sexual: yes, no, or unclear\n\
         - spam: yes, no, or unclear\n\
         - illegal: yes, no, or unclear\n",
        title = scene.scene_title,
        text = scene.scene_text,
        comment = comment,
    )
}

lazy_static! {
    /// Two hand-written scenes shown to the writer while the story has no
    /// history of its own to imitate.
    pub static ref SAMPLE_SCENES: Vec<Scene> = vec![
        sample_scene(
            Faction::Cultists,
            "Frost Advisory Extended Through Friday",
            "Forecasters extended the frost advisory for the coastal counties, \
             citing unusually persistent cold air over the harbor.",
            "The Weather Desk",
            "The Chilled Signal",
            "But the record omits the hand of the cult of the Sunken Choir. \
             While the city salted its steps, the Cartographer walked the \
             frozen pier at low tide, reading the new soundings her \
             instruments refused to print. The cold was not weather. Something below was \
             breathing in, slowly, and the harbor was leaning down to listen.",
            "The Night Clerk",
            crate::catalog::OutcomeKind::Success,
        ),
        sample_scene(
            Faction::Detectives,
            "Rookie Point Guard Turns Down Endorsement Tour",
            "A first-year basketball standout declined a lucrative off-season \
             endorsement tour, telling reporters she intends to stay home and \
             train.",
            "Sideline Wire",
            "The Season That Didn't Happen",
            "Here's the part they cut: the Lantern Agency was in it from the \
             start. The Surveyor had flagged the tour's sponsor weeks ago, a \
             shell with no offices and a taste for arena basements. The \
             athlete never knew how close she came; the Agency's quiet word to \
             her manager cost them a favor they could not spare, and the \
             sponsor's money moved on to find another door.",
            "The Dispatcher",
            crate::catalog::OutcomeKind::Mixed,
        ),
    ];
}

fn sample_scene(
    protagonists: Faction,
    news_title: &str,
    news_summary: &str,
    news_source: &str,
    scene_title: &str,
    scene_text: &str,
    narrator_alias: &str,
    outcome: crate::catalog::OutcomeKind,
) -> Scene {
    let narrator = catalog::narrators()
        .iter()
        .find(|n| n.alias == narrator_alias)
        .expect("sample narrator exists in the catalog");
    let step = catalog::progression_steps(protagonists)[0];
    let timestamp = Utc.with_ymd_and_hms(2023, 12, 14, 0, 0, 0).unwrap();
    Scene {
        scene_number: 0,
        scene_timestamp: timestamp,
        news: NewsLink {
            title: news_title.to_string(),
            summary: news_summary.to_string(),
            url: String::new(),
            source: news_source.to_string(),
            published_at: timestamp,
        },
        scene_type: "Exposition".to_string(),
        scene_type_description: catalog::scene_types()[0].description.to_string(),
        protagonists,
        characters: vec![catalog::characters(protagonists)[2].alias.to_string()],
        character_descriptions: vec![catalog::characters(protagonists)[2]
            .description
            .to_string()],
        narrator: narrator.alias.to_string(),
        narrator_description: narrator.description.to_string(),
        writing_style: narrator.writing_style.to_string(),
        progression_step: step.name.to_string(),
        progression_step_description: step.description.to_string(),
        subgoal: step.subgoals[0].to_string(),
        outcome,
        outcome_description: outcome.description().to_string(),
        first_sentence: narrator.first_sentence.to_string(),
        scene_title: scene_title.to_string(),
        scene_text: scene_text.to_string(),
        story_summary: String::new(),
        scene_counters: outcome.counter_change(protagonists),
        scene_ends_story: false,
        story_winner: None,
        embedding: None,
        reactions: Reactions::default(),
        scene_updates: Vec::new(),
        image_meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::WinCounters;
    use crate::draft::draft_scene_with_rng;
    use crate::scene::NewsArticle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn drafted(number: u64) -> Scene {
        let article = NewsArticle {
            title: format!("Article {number}"),
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
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            &mut rng,
        )
    }

    #[test]
    fn test_opening_sentence_substitutes_group_name() {
        let scene = drafted(1);
        let opening = opening_sentence(&scene);
        assert!(!opening.contains("{true_culprit}"));
        assert!(opening.contains(catalog::group_name(Faction::Cultists)));
    }

    #[test]
    fn test_scene_prompt_includes_samples_only_early() {
        let draft = drafted(1);
        let with_samples = scene_prompt(&[], &draft);
        assert!(with_samples.contains("The Chilled Signal"));

        let history: Vec<Scene> = (1..=3)
            .map(|n| {
                let mut s = drafted(n);
                s.scene_title = format!("Scene {n}");
                s.scene_text = "Text.".to_string();
                s.story_summary = "Summary so far.".to_string();
                s
            })
            .collect();
        let without_samples = scene_prompt(&history, &drafted(4));
        assert!(!without_samples.contains("The Chilled Signal"));
        assert!(without_samples.contains("Summary so far."));
    }

    #[test]
    fn test_scene_prompt_windows_history() {
        let history: Vec<Scene> = (1..=15)
            .map(|n| {
                let mut s = drafted(n);
                s.scene_title = format!("Headline {n}");
                s.scene_text = "Text.".to_string();
                s.story_summary = "Summary.".to_string();
                s
            })
            .collect();
        let prompt = scene_prompt(&history, &drafted(16));
        assert!(!prompt.contains("'Headline 5'"));
        assert!(prompt.contains("'Headline 6'"));
        assert!(prompt.contains("'Headline 15'"));
    }

    #[test]
    fn test_format_scene_placeholder_for_empty_prose() {
        let scene = drafted(1);
        let block = format_scene(&scene);
        assert!(block.contains("Truth: '...'"));
    }

    #[test]
    fn test_moderation_prompt_names_fields() {
        let mut scene = drafted(1);
        scene.scene_title = "A Title".to_string();
        scene.scene_text = "A text.".to_string();
        let prompt = moderation_prompt("I saw it too", &scene);
        for field in [
            "censored_comment",
            "scene_update",
            "pertinence",
            "stylistic_quality",
            "novelty",
            "unsafe",
        ] {
            assert!(prompt.contains(field), "prompt must ask for {field}");
        }
    }
}
