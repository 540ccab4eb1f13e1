//! Immutable reference data for the story.
//!
//! Faction rosters, narrators, scene types, progression steps and scene
//! outcomes are plain static tables; selection logic elsewhere is filter +
//! sample over these. Nothing here is created or destroyed at runtime.

use crate::conditions::{Comparison, Condition};
use crate::counters::WinCounters;
use crate::faction::Faction;
use serde::{Deserialize, Serialize};

/// A named member of a faction roster.
#[derive(Debug, Clone, Copy)]
pub struct GroupCharacter {
    /// Real name, never shown to readers.
    pub name: &'static str,
    /// The alias used in scene text.
    pub alias: &'static str,
    pub description: &'static str,
}

/// A witness who narrates scenes from outside both factions.
#[derive(Debug, Clone, Copy)]
pub struct Narrator {
    pub name: &'static str,
    pub alias: &'static str,
    pub description: &'static str,
    pub writing_style: &'static str,
    /// Opening-sentence template; `{true_culprit}` is replaced with the
    /// protagonist group's public name.
    pub first_sentence: &'static str,
}

/// A structural kind of scene.
#[derive(Debug, Clone, Copy)]
pub struct SceneType {
    pub name: &'static str,
    pub description: &'static str,
}

/// One stage of a faction's overarching plan.
///
/// Steps are gated by counter conditions; a step whose `wins` flag is set
/// ends the story when its scene resolves with a success outcome.
#[derive(Debug, Clone, Copy)]
pub struct ProgressionStep {
    pub name: &'static str,
    pub description: &'static str,
    pub subgoals: &'static [&'static str],
    pub conditions: &'static [Condition],
    pub wins: bool,
}

/// Seed and victory threshold for one faction's durable counter row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterSeed {
    pub init_value: f64,
    pub limit_value: f64,
}

/// The narrative resolution of a single scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Mixed,
    Failure,
}

impl OutcomeKind {
    /// All outcomes, in catalog order.
    pub const ALL: [OutcomeKind; 3] = [OutcomeKind::Success, OutcomeKind::Mixed, OutcomeKind::Failure];

    /// The stable lowercase key used in serialized data.
    pub fn key(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Mixed => "mixed",
            OutcomeKind::Failure => "failure",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OutcomeKind::Success => {
                "The protagonists succeed or make substantial progress towards their goal"
            }
            OutcomeKind::Mixed => {
                "The protagonists make some progress towards their goal but suffer a setback"
            }
            OutcomeKind::Failure => "The protagonists fail to achieve their goal, for now",
        }
    }

    /// The raw per-faction counter delta for a scene with this outcome and
    /// the given protagonist faction. Factions the outcome does not touch
    /// stay at zero.
    pub fn counter_change(self, protagonists: Faction) -> WinCounters {
        let delta = match self {
            OutcomeKind::Success => 1.0,
            OutcomeKind::Mixed => 0.2,
            OutcomeKind::Failure => -0.2,
        };
        let mut change = WinCounters::zero();
        change[protagonists] = delta;
        change
    }
}

/// The public name of a faction as it appears in narration.
pub fn group_name(faction: Faction) -> &'static str {
    match faction {
        Faction::Cultists => "the cult of the Sunken Choir",
        Faction::Detectives => "the Lantern Agency",
    }
}

/// Background blurb for a faction, used when composing scene prompts.
pub fn group_intro(faction: Faction) -> &'static str {
    match faction {
        Faction::Cultists => {
            "A secret society working from the cellars beneath a harborside \
             auction house, bent on waking the Great Old One sleeping under \
             the sea while keeping the public incurious. Every rite they \
             complete leaves a hairline crack in the world."
        }
        Faction::Detectives => {
            "A private agency of survivors and skeptics operating out of an \
             unmarked city office, dedicated to tracing the cracks the cult \
             leaves in the world and stopping the next rite before it \
             finishes."
        }
    }
}

/// Counter seed values for a faction's durable row.
pub fn counter_seed(faction: Faction) -> CounterSeed {
    match faction {
        Faction::Cultists => CounterSeed {
            init_value: 1.0,
            limit_value: 30.0,
        },
        Faction::Detectives => CounterSeed {
            init_value: 1.0,
            limit_value: 30.0,
        },
    }
}

/// The roster a protagonist's characters are drawn from.
pub fn characters(faction: Faction) -> &'static [GroupCharacter] {
    match faction {
        Faction::Cultists => CULTIST_CHARACTERS,
        Faction::Detectives => DETECTIVE_CHARACTERS,
    }
}

/// The fixed narrator catalog.
pub fn narrators() -> &'static [Narrator] {
    NARRATORS
}

/// The fixed scene-type catalog.
pub fn scene_types() -> &'static [SceneType] {
    SCENE_TYPES
}

/// The faction's ten progression steps, in plan order.
pub fn progression_steps(faction: Faction) -> &'static [ProgressionStep] {
    match faction {
        Faction::Cultists => CULTIST_STEPS,
        Faction::Detectives => DETECTIVE_STEPS,
    }
}

static CULTIST_CHARACTERS: &[GroupCharacter] = &[
    GroupCharacter {
        name: "Silas Marrow",
        alias: "The Hierophant",
        description: "A former maritime historian who found the wrong book and \
                      now leads the Choir. Urbane, patient, and entirely mad.",
    },
    GroupCharacter {
        name: "Ada Voss",
        alias: "The Broker",
        description: "A retired commodities trader who moves the Choir's money \
                      and buys its silence through shell charities.",
    },
    GroupCharacter {
        name: "Noor Haddad",
        alias: "The Cartographer",
        description: "Maps the thin places where the sea remembers. Joined after \
                      her survey instruments started recording impossible depths.",
    },
    GroupCharacter {
        name: "Tobias Finch",
        alias: "The Chorister",
        description: "The youngest initiate, a composer whose settings of the \
                      drowned liturgy leave listeners subtly changed.",
    },
];

static DETECTIVE_CHARACTERS: &[GroupCharacter] = &[
    GroupCharacter {
        name: "Ruth Calloway",
        alias: "The Librarian",
        description: "Founded the Agency after an investigation took her \
                      somewhere no report could describe. Keeps its occult \
                      reference stacks and its nerve.",
    },
    GroupCharacter {
        name: "Dmitri Orlov",
        alias: "The Sergeant",
        description: "Ex-harbor police, pensioned off for insisting on what he \
                      saw in the flood tunnels. Handles fieldwork and doors.",
    },
    GroupCharacter {
        name: "June Okafor",
        alias: "The Surveyor",
        description: "An insurance assessor with a gift for noticing which \
                      disasters do not add up. Tracks the Choir through \
                      paperwork.",
    },
    GroupCharacter {
        name: "Felix Tran",
        alias: "The Cipher",
        description: "A cryptographer who first met the Choir inside an \
                      intercepted auction catalog. Breaks their codes, keeps \
                      their nightmares.",
    },
];

static NARRATORS: &[Narrator] = &[
    Narrator {
        name: "Edmund Pale",
        alias: "The Night Clerk",
        description: "A records clerk on the municipal night shift who \
                      cross-references misfiled reports, leaked memoranda and \
                      old marginalia, publishing what he finds under a \
                      pseudonym to warn the city.",
        writing_style: "formal, archaic, allusive, fond of citing documents \
                        that should not exist",
        first_sentence: "But the record omits the hand of {true_culprit}.",
    },
    Narrator {
        name: "Priya Anand",
        alias: "The Dispatcher",
        description: "A late-shift taxi dispatcher who hears the city talk to \
                      itself over the radio. Collects drivers' stories and \
                      posts them before she can talk herself out of it.",
        writing_style: "informal, modern, rapid, wry, interrupting herself, \
                        radio-chatter asides",
        first_sentence: "Here's the part they cut: {true_culprit} was in it from \
                         the start.",
    },
];

static SCENE_TYPES: &[SceneType] = &[
    SceneType {
        name: "Exposition",
        description: "Background on the covert war: aftermaths, preparations, \
                      the stage being set for a coming clash.",
    },
    SceneType {
        name: "Dialogue",
        description: "A conversation that exposes motives, plans or alliances, \
                      within a faction or across the line.",
    },
    SceneType {
        name: "Diary",
        description: "A private journal entry revealing a character's inner \
                      thoughts, plans, affections or fears.",
    },
    SceneType {
        name: "Investigation",
        description: "Evidence gathered and weighed: a discovery that moves one \
                      side closer to understanding the other.",
    },
    SceneType {
        name: "Decision",
        description: "A character forced to choose between hard options, with \
                      consequences for their side of the conflict.",
    },
    SceneType {
        name: "Action",
        description: "A fast, physical confrontation with human adversaries or \
                      with something summoned.",
    },
    SceneType {
        name: "Twist",
        description: "A revelation that redirects the story: a betrayal, an \
                      unexpected alliance, a sudden shift of power.",
    },
    SceneType {
        name: "The world changes",
        description: "Reality warping under the strain: glimpses of other \
                      geometries, nature misbehaving, the public almost \
                      noticing.",
    },
];

static CULTIST_STEPS: &[ProgressionStep] = &[
    ProgressionStep {
        name: "Forbidden Scholarship",
        description: "Master the drowned liturgy and the pre-human histories, \
                      wrapping recruitment in a veneer of book collecting.",
        subgoals: &[
            "Acquire restricted tidal manuscripts through proxy bidders.",
            "Recruit linguists able to read the older hands.",
            "Catalog the liturgy in a hidden archive.",
            "Host closed seminars that double as initiations.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Web of Enclaves",
        description: "Seed quiet cells in old port cities, using carved marks \
                      and coded posts to draw in the disillusioned.",
        subgoals: &[
            "Survey harbor districts with a history of disappearances.",
            "Spread the Choir's marks through commissioned street art.",
            "Run anonymous channels that whisper to likely recruits.",
            "Stand up a courier ring between the new cells.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Relic Hunts",
        description: "Mount expeditions for objects soaked in the deep's \
                      attention, disguised as cultural salvage work.",
        subgoals: &[
            "Chart wreck sites named in the liturgy's appendices.",
            "Fund a salvage venture with a respectable public face.",
            "Swap convincing fakes for anything the authorities seize.",
            "Move recovered relics through the auction house unlogged.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Levers of Power",
        description: "Place believers and indebted friends inside agencies and \
                      firms that can shelter the work.",
        subgoals: &[
            "Compile leverage on harbor inspectors and magistrates.",
            "Seat initiates in clerical posts with useful stamps.",
            "Launder patronage through memorial foundations.",
            "Steer zoning rulings away from the sanctum streets.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Veiled Offerings",
        description: "Make the hidden offerings the liturgy demands, dressed as \
                      accidents and misadventure, each one thinning the world.",
        subgoals: &[
            "Select sites the city already tells ghost stories about.",
            "Arrange alibis and sympathetic coroners in advance.",
            "Let local rumor do the explaining afterwards.",
            "Scrub every trace that could read as pattern.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Calling Lesser Horrors",
        description: "Summon and bind the deep's small servants for counsel and \
                      errands, inside circles that must not fail.",
        subgoals: &[
            "Rehearse the binding forms on minor manifestations.",
            "Stock the rare reagents the circles consume.",
            "Prepare distractions to keep patrols elsewhere.",
            "Harden the celebrants against what answers.",
        ],
        conditions: &[Condition::new(Faction::Cultists, Comparison::Greater, 5.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Quiet Removals",
        description: "Silence the people closing in, by means that read as \
                      chance, before they can compare notes.",
        subgoals: &[
            "Keep dossiers on everyone asking the wrong questions.",
            "Train a small sect in deaths that look like weather.",
            "Discredit the loud ones so the quiet ones stand alone.",
            "Bury every thread that could lead back to the Choir.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 10.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Fog of Lies",
        description: "Flood the channels with contradiction until the truth is \
                      just one more rumor among many.",
        subgoals: &[
            "Run debunking forums that debunk the accurate parts.",
            "Feed investigators elaborate false leads.",
            "Make the Choir's symbols fashionable and therefore harmless.",
            "Drown real accusations in manufactured ones.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 10.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Thinning the Veil",
        description: "Invoke the deep's lieutenants to pry at the membrane \
                      between the sleeper and the waking world.",
        subgoals: &[
            "Align the invocations across every enclave at once.",
            "Spend the hoarded relics to feed the working.",
            "Shield the celebrants behind doubled wards.",
            "Watch the tide tables for the appointed hour.",
        ],
        conditions: &[Condition::new(Faction::Cultists, Comparison::Greater, 20.0)],
        wins: false,
    },
    ProgressionStep {
        name: "The Grand Conjuration",
        description: "At the foretold alignment, gather every cell above the \
                      drowned city and finish the call. If the rite succeeds, \
                      the sleeper wakes and the story ends.",
        subgoals: &[
            "Stage the conclave under cover of an offshore salvage lease.",
            "Assemble the relics in the pattern the liturgy draws.",
            "Hold the perimeter until the last verse lands.",
        ],
        conditions: &[Condition::new(
            Faction::Cultists,
            Comparison::GreaterOrEqual,
            30.0,
        )],
        wins: true,
    },
];

static DETECTIVE_STEPS: &[ProgressionStep] = &[
    ProgressionStep {
        name: "Recruiting the Unbroken",
        description: "Find people who met the impossible and stayed sane, and \
                      train them to look at it professionally.",
        subgoals: &[
            "Trawl incident reports for survivors with steady accounts.",
            "Run quiet aptitude interviews dressed as insurance reviews.",
            "Drill recruits in procedure before they learn the why.",
            "Pair every newcomer with someone who has seen it twice.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Quiet Patrons",
        description: "Cultivate discreet funding from the few wealthy who have \
                      glimpsed the cracks themselves.",
        subgoals: &[
            "Identify estates with conveniently sealed family archives.",
            "Show patrons curated evidence, never the whole picture.",
            "Route donations through unremarkable retainers.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Archive of Unspoken Truths",
        description: "Build the reference library: recovered texts, translated \
                      marginalia, and an index of anomalies over time.",
        subgoals: &[
            "Copy every seized manuscript before the courts lose it.",
            "Commission translations from scholars who don't ask.",
            "Index anomalies against tide tables and missing-person runs.",
            "Keep the archive split across three unlinked sites.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Dragging Deeds to Light",
        description: "Expose the cult's operations to the public or the \
                      authorities with evidence that survives scrutiny.",
        subgoals: &[
            "Build chains of custody a courtroom would respect.",
            "Brief the two journalists who have earned it.",
            "Time releases to land before the Choir can spin them.",
            "Answer their fog with boring, checkable facts.",
        ],
        conditions: &[],
        wins: false,
    },
    ProgressionStep {
        name: "Breaking Rituals",
        description: "Find the next rite before it finishes and take it apart: \
                      the site, the relics, the celebrants.",
        subgoals: &[
            "Watch the reagent trade for telltale purchases.",
            "Infiltrate the site crews that prepare the grounds.",
            "Confiscate what the rite cannot proceed without.",
            "Detain the officiants on whatever charge holds.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 5.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Severing Influence",
        description: "Expose the cult's people inside institutions and cost \
                      them the posts that shelter the work.",
        subgoals: &[
            "Match the Choir's favors to the officials who returned them.",
            "Turn the blackmailed before the faithful.",
            "Leak what prosecutors can finish and keep the rest.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 10.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Cutting the Network",
        description: "Break the couriers and ciphers that let the enclaves act \
                      as one, and let isolation do the rest.",
        subgoals: &[
            "Break the auction-catalog cipher generation by generation.",
            "Intercept the courier ring at its handoffs.",
            "Seed distrust between cells with tailored forgeries.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 15.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Reading the Prophecies",
        description: "Work out the cult's endgame from its own recovered texts, \
                      and get ahead of it.",
        subgoals: &[
            "Reconstruct the liturgy's calendar from seized fragments.",
            "Check its alignments against an astronomer who owes us.",
            "Draft countermeasures for each foretold working.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 20.0)],
        wins: false,
    },
    ProgressionStep {
        name: "Sealing the Breaches",
        description: "Perform the counter-rites that close what the offerings \
                      opened, and banish what slipped through.",
        subgoals: &[
            "Recover the closing forms from the oldest marginalia.",
            "Train practitioners who can finish under pressure.",
            "Map every breach in order of what leaks from it.",
            "Hold the door while the forms are read.",
        ],
        conditions: &[Condition::new(Faction::Detectives, Comparison::Greater, 25.0)],
        wins: false,
    },
    ProgressionStep {
        name: "The Last Stand",
        description: "With the final rite assembling, commit everything to \
                      stopping it. If the assault succeeds, the Choir is \
                      finished and the story ends.",
        subgoals: &[
            "Fix the location of the conclave before it convenes.",
            "Coordinate the raid with every ally still standing.",
            "Destroy the assembled relics beyond recovery.",
        ],
        conditions: &[Condition::new(
            Faction::Detectives,
            Comparison::GreaterOrEqual,
            30.0,
        )],
        wins: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ten_steps_per_faction_with_unique_names() {
        for faction in Faction::ALL {
            let steps = progression_steps(faction);
            assert_eq!(steps.len(), 10, "{faction} must have ten steps");
            let names: HashSet<_> = steps.iter().map(|s| s.name).collect();
            assert_eq!(names.len(), 10, "{faction} step names must be unique");
        }
    }

    #[test]
    fn test_first_step_is_ungated() {
        // Guarantees the gating filter can never produce an empty set.
        for faction in Faction::ALL {
            assert!(progression_steps(faction)[0].conditions.is_empty());
        }
    }

    #[test]
    fn test_only_final_step_wins() {
        for faction in Faction::ALL {
            let steps = progression_steps(faction);
            for step in &steps[..9] {
                assert!(!step.wins, "{} must not be story-ending", step.name);
            }
            assert!(steps[9].wins);
        }
    }

    #[test]
    fn test_final_step_gated_at_limit() {
        for faction in Faction::ALL {
            let last = progression_steps(faction).last().unwrap();
            assert_eq!(last.conditions.len(), 1);
            let cond = &last.conditions[0];
            assert_eq!(cond.faction, faction);
            assert_eq!(cond.comparison, Comparison::GreaterOrEqual);
            assert_eq!(cond.threshold, counter_seed(faction).limit_value);
        }
    }

    #[test]
    fn test_every_step_has_subgoals() {
        for faction in Faction::ALL {
            for step in progression_steps(faction) {
                assert!(!step.subgoals.is_empty(), "{} has no subgoals", step.name);
            }
        }
    }

    #[test]
    fn test_outcome_deltas() {
        let success = OutcomeKind::Success.counter_change(Faction::Cultists);
        assert_eq!(success.cultists, 1.0);
        assert_eq!(success.detectives, 0.0);

        let mixed = OutcomeKind::Mixed.counter_change(Faction::Detectives);
        assert_eq!(mixed.detectives, 0.2);
        assert_eq!(mixed.cultists, 0.0);

        let failure = OutcomeKind::Failure.counter_change(Faction::Detectives);
        assert_eq!(failure.detectives, -0.2);
    }

    #[test]
    fn test_rosters_and_catalogs_populated() {
        for faction in Faction::ALL {
            assert_eq!(characters(faction).len(), 4);
        }
        assert_eq!(narrators().len(), 2);
        assert_eq!(scene_types().len(), 8);
    }

    #[test]
    fn test_counter_seeds() {
        for faction in Faction::ALL {
            let seed = counter_seed(faction);
            assert_eq!(seed.init_value, 1.0);
            assert_eq!(seed.limit_value, 30.0);
        }
    }
}
