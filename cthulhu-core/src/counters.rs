//! Win counter arithmetic.
//!
//! Each faction accumulates a real-valued score across scenes. A scene
//! contributes the delta from its outcome, scaled by a bounded "truth
//! factor" derived from crowd votes on that scene.

use crate::faction::Faction;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Per-faction running scores.
///
/// Holding one field per faction keeps the "exactly the two known factions"
/// invariant structural: there is no way to add or drop a key.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WinCounters {
    pub cultists: f64,
    pub detectives: f64,
}

impl WinCounters {
    /// Both counters at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// The counter for one faction.
    pub fn get(&self, faction: Faction) -> f64 {
        match faction {
            Faction::Cultists => self.cultists,
            Faction::Detectives => self.detectives,
        }
    }

    /// Mutable access to one faction's counter.
    pub fn get_mut(&mut self, faction: Faction) -> &mut f64 {
        match faction {
            Faction::Cultists => &mut self.cultists,
            Faction::Detectives => &mut self.detectives,
        }
    }

    /// Elementwise addition of another counter set.
    pub fn add(&mut self, other: &WinCounters) {
        self.cultists += other.cultists;
        self.detectives += other.detectives;
    }

    /// Elementwise scaling by a factor.
    pub fn scaled(&self, factor: f64) -> WinCounters {
        WinCounters {
            cultists: self.cultists * factor,
            detectives: self.detectives * factor,
        }
    }
}

impl Index<Faction> for WinCounters {
    type Output = f64;

    fn index(&self, faction: Faction) -> &f64 {
        match faction {
            Faction::Cultists => &self.cultists,
            Faction::Detectives => &self.detectives,
        }
    }
}

impl IndexMut<Faction> for WinCounters {
    fn index_mut(&mut self, faction: Faction) -> &mut f64 {
        self.get_mut(faction)
    }
}

/// The vote-derived multiplier applied to a scene's counter contribution.
///
/// With `truth >= lie` the factor is `tanh((1+truth)/(1+lie) - 1) + 1`,
/// landing in `[1.0, 2.0)`; otherwise the mirrored expression is inverted,
/// landing in `(0.5, 1.0]`. The tanh keeps the factor saturating: no vote
/// margin can push a scene past 2x or below 0.5x, and equal tallies are
/// exactly neutral.
pub fn truth_factor(truth: u32, lie: u32) -> f64 {
    let truth = f64::from(truth);
    let lie = f64::from(lie);
    if truth >= lie {
        let ratio = (1.0 + truth) / (1.0 + lie);
        (ratio - 1.0).tanh() + 1.0
    } else {
        let ratio = (1.0 + lie) / (1.0 + truth);
        1.0 / ((ratio - 1.0).tanh() + 1.0)
    }
}

/// The scene's counter contribution: the raw per-outcome delta scaled by
/// the truth factor of the scene's own vote tally.
///
/// Both factions are always present in the result; a faction the outcome
/// table does not mention contributes zero.
pub fn compute_scene_counters(scene: &Scene) -> WinCounters {
    let votes = &scene.reactions.votes;
    let factor = truth_factor(votes.truth, votes.lie);
    scene
        .outcome
        .counter_change(scene.protagonists)
        .scaled(factor)
}

/// Elementwise sum over a list of counter sets, starting from zero.
///
/// This is the reconciliation primitive: summing every persisted scene's
/// counters must reproduce the incrementally-maintained totals.
pub fn sum_scene_counters<'a, I>(counters: I) -> WinCounters
where
    I: IntoIterator<Item = &'a WinCounters>,
{
    let mut total = WinCounters::zero();
    for c in counters {
        total.add(c);
    }
    total
}
