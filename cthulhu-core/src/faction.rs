//! The two competing story factions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the two groups waging the covert war the story chronicles.
///
/// Every scene has exactly one protagonist faction; turns alternate between
/// the two across consecutive scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Cultists,
    Detectives,
}

/// A faction name that is neither "cultists" nor "detectives".
///
/// This is a configuration defect, not a runtime condition: catalog data and
/// stored rows may only ever name the two known factions.
#[derive(Debug, Error)]
#[error("unknown faction: {0}")]
pub struct UnknownFaction(pub String);

impl Faction {
    /// Both factions, in catalog order.
    pub const ALL: [Faction; 2] = [Faction::Cultists, Faction::Detectives];

    /// The stable lowercase key used in stores and serialized data.
    pub fn key(self) -> &'static str {
        match self {
            Faction::Cultists => "cultists",
            Faction::Detectives => "detectives",
        }
    }

    /// The faction that takes the next turn.
    pub fn opponent(self) -> Faction {
        match self {
            Faction::Cultists => Faction::Detectives,
            Faction::Detectives => Faction::Cultists,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Faction {
    type Err = UnknownFaction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cultists" => Ok(Faction::Cultists),
            "detectives" => Ok(Faction::Detectives),
            other => Err(UnknownFaction(other.to_string())),
        }
    }
}
