//! Gating conditions on progression steps.
//!
//! A progression step only becomes available once its conditions hold
//! against the current win counters. Conditions are plain data: a faction
//! counter, a comparison operator, and a threshold.

use crate::counters::WinCounters;
use crate::faction::Faction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when condition data names an operator outside the
/// supported set. Indicates a defect in the catalog, not user input.
#[derive(Debug, Error)]
#[error("unknown comparison operator: {0}")]
pub struct UnknownComparison(pub String);

/// A comparison operator over a counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl Comparison {
    /// The operator's conventional symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
        }
    }

    /// Apply the operator to a counter value and a threshold.
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = UnknownComparison;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Comparison::Greater),
            ">=" => Ok(Comparison::GreaterOrEqual),
            "<" => Ok(Comparison::Less),
            "<=" => Ok(Comparison::LessOrEqual),
            other => Err(UnknownComparison(other.to_string())),
        }
    }
}

/// One gating condition: `counters[faction] <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub faction: Faction,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Condition {
    pub const fn new(faction: Faction, comparison: Comparison, threshold: f64) -> Self {
        Self {
            faction,
            comparison,
            threshold,
        }
    }

    /// Whether this condition holds against the given counters.
    pub fn holds(&self, counters: &WinCounters) -> bool {
        self.comparison.holds(counters.get(self.faction), self.threshold)
    }
}

/// Whether all conditions hold (logical AND; vacuously true for an empty
/// list).
pub fn conditions_hold(conditions: &[Condition], counters: &WinCounters) -> bool {
    conditions.iter().all(|c| c.holds(counters))
}
