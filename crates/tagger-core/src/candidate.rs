//! Candidate tags proposed by family detectors.

use serde::{Deserialize, Serialize};

/// Mutually-exclusive tag family. At most one tag per family survives
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Tension,
    Prophylaxis,
    Control,
    Structure,
    Maneuver,
    Initiative,
    Sacrifice,
    Tactical,
}

/// Which side of the tactical/positional gate a family contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilySide {
    Dynamic,
    Quiet,
}

impl Family {
    pub fn side(self) -> FamilySide {
        match self {
            Family::Tension | Family::Initiative | Family::Sacrifice | Family::Tactical => {
                FamilySide::Dynamic
            }
            Family::Prophylaxis | Family::Control | Family::Structure | Family::Maneuver => {
                FamilySide::Quiet
            }
        }
    }

    /// Parent tag guaranteed whenever one of the family's subtypes fires.
    pub fn parent_tag(self) -> Option<&'static str> {
        match self {
            Family::Control => Some("control_over_dynamics"),
            _ => None,
        }
    }
}

/// One inequality check a detector evaluated while gating a candidate.
/// Kept as data so the diagnostics trail can replay the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCheck {
    pub name: String,
    pub value: f64,
    pub threshold: f64,
    pub passed: bool,
}

impl GateCheck {
    pub fn at_least(name: &str, value: f64, threshold: f64) -> Self {
        Self { name: name.to_string(), value, threshold, passed: value >= threshold }
    }

    pub fn at_most(name: &str, value: f64, threshold: f64) -> Self {
        Self { name: name.to_string(), value, threshold, passed: value <= threshold }
    }

    pub fn flag(name: &str, passed: bool) -> Self {
        Self {
            name: name.to_string(),
            value: if passed { 1.0 } else { 0.0 },
            threshold: 1.0,
            passed,
        }
    }
}

/// A detector's proposed tag for the current move. Ephemeral: produced and
/// consumed within a single move's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub tag: String,
    pub family: Family,
    /// Evidence strength; larger is stronger.
    pub score: f64,
    pub gate: Vec<GateCheck>,
    pub note: String,
}

impl Candidate {
    pub fn new(tag: &str, family: Family, score: f64, note: String) -> Self {
        Self { tag: tag.to_string(), family, score, gate: Vec::new(), note }
    }

    pub fn with_gate(mut self, gate: Vec<GateCheck>) -> Self {
        self.gate = gate;
        self
    }

    /// Number of passed gate checks, capped so subtypes with long check
    /// lists do not dominate tie-breaks.
    pub fn gate_score(&self) -> f64 {
        self.gate.iter().filter(|check| check.passed).count().min(3) as f64
    }
}

/// Why a passing candidate was kept out of the final tag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    LowerPriority,
    Cooldown,
    TieBreakLoss,
    GatedOut,
    MutualExclusion,
    Overridden,
}
