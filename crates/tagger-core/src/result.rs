//! Final per-move output: ordered tag list plus the diagnostics trail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidate::{Family, GateCheck, SuppressReason};

/// Which families may contribute tags this move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    TacticalOnly,
    PositionalOnly,
    Both,
}

/// Passing candidate that was kept out of the final list, with the reason.
/// Diagnostic only; never surfaces in `tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressedCandidate {
    pub tag: String,
    pub family: Family,
    pub reason: SuppressReason,
    pub score: f64,
}

/// A family detector that failed on this move. The failure is isolated so
/// the remaining families still run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorFailure {
    pub family: Family,
    pub message: String,
}

/// Threshold values the decision actually used, snapshotted for regression
/// tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdSnapshot {
    pub tactical_high: f64,
    pub positional_low: f64,
    pub cooldown_plies: u32,
    pub forced_move_threshold_cp: f64,
    pub tension_v2_boundary: bool,
}

/// Machine-readable evidence trail for one move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub gate_mode: Option<GateMode>,
    pub tactical_weight: f64,
    pub thresholds: ThresholdSnapshot,
    pub suppressed: Vec<SuppressedCandidate>,
    pub cooldown_hit: bool,
    pub cooldown_remaining: u32,
    pub detector_failures: Vec<DetectorFailure>,
    /// Gate checks per evaluated candidate tag.
    pub gates: BTreeMap<String, Vec<GateCheck>>,
    /// Full-override applied, if any ("context_label", "forced_move",
    /// "tactical_blunder").
    pub override_reason: Option<String>,
    /// Human-readable note per emitted tag.
    pub notes: BTreeMap<String, String>,
}

/// The engine's output for one move. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResult {
    pub ply: u32,
    pub tags: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl TagResult {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
