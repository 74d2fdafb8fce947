//! Per-move feature snapshot consumed by all detectors.
//!
//! Produced externally by the feature-extraction layer; immutable inside the
//! engine. Every numeric field defaults to zero/neutral so a snapshot with
//! absent fields deserializes cleanly and only disables the detectors that
//! depend on the missing signal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Game phase bucket derived from the continuous phase ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

/// Coarse intent classification supplied by the feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentHint {
    Expansion,
    Restriction,
    Passive,
    #[default]
    Neutral,
}

/// Kind of the played move relative to the engine's candidate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayedKind {
    Dynamic,
    Positional,
    #[default]
    Neutral,
}

/// Structural change vector for the played move (self perspective,
/// positive = improvement).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralDelta {
    pub pawn_islands: f64,
    pub passed_pawns: f64,
    pub king_shield: f64,
    pub file_pressure: f64,
}

impl StructuralDelta {
    /// True when any component moved enough to count as a structural shift.
    pub fn shift_signal(&self) -> bool {
        const SHIFT_MIN: f64 = 0.15;
        self.pawn_islands.abs() >= SHIFT_MIN
            || self.passed_pawns.abs() >= SHIFT_MIN
            || self.king_shield.abs() >= SHIFT_MIN
            || self.file_pressure.abs() >= SHIFT_MIN
    }

    pub fn net(&self) -> f64 {
        self.pawn_islands + self.passed_pawns + self.king_shield + self.file_pressure
    }
}

/// Control-family metrics precomputed by the feature extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlMetrics {
    /// Reduction in eval volatility after the move, centipawns.
    pub volatility_drop_cp: f64,
    /// Change in pawn-tension count (negative = tension released).
    pub tension_delta: f64,
    /// Drop in opponent mobility (positive = opponent more restricted).
    pub opp_mobility_drop: f64,
    /// Change in own contact ratio (negative = fewer piece contacts).
    pub contact_ratio_drop: f64,
    /// Completed exchange pairs on this ply (capture + expected recapture).
    pub exchange_pairs: u32,
    /// Newly pinned opponent pieces.
    pub opp_pins_increase: u32,
    pub opp_passed_exists: bool,
    pub blockade_established: bool,
    /// Reduction in opponent passed-pawn push targets.
    pub opp_passed_push_drop: f64,
    /// Static exchange on the blockade front square is non-positive.
    pub blockade_see_non_positive: bool,
    /// Drop in opponent pressure along open lines.
    pub opp_line_pressure_drop: f64,
    /// Change in own pawn-break candidates (negative = lines sealed).
    pub break_candidates_delta: f64,
    pub space_gain: f64,
    pub space_control_gain: f64,
    pub structure_gain: f64,
    pub self_mobility_change: f64,
}

/// External plan-drop sampler verdict, carried through metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanDropStatus {
    Ok,
    Timeout,
    Unstable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDrop {
    pub status: PlanDropStatus,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub plan_loss: f64,
}

/// Immutable per-move metrics record. All deltas are played-vs-before from
/// the mover's perspective, evaluations in normalized pawn units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureContext {
    /// Half-move number within the game, 1-indexed.
    pub ply: u32,
    pub eval_before: f64,
    pub eval_delta: f64,
    pub self_mobility_delta: f64,
    pub opp_mobility_delta: f64,
    pub contact_delta: f64,
    /// 0 = opening, 1 = endgame.
    pub phase_ratio: f64,
    pub structural: StructuralDelta,
    pub king_safety_delta: f64,
    pub opp_king_safety_delta: f64,
    pub opp_tactics_delta: f64,
    /// Continuous 0-1 sharpness estimate; drives the gating stage.
    pub tactical_weight: f64,
    pub intent: IntentHint,
    /// Gap between the engine's top choice and the runner-up, centipawns.
    pub score_gap_cp: i32,
    pub played_is_best: bool,
    pub played_kind: PlayedKind,
    /// A dynamic alternative existed in the engine's candidate band.
    pub has_dynamic_alternative: bool,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_forcing: bool,
    /// Offered trade the extractor judged materially even.
    pub is_even_exchange: bool,
    /// Net material change for the mover, pawns.
    pub material_delta: f64,
    /// Prophylaxis preventive score from the threat sampler.
    pub preventive_score: f64,
    /// Reduction in the opponent's best-threat strength.
    pub threat_delta: f64,
    pub control: ControlMetrics,
    /// Absolute mobility deltas over the following plies, self then opponent.
    pub follow_self_mobility: Vec<f64>,
    pub follow_opp_mobility: Vec<f64>,
    pub self_trend: f64,
    pub opp_trend: f64,
    /// Detector-specific signals (plan-drop diagnostics live under "plan_drop").
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FeatureContext {
    pub fn phase(&self) -> Phase {
        if self.phase_ratio < 0.3 {
            Phase::Opening
        } else if self.phase_ratio > 0.7 {
            Phase::Endgame
        } else {
            Phase::Middlegame
        }
    }

    /// Eval drop in centipawns (0 when the move did not lose anything).
    pub fn eval_drop_cp(&self) -> f64 {
        (-self.eval_delta * 100.0).max(0.0)
    }

    /// Plan-drop sampler verdict, if the metadata carries one.
    ///
    /// A sampler that timed out or was unstable is reported for diagnostics
    /// but must never influence tags, so `plan_drop_passed` only honors an
    /// `ok` status.
    pub fn plan_drop(&self) -> Option<PlanDrop> {
        let value = self.extra.get("plan_drop")?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn plan_drop_passed(&self) -> bool {
        matches!(
            self.plan_drop(),
            Some(PlanDrop { status: PlanDropStatus::Ok, passed: true, .. })
        )
    }

    /// Guards against NaN in the fields every detector touches.
    pub fn check_finite(&self) -> Result<(), crate::error::DetectorError> {
        let fields = [
            ("eval_before", self.eval_before),
            ("eval_delta", self.eval_delta),
            ("self_mobility_delta", self.self_mobility_delta),
            ("opp_mobility_delta", self.opp_mobility_delta),
            ("contact_delta", self.contact_delta),
            ("phase_ratio", self.phase_ratio),
            ("tactical_weight", self.tactical_weight),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(crate::error::DetectorError::MalformedContext(format!(
                    "{name} is not finite"
                )));
            }
        }
        Ok(())
    }
}
