//! Maneuver family: quiet piece relocations graded by a precision score.
//!
//! Precision blends the positional components the relocation touched;
//! constructive / neutral / misplaced come from fixed bands over that score,
//! with an eval tolerance so a constructive-looking move that bleeds
//! evaluation drops to neutral.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::{FeatureContext, IntentHint};
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_CONSTRUCTIVE: &str = "constructive_maneuver";
pub const TAG_NEUTRAL: &str = "neutral_maneuver";
pub const TAG_MISPLACED: &str = "misplaced_maneuver";

/// Weighted blend of the relocation's positional effects.
fn precision_score(ctx: &FeatureContext) -> f64 {
    ctx.self_mobility_delta * 0.4
        + ctx.structural.net() * 0.3
        + ctx.king_safety_delta * 0.2
        - ctx.opp_mobility_delta.max(0.0) * 0.3
}

pub struct ManeuverDetector;

impl ManeuverDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ManeuverDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for ManeuverDetector {
    fn family(&self) -> Family {
        Family::Maneuver
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let m = &cfg.maneuver;

        // Maneuvers are quiet relocations; forcing moves belong elsewhere.
        if ctx.is_capture || ctx.is_check || ctx.is_forcing {
            return Ok(Vec::new());
        }
        if ctx.intent == IntentHint::Expansion {
            return Ok(Vec::new());
        }
        // No relocation signal at all: not a maneuver.
        if ctx.self_mobility_delta.abs() < 0.05
            && !ctx.structural.shift_signal()
            && ctx.king_safety_delta.abs() < 0.05
        {
            return Ok(Vec::new());
        }

        let precision = precision_score(ctx);
        let eval_ok = ctx.eval_drop_cp() / 100.0 <= m.eval_tolerance;

        let gate = vec![
            GateCheck::at_least("precision", precision, m.constructive_threshold),
            GateCheck::at_most("eval_cost", ctx.eval_drop_cp() / 100.0, m.eval_tolerance),
        ];
        let note = format!("maneuver precision {precision:+.2}");

        let tag = if precision >= m.constructive_threshold && eval_ok {
            TAG_CONSTRUCTIVE
        } else if precision >= m.neutral_threshold {
            TAG_NEUTRAL
        } else if precision <= m.misplaced_threshold {
            TAG_MISPLACED
        } else {
            return Ok(Vec::new());
        };

        Ok(vec![
            Candidate::new(tag, Family::Maneuver, precision.abs(), note).with_gate(gate),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(ctx: &FeatureContext) -> Vec<Candidate> {
        ManeuverDetector::new()
            .propose(ctx, &TagConfig::default(), &CooldownState::default())
            .unwrap()
    }

    #[test]
    fn test_constructive_relocation() {
        let mut ctx = FeatureContext::default();
        ctx.self_mobility_delta = 0.5;
        ctx.structural.file_pressure = 0.3;
        let candidates = detect(&ctx);
        assert_eq!(candidates[0].tag, TAG_CONSTRUCTIVE);
    }

    #[test]
    fn test_costly_constructive_downgrades_to_neutral() {
        let mut ctx = FeatureContext::default();
        ctx.self_mobility_delta = 0.5;
        ctx.structural.file_pressure = 0.3;
        ctx.eval_delta = -0.3;
        let candidates = detect(&ctx);
        assert_eq!(candidates[0].tag, TAG_NEUTRAL);
    }

    #[test]
    fn test_misplaced_relocation() {
        let mut ctx = FeatureContext::default();
        ctx.self_mobility_delta = -0.5;
        ctx.structural.pawn_islands = -0.4;
        let candidates = detect(&ctx);
        assert_eq!(candidates[0].tag, TAG_MISPLACED);
    }

    #[test]
    fn test_forcing_moves_abstain() {
        let mut ctx = FeatureContext::default();
        ctx.self_mobility_delta = 0.5;
        ctx.is_check = true;
        assert!(detect(&ctx).is_empty());
    }

    #[test]
    fn test_band_gap_abstains() {
        let mut ctx = FeatureContext::default();
        ctx.self_mobility_delta = -0.2;
        assert!(detect(&ctx).is_empty());
    }
}
