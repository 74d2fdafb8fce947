//! Sacrifice family: classify deliberate material concessions.
//!
//! The extractor supplies the net material swing and an even-exchange flag
//! (offered trades the opponent can meet with an equal capture); the
//! classification here is purely over eval loss, opponent king-safety drop
//! and the pre-move evaluation.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::FeatureContext;
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_TACTICAL: &str = "tactical_sacrifice";
pub const TAG_POSITIONAL: &str = "positional_sacrifice";
pub const TAG_INACCURATE: &str = "inaccurate_tactical_sacrifice";
pub const TAG_SPECULATIVE: &str = "speculative_sacrifice";
pub const TAG_DESPERATE: &str = "desperate_sacrifice";

pub struct SacrificeDetector;

impl SacrificeDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SacrificeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for SacrificeDetector {
    fn family(&self) -> Family {
        Family::Sacrifice
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let s = &cfg.sacrifice;

        // Offered equal trades are not sacrifices.
        if ctx.is_even_exchange {
            return Ok(Vec::new());
        }
        let material_loss = -ctx.material_delta;
        if material_loss < s.min_loss {
            return Ok(Vec::new());
        }

        let eval_loss = ctx.eval_delta.abs();
        let king_drop = ctx.opp_king_safety_delta <= s.king_drop_threshold;
        let within_tolerance = eval_loss <= s.eval_tolerance;

        let gate = vec![
            GateCheck::at_least("material_loss", material_loss, s.min_loss),
            GateCheck::at_most("eval_loss", eval_loss, s.eval_tolerance),
            GateCheck::at_most("opp_king_safety", ctx.opp_king_safety_delta, s.king_drop_threshold),
        ];

        // Desperation overrides the quality split: the player was already
        // lost and is throwing material at the problem.
        let tag = if ctx.eval_before <= s.desperate_eval_max {
            TAG_DESPERATE
        } else if king_drop && within_tolerance {
            TAG_TACTICAL
        } else if !king_drop && within_tolerance {
            TAG_POSITIONAL
        } else if king_drop {
            TAG_INACCURATE
        } else if ctx.tactical_weight >= s.speculative_weight_min {
            // No concrete payoff yet, but the position is sharp enough that
            // compensation may still exist.
            TAG_SPECULATIVE
        } else {
            TAG_INACCURATE
        };

        let note = format!(
            "sacrificed {material_loss:.1} pawns; eval loss {eval_loss:.2}, opp king {:+.2}",
            ctx.opp_king_safety_delta
        );
        Ok(vec![
            Candidate::new(tag, Family::Sacrifice, material_loss, note).with_gate(gate),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(ctx: &FeatureContext) -> Vec<Candidate> {
        SacrificeDetector::new()
            .propose(ctx, &TagConfig::default(), &CooldownState::default())
            .unwrap()
    }

    fn sac_ctx() -> FeatureContext {
        let mut ctx = FeatureContext::default();
        ctx.material_delta = -3.0;
        ctx.eval_delta = -0.2;
        ctx
    }

    #[test]
    fn test_tactical_sacrifice_hits_the_king() {
        let mut ctx = sac_ctx();
        ctx.opp_king_safety_delta = -0.4;
        assert_eq!(detect(&ctx)[0].tag, TAG_TACTICAL);
    }

    #[test]
    fn test_positional_sacrifice_without_king_attack() {
        let mut ctx = sac_ctx();
        ctx.opp_king_safety_delta = 0.1;
        assert_eq!(detect(&ctx)[0].tag, TAG_POSITIONAL);
    }

    #[test]
    fn test_inaccurate_when_eval_collapses() {
        let mut ctx = sac_ctx();
        ctx.opp_king_safety_delta = -0.4;
        ctx.eval_delta = -1.5;
        assert_eq!(detect(&ctx)[0].tag, TAG_INACCURATE);
    }

    #[test]
    fn test_speculative_needs_a_sharp_position() {
        let mut ctx = sac_ctx();
        ctx.opp_king_safety_delta = 0.2;
        ctx.eval_delta = -1.5;
        ctx.tactical_weight = 0.7;
        assert_eq!(detect(&ctx)[0].tag, TAG_SPECULATIVE);

        // In a calm position the same concession is just inaccurate.
        ctx.tactical_weight = 0.2;
        assert_eq!(detect(&ctx)[0].tag, TAG_INACCURATE);
    }

    #[test]
    fn test_desperate_when_already_lost() {
        let mut ctx = sac_ctx();
        ctx.eval_before = -4.0;
        ctx.opp_king_safety_delta = -0.4;
        assert_eq!(detect(&ctx)[0].tag, TAG_DESPERATE);
    }

    #[test]
    fn test_even_exchange_is_not_a_sacrifice() {
        let mut ctx = sac_ctx();
        ctx.is_even_exchange = true;
        assert!(detect(&ctx).is_empty());
    }

    #[test]
    fn test_small_loss_abstains() {
        let mut ctx = sac_ctx();
        ctx.material_delta = -0.3;
        assert!(detect(&ctx).is_empty());
    }
}
