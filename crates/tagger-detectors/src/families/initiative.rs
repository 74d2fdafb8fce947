//! Initiative family: pressing an advantage, attempting to seize one, or
//! deliberately deferring active play to consolidate.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::{FeatureContext, IntentHint};
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_EXPLOITATION: &str = "initiative_exploitation";
pub const TAG_ATTEMPT: &str = "initiative_attempt";
pub const TAG_DEFERRED: &str = "deferred_initiative";

pub struct InitiativeDetector;

impl InitiativeDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InitiativeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for InitiativeDetector {
    fn family(&self) -> Family {
        Family::Initiative
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let i = &cfg.initiative;

        // Exploitation: already better, the move improved things further
        // while keeping own pieces active.
        if ctx.eval_before >= i.exploit_eval_min
            && ctx.eval_delta >= -i.exploit_eval_tolerance
            && ctx.self_mobility_delta > 0.0
        {
            let gate = vec![
                GateCheck::at_least("eval_before", ctx.eval_before, i.exploit_eval_min),
                GateCheck::at_least("mobility_gain", ctx.self_mobility_delta, 0.0),
            ];
            let note = format!(
                "pressed advantage: eval {:+.2} with mobility gain {:+.2}",
                ctx.eval_before, ctx.self_mobility_delta
            );
            let score = ctx.eval_before + ctx.self_mobility_delta;
            return Ok(vec![
                Candidate::new(TAG_EXPLOITATION, Family::Initiative, score, note).with_gate(gate),
            ]);
        }

        // Attempt: sharp expansion play from a roughly level position.
        let expansion_intent =
            matches!(ctx.intent, IntentHint::Expansion) || ctx.is_forcing || ctx.is_check;
        if expansion_intent
            && ctx.eval_before >= i.attempt_eval_floor
            && ctx.tactical_weight >= i.attempt_weight_min
            && ctx.self_mobility_delta > 0.0
        {
            let gate = vec![
                GateCheck::at_least("eval_floor", ctx.eval_before, i.attempt_eval_floor),
                GateCheck::at_least("tactical_weight", ctx.tactical_weight, i.attempt_weight_min),
                GateCheck::at_least("mobility_gain", ctx.self_mobility_delta, 0.0),
            ];
            let note = format!(
                "initiative attempt (weight {:.2}, mobility {:+.2})",
                ctx.tactical_weight, ctx.self_mobility_delta
            );
            return Ok(vec![
                Candidate::new(TAG_ATTEMPT, Family::Initiative, ctx.tactical_weight, note)
                    .with_gate(gate),
            ]);
        }

        // Deferred: quiet consolidation that keeps the position stable while
        // trimming own activity instead of lashing out.
        let consolidating = ctx.self_mobility_delta < 0.0 || ctx.king_safety_delta >= 0.05;
        if !ctx.is_capture
            && !ctx.is_check
            && !ctx.is_forcing
            && consolidating
            && ctx.self_mobility_delta <= i.deferred_mobility_cap
            && (-ctx.eval_drop_cp()) > i.deferred_drop_floor_cp
            && ctx.eval_delta >= -0.3
        {
            let gate = vec![
                GateCheck::at_most("self_mobility", ctx.self_mobility_delta, i.deferred_mobility_cap),
                GateCheck::at_least("eval_delta", ctx.eval_delta, -0.3),
            ];
            let note =
                "consolidating move with minimal aggression kept the initiative alive".to_string();
            return Ok(vec![
                Candidate::new(TAG_DEFERRED, Family::Initiative, -ctx.self_mobility_delta, note)
                    .with_gate(gate),
            ]);
        }

        Ok(Vec::new())
    }
}
