//! Tactical family: engine-choice comparisons such as finding the first
//! choice, missing a tactic, converting cleanly, panicking, recovering.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::FeatureContext;
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_FIRST_CHOICE: &str = "first_choice";
pub const TAG_MISSED: &str = "missed_tactic";
pub const TAG_CONVERSION: &str = "clean_conversion";
pub const TAG_PANIC: &str = "panic_move";
pub const TAG_RECOVERY: &str = "recovery_move";

pub struct TacticalDetector;

impl TacticalDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TacticalDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for TacticalDetector {
    fn family(&self) -> Family {
        Family::Tactical
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let t = &cfg.tactical;
        let gap = f64::from(ctx.score_gap_cp);
        let loss_cp = ctx.eval_drop_cp();
        let eval_before_cp = ctx.eval_before * 100.0;
        let eval_after_cp = (ctx.eval_before + ctx.eval_delta) * 100.0;

        // Missed tactic: a clearly best tactical shot existed and the played
        // move gave most of it back.
        if gap >= t.gap_first_choice_cp && !ctx.played_is_best && loss_cp >= t.miss_loss_cp {
            let gate = vec![
                GateCheck::at_least("score_gap", gap, t.gap_first_choice_cp),
                GateCheck::at_least("loss", loss_cp, t.miss_loss_cp),
            ];
            let note = format!("missed a {gap:.0}cp tactic, lost {loss_cp:.0}cp");
            return Ok(vec![
                Candidate::new(TAG_MISSED, Family::Tactical, loss_cp, note).with_gate(gate),
            ]);
        }

        // First choice: found the standout engine move. Dominant gaps are
        // the forced-move normalizer's business, not a style signal.
        if ctx.played_is_best && gap >= t.gap_first_choice_cp && gap < t.dominance_cp {
            let gate = vec![
                GateCheck::at_least("score_gap", gap, t.gap_first_choice_cp),
                GateCheck::at_most("dominance", gap, t.dominance_cp),
            ];
            let note = format!("found the only good move ({gap:.0}cp ahead of the field)");
            return Ok(vec![
                Candidate::new(TAG_FIRST_CHOICE, Family::Tactical, gap, note).with_gate(gate),
            ]);
        }

        // Clean conversion: winning position kept tight.
        if eval_before_cp >= 200.0 && loss_cp <= t.conversion_drop_cap_cp && ctx.played_is_best {
            let gate = vec![
                GateCheck::at_least("eval_before", eval_before_cp, 200.0),
                GateCheck::at_most("loss", loss_cp, t.conversion_drop_cap_cp),
            ];
            let note = format!("converted a won position (loss {loss_cp:.0}cp)");
            return Ok(vec![
                Candidate::new(TAG_CONVERSION, Family::Tactical, -loss_cp, note).with_gate(gate),
            ]);
        }

        // Panic: large self-inflicted collapse with activity thrown away.
        if loss_cp >= t.panic_drop_cp && ctx.self_mobility_delta <= t.panic_mobility {
            let gate = vec![
                GateCheck::at_least("loss", loss_cp, t.panic_drop_cp),
                GateCheck::at_most("self_mobility", ctx.self_mobility_delta, t.panic_mobility),
            ];
            let note = format!("panic: lost {loss_cp:.0}cp and gave up activity");
            return Ok(vec![
                Candidate::new(TAG_PANIC, Family::Tactical, loss_cp, note).with_gate(gate),
            ]);
        }

        // Recovery: climbed back from a lost position toward playable.
        if eval_before_cp <= t.recovery_from_cp && eval_after_cp >= t.recovery_to_cp {
            let gate = vec![
                GateCheck::at_most("eval_before", eval_before_cp, t.recovery_from_cp),
                GateCheck::at_least("eval_after", eval_after_cp, t.recovery_to_cp),
            ];
            let note = format!(
                "recovered from {:.0}cp to {:.0}cp",
                eval_before_cp, eval_after_cp
            );
            let score = eval_after_cp - eval_before_cp;
            return Ok(vec![
                Candidate::new(TAG_RECOVERY, Family::Tactical, score, note).with_gate(gate),
            ]);
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(ctx: &FeatureContext) -> Vec<Candidate> {
        TacticalDetector::new()
            .propose(ctx, &TagConfig::default(), &CooldownState::default())
            .unwrap()
    }

    #[test]
    fn test_first_choice() {
        let mut ctx = FeatureContext::default();
        ctx.score_gap_cp = 120;
        ctx.played_is_best = true;
        assert_eq!(detect(&ctx)[0].tag, TAG_FIRST_CHOICE);
    }

    #[test]
    fn test_dominant_gap_is_not_first_choice() {
        let mut ctx = FeatureContext::default();
        ctx.score_gap_cp = 350;
        ctx.played_is_best = true;
        assert!(detect(&ctx).iter().all(|c| c.tag != TAG_FIRST_CHOICE));
    }

    #[test]
    fn test_missed_tactic() {
        let mut ctx = FeatureContext::default();
        ctx.score_gap_cp = 200;
        ctx.played_is_best = false;
        ctx.eval_delta = -1.8;
        assert_eq!(detect(&ctx)[0].tag, TAG_MISSED);
    }

    #[test]
    fn test_clean_conversion() {
        let mut ctx = FeatureContext::default();
        ctx.eval_before = 3.0;
        ctx.eval_delta = -0.1;
        ctx.played_is_best = true;
        assert_eq!(detect(&ctx)[0].tag, TAG_CONVERSION);
    }

    #[test]
    fn test_panic_move() {
        let mut ctx = FeatureContext::default();
        ctx.eval_delta = -3.0;
        ctx.self_mobility_delta = -1.0;
        assert_eq!(detect(&ctx)[0].tag, TAG_PANIC);
    }

    #[test]
    fn test_recovery_move() {
        let mut ctx = FeatureContext::default();
        ctx.eval_before = -3.5;
        ctx.eval_delta = 2.8;
        assert_eq!(detect(&ctx)[0].tag, TAG_RECOVERY);
    }

    #[test]
    fn test_quiet_equal_move_abstains() {
        let ctx = FeatureContext::default();
        assert!(detect(&ctx).is_empty());
    }
}
