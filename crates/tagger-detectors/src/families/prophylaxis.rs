//! Prophylaxis family: preventive play that restricts the opponent before
//! a threat materializes.
//!
//! Prophylactic moves must be anticipatory, not reactive: captures and
//! checks are excluded up front. The preventive score and threat delta come
//! from the external threat sampler and are capped at `safety_cap` so one
//! deep tactic cannot saturate the signal.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::FeatureContext;
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_PROPHYLAXIS: &str = "prophylaxis";
pub const TAG_FAILED: &str = "failed_prophylactic";

pub struct ProphylaxisDetector;

impl ProphylaxisDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProphylaxisDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for ProphylaxisDetector {
    fn family(&self) -> Family {
        Family::Prophylaxis
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let p = &cfg.prophylaxis;

        // Reactive moves are never prophylactic.
        if ctx.is_capture || ctx.is_check {
            return Ok(Vec::new());
        }

        let preventive = ctx.preventive_score.min(p.safety_cap);
        let restriction = ctx.threat_delta >= p.threat_drop
            || ctx.opp_mobility_delta <= -p.opp_mobility_drop;
        let self_bounded = ctx.self_mobility_delta.abs() <= p.mobility_self_limit;
        // A bounded structural concession is tolerated; a collapse is not.
        let structure_ok = ctx.structural.net() >= -p.structure_min;

        let gate = vec![
            GateCheck::at_least("preventive_score", preventive, p.preventive_trigger),
            GateCheck::flag("opp_restricted", restriction),
            GateCheck::at_most("self_mobility", ctx.self_mobility_delta.abs(), p.mobility_self_limit),
            GateCheck::at_least("structure_kept", ctx.structural.net(), -p.structure_min),
        ];

        if preventive >= p.preventive_trigger && restriction && self_bounded && structure_ok {
            // Preventive idea that costs real evaluation in a balanced
            // position reads as failed prophylaxis, not the clean tag.
            let near_equal = (ctx.eval_before * 100.0).abs() <= p.fail_eval_band_cp;
            if near_equal && ctx.eval_drop_cp() >= p.fail_drop_cp {
                let note = format!(
                    "preventive idea lost {:.0}cp in a balanced position",
                    ctx.eval_drop_cp()
                );
                return Ok(vec![
                    Candidate::new(TAG_FAILED, Family::Prophylaxis, preventive, note)
                        .with_gate(gate),
                ]);
            }

            let score = preventive + ctx.threat_delta.max(0.0);
            let note = format!(
                "preventive {preventive:+.2}, threat drop {:+.2}, opp mobility {:+.2}",
                ctx.threat_delta, ctx.opp_mobility_delta
            );
            return Ok(vec![
                Candidate::new(TAG_PROPHYLAXIS, Family::Prophylaxis, score, note).with_gate(gate),
            ]);
        }

        Ok(Vec::new())
    }
}
