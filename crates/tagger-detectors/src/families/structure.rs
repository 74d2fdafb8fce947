//! Structure family: pawn-structure integrity kept or given up.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::FeatureContext;
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_INTEGRITY: &str = "structural_integrity";
pub const TAG_COMPROMISE: &str = "structural_compromise";
pub const TAG_COMPROMISE_DYNAMIC: &str = "structural_compromise_dynamic";

pub struct StructureDetector;

impl StructureDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StructureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for StructureDetector {
    fn family(&self) -> Family {
        Family::Structure
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let s = &cfg.structure;
        let net = ctx.structural.net();

        if !ctx.structural.shift_signal() {
            return Ok(Vec::new());
        }

        let gate = vec![
            GateCheck::at_least("structure_net", net, s.integrity_gain),
            GateCheck::at_most("eval_cost", ctx.eval_drop_cp() / 100.0, s.eval_tolerance),
        ];

        if net >= s.integrity_gain && ctx.eval_drop_cp() / 100.0 <= s.eval_tolerance {
            let note = format!("structure improved by {net:+.2}");
            return Ok(vec![
                Candidate::new(TAG_INTEGRITY, Family::Structure, net, note).with_gate(gate),
            ]);
        }

        if net <= s.weaken_limit {
            // A structure concession during sharp play is a dynamic choice,
            // not a positional lapse.
            let tag = if ctx.tactical_weight >= s.dynamic_weight_min {
                TAG_COMPROMISE_DYNAMIC
            } else {
                TAG_COMPROMISE
            };
            let note = format!(
                "structure weakened by {net:+.2} (tactical weight {:.2})",
                ctx.tactical_weight
            );
            return Ok(vec![
                Candidate::new(tag, Family::Structure, -net, note).with_gate(gate),
            ]);
        }

        Ok(Vec::new())
    }
}
