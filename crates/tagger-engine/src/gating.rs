//! Tactical/positional gating stage.
//!
//! A single tactical-weight scalar picks one of three modes; the gate then
//! filters the combined candidate set. Detectors never see the gate, so the
//! same candidates are proposed regardless of mode.

use tagger_core::candidate::{Candidate, FamilySide, SuppressReason};
use tagger_core::config::GateConfig;
use tagger_core::result::{GateMode, SuppressedCandidate};

pub fn gate_mode(tactical_weight: f64, cfg: &GateConfig) -> GateMode {
    if tactical_weight >= cfg.tactical_high {
        GateMode::TacticalOnly
    } else if tactical_weight <= cfg.positional_low {
        GateMode::PositionalOnly
    } else {
        GateMode::Both
    }
}

/// Split candidates into survivors and gating-suppressed diagnostics.
pub fn apply_gate(
    mode: GateMode,
    candidates: Vec<Candidate>,
) -> (Vec<Candidate>, Vec<SuppressedCandidate>) {
    let mut survivors = Vec::new();
    let mut suppressed = Vec::new();
    for candidate in candidates {
        let allowed = match mode {
            GateMode::Both => true,
            GateMode::TacticalOnly => candidate.family.side() == FamilySide::Dynamic,
            GateMode::PositionalOnly => candidate.family.side() == FamilySide::Quiet,
        };
        if allowed {
            survivors.push(candidate);
        } else {
            suppressed.push(SuppressedCandidate {
                tag: candidate.tag,
                family: candidate.family,
                reason: SuppressReason::GatedOut,
                score: candidate.score,
            });
        }
    }
    (survivors, suppressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagger_core::Family;

    fn cand(tag: &str, family: Family) -> Candidate {
        Candidate::new(tag, family, 1.0, String::new())
    }

    #[test]
    fn test_band_edges() {
        let cfg = GateConfig::default();
        assert_eq!(gate_mode(0.9, &cfg), GateMode::TacticalOnly);
        assert_eq!(gate_mode(0.65, &cfg), GateMode::TacticalOnly);
        assert_eq!(gate_mode(0.5, &cfg), GateMode::Both);
        assert_eq!(gate_mode(0.35, &cfg), GateMode::PositionalOnly);
        assert_eq!(gate_mode(0.1, &cfg), GateMode::PositionalOnly);
    }

    #[test]
    fn test_tactical_only_discards_quiet_families() {
        let candidates = vec![
            cand("tension_creation", Family::Tension),
            cand("cod_simplify", Family::Control),
        ];
        let (survivors, suppressed) = apply_gate(GateMode::TacticalOnly, candidates);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].tag, "tension_creation");
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].reason, SuppressReason::GatedOut);
    }

    #[test]
    fn test_both_mode_keeps_everything() {
        let candidates = vec![
            cand("tension_creation", Family::Tension),
            cand("cod_simplify", Family::Control),
        ];
        let (survivors, suppressed) = apply_gate(GateMode::Both, candidates);
        assert_eq!(survivors.len(), 2);
        assert!(suppressed.is_empty());
    }
}
