//! Conflict resolution and canonical ordering.
//!
//! Runs after gating and subtype selection, in a fixed order: dedupe,
//! context-label hard override, forced-move sentinel, catastrophic-loss
//! override, derived cross-family tags, per-family mutual exclusion, parent
//! completeness, canonical ordering. Invariant violations are programmer
//! errors and assert loudly in debug builds.

use std::collections::BTreeMap;

use tagger_core::candidate::{Candidate, SuppressReason};
use tagger_core::config::TagConfig;
use tagger_core::features::{FeatureContext, PlayedKind};
use tagger_core::result::SuppressedCandidate;
use tagger_core::Family;

pub const TAG_FORCED_MOVE: &str = "forced_move";
pub const TAG_MISSED_TACTIC: &str = "missed_tactic";
pub const TAG_WINNING: &str = "winning_position_handling";
pub const TAG_LOSING: &str = "losing_position_handling";
pub const TAG_DYNAMIC_OVER_CONTROL: &str = "dynamic_over_control";

/// Canonical output order. Tags not listed sort after listed ones, in
/// lexical order for determinism.
const TAG_PRIORITY: &[&str] = &[
    TAG_WINNING,
    TAG_LOSING,
    TAG_FORCED_MOVE,
    TAG_MISSED_TACTIC,
    "first_choice",
    "clean_conversion",
    "recovery_move",
    "panic_move",
    "tactical_sacrifice",
    "positional_sacrifice",
    "inaccurate_tactical_sacrifice",
    "speculative_sacrifice",
    "desperate_sacrifice",
    "tension_creation",
    "neutral_tension_creation",
    "initiative_exploitation",
    "initiative_attempt",
    "deferred_initiative",
    "control_over_dynamics",
    "cod_simplify",
    "cod_plan_kill",
    "cod_freeze_bind",
    "cod_blockade_passed",
    "cod_file_seal",
    "cod_king_safety_shell",
    "cod_space_clamp",
    "cod_regroup_consolidate",
    "cod_slowdown",
    TAG_DYNAMIC_OVER_CONTROL,
    "prophylaxis",
    "failed_prophylactic",
    "structural_integrity",
    "structural_compromise",
    "structural_compromise_dynamic",
    "constructive_maneuver",
    "neutral_maneuver",
    "misplaced_maneuver",
];

fn tag_rank(tag: &str) -> usize {
    TAG_PRIORITY
        .iter()
        .position(|t| *t == tag)
        .unwrap_or(TAG_PRIORITY.len())
}

/// Outcome of normalization: the final tag list plus override/suppression
/// diagnostics produced along the way.
#[derive(Debug, Default)]
pub struct Normalized {
    pub tags: Vec<String>,
    pub override_reason: Option<String>,
    pub suppressed: Vec<SuppressedCandidate>,
    pub notes: BTreeMap<String, String>,
}

fn overridden(candidates: &[Candidate]) -> Vec<SuppressedCandidate> {
    candidates
        .iter()
        .map(|c| SuppressedCandidate {
            tag: c.tag.clone(),
            family: c.family,
            reason: SuppressReason::Overridden,
            score: c.score,
        })
        .collect()
}

/// Resolve the surviving candidate set into the final ordered tag list.
pub fn normalize(
    candidates: Vec<Candidate>,
    ctx: &FeatureContext,
    cfg: &TagConfig,
) -> Normalized {
    let mut result = Normalized::default();

    // Context label: far-winning/far-losing positions are judged by how the
    // advantage is handled, not by style; tau scales expectations.
    let tau = cfg.context.tau(ctx.eval_before);
    if tau > cfg.context.winning_tau {
        result.suppressed = overridden(&candidates);
        result.override_reason = Some("context_label".to_string());
        result.tags = vec![TAG_WINNING.to_string()];
        return result;
    }
    if tau < cfg.context.losing_tau {
        result.suppressed = overridden(&candidates);
        result.override_reason = Some("context_label".to_string());
        result.tags = vec![TAG_LOSING.to_string()];
        return result;
    }

    // Forced move: no meaningful alternative existed, so the move carries
    // no style information.
    if f64::from(ctx.score_gap_cp) >= cfg.forced_move.threshold_cp && ctx.played_is_best {
        result.suppressed = overridden(&candidates);
        result.override_reason = Some("forced_move".to_string());
        result.tags = vec![TAG_FORCED_MOVE.to_string()];
        return result;
    }

    // Catastrophic loss, scaled by expectation: whatever the move was
    // trying to do, the tactical blunder dominates the story.
    let effective_delta = ctx.eval_delta / tau;
    // A recognized sacrifice exempts the material test; the eval test
    // still applies.
    let material_blunder = ctx.material_delta <= cfg.context.blunder_material_floor
        && !ctx.is_even_exchange
        && candidates.iter().all(|c| c.family != Family::Sacrifice);
    if effective_delta <= cfg.context.blunder_delta_floor || material_blunder {
        result.suppressed = overridden(&candidates);
        result.override_reason = Some("tactical_blunder".to_string());
        result.tags = vec![TAG_MISSED_TACTIC.to_string()];
        return result;
    }

    // Per-family mutual exclusion: keep the strongest candidate per family.
    let mut best_per_family: BTreeMap<Family, Candidate> = BTreeMap::new();
    for candidate in candidates {
        match best_per_family.get(&candidate.family) {
            Some(current) if current.score >= candidate.score => {
                result.suppressed.push(SuppressedCandidate {
                    tag: candidate.tag,
                    family: candidate.family,
                    reason: SuppressReason::MutualExclusion,
                    score: candidate.score,
                });
            }
            _ => {
                if let Some(previous) = best_per_family.insert(candidate.family, candidate) {
                    result.suppressed.push(SuppressedCandidate {
                        tag: previous.tag,
                        family: previous.family,
                        reason: SuppressReason::MutualExclusion,
                        score: previous.score,
                    });
                }
            }
        }
    }

    let mut tags: Vec<String> = Vec::new();
    for candidate in best_per_family.values() {
        if !candidate.note.is_empty() {
            result.notes.insert(candidate.tag.clone(), candidate.note.clone());
        }
        tags.push(candidate.tag.clone());
    }

    // Parent completeness: a surviving subtype always carries its parent.
    for candidate in best_per_family.values() {
        if let Some(parent) = candidate.family.parent_tag() {
            if candidate.tag != parent && !tags.iter().any(|t| t == parent) {
                tags.push(parent.to_string());
            }
        }
    }

    // Derived tag: a dynamic move chosen over control, only when no
    // control-family tag survived. Exclusive with that family by
    // construction.
    let has_control = best_per_family.contains_key(&Family::Control);
    if ctx.has_dynamic_alternative && ctx.played_kind == PlayedKind::Dynamic && !has_control {
        tags.push(TAG_DYNAMIC_OVER_CONTROL.to_string());
    }

    tags.sort_by_key(|tag| (tag_rank(tag), tag.clone()));
    tags.dedup();

    debug_assert!(
        !(tags.iter().any(|t| t == TAG_DYNAMIC_OVER_CONTROL)
            && tags.iter().any(|t| t.starts_with("cod_") || t == "control_over_dynamics")),
        "dynamic_over_control must exclude the control family"
    );
    debug_assert!(
        tags.iter()
            .filter(|t| t.starts_with("cod_"))
            .all(|_| tags.iter().any(|t| t == "control_over_dynamics")),
        "control subtype requires its parent tag"
    );

    result.tags = tags;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(tag: &str, family: Family, score: f64) -> Candidate {
        Candidate::new(tag, family, score, String::new())
    }

    #[test]
    fn test_winning_context_label_overrides_everything() {
        let mut ctx = FeatureContext::default();
        ctx.eval_before = 4.0;
        let normalized = normalize(
            vec![cand("tension_creation", Family::Tension, 1.0)],
            &ctx,
            &TagConfig::default(),
        );
        assert_eq!(normalized.tags, vec![TAG_WINNING.to_string()]);
        assert_eq!(normalized.override_reason.as_deref(), Some("context_label"));
        assert_eq!(normalized.suppressed.len(), 1);
    }

    #[test]
    fn test_losing_context_label() {
        let mut ctx = FeatureContext::default();
        ctx.eval_before = -3.0;
        let normalized = normalize(Vec::new(), &ctx, &TagConfig::default());
        assert_eq!(normalized.tags, vec![TAG_LOSING.to_string()]);
    }

    #[test]
    fn test_forced_move_sentinel() {
        let mut ctx = FeatureContext::default();
        ctx.score_gap_cp = 200;
        ctx.played_is_best = true;
        let normalized = normalize(
            vec![cand("tension_creation", Family::Tension, 1.0)],
            &ctx,
            &TagConfig::default(),
        );
        assert_eq!(normalized.tags, vec![TAG_FORCED_MOVE.to_string()]);
    }

    #[test]
    fn test_forced_move_requires_best_played() {
        let mut ctx = FeatureContext::default();
        ctx.score_gap_cp = 200;
        ctx.played_is_best = false;
        let normalized = normalize(Vec::new(), &ctx, &TagConfig::default());
        assert!(normalized.tags.is_empty());
    }

    #[test]
    fn test_catastrophic_loss_override() {
        let mut ctx = FeatureContext::default();
        ctx.eval_delta = -2.5;
        let normalized = normalize(
            vec![cand("prophylaxis", Family::Prophylaxis, 1.0)],
            &ctx,
            &TagConfig::default(),
        );
        assert_eq!(normalized.tags, vec![TAG_MISSED_TACTIC.to_string()]);
        assert_eq!(
            normalized.override_reason.as_deref(),
            Some("tactical_blunder")
        );
    }

    #[test]
    fn test_sacrifice_exempts_material_override() {
        let mut ctx = FeatureContext::default();
        ctx.material_delta = -3.0;
        let normalized = normalize(
            vec![cand("tactical_sacrifice", Family::Sacrifice, 3.0)],
            &ctx,
            &TagConfig::default(),
        );
        assert_eq!(normalized.tags, vec!["tactical_sacrifice".to_string()]);
    }

    #[test]
    fn test_family_mutual_exclusion_keeps_strongest() {
        let normalized = normalize(
            vec![
                cand("constructive_maneuver", Family::Maneuver, 0.2),
                cand("neutral_maneuver", Family::Maneuver, 0.5),
            ],
            &FeatureContext::default(),
            &TagConfig::default(),
        );
        assert_eq!(normalized.tags, vec!["neutral_maneuver".to_string()]);
        assert_eq!(normalized.suppressed.len(), 1);
        assert_eq!(
            normalized.suppressed[0].reason,
            SuppressReason::MutualExclusion
        );
    }

    #[test]
    fn test_parent_completeness_for_control_subtype() {
        let normalized = normalize(
            vec![cand("cod_simplify", Family::Control, 50.0)],
            &FeatureContext::default(),
            &TagConfig::default(),
        );
        assert_eq!(
            normalized.tags,
            vec!["control_over_dynamics".to_string(), "cod_simplify".to_string()]
        );
    }

    #[test]
    fn test_dynamic_over_control_derivation() {
        let mut ctx = FeatureContext::default();
        ctx.has_dynamic_alternative = true;
        ctx.played_kind = PlayedKind::Dynamic;
        let normalized = normalize(
            vec![cand("tension_creation", Family::Tension, 1.0)],
            &ctx,
            &TagConfig::default(),
        );
        assert!(normalized.tags.contains(&TAG_DYNAMIC_OVER_CONTROL.to_string()));
    }

    #[test]
    fn test_dynamic_over_control_suppressed_by_control_tag() {
        let mut ctx = FeatureContext::default();
        ctx.has_dynamic_alternative = true;
        ctx.played_kind = PlayedKind::Dynamic;
        let normalized = normalize(
            vec![cand("cod_slowdown", Family::Control, 50.0)],
            &ctx,
            &TagConfig::default(),
        );
        assert!(!normalized.tags.contains(&TAG_DYNAMIC_OVER_CONTROL.to_string()));
    }

    #[test]
    fn test_canonical_ordering() {
        let normalized = normalize(
            vec![
                cand("prophylaxis", Family::Prophylaxis, 1.0),
                cand("first_choice", Family::Tactical, 1.0),
                cand("tension_creation", Family::Tension, 1.0),
            ],
            &FeatureContext::default(),
            &TagConfig::default(),
        );
        assert_eq!(
            normalized.tags,
            vec![
                "first_choice".to_string(),
                "tension_creation".to_string(),
                "prophylaxis".to_string(),
            ]
        );
    }
}
