//! Control-over-dynamics subtype selection.
//!
//! Ranks the family's passing candidates by phase-dependent priority,
//! evidence strength and gate quality, protects configured rare subtypes
//! from starvation within a tie-break window, enforces the cross-ply
//! cooldown, and emits at most one subtype per move.

use tagger_core::candidate::{Candidate, SuppressReason};
use tagger_core::config::ControlConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::features::Phase;
use tagger_core::result::SuppressedCandidate;

/// Outcome of one move's subtype selection.
#[derive(Debug, Default)]
pub struct Selection {
    pub chosen: Option<Candidate>,
    pub suppressed: Vec<SuppressedCandidate>,
    pub cooldown_hit: bool,
    pub cooldown_remaining: u32,
}

/// Subtype name without the family prefix, used for priority lookups.
fn subtype_name(tag: &str) -> &str {
    tag.strip_prefix("cod_").unwrap_or(tag)
}

fn priority_rank(priority: &[String], name: &str) -> usize {
    priority
        .iter()
        .position(|p| p == name)
        .unwrap_or(priority.len())
}

/// Select at most one subtype and record the choice in the cooldown state.
///
/// Only candidates that survived gating may be passed in; a selection here
/// is the single place `CooldownState` is mutated.
pub fn select_subtype(
    candidates: Vec<Candidate>,
    phase: Phase,
    ply: u32,
    cfg: &ControlConfig,
    cooldown: &mut CooldownState,
) -> Selection {
    let mut selection = Selection {
        cooldown_remaining: cooldown.remaining(ply, cfg.cooldown_plies),
        ..Selection::default()
    };
    if candidates.is_empty() {
        return selection;
    }

    let priority = cfg.priority_for(phase);
    let weights = cfg.phase_weights.get(phase);

    // Cooldown filter: the previously selected subtype may not repeat
    // inside its window even though its gate passes.
    let mut eligible: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if cooldown.blocks(&candidate.tag, ply, cfg.cooldown_plies) {
            selection.cooldown_hit = true;
            selection.suppressed.push(SuppressedCandidate {
                tag: candidate.tag,
                family: candidate.family,
                reason: SuppressReason::Cooldown,
                score: candidate.score,
            });
        } else {
            eligible.push(candidate);
        }
    }
    if eligible.is_empty() {
        return selection;
    }

    eligible.sort_by(|a, b| {
        let rank_a = priority_rank(priority, subtype_name(&a.tag));
        let rank_b = priority_rank(priority, subtype_name(&b.tag));
        rank_a
            .cmp(&rank_b)
            .then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
    });

    let composite = |candidate: &Candidate| -> f64 {
        let name = subtype_name(&candidate.tag);
        let rank = priority_rank(priority, name) as f64;
        let weight = weights.get(name).copied().unwrap_or(0.0);
        rank - weight - candidate.gate_score()
    };

    let mut selected = 0usize;
    let best_composite = composite(&eligible[0]);
    let best_is_rare = cfg
        .rare_subtypes
        .iter()
        .any(|r| r == subtype_name(&eligible[0].tag));

    // Rare-subtype tie-break: a protected subtype with phase support wins
    // when its composite lands within the configured delta and its gate
    // quality is comparable.
    if !best_is_rare {
        let rare_best = eligible
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                cfg.rare_subtypes.iter().any(|r| r == subtype_name(&c.tag))
            })
            .min_by(|(_, a), (_, b)| {
                composite(a)
                    .partial_cmp(&composite(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some((index, rare)) = rare_best {
            let weight = weights
                .get(subtype_name(&rare.tag))
                .copied()
                .unwrap_or(0.0);
            let gate_gap = (eligible[0].gate_score() - rare.gate_score()).abs();
            if weight > 0.0
                && gate_gap <= 1.0
                && composite(rare) <= best_composite + cfg.tie_break_delta
            {
                selected = index;
            }
        }
    }

    for (index, candidate) in eligible.iter().enumerate() {
        if index == selected {
            continue;
        }
        // The displaced priority winner lost the rare tie-break; everyone
        // else simply ranked lower.
        let reason = if selected != 0 && index == 0 {
            SuppressReason::TieBreakLoss
        } else {
            SuppressReason::LowerPriority
        };
        selection.suppressed.push(SuppressedCandidate {
            tag: candidate.tag.clone(),
            family: candidate.family,
            reason,
            score: candidate.score,
        });
    }

    let chosen = eligible.swap_remove(selected);
    cooldown.record(ply, &chosen.tag);
    selection.chosen = Some(chosen);
    selection
}
