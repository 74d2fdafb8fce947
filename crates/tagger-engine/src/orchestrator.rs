//! Per-game orchestration: gate, detect, select, normalize.
//!
//! `GameTagger` owns the cooldown state for one game. Moves must be fed in
//! ply order; games are independent, so batch layers run one tagger per
//! game. A detector failure is isolated into that move's diagnostics and
//! the remaining families continue.

use tracing::{debug, warn};

use tagger_core::candidate::Candidate;
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::features::FeatureContext;
use tagger_core::result::{DetectorFailure, Diagnostics, TagResult, ThresholdSnapshot};
use tagger_core::Family;
use tagger_detectors::{all_detectors, FamilyDetector};

use crate::gating::{apply_gate, gate_mode};
use crate::normalizer::normalize;
use crate::selector::select_subtype;

pub struct GameTagger {
    cfg: TagConfig,
    detectors: Vec<Box<dyn FamilyDetector + Send + Sync>>,
    cooldown: CooldownState,
}

impl GameTagger {
    pub fn new(cfg: TagConfig) -> Self {
        Self {
            cfg,
            detectors: all_detectors(),
            cooldown: CooldownState::default(),
        }
    }

    pub fn config(&self) -> &TagConfig {
        &self.cfg
    }

    fn threshold_snapshot(&self) -> ThresholdSnapshot {
        ThresholdSnapshot {
            tactical_high: self.cfg.gate.tactical_high,
            positional_low: self.cfg.gate.positional_low,
            cooldown_plies: self.cfg.control.cooldown_plies,
            forced_move_threshold_cp: self.cfg.forced_move.threshold_cp,
            tension_v2_boundary: self.cfg.tension.use_v2_boundary,
        }
    }

    /// Tag a single move. Mutates cooldown state only when the subtype
    /// selector actually picks a control subtype.
    pub fn tag_move(&mut self, ctx: &FeatureContext) -> TagResult {
        let mut diagnostics = Diagnostics {
            tactical_weight: ctx.tactical_weight,
            thresholds: self.threshold_snapshot(),
            ..Diagnostics::default()
        };

        // Run every registered detector; isolate failures per family.
        let mut candidates: Vec<Candidate> = Vec::new();
        for detector in &self.detectors {
            match detector.propose(ctx, &self.cfg, &self.cooldown) {
                Ok(mut proposed) => {
                    for candidate in &proposed {
                        diagnostics
                            .gates
                            .insert(candidate.tag.clone(), candidate.gate.clone());
                    }
                    candidates.append(&mut proposed);
                }
                Err(err) => {
                    warn!(
                        ply = ctx.ply,
                        family = ?detector.family(),
                        error = %err,
                        "Detector failed; continuing with remaining families"
                    );
                    diagnostics.detector_failures.push(DetectorFailure {
                        family: detector.family(),
                        message: err.to_string(),
                    });
                }
            }
        }

        // Gate the combined candidate set. Gating-suppressed families never
        // reach the selector, so they never touch cooldown state.
        let mode = gate_mode(ctx.tactical_weight, &self.cfg.gate);
        diagnostics.gate_mode = Some(mode);
        let (survivors, gated_out) = apply_gate(mode, candidates);
        diagnostics.suppressed.extend(gated_out);

        // Subtype selection for the control family.
        let (control, mut others): (Vec<Candidate>, Vec<Candidate>) = survivors
            .into_iter()
            .partition(|c| c.family == Family::Control);
        let selection = select_subtype(
            control,
            ctx.phase(),
            ctx.ply,
            &self.cfg.control,
            &mut self.cooldown,
        );
        diagnostics.cooldown_hit = selection.cooldown_hit;
        diagnostics.cooldown_remaining = selection.cooldown_remaining;
        diagnostics.suppressed.extend(selection.suppressed);
        if let Some(chosen) = selection.chosen {
            others.push(chosen);
        }

        let normalized = normalize(others, ctx, &self.cfg);
        diagnostics.override_reason = normalized.override_reason;
        diagnostics.suppressed.extend(normalized.suppressed);
        diagnostics.notes.extend(normalized.notes);

        debug!(ply = ctx.ply, tags = ?normalized.tags, "Tagged move");
        TagResult {
            ply: ctx.ply,
            tags: normalized.tags,
            diagnostics,
        }
    }

    /// Tag a full game in ply order.
    pub fn tag_game(&mut self, moves: &[FeatureContext]) -> Vec<TagResult> {
        moves.iter().map(|ctx| self.tag_move(ctx)).collect()
    }
}
