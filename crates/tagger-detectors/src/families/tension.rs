//! Tension boundary classifier.
//!
//! Three-way decision: no tag / `tension_creation` / `neutral_tension_creation`.
//! Active tension needs an eval band plus an opposite-direction mobility
//! swing of matching magnitude, or a contact jump, or a hard trigger
//! (score gap, forcing move, material imbalance). The neutral label fires
//! only inside a small eval band and only when a minimum evidence gate on
//! mobility or contact passes, to keep quiet book moves untagged.
//!
//! Two evidence rule-sets (v1/v2) are selectable per run for side-by-side
//! tuning; v2 carries stricter gates.

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::FeatureContext;
use tagger_core::Family;

use crate::detector::FamilyDetector;

pub const TAG_ACTIVE: &str = "tension_creation";
pub const TAG_NEUTRAL: &str = "neutral_tension_creation";

/// Mean and variance of absolute mobility deltas over a short window.
fn window_stats(deltas: &[f64], steps: usize) -> (f64, f64) {
    if deltas.len() < steps {
        return (0.0, 0.0);
    }
    let window: Vec<f64> = deltas[..steps].iter().map(|d| d.abs()).collect();
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance =
        window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window.len() as f64;
    (mean, variance)
}

pub struct TensionDetector;

impl TensionDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TensionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for TensionDetector {
    fn family(&self) -> Family {
        Family::Tension
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let t = &cfg.tension;

        let self_mag = ctx.self_mobility_delta.abs();
        let opp_mag = ctx.opp_mobility_delta.abs();
        let max_mag = self_mag.max(opp_mag);
        let contact = ctx.contact_delta;

        // No measurable dynamic change at all: abstain before any band math.
        if max_mag < f64::EPSILON && contact.abs() < f64::EPSILON {
            return Ok(Vec::new());
        }

        let eval_band = ctx.eval_delta >= t.eval_min && ctx.eval_delta <= t.eval_max;
        let mobility_cross = ctx.self_mobility_delta * ctx.opp_mobility_delta;
        let symmetry_gap = (self_mag - opp_mag).abs();
        let symmetry_ok = symmetry_gap <= t.symmetry_tol;

        let effective_threshold = t.mobility_min * (0.85 + 0.25 * ctx.phase_ratio);
        let near_threshold = t.mobility_near.max(effective_threshold * 0.75);

        let contact_trigger = contact >= t.contact_jump;
        let contact_direct = contact >= t.contact_direct;

        let (sustain_self_mean, sustain_self_var) = window_stats(&ctx.follow_self_mobility, 2);
        let (sustain_opp_mean, sustain_opp_var) = window_stats(&ctx.follow_opp_mobility, 2);
        let sustained_window = sustain_self_mean >= t.sustain_min
            && sustain_opp_mean >= t.sustain_min
            && sustain_self_var <= t.sustain_var_cap
            && sustain_opp_var <= t.sustain_var_cap;

        let mobility_core = self_mag >= effective_threshold
            && opp_mag >= effective_threshold
            && mobility_cross < 0.0
            && symmetry_ok;

        let mobility_struct = self_mag >= near_threshold
            && opp_mag >= near_threshold
            && mobility_cross < 0.0
            && (ctx.structural.shift_signal() || contact_trigger || sustained_window);

        let (evidence_mobility, evidence_contact) = t.evidence_gates();
        let has_evidence =
            max_mag >= evidence_mobility || contact.abs() >= evidence_contact;

        // Hard triggers independent of the symmetric-swing band; the
        // no-measurable-change rejection above already keeps book moves out.
        let gap_trigger = f64::from(ctx.score_gap_cp) >= t.min_score_gap_cp;
        let forcing_trigger = ctx.is_check || ctx.is_forcing || (ctx.is_capture && contact > 0.0);
        let material_trigger = ctx.material_delta.abs() >= t.material_imbalance;
        let hard_trigger = gap_trigger || forcing_trigger || material_trigger;

        let contact_path = eval_band && contact_direct && mobility_cross < 0.0;

        let mut trigger_sources: Vec<&str> = Vec::new();
        if eval_band && mobility_core {
            trigger_sources.push("symmetry_core");
        }
        if eval_band && mobility_struct && !mobility_core {
            trigger_sources.push("structural_support");
        }
        if contact_path {
            trigger_sources.push("contact_direct");
        }
        if hard_trigger {
            trigger_sources.push("hard_trigger");
        }

        // Deep negative swings only count when the follow-up sustains them.
        let sustained =
            ctx.eval_delta > -0.6 || ctx.self_trend >= 0.0 || sustained_window;
        let active = !trigger_sources.is_empty() && sustained;

        let gate = vec![
            GateCheck::flag("eval_band", eval_band),
            GateCheck::at_least("self_mobility", self_mag, effective_threshold),
            GateCheck::at_least("opp_mobility", opp_mag, effective_threshold),
            GateCheck::at_most("symmetry_gap", symmetry_gap, t.symmetry_tol),
            GateCheck::at_least("contact", contact, t.contact_jump),
        ];

        if active {
            let note = format!(
                "tension creation: eval {:+.2}; mobility self {:+.2} opp {:+.2}; triggered via {}",
                ctx.eval_delta,
                ctx.self_mobility_delta,
                ctx.opp_mobility_delta,
                trigger_sources.join(" + "),
            );
            let score = self_mag + opp_mag + contact.max(0.0);
            return Ok(vec![
                Candidate::new(TAG_ACTIVE, Family::Tension, score, note).with_gate(gate),
            ]);
        }

        // Neutral band: small eval move, no active trigger, but real
        // (if modest) dynamic evidence.
        let neutral_band = ctx.eval_delta.abs() <= t.neutral_band;
        if neutral_band
            && !contact_trigger
            && !ctx.structural.shift_signal()
            && has_evidence
        {
            let note = format!(
                "|eval delta| <= {:.2}; mobility={:.2}, contact={:.2}",
                t.neutral_band,
                max_mag,
                contact.abs(),
            );
            return Ok(vec![
                Candidate::new(TAG_NEUTRAL, Family::Tension, max_mag, note).with_gate(gate),
            ]);
        }

        Ok(Vec::new())
    }
}
