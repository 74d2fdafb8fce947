//! Control-over-dynamics family: nine subtype gates.
//!
//! Each gate is a pure conjunction over the control metrics; the detector
//! proposes every passing subtype and the engine's subtype selector picks at
//! most one. Gating, cooldown and priority are decision-layer concerns and
//! never appear here.

use tracing::trace;

use tagger_core::candidate::{Candidate, GateCheck};
use tagger_core::config::{ControlConfig, TagConfig};
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::{FeatureContext, Phase, PlayedKind};
use tagger_core::Family;

use crate::detector::FamilyDetector;

/// Subtype tags carry a family prefix so downstream consumers can group them.
pub fn subtype_tag(subtype: &str) -> String {
    format!("cod_{subtype}")
}

fn vol_threshold(cfg: &ControlConfig, phase: Phase) -> f64 {
    cfg.volatility_drop_cp + cfg.phase_bonus.get(phase).vol_bonus
}

fn mob_threshold(cfg: &ControlConfig, phase: Phase) -> f64 {
    cfg.opp_mobility_drop + cfg.phase_bonus.get(phase).mob_drop_bonus
}

fn candidate(subtype: &str, score: f64, gate: Vec<GateCheck>, note: String) -> Candidate {
    Candidate::new(&subtype_tag(subtype), Family::Control, score, note).with_gate(gate)
}

fn simplify(ctx: &FeatureContext, cfg: &ControlConfig, phase: Phase) -> Option<Candidate> {
    let m = &ctx.control;
    let vol_thr = vol_threshold(cfg, phase);

    let mut transaction_ok = m.exchange_pairs >= 1;
    if cfg.strict_mode && m.exchange_pairs < cfg.simplify_min_exchange.max(2) {
        transaction_ok = false;
    }
    // Exchanges must stay materially even to read as simplification.
    let material_ok = ctx.material_delta.abs() <= 0.3;

    let gate = vec![
        GateCheck::flag("transaction", transaction_ok),
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, vol_thr),
        GateCheck::at_most("tension_delta", m.tension_delta, cfg.tension_dec_min),
        GateCheck::at_least("opp_mobility_drop", m.opp_mobility_drop, cfg.opp_mobility_drop * 0.8),
        GateCheck::flag("material_even", material_ok),
    ];
    if !gate.iter().all(|g| g.passed) {
        return None;
    }
    let score = m.volatility_drop_cp
        + m.opp_mobility_drop.max(0.0) * 10.0
        + f64::from(m.exchange_pairs) * 40.0
        - m.tension_delta.abs() * 2.0;
    let note = format!(
        "simplified: {} exchange pair(s), vol {:.1}cp, opp mobility {:+.1}",
        m.exchange_pairs, m.volatility_drop_cp, m.opp_mobility_drop
    );
    Some(candidate("simplify", score, gate, note))
}

fn plan_kill(ctx: &FeatureContext, cfg: &TagConfig, phase: Phase) -> Option<Candidate> {
    let m = &ctx.control;
    let c = &cfg.control;
    let vol_thr = vol_threshold(c, phase);
    let mob_thr = mob_threshold(c, phase);

    let plan_drop = ctx.plan_drop_passed();
    let plan_gate = plan_drop
        && m.break_candidates_delta <= -1.0
        && m.opp_mobility_drop >= mob_thr
        && m.volatility_drop_cp >= vol_thr;

    let fallback = ctx.preventive_score >= cfg.prophylaxis.preventive_trigger
        && (ctx.threat_delta >= cfg.prophylaxis.threat_drop
            || m.opp_mobility_drop >= c.opp_mobility_drop
            || m.volatility_drop_cp >= vol_thr);

    if !(plan_gate || fallback) {
        return None;
    }
    let gate = vec![
        GateCheck::flag("plan_drop", plan_drop),
        GateCheck::at_least("preventive_score", ctx.preventive_score, cfg.prophylaxis.preventive_trigger),
        GateCheck::at_least("threat_delta", ctx.threat_delta, cfg.prophylaxis.threat_drop),
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, vol_thr),
    ];
    let score = ctx.preventive_score * 120.0
        + m.opp_mobility_drop.max(0.0) * 20.0
        + if plan_drop { 10.0 } else { 0.0 };
    let source = if plan_drop { "plan drop" } else { "preventive squeeze" };
    let note = format!(
        "{source} killed opponent plan (preventive {:+.2}, threat {:+.2})",
        ctx.preventive_score, ctx.threat_delta
    );
    Some(candidate("plan_kill", score, gate, note))
}

fn freeze_bind(ctx: &FeatureContext, cfg: &ControlConfig, phase: Phase) -> Option<Candidate> {
    let m = &ctx.control;
    let vol_thr = vol_threshold(cfg, phase);

    let t_ok = m.tension_delta <= 0.0 || m.contact_ratio_drop <= -0.05;
    let p_ok = m.opp_pins_increase >= 1 || m.opp_mobility_drop >= cfg.opp_mobility_drop;
    let env_ok = m.volatility_drop_cp >= vol_thr;
    if !(t_ok && p_ok && env_ok) {
        return None;
    }
    let gate = vec![
        GateCheck::flag("tension_or_contact", t_ok),
        GateCheck::flag("pins_or_mobility", p_ok),
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, vol_thr),
    ];
    let score = (-m.tension_delta).max(0.0) * 40.0
        + m.opp_mobility_drop.max(0.0) * 30.0
        + f64::from(m.opp_pins_increase) * 20.0;
    let note = format!(
        "froze bind: tension {:+.1}, contact {:+.2}, opp mobility {:+.1}",
        m.tension_delta, m.contact_ratio_drop, m.opp_mobility_drop
    );
    Some(candidate("freeze_bind", score, gate, note))
}

fn blockade_passed(ctx: &FeatureContext, cfg: &ControlConfig) -> Option<Candidate> {
    let m = &ctx.control;
    let mut push_ok = m.opp_passed_push_drop >= cfg.passed_push_min;
    if cfg.allow_see_blockade {
        push_ok = push_ok || m.blockade_see_non_positive;
    }
    if !(m.opp_passed_exists && m.blockade_established && push_ok) {
        return None;
    }
    let gate = vec![
        GateCheck::flag("opp_passed_exists", m.opp_passed_exists),
        GateCheck::flag("blockade_established", m.blockade_established),
        GateCheck::at_least("push_drop", m.opp_passed_push_drop, cfg.passed_push_min),
    ];
    let score = m.opp_passed_push_drop * 50.0;
    let support = if m.blockade_see_non_positive { " (SEE<=0)" } else { "" };
    let note = format!("blockaded passed pawn{support}");
    Some(candidate("blockade_passed", score, gate, note))
}

fn file_seal(ctx: &FeatureContext, cfg: &ControlConfig) -> Option<Candidate> {
    let m = &ctx.control;
    let line_ok = m.opp_line_pressure_drop >= cfg.line_min || m.break_candidates_delta <= -1.0;
    let env_ok = m.volatility_drop_cp >= cfg.volatility_drop_cp * 0.5;
    if !(line_ok && env_ok) {
        return None;
    }
    let gate = vec![
        GateCheck::at_least("line_pressure_drop", m.opp_line_pressure_drop, cfg.line_min),
        GateCheck::at_most("break_candidates", m.break_candidates_delta, -1.0),
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, cfg.volatility_drop_cp * 0.5),
    ];
    let score = m.opp_line_pressure_drop * 40.0 + (-m.break_candidates_delta).max(0.0) * 25.0;
    let note = format!(
        "sealed file: pressure drop {:.1}, break lanes {:+.1}",
        m.opp_line_pressure_drop, m.break_candidates_delta
    );
    Some(candidate("file_seal", score, gate, note))
}

fn king_safety_shell(ctx: &FeatureContext, cfg: &ControlConfig) -> Option<Candidate> {
    let ks_gain = ctx.king_safety_delta;
    let opp_tactics = ctx.opp_tactics_delta;
    let passed = ks_gain >= cfg.ks_min
        && (opp_tactics <= -0.1 || ctx.control.opp_mobility_drop >= cfg.opp_mobility_drop);
    if !passed {
        return None;
    }
    let gate = vec![
        GateCheck::at_least("king_safety_gain", ks_gain, cfg.ks_min),
        GateCheck::at_most("opp_tactics", opp_tactics, -0.1),
    ];
    let score = ks_gain * 100.0 + opp_tactics.min(0.0).abs() * 40.0;
    let note = format!("king shelter improved {ks_gain:+.2}, opp tactics {opp_tactics:+.2}");
    Some(candidate("king_safety_shell", score, gate, note))
}

fn space_clamp(ctx: &FeatureContext, cfg: &ControlConfig, phase: Phase) -> Option<Candidate> {
    let m = &ctx.control;
    let vol_thr = vol_threshold(cfg, phase);

    let space_ok = m.space_gain >= cfg.space_min || m.space_control_gain >= 1.0;
    let tension_ok = (-2.0..=0.0).contains(&m.tension_delta);
    let mob_ok = m.opp_mobility_drop >= cfg.opp_mobility_drop;
    let env_ok = m.volatility_drop_cp >= vol_thr;
    if !(space_ok && tension_ok && mob_ok && env_ok) {
        return None;
    }
    let gate = vec![
        GateCheck::at_least("space_gain", m.space_gain, cfg.space_min),
        GateCheck::flag("tension_low", tension_ok),
        GateCheck::at_least("opp_mobility_drop", m.opp_mobility_drop, cfg.opp_mobility_drop),
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, vol_thr),
    ];
    let score =
        m.space_gain * 80.0 + m.space_control_gain.max(0.0) * 10.0 + m.opp_mobility_drop * 10.0;
    let note = format!(
        "space clamp {:+.2} (control {:+.0}), opp mobility {:+.1}",
        m.space_gain, m.space_control_gain, m.opp_mobility_drop
    );
    Some(candidate("space_clamp", score, gate, note))
}

fn regroup_consolidate(ctx: &FeatureContext, cfg: &ControlConfig) -> Option<Candidate> {
    let m = &ctx.control;
    let vol_ok = m.volatility_drop_cp >= cfg.volatility_drop_cp * 0.6;
    let quiet_ok = m.self_mobility_change <= 0.05;
    let gain_ok = ctx.king_safety_delta >= 0.05 || m.structure_gain >= 0.1;
    if !(vol_ok && quiet_ok && gain_ok) {
        return None;
    }
    let gate = vec![
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, cfg.volatility_drop_cp * 0.6),
        GateCheck::at_most("self_mobility_change", m.self_mobility_change, 0.05),
        GateCheck::flag("safety_or_structure", gain_ok),
    ];
    let score = m.volatility_drop_cp + ctx.king_safety_delta * 80.0 + m.structure_gain * 60.0;
    let note = format!(
        "regrouped to consolidate safety ({:+.2}) and structure ({:+.2})",
        ctx.king_safety_delta, m.structure_gain
    );
    Some(candidate("regroup_consolidate", score, gate, note))
}

fn slowdown(ctx: &FeatureContext, cfg: &ControlConfig, phase: Phase) -> Option<Candidate> {
    let m = &ctx.control;
    let vol_thr = vol_threshold(cfg, phase);
    let mob_thr = mob_threshold(cfg, phase);
    let tension_thr = cfg.tension_threshold(phase);

    let passed = ctx.has_dynamic_alternative
        && ctx.played_kind == PlayedKind::Positional
        && ctx.eval_drop_cp() <= cfg.eval_drop_cp
        && m.volatility_drop_cp >= vol_thr
        && m.tension_delta <= tension_thr
        && m.opp_mobility_drop >= mob_thr;
    if !passed {
        return None;
    }
    let gate = vec![
        GateCheck::flag("dynamic_alternative", ctx.has_dynamic_alternative),
        GateCheck::at_most("eval_drop", ctx.eval_drop_cp(), cfg.eval_drop_cp),
        GateCheck::at_least("volatility_drop", m.volatility_drop_cp, vol_thr),
        GateCheck::at_most("tension_delta", m.tension_delta, tension_thr),
        GateCheck::at_least("opp_mobility_drop", m.opp_mobility_drop, mob_thr),
    ];
    let score = m.volatility_drop_cp + m.opp_mobility_drop * 5.0;
    let note = format!(
        "slowdown dampened dynamics (vol {:.1}cp, opp mobility {:+.0})",
        m.volatility_drop_cp, m.opp_mobility_drop
    );
    Some(candidate("slowdown", score, gate, note))
}

pub struct ControlDetector;

impl ControlDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ControlDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyDetector for ControlDetector {
    fn family(&self) -> Family {
        Family::Control
    }

    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        _cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError> {
        ctx.check_finite()?;
        let phase = ctx.phase();
        let c = &cfg.control;

        let candidates = [
            simplify(ctx, c, phase),
            plan_kill(ctx, cfg, phase),
            freeze_bind(ctx, c, phase),
            blockade_passed(ctx, c),
            file_seal(ctx, c),
            king_safety_shell(ctx, c),
            space_clamp(ctx, c, phase),
            regroup_consolidate(ctx, c),
            slowdown(ctx, c, phase),
        ];
        let passing: Vec<Candidate> = candidates.into_iter().flatten().collect();
        if !passing.is_empty() {
            trace!(
                ply = ctx.ply,
                subtypes = ?passing.iter().map(|c| c.tag.as_str()).collect::<Vec<_>>(),
                "Control gates passed"
            );
        }
        Ok(passing)
    }
}
