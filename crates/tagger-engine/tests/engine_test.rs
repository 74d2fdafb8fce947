//! End-to-end pipeline tests: detectors → gating → selection → normalizer.

use std::collections::BTreeMap;

use tagger_core::candidate::SuppressReason;
use tagger_core::config::TagConfig;
use tagger_core::features::{FeatureContext, PlayedKind};
use tagger_core::result::TagResult;
use tagger_core::Family;
use tagger_engine::GameTagger;

fn tag_one(ctx: &FeatureContext, cfg: TagConfig) -> TagResult {
    GameTagger::new(cfg).tag_move(ctx)
}

/// A mix of quiet, sharp and lopsided snapshots for property checks.
fn sample_contexts() -> Vec<FeatureContext> {
    let mut contexts = Vec::new();

    let mut tension = FeatureContext::default();
    tension.ply = 14;
    tension.eval_delta = 0.05;
    tension.self_mobility_delta = 0.40;
    tension.opp_mobility_delta = -0.38;
    tension.phase_ratio = 0.6;
    tension.tactical_weight = 0.5;
    contexts.push(tension);

    let mut control = FeatureContext::default();
    control.ply = 22;
    control.phase_ratio = 0.5;
    control.tactical_weight = 0.2;
    control.control.exchange_pairs = 1;
    control.control.volatility_drop_cp = 45.0;
    control.control.tension_delta = -1.0;
    control.control.opp_mobility_drop = 6.0;
    control.control.opp_pins_increase = 1;
    control.control.space_gain = 0.5;
    contexts.push(control);

    let mut sacrifice = FeatureContext::default();
    sacrifice.ply = 30;
    sacrifice.tactical_weight = 0.8;
    sacrifice.material_delta = -3.0;
    sacrifice.eval_delta = -0.2;
    sacrifice.opp_king_safety_delta = -0.4;
    sacrifice.is_capture = true;
    contexts.push(sacrifice);

    let mut blunder = FeatureContext::default();
    blunder.ply = 41;
    blunder.eval_delta = -3.0;
    blunder.self_mobility_delta = -1.0;
    blunder.tactical_weight = 0.9;
    contexts.push(blunder);

    let mut maneuver = FeatureContext::default();
    maneuver.ply = 25;
    maneuver.tactical_weight = 0.3;
    maneuver.self_mobility_delta = 0.5;
    maneuver.structural.file_pressure = 0.3;
    contexts.push(maneuver);

    contexts
}

fn family_of(tag: &str) -> Option<Family> {
    let table: &[(&str, Family)] = &[
        ("tension_creation", Family::Tension),
        ("neutral_tension_creation", Family::Tension),
        ("prophylaxis", Family::Prophylaxis),
        ("failed_prophylactic", Family::Prophylaxis),
        ("structural_integrity", Family::Structure),
        ("structural_compromise", Family::Structure),
        ("structural_compromise_dynamic", Family::Structure),
        ("constructive_maneuver", Family::Maneuver),
        ("neutral_maneuver", Family::Maneuver),
        ("misplaced_maneuver", Family::Maneuver),
        ("initiative_exploitation", Family::Initiative),
        ("initiative_attempt", Family::Initiative),
        ("deferred_initiative", Family::Initiative),
        ("tactical_sacrifice", Family::Sacrifice),
        ("positional_sacrifice", Family::Sacrifice),
        ("inaccurate_tactical_sacrifice", Family::Sacrifice),
        ("speculative_sacrifice", Family::Sacrifice),
        ("desperate_sacrifice", Family::Sacrifice),
        ("first_choice", Family::Tactical),
        ("clean_conversion", Family::Tactical),
        ("recovery_move", Family::Tactical),
        ("panic_move", Family::Tactical),
    ];
    if tag.starts_with("cod_") {
        return Some(Family::Control);
    }
    table.iter().find(|(t, _)| *t == tag).map(|(_, f)| *f)
}

#[test]
fn test_at_most_one_tag_per_family() {
    for ctx in sample_contexts() {
        let result = tag_one(&ctx, TagConfig::default());
        let mut counts: BTreeMap<Family, usize> = BTreeMap::new();
        for tag in &result.tags {
            if let Some(family) = family_of(tag) {
                *counts.entry(family).or_default() += 1;
            }
        }
        for (family, count) in counts {
            assert!(count <= 1, "family {family:?} emitted {count} tags: {:?}", result.tags);
        }
    }
}

#[test]
fn test_parent_completeness() {
    for ctx in sample_contexts() {
        let result = tag_one(&ctx, TagConfig::default());
        if result.tags.iter().any(|t| t.starts_with("cod_")) {
            assert!(result.has_tag("control_over_dynamics"), "tags: {:?}", result.tags);
        }
    }
}

#[test]
fn test_determinism() {
    let contexts = sample_contexts();
    let mut first = GameTagger::new(TagConfig::default());
    let mut second = GameTagger::new(TagConfig::default());
    let a = serde_json::to_value(first.tag_game(&contexts)).unwrap();
    let b = serde_json::to_value(second.tag_game(&contexts)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_tension_active_scenario() {
    let mut ctx = FeatureContext::default();
    ctx.ply = 14;
    ctx.eval_delta = 0.05;
    ctx.self_mobility_delta = 0.40;
    ctx.opp_mobility_delta = -0.38;
    ctx.phase_ratio = 0.6;
    ctx.tactical_weight = 0.5;

    let result = tag_one(&ctx, TagConfig::default());
    assert!(result.has_tag("tension_creation"), "tags: {:?}", result.tags);
}

#[test]
fn test_tension_v2_evidence_gate_scenario() {
    let mut cfg = TagConfig::default();
    cfg.tension.use_v2_boundary = true;

    let mut ctx = FeatureContext::default();
    ctx.ply = 5;
    ctx.eval_delta = 0.25;
    ctx.self_mobility_delta = 0.08;
    ctx.contact_delta = 0.0;
    ctx.phase_ratio = 0.1;
    ctx.tactical_weight = 0.5;

    let result = tag_one(&ctx, cfg);
    assert!(!result.has_tag("tension_creation"));
    assert!(!result.has_tag("neutral_tension_creation"));
}

#[test]
fn test_cod_rare_tie_break_scenario() {
    let mut cfg = TagConfig::default();
    // Rank plan_kill ahead of freeze_bind in the endgame and give the rare
    // subtype phase support so the tie-break is what decides.
    cfg.control.priority_order_endgame = [
        "simplify",
        "plan_kill",
        "freeze_bind",
        "blockade_passed",
        "file_seal",
        "king_safety_shell",
        "space_clamp",
        "regroup_consolidate",
        "slowdown",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    cfg.control.phase_weights.endgame = [("freeze_bind".to_string(), 2.0)].into();

    let mut ctx = FeatureContext::default();
    ctx.ply = 50;
    ctx.phase_ratio = 0.9;
    ctx.tactical_weight = 0.2;
    // freeze_bind: low tension, a new pin, volatility above the endgame bar.
    ctx.control.tension_delta = -1.0;
    ctx.control.opp_pins_increase = 1;
    ctx.control.volatility_drop_cp = 45.0;
    // plan_kill fallback: preventive squeeze with a real threat drop.
    ctx.preventive_score = 0.2;
    ctx.threat_delta = 0.4;

    let result = tag_one(&ctx, cfg);
    assert!(result.has_tag("control_over_dynamics"), "tags: {:?}", result.tags);
    assert!(result.has_tag("cod_freeze_bind"), "tags: {:?}", result.tags);
    assert!(!result.has_tag("cod_plan_kill"));
    let displaced = result
        .diagnostics
        .suppressed
        .iter()
        .find(|s| s.tag == "cod_plan_kill")
        .expect("plan_kill should be recorded as suppressed");
    assert_eq!(displaced.reason, SuppressReason::TieBreakLoss);
}

#[test]
fn test_cooldown_scenario() {
    let mut tagger = GameTagger::new(TagConfig::default());
    let mut ctx = FeatureContext::default();
    ctx.ply = 10;
    ctx.phase_ratio = 0.5;
    ctx.tactical_weight = 0.2;
    ctx.control.exchange_pairs = 1;
    ctx.control.volatility_drop_cp = 40.0;
    ctx.control.tension_delta = -1.0;
    ctx.control.opp_mobility_drop = 2.5;

    let first = tagger.tag_move(&ctx);
    assert!(first.has_tag("cod_simplify"), "tags: {:?}", first.tags);

    ctx.ply = 12;
    let second = tagger.tag_move(&ctx);
    assert!(!second.has_tag("cod_simplify"));
    assert!(second.diagnostics.cooldown_hit);
    assert!(second
        .diagnostics
        .suppressed
        .iter()
        .any(|s| s.tag == "cod_simplify" && s.reason == SuppressReason::Cooldown));

    // Outside the window the subtype may fire again.
    ctx.ply = 14;
    let third = tagger.tag_move(&ctx);
    assert!(third.has_tag("cod_simplify"), "tags: {:?}", third.tags);
}

#[test]
fn test_forced_move_scenario() {
    let mut ctx = FeatureContext::default();
    ctx.ply = 18;
    ctx.score_gap_cp = 200;
    ctx.played_is_best = true;
    // Give other detectors plenty to propose; the sentinel must win alone.
    ctx.eval_delta = 0.05;
    ctx.self_mobility_delta = 0.40;
    ctx.opp_mobility_delta = -0.38;
    ctx.phase_ratio = 0.6;
    ctx.tactical_weight = 0.5;

    let result = tag_one(&ctx, TagConfig::default());
    assert_eq!(result.tags, vec!["forced_move".to_string()]);
    assert_eq!(result.diagnostics.override_reason.as_deref(), Some("forced_move"));
}

#[test]
fn test_context_label_scenario() {
    let mut ctx = FeatureContext::default();
    ctx.ply = 33;
    ctx.eval_before = 4.5;
    ctx.eval_delta = 0.05;
    ctx.self_mobility_delta = 0.40;
    ctx.opp_mobility_delta = -0.38;
    ctx.phase_ratio = 0.6;
    ctx.tactical_weight = 0.5;

    let result = tag_one(&ctx, TagConfig::default());
    assert_eq!(result.tags, vec!["winning_position_handling".to_string()]);
}

#[test]
fn test_dynamic_over_control_never_joins_control_tags() {
    let mut ctx = FeatureContext::default();
    ctx.ply = 20;
    ctx.phase_ratio = 0.5;
    ctx.tactical_weight = 0.5;
    ctx.has_dynamic_alternative = true;
    ctx.played_kind = PlayedKind::Dynamic;
    ctx.eval_delta = 0.05;
    ctx.self_mobility_delta = 0.40;
    ctx.opp_mobility_delta = -0.38;

    let result = tag_one(&ctx, TagConfig::default());
    let has_derived = result.has_tag("dynamic_over_control");
    let has_control = result.tags.iter().any(|t| t.starts_with("cod_"))
        || result.has_tag("control_over_dynamics");
    assert!(has_derived);
    assert!(!(has_derived && has_control));
}

#[test]
fn test_gating_suppression_never_updates_cooldown() {
    let mut tagger = GameTagger::new(TagConfig::default());

    // Sharp position: control candidates pass their gates but are gated out.
    let mut sharp = FeatureContext::default();
    sharp.ply = 10;
    sharp.phase_ratio = 0.5;
    sharp.tactical_weight = 0.9;
    sharp.control.exchange_pairs = 1;
    sharp.control.volatility_drop_cp = 40.0;
    sharp.control.tension_delta = -1.0;
    sharp.control.opp_mobility_drop = 2.5;

    let gated = tagger.tag_move(&sharp);
    assert!(!gated.tags.iter().any(|t| t.starts_with("cod_")));
    assert!(gated
        .diagnostics
        .suppressed
        .iter()
        .any(|s| s.tag == "cod_simplify" && s.reason == SuppressReason::GatedOut));

    // Next ply the position is calm again; had the gated candidate touched
    // cooldown state, this selection would be blocked.
    let mut calm = sharp.clone();
    calm.ply = 11;
    calm.tactical_weight = 0.2;
    let selected = tagger.tag_move(&calm);
    assert!(selected.has_tag("cod_simplify"), "tags: {:?}", selected.tags);
    assert!(!selected.diagnostics.cooldown_hit);
}

#[test]
fn test_config_from_json_drives_the_engine() {
    let cfg = TagConfig::from_json(serde_json::json!({
        "forced_move": {"threshold_cp": 500.0}
    }))
    .unwrap();

    let mut ctx = FeatureContext::default();
    ctx.ply = 9;
    ctx.score_gap_cp = 200;
    ctx.played_is_best = true;

    // Below the raised threshold the sentinel no longer fires.
    let result = tag_one(&ctx, cfg);
    assert!(!result.has_tag("forced_move"));
}
