//! Threshold configuration: loaded once per run, validated, then immutable.
//!
//! Every detector reads its thresholds through this structure, never a
//! literal constant, so tuning is a configuration change. Unknown keys are
//! ignored with a warning; missing keys fall back to the documented
//! defaults; malformed types or out-of-range values fail the load.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ConfigError;
use crate::features::Phase;

/// The nine control-over-dynamics subtype names, canonical order.
pub const COD_SUBTYPES: [&str; 9] = [
    "simplify",
    "plan_kill",
    "freeze_bind",
    "blockade_passed",
    "file_seal",
    "king_safety_shell",
    "space_clamp",
    "regroup_consolidate",
    "slowdown",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TensionConfig {
    pub eval_min: f64,
    pub eval_max: f64,
    pub mobility_min: f64,
    pub mobility_near: f64,
    pub symmetry_tol: f64,
    pub contact_jump: f64,
    pub contact_direct: f64,
    pub neutral_band: f64,
    pub sustain_min: f64,
    pub sustain_var_cap: f64,
    #[serde(alias = "min_score_gap")]
    pub min_score_gap_cp: f64,
    pub material_imbalance: f64,
    /// v1 evidence gates (legacy rule-set).
    pub min_mobility_evidence: f64,
    pub min_contact_evidence: f64,
    /// v2 evidence gates (stricter boundary rule-set).
    pub min_mobility_evidence_v2: f64,
    pub min_contact_evidence_v2: f64,
    /// Run-level rule-set switch for A/B evaluation.
    pub use_v2_boundary: bool,
}

impl Default for TensionConfig {
    fn default() -> Self {
        Self {
            eval_min: -0.9,
            eval_max: 0.1,
            mobility_min: 0.38,
            mobility_near: 0.3,
            symmetry_tol: 0.23,
            contact_jump: 0.04,
            contact_direct: 0.05,
            neutral_band: 0.12,
            sustain_min: 0.15,
            sustain_var_cap: 0.2,
            min_score_gap_cp: 120.0,
            material_imbalance: 1.0,
            min_mobility_evidence: 0.05,
            min_contact_evidence: 0.005,
            min_mobility_evidence_v2: 0.10,
            min_contact_evidence_v2: 0.01,
            use_v2_boundary: false,
        }
    }
}

impl TensionConfig {
    /// Evidence gates for the active rule-set.
    pub fn evidence_gates(&self) -> (f64, f64) {
        if self.use_v2_boundary {
            (self.min_mobility_evidence_v2, self.min_contact_evidence_v2)
        } else {
            (self.min_mobility_evidence, self.min_contact_evidence)
        }
    }
}

/// Per-phase additions to the volatility and mobility thresholds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseBonus {
    pub vol_bonus: f64,
    pub mob_drop_bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseBonusTable {
    pub opening: PhaseBonus,
    pub middlegame: PhaseBonus,
    pub endgame: PhaseBonus,
}

impl Default for PhaseBonusTable {
    fn default() -> Self {
        Self {
            opening: PhaseBonus { vol_bonus: 0.0, mob_drop_bonus: 2.0 },
            middlegame: PhaseBonus { vol_bonus: 0.0, mob_drop_bonus: 2.0 },
            endgame: PhaseBonus { vol_bonus: 5.0, mob_drop_bonus: 3.0 },
        }
    }
}

impl PhaseBonusTable {
    pub fn get(&self, phase: Phase) -> PhaseBonus {
        match phase {
            Phase::Opening => self.opening,
            Phase::Middlegame => self.middlegame,
            Phase::Endgame => self.endgame,
        }
    }
}

/// Subtype priority weights per phase; a larger weight pulls the subtype
/// earlier in the ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseWeightTable {
    pub opening: BTreeMap<String, f64>,
    pub middlegame: BTreeMap<String, f64>,
    pub endgame: BTreeMap<String, f64>,
}

impl Default for PhaseWeightTable {
    fn default() -> Self {
        let open_mid: BTreeMap<String, f64> =
            [("space_clamp".to_string(), 2.0), ("freeze_bind".to_string(), 2.0)].into();
        let endgame: BTreeMap<String, f64> =
            [("blockade_passed".to_string(), 3.0), ("king_safety_shell".to_string(), 3.0)].into();
        Self { opening: open_mid.clone(), middlegame: open_mid, endgame }
    }
}

impl PhaseWeightTable {
    pub fn get(&self, phase: Phase) -> &BTreeMap<String, f64> {
        match phase {
            Phase::Opening => &self.opening,
            Phase::Middlegame => &self.middlegame,
            Phase::Endgame => &self.endgame,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub cooldown_plies: u32,
    pub volatility_drop_cp: f64,
    pub opp_mobility_drop: f64,
    pub eval_drop_cp: f64,
    /// Tension delta must stay at or below this for release-style subtypes.
    pub tension_dec_min: f64,
    /// Phase-scaled tension thresholds for slowdown.
    pub tension_delta_base: f64,
    pub tension_delta_endgame: f64,
    pub ks_min: f64,
    pub space_min: f64,
    pub line_min: f64,
    pub passed_push_min: f64,
    pub allow_see_blockade: bool,
    pub simplify_min_exchange: u32,
    pub strict_mode: bool,
    pub priority_order: Vec<String>,
    pub priority_order_endgame: Vec<String>,
    pub rare_subtypes: Vec<String>,
    pub tie_break_delta: f64,
    pub phase_weights: PhaseWeightTable,
    pub phase_bonus: PhaseBonusTable,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cooldown_plies: 3,
            volatility_drop_cp: 36.0,
            opp_mobility_drop: 3.0,
            eval_drop_cp: 25.0,
            tension_dec_min: 0.0,
            tension_delta_base: -1.0,
            tension_delta_endgame: -2.0,
            ks_min: 0.15,
            space_min: 0.1,
            line_min: 2.0,
            passed_push_min: 0.0,
            allow_see_blockade: true,
            simplify_min_exchange: 2,
            strict_mode: false,
            priority_order: COD_SUBTYPES.iter().map(|s| s.to_string()).collect(),
            priority_order_endgame: [
                "simplify",
                "blockade_passed",
                "king_safety_shell",
                "space_clamp",
                "file_seal",
                "freeze_bind",
                "plan_kill",
                "regroup_consolidate",
                "slowdown",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            rare_subtypes: ["freeze_bind", "space_clamp", "blockade_passed"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tie_break_delta: 1.0,
            phase_weights: PhaseWeightTable::default(),
            phase_bonus: PhaseBonusTable::default(),
        }
    }
}

impl ControlConfig {
    pub fn priority_for(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Endgame => &self.priority_order_endgame,
            _ => &self.priority_order,
        }
    }

    /// Phase-dependent tension threshold for slowdown-style subtypes.
    pub fn tension_threshold(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Endgame => self.tension_delta_endgame.min(self.tension_delta_base * 1.2),
            _ => self.tension_delta_base,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub tactical_high: f64,
    pub positional_low: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { tactical_high: 0.65, positional_low: 0.35 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcedMoveConfig {
    pub threshold_cp: f64,
}

impl Default for ForcedMoveConfig {
    fn default() -> Self {
        Self { threshold_cp: 180.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProphylaxisConfig {
    pub preventive_trigger: f64,
    pub threat_drop: f64,
    pub safety_cap: f64,
    pub opp_mobility_drop: f64,
    pub structure_min: f64,
    pub mobility_self_limit: f64,
    /// Failure band: near-equal positions where a large drop voids the idea.
    pub fail_eval_band_cp: f64,
    pub fail_drop_cp: f64,
}

impl Default for ProphylaxisConfig {
    fn default() -> Self {
        Self {
            preventive_trigger: 0.08,
            threat_drop: 0.3,
            safety_cap: 0.6,
            opp_mobility_drop: 0.15,
            structure_min: 0.2,
            mobility_self_limit: 0.25,
            fail_eval_band_cp: 200.0,
            fail_drop_cp: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    pub integrity_gain: f64,
    pub weaken_limit: f64,
    pub eval_tolerance: f64,
    /// Tactical weight above which a structure loss reads as dynamic play.
    pub dynamic_weight_min: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            integrity_gain: 0.2,
            weaken_limit: -0.2,
            eval_tolerance: 0.12,
            dynamic_weight_min: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManeuverConfig {
    pub constructive_threshold: f64,
    pub neutral_threshold: f64,
    pub misplaced_threshold: f64,
    pub eval_tolerance: f64,
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            constructive_threshold: 0.25,
            neutral_threshold: 0.0,
            misplaced_threshold: -0.25,
            eval_tolerance: 0.12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitiativeConfig {
    pub exploit_eval_min: f64,
    pub exploit_eval_tolerance: f64,
    pub attempt_eval_floor: f64,
    pub attempt_weight_min: f64,
    pub deferred_mobility_cap: f64,
    pub deferred_drop_floor_cp: f64,
}

impl Default for InitiativeConfig {
    fn default() -> Self {
        Self {
            exploit_eval_min: 1.0,
            exploit_eval_tolerance: 0.25,
            attempt_eval_floor: -0.3,
            attempt_weight_min: 0.4,
            deferred_mobility_cap: 0.08,
            deferred_drop_floor_cp: -50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SacrificeConfig {
    /// Material loss in pawns needed to treat a move as a sacrifice.
    pub min_loss: f64,
    pub eval_tolerance: f64,
    /// Opponent king-safety delta required for the tactical label.
    pub king_drop_threshold: f64,
    pub speculative_weight_min: f64,
    pub desperate_eval_max: f64,
}

impl Default for SacrificeConfig {
    fn default() -> Self {
        Self {
            min_loss: 0.5,
            eval_tolerance: 0.6,
            king_drop_threshold: -0.1,
            speculative_weight_min: 0.5,
            desperate_eval_max: -3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticalConfig {
    pub gap_first_choice_cp: f64,
    pub miss_loss_cp: f64,
    pub dominance_cp: f64,
    pub conversion_drop_cap_cp: f64,
    pub panic_drop_cp: f64,
    pub panic_mobility: f64,
    pub recovery_from_cp: f64,
    pub recovery_to_cp: f64,
}

impl Default for TacticalConfig {
    fn default() -> Self {
        Self {
            gap_first_choice_cp: 80.0,
            miss_loss_cp: 150.0,
            dominance_cp: 300.0,
            conversion_drop_cap_cp: 25.0,
            panic_drop_cp: 250.0,
            panic_mobility: -0.8,
            recovery_from_cp: -300.0,
            recovery_to_cp: -100.0,
        }
    }
}

/// Winning/losing context scaling and the full-override bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub winning_tau: f64,
    pub losing_tau: f64,
    pub winning_tau_max: f64,
    pub winning_tau_scale: f64,
    pub losing_tau_min: f64,
    pub losing_tau_scale: f64,
    /// Effective eval loss (pawns) that voids every other tag.
    pub blunder_delta_floor: f64,
    /// Material loss (pawns) that voids every other tag.
    pub blunder_material_floor: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            winning_tau: 1.05,
            losing_tau: 0.95,
            winning_tau_max: 2.0,
            winning_tau_scale: 0.2,
            losing_tau_min: 0.6,
            losing_tau_scale: 0.2,
            blunder_delta_floor: -2.0,
            blunder_material_floor: -1.0,
        }
    }
}

impl ContextConfig {
    /// Expectation-scaling factor from the pre-move evaluation. Far-winning
    /// and far-losing positions tolerate larger swings.
    pub fn tau(&self, eval_before: f64) -> f64 {
        if eval_before >= 3.0 {
            self.winning_tau_max.min(1.0 + self.winning_tau_scale * (eval_before - 3.0))
        } else if eval_before <= -2.0 {
            self.losing_tau_min.max(1.0 + self.losing_tau_scale * (eval_before + 2.0))
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    pub tension: TensionConfig,
    pub control: ControlConfig,
    pub gate: GateConfig,
    pub forced_move: ForcedMoveConfig,
    pub prophylaxis: ProphylaxisConfig,
    pub structure: StructureConfig,
    pub maneuver: ManeuverConfig,
    pub initiative: InitiativeConfig,
    pub sacrifice: SacrificeConfig,
    pub tactical: TacticalConfig,
    pub context: ContextConfig,
}

const SECTION_KEYS: &[(&str, &[&str])] = &[
    (
        "tension",
        &[
            "eval_min",
            "eval_max",
            "mobility_min",
            "mobility_near",
            "symmetry_tol",
            "contact_jump",
            "contact_direct",
            "neutral_band",
            "sustain_min",
            "sustain_var_cap",
            "min_score_gap",
            "min_score_gap_cp",
            "material_imbalance",
            "min_mobility_evidence",
            "min_contact_evidence",
            "min_mobility_evidence_v2",
            "min_contact_evidence_v2",
            "use_v2_boundary",
        ],
    ),
    (
        "control",
        &[
            "cooldown_plies",
            "volatility_drop_cp",
            "opp_mobility_drop",
            "eval_drop_cp",
            "tension_dec_min",
            "tension_delta_base",
            "tension_delta_endgame",
            "ks_min",
            "space_min",
            "line_min",
            "passed_push_min",
            "allow_see_blockade",
            "simplify_min_exchange",
            "strict_mode",
            "priority_order",
            "priority_order_endgame",
            "rare_subtypes",
            "tie_break_delta",
            "phase_weights",
            "phase_bonus",
        ],
    ),
    ("gate", &["tactical_high", "positional_low"]),
    ("forced_move", &["threshold_cp"]),
    (
        "prophylaxis",
        &[
            "preventive_trigger",
            "threat_drop",
            "safety_cap",
            "opp_mobility_drop",
            "structure_min",
            "mobility_self_limit",
            "fail_eval_band_cp",
            "fail_drop_cp",
        ],
    ),
    ("structure", &["integrity_gain", "weaken_limit", "eval_tolerance", "dynamic_weight_min"]),
    (
        "maneuver",
        &["constructive_threshold", "neutral_threshold", "misplaced_threshold", "eval_tolerance"],
    ),
    (
        "initiative",
        &[
            "exploit_eval_min",
            "exploit_eval_tolerance",
            "attempt_eval_floor",
            "attempt_weight_min",
            "deferred_mobility_cap",
            "deferred_drop_floor_cp",
        ],
    ),
    (
        "sacrifice",
        &[
            "min_loss",
            "eval_tolerance",
            "king_drop_threshold",
            "speculative_weight_min",
            "desperate_eval_max",
        ],
    ),
    (
        "tactical",
        &[
            "gap_first_choice_cp",
            "miss_loss_cp",
            "dominance_cp",
            "conversion_drop_cap_cp",
            "panic_drop_cp",
            "panic_mobility",
            "recovery_from_cp",
            "recovery_to_cp",
        ],
    ),
    (
        "context",
        &[
            "winning_tau",
            "losing_tau",
            "winning_tau_max",
            "winning_tau_scale",
            "losing_tau_min",
            "losing_tau_scale",
            "blunder_delta_floor",
            "blunder_material_floor",
        ],
    ),
];

impl TagConfig {
    /// Build from a parsed JSON document. Unknown sections/keys warn and are
    /// ignored; type mismatches and out-of-range values fail the load.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        let root = value.as_object().ok_or_else(|| ConfigError::Type {
            key: "<root>".to_string(),
            expected: "object of sections",
        })?;

        for (section, section_value) in root {
            match SECTION_KEYS.iter().find(|(name, _)| name == section) {
                None => warn!(section = %section, "Unknown config section ignored"),
                Some((_, known_keys)) => {
                    if let Some(map) = section_value.as_object() {
                        for key in map.keys() {
                            if !known_keys.contains(&key.as_str()) {
                                warn!(section = %section, key = %key, "Unknown config key ignored");
                            }
                        }
                    } else {
                        return Err(ConfigError::Type {
                            key: section.clone(),
                            expected: "object",
                        });
                    }
                }
            }
        }

        let config: TagConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a JSON file. Fatal before any move is
    /// processed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        Self::from_json(value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid { key: key.to_string(), reason: reason.into() }
        }

        let unit = |key: &str, value: f64| -> Result<(), ConfigError> {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(invalid(key, format!("{value} is outside [0, 1]")));
            }
            Ok(())
        };

        unit("gate.tactical_high", self.gate.tactical_high)?;
        unit("gate.positional_low", self.gate.positional_low)?;
        if self.gate.positional_low >= self.gate.tactical_high {
            return Err(invalid(
                "gate.positional_low",
                "positional_low must be below tactical_high",
            ));
        }

        if self.tension.eval_min >= self.tension.eval_max {
            return Err(invalid("tension.eval_min", "eval_min must be below eval_max"));
        }
        if self.tension.neutral_band < 0.0 {
            return Err(invalid("tension.neutral_band", "must be non-negative"));
        }
        if self.tension.mobility_min <= 0.0 {
            return Err(invalid("tension.mobility_min", "must be positive"));
        }

        if self.control.cooldown_plies > 100 {
            return Err(invalid("control.cooldown_plies", "implausibly large window"));
        }
        if self.control.tie_break_delta < 0.0 {
            return Err(invalid("control.tie_break_delta", "must be non-negative"));
        }
        for (key, order) in [
            ("control.priority_order", &self.control.priority_order),
            ("control.priority_order_endgame", &self.control.priority_order_endgame),
        ] {
            if order.len() != COD_SUBTYPES.len() {
                return Err(invalid(key, "must list exactly the nine subtypes"));
            }
            for subtype in COD_SUBTYPES {
                if !order.iter().any(|s| s == subtype) {
                    return Err(invalid(key, format!("missing subtype `{subtype}`")));
                }
            }
        }
        for rare in &self.control.rare_subtypes {
            if !COD_SUBTYPES.contains(&rare.as_str()) {
                return Err(invalid(
                    "control.rare_subtypes",
                    format!("unknown subtype `{rare}`"),
                ));
            }
        }

        if self.forced_move.threshold_cp <= 0.0 {
            return Err(invalid("forced_move.threshold_cp", "must be positive"));
        }
        if self.sacrifice.min_loss <= 0.0 {
            return Err(invalid("sacrifice.min_loss", "must be positive"));
        }
        if self.context.winning_tau <= self.context.losing_tau {
            return Err(invalid(
                "context.winning_tau",
                "winning_tau must exceed losing_tau",
            ));
        }

        Ok(())
    }
}
