//! Tunable constants of the cognition core.
//!
//! The structure of every formula is fixed in code; the calibrated numbers
//! live here so hosts can override them from JSON. Every section defaults
//! field by field, so a partial document only overrides what it names.

use std::collections::BTreeMap;

use contracts::{Axis, UtilityTerm};
use serde::{Deserialize, Serialize};

use crate::archetype::metrics::{default_axis_weights, AxisWeights};
use crate::archetype::self_image::{default_self_rules, AxisRule};
use crate::error::{CognitionError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CognitionConfig {
    pub archetype: ArchetypeTuning,
    pub phase: PhaseThresholds,
    pub tom: TomTuning,
    pub decision: DecisionTuning,
    pub planner: PlannerTuning,
    pub trauma: TraumaTuning,
    /// Probability that a bystander notices an event not aimed at them.
    pub perception_rate: f64,
}

impl Default for CognitionConfig {
    fn default() -> Self {
        Self {
            archetype: ArchetypeTuning::default(),
            phase: PhaseThresholds::default(),
            tom: TomTuning::default(),
            decision: DecisionTuning::default(),
            planner: PlannerTuning::default(),
            trauma: TraumaTuning::default(),
            perception_rate: 0.7,
        }
    }
}

impl CognitionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: CognitionConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        unit_interval("perception_rate", self.perception_rate)?;

        let archetype = &self.archetype;
        positive("archetype.mixture_beta", archetype.mixture_beta)?;
        unit_interval("archetype.mixture_inertia", archetype.mixture_inertia)?;
        unit_interval("archetype.shadow_min_similarity", archetype.shadow_min_similarity)?;
        unit_interval("archetype.shadow_min_conflict", archetype.shadow_min_conflict)?;
        for axis in Axis::ALL {
            if !archetype.axis_weights.contains_key(&axis) {
                return Err(CognitionError::invalid(
                    "archetype.axis_weights",
                    format!("missing axis {axis}"),
                ));
            }
        }

        let tom = &self.tom;
        unit_interval("tom.goal_learning_rate", tom.goal_learning_rate)?;
        unit_interval("tom.trait_base_rate", tom.trait_base_rate)?;
        unit_interval("tom.uncertainty_decay", tom.uncertainty_decay)?;
        unit_interval("tom.uncertainty_gain", tom.uncertainty_gain)?;

        let decision = &self.decision;
        for (term, band) in &decision.bands {
            if !(band.min <= band.max) || !band.weight.is_finite() {
                return Err(CognitionError::invalid(
                    format!("decision.bands.{term:?}"),
                    "min must not exceed max and weight must be finite",
                ));
            }
        }
        if decision.history_window == 0 {
            return Err(CognitionError::invalid(
                "decision.history_window",
                "must be at least 1",
            ));
        }
        unit_interval("decision.alpha_base", decision.alpha_base)?;
        unit_interval("decision.shadow_nudge", decision.shadow_nudge)?;

        let planner = &self.planner;
        if planner.top_k == 0 {
            return Err(CognitionError::invalid("planner.top_k", "must be at least 1"));
        }
        if planner.replan_cost < 0.0 || planner.budget_max < 0.0 || planner.budget_regen < 0.0 {
            return Err(CognitionError::invalid(
                "planner",
                "budget values must be non-negative",
            ));
        }

        unit_interval("trauma.decay_rate", self.trauma.decay_rate)?;
        unit_interval("trauma.processing_rate", self.trauma.processing_rate)?;
        Ok(())
    }
}

fn unit_interval(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CognitionError::invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CognitionError::invalid(field, format!("{value} must be positive")))
    }
}

// ---------------------------------------------------------------------------
// Archetype system
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchetypeTuning {
    /// Trait → axis linear weights.
    pub axis_weights: BTreeMap<Axis, AxisWeights>,
    /// Crush / flip / boost rules per axis, applied in order.
    pub self_rules: BTreeMap<Axis, Vec<AxisRule>>,
    /// Crush multipliers below this are reported in the explanations.
    pub crush_report_below: f64,
    /// Inverse temperature of the mixture softmax.
    pub mixture_beta: f64,
    pub reinforcement_bonus: f64,
    pub reinforcement_cap: u32,
    /// Weight of the freshly computed mixture when smoothing.
    pub mixture_inertia: f64,
    pub shadow_min_similarity: f64,
    pub shadow_min_conflict: f64,
    pub radical_kind_bias: f64,
    pub other_layer_bias: f64,
    /// Logistic steepness and midpoint of shadow activation.
    pub shadow_gain: f64,
    pub shadow_midpoint: f64,
}

impl Default for ArchetypeTuning {
    fn default() -> Self {
        Self {
            axis_weights: default_axis_weights(),
            self_rules: default_self_rules(),
            crush_report_below: 0.95,
            mixture_beta: 12.0,
            reinforcement_bonus: 0.01,
            reinforcement_cap: 15,
            mixture_inertia: 0.35,
            shadow_min_similarity: 0.55,
            shadow_min_conflict: 0.15,
            radical_kind_bias: 1.3,
            other_layer_bias: 1.15,
            shadow_gain: 6.0,
            shadow_midpoint: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhaseThresholds {
    pub strain_stress: f64,
    pub strain_viability: f64,
    pub strain_epistemic: f64,
    pub strain_trauma: f64,
    pub recover_stress: f64,
    pub recover_viability: f64,
    pub recover_epistemic: f64,
    pub recover_trauma: f64,
    pub break_stress: f64,
    pub break_viability: f64,
    pub break_trauma: f64,
    pub radical_shadow: f64,
    pub post_trauma: f64,
    pub post_stress: f64,
    pub settle_shadow: f64,
    pub normal_integration: f64,
    pub normal_stress: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            strain_stress: 0.6,
            strain_viability: 0.4,
            strain_epistemic: 0.5,
            strain_trauma: 0.6,
            recover_stress: 0.45,
            recover_viability: 0.5,
            recover_epistemic: 0.35,
            recover_trauma: 0.5,
            break_stress: 0.85,
            break_viability: 0.2,
            break_trauma: 0.85,
            radical_shadow: 0.6,
            post_trauma: 0.5,
            post_stress: 0.5,
            settle_shadow: 0.35,
            normal_integration: 0.6,
            normal_stress: 0.4,
        }
    }
}

// ---------------------------------------------------------------------------
// Theory of mind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomTuning {
    pub goal_learning_rate: f64,
    pub trait_base_rate: f64,
    /// `u' = decay·u + gain·min(1, scale·|Δbelief|)`.
    pub uncertainty_decay: f64,
    pub uncertainty_gain: f64,
    pub uncertainty_scale: f64,
}

impl Default for TomTuning {
    fn default() -> Self {
        Self {
            goal_learning_rate: 0.3,
            trait_base_rate: 0.25,
            uncertainty_decay: 0.8,
            uncertainty_gain: 0.2,
            uncertainty_scale: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision engine
// ---------------------------------------------------------------------------

/// Clamp band and weight of one utility term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TermBand {
    pub min: f64,
    pub max: f64,
    pub weight: f64,
}

impl TermBand {
    pub const fn new(min: f64, max: f64, weight: f64) -> Self {
        Self { min, max, weight }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        raw.clamp(self.min, self.max) * self.weight
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecisionTuning {
    pub bands: BTreeMap<UtilityTerm, TermBand>,
    pub alpha_base: f64,
    pub alpha_gain: f64,
    /// Share of the social-pressure field in the unit-stress signal.
    pub social_pressure_weight: f64,
    pub drive_multiplier: f64,
    pub history_window: usize,
    /// Non-impactful choices in a row before stagnation kicks in.
    pub stagnation_threshold: usize,
    /// Goal impact magnitude that counts as "meaningful".
    pub impact_threshold: f64,
    /// Tag preference multiplier that counts as a strong preference.
    pub strong_preference: f64,
    pub shadow_nudge_threshold: f64,
    pub shadow_nudge: f64,
    pub acting_out_tension: f64,
    pub saturation_confidence: f64,
    pub min_temperature: f64,
}

impl DecisionTuning {
    pub fn band(&self, term: UtilityTerm) -> TermBand {
        self.bands
            .get(&term)
            .copied()
            .unwrap_or(TermBand::new(-1.0, 1.0, 1.0))
    }
}

impl Default for DecisionTuning {
    fn default() -> Self {
        let bands = BTreeMap::from([
            (UtilityTerm::Goal, TermBand::new(-2.0, 2.0, 1.0)),
            (UtilityTerm::Scenario, TermBand::new(-1.0, 1.0, 0.6)),
            (UtilityTerm::Relational, TermBand::new(-1.0, 1.0, 0.7)),
            (UtilityTerm::Procedural, TermBand::new(-1.0, 1.0, 0.8)),
            (UtilityTerm::Risk, TermBand::new(-1.0, 1.0, 0.4)),
            (UtilityTerm::Psychological, TermBand::new(0.0, 1.0, 0.5)),
            (UtilityTerm::RoleFit, TermBand::new(-1.0, 1.0, 0.5)),
            (UtilityTerm::Cost, TermBand::new(0.0, 2.0, 0.6)),
            (UtilityTerm::Repetition, TermBand::new(0.0, 1.0, 0.8)),
            (UtilityTerm::Stagnation, TermBand::new(0.0, 1.0, 0.6)),
            (UtilityTerm::Saturation, TermBand::new(0.0, 1.0, 0.7)),
        ]);
        Self {
            bands,
            alpha_base: 0.1,
            alpha_gain: 0.8,
            social_pressure_weight: 0.3,
            drive_multiplier: 2.0,
            history_window: 12,
            stagnation_threshold: 3,
            impact_threshold: 0.2,
            strong_preference: 1.3,
            shadow_nudge_threshold: 0.5,
            shadow_nudge: 0.05,
            acting_out_tension: 0.5,
            saturation_confidence: 0.8,
            min_temperature: 1e-6,
        }
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerTuning {
    pub top_k: usize,
    pub horizon: usize,
    pub replan_cost: f64,
    pub budget_max: f64,
    pub budget_regen: f64,
    /// Agents more stressed than this skip deliberate replanning.
    pub replan_stress_ceiling: f64,
    pub stale_after_ticks: u64,
    pub shared_trust_threshold: f64,
}

impl Default for PlannerTuning {
    fn default() -> Self {
        Self {
            top_k: 5,
            horizon: 2,
            replan_cost: 1.0,
            budget_max: 3.0,
            budget_regen: 0.5,
            replan_stress_ceiling: 0.8,
            stale_after_ticks: 12,
            shared_trust_threshold: 0.55,
        }
    }
}

// ---------------------------------------------------------------------------
// Trauma
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TraumaTuning {
    /// Multiplicative decay per tick.
    pub decay_rate: f64,
    /// Fraction removed by one full-intensity therapeutic action.
    pub processing_rate: f64,
    /// Blend rate of the biography moving summaries.
    pub biography_rate: f64,
}

impl Default for TraumaTuning {
    fn default() -> Self {
        Self {
            decay_rate: 0.01,
            processing_rate: 0.25,
            biography_rate: 0.3,
        }
    }
}
