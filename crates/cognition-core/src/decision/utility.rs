//! Utility terms of the Q-value.
//!
//! Raw terms are computed per candidate, then clamped to their configured
//! band and weighted. Penalty terms are stored positive in the raw table and
//! enter the weighted table with a negative sign.

use std::collections::BTreeMap;

use contracts::{
    ActionDef, ActionTag, IdentityPhase, IdentityState, QuickState, TraitParams, UtilityTerm,
    WorldContext,
};

use crate::actions::{ActionCatalog, GoalCatalog};
use crate::archetype::identity::is_acting_out;
use crate::behavior::IdentityProfiles;
use crate::config::DecisionTuning;
use crate::decision::candidates::Candidate;
use crate::decision::history::ActionHistory;
use crate::distortion::{CopingProfile, DistortionProfile};
use crate::numeric::{clip01, finite_or_zero};
use crate::tom::TomStore;

pub const PENALTY_TERMS: [UtilityTerm; 4] = [
    UtilityTerm::Cost,
    UtilityTerm::Repetition,
    UtilityTerm::Stagnation,
    UtilityTerm::Saturation,
];

/// Everything the scorer reads about the deciding agent and its scene.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub agent_id: &'a str,
    pub world: &'a WorldContext,
    pub actions: &'a ActionCatalog,
    pub goals: &'a GoalCatalog,
    /// Resolved `(goal_id, priority)` list.
    pub agent_goals: &'a [(String, f64)],
    pub profiles: &'a IdentityProfiles,
    pub identity: &'a IdentityState,
    pub distortion: &'a DistortionProfile,
    pub tom: &'a TomStore,
    pub quick: &'a QuickState,
    pub traits: &'a TraitParams,
    pub trauma_max: f64,
    pub history: &'a ActionHistory,
    pub tuning: &'a DecisionTuning,
}

impl ScoringContext<'_> {
    /// Whether the action moves any of the agent's goals by at least the
    /// impact threshold.
    pub fn is_impactful(&self, action: &ActionDef) -> bool {
        self.agent_goals
            .iter()
            .any(|(goal_id, _)| action.goal_impact(goal_id) >= self.tuning.impact_threshold)
    }

    /// Own stress blended with the scene's social-pressure field, if any.
    pub fn unit_stress(&self) -> f64 {
        let stress = clip01(self.quick.stress);
        match self.world.social_pressure.get(self.agent_id) {
            Some(pressure) => {
                let w = clip01(self.tuning.social_pressure_weight);
                (1.0 - w) * stress + w * clip01(*pressure)
            }
            None => stress,
        }
    }

    pub fn alpha(&self) -> f64 {
        clip01(self.tuning.alpha_base + self.tuning.alpha_gain * self.unit_stress())
    }
}

/// Raw value of every utility term for one candidate. All values finite.
pub fn raw_terms(
    ctx: &ScoringContext<'_>,
    candidate: &Candidate<'_>,
) -> BTreeMap<UtilityTerm, f64> {
    let action = candidate.action;
    let target = candidate.target_id.as_deref();
    let impactful = ctx.is_impactful(action);
    BTreeMap::from([
        (UtilityTerm::Goal, goal_term(ctx, action)),
        (UtilityTerm::Scenario, scenario_term(ctx.world, action)),
        (UtilityTerm::Relational, relational_term(ctx, action, target)),
        (UtilityTerm::Procedural, procedural_term(ctx, action, target)),
        (UtilityTerm::Risk, risk_term(ctx, action)),
        (
            UtilityTerm::Psychological,
            psychological_term(&ctx.distortion.coping, ctx.trauma_max, action),
        ),
        (UtilityTerm::RoleFit, role_fit_term(ctx.world, ctx.agent_id, action)),
        (UtilityTerm::Cost, cost_term(ctx.quick, action)),
        (UtilityTerm::Repetition, repetition_term(ctx.history, action, target)),
        (UtilityTerm::Stagnation, stagnation_term(ctx.history, ctx.tuning, impactful)),
        (UtilityTerm::Saturation, saturation_term(ctx.world, ctx.tuning, action)),
    ])
    .into_iter()
    .map(|(term, value)| (term, finite_or_zero(value)))
    .collect()
}

/// Clamp each raw term to its band, apply its weight and sign, and sum.
pub fn weigh(
    raw: &BTreeMap<UtilityTerm, f64>,
    tuning: &DecisionTuning,
) -> (BTreeMap<UtilityTerm, f64>, f64) {
    let weighted = raw
        .iter()
        .map(|(term, value)| {
            let contribution = tuning.band(*term).apply(finite_or_zero(*value));
            let signed = if PENALTY_TERMS.contains(term) {
                -contribution
            } else {
                contribution
            };
            (*term, finite_or_zero(signed))
        })
        .collect::<BTreeMap<_, _>>();
    let total = weighted.values().sum::<f64>();
    (weighted, total)
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

fn goal_term(ctx: &ScoringContext<'_>, action: &ActionDef) -> f64 {
    ctx.agent_goals
        .iter()
        .map(|(goal_id, priority)| {
            let weight = ctx
                .goals
                .category_of(goal_id)
                .map_or(1.0, |category| ctx.profiles.blended.goal_weight(category));
            clip01(*priority) * weight * action.goal_impact(goal_id)
        })
        .sum()
}

fn scenario_term(world: &WorldContext, action: &ActionDef) -> f64 {
    let phase = action.phase_bonus.get(&world.phase).copied().unwrap_or(0.0);
    let soft = action
        .soft_facts
        .iter()
        .map(|fact| {
            if world.has_fact(fact) {
                0.2 * world.fact_confidence(fact)
            } else {
                -0.3
            }
        })
        .sum::<f64>();
    let counter = match action.requires_counter.as_deref() {
        Some(key) if world.counter(key) > 0 => 0.3,
        Some(_) => -0.5,
        None => 0.0,
    };
    phase + soft + counter
}

fn relational_term(ctx: &ScoringContext<'_>, action: &ActionDef, target: Option<&str>) -> f64 {
    let Some(target) = target else {
        return 0.0;
    };
    let view = ctx.tom.view(target, ctx.distortion);
    let cohesion = ctx.world.shared_cohesion(ctx.agent_id, target);
    let warmth = (view.traits.trust + view.traits.bond + cohesion) / 3.0;
    let threat = (view.traits.conflict + view.traits.fear + view.betrayal_risk()) / 3.0;
    let relation = warmth - threat;
    if action.is_harmful() {
        -relation
    } else {
        relation
    }
}

fn procedural_term(ctx: &ScoringContext<'_>, action: &ActionDef, target: Option<&str>) -> f64 {
    let legitimacy = clip01(ctx.world.legitimacy);
    let obedience = clip01(ctx.traits.conformity);
    let mut total = 0.0;
    for order in ctx.world.orders_for(ctx.agent_id) {
        let follows = action.action_id == order.action_id
            && (order.target_id.is_none() || order.target_id.as_deref() == target);
        if follows || action.has_tag(ActionTag::Comply) {
            total += obedience * legitimacy;
        } else if action.has_tag(ActionTag::Refuse) {
            let issuer = ctx.tom.view(&order.issuer_id, ctx.distortion);
            let norm_conflict = ctx
                .actions
                .get(&order.action_id)
                .map_or(0.0, |ordered| {
                    clip01(1.0 - ctx.profiles.blended.action_preference(&ordered.tags))
                });
            total += (issuer.betrayal_risk() + norm_conflict) * (1.0 - legitimacy);
        } else {
            total -= ctx.profiles.blended.norm_penalty * legitimacy;
        }
    }
    total
}

fn risk_term(ctx: &ScoringContext<'_>, action: &ActionDef) -> f64 {
    if action.risky {
        ctx.profiles.blended.risk_attitude
    } else {
        0.0
    }
}

fn psychological_term(coping: &CopingProfile, trauma_max: f64, action: &ActionDef) -> f64 {
    action
        .tags
        .iter()
        .map(|tag| match tag {
            ActionTag::Withdraw | ActionTag::Rest => coping.avoidance.max(0.5 * coping.self_harm),
            ActionTag::Formal | ActionTag::Lead | ActionTag::Hierarchical => coping.hyper_control,
            ActionTag::Harm | ActionTag::Confront | ActionTag::Assert => coping.aggression,
            ActionTag::Support | ActionTag::Care => coping.helper,
            ActionTag::Therapeutic => clip01(trauma_max),
            _ => 0.0,
        })
        .fold(0.0, f64::max)
}

fn role_fit_term(world: &WorldContext, agent_id: &str, action: &ActionDef) -> f64 {
    let role = world.role_of(agent_id);
    let mut fit = 0.0;
    if let Some(role) = role {
        if action.role_affinity.iter().any(|affinity| affinity == role) {
            fit += 0.5;
        }
    }
    if let Some(specialist) = action.specialist_role.as_deref() {
        if role != Some(specialist) {
            fit -= 0.5;
        }
    }
    fit
}

fn cost_term(quick: &QuickState, action: &ActionDef) -> f64 {
    let strain = 1.0 + 0.5 * clip01(quick.fatigue) + 0.5 * (1.0 - clip01(quick.health));
    action.base_cost.max(0.0) * strain
}

fn repetition_term(history: &ActionHistory, action: &ActionDef, target: Option<&str>) -> f64 {
    history.count(&action.action_id, target) as f64 / history.window() as f64
}

fn stagnation_term(history: &ActionHistory, tuning: &DecisionTuning, impactful: bool) -> f64 {
    if !impactful && history.idle_streak() >= tuning.stagnation_threshold {
        1.0
    } else {
        0.0
    }
}

fn saturation_term(world: &WorldContext, tuning: &DecisionTuning, action: &ActionDef) -> f64 {
    let Some(fact) = action.asserts_fact.as_deref() else {
        return 0.0;
    };
    let confidence = world.fact_confidence(fact);
    if world.has_fact(fact) && confidence >= tuning.saturation_confidence {
        confidence
    } else {
        0.0
    }
}

/// Raw archetype drive: actual and shadow tag preferences blended by shadow
/// activation, centered on zero, plus an acting-out bonus for phase-consistent
/// actions under tension. Deliberately unclamped.
pub fn archetype_drive(ctx: &ScoringContext<'_>, action: &ActionDef, tension: f64) -> f64 {
    let actual = ctx.profiles.actual.action_preference(&action.tags);
    let preference = match &ctx.profiles.shadow {
        Some(shadow) => {
            let w = clip01(ctx.identity.shadow_activation);
            (1.0 - w) * actual + w * shadow.action_preference(&action.tags)
        }
        None => actual,
    };

    let phase = ctx.identity.phase;
    let acting_out = if is_acting_out(phase) && tension >= ctx.tuning.acting_out_tension {
        let fits = action.tags.iter().any(|tag| match phase {
            IdentityPhase::Radical => {
                matches!(tag, ActionTag::Radical | ActionTag::Confront | ActionTag::Refuse)
            }
            IdentityPhase::Break => {
                matches!(tag, ActionTag::Withdraw | ActionTag::Harm | ActionTag::Refuse)
            }
            _ => false,
        });
        if fits {
            0.5 * tension
        } else {
            0.0
        }
    } else {
        0.0
    };

    finite_or_zero(preference - 1.0 + acting_out)
}
