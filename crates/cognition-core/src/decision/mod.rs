//! Q-value decision engine: candidate generation, utility scoring, the
//! System 1 / System 2 blend and stochastic selection, plus the side effects
//! a choice has on the chooser.

pub mod candidates;
pub mod history;
pub mod selection;
pub mod utility;

use std::collections::BTreeMap;

use contracts::{
    ActionDef, ActionIntention, DecisionSource, IdentityState, PlanStep, ScoreBreakdown,
};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::debug;

use crate::archetype::ArchetypeCatalog;
use crate::behavior::BehaviorProfile;
use crate::config::CognitionConfig;
use crate::numeric::{clip01, normalize_map};

pub use candidates::{generate, Candidate};
pub use history::{ActionHistory, HistoryEntry};
pub use selection::{score_candidates, select};
pub use utility::{archetype_drive, raw_terms, weigh, ScoringContext, PENALTY_TERMS};

/// What an agent does this tick, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub intention: ActionIntention,
    pub breakdown: ScoreBreakdown,
}

impl Decision {
    pub fn source(&self) -> DecisionSource {
        self.breakdown.source
    }
}

/// Score every candidate and sample one. Never fails: an empty candidate set
/// is replaced by the fallback action.
pub fn decide_reactive(
    ctx: &ScoringContext<'_>,
    temperature: f64,
    rng: &mut ChaCha8Rng,
) -> Decision {
    let (candidates, injected) = generate(ctx.agent_id, ctx.world, ctx.actions);
    let alpha = ctx.alpha();
    let tension = ctx.unit_stress().max(ctx.identity.shadow_activation);
    let mut scores = score_candidates(ctx, &candidates, alpha, tension);
    let chosen = select(
        &mut scores,
        temperature,
        ctx.tuning.min_temperature,
        rng,
    )
    .unwrap_or(0);

    let mut notes = Vec::new();
    if injected {
        notes.push("fallback injected: no available candidate".to_string());
    }
    if ctx.world.social_pressure.contains_key(ctx.agent_id) {
        notes.push("social pressure blended into unit stress".to_string());
    }

    let candidate = &candidates[chosen.min(candidates.len() - 1)];
    debug!(
        agent_id = ctx.agent_id,
        action_id = %candidate.action.action_id,
        target_id = candidate.target_id.as_deref().unwrap_or("-"),
        candidates = candidates.len(),
        alpha,
        "reactive decision"
    );

    Decision {
        intention: ActionIntention {
            agent_id: ctx.agent_id.to_string(),
            action_id: candidate.action.action_id.clone(),
            target_id: candidate.target_id.clone(),
            args: BTreeMap::new(),
            tick: ctx.world.tick,
        },
        breakdown: ScoreBreakdown {
            source: DecisionSource::Reactive,
            alpha,
            temperature,
            candidates: scores,
            chosen_index: Some(chosen),
            plan_id: None,
            notes,
        },
    }
}

/// Decision for a plan step chosen by the planner rather than the scorer.
pub fn decide_from_step(
    agent_id: &str,
    tick: u64,
    step: &PlanStep,
    plan_id: &str,
    source: DecisionSource,
) -> Decision {
    let mut args = BTreeMap::from([("plan_id".to_string(), Value::from(plan_id))]);
    if let Some(tag) = &step.tag {
        args.insert("step_tag".to_string(), Value::from(tag.as_str()));
    }
    Decision {
        intention: ActionIntention {
            agent_id: agent_id.to_string(),
            action_id: step.action_id.clone(),
            target_id: step.target_id.clone(),
            args,
            tick,
        },
        breakdown: ScoreBreakdown::for_plan(source, plan_id),
    }
}

/// Mutable agent state a choice feeds back into.
#[derive(Debug)]
pub struct ChoiceEffects<'a> {
    pub history: &'a mut ActionHistory,
    pub reinforcement: &'a mut BTreeMap<String, u32>,
    pub identity: &'a mut IdentityState,
}

impl ChoiceEffects<'_> {
    /// Push the choice into the history, reinforce prototypes that strongly
    /// prefer it, and nudge the mixture toward an active shadow that does.
    pub fn record(
        self,
        action: &ActionDef,
        target_id: Option<&str>,
        tick: u64,
        impactful: bool,
        archetypes: &ArchetypeCatalog,
        config: &CognitionConfig,
    ) {
        let tuning = &config.decision;
        self.history.push(HistoryEntry {
            action_id: action.action_id.clone(),
            target_id: target_id.map(str::to_string),
            tick,
            impactful,
        });

        let cap = config.archetype.reinforcement_cap;
        for prototype in archetypes.iter() {
            let preference =
                BehaviorProfile::for_prototype(prototype).action_preference(&action.tags);
            if preference >= tuning.strong_preference {
                let count = self.reinforcement.entry(prototype.id.clone()).or_insert(0);
                *count = count.saturating_add(1).min(cap);
            }
        }

        let Some(shadow_id) = self.identity.shadow_id.clone() else {
            return;
        };
        let Some(shadow) = archetypes.get(&shadow_id) else {
            return;
        };
        let preference = BehaviorProfile::for_prototype(shadow).action_preference(&action.tags);
        if preference >= tuning.strong_preference
            && self.identity.shadow_activation > tuning.shadow_nudge_threshold
        {
            let weight = self.identity.mixture.entry(shadow_id.clone()).or_insert(0.0);
            *weight = clip01(*weight + tuning.shadow_nudge);
            normalize_map(&mut self.identity.mixture);
            debug!(
                shadow_id = %shadow_id,
                action_id = %action.action_id,
                "mixture nudged toward shadow"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{starter_action_catalog, starter_goal_catalog, ActionCatalog};
    use crate::archetype::starter_catalog;
    use crate::behavior::IdentityProfiles;
    use crate::config::DecisionTuning;
    use crate::distortion::DistortionProfile;
    use crate::tom::TomStore;
    use contracts::{QuickState, TraitParams, WorldContext};
    use rand::SeedableRng;

    #[test]
    fn only_fallback_is_chosen_with_certainty() {
        let actions = ActionCatalog::from_actions(Vec::new()).expect("actions");
        let goals = starter_goal_catalog().expect("goals");
        let archetypes = starter_catalog().expect("archetypes");
        let identity = IdentityState::unformed();
        let profiles = IdentityProfiles::for_identity(&identity, &archetypes);
        let world = WorldContext::default();
        let distortion = DistortionProfile::default();
        let tom = TomStore::new();
        let quick = QuickState::default();
        let traits = TraitParams::default();
        let history = ActionHistory::new(4);
        let tuning = DecisionTuning::default();
        let ctx = ScoringContext {
            agent_id: "npc:a",
            world: &world,
            actions: &actions,
            goals: &goals,
            agent_goals: &[],
            profiles: &profiles,
            identity: &identity,
            distortion: &distortion,
            tom: &tom,
            quick: &quick,
            traits: &traits,
            trauma_max: 0.0,
            history: &history,
            tuning: &tuning,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for temperature in [0.0, 0.5, 5.0] {
            let decision = decide_reactive(&ctx, temperature, &mut rng);
            assert_eq!(decision.intention.action_id, actions.fallback().action_id);
            assert_eq!(decision.breakdown.candidates.len(), 1);
            assert_eq!(decision.breakdown.candidates[0].probability, 1.0);
            assert!(!decision.breakdown.notes.is_empty());
        }
    }

    #[test]
    fn plan_steps_carry_their_plan_id() {
        let step = PlanStep {
            action_id: "act:barricade".to_string(),
            target_id: None,
            tag: Some("goal:goal:safety".to_string()),
        };
        let decision = decide_from_step("npc:a", 4, &step, "plan:1", DecisionSource::Replan);
        assert_eq!(decision.source(), DecisionSource::Replan);
        assert_eq!(decision.intention.args["plan_id"], "plan:1");
        assert_eq!(decision.breakdown.plan_id.as_deref(), Some("plan:1"));
        assert!(decision.breakdown.candidates.is_empty());
    }

    #[test]
    fn choices_reinforce_prototypes_and_nudge_toward_an_active_shadow() {
        let archetypes = starter_catalog().expect("archetypes");
        let actions = starter_action_catalog().expect("actions");
        let incite = actions.get("act:incite").expect("incite");
        let config = CognitionConfig::default();

        let mut history = ActionHistory::new(4);
        let mut reinforcement = BTreeMap::new();
        let mut identity = IdentityState {
            actual_id: "arch:guardian".to_string(),
            shadow_id: Some("arch:rebel".to_string()),
            shadow_activation: 0.9,
            mixture: BTreeMap::from([
                ("arch:guardian".to_string(), 0.8),
                ("arch:rebel".to_string(), 0.2),
            ]),
            ..IdentityState::unformed()
        };
        ChoiceEffects {
            history: &mut history,
            reinforcement: &mut reinforcement,
            identity: &mut identity,
        }
        .record(incite, None, 3, true, &archetypes, &config);

        assert_eq!(history.len(), 1);
        assert_eq!(reinforcement.get("arch:rebel"), Some(&1));
        assert!(reinforcement.get("arch:guardian").is_none());
        assert!(identity.mixture["arch:rebel"] > 0.2);
        assert!((identity.mixture.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
