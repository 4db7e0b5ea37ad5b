//! Simulated character: composes trauma, distortion, identity, theory of mind,
//! planning and decision state into a single `tick`.
//!
//! The tick order is: regenerate budget → refresh identity → continue the
//! active plan → accept a plan proposal → replan → reactive scoring →
//! record the choice.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{
    ActionTag, BiographyLatent, DecisionSource, DomainEvent, GoalEcology, IdentityState,
    LifeEvent, Plan, PlanStatus, QuickState, TraitParams, TraumaLoad, WorldContext, Worldview,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actions::{ActionCatalog, GoalCatalog};
use crate::archetype::{refresh_identity, ArchetypeCatalog, IdentityInputs};
use crate::behavior::{BehaviorProfile, IdentityProfiles};
use crate::config::CognitionConfig;
use crate::decision::{
    decide_from_step, decide_reactive, ActionHistory, ChoiceEffects, Decision, ScoringContext,
};
use crate::distortion::DistortionProfile;
use crate::numeric::clip01;
use crate::planning::{
    accept_proposal, advance, is_stale, plan_for_goal, step_available, PlanAdvance,
    PlanningContext,
};
use crate::rng::{RngChannel, RngStreams};
use crate::tom::TomStore;
use crate::trauma::TraumaLedger;

// ---------------------------------------------------------------------------
// AgentDef
// ---------------------------------------------------------------------------

/// Serializable description of an agent, as a host would load it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDef {
    pub agent_id: String,
    #[serde(default)]
    pub traits: TraitParams,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub quick: QuickState,
    #[serde(default)]
    pub worldview: Worldview,
    #[serde(default)]
    pub moral_dissonance: f64,
    #[serde(default)]
    pub trauma: TraumaLoad,
    #[serde(default)]
    pub biography: BiographyLatent,
    #[serde(default)]
    pub goals: GoalEcology,
    /// Backstory replayed into the trauma ledger at construction.
    #[serde(default)]
    pub life_events: Vec<LifeEvent>,
}

fn default_temperature() -> f64 {
    0.5
}

impl AgentDef {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            traits: TraitParams::default(),
            temperature: default_temperature(),
            quick: QuickState::default(),
            worldview: Worldview::default(),
            moral_dissonance: 0.0,
            trauma: TraumaLoad::default(),
            biography: BiographyLatent::default(),
            goals: GoalEcology::default(),
            life_events: Vec::new(),
        }
    }
}

/// Flatten a goal ecology into `(goal_id, priority)` pairs. Inactive
/// personalized goals are dropped; priorities are clipped to `[0, 1]`.
pub fn resolve_goals(ecology: &GoalEcology) -> Vec<(String, f64)> {
    match ecology {
        GoalEcology::Personalized(goals) => goals
            .iter()
            .filter(|goal| goal.active)
            .map(|goal| (goal.goal_id.clone(), clip01(goal.priority)))
            .collect(),
        GoalEcology::Legacy(table) => table
            .iter()
            .map(|(goal_id, weight)| (goal_id.clone(), clip01(*weight)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Shared, read-only inputs for one agent tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub world: &'a WorldContext,
    pub archetypes: &'a ArchetypeCatalog,
    pub actions: &'a ActionCatalog,
    pub goals: &'a GoalCatalog,
    pub config: &'a CognitionConfig,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: String,
    pub traits: TraitParams,
    /// Softmax temperature of reactive choices.
    pub temperature: f64,
    pub quick: QuickState,
    pub worldview: Worldview,
    pub moral_dissonance: f64,
    pub trauma: TraumaLedger,
    /// Resolved `(goal_id, priority)` list.
    pub goals: Vec<(String, f64)>,
    pub identity: IdentityState,
    /// Prototype id → reinforcement count.
    pub reinforcement: BTreeMap<String, u32>,
    pub tom: TomStore,
    pub plan: Option<Plan>,
    pub history: ActionHistory,
    /// Cognitive budget spent by replanning.
    pub budget: f64,
    accepted_proposals: BTreeSet<String>,
    rng: RngStreams,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        traits: TraitParams,
        run_seed: u64,
        config: &CognitionConfig,
    ) -> Self {
        let id = id.into();
        let rng = RngStreams::new(run_seed, &id);
        Self {
            id,
            traits,
            temperature: default_temperature(),
            quick: QuickState::default(),
            worldview: Worldview::default(),
            moral_dissonance: 0.0,
            trauma: TraumaLedger::default(),
            goals: Vec::new(),
            identity: IdentityState::unformed(),
            reinforcement: BTreeMap::new(),
            tom: TomStore::new(),
            plan: None,
            history: ActionHistory::new(config.decision.history_window),
            budget: config.planner.budget_max,
            accepted_proposals: BTreeSet::new(),
            rng,
        }
    }

    pub fn from_def(def: &AgentDef, run_seed: u64, config: &CognitionConfig) -> Self {
        let mut agent = Self::new(def.agent_id.clone(), def.traits.clone(), run_seed, config)
            .with_goals(&def.goals)
            .with_quick(def.quick.clone())
            .with_temperature(def.temperature);
        agent.worldview = def.worldview.clone();
        agent.moral_dissonance = clip01(def.moral_dissonance);
        agent.trauma = TraumaLedger::new(def.trauma, def.biography.clone());
        for event in &def.life_events {
            agent.trauma.record(event, &config.trauma);
        }
        agent
    }

    pub fn with_goals(mut self, ecology: &GoalEcology) -> Self {
        self.goals = resolve_goals(ecology);
        self
    }

    pub fn with_quick(mut self, quick: QuickState) -> Self {
        self.quick = quick;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = if temperature.is_finite() {
            temperature.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// Current distortions, derived fresh from traits, biography, trauma and
    /// worldview.
    pub fn distortion(&self) -> DistortionProfile {
        DistortionProfile::derive(
            &self.traits,
            &self.trauma.biography,
            &self.trauma.load,
            &self.worldview,
        )
    }

    /// One decision. Never fails: every branch ends in the reactive scorer,
    /// which always has at least the fallback action.
    pub fn tick(&mut self, ctx: &TickContext<'_>) -> Decision {
        let planner = &ctx.config.planner;

        // 1. Regenerate cognitive budget.
        self.budget = (self.budget + planner.budget_regen).min(planner.budget_max);

        // 2. Refresh identity under the current distortions.
        let distortion = self.distortion();
        self.refresh_identity(ctx, &distortion);
        let profiles = IdentityProfiles::for_identity(&self.identity, ctx.archetypes);

        // 3. Plan, proposal, replan, then reactive scoring.
        let decision = match self.planned_decision(ctx, &distortion, &profiles.blended) {
            Some(decision) => decision,
            None => self.reactive_decision(ctx, &distortion, &profiles),
        };

        // 4. Feed the choice back into history, reinforcement and mixture.
        self.record_choice(ctx, &decision);
        decision
    }

    fn refresh_identity(&mut self, ctx: &TickContext<'_>, distortion: &DistortionProfile) {
        let inputs = IdentityInputs {
            agent_id: &self.id,
            traits: &self.traits,
            distortion,
            trauma: &self.trauma.load,
            biography: &self.trauma.biography,
            moral_dissonance: self.moral_dissonance,
            stress: self.quick.stress,
            stability: self.quick.stability,
            epistemic_stress: self.tom.epistemic_stress(),
            integration: self.trauma.integration(),
            reinforcement: &self.reinforcement,
        };
        refresh_identity(
            &mut self.identity,
            &inputs,
            ctx.archetypes,
            ctx.config,
            self.rng.channel(RngChannel::Perception),
        );
    }

    fn planned_decision(
        &mut self,
        ctx: &TickContext<'_>,
        distortion: &DistortionProfile,
        profile: &BehaviorProfile,
    ) -> Option<Decision> {
        let tick = ctx.world.tick;
        let planner = &ctx.config.planner;

        if let Some(plan) = self.plan.as_mut() {
            if !plan.status.is_terminal() && is_stale(plan, tick, planner) {
                plan.status = PlanStatus::Failed;
                debug!(agent_id = %self.id, plan_id = %plan.plan_id, "stale plan abandoned");
            }
        }
        if let Some(decision) = self.continue_plan(ctx, DecisionSource::Plan) {
            return Some(decision);
        }

        let accepted = accept_proposal(
            &PlanningContext {
                agent_id: &self.id,
                world: ctx.world,
                actions: ctx.actions,
                tom: &self.tom,
                lens: distortion,
                tuning: planner,
            },
            &self.accepted_proposals,
        );
        if let Some((proposal_id, plan)) = accepted {
            self.accepted_proposals.insert(proposal_id);
            self.plan = Some(plan);
            if let Some(decision) = self.continue_plan(ctx, DecisionSource::SharedPlan) {
                return Some(decision);
            }
        }

        if self.budget < planner.replan_cost || self.quick.stress > planner.replan_stress_ceiling {
            return None;
        }
        self.budget -= planner.replan_cost;
        let horizon = ((planner.horizon as f64) * profile.horizon).round().max(1.0) as usize;
        let planning = PlanningContext {
            agent_id: &self.id,
            world: ctx.world,
            actions: ctx.actions,
            tom: &self.tom,
            lens: distortion,
            tuning: planner,
        };
        let built = self
            .ranked_goals(ctx.goals, profile)
            .iter()
            .find_map(|goal_id| plan_for_goal(&planning, goal_id, horizon));
        match built {
            Some(plan) => {
                debug!(
                    agent_id = %self.id,
                    plan_id = %plan.plan_id,
                    steps = plan.steps.len(),
                    "replanned"
                );
                self.plan = Some(plan);
                self.continue_plan(ctx, DecisionSource::Replan)
            }
            None => {
                debug!(agent_id = %self.id, "replanning found no plan");
                None
            }
        }
    }

    fn continue_plan(
        &mut self,
        ctx: &TickContext<'_>,
        source: DecisionSource,
    ) -> Option<Decision> {
        let plan = self.plan.as_mut()?;
        let agent_id = self.id.as_str();
        let tick = ctx.world.tick;
        match advance(plan, |step| step_available(step, agent_id, ctx.world, ctx.actions)) {
            PlanAdvance::Step(step) => {
                if plan.status == PlanStatus::Completed {
                    debug!(agent_id, plan_id = %plan.plan_id, "plan completed");
                }
                Some(decide_from_step(agent_id, tick, &step, &plan.plan_id, source))
            }
            PlanAdvance::Completed => {
                debug!(agent_id, plan_id = %plan.plan_id, "plan completed");
                None
            }
            PlanAdvance::Failed => {
                debug!(agent_id, plan_id = %plan.plan_id, "plan step unavailable, plan failed");
                None
            }
            PlanAdvance::Terminal => None,
        }
    }

    /// Goal ids by priority scaled with the profile's category weight;
    /// declaration order breaks ties.
    fn ranked_goals(&self, goals: &GoalCatalog, profile: &BehaviorProfile) -> Vec<String> {
        let mut ranked = self
            .goals
            .iter()
            .map(|(goal_id, priority)| {
                let weight = goals
                    .category_of(goal_id)
                    .map_or(1.0, |category| profile.goal_weight(category));
                (goal_id.clone(), priority * weight)
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().map(|(goal_id, _)| goal_id).collect()
    }

    fn reactive_decision(
        &mut self,
        ctx: &TickContext<'_>,
        distortion: &DistortionProfile,
        profiles: &IdentityProfiles,
    ) -> Decision {
        let scoring = ScoringContext {
            agent_id: &self.id,
            world: ctx.world,
            actions: ctx.actions,
            goals: ctx.goals,
            agent_goals: &self.goals,
            profiles,
            identity: &self.identity,
            distortion,
            tom: &self.tom,
            quick: &self.quick,
            traits: &self.traits,
            trauma_max: self.trauma.max_domain(),
            history: &self.history,
            tuning: &ctx.config.decision,
        };
        decide_reactive(&scoring, self.temperature, self.rng.channel(RngChannel::Decision))
    }

    fn record_choice(&mut self, ctx: &TickContext<'_>, decision: &Decision) {
        let action = ctx
            .actions
            .get(&decision.intention.action_id)
            .unwrap_or_else(|| ctx.actions.fallback());
        let threshold = ctx.config.decision.impact_threshold;
        let impactful = self
            .goals
            .iter()
            .any(|(goal_id, _)| action.goal_impact(goal_id) >= threshold);
        ChoiceEffects {
            history: &mut self.history,
            reinforcement: &mut self.reinforcement,
            identity: &mut self.identity,
        }
        .record(
            action,
            decision.intention.target_id.as_deref(),
            ctx.world.tick,
            impactful,
            ctx.archetypes,
            ctx.config,
        );
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Whether this agent notices `event`. Targets always do; bystanders roll
    /// against `rate` on their perception stream. Actors are not observers.
    pub fn perceives(&mut self, event: &DomainEvent, rate: f64) -> bool {
        if event.actor_id == self.id {
            return false;
        }
        if event.target_id.as_deref() == Some(self.id.as_str()) {
            return true;
        }
        self.rng.unit(RngChannel::Perception) < clip01(rate)
    }

    /// Fold a perceived event into theory of mind and trauma.
    pub fn observe(&mut self, event: &DomainEvent, goals: &GoalCatalog, config: &CognitionConfig) {
        self.tom.observe(event, goals.goals(), &config.tom);
        self.trauma.absorb_event(event, &self.id, &config.trauma);
    }

    /// Own therapeutic actions process trauma in proportion to intensity.
    pub fn process_own_action(&mut self, event: &DomainEvent, config: &CognitionConfig) {
        if event.actor_id != self.id || !event.has_tag(ActionTag::Therapeutic) {
            return;
        }
        let amount = config.trauma.processing_rate * clip01(event.intensity);
        self.trauma.process(amount);
        debug!(agent_id = %self.id, amount, "trauma processed");
    }

    /// Uniform draw from the physiology stream, for hosts driving the
    /// physiology subsystem off this agent's seed.
    pub fn physiology_draw(&mut self) -> f64 {
        self.rng.unit(RngChannel::Physiology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{starter_action_catalog, starter_goal_catalog};
    use crate::archetype::starter_catalog;
    use contracts::{PersonalGoal, PlanOrigin, PlanProposal, PlanStep};

    struct Scene {
        world: WorldContext,
        archetypes: ArchetypeCatalog,
        actions: ActionCatalog,
        goals: GoalCatalog,
        config: CognitionConfig,
    }

    impl Scene {
        fn new() -> Self {
            let mut world = WorldContext::default();
            world.agents = ["npc:a", "npc:b"].into_iter().map(str::to_string).collect();
            Self {
                world,
                archetypes: starter_catalog().expect("archetypes"),
                actions: starter_action_catalog().expect("actions"),
                goals: starter_goal_catalog().expect("goals"),
                config: CognitionConfig::default(),
            }
        }

        fn ctx(&self) -> TickContext<'_> {
            TickContext {
                world: &self.world,
                archetypes: &self.archetypes,
                actions: &self.actions,
                goals: &self.goals,
                config: &self.config,
            }
        }
    }

    fn safety_agent(config: &CognitionConfig) -> Agent {
        Agent::new("npc:a", TraitParams::default(), 7, config).with_goals(
            &GoalEcology::Personalized(vec![PersonalGoal {
                goal_id: "goal:safety".to_string(),
                priority: 0.9,
                active: true,
            }]),
        )
    }

    #[test]
    fn inactive_goals_are_dropped_when_resolving() {
        let ecology = GoalEcology::Personalized(vec![
            PersonalGoal {
                goal_id: "goal:safety".to_string(),
                priority: 1.4,
                active: true,
            },
            PersonalGoal {
                goal_id: "goal:truth".to_string(),
                priority: 0.3,
                active: false,
            },
        ]);
        assert_eq!(resolve_goals(&ecology), vec![("goal:safety".to_string(), 1.0)]);
    }

    #[test]
    fn calm_agent_replans_then_follows_its_plan() {
        let mut scene = Scene::new();
        scene.config.planner.horizon = 3;
        let mut agent = safety_agent(&scene.config);

        let first = agent.tick(&scene.ctx());
        assert_eq!(first.source(), DecisionSource::Replan);
        assert_eq!(first.intention.action_id, "act:search_tools");
        assert!(!agent.identity.actual_id.is_empty());

        scene.world.establish_fact("fact:tools_found", 1.0);
        scene.world.tick = 1;
        let second = agent.tick(&scene.ctx());
        assert_eq!(second.source(), DecisionSource::Plan);
        assert_eq!(second.intention.action_id, "act:barricade");
        assert_eq!(
            agent.plan.as_ref().map(|plan| plan.status),
            Some(PlanStatus::Completed)
        );
        assert_eq!(agent.history.len(), 2);
    }

    #[test]
    fn stressed_agent_skips_replanning() {
        let scene = Scene::new();
        let mut agent = safety_agent(&scene.config).with_quick(QuickState {
            stress: 0.95,
            ..QuickState::default()
        });
        let decision = agent.tick(&scene.ctx());
        assert_eq!(decision.source(), DecisionSource::Reactive);
        assert!((decision.breakdown.probability_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn exhausted_budget_falls_through_to_reactive_scoring() {
        let scene = Scene::new();
        let mut agent = safety_agent(&scene.config);
        agent.budget = -10.0;
        let decision = agent.tick(&scene.ctx());
        assert_eq!(decision.source(), DecisionSource::Reactive);
    }

    #[test]
    fn assigned_proposal_from_the_leader_is_taken_once() {
        let mut scene = Scene::new();
        scene.world.leader_id = Some("npc:b".to_string());
        scene.world.plan_proposals.push(PlanProposal {
            proposal_id: "prop:hold".to_string(),
            proposer_id: "npc:b".to_string(),
            recipients: vec!["npc:a".to_string()],
            goal_id: "goal:order".to_string(),
            steps: vec![PlanStep {
                action_id: "act:obey_order".to_string(),
                target_id: None,
                tag: None,
            }],
            assigned: true,
            proposed_tick: 0,
        });
        let mut agent = safety_agent(&scene.config);
        let first = agent.tick(&scene.ctx());
        assert_eq!(first.source(), DecisionSource::SharedPlan);
        assert_eq!(first.intention.action_id, "act:obey_order");
        assert_eq!(agent.plan.as_ref().map(|plan| plan.origin), Some(PlanOrigin::Assigned));

        scene.world.tick = 1;
        let second = agent.tick(&scene.ctx());
        assert_ne!(second.source(), DecisionSource::SharedPlan);
    }

    #[test]
    fn targets_always_perceive_and_actors_never_do() {
        let config = CognitionConfig::default();
        let mut agent = Agent::new("npc:a", TraitParams::default(), 1, &config);
        let mut event = DomainEvent {
            actor_id: "npc:b".to_string(),
            target_id: Some("npc:a".to_string()),
            action_id: "act:help".to_string(),
            tags: vec![ActionTag::Support],
            success: 1.0,
            intensity: 1.0,
            tick: 0,
        };
        assert!(agent.perceives(&event, 0.0));
        event.actor_id = "npc:a".to_string();
        assert!(!agent.perceives(&event, 1.0));
    }

    #[test]
    fn therapeutic_actions_process_own_trauma() {
        let config = CognitionConfig::default();
        let mut agent = Agent::new("npc:a", TraitParams::default(), 1, &config);
        agent.trauma.load.self_image = 0.8;
        let reflect = DomainEvent {
            actor_id: "npc:a".to_string(),
            target_id: None,
            action_id: "act:reflect".to_string(),
            tags: vec![ActionTag::Rest, ActionTag::Therapeutic],
            success: 1.0,
            intensity: 1.0,
            tick: 0,
        };
        agent.process_own_action(&reflect, &config);
        assert!(agent.trauma.load.self_image < 0.8);
        assert!(agent.trauma.biography.processed > 0.0);
    }

    #[test]
    fn backstory_is_replayed_into_trauma() {
        let raw = r#"{
            "agent_id": "npc:c",
            "temperature": 0.2,
            "goals": {"kind": "legacy", "goals": {"goal:truth": 0.7}},
            "life_events": [{"kind": "betrayal", "severity": 0.9, "tick": 0}]
        }"#;
        let def: AgentDef = serde_json::from_str(raw).expect("agent def");
        let agent = Agent::from_def(&def, 3, &CognitionConfig::default());
        assert_eq!(agent.goals, vec![("goal:truth".to_string(), 0.7)]);
        assert_eq!(agent.temperature, 0.2);
        assert!(agent.trauma.load.others > 0.5);
    }

    #[test]
    fn first_sightings_carry_no_epistemic_stress() {
        let scene = Scene::new();
        let phase_after = |action_id: &str, tag: ActionTag| {
            let mut agent = safety_agent(&scene.config);
            for actor_id in ["npc:b", "npc:c", "npc:d"] {
                let event = DomainEvent {
                    actor_id: actor_id.to_string(),
                    target_id: None,
                    action_id: action_id.to_string(),
                    tags: vec![tag],
                    success: 1.0,
                    intensity: 1.0,
                    tick: 0,
                };
                agent.observe(&event, &scene.goals, &scene.config);
            }
            assert_eq!(agent.tom.epistemic_stress(), 0.0, "{action_id}");
            agent.tick(&scene.ctx());
            agent.identity.phase
        };
        assert_eq!(
            phase_after("act:hide", ActionTag::Withdraw),
            phase_after("act:help", ActionTag::Support)
        );
    }

    #[test]
    fn physiology_draws_leave_decisions_untouched() {
        let scene = Scene::new();
        let mut drawn = safety_agent(&scene.config);
        let mut undrawn = safety_agent(&scene.config);
        let mut replay = safety_agent(&scene.config);

        let draws = (0..16).map(|_| drawn.physiology_draw()).collect::<Vec<_>>();
        assert!(draws.iter().all(|value| (0.0..1.0).contains(value)));
        let replayed = (0..16).map(|_| replay.physiology_draw()).collect::<Vec<_>>();
        assert_eq!(draws, replayed);

        for tick in 0..3 {
            let mut world = scene.world.clone();
            world.tick = tick;
            let ctx = TickContext {
                world: &world,
                ..scene.ctx()
            };
            assert_eq!(drawn.tick(&ctx), undrawn.tick(&ctx));
        }
    }
}
