//! Bounded backward-chaining planner and plan execution.
//!
//! Plans are at most two steps deep: the goal action itself, optionally
//! preceded by one action that establishes its single missing prerequisite.

use std::collections::BTreeSet;

use contracts::{ActionDef, Plan, PlanOrigin, PlanStatus, PlanStep, Targeting, WorldContext};
use tracing::debug;

use crate::actions::{is_hard_available, ActionCatalog};
use crate::config::PlannerTuning;
use crate::distortion::DistortionProfile;
use crate::tom::TomStore;

/// Read-only inputs the planner needs about the planning agent.
#[derive(Debug, Clone, Copy)]
pub struct PlanningContext<'a> {
    pub agent_id: &'a str,
    pub world: &'a WorldContext,
    pub actions: &'a ActionCatalog,
    pub tom: &'a TomStore,
    pub lens: &'a DistortionProfile,
    pub tuning: &'a PlannerTuning,
}

impl PlanningContext<'_> {
    /// Present agent the planner trusts most; ties go to the smallest id.
    pub fn most_trusted_target(&self) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;
        for other in &self.world.agents {
            if other == self.agent_id {
                continue;
            }
            let trust = self.tom.view(other, self.lens).traits.trust;
            match best {
                Some((_, current)) if trust <= current => {}
                _ => best = Some((other.as_str(), trust)),
            }
        }
        best.map(|(id, _)| id.to_string())
    }

    fn step_for(&self, action: &ActionDef, tag: String) -> Option<PlanStep> {
        let target_id = match action.targeting {
            Targeting::None => None,
            Targeting::OtherAgent => Some(self.most_trusted_target()?),
        };
        Some(PlanStep {
            action_id: action.action_id.clone(),
            target_id,
            tag: Some(tag),
        })
    }
}

/// Build a plan serving `goal_id`, or `None` when no ranked action is
/// reachable within the horizon.
pub fn plan_for_goal(ctx: &PlanningContext<'_>, goal_id: &str, horizon: usize) -> Option<Plan> {
    let mut ranked = ctx
        .actions
        .iter()
        .filter(|action| !action.fallback && action.goal_impact(goal_id) > 0.0)
        .filter(|action| !already_achieved(action, ctx.world))
        .collect::<Vec<_>>();
    // Stable sort keeps catalog order among equal impacts.
    ranked.sort_by(|a, b| b.goal_impact(goal_id).total_cmp(&a.goal_impact(goal_id)));

    let tick = ctx.world.tick;
    let plan_id = format!("plan:{}:{}:{}", ctx.agent_id, goal_id, tick);

    for action in ranked.into_iter().take(ctx.tuning.top_k) {
        let goal_tag = format!("goal:{goal_id}");
        if is_hard_available(action, ctx.agent_id, ctx.world) {
            let Some(step) = ctx.step_for(action, goal_tag) else {
                continue;
            };
            debug!(
                agent_id = ctx.agent_id,
                goal_id,
                action_id = %action.action_id,
                "one-step plan"
            );
            return Some(Plan::new(
                plan_id,
                goal_id,
                vec![step],
                PlanOrigin::SelfBuilt,
                tick,
                horizon,
            ));
        }

        let [fact] = action.gates.required_facts.as_slice() else {
            continue;
        };
        if horizon < 2 || ctx.world.has_fact(fact) || !available_assuming(action, fact, ctx) {
            continue;
        }
        let Some(enabler) = ctx.actions.iter().find(|candidate| {
            candidate.satisfies_facts.iter().any(|satisfied| satisfied == fact)
                && is_hard_available(candidate, ctx.agent_id, ctx.world)
        }) else {
            continue;
        };
        let (Some(first), Some(second)) = (
            ctx.step_for(enabler, format!("prerequisite:{fact}")),
            ctx.step_for(action, goal_tag),
        ) else {
            continue;
        };
        debug!(
            agent_id = ctx.agent_id,
            goal_id,
            prerequisite = %enabler.action_id,
            action_id = %action.action_id,
            "two-step plan"
        );
        return Some(Plan::new(
            plan_id,
            goal_id,
            vec![first, second],
            PlanOrigin::SelfBuilt,
            tick,
            horizon,
        ));
    }
    None
}

/// Actions whose every satisfied fact already holds have nothing left to do.
fn already_achieved(action: &ActionDef, world: &WorldContext) -> bool {
    !action.satisfies_facts.is_empty()
        && action.satisfies_facts.iter().all(|fact| world.has_fact(fact))
}

/// Whether `action` would pass its gates once `fact` is established.
fn available_assuming(action: &ActionDef, fact: &str, ctx: &PlanningContext<'_>) -> bool {
    let mut hypothetical = ctx.world.clone();
    hypothetical.establish_fact(fact, 1.0);
    is_hard_available(action, ctx.agent_id, &hypothetical)
}

/// Outcome of asking a plan for its next step.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAdvance {
    /// Execute this step. The plan may have completed by consuming it.
    Step(PlanStep),
    Completed,
    Failed,
    /// The plan was already completed or failed; nothing changed.
    Terminal,
}

/// Consume the next step if `available` accepts it.
pub fn advance(plan: &mut Plan, available: impl Fn(&PlanStep) -> bool) -> PlanAdvance {
    if plan.status.is_terminal() {
        return PlanAdvance::Terminal;
    }
    let Some(step) = plan.next_step().cloned() else {
        plan.status = PlanStatus::Completed;
        return PlanAdvance::Completed;
    };
    if !available(&step) {
        plan.status = PlanStatus::Failed;
        return PlanAdvance::Failed;
    }
    plan.cursor += 1;
    if plan.is_exhausted() {
        plan.status = PlanStatus::Completed;
    }
    PlanAdvance::Step(step)
}

pub fn is_stale(plan: &Plan, tick: u64, tuning: &PlannerTuning) -> bool {
    tick.saturating_sub(plan.built_at_tick) > tuning.stale_after_ticks
}

/// Availability of a plan step in the current world: the action exists, its
/// gates pass, and its target (if any) is still present.
pub fn step_available(
    step: &PlanStep,
    agent_id: &str,
    world: &WorldContext,
    actions: &ActionCatalog,
) -> bool {
    let Some(action) = actions.get(&step.action_id) else {
        return false;
    };
    let target_present = step
        .target_id
        .as_ref()
        .map_or(true, |target| world.agents.contains(target) && target != agent_id);
    target_present && is_hard_available(action, agent_id, world)
}

/// First acceptable proposal addressed to the agent, with its proposal id.
/// Assigned plans need the proposer to be the scene leader; shared plans need
/// enough perceived trust. Proposals in `seen` are skipped.
pub fn accept_proposal(
    ctx: &PlanningContext<'_>,
    seen: &BTreeSet<String>,
) -> Option<(String, Plan)> {
    for proposal in &ctx.world.plan_proposals {
        if proposal.proposer_id == ctx.agent_id
            || seen.contains(&proposal.proposal_id)
            || proposal.steps.is_empty()
            || !proposal.recipients.iter().any(|recipient| recipient == ctx.agent_id)
        {
            continue;
        }
        let origin = if proposal.assigned {
            if ctx.world.leader_id.as_deref() != Some(proposal.proposer_id.as_str()) {
                continue;
            }
            PlanOrigin::Assigned
        } else {
            let trust = ctx.tom.view(&proposal.proposer_id, ctx.lens).traits.trust;
            if trust <= ctx.tuning.shared_trust_threshold {
                continue;
            }
            PlanOrigin::Shared
        };
        debug!(
            agent_id = ctx.agent_id,
            proposal_id = %proposal.proposal_id,
            proposer_id = %proposal.proposer_id,
            "accepted plan proposal"
        );
        let plan = Plan::new(
            format!("plan:{}:{}", ctx.agent_id, proposal.proposal_id),
            proposal.goal_id.clone(),
            proposal.steps.clone(),
            origin,
            ctx.world.tick,
            proposal.steps.len(),
        );
        return Some((proposal.proposal_id.clone(), plan));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::starter_action_catalog;
    use crate::config::TomTuning;
    use contracts::{ActionTag, DomainEvent, GoalDef, GoalCategory, PlanProposal};

    struct Fixture {
        world: WorldContext,
        actions: ActionCatalog,
        tom: TomStore,
        lens: DistortionProfile,
        tuning: PlannerTuning,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = WorldContext::default();
            world.agents = ["npc:a", "npc:b", "npc:c"]
                .into_iter()
                .map(str::to_string)
                .collect();
            Self {
                world,
                actions: starter_action_catalog().expect("actions"),
                tom: TomStore::new(),
                lens: DistortionProfile::default(),
                tuning: PlannerTuning::default(),
            }
        }

        fn ctx(&self) -> PlanningContext<'_> {
            PlanningContext {
                agent_id: "npc:a",
                world: &self.world,
                actions: &self.actions,
                tom: &self.tom,
                lens: &self.lens,
                tuning: &self.tuning,
            }
        }
    }

    #[test]
    fn missing_prerequisite_yields_a_two_step_plan() {
        let fixture = Fixture::new();
        let plan = plan_for_goal(&fixture.ctx(), "goal:safety", 2).expect("plan");
        let ids = plan
            .steps
            .iter()
            .map(|step| step.action_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["act:search_tools", "act:barricade"]);
        assert_eq!(plan.steps[0].tag.as_deref(), Some("prerequisite:fact:tools_found"));
        assert_eq!(plan.origin, PlanOrigin::SelfBuilt);
    }

    #[test]
    fn horizon_one_falls_back_to_the_best_available_action() {
        let fixture = Fixture::new();
        let plan = plan_for_goal(&fixture.ctx(), "goal:safety", 1).expect("plan");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].action_id, "act:hide");
        assert_eq!(plan.horizon, 1);
    }

    #[test]
    fn plans_carry_the_requested_horizon() {
        let fixture = Fixture::new();
        let plan = plan_for_goal(&fixture.ctx(), "goal:safety", 3).expect("plan");
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.horizon, 3);

        let mut world = fixture.world.clone();
        world.establish_fact("fact:tools_found".to_string(), 1.0);
        let ctx = PlanningContext {
            world: &world,
            ..fixture.ctx()
        };
        let plan = plan_for_goal(&ctx, "goal:safety", 4).expect("plan");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.horizon, 4);
    }

    #[test]
    fn achieved_facts_are_not_planned_again() {
        let mut fixture = Fixture::new();
        fixture.world.establish_fact("fact:tools_found", 1.0);
        fixture.world.establish_fact("fact:barricaded", 1.0);
        let plan = plan_for_goal(&fixture.ctx(), "goal:safety", 2).expect("plan");
        assert_eq!(plan.steps[0].action_id, "act:hide");
    }

    #[test]
    fn unknown_goal_has_no_plan() {
        let fixture = Fixture::new();
        assert!(plan_for_goal(&fixture.ctx(), "goal:nothing", 2).is_none());
    }

    #[test]
    fn targeted_steps_pick_the_most_trusted_agent() {
        let mut fixture = Fixture::new();
        let goals = vec![GoalDef {
            goal_id: "goal:bond".to_string(),
            category: GoalCategory::Affiliation,
            allowed_actions: vec!["act:help".to_string()],
        }];
        let help = DomainEvent {
            actor_id: "npc:c".to_string(),
            target_id: Some("npc:a".to_string()),
            action_id: "act:help".to_string(),
            tags: vec![ActionTag::Support],
            success: 1.0,
            intensity: 1.0,
            tick: 0,
        };
        fixture.tom.observe(&help, &goals, &TomTuning::default());
        let plan = plan_for_goal(&fixture.ctx(), "goal:bond", 2).expect("plan");
        assert_eq!(plan.steps[0].action_id, "act:help");
        assert_eq!(plan.steps[0].target_id.as_deref(), Some("npc:c"));
    }

    #[test]
    fn advance_walks_to_completion_and_then_stays_terminal() {
        let fixture = Fixture::new();
        let mut plan = plan_for_goal(&fixture.ctx(), "goal:safety", 2).expect("plan");
        assert!(matches!(advance(&mut plan, |_| true), PlanAdvance::Step(_)));
        assert_eq!(plan.status, PlanStatus::Active);
        assert!(matches!(advance(&mut plan, |_| true), PlanAdvance::Step(_)));
        assert_eq!(plan.status, PlanStatus::Completed);
        assert_eq!(plan.cursor, plan.steps.len());
        assert_eq!(advance(&mut plan, |_| true), PlanAdvance::Terminal);
        assert_eq!(plan.cursor, plan.steps.len());
    }

    #[test]
    fn unavailable_step_fails_the_plan() {
        let fixture = Fixture::new();
        let mut plan = plan_for_goal(&fixture.ctx(), "goal:safety", 2).expect("plan");
        assert_eq!(advance(&mut plan, |_| false), PlanAdvance::Failed);
        assert_eq!(plan.cursor, 0);
        assert_eq!(advance(&mut plan, |_| true), PlanAdvance::Terminal);
    }

    #[test]
    fn staleness_uses_build_tick() {
        let plan = Plan::new("p", "g", Vec::new(), PlanOrigin::SelfBuilt, 10, 1);
        let tuning = PlannerTuning::default();
        assert!(!is_stale(&plan, 10 + tuning.stale_after_ticks, &tuning));
        assert!(is_stale(&plan, 11 + tuning.stale_after_ticks, &tuning));
    }

    #[test]
    fn assigned_proposals_need_the_leader() {
        let mut fixture = Fixture::new();
        fixture.world.plan_proposals.push(PlanProposal {
            proposal_id: "prop:1".to_string(),
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
        assert!(accept_proposal(&fixture.ctx(), &BTreeSet::new()).is_none());

        fixture.world.leader_id = Some("npc:b".to_string());
        let (proposal_id, plan) =
            accept_proposal(&fixture.ctx(), &BTreeSet::new()).expect("assigned plan");
        assert_eq!(proposal_id, "prop:1");
        assert_eq!(plan.origin, PlanOrigin::Assigned);

        let seen = BTreeSet::from(["prop:1".to_string()]);
        assert!(accept_proposal(&fixture.ctx(), &seen).is_none());
    }

    #[test]
    fn shared_proposals_need_trust_above_threshold() {
        let mut fixture = Fixture::new();
        fixture.world.plan_proposals.push(PlanProposal {
            proposal_id: "prop:2".to_string(),
            proposer_id: "npc:c".to_string(),
            recipients: vec!["npc:a".to_string()],
            goal_id: "goal:safety".to_string(),
            steps: vec![PlanStep {
                action_id: "act:hide".to_string(),
                target_id: None,
                tag: None,
            }],
            assigned: false,
            proposed_tick: 0,
        });
        assert!(accept_proposal(&fixture.ctx(), &BTreeSet::new()).is_none());

        let goals = vec![GoalDef {
            goal_id: "goal:bond".to_string(),
            category: GoalCategory::Affiliation,
            allowed_actions: Vec::new(),
        }];
        let help = DomainEvent {
            actor_id: "npc:c".to_string(),
            target_id: Some("npc:a".to_string()),
            action_id: "act:help".to_string(),
            tags: vec![ActionTag::Support],
            success: 1.0,
            intensity: 1.0,
            tick: 0,
        };
        fixture.tom.observe(&help, &goals, &TomTuning::default());
        let (_, plan) = accept_proposal(&fixture.ctx(), &BTreeSet::new()).expect("shared plan");
        assert_eq!(plan.origin, PlanOrigin::Shared);
    }
}
