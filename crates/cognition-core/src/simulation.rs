//! Tick driver: agents decide in ascending id order, an external executor
//! turns each intention into world changes and domain events, and the events
//! are delivered back to the agents that perceive them.

use std::collections::BTreeMap;

use contracts::{
    ActionIntention, DomainEvent, IdentityPhase, ScoreBreakdown, SimulationConfig, WorldContext,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions::{ActionCatalog, GoalCatalog};
use crate::agent::{Agent, AgentDef, TickContext};
use crate::archetype::ArchetypeCatalog;
use crate::config::CognitionConfig;
use crate::error::{CognitionError, Result};

/// Applies an agent's intention to the world. Implemented by the host.
pub trait ActionExecutor {
    fn apply(&mut self, intention: &ActionIntention, world: &mut WorldContext) -> Vec<DomainEvent>;
}

/// Executor that always succeeds: establishes the action's satisfied and
/// asserted facts, consumes one unit of its required counter, and echoes one
/// full-intensity event carrying the action's tags.
#[derive(Debug, Clone)]
pub struct EchoExecutor {
    actions: ActionCatalog,
}

impl EchoExecutor {
    pub fn new(actions: ActionCatalog) -> Self {
        Self { actions }
    }
}

impl ActionExecutor for EchoExecutor {
    fn apply(&mut self, intention: &ActionIntention, world: &mut WorldContext) -> Vec<DomainEvent> {
        let Some(action) = self.actions.get(&intention.action_id) else {
            warn!(action_id = %intention.action_id, "echo executor: unknown action ignored");
            return Vec::new();
        };
        for fact in action.satisfies_facts.iter().chain(&action.asserts_fact) {
            world.establish_fact(fact.clone(), 1.0);
        }
        if let Some(counter) = &action.requires_counter {
            if let Some(value) = world.counters.get_mut(counter) {
                *value = (*value - 1).max(0);
            }
        }
        vec![DomainEvent {
            actor_id: intention.agent_id.clone(),
            target_id: intention.target_id.clone(),
            action_id: intention.action_id.clone(),
            tags: action.tags.clone(),
            success: 1.0,
            intensity: 1.0,
            tick: intention.tick,
        }]
    }
}

/// One agent's decision within one tick, with what came of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    pub agent_id: String,
    pub intention: ActionIntention,
    pub breakdown: ScoreBreakdown,
    pub events: Vec<DomainEvent>,
    pub phase: IdentityPhase,
    pub actual_id: String,
    pub self_id: String,
    pub shadow_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    run: SimulationConfig,
    config: CognitionConfig,
    world: WorldContext,
    archetypes: ArchetypeCatalog,
    actions: ActionCatalog,
    goals: GoalCatalog,
    agents: BTreeMap<String, Agent>,
}

impl Simulation {
    /// Validates the configuration; everything after this is infallible.
    pub fn new(
        run: SimulationConfig,
        config: CognitionConfig,
        world: WorldContext,
        archetypes: ArchetypeCatalog,
        actions: ActionCatalog,
        goals: GoalCatalog,
    ) -> Result<Self> {
        config.validate()?;
        if archetypes.is_empty() {
            return Err(CognitionError::EmptyCatalog("archetype"));
        }
        info!(run_id = %run.run_id, seed = run.seed, "simulation created");
        Ok(Self {
            run,
            config,
            world,
            archetypes,
            actions,
            goals,
            agents: BTreeMap::new(),
        })
    }

    pub fn add_agent(&mut self, def: &AgentDef) -> Result<()> {
        if self.agents.contains_key(&def.agent_id) {
            return Err(CognitionError::DuplicateId {
                kind: "agent",
                id: def.agent_id.clone(),
            });
        }
        for (goal_id, _) in crate::agent::resolve_goals(&def.goals) {
            if self.goals.get(&goal_id).is_none() {
                warn!(agent_id = %def.agent_id, goal_id = %goal_id, "goal not in catalog");
            }
        }
        let agent = Agent::from_def(def, self.run.seed, &self.config);
        self.world.agents.insert(agent.id.clone());
        self.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    pub fn world(&self) -> &WorldContext {
        &self.world
    }

    /// Mutable world access for hosts that change the scene between ticks.
    pub fn world_mut(&mut self) -> &mut WorldContext {
        &mut self.world
    }

    pub fn agent(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.get(agent_id)
    }

    pub fn agent_mut(&mut self, agent_id: &str) -> Option<&mut Agent> {
        self.agents.get_mut(agent_id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn config(&self) -> &CognitionConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.world.tick
    }

    pub fn is_finished(&self) -> bool {
        self.world.tick >= self.run.max_ticks
    }

    /// Run one tick for every agent, then decay trauma and advance the clock.
    pub fn step(&mut self, executor: &mut dyn ActionExecutor) -> Vec<TickRecord> {
        let tick = self.world.tick;
        let agent_ids = self.agents.keys().cloned().collect::<Vec<_>>();
        let mut records = Vec::with_capacity(agent_ids.len());

        for agent_id in agent_ids {
            let Some(agent) = self.agents.get_mut(&agent_id) else {
                continue;
            };
            let ctx = TickContext {
                world: &self.world,
                archetypes: &self.archetypes,
                actions: &self.actions,
                goals: &self.goals,
                config: &self.config,
            };
            let decision = agent.tick(&ctx);
            let phase = agent.identity.phase;
            let actual_id = agent.identity.actual_id.clone();
            let self_id = agent.identity.self_id.clone();
            let shadow_id = agent.identity.shadow_id.clone();

            let events = executor.apply(&decision.intention, &mut self.world);
            self.deliver(&events);

            records.push(TickRecord {
                tick,
                agent_id,
                intention: decision.intention,
                breakdown: decision.breakdown,
                events,
                phase,
                actual_id,
                self_id,
                shadow_id,
            });
        }

        for agent in self.agents.values_mut() {
            agent.trauma.decay(1, self.config.trauma.decay_rate);
        }
        self.world.tick += 1;
        debug!(tick, decisions = records.len(), "tick complete");
        records
    }

    /// Up to `ticks` ticks, stopping early at `max_ticks`.
    pub fn step_n(&mut self, ticks: u64, executor: &mut dyn ActionExecutor) -> Vec<TickRecord> {
        let mut records = Vec::new();
        for _ in 0..ticks {
            if self.is_finished() {
                break;
            }
            records.extend(self.step(executor));
        }
        records
    }

    fn deliver(&mut self, events: &[DomainEvent]) {
        let rate = self.config.perception_rate;
        for event in events {
            for agent in self.agents.values_mut() {
                if agent.id == event.actor_id {
                    agent.process_own_action(event, &self.config);
                } else if agent.perceives(event, rate) {
                    agent.observe(event, &self.goals, &self.config);
                }
            }
        }
    }
}
