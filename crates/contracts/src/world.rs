//! Scene / world context shared by every decision in a tick.
//!
//! Mutated only by the external action executor; the cognition core reads it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::planning::PlanStep;

/// An established fact and how firmly it is held.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactState {
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub established_tick: u64,
}

/// An order issued by someone in the scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub issuer_id: String,
    /// `None` addresses everyone present.
    #[serde(default)]
    pub recipient_id: Option<String>,
    pub action_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    pub issued_tick: u64,
}

impl Order {
    pub fn addresses(&self, agent_id: &str) -> bool {
        self.issuer_id != agent_id
            && self
                .recipient_id
                .as_deref()
                .map_or(true, |recipient| recipient == agent_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coalition {
    pub coalition_id: String,
    pub members: BTreeSet<String>,
    /// Cohesion in `[0, 1]`.
    pub cohesion: f64,
}

/// A plan offered by one agent to others.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanProposal {
    pub proposal_id: String,
    pub proposer_id: String,
    pub recipients: Vec<String>,
    pub goal_id: String,
    pub steps: Vec<PlanStep>,
    /// Assigned plans come with the proposer's authority.
    #[serde(default)]
    pub assigned: bool,
    pub proposed_tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldContext {
    pub tick: u64,
    /// Current scenario phase label.
    pub phase: String,
    pub location_tags: BTreeSet<String>,
    pub facts: BTreeMap<String, FactState>,
    pub commitments: BTreeSet<String>,
    /// Agents present in the scene, in deterministic order.
    pub agents: BTreeSet<String>,
    pub leader_id: Option<String>,
    /// Leader legitimacy in `[0, 1]`.
    pub legitimacy: f64,
    /// Scene role per agent.
    pub roles: BTreeMap<String, String>,
    pub orders: Vec<Order>,
    pub coalitions: Vec<Coalition>,
    /// Physical counters, e.g. wounded awaiting triage.
    pub counters: BTreeMap<String, i64>,
    /// External social-pressure field per agent, in `[0, 1]`.
    pub social_pressure: BTreeMap<String, f64>,
    pub plan_proposals: Vec<PlanProposal>,
}

impl Default for WorldContext {
    fn default() -> Self {
        Self {
            tick: 0,
            phase: "default".to_string(),
            location_tags: BTreeSet::new(),
            facts: BTreeMap::new(),
            commitments: BTreeSet::new(),
            agents: BTreeSet::new(),
            leader_id: None,
            legitimacy: 0.5,
            roles: BTreeMap::new(),
            orders: Vec::new(),
            coalitions: Vec::new(),
            counters: BTreeMap::new(),
            social_pressure: BTreeMap::new(),
            plan_proposals: Vec::new(),
        }
    }
}

impl WorldContext {
    pub fn has_fact(&self, fact: &str) -> bool {
        self.facts.contains_key(fact)
    }

    pub fn fact_confidence(&self, fact: &str) -> f64 {
        self.facts.get(fact).map_or(0.0, |state| state.confidence)
    }

    pub fn establish_fact(&mut self, fact: impl Into<String>, confidence: f64) {
        let tick = self.tick;
        let entry = self.facts.entry(fact.into()).or_insert(FactState {
            confidence: 0.0,
            established_tick: tick,
        });
        entry.confidence = entry.confidence.max(confidence).clamp(0.0, 1.0);
    }

    pub fn role_of(&self, agent_id: &str) -> Option<&str> {
        self.roles.get(agent_id).map(String::as_str)
    }

    pub fn counter(&self, key: &str) -> i64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Orders currently addressed to `agent_id`.
    pub fn orders_for<'a>(&'a self, agent_id: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.iter().filter(move |order| order.addresses(agent_id))
    }

    /// Cohesion of the strongest coalition containing both agents, 0 if none.
    pub fn shared_cohesion(&self, a: &str, b: &str) -> f64 {
        self.coalitions
            .iter()
            .filter(|coalition| coalition.members.contains(a) && coalition.members.contains(b))
            .map(|coalition| coalition.cohesion)
            .fold(0.0, f64::max)
    }
}
