//! Action and goal catalogs: registries with id indexes, hard availability
//! gates, and small starter tables.

use std::collections::BTreeMap;

use contracts::{
    ActionDef, ActionGates, ActionTag, GoalCategory, GoalDef, Targeting, WorldContext,
};

use crate::error::{CognitionError, Result};

pub const FALLBACK_ACTION_ID: &str = "act:idle";

// ---------------------------------------------------------------------------
// ActionCatalog
// ---------------------------------------------------------------------------

/// Registry of action definitions in declaration order. Always holds a
/// fallback action.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: Vec<ActionDef>,
    by_id: BTreeMap<String, usize>,
    fallback: usize,
}

impl ActionCatalog {
    /// Register `actions` in order, then append a no-op fallback if none of
    /// them is one.
    pub fn from_actions(actions: Vec<ActionDef>) -> Result<Self> {
        let mut catalog = Self {
            actions: Vec::new(),
            by_id: BTreeMap::new(),
            fallback: 0,
        };
        for action in actions {
            catalog.register(action)?;
        }
        match catalog.actions.iter().position(|action| action.fallback) {
            Some(idx) => catalog.fallback = idx,
            None => {
                catalog.register(idle_action())?;
                catalog.fallback = catalog.actions.len() - 1;
            }
        }
        Ok(catalog)
    }

    pub fn register(&mut self, action: ActionDef) -> Result<()> {
        if self.by_id.contains_key(&action.action_id) {
            return Err(CognitionError::DuplicateId {
                kind: "action",
                id: action.action_id,
            });
        }
        self.by_id.insert(action.action_id.clone(), self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    pub fn get(&self, action_id: &str) -> Option<&ActionDef> {
        self.by_id.get(action_id).map(|idx| &self.actions[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDef> {
        self.actions.iter()
    }

    pub fn fallback(&self) -> &ActionDef {
        &self.actions[self.fallback]
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn idle_action() -> ActionDef {
    ActionDef {
        tags: vec![ActionTag::Rest],
        fallback: true,
        ..action(FALLBACK_ACTION_ID)
    }
}

/// Hard gates: scene phase, location tags, prerequisite facts, commitments
/// and roles. The fallback is always available.
pub fn is_hard_available(action: &ActionDef, agent_id: &str, world: &WorldContext) -> bool {
    if action.fallback {
        return true;
    }
    let gates: &ActionGates = &action.gates;
    if !gates.phases.is_empty() && !gates.phases.iter().any(|phase| *phase == world.phase) {
        return false;
    }
    if !gates
        .location_tags
        .iter()
        .all(|tag| world.location_tags.contains(tag))
    {
        return false;
    }
    if !gates.required_facts.iter().all(|fact| world.has_fact(fact)) {
        return false;
    }
    if !gates
        .required_commitments
        .iter()
        .all(|commitment| world.commitments.contains(commitment))
    {
        return false;
    }
    if !gates.roles.is_empty() {
        let Some(role) = world.role_of(agent_id) else {
            return false;
        };
        if !gates.roles.iter().any(|allowed| allowed == role) {
            return false;
        }
    }
    true
}

// ---------------------------------------------------------------------------
// GoalCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GoalCatalog {
    goals: Vec<GoalDef>,
    by_id: BTreeMap<String, usize>,
}

impl GoalCatalog {
    pub fn from_goals(goals: Vec<GoalDef>) -> Result<Self> {
        let mut catalog = Self::default();
        for goal in goals {
            if catalog.by_id.contains_key(&goal.goal_id) {
                return Err(CognitionError::DuplicateId {
                    kind: "goal",
                    id: goal.goal_id,
                });
            }
            catalog.by_id.insert(goal.goal_id.clone(), catalog.goals.len());
            catalog.goals.push(goal);
        }
        Ok(catalog)
    }

    pub fn get(&self, goal_id: &str) -> Option<&GoalDef> {
        self.by_id.get(goal_id).map(|idx| &self.goals[*idx])
    }

    pub fn goals(&self) -> &[GoalDef] {
        &self.goals
    }

    pub fn category_of(&self, goal_id: &str) -> Option<GoalCategory> {
        self.get(goal_id).map(|goal| goal.category)
    }
}

// ---------------------------------------------------------------------------
// Starter tables
// ---------------------------------------------------------------------------

fn action(action_id: &str) -> ActionDef {
    ActionDef {
        action_id: action_id.to_string(),
        tags: Vec::new(),
        base_cost: 0.0,
        targeting: Targeting::None,
        risky: false,
        gates: ActionGates::default(),
        soft_facts: Vec::new(),
        satisfies_facts: Vec::new(),
        asserts_fact: None,
        goal_impacts: BTreeMap::new(),
        phase_bonus: BTreeMap::new(),
        requires_counter: None,
        role_affinity: Vec::new(),
        specialist_role: None,
        fallback: false,
    }
}

fn impacts(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(goal_id, impact)| (goal_id.to_string(), *impact))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// A besieged-shelter scene: enough variety to exercise every utility term.
pub fn starter_actions() -> Vec<ActionDef> {
    use ActionTag::*;
    vec![
        ActionDef {
            tags: vec![Explore],
            base_cost: 0.2,
            satisfies_facts: strings(&["fact:tools_found"]),
            goal_impacts: impacts(&[("goal:safety", 0.2), ("goal:truth", 0.1)]),
            ..action("act:search_tools")
        },
        ActionDef {
            tags: vec![Formal],
            base_cost: 0.3,
            gates: ActionGates {
                required_facts: strings(&["fact:tools_found"]),
                ..ActionGates::default()
            },
            satisfies_facts: strings(&["fact:barricaded"]),
            asserts_fact: Some("fact:barricaded".to_string()),
            goal_impacts: impacts(&[("goal:safety", 0.8), ("goal:order", 0.3)]),
            ..action("act:barricade")
        },
        ActionDef {
            tags: vec![Withdraw],
            base_cost: 0.1,
            goal_impacts: impacts(&[("goal:safety", 0.4)]),
            ..action("act:hide")
        },
        ActionDef {
            tags: vec![Support],
            base_cost: 0.2,
            targeting: Targeting::OtherAgent,
            goal_impacts: impacts(&[("goal:bond", 0.6), ("goal:care", 0.3)]),
            ..action("act:help")
        },
        ActionDef {
            tags: vec![Care, Support],
            base_cost: 0.15,
            targeting: Targeting::OtherAgent,
            goal_impacts: impacts(&[("goal:bond", 0.4), ("goal:care", 0.5)]),
            ..action("act:comfort")
        },
        ActionDef {
            tags: vec![Care],
            base_cost: 0.4,
            requires_counter: Some("wounded".to_string()),
            role_affinity: strings(&["medic"]),
            specialist_role: Some("medic".to_string()),
            goal_impacts: impacts(&[("goal:care", 0.9), ("goal:safety", 0.2)]),
            ..action("act:treat_wounded")
        },
        ActionDef {
            tags: vec![Rest, Therapeutic],
            base_cost: 0.05,
            goal_impacts: impacts(&[("goal:safety", 0.1), ("goal:care", 0.1)]),
            ..action("act:reflect")
        },
        ActionDef {
            tags: vec![Lead, Hierarchical],
            base_cost: 0.25,
            targeting: Targeting::OtherAgent,
            gates: ActionGates {
                roles: strings(&["leader"]),
                ..ActionGates::default()
            },
            role_affinity: strings(&["leader"]),
            goal_impacts: impacts(&[("goal:status", 0.6), ("goal:order", 0.5)]),
            ..action("act:command")
        },
        ActionDef {
            tags: vec![Harm, Assert],
            base_cost: 0.3,
            targeting: Targeting::OtherAgent,
            risky: true,
            goal_impacts: impacts(&[("goal:status", 0.5), ("goal:safety", 0.1)]),
            ..action("act:intimidate")
        },
        ActionDef {
            tags: vec![Comply, Formal],
            base_cost: 0.15,
            goal_impacts: impacts(&[("goal:order", 0.6)]),
            ..action("act:obey_order")
        },
        ActionDef {
            tags: vec![Refuse],
            base_cost: 0.1,
            goal_impacts: impacts(&[("goal:change", 0.3), ("goal:order", -0.3)]),
            ..action("act:refuse_order")
        },
        ActionDef {
            tags: vec![Explore, Disclose],
            base_cost: 0.25,
            soft_facts: strings(&["fact:rumor_heard"]),
            satisfies_facts: strings(&["fact:rumor_checked"]),
            asserts_fact: Some("fact:rumor_checked".to_string()),
            goal_impacts: impacts(&[("goal:truth", 0.7)]),
            ..action("act:investigate")
        },
        ActionDef {
            tags: vec![Disclose],
            base_cost: 0.2,
            goal_impacts: impacts(&[("goal:truth", 0.5), ("goal:bond", 0.2)]),
            ..action("act:confess")
        },
        ActionDef {
            tags: vec![Radical, Confront],
            base_cost: 0.35,
            risky: true,
            phase_bonus: impacts(&[("crisis", 0.5)]),
            goal_impacts: impacts(&[("goal:change", 0.8), ("goal:order", -0.5)]),
            ..action("act:incite")
        },
        ActionDef {
            tags: vec![Radical, Deceive],
            base_cost: 0.4,
            risky: true,
            goal_impacts: impacts(&[("goal:change", 0.6), ("goal:order", -0.6)]),
            ..action("act:sabotage")
        },
        ActionDef {
            tags: vec![Betrayal, Deceive],
            base_cost: 0.3,
            targeting: Targeting::OtherAgent,
            risky: true,
            goal_impacts: impacts(&[("goal:status", 0.4), ("goal:bond", -0.6)]),
            ..action("act:sell_out")
        },
        idle_action(),
    ]
}

pub fn starter_goals() -> Vec<GoalDef> {
    let goal = |goal_id: &str, category, allowed: &[&str]| GoalDef {
        goal_id: goal_id.to_string(),
        category,
        allowed_actions: strings(allowed),
    };
    vec![
        goal(
            "goal:safety",
            GoalCategory::Survival,
            &["act:search_tools", "act:barricade", "act:hide"],
        ),
        goal(
            "goal:bond",
            GoalCategory::Affiliation,
            &["act:help", "act:comfort", "act:confess"],
        ),
        goal(
            "goal:status",
            GoalCategory::Status,
            &["act:command", "act:intimidate", "act:sell_out"],
        ),
        goal(
            "goal:order",
            GoalCategory::Order,
            &["act:obey_order", "act:barricade", "act:command"],
        ),
        goal(
            "goal:truth",
            GoalCategory::Truth,
            &["act:investigate", "act:confess"],
        ),
        goal(
            "goal:change",
            GoalCategory::Change,
            &["act:incite", "act:sabotage", "act:refuse_order"],
        ),
        goal(
            "goal:care",
            GoalCategory::Care,
            &["act:treat_wounded", "act:comfort", "act:help"],
        ),
    ]
}

pub fn starter_action_catalog() -> Result<ActionCatalog> {
    ActionCatalog::from_actions(starter_actions())
}

pub fn starter_goal_catalog() -> Result<GoalCatalog> {
    GoalCatalog::from_goals(starter_goals())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FactState;

    #[test]
    fn fallback_is_inserted_when_missing() {
        let catalog = ActionCatalog::from_actions(vec![action("act:wave")]).expect("catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.fallback().action_id, FALLBACK_ACTION_ID);
        assert!(catalog.fallback().fallback);
    }

    #[test]
    fn host_fallback_is_kept() {
        let custom = ActionDef {
            fallback: true,
            ..action("act:wait")
        };
        let catalog =
            ActionCatalog::from_actions(vec![action("act:wave"), custom]).expect("catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.fallback().action_id, "act:wait");
    }

    #[test]
    fn duplicate_action_and_goal_ids_are_rejected() {
        let err = ActionCatalog::from_actions(vec![action("act:x"), action("act:x")])
            .expect_err("duplicate action");
        assert!(matches!(err, CognitionError::DuplicateId { kind: "action", .. }));

        let mut goals = starter_goals();
        goals.push(goals[0].clone());
        let err = GoalCatalog::from_goals(goals).expect_err("duplicate goal");
        assert!(matches!(err, CognitionError::DuplicateId { kind: "goal", .. }));
    }

    #[test]
    fn gates_check_facts_and_roles() {
        let catalog = starter_action_catalog().expect("catalog");
        let mut world = WorldContext::default();
        let barricade = catalog.get("act:barricade").expect("barricade");
        let command = catalog.get("act:command").expect("command");

        assert!(!is_hard_available(barricade, "npc:a", &world));
        world.facts.insert(
            "fact:tools_found".to_string(),
            FactState {
                confidence: 1.0,
                established_tick: 0,
            },
        );
        assert!(is_hard_available(barricade, "npc:a", &world));

        assert!(!is_hard_available(command, "npc:a", &world));
        world.roles.insert("npc:a".to_string(), "leader".to_string());
        assert!(is_hard_available(command, "npc:a", &world));
        assert!(is_hard_available(catalog.fallback(), "npc:z", &world));
    }

    #[test]
    fn phase_gate_restricts_to_listed_phases() {
        let gated = ActionDef {
            gates: ActionGates {
                phases: strings(&["night"]),
                ..ActionGates::default()
            },
            ..action("act:sneak")
        };
        let mut world = WorldContext::default();
        assert!(!is_hard_available(&gated, "npc:a", &world));
        world.phase = "night".to_string();
        assert!(is_hard_available(&gated, "npc:a", &world));
    }

    #[test]
    fn starter_goals_only_allow_known_actions() {
        let actions = starter_action_catalog().expect("actions");
        for goal in starter_goal_catalog().expect("goals").goals() {
            for action_id in &goal.allowed_actions {
                assert!(actions.get(action_id).is_some(), "{action_id}");
            }
        }
    }
}
