//! Agent cognition contract types.
//!
//! Data models exchanged between the cognition core and its collaborators:
//! trait parameters, physiological quick states and latents, goal ecologies,
//! the action and goal catalogs, domain events, and decision outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// 1.1 — Traits, quick state, latents
// ---------------------------------------------------------------------------

/// Named trait parameters, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TraitKey {
    Assertiveness,
    Ambition,
    Conscientiousness,
    Conformity,
    Agreeableness,
    Impulsivity,
    RiskTolerance,
    Openness,
    Honesty,
    Empathy,
    Machiavellianism,
    Paranoia,
    Neuroticism,
    TrustPropensity,
}

/// Personality trait parameters in `[0, 1]`. `conformity` doubles as the
/// obedience trait for order compliance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TraitParams {
    pub assertiveness: f64,
    pub ambition: f64,
    pub conscientiousness: f64,
    pub conformity: f64,
    pub agreeableness: f64,
    pub impulsivity: f64,
    pub risk_tolerance: f64,
    pub openness: f64,
    pub honesty: f64,
    pub empathy: f64,
    pub machiavellianism: f64,
    pub paranoia: f64,
    pub neuroticism: f64,
    pub trust_propensity: f64,
}

impl TraitParams {
    pub fn value(&self, key: TraitKey) -> f64 {
        match key {
            TraitKey::Assertiveness => self.assertiveness,
            TraitKey::Ambition => self.ambition,
            TraitKey::Conscientiousness => self.conscientiousness,
            TraitKey::Conformity => self.conformity,
            TraitKey::Agreeableness => self.agreeableness,
            TraitKey::Impulsivity => self.impulsivity,
            TraitKey::RiskTolerance => self.risk_tolerance,
            TraitKey::Openness => self.openness,
            TraitKey::Honesty => self.honesty,
            TraitKey::Empathy => self.empathy,
            TraitKey::Machiavellianism => self.machiavellianism,
            TraitKey::Paranoia => self.paranoia,
            TraitKey::Neuroticism => self.neuroticism,
            TraitKey::TrustPropensity => self.trust_propensity,
        }
    }
}

impl Default for TraitParams {
    fn default() -> Self {
        Self {
            assertiveness: 0.5,
            ambition: 0.5,
            conscientiousness: 0.5,
            conformity: 0.5,
            agreeableness: 0.5,
            impulsivity: 0.5,
            risk_tolerance: 0.5,
            openness: 0.5,
            honesty: 0.5,
            empathy: 0.5,
            machiavellianism: 0.5,
            paranoia: 0.5,
            neuroticism: 0.5,
            trust_propensity: 0.5,
        }
    }
}

/// Fast-moving physiological scalars from the stability subsystem, in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuickState {
    pub stress: f64,
    pub fatigue: f64,
    pub health: f64,
    pub arousal: f64,
    pub stability: f64,
}

impl Default for QuickState {
    fn default() -> Self {
        Self {
            stress: 0.2,
            fatigue: 0.2,
            health: 1.0,
            arousal: 0.3,
            stability: 0.8,
        }
    }
}

/// Slow worldview latents, in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Worldview {
    pub benevolence: f64,
    pub people_trust: f64,
    pub controllability: f64,
    pub fairness: f64,
}

impl Default for Worldview {
    fn default() -> Self {
        Self {
            benevolence: 0.6,
            people_trust: 0.6,
            controllability: 0.6,
            fairness: 0.6,
        }
    }
}

// ---------------------------------------------------------------------------
// 1.2 — Trauma and biography inputs
// ---------------------------------------------------------------------------

/// One of the four trauma domains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TraumaDomain {
    #[serde(rename = "self")]
    SelfImage,
    Others,
    World,
    System,
}

/// Per-domain trauma scalars in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TraumaLoad {
    #[serde(rename = "self")]
    pub self_image: f64,
    pub others: f64,
    pub world: f64,
    pub system: f64,
}

impl TraumaLoad {
    pub fn get(&self, domain: TraumaDomain) -> f64 {
        match domain {
            TraumaDomain::SelfImage => self.self_image,
            TraumaDomain::Others => self.others,
            TraumaDomain::World => self.world,
            TraumaDomain::System => self.system,
        }
    }

    pub fn get_mut(&mut self, domain: TraumaDomain) -> &mut f64 {
        match domain {
            TraumaDomain::SelfImage => &mut self.self_image,
            TraumaDomain::Others => &mut self.others,
            TraumaDomain::World => &mut self.world,
            TraumaDomain::System => &mut self.system,
        }
    }

    pub fn max_domain(&self) -> f64 {
        self.self_image
            .max(self.others)
            .max(self.world)
            .max(self.system)
    }
}

/// Kinds of life events folded into the trauma ledger and biography.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LifeEventKind {
    Betrayal,
    Loss,
    Humiliation,
    Violence,
    Achievement,
    Care,
    Upheaval,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifeEvent {
    pub kind: LifeEventKind,
    /// Severity in `[0, 1]`.
    pub severity: f64,
    pub tick: u64,
}

/// Running biography summary in `[0, 1]` per facet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BiographyLatent {
    pub betrayal: f64,
    pub loss: f64,
    pub humiliation: f64,
    pub violence: f64,
    pub achievement: f64,
    pub care_received: f64,
    pub instability: f64,
    /// Total trauma mass ever accumulated.
    pub accumulated: f64,
    /// Total trauma mass removed by processing.
    pub processed: f64,
}

// ---------------------------------------------------------------------------
// 1.3 — Goals
// ---------------------------------------------------------------------------

/// Category of a goal, used by behavior-profile goal weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Survival,
    Affiliation,
    Status,
    Order,
    Truth,
    Change,
    Care,
}

/// A goal from the external goal catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalDef {
    pub goal_id: String,
    pub category: GoalCategory,
    /// Actions an agent pursuing this goal would plausibly take.
    #[serde(default)]
    pub allowed_actions: Vec<String>,
}

/// Personalized goal entry produced by the goal-ecology generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalGoal {
    pub goal_id: String,
    pub priority: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// The two shapes a goal list arrives in, resolved once at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "goals", rename_all = "snake_case")]
pub enum GoalEcology {
    /// Per-agent prioritized list from the goal-ecology generator.
    Personalized(Vec<PersonalGoal>),
    /// Generic goal-id → weight table, scaled by the behavior profile.
    Legacy(BTreeMap<String, f64>),
}

impl Default for GoalEcology {
    fn default() -> Self {
        GoalEcology::Legacy(BTreeMap::new())
    }
}

// ---------------------------------------------------------------------------
// 1.4 — Action catalog entries
// ---------------------------------------------------------------------------

/// Tags describing what an action is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    Support,
    Harm,
    Betrayal,
    Hierarchical,
    Comply,
    Refuse,
    Withdraw,
    Confront,
    Care,
    Deceive,
    Disclose,
    Lead,
    Explore,
    Formal,
    Radical,
    Rest,
    Therapeutic,
    Assert,
}

impl ActionTag {
    pub const ALL: [ActionTag; 18] = [
        ActionTag::Support,
        ActionTag::Harm,
        ActionTag::Betrayal,
        ActionTag::Hierarchical,
        ActionTag::Comply,
        ActionTag::Refuse,
        ActionTag::Withdraw,
        ActionTag::Confront,
        ActionTag::Care,
        ActionTag::Deceive,
        ActionTag::Disclose,
        ActionTag::Lead,
        ActionTag::Explore,
        ActionTag::Formal,
        ActionTag::Radical,
        ActionTag::Rest,
        ActionTag::Therapeutic,
        ActionTag::Assert,
    ];
}

/// Whether an action is aimed at another agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Targeting {
    #[default]
    None,
    OtherAgent,
}

/// Hard availability gates. Empty lists impose no constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ActionGates {
    /// Scene phases in which the action is legal.
    pub phases: Vec<String>,
    /// Location tags that must all be present.
    pub location_tags: Vec<String>,
    /// Facts that must be established (the action's prerequisites).
    pub required_facts: Vec<String>,
    pub required_commitments: Vec<String>,
    /// Roles allowed to perform the action.
    pub roles: Vec<String>,
}

/// An action from the external action catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDef {
    pub action_id: String,
    #[serde(default)]
    pub tags: Vec<ActionTag>,
    #[serde(default)]
    pub base_cost: f64,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub risky: bool,
    #[serde(default)]
    pub gates: ActionGates,
    /// Facts whose absence only lowers the scenario utility.
    #[serde(default)]
    pub soft_facts: Vec<String>,
    /// Facts this action establishes when executed.
    #[serde(default)]
    pub satisfies_facts: Vec<String>,
    /// Fact this action (re-)asserts; used for the saturation penalty.
    #[serde(default)]
    pub asserts_fact: Option<String>,
    /// Action → goal impact table.
    #[serde(default)]
    pub goal_impacts: BTreeMap<String, f64>,
    /// Bonus keyed by scene phase.
    #[serde(default)]
    pub phase_bonus: BTreeMap<String, f64>,
    /// World counter that must be positive for the action to make physical sense.
    #[serde(default)]
    pub requires_counter: Option<String>,
    /// Scene roles this action fits.
    #[serde(default)]
    pub role_affinity: Vec<String>,
    /// Role that must perform it to avoid the non-specialist penalty.
    #[serde(default)]
    pub specialist_role: Option<String>,
    /// Universal no-op; always available.
    #[serde(default)]
    pub fallback: bool,
}

impl ActionDef {
    pub fn has_tag(&self, tag: ActionTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn goal_impact(&self, goal_id: &str) -> f64 {
        self.goal_impacts.get(goal_id).copied().unwrap_or(0.0)
    }

    /// Actions that hurt whoever they target.
    pub fn is_harmful(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| matches!(tag, ActionTag::Harm | ActionTag::Betrayal | ActionTag::Deceive))
    }
}

// ---------------------------------------------------------------------------
// 1.5 — Domain events
// ---------------------------------------------------------------------------

/// Something an agent did, as emitted by the external action executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainEvent {
    pub actor_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    pub action_id: String,
    #[serde(default)]
    pub tags: Vec<ActionTag>,
    /// Signed outcome in `[-1, 1]`.
    pub success: f64,
    /// Magnitude in `[0, 1]`.
    pub intensity: f64,
    pub tick: u64,
}

impl DomainEvent {
    pub fn has_tag(&self, tag: ActionTag) -> bool {
        self.tags.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// 1.6 — Decision outputs
// ---------------------------------------------------------------------------

/// The action an agent intends to perform this tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionIntention {
    pub agent_id: String,
    pub action_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, Value>,
    pub tick: u64,
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Next step of an already-active plan.
    Plan,
    /// First step of a plan built this tick.
    Replan,
    /// First step of an accepted shared or assigned plan.
    SharedPlan,
    /// Q-value scoring and softmax sampling.
    Reactive,
}

/// Named utility terms of the Q-value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UtilityTerm {
    Goal,
    Scenario,
    Relational,
    Procedural,
    Risk,
    Psychological,
    RoleFit,
    Cost,
    Repetition,
    Stagnation,
    Saturation,
}

/// Score breakdown for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateScore {
    pub action_id: String,
    pub target_id: Option<String>,
    /// Raw (unclamped, unweighted) term values; penalties are positive here.
    pub raw_terms: BTreeMap<UtilityTerm, f64>,
    /// Clamped and weighted contribution; penalties carry a negative sign.
    pub weighted_terms: BTreeMap<UtilityTerm, f64>,
    pub rational_total: f64,
    pub archetype_drive: f64,
    pub final_score: f64,
    pub probability: f64,
}

/// Full explanation of a decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub source: DecisionSource,
    pub alpha: f64,
    pub temperature: f64,
    pub candidates: Vec<CandidateScore>,
    pub chosen_index: Option<usize>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl ScoreBreakdown {
    pub fn for_plan(source: DecisionSource, plan_id: &str) -> Self {
        Self {
            source,
            alpha: 0.0,
            temperature: 0.0,
            candidates: Vec::new(),
            chosen_index: None,
            plan_id: Some(plan_id.to_string()),
            notes: Vec::new(),
        }
    }

    pub fn probability_mass(&self) -> f64 {
        self.candidates.iter().map(|entry| entry.probability).sum()
    }
}
