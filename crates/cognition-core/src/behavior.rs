//! Behavior profiles: how an archetype leans when choosing actions.

use std::collections::BTreeMap;

use contracts::{
    ActionTag, ArchetypePrototype, Axis, BehaviorMode, GoalCategory, IdentityPhase,
    IdentityState,
};

use crate::archetype::ArchetypeCatalog;

const GOAL_CATEGORIES: [GoalCategory; 7] = [
    GoalCategory::Survival,
    GoalCategory::Affiliation,
    GoalCategory::Status,
    GoalCategory::Order,
    GoalCategory::Truth,
    GoalCategory::Change,
    GoalCategory::Care,
];

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorProfile {
    pub goal_weights: BTreeMap<GoalCategory, f64>,
    /// Multiplier on norm-violation penalties.
    pub norm_penalty: f64,
    /// Per-tag multiplier around 1.0.
    pub tag_preferences: BTreeMap<ActionTag, f64>,
    /// In `[-1, 1]`.
    pub risk_attitude: f64,
    pub horizon: f64,
}

impl BehaviorProfile {
    /// Lookup-miss default: no preference anywhere.
    pub fn neutral() -> Self {
        Self {
            goal_weights: GOAL_CATEGORIES.iter().map(|category| (*category, 1.0)).collect(),
            norm_penalty: 1.0,
            tag_preferences: ActionTag::ALL.iter().map(|tag| (*tag, 1.0)).collect(),
            risk_attitude: 0.0,
            horizon: 1.0,
        }
    }

    pub fn for_prototype(prototype: &ArchetypePrototype) -> Self {
        let m = |axis: Axis| prototype.metrics.get(axis);
        let agency = m(Axis::Agency);
        let accept = m(Axis::Accept);
        let action = m(Axis::Action);
        let radical = m(Axis::Radical);
        let scope = m(Axis::Scope);
        let truth = m(Axis::Truth);
        let care = m(Axis::Care);
        let manip = m(Axis::Manip);
        let formal = m(Axis::Formal);

        let mut tag_preferences = BTreeMap::from([
            (ActionTag::Support, 0.5 + care),
            (ActionTag::Harm, 0.5 + 0.6 * manip + 0.4 * radical - 0.5 * care),
            (ActionTag::Betrayal, 0.4 + manip - 0.4 * truth),
            (ActionTag::Hierarchical, 0.5 + 0.5 * formal + 0.3 * agency),
            (ActionTag::Comply, 0.5 + accept),
            (ActionTag::Refuse, 0.5 + 0.6 * radical + 0.4 * agency - 0.3 * accept),
            (ActionTag::Withdraw, 1.5 - action),
            (ActionTag::Confront, 0.5 + 0.5 * action + 0.5 * radical),
            (ActionTag::Care, 0.5 + care),
            (ActionTag::Deceive, 0.5 + manip - 0.3 * truth),
            (ActionTag::Disclose, 0.5 + truth),
            (ActionTag::Lead, 0.4 + 0.6 * agency + 0.3 * scope),
            (ActionTag::Explore, 0.5 + scope),
            (ActionTag::Formal, 0.5 + formal),
            (ActionTag::Radical, 0.4 + radical),
            (ActionTag::Rest, 1.2 - 0.5 * action),
            (ActionTag::Therapeutic, 0.6 + 0.4 * care),
            (ActionTag::Assert, 0.5 + agency),
        ]);

        let boosted: &[ActionTag] = match prototype.mode {
            BehaviorMode::SelfRadical => &[ActionTag::Radical, ActionTag::Confront],
            BehaviorMode::ObjectiveRadical => &[ActionTag::Radical, ActionTag::Lead],
            BehaviorMode::StabilizingNorm => &[ActionTag::Comply, ActionTag::Formal],
            BehaviorMode::ObjectiveNorm => &[ActionTag::Formal, ActionTag::Disclose],
        };
        for tag in boosted {
            if let Some(value) = tag_preferences.get_mut(tag) {
                *value *= 1.2;
            }
        }
        for value in tag_preferences.values_mut() {
            *value = value.clamp(0.1, 2.0);
        }

        let goal_weights = BTreeMap::from([
            (GoalCategory::Survival, 0.8 + 0.2 * formal),
            (GoalCategory::Affiliation, 0.5 + 0.5 * accept + 0.3 * care),
            (GoalCategory::Status, 0.5 + 0.5 * agency + 0.3 * manip),
            (GoalCategory::Order, 0.5 + 0.7 * formal),
            (GoalCategory::Truth, 0.5 + 0.7 * truth),
            (GoalCategory::Change, 0.5 + 0.7 * radical),
            (GoalCategory::Care, 0.5 + 0.7 * care),
        ]);

        Self {
            goal_weights,
            norm_penalty: (0.5 + 0.6 * formal + 0.4 * accept - 0.5 * radical).max(0.1),
            tag_preferences,
            risk_attitude: ((radical + action) / 2.0 - (formal + accept) / 2.0).clamp(-1.0, 1.0),
            horizon: (0.5 + 0.7 * scope + 0.3 * formal - 0.3 * action).clamp(0.2, 2.0),
        }
    }

    /// Profile of the actual identity blended with the shadow by activation,
    /// then bent by the identity phase.
    pub fn for_identity(identity: &IdentityState, catalog: &ArchetypeCatalog) -> Self {
        let mut profile = catalog
            .lookup(&identity.actual_id)
            .map_or_else(Self::neutral, Self::for_prototype);

        if let Some(shadow) = identity
            .shadow_id
            .as_deref()
            .and_then(|shadow_id| catalog.lookup(shadow_id))
        {
            let scale = if identity.phase == IdentityPhase::Radical {
                0.8
            } else {
                0.5
            };
            let weight = (identity.shadow_activation * scale).clamp(0.0, 1.0);
            profile = profile.blend(&Self::for_prototype(shadow), weight);
        }

        match identity.phase {
            IdentityPhase::Normal => {}
            IdentityPhase::Strain => profile.horizon *= 0.85,
            IdentityPhase::Break => {
                profile.horizon *= 0.6;
                profile.norm_penalty *= 0.7;
            }
            IdentityPhase::Radical => {
                profile.norm_penalty *= 0.5;
                profile.risk_attitude = (profile.risk_attitude + 0.3).clamp(-1.0, 1.0);
            }
            IdentityPhase::Post => {
                profile.horizon *= 0.8;
                profile.risk_attitude = (profile.risk_attitude - 0.2).clamp(-1.0, 1.0);
            }
        }
        profile
    }

    /// `(1-w)·self + w·other`, field by field.
    pub fn blend(&self, other: &Self, weight: f64) -> Self {
        let w = weight.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| (1.0 - w) * a + w * b;
        Self {
            goal_weights: blend_table(&self.goal_weights, &other.goal_weights, w),
            norm_penalty: mix(self.norm_penalty, other.norm_penalty),
            tag_preferences: blend_table(&self.tag_preferences, &other.tag_preferences, w),
            risk_attitude: mix(self.risk_attitude, other.risk_attitude),
            horizon: mix(self.horizon, other.horizon),
        }
    }

    pub fn tag_preference(&self, tag: ActionTag) -> f64 {
        self.tag_preferences.get(&tag).copied().unwrap_or(1.0)
    }

    /// Mean preference across an action's tags; 1.0 for untagged actions.
    pub fn action_preference(&self, tags: &[ActionTag]) -> f64 {
        if tags.is_empty() {
            return 1.0;
        }
        tags.iter().map(|tag| self.tag_preference(*tag)).sum::<f64>() / tags.len() as f64
    }

    pub fn goal_weight(&self, category: GoalCategory) -> f64 {
        self.goal_weights.get(&category).copied().unwrap_or(1.0)
    }
}

/// Profiles one decision reads: the phase-adjusted blend for the rational
/// terms, and the unblended actual and shadow profiles for the archetype drive.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityProfiles {
    pub blended: BehaviorProfile,
    pub actual: BehaviorProfile,
    pub shadow: Option<BehaviorProfile>,
}

impl IdentityProfiles {
    pub fn for_identity(identity: &IdentityState, catalog: &ArchetypeCatalog) -> Self {
        Self {
            blended: BehaviorProfile::for_identity(identity, catalog),
            actual: catalog
                .get(&identity.actual_id)
                .map_or_else(BehaviorProfile::neutral, BehaviorProfile::for_prototype),
            shadow: identity
                .shadow_id
                .as_deref()
                .and_then(|shadow_id| catalog.get(shadow_id))
                .map(BehaviorProfile::for_prototype),
        }
    }
}

fn blend_table<K: Ord + Copy>(
    ours: &BTreeMap<K, f64>,
    theirs: &BTreeMap<K, f64>,
    weight: f64,
) -> BTreeMap<K, f64> {
    ours.iter()
        .map(|(key, value)| {
            let other = theirs.get(key).copied().unwrap_or(1.0);
            (*key, (1.0 - weight) * value + weight * other)
        })
        .collect()
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self::neutral()
    }
}
