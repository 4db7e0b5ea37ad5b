//! Theory-of-mind belief engine.
//!
//! Each agent owns one [`TomStore`]; the owner is the observer of every entry
//! in it. Beliefs change only through [`TomStore::observe`] and are read back
//! through the distortion lens of [`TomStore::view`].

use std::collections::BTreeMap;

use contracts::{ActionTag, DomainEvent, GoalDef, TomEntry, TraitBelief, TraitBeliefs};

use crate::config::TomTuning;
use crate::distortion::DistortionProfile;
use crate::numeric::{clip01, finite_or_zero, normalize_map};

/// Evidence features extracted from one event.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EventFeatures {
    support: f64,
    harm: f64,
    betrayal: f64,
    hierarchical: f64,
    success: f64,
}

impl EventFeatures {
    fn from_event(event: &DomainEvent) -> Self {
        let flag = |present: bool| if present { 1.0 } else { 0.0 };
        Self {
            support: flag(event.has_tag(ActionTag::Support) || event.has_tag(ActionTag::Care)),
            harm: flag(event.has_tag(ActionTag::Harm)),
            betrayal: flag(event.has_tag(ActionTag::Betrayal)),
            hierarchical: flag(event.has_tag(ActionTag::Hierarchical)),
            success: finite_or_zero(event.success).clamp(-1.0, 1.0),
        }
    }

    /// Fixed linear model: signed evidence for one trait belief.
    fn evidence_for(&self, belief: TraitBelief) -> f64 {
        let f = self;
        match belief {
            TraitBelief::Trust => {
                0.6 * f.support - 0.5 * f.harm - 0.9 * f.betrayal + 0.1 * f.success
            }
            TraitBelief::Bond => 0.5 * f.support - 0.4 * f.harm - 0.6 * f.betrayal,
            TraitBelief::Align => 0.3 * f.support - 0.3 * f.harm + 0.2 * f.success,
            TraitBelief::Dominance => 0.3 * f.harm + 0.5 * f.hierarchical,
            TraitBelief::Competence => 0.6 * f.success,
            TraitBelief::Reliability => 0.3 * f.success - 0.8 * f.betrayal + 0.2 * f.support,
            TraitBelief::Obedience => 0.4 * f.hierarchical - 0.3 * f.betrayal,
            TraitBelief::Conflict => 0.6 * f.harm + 0.4 * f.betrayal - 0.3 * f.support,
            TraitBelief::Fear => 0.5 * f.harm + 0.2 * f.hierarchical,
            TraitBelief::Respect => 0.3 * f.success + 0.2 * f.hierarchical - 0.3 * f.betrayal,
        }
    }
}

/// Perceived read of one target, after the observer's distortions.
#[derive(Debug, Clone, PartialEq)]
pub struct TomView {
    pub target_id: String,
    pub traits: TraitBeliefs,
    pub uncertainty: f64,
    /// False when the observer has no entry for the target yet.
    pub known: bool,
}

impl TomView {
    pub fn betrayal_risk(&self) -> f64 {
        clip01(
            0.5 * (1.0 - self.traits.trust)
                + 0.3 * self.traits.conflict
                + 0.2 * (1.0 - self.traits.reliability),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomStore {
    entries: BTreeMap<String, TomEntry>,
}

impl TomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target_id: &str) -> Option<&TomEntry> {
        self.entries.get(target_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `target_id`, created with uninformed priors if missing.
    pub fn entry_mut(&mut self, target_id: &str, goals: &[GoalDef]) -> &mut TomEntry {
        self.entries
            .entry(target_id.to_string())
            .or_insert_with(|| prior_entry(target_id, goals))
    }

    /// Fold one observed event about `event.actor_id` into the beliefs.
    pub fn observe(&mut self, event: &DomainEvent, goals: &[GoalDef], tuning: &TomTuning) {
        let entry = self.entry_mut(&event.actor_id, goals);
        update_goals(entry, event, goals, tuning);
        update_traits(entry, event, tuning);
        entry.evidence += 1;
        entry.last_tick = Some(event.tick);
    }

    /// Distorted read of the stored beliefs. Never mutates.
    pub fn view(&self, target_id: &str, lens: &DistortionProfile) -> TomView {
        let (traits, uncertainty, known) = match self.entries.get(target_id) {
            Some(entry) => (entry.traits, entry.uncertainty(), true),
            None => (TraitBeliefs::neutral(), 1.0, false),
        };

        let mut seen = traits;
        seen.trust = clip01(traits.trust * (1.0 - 0.5 * lens.trust_bias));
        seen.conflict =
            clip01(traits.conflict + 0.3 * lens.threat_bias + 0.2 * lens.mind_reading);
        seen.align = clip01(traits.align + (traits.align - 0.5) * 0.8 * lens.black_white);
        if seen.trust > 0.6 {
            seen.bond = clip01(traits.bond + 0.3 * lens.personalization * (1.0 - traits.bond));
        }
        seen.fear = clip01(traits.fear + 0.25 * lens.catastrophizing);

        TomView {
            target_id: target_id.to_string(),
            traits: seen,
            uncertainty,
            known,
        }
    }

    /// Share of goal predictions that went wrong, with a +2 prior in the
    /// denominator.
    pub fn epistemic_stress(&self) -> f64 {
        let (misreads, correct) = self.entries.values().fold((0u64, 0u64), |acc, entry| {
            (acc.0 + entry.misreads, acc.1 + entry.correct_reads)
        });
        misreads as f64 / (misreads + correct + 2) as f64
    }
}

fn prior_entry(target_id: &str, goals: &[GoalDef]) -> TomEntry {
    let uniform = if goals.is_empty() {
        0.0
    } else {
        1.0 / goals.len() as f64
    };
    TomEntry {
        target_id: target_id.to_string(),
        goal_beliefs: goals
            .iter()
            .map(|goal| (goal.goal_id.clone(), uniform))
            .collect(),
        traits: TraitBeliefs::neutral(),
        goal_uncertainty: 1.0,
        trait_uncertainty: 1.0,
        evidence: 0,
        misreads: 0,
        correct_reads: 0,
        last_tick: None,
    }
}

fn next_uncertainty(current: f64, change: f64, tuning: &TomTuning) -> f64 {
    let surprise = (tuning.uncertainty_scale * change).min(1.0);
    clip01(tuning.uncertainty_decay * current + tuning.uncertainty_gain * surprise)
}

/// Score the prediction (when there is one), then reinforce every goal that
/// allows the action.
pub fn update_goals(
    entry: &mut TomEntry,
    event: &DomainEvent,
    goals: &[GoalDef],
    tuning: &TomTuning,
) {
    let allows = |goal_id: &str| {
        goals
            .iter()
            .find(|goal| goal.goal_id == goal_id)
            .is_some_and(|goal| goal.allowed_actions.iter().any(|id| *id == event.action_id))
    };

    // Fresh entries hold only the prior and make no prediction.
    let prediction = if entry.evidence == 0 {
        None
    } else {
        entry.most_believed_goal().map(allows)
    };
    match prediction {
        Some(true) => entry.correct_reads += 1,
        Some(false) => entry.misreads += 1,
        None => {}
    }

    let step = tuning.goal_learning_rate * clip01(event.intensity);
    let success = finite_or_zero(event.success).clamp(-1.0, 1.0);
    let before = entry.goal_beliefs.clone();
    for (goal_id, weight) in entry.goal_beliefs.iter_mut() {
        if allows(goal_id.as_str()) {
            *weight = clip01(*weight + step * success);
        }
    }
    if !normalize_map(&mut entry.goal_beliefs) {
        entry.goal_beliefs = before.clone();
    }

    let change = entry
        .goal_beliefs
        .iter()
        .map(|(goal_id, weight)| (weight - before.get(goal_id).copied().unwrap_or(0.0)).abs())
        .sum::<f64>();
    entry.goal_uncertainty = next_uncertainty(entry.goal_uncertainty, change, tuning);
}

pub fn update_traits(entry: &mut TomEntry, event: &DomainEvent, tuning: &TomTuning) {
    let features = EventFeatures::from_event(event);
    let rate = tuning.trait_base_rate * clip01(event.intensity);
    let mut change = 0.0;
    for belief in TraitBelief::ALL {
        let value = entry.traits.get_mut(belief);
        let next = clip01(*value + rate * features.evidence_for(belief));
        change += (next - *value).abs();
        *value = next;
    }
    entry.trait_uncertainty = next_uncertainty(entry.trait_uncertainty, change, tuning);
}
