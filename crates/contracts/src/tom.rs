//! Theory-of-mind belief entries (one observer's model of one target).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Believed traits of another agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TraitBelief {
    Trust,
    Bond,
    Align,
    Dominance,
    Competence,
    Reliability,
    Obedience,
    Conflict,
    Fear,
    Respect,
}

impl TraitBelief {
    pub const ALL: [TraitBelief; 10] = [
        TraitBelief::Trust,
        TraitBelief::Bond,
        TraitBelief::Align,
        TraitBelief::Dominance,
        TraitBelief::Competence,
        TraitBelief::Reliability,
        TraitBelief::Obedience,
        TraitBelief::Conflict,
        TraitBelief::Fear,
        TraitBelief::Respect,
    ];
}

/// Trait-belief vector, each value in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TraitBeliefs {
    pub trust: f64,
    pub bond: f64,
    pub align: f64,
    pub dominance: f64,
    pub competence: f64,
    pub reliability: f64,
    pub obedience: f64,
    pub conflict: f64,
    pub fear: f64,
    pub respect: f64,
}

impl TraitBeliefs {
    pub fn neutral() -> Self {
        Self {
            trust: 0.5,
            bond: 0.5,
            align: 0.5,
            dominance: 0.5,
            competence: 0.5,
            reliability: 0.5,
            obedience: 0.5,
            conflict: 0.5,
            fear: 0.5,
            respect: 0.5,
        }
    }

    pub fn get(&self, belief: TraitBelief) -> f64 {
        match belief {
            TraitBelief::Trust => self.trust,
            TraitBelief::Bond => self.bond,
            TraitBelief::Align => self.align,
            TraitBelief::Dominance => self.dominance,
            TraitBelief::Competence => self.competence,
            TraitBelief::Reliability => self.reliability,
            TraitBelief::Obedience => self.obedience,
            TraitBelief::Conflict => self.conflict,
            TraitBelief::Fear => self.fear,
            TraitBelief::Respect => self.respect,
        }
    }

    pub fn get_mut(&mut self, belief: TraitBelief) -> &mut f64 {
        match belief {
            TraitBelief::Trust => &mut self.trust,
            TraitBelief::Bond => &mut self.bond,
            TraitBelief::Align => &mut self.align,
            TraitBelief::Dominance => &mut self.dominance,
            TraitBelief::Competence => &mut self.competence,
            TraitBelief::Reliability => &mut self.reliability,
            TraitBelief::Obedience => &mut self.obedience,
            TraitBelief::Conflict => &mut self.conflict,
            TraitBelief::Fear => &mut self.fear,
            TraitBelief::Respect => &mut self.respect,
        }
    }
}

impl Default for TraitBeliefs {
    fn default() -> Self {
        Self::neutral()
    }
}

/// What one observer believes about one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomEntry {
    pub target_id: String,
    /// Goal id → belief weight; non-negative, sums to 1.
    pub goal_beliefs: BTreeMap<String, f64>,
    pub traits: TraitBeliefs,
    pub goal_uncertainty: f64,
    pub trait_uncertainty: f64,
    /// Number of observations folded in. Never decreases.
    pub evidence: u64,
    pub misreads: u64,
    pub correct_reads: u64,
    pub last_tick: Option<u64>,
}

impl TomEntry {
    pub fn uncertainty(&self) -> f64 {
        (self.goal_uncertainty + self.trait_uncertainty) / 2.0
    }

    /// Goal with the strictly highest belief weight. `None` when the top
    /// weight is shared, as in a uniform prior.
    pub fn most_believed_goal(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        let mut tied = false;
        for (goal_id, weight) in &self.goal_beliefs {
            match best {
                Some((_, current)) if (*weight - current).abs() <= 1e-12 => tied = true,
                Some((_, current)) if *weight < current => {}
                _ => {
                    best = Some((goal_id.as_str(), *weight));
                    tied = false;
                }
            }
        }
        if tied {
            None
        } else {
            best.map(|(goal_id, _)| goal_id)
        }
    }
}
