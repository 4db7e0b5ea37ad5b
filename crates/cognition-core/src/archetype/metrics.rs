//! True personality vector: a linear read of the trait parameters.

use std::collections::BTreeMap;

use contracts::{Axis, AxisVector, TraitKey, TraitParams};
use serde::{Deserialize, Serialize};

use crate::numeric::clip01;

/// `clip01(bias + Σ weight·trait)` for one axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AxisWeights {
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub terms: BTreeMap<TraitKey, f64>,
}

impl AxisWeights {
    fn new(bias: f64, terms: &[(TraitKey, f64)]) -> Self {
        Self {
            bias,
            terms: terms.iter().copied().collect(),
        }
    }

    pub fn evaluate(&self, traits: &TraitParams) -> f64 {
        let sum = self
            .terms
            .iter()
            .map(|(key, weight)| weight * traits.value(*key))
            .sum::<f64>();
        clip01(self.bias + sum)
    }
}

pub fn default_axis_weights() -> BTreeMap<Axis, AxisWeights> {
    use TraitKey::*;
    BTreeMap::from([
        (
            Axis::Agency,
            AxisWeights::new(
                0.1,
                &[(Assertiveness, 0.45), (Ambition, 0.25), (Conscientiousness, 0.2)],
            ),
        ),
        (
            Axis::Accept,
            AxisWeights::new(
                0.0,
                &[(Conformity, 0.4), (Agreeableness, 0.3), (TrustPropensity, 0.2)],
            ),
        ),
        (
            Axis::Action,
            AxisWeights::new(
                0.05,
                &[(Impulsivity, 0.4), (Assertiveness, 0.3), (RiskTolerance, 0.2)],
            ),
        ),
        (
            Axis::Radical,
            AxisWeights::new(
                0.0,
                &[(Openness, 0.35), (RiskTolerance, 0.35), (Conformity, -0.3)],
            ),
        ),
        (
            Axis::Scope,
            AxisWeights::new(0.1, &[(Openness, 0.4), (Ambition, 0.4)]),
        ),
        (
            Axis::Truth,
            AxisWeights::new(
                0.1,
                &[(Honesty, 0.6), (Conscientiousness, 0.2), (Machiavellianism, -0.2)],
            ),
        ),
        (
            Axis::Care,
            AxisWeights::new(0.05, &[(Empathy, 0.6), (Agreeableness, 0.3)]),
        ),
        (
            Axis::Manip,
            AxisWeights::new(
                0.0,
                &[(Machiavellianism, 0.6), (Ambition, 0.2), (Honesty, -0.2)],
            ),
        ),
        (
            Axis::Formal,
            AxisWeights::new(0.05, &[(Conscientiousness, 0.45), (Conformity, 0.35)]),
        ),
    ])
}

/// Axes missing from the table read as 0.5.
pub fn true_vector(traits: &TraitParams, weights: &BTreeMap<Axis, AxisWeights>) -> AxisVector {
    let mut vector = AxisVector::splat(0.5);
    for axis in Axis::ALL {
        if let Some(table) = weights.get(&axis) {
            vector.set(axis, table.evaluate(traits));
        }
    }
    vector
}
