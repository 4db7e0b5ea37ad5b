//! Perceived self vector: the true vector bent by distortion, trauma and
//! moral dissonance through a per-axis rule table.

use std::collections::BTreeMap;

use contracts::{Axis, AxisVector, BiographyLatent, TraumaLoad};
use serde::{Deserialize, Serialize};

use crate::distortion::DistortionProfile;
use crate::numeric::clip01;

/// Inputs a self-image rule can read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DistortionFactor {
    TrustBias,
    ThreatBias,
    SelfBlame,
    ControlIllusion,
    BlackWhite,
    Catastrophizing,
    DiscountPositive,
    Personalization,
    MindReading,
    DistortionLoad,
    Avoidance,
    HyperControl,
    Aggression,
    SelfHarm,
    Helper,
    TraumaSelf,
    TraumaOthers,
    TraumaWorld,
    TraumaSystem,
    MoralDissonance,
    BetrayalExposure,
}

impl DistortionFactor {
    pub fn label(self) -> &'static str {
        match self {
            DistortionFactor::TrustBias => "trust_bias",
            DistortionFactor::ThreatBias => "threat_bias",
            DistortionFactor::SelfBlame => "self_blame",
            DistortionFactor::ControlIllusion => "control_illusion",
            DistortionFactor::BlackWhite => "black_white",
            DistortionFactor::Catastrophizing => "catastrophizing",
            DistortionFactor::DiscountPositive => "discount_positive",
            DistortionFactor::Personalization => "personalization",
            DistortionFactor::MindReading => "mind_reading",
            DistortionFactor::DistortionLoad => "distortion_load",
            DistortionFactor::Avoidance => "avoidance",
            DistortionFactor::HyperControl => "hyper_control",
            DistortionFactor::Aggression => "aggression",
            DistortionFactor::SelfHarm => "self_harm",
            DistortionFactor::Helper => "helper",
            DistortionFactor::TraumaSelf => "trauma_self",
            DistortionFactor::TraumaOthers => "trauma_others",
            DistortionFactor::TraumaWorld => "trauma_world",
            DistortionFactor::TraumaSystem => "trauma_system",
            DistortionFactor::MoralDissonance => "moral_dissonance",
            DistortionFactor::BetrayalExposure => "betrayal_exposure",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeightedFactor {
    pub factor: DistortionFactor,
    pub weight: f64,
}

/// One step of an axis' rule chain. Rules run in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AxisRule {
    /// `v · exp(-k · clamp01(Σ weight·factor))`.
    Crush { k: f64, sources: Vec<WeightedFactor> },
    /// `v ← 1 - v` when any trigger exceeds the threshold.
    Flip {
        triggers: Vec<DistortionFactor>,
        threshold: f64,
    },
    /// `v + c · Π factors` when the product exceeds `min`.
    Boost {
        c: f64,
        factors: Vec<DistortionFactor>,
        min: f64,
    },
}

fn crush(k: f64, sources: &[(DistortionFactor, f64)]) -> AxisRule {
    AxisRule::Crush {
        k,
        sources: sources
            .iter()
            .map(|(factor, weight)| WeightedFactor {
                factor: *factor,
                weight: *weight,
            })
            .collect(),
    }
}

fn boost(c: f64, factors: &[DistortionFactor], min: f64) -> AxisRule {
    AxisRule::Boost {
        c,
        factors: factors.to_vec(),
        min,
    }
}

pub fn default_self_rules() -> BTreeMap<Axis, Vec<AxisRule>> {
    use DistortionFactor::*;
    BTreeMap::from([
        (
            Axis::Agency,
            vec![crush(
                2.5,
                &[
                    (SelfBlame, 0.5),
                    (TraumaSelf, 0.5),
                    (DiscountPositive, 0.25),
                    (MoralDissonance, 0.2),
                ],
            )],
        ),
        (
            Axis::Accept,
            vec![
                crush(1.5, &[(TrustBias, 0.5), (TraumaOthers, 0.4)]),
                boost(0.2, &[Personalization], 0.4),
            ],
        ),
        (
            Axis::Action,
            vec![
                crush(1.2, &[(Avoidance, 0.5), (Catastrophizing, 0.3)]),
                boost(0.3, &[Aggression], 0.5),
            ],
        ),
        (
            Axis::Radical,
            vec![boost(0.6, &[BlackWhite, TraumaSystem], 0.15)],
        ),
        (
            Axis::Scope,
            vec![
                crush(1.0, &[(Catastrophizing, 0.4), (TraumaWorld, 0.4)]),
                boost(0.25, &[ControlIllusion], 0.5),
            ],
        ),
        (
            Axis::Truth,
            vec![
                crush(
                    1.5,
                    &[(MindReading, 0.3), (ThreatBias, 0.3), (DistortionLoad, 0.4)],
                ),
                AxisRule::Flip {
                    triggers: vec![ThreatBias, BetrayalExposure],
                    threshold: 0.6,
                },
            ],
        ),
        (
            Axis::Care,
            vec![
                crush(1.2, &[(TraumaOthers, 0.4), (Aggression, 0.3)]),
                boost(0.3, &[Helper], 0.5),
            ],
        ),
        (
            Axis::Manip,
            vec![
                boost(0.25, &[TrustBias], 0.5),
                boost(0.2, &[MoralDissonance], 0.3),
            ],
        ),
        (
            Axis::Formal,
            vec![
                boost(0.3, &[HyperControl], 0.5),
                crush(1.0, &[(TraumaSystem, 0.5)]),
            ],
        ),
    ])
}

/// Everything the self-image rules read. Optional inputs default to values
/// that make their rules inert.
#[derive(Debug, Clone, Copy)]
pub struct SelfImageInputs<'a> {
    pub distortion: &'a DistortionProfile,
    pub trauma: Option<&'a TraumaLoad>,
    pub moral_dissonance: Option<f64>,
    pub biography: Option<&'a BiographyLatent>,
}

impl<'a> SelfImageInputs<'a> {
    pub fn new(distortion: &'a DistortionProfile) -> Self {
        Self {
            distortion,
            trauma: None,
            moral_dissonance: None,
            biography: None,
        }
    }

    pub fn factor(&self, factor: DistortionFactor) -> f64 {
        let d = self.distortion;
        let trauma = |pick: fn(&TraumaLoad) -> f64| self.trauma.map_or(0.0, pick);
        let value = match factor {
            DistortionFactor::TrustBias => d.trust_bias,
            DistortionFactor::ThreatBias => d.threat_bias,
            DistortionFactor::SelfBlame => d.self_blame,
            DistortionFactor::ControlIllusion => d.control_illusion,
            DistortionFactor::BlackWhite => d.black_white,
            DistortionFactor::Catastrophizing => d.catastrophizing,
            DistortionFactor::DiscountPositive => d.discount_positive,
            DistortionFactor::Personalization => d.personalization,
            DistortionFactor::MindReading => d.mind_reading,
            DistortionFactor::DistortionLoad => d.load(),
            DistortionFactor::Avoidance => d.coping.avoidance,
            DistortionFactor::HyperControl => d.coping.hyper_control,
            DistortionFactor::Aggression => d.coping.aggression,
            DistortionFactor::SelfHarm => d.coping.self_harm,
            DistortionFactor::Helper => d.coping.helper,
            DistortionFactor::TraumaSelf => trauma(|load| load.self_image),
            DistortionFactor::TraumaOthers => trauma(|load| load.others),
            DistortionFactor::TraumaWorld => trauma(|load| load.world),
            DistortionFactor::TraumaSystem => trauma(|load| load.system),
            DistortionFactor::MoralDissonance => self.moral_dissonance.unwrap_or(0.0),
            DistortionFactor::BetrayalExposure => {
                self.biography.map_or(0.0, |biography| biography.betrayal)
            }
        };
        clip01(value)
    }
}

/// Apply the rule table to the true vector. Returns the perceived vector and
/// the audit trail of rules that fired.
pub fn self_vector(
    true_vector: &AxisVector,
    inputs: &SelfImageInputs<'_>,
    rules: &BTreeMap<Axis, Vec<AxisRule>>,
    report_below: f64,
) -> (AxisVector, Vec<String>) {
    let mut perceived = *true_vector;
    let mut explanations = Vec::new();

    for axis in Axis::ALL {
        let mut value = clip01(true_vector.get(axis));
        for rule in rules.get(&axis).map(Vec::as_slice).unwrap_or_default() {
            match rule {
                AxisRule::Crush { k, sources } => {
                    let pressure = clip01(
                        sources
                            .iter()
                            .map(|source| source.weight * inputs.factor(source.factor))
                            .sum::<f64>(),
                    );
                    let multiplier = (-k * pressure).exp();
                    if multiplier.is_finite() {
                        value *= multiplier;
                    }
                    if multiplier < report_below {
                        let named = sources
                            .iter()
                            .filter(|source| inputs.factor(source.factor) > 0.0)
                            .map(|source| source.factor.label())
                            .collect::<Vec<_>>()
                            .join(",");
                        explanations.push(format!("{axis} crushed x{multiplier:.2} by {named}"));
                    }
                }
                AxisRule::Flip {
                    triggers,
                    threshold,
                } => {
                    let fired = triggers
                        .iter()
                        .map(|factor| (*factor, inputs.factor(*factor)))
                        .find(|(_, level)| level > threshold);
                    if let Some((factor, level)) = fired {
                        value = 1.0 - value;
                        explanations
                            .push(format!("{axis} flipped by {} {level:.2}", factor.label()));
                    }
                }
                AxisRule::Boost { c, factors, min } => {
                    let level = factors
                        .iter()
                        .map(|factor| inputs.factor(*factor))
                        .product::<f64>();
                    if !factors.is_empty() && level > *min {
                        let delta = c * level;
                        value += delta;
                        explanations.push(format!("{axis} boosted +{delta:.2}"));
                    }
                }
            }
            value = clip01(value);
        }
        perceived.set(axis, value);
    }

    (perceived, explanations)
}
