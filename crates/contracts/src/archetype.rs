//! Archetype prototypes, the 9-axis metric space and per-agent identity state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metric axes
// ---------------------------------------------------------------------------

/// One of the nine archetype metric axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Axis {
    Agency,
    Accept,
    Action,
    Radical,
    Scope,
    Truth,
    Care,
    Manip,
    Formal,
}

impl Axis {
    pub const ALL: [Axis; 9] = [
        Axis::Agency,
        Axis::Accept,
        Axis::Action,
        Axis::Radical,
        Axis::Scope,
        Axis::Truth,
        Axis::Care,
        Axis::Manip,
        Axis::Formal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Axis::Agency => "AGENCY",
            Axis::Accept => "ACCEPT",
            Axis::Action => "ACTION",
            Axis::Radical => "RADICAL",
            Axis::Scope => "SCOPE",
            Axis::Truth => "TRUTH",
            Axis::Care => "CARE",
            Axis::Manip => "MANIP",
            Axis::Formal => "FORMAL",
        };
        f.write_str(label)
    }
}

/// A point in the 9-axis archetype metric space. Values are kept in `[0, 1]`
/// by every constructor in the cognition core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AxisVector(pub [f64; 9]);

impl AxisVector {
    pub fn splat(value: f64) -> Self {
        Self([value; 9])
    }

    pub fn get(&self, axis: Axis) -> f64 {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        self.0[axis.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL.iter().map(move |axis| (*axis, self.get(*axis)))
    }

    /// Euclidean distance.
    pub fn distance(&self, other: &AxisVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Mean absolute difference, the "conflict" between two identities.
    pub fn mean_abs_diff(&self, other: &AxisVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .sum::<f64>()
            / 9.0
    }

    /// Mean of `1 - |a - b|` across axes.
    pub fn similarity(&self, other: &AxisVector) -> f64 {
        1.0 - self.mean_abs_diff(other)
    }
}

// ---------------------------------------------------------------------------
// Prototype catalog entries
// ---------------------------------------------------------------------------

/// Structural layer λ of a prototype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StructuralLayer {
    Dominant,
    Objective,
    Other,
}

/// Behavioral mode μ of a prototype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorMode {
    SelfRadical,
    ObjectiveRadical,
    StabilizingNorm,
    ObjectiveNorm,
}

impl BehaviorMode {
    pub fn is_radical(self) -> bool {
        matches!(self, BehaviorMode::SelfRadical | BehaviorMode::ObjectiveRadical)
    }
}

/// A static archetype prototype from the external catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchetypePrototype {
    pub id: String,
    pub layer: StructuralLayer,
    /// Function slot f: selects a domain/sub-function bias.
    pub function: u8,
    pub mode: BehaviorMode,
    pub metrics: AxisVector,
}

// ---------------------------------------------------------------------------
// Identity state
// ---------------------------------------------------------------------------

/// Identity stress phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPhase {
    #[default]
    Normal,
    Strain,
    Break,
    Radical,
    Post,
}

impl IdentityPhase {
    /// Whether `self → next` is an edge of the phase table (or a self-loop).
    pub fn can_transition_to(self, next: IdentityPhase) -> bool {
        use IdentityPhase::*;
        self == next
            || matches!(
                (self, next),
                (Normal, Strain)
                    | (Strain, Normal)
                    | (Strain, Break)
                    | (Break, Radical)
                    | (Break, Post)
                    | (Radical, Post)
                    | (Post, Normal)
            )
    }
}

impl fmt::Display for IdentityPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdentityPhase::Normal => "normal",
            IdentityPhase::Strain => "strain",
            IdentityPhase::Break => "break",
            IdentityPhase::Radical => "radical",
            IdentityPhase::Post => "post",
        };
        f.write_str(label)
    }
}

/// Per-agent actual / self / shadow identity triad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityState {
    pub actual_id: String,
    pub self_id: String,
    pub shadow_id: Option<String>,
    /// Categorical distribution over the prototype catalog.
    pub mixture: BTreeMap<String, f64>,
    pub shadow_activation: f64,
    pub phase: IdentityPhase,
    pub viability: f64,
    pub true_vector: AxisVector,
    pub self_vector: AxisVector,
    /// Audit trail of the self-vector distortion rules that fired.
    #[serde(default)]
    pub explanations: Vec<String>,
}

impl IdentityState {
    /// Identity before the first refresh: everything neutral, empty mixture.
    pub fn unformed() -> Self {
        Self {
            actual_id: String::new(),
            self_id: String::new(),
            shadow_id: None,
            mixture: BTreeMap::new(),
            shadow_activation: 0.0,
            phase: IdentityPhase::Normal,
            viability: 1.0,
            true_vector: AxisVector::splat(0.5),
            self_vector: AxisVector::splat(0.5),
            explanations: Vec::new(),
        }
    }
}

impl Default for IdentityState {
    fn default() -> Self {
        Self::unformed()
    }
}
