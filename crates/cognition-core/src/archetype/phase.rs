//! Identity phase state machine and shadow activation.

use contracts::IdentityPhase;

use crate::config::{ArchetypeTuning, PhaseThresholds};
use crate::numeric::{clip01, logistic};

/// Per-tick inputs to the phase machine, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSignals {
    pub stress: f64,
    pub stability: f64,
    pub viability: f64,
    pub epistemic_stress: f64,
    pub trauma_max: f64,
    pub shadow_activation: f64,
    pub integration: f64,
}

impl PhaseSignals {
    /// Mean of low stability, trauma, stress and low viability.
    pub fn crisis(&self) -> f64 {
        clip01(
            0.25 * (1.0 - clip01(self.stability))
                + 0.25 * clip01(self.trauma_max)
                + 0.25 * clip01(self.stress)
                + 0.25 * (1.0 - clip01(self.viability)),
        )
    }
}

/// At most one hop along the phase table.
pub fn update_phase(
    current: IdentityPhase,
    signals: &PhaseSignals,
    thresholds: &PhaseThresholds,
) -> IdentityPhase {
    let s = signals;
    let t = thresholds;
    match current {
        IdentityPhase::Normal => {
            if s.stress > t.strain_stress
                || s.viability < t.strain_viability
                || s.epistemic_stress > t.strain_epistemic
                || s.trauma_max > t.strain_trauma
            {
                IdentityPhase::Strain
            } else {
                IdentityPhase::Normal
            }
        }
        IdentityPhase::Strain => {
            if s.stress > t.break_stress
                || s.viability < t.break_viability
                || s.trauma_max > t.break_trauma
            {
                IdentityPhase::Break
            } else if s.stress < t.recover_stress
                && s.viability > t.recover_viability
                && s.epistemic_stress < t.recover_epistemic
                && s.trauma_max < t.recover_trauma
            {
                IdentityPhase::Normal
            } else {
                IdentityPhase::Strain
            }
        }
        IdentityPhase::Break => {
            if s.shadow_activation > t.radical_shadow {
                IdentityPhase::Radical
            } else if s.trauma_max > t.post_trauma && s.stress < t.post_stress {
                IdentityPhase::Post
            } else {
                IdentityPhase::Break
            }
        }
        IdentityPhase::Radical => {
            if s.shadow_activation < t.settle_shadow {
                IdentityPhase::Post
            } else {
                IdentityPhase::Radical
            }
        }
        IdentityPhase::Post => {
            if s.integration > t.normal_integration && s.stress < t.normal_stress {
                IdentityPhase::Normal
            } else {
                IdentityPhase::Post
            }
        }
    }
}

/// Logistic of crisis plus structural actual/self conflict. Zero without a
/// shadow candidate.
pub fn shadow_activation(
    signals: &PhaseSignals,
    conflict: f64,
    has_shadow: bool,
    tuning: &ArchetypeTuning,
) -> f64 {
    if !has_shadow {
        return 0.0;
    }
    let drive = signals.crisis() + 0.5 * clip01(conflict) - tuning.shadow_midpoint;
    clip01(logistic(tuning.shadow_gain * drive))
}
