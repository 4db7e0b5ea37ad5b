//! Actual / self / shadow identity triad and its once-per-tick refresh.

use std::collections::BTreeMap;

use contracts::{
    AxisVector, BiographyLatent, IdentityPhase, IdentityState, StructuralLayer, TraitParams,
    TraumaLoad,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::archetype::catalog::ArchetypeCatalog;
use crate::archetype::metrics::true_vector;
use crate::archetype::phase::{shadow_activation, update_phase, PhaseSignals};
use crate::archetype::self_image::{self_vector, SelfImageInputs};
use crate::config::{ArchetypeTuning, CognitionConfig};
use crate::distortion::DistortionProfile;
use crate::numeric::{clip01, normalize_map, sample_cumulative, softmax};

/// Similarity of `vector` to every prototype, in catalog order.
pub fn prototype_similarities(
    vector: &AxisVector,
    catalog: &ArchetypeCatalog,
) -> Vec<(String, f64)> {
    catalog
        .iter()
        .map(|prototype| (prototype.id.clone(), prototype.metrics.similarity(vector)))
        .collect()
}

/// Softmax over similarity plus reinforcement bonus. Empty for an empty
/// catalog.
pub fn mixture(
    vector: &AxisVector,
    catalog: &ArchetypeCatalog,
    reinforcement: &BTreeMap<String, u32>,
    tuning: &ArchetypeTuning,
) -> BTreeMap<String, f64> {
    let sims = prototype_similarities(vector, catalog);
    let scores = sims
        .iter()
        .map(|(id, sim)| {
            let count = reinforcement
                .get(id)
                .copied()
                .unwrap_or(0)
                .min(tuning.reinforcement_cap);
            sim + tuning.reinforcement_bonus * f64::from(count)
        })
        .collect::<Vec<_>>();
    let probabilities = softmax(&scores, 1.0 / tuning.mixture_beta, 1e-12);
    sims.into_iter()
        .map(|(id, _)| id)
        .zip(probabilities)
        .collect()
}

/// `(1-η)·old + η·fresh`, renormalized. Keys unknown to `fresh` drop out.
pub fn smooth_mixture(
    old: &BTreeMap<String, f64>,
    fresh: &BTreeMap<String, f64>,
    inertia: f64,
) -> BTreeMap<String, f64> {
    if old.is_empty() {
        return fresh.clone();
    }
    let eta = clip01(inertia);
    let mut blended = fresh
        .iter()
        .map(|(id, weight)| {
            let previous = old.get(id).copied().unwrap_or(0.0);
            (id.clone(), (1.0 - eta) * previous + eta * weight)
        })
        .collect::<BTreeMap<_, _>>();
    if !normalize_map(&mut blended) {
        return fresh.clone();
    }
    blended
}

/// Best shadow candidate: similar enough to be plausible, far enough from
/// the true vector to be in conflict with it.
pub fn select_shadow(
    actual_id: &str,
    self_id: &str,
    sims: &[(String, f64)],
    true_vector: &AxisVector,
    catalog: &ArchetypeCatalog,
    tuning: &ArchetypeTuning,
) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for (id, sim) in sims {
        if id == actual_id || id == self_id || *sim < tuning.shadow_min_similarity {
            continue;
        }
        let Some(prototype) = catalog.get(id) else {
            continue;
        };
        let conflict = prototype.metrics.mean_abs_diff(true_vector);
        if conflict < tuning.shadow_min_conflict {
            continue;
        }
        let mut bias = 1.0;
        if prototype.mode.is_radical() {
            bias *= tuning.radical_kind_bias;
        }
        if prototype.layer == StructuralLayer::Other {
            bias *= tuning.other_layer_bias;
        }
        let score = sim * conflict * bias;
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((id.as_str(), score)),
        }
    }
    best.map(|(id, _)| id.to_string())
}

/// How livable the actual identity is: fit to the true vector and to the
/// perceived self.
pub fn viability(
    actual_metrics: &AxisVector,
    true_vector: &AxisVector,
    self_vector: &AxisVector,
) -> f64 {
    clip01(
        0.6 * actual_metrics.similarity(true_vector)
            + 0.4 * (1.0 - actual_metrics.mean_abs_diff(self_vector)),
    )
}

/// Everything one identity refresh reads.
#[derive(Debug, Clone, Copy)]
pub struct IdentityInputs<'a> {
    pub agent_id: &'a str,
    pub traits: &'a TraitParams,
    pub distortion: &'a DistortionProfile,
    pub trauma: &'a TraumaLoad,
    pub biography: &'a BiographyLatent,
    pub moral_dissonance: f64,
    pub stress: f64,
    pub stability: f64,
    pub epistemic_stress: f64,
    pub integration: f64,
    pub reinforcement: &'a BTreeMap<String, u32>,
}

/// Recompute the identity triad in place. The perception stream supplies
/// the draw for the self identity.
pub fn refresh_identity(
    state: &mut IdentityState,
    inputs: &IdentityInputs<'_>,
    catalog: &ArchetypeCatalog,
    config: &CognitionConfig,
    perception: &mut ChaCha8Rng,
) {
    let tuning = &config.archetype;

    let truth = true_vector(inputs.traits, &tuning.axis_weights);
    let image_inputs = SelfImageInputs {
        distortion: inputs.distortion,
        trauma: Some(inputs.trauma),
        moral_dissonance: Some(inputs.moral_dissonance),
        biography: Some(inputs.biography),
    };
    let (perceived, explanations) =
        self_vector(&truth, &image_inputs, &tuning.self_rules, tuning.crush_report_below);
    state.true_vector = truth;
    state.self_vector = perceived;
    state.explanations = explanations;

    let Some(actual) = catalog.closest_prototype(&truth, None) else {
        debug!(agent_id = inputs.agent_id, "empty prototype catalog, identity left unformed");
        return;
    };
    state.actual_id = actual.id.clone();

    let perceived_mix = mixture(&perceived, catalog, inputs.reinforcement, tuning);
    let ids = perceived_mix.keys().cloned().collect::<Vec<_>>();
    let weights = perceived_mix.values().copied().collect::<Vec<_>>();
    let draw = perception.gen::<f64>();
    state.self_id = sample_cumulative(&weights, draw)
        .and_then(|idx| ids.get(idx).cloned())
        .unwrap_or_else(|| actual.id.clone());

    let actual_mix = mixture(&truth, catalog, inputs.reinforcement, tuning);
    state.mixture = smooth_mixture(&state.mixture, &actual_mix, tuning.mixture_inertia);

    state.viability = viability(&actual.metrics, &truth, &perceived);

    let sims = prototype_similarities(&truth, catalog);
    let shadow = select_shadow(&state.actual_id, &state.self_id, &sims, &truth, catalog, tuning);
    if shadow != state.shadow_id {
        info!(
            agent_id = inputs.agent_id,
            from = state.shadow_id.as_deref().unwrap_or("none"),
            to = shadow.as_deref().unwrap_or("none"),
            "shadow changed"
        );
    }
    state.shadow_id = shadow;

    let structural_conflict = catalog
        .get(&state.self_id)
        .map_or(0.0, |self_proto| actual.metrics.mean_abs_diff(&self_proto.metrics));
    let mut signals = PhaseSignals {
        stress: clip01(inputs.stress),
        stability: clip01(inputs.stability),
        viability: state.viability,
        epistemic_stress: clip01(inputs.epistemic_stress),
        trauma_max: inputs.trauma.max_domain(),
        shadow_activation: 0.0,
        integration: clip01(inputs.integration),
    };
    state.shadow_activation = shadow_activation(
        &signals,
        structural_conflict,
        state.shadow_id.is_some(),
        tuning,
    );
    signals.shadow_activation = state.shadow_activation;

    let next = update_phase(state.phase, &signals, &config.phase);
    if next != state.phase {
        info!(
            agent_id = inputs.agent_id,
            from = %state.phase,
            to = %next,
            "identity phase transition"
        );
        state.phase = next;
    }
}

/// Phases in which the shadow side may act out.
pub fn is_acting_out(phase: IdentityPhase) -> bool {
    matches!(phase, IdentityPhase::Break | IdentityPhase::Radical)
}
