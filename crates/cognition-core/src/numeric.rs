//! Numeric guards shared by every formula boundary.

use std::collections::BTreeMap;

/// Clamp to `[0, 1]`; non-finite input becomes 0.
pub fn clip01(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Replace NaN / ±inf with 0.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Softmax of `values / temperature`. A temperature at or below `epsilon`
/// collapses to a one-hot on the first maximum.
pub fn softmax(values: &[f64], temperature: f64, epsilon: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let values = values.iter().copied().map(finite_or_zero).collect::<Vec<_>>();

    if !(temperature > epsilon) {
        let mut best = 0;
        for (idx, value) in values.iter().enumerate() {
            if *value > values[best] {
                best = idx;
            }
        }
        let mut out = vec![0.0; values.len()];
        out[best] = 1.0;
        return out;
    }

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps = values
        .iter()
        .map(|value| ((value - max) / temperature).exp())
        .collect::<Vec<_>>();
    let total = exps.iter().sum::<f64>();
    if !(total.is_finite() && total > 0.0) {
        let uniform = 1.0 / values.len() as f64;
        return vec![uniform; values.len()];
    }
    exps.into_iter().map(|value| value / total).collect()
}

/// Cumulative sampling with a uniform draw in `[0, 1)`. Falls back to the
/// last entry with positive mass when rounding leaves the draw uncovered.
pub fn sample_cumulative(probabilities: &[f64], draw: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (idx, probability) in probabilities.iter().enumerate() {
        if *probability <= 0.0 {
            continue;
        }
        cumulative += probability;
        last_positive = Some(idx);
        if draw < cumulative {
            return Some(idx);
        }
    }
    last_positive
}

/// Scale non-negative weights so they sum to 1. Returns false (and leaves the
/// map alone) when there is no mass to scale.
pub fn normalize_map(weights: &mut BTreeMap<String, f64>) -> bool {
    let total = weights.values().map(|weight| weight.max(0.0)).sum::<f64>();
    if !(total > 1e-12) {
        return false;
    }
    for weight in weights.values_mut() {
        *weight = weight.max(0.0) / total;
    }
    true
}
