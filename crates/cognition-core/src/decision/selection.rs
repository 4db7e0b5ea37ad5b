use contracts::CandidateScore;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::decision::candidates::Candidate;
use crate::decision::utility::{archetype_drive, raw_terms, weigh, ScoringContext};
use crate::numeric::{finite_or_zero, sample_cumulative, softmax};

/// Score every candidate: rational total from the weighted terms, then the
/// System 1 / System 2 blend with the archetype drive.
pub fn score_candidates(
    ctx: &ScoringContext<'_>,
    candidates: &[Candidate<'_>],
    alpha: f64,
    tension: f64,
) -> Vec<CandidateScore> {
    candidates
        .iter()
        .map(|candidate| {
            let raw = raw_terms(ctx, candidate);
            let (weighted, rational_total) = weigh(&raw, ctx.tuning);
            let drive = archetype_drive(ctx, candidate.action, tension);
            let impulsive = drive * ctx.tuning.drive_multiplier + rational_total;
            let final_score = finite_or_zero((1.0 - alpha) * rational_total + alpha * impulsive);
            CandidateScore {
                action_id: candidate.action.action_id.clone(),
                target_id: candidate.target_id.clone(),
                raw_terms: raw,
                weighted_terms: weighted,
                rational_total,
                archetype_drive: drive,
                final_score,
                probability: 0.0,
            }
        })
        .collect()
}

/// Fill in softmax probabilities and sample one index from the decision
/// stream. One draw is consumed even when the choice is forced.
pub fn select(
    scores: &mut [CandidateScore],
    temperature: f64,
    epsilon: f64,
    rng: &mut ChaCha8Rng,
) -> Option<usize> {
    let finals = scores.iter().map(|score| score.final_score).collect::<Vec<_>>();
    let probabilities = softmax(&finals, temperature, epsilon);
    for (score, probability) in scores.iter_mut().zip(&probabilities) {
        score.probability = *probability;
    }
    let draw = rng.gen::<f64>();
    sample_cumulative(&probabilities, draw)
}
