//! Seeded Monte-Carlo repetitions. Each run owns its state outright; results
//! are only combined once every run has finished.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// One finished repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleRun<T> {
    pub seed: u64,
    pub output: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleRunner {
    threads: usize,
}

impl Default for EnsembleRunner {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

impl EnsembleRunner {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `job` once per seed. Output order follows `seeds`, whatever the
    /// thread count.
    pub fn run<T, F>(&self, seeds: &[u64], job: F) -> Result<Vec<EnsembleRun<T>>>
    where
        T: Send,
        F: Fn(u64) -> T + Sync,
    {
        let workloads = seeds.iter().copied().enumerate().collect::<Vec<_>>();

        let mut runs = if self.threads <= 1 || workloads.len() <= 1 {
            workloads
                .into_iter()
                .map(|(index, seed)| (index, EnsembleRun { seed, output: job(seed) }))
                .collect::<Vec<_>>()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()?;
            pool.install(|| {
                workloads
                    .into_par_iter()
                    .map(|(index, seed)| (index, EnsembleRun { seed, output: job(seed) }))
                    .collect::<Vec<_>>()
            })
        };
        runs.sort_by_key(|(index, _)| *index);
        debug!(runs = runs.len(), threads = self.threads, "ensemble complete");
        Ok(runs.into_iter().map(|(_, run)| run).collect())
    }
}

/// Distribution summary of one scalar metric across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub count: usize,
    pub mean: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    /// Mean of the worst (lowest) `tail` fraction of runs.
    pub cvar: f64,
    pub tail: f64,
}

impl EnsembleSummary {
    /// `None` when no finite value is present. Non-finite values are dropped.
    pub fn from_values(values: &[f64], tail: f64) -> Option<Self> {
        let mut sorted = values.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let tail = if tail.is_finite() { tail.clamp(0.0, 1.0) } else { 0.05 };
        let tail_len = ((tail * count as f64).ceil() as usize).clamp(1, count);
        let cvar = sorted[..tail_len].iter().sum::<f64>() / tail_len as f64;

        Some(Self {
            count,
            mean: sorted.iter().sum::<f64>() / count as f64,
            p5: percentile(&sorted, 0.05),
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            cvar,
            tail,
        })
    }
}

/// Linear interpolation between closest ranks over an ascending slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn job(seed: u64) -> f64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..100).map(|_| rng.gen::<f64>()).sum()
    }

    #[test]
    fn parallel_runs_match_sequential_runs_in_seed_order() {
        let seeds = (0..16).rev().collect::<Vec<u64>>();
        let sequential = EnsembleRunner::new(1).run(&seeds, job).expect("sequential");
        let parallel = EnsembleRunner::new(4).run(&seeds, job).expect("parallel");
        assert_eq!(sequential, parallel);
        let order = parallel.iter().map(|run| run.seed).collect::<Vec<_>>();
        assert_eq!(order, seeds);
    }

    #[test]
    fn summary_of_one_to_hundred() {
        let values = (1..=100).map(f64::from).collect::<Vec<_>>();
        let summary = EnsembleSummary::from_values(&values, 0.1).expect("summary");
        assert_eq!(summary.count, 100);
        assert!((summary.mean - 50.5).abs() < 1e-12);
        assert!((summary.p50 - 50.5).abs() < 1e-12);
        assert!((summary.p5 - 5.95).abs() < 1e-9);
        assert!((summary.p95 - 95.05).abs() < 1e-9);
        assert!((summary.cvar - 5.5).abs() < 1e-12);
    }

    #[test]
    fn summary_ignores_non_finite_values() {
        assert!(EnsembleSummary::from_values(&[], 0.05).is_none());
        assert!(EnsembleSummary::from_values(&[f64::NAN], 0.05).is_none());
        let summary =
            EnsembleSummary::from_values(&[2.0, f64::INFINITY, 4.0], 0.0).expect("summary");
        assert_eq!(summary.count, 2);
        assert_eq!(summary.cvar, 2.0);
        assert_eq!(summary.p50, 3.0);
    }
}
