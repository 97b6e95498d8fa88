//! Split-wise Inception Score aggregation over class probability vectors.
//!
//! The probabilities are cut into `num_splits` contiguous splits of
//! `floor(n / num_splits)` vectors; the trailing `n mod num_splits` vectors
//! are left out of every split. Each split scores
//! `exp(mean_x KL(p(y|x) || p(y)))` where `p(y)` is the split's mean vector.
//!
//! A zero entry in `p(y|x)` contributes nothing to the divergence. A zero
//! entry in `p(y)` paired with a non-zero `p(y|x)` is not special-cased.

use std::fmt;

use tracing::warn;

use crate::error::ScoreError;

/// One softmax output per image.
pub type ClassProbabilities = Vec<f32>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreResult {
    pub mean: f64,
    pub std: f64,
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} ± {:.4}", self.mean, self.std)
    }
}

/// Number of vectors that end up in some split.
pub fn scored_count(n: usize, num_splits: usize) -> usize {
    if num_splits == 0 {
        return 0;
    }
    num_splits * (n / num_splits)
}

/// Score of each split, in order.
pub fn split_scores(probs: &[ClassProbabilities], num_splits: usize) -> Result<Vec<f64>, ScoreError> {
    if num_splits == 0 {
        return Err(ScoreError::InvalidInput("num_splits must be at least 1".into()));
    }
    if num_splits > probs.len() {
        return Err(ScoreError::InvalidInput(format!(
            "num_splits ({}) exceeds the number of probability vectors ({})",
            num_splits,
            probs.len()
        )));
    }

    let num_classes = probs[0].len();
    if num_classes == 0 || probs.iter().any(|p| p.len() != num_classes) {
        return Err(ScoreError::InvalidInput(
            "probability vectors must be non-empty and of equal length".into(),
        ));
    }

    let split_size = probs.len() / num_splits;
    let dropped = probs.len() - scored_count(probs.len(), num_splits);
    if dropped > 0 {
        warn!(
            "{} trailing vectors are not a multiple of {} splits and are excluded",
            dropped, num_splits
        );
    }

    Ok(probs
        .chunks_exact(split_size)
        .take(num_splits)
        .map(|split| split_score(split, num_classes))
        .collect())
}

/// Mean and population standard deviation of the split scores.
pub fn score_probabilities(probs: &[ClassProbabilities], num_splits: usize) -> Result<ScoreResult, ScoreError> {
    let scores = split_scores(probs, num_splits)?;
    let (mean, std) = mean_std(&scores);
    Ok(ScoreResult { mean, std })
}

fn split_score(split: &[ClassProbabilities], num_classes: usize) -> f64 {
    let marginal = marginal(split, num_classes);
    let mean_kl = split
        .iter()
        .map(|pyx| kl_divergence(pyx, &marginal))
        .sum::<f64>()
        / split.len() as f64;
    mean_kl.exp()
}

fn marginal(split: &[ClassProbabilities], num_classes: usize) -> Vec<f64> {
    let mut py = vec![0.0f64; num_classes];
    for pyx in split {
        for (acc, &p) in py.iter_mut().zip(pyx) {
            *acc += p as f64;
        }
    }
    let n = split.len() as f64;
    py.iter_mut().for_each(|p| *p /= n);
    py
}

fn kl_divergence(pyx: &[f32], py: &[f64]) -> f64 {
    pyx.iter()
        .zip(py)
        .map(|(&p, &q)| {
            if p == 0.0 {
                0.0
            } else {
                let p = p as f64;
                p * (p / q).ln()
            }
        })
        .sum()
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn one_hot(class: usize) -> ClassProbabilities {
        let mut p = vec![0.0; 10];
        p[class] = 1.0;
        p
    }

    fn normalise(raw: Vec<f32>) -> ClassProbabilities {
        let sum: f32 = raw.iter().sum();
        raw.into_iter().map(|x| x / sum).collect()
    }

    #[test]
    fn identical_vectors_score_exactly_one() {
        let p = vec![0.5, 0.25, 0.125, 0.125, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let probs = vec![p; 40];
        let result = score_probabilities(&probs, 4).unwrap();
        assert_eq!(result, ScoreResult { mean: 1.0, std: 0.0 });
    }

    #[test]
    fn confident_and_balanced_reaches_class_count() {
        // Each split holds every class once with full confidence: exp(ln 10) = 10
        let probs: Vec<_> = (0..50).map(|i| one_hot(i % 10)).collect();
        let result = score_probabilities(&probs, 5).unwrap();
        assert!((result.mean - 10.0).abs() < 1e-9);
        assert!(result.std.abs() < 1e-9);
    }

    #[test]
    fn trailing_vectors_are_ignored() {
        let mut probs: Vec<_> = (0..20).map(|i| one_hot(i % 2)).collect();
        let reference = split_scores(&probs, 3).unwrap();

        // 20 = 3 * 6 + 2; the last two vectors never reach a split
        probs[18] = one_hot(7);
        probs[19] = one_hot(9);
        assert_eq!(split_scores(&probs, 3).unwrap(), reference);
        assert_eq!(scored_count(20, 3), 18);

        probs[17] = one_hot(7);
        assert_ne!(split_scores(&probs, 3).unwrap(), reference);
    }

    #[test]
    fn splits_are_contiguous() {
        // First split all class 0, second split alternating: scores 1 and 2
        let mut probs: Vec<_> = (0..4).map(|_| one_hot(0)).collect();
        probs.extend((0..4).map(|i| one_hot(i % 2)));
        let scores = split_scores(&probs, 2).unwrap();
        assert_eq!(scores[0], 1.0);
        assert!((scores[1] - 2.0).abs() < 1e-12);

        let result = score_probabilities(&probs, 2).unwrap();
        assert!((result.mean - 1.5).abs() < 1e-12);
        assert!((result.std - 0.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_split_counts() {
        let probs = vec![one_hot(0); 3];
        assert!(split_scores(&probs, 0).unwrap_err().is_invalid_input());
        assert!(split_scores(&probs, 4).unwrap_err().is_invalid_input());
        assert!(split_scores(&[], 1).unwrap_err().is_invalid_input());
    }

    #[test]
    fn ragged_vectors_are_rejected() {
        let probs = vec![one_hot(0), vec![1.0; 3]];
        assert!(split_scores(&probs, 1).unwrap_err().is_invalid_input());
    }

    #[test]
    fn display_shows_mean_and_std() {
        let result = ScoreResult { mean: 9.5, std: 0.25 };
        assert_eq!(result.to_string(), "9.5000 ± 0.2500");
    }

    fn prob_vectors(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<ClassProbabilities>> {
        vec(vec(0.001f32..1.0, 10).prop_map(normalise), len)
    }

    proptest! {
        #[test]
        fn prop_split_scores_at_least_one(
            probs in prob_vectors(10..80),
            num_splits in 1usize..10,
        ) {
            let scores = split_scores(&probs, num_splits).unwrap();
            prop_assert_eq!(scores.len(), num_splits);
            for score in scores {
                prop_assert!(score.is_finite());
                // Gibbs' inequality, allowing for rounding in the marginal
                prop_assert!(score >= 1.0 - 1e-6, "split score {} below 1", score);
            }
        }

        #[test]
        fn prop_result_finite_and_non_negative(
            probs in prob_vectors(10..80),
            num_splits in 1usize..10,
        ) {
            let result = score_probabilities(&probs, num_splits).unwrap();
            prop_assert!(result.mean.is_finite() && result.mean >= 0.0);
            prop_assert!(result.std.is_finite() && result.std >= 0.0);
        }

        #[test]
        fn prop_repeated_vector_scores_one(
            p in vec(0.001f32..1.0, 10).prop_map(normalise),
            n in 1usize..64,
        ) {
            let probs = vec![p; n];
            let result = score_probabilities(&probs, 1).unwrap();
            prop_assert!((result.mean - 1.0).abs() < 1e-9);
            prop_assert!(result.std.abs() < 1e-12);
        }

        #[test]
        fn prop_deterministic(probs in prob_vectors(10..40)) {
            let a = score_probabilities(&probs, 5).unwrap();
            let b = score_probabilities(&probs, 5).unwrap();
            prop_assert_eq!(a.mean.to_bits(), b.mean.to_bits());
            prop_assert_eq!(a.std.to_bits(), b.std.to_bits());
        }
    }
}
