//! Small numeric helpers shared by the recommender rules and the
//! equivalence predicates.

/// Logit with the input clamped away from 0 and 1, scaled by
/// `max(1, |x|)` so that extreme (endgame-like) values keep their
/// separation after the transform.
pub fn guarded_logit(x: f64) -> f64 {
    let y = x.clamp(1e-24, 0.999_999_999_999_999_9);
    (y / (1.0 - y)).ln() * x.abs().max(1.0)
}

/// Numerically stabilized softmax: scores are shifted by their maximum and
/// scaled by `temperature` before exponentiation.
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores
        .iter()
        .map(|s| ((s - max_score) * temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
