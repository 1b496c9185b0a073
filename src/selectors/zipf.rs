//! Zipf-style picks shared by the selectors.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;

/// Deterministic pick: each ranked entry carries a value (for instance a
/// visit count) and the pick minimizes `value · w(rank)` with the
/// zipf-style weight `w(rank) = (rank + 1 + shift) · (ln(rank + 1 + shift) + 1)`.
/// Lower ranks stay cheap, rarely-visited entries win. First minimum wins
/// ties.
pub fn zipf_pick_deterministic<K: Clone>(ranked_values: &[(K, f64)], shift: bool) -> Option<K> {
    let shift = if shift { 1.0 } else { 0.0 };
    let mut best: Option<(usize, f64)> = None;
    for (rank, (_, value)) in ranked_values.iter().enumerate() {
        let position = rank as f64 + 1.0 + shift;
        let weight = value * position * (position.ln() + 1.0);
        match best {
            Some((_, best_weight)) if weight >= best_weight => {}
            _ => best = Some((rank, weight)),
        }
    }
    best.map(|(rank, _)| ranked_values[rank].0.clone())
}

/// Random pick over an ordered list with `P(rank) ∝ 1 / (rank + 1)`.
pub fn zipf_pick_random<T: Clone, R: Rng>(ordered: &[T], rng: &mut R) -> Option<T> {
    if ordered.is_empty() {
        return None;
    }
    let weights: Vec<f64> = (0..ordered.len()).map(|rank| 1.0 / (rank as f64 + 1.0)).collect();
    let distribution = WeightedIndex::new(&weights).expect("weights are positive");
    Some(ordered[distribution.sample(rng)].clone())
}
