//! Maximal marginal relevance re-ranking
//!
//! Greedy selection: the first pick is the candidate most similar to the
//! query; every following pick maximises
//! `lambda * sim(query, d) - (1 - lambda) * max(sim(d, s) for s in selected)`.

use crate::embedding::cosine_similarity;

/// Select up to `k` candidate indices in MMR order
///
/// `lambda_mult` is clamped to `[0, 1]`; `1.0` degenerates to plain
/// similarity ranking, `0.0` to pure diversity after the first pick.
pub fn maximal_marginal_relevance(
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
    lambda_mult: f32,
) -> Vec<usize> {
    let lambda = lambda_mult.clamp(0.0, 1.0);
    let k = k.min(candidates.len());
    if k == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates.iter().map(|c| cosine_similarity(query, c)).collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k);
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k {
        let mut best: Option<(usize, f32)> = None;

        for (pos, &idx) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(&candidates[idx], &candidates[s]))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * relevance[idx] - (1.0 - lambda) * redundancy;
            // Strict comparison keeps the earliest candidate on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((pos, score));
            }
        }

        match best {
            Some((pos, _)) => selected.push(remaining.remove(pos)),
            None => break,
        }
    }

    selected
}
