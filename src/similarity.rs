//! Similarity scoring for chunk embeddings
//!
//! Provides cosine similarity and top-k ranking over stored chunks.

use std::cmp::Ordering;

/// Cosine similarity between two embedding vectors
/// Returns a value between -1.0 and 1.0; mismatched or zero vectors score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f32, 0.0f32, 0.0f32), |(d, na, nb), (x, y)| {
        (d + x * y, na + x * x, nb + y * y)
    });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank `candidates` against `query` and keep the best `k`
/// Returns (position in candidates, score) sorted by score descending; ties keep input order
pub fn top_k<'a, I>(query: &[f32], candidates: I, k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, emb)| (i, cosine_similarity(query, emb)))
        .filter(|(_, score)| !score.is_nan())
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((sim - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -3.0]);
        assert!((sim + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_top_k_orders_by_score() {
        let embeddings: Vec<Vec<f32>> = vec![
            vec![0.0, 1.0, 0.0],  // orthogonal
            vec![0.9, 0.1, 0.0],  // very similar
            vec![-1.0, 0.0, 0.0], // opposite
            vec![1.0, 0.0, 0.0],  // identical
        ];
        let ranked = top_k(&[1.0, 0.0, 0.0], embeddings.iter().map(Vec::as_slice), 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 3);
        assert_eq!(ranked[1].0, 1);
    }

    #[test]
    fn test_top_k_caps_and_handles_empty() {
        let embeddings: Vec<Vec<f32>> = (0..10).map(|_| vec![1.0, 0.0]).collect();
        assert_eq!(top_k(&[1.0, 0.0], embeddings.iter().map(Vec::as_slice), 4).len(), 4);
        assert!(top_k(&[1.0, 0.0], embeddings.iter().map(Vec::as_slice), 0).is_empty());

        let none: Vec<Vec<f32>> = Vec::new();
        assert!(top_k(&[1.0, 0.0], none.iter().map(Vec::as_slice), 4).is_empty());
    }

    #[test]
    fn test_top_k_ties_keep_input_order() {
        let embeddings: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let ranked = top_k(&[1.0, 0.0], embeddings.iter().map(Vec::as_slice), 3);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
