//! Cosine ranking used by the in-memory store and by tests that check the
//! ordering returned by the document store.

use crate::models::{Embedding, Item};

/// Cosine similarity in `[-1, 1]`, accumulated in `f64`.
///
/// Zero-magnitude or mismatched vectors score `0.0`, so legacy records with
/// empty embeddings rank as orthogonal (distance `1.0`).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// `1 - cosine_similarity`; smaller is closer.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// The `k` items whose `full_text_embedding` is closest to `query`, closest
/// first. Ties keep input order.
pub fn rank_top_k<'a, I>(items: I, query: &Embedding, k: usize) -> Vec<Item>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut scored: Vec<(f64, &Item)> = items
        .into_iter()
        .map(|item| {
            (
                cosine_distance(item.full_text_embedding.as_slice(), query.as_slice()),
                item,
            )
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored
        .into_iter()
        .take(k)
        .map(|(_, item)| item.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
        assert!(cosine_distance(&v, &v).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_empty_embedding_ranks_as_orthogonal() {
        let query = [1.0, 0.0];
        let empty = cosine_distance(&[], &query);
        assert_eq!(empty, 1.0);
        assert!((empty - cosine_distance(&[0.0, 1.0], &query)).abs() < 1e-9);
        assert!(empty < cosine_distance(&[-1.0, 0.0], &query));
    }

    #[test]
    fn test_magnitude_does_not_matter() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-9);
    }
}
