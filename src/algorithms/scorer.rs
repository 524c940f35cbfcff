use super::sparse::SparseVector;
use super::vectorizer::VectorSpaceIndex;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub row: usize,
    pub video_id: String,
    pub score: f32,
}

/// Score descending, then video id ascending.
pub fn rank_order(a_score: f32, a_id: &str, b_score: f32, b_id: &str) -> Ordering {
    b_score.total_cmp(&a_score).then_with(|| a_id.cmp(b_id))
}

/// Cosine similarity of every non-excluded row against the profile, keeping
/// the `k` best strictly positive matches.
pub fn rank(
    profile: &SparseVector,
    index: &VectorSpaceIndex,
    exclude: &HashSet<String>,
    k: usize,
) -> Vec<ScoredCandidate> {
    if k == 0 || profile.is_zero() {
        return Vec::new();
    }

    let ids = index.item_ids();
    let mut scored: Vec<ScoredCandidate> = (0..index.len())
        .into_par_iter()
        .filter(|&row| !exclude.contains(&ids[row]))
        .filter_map(|row| {
            let vector = index.vector_at(row)?;
            let score = profile.dot(vector);
            (score > 0.0).then(|| ScoredCandidate {
                row,
                video_id: ids[row].clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| rank_order(a.score, &a.video_id, b.score, &b.video_id));
    scored.truncate(k);
    scored
}
