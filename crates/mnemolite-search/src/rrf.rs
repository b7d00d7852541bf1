//! RRF fusion (C11): scale-invariant rank fusion across any number of
//! ranked lists, `RRF(d) = Σᵢ wᵢ / (k + rankᵢ(d))`.

use std::collections::HashMap;

use uuid::Uuid;

pub const DEFAULT_K: u32 = 60;

#[derive(Debug, Clone)]
pub struct FusedResult {
    pub chunk_id: Uuid,
    pub rrf_score: f64,
    pub rank: usize,
    /// Per-method score contribution, keyed by the method label passed to
    /// [`fuse_weighted`].
    pub contribution: HashMap<String, f64>,
}

pub fn rrf_contribution(rank: usize, k: u32) -> f64 {
    1.0 / (k as f64 + rank as f64)
}

/// Unweighted fusion (`wᵢ = 1`) over any number of ranked id lists.
pub fn fuse(result_lists: &[Vec<Uuid>], k: u32) -> Vec<FusedResult> {
    let labeled: Vec<(Vec<Uuid>, String, f64)> = result_lists
        .iter()
        .enumerate()
        .map(|(i, list)| (list.clone(), format!("method_{i}"), 1.0))
        .collect();
    fuse_weighted(&labeled, k)
}

/// Weighted fusion: each `(ranked ids, method label, weight)` tuple
/// contributes `weight / (k + rank)` to every id it contains. Ties in the
/// final RRF score are broken by total score, which for floats means stable
/// insertion order — callers that need a strict tiebreak should pre-sort the
/// input lists.
pub fn fuse_weighted(weighted_results: &[(Vec<Uuid>, String, f64)], k: u32) -> Vec<FusedResult> {
    let mut scores: HashMap<Uuid, f64> = HashMap::new();
    let mut contributions: HashMap<Uuid, HashMap<String, f64>> = HashMap::new();
    let mut first_seen: Vec<Uuid> = Vec::new();

    for (results, method_name, weight) in weighted_results {
        for (idx, chunk_id) in results.iter().enumerate() {
            let rank = idx + 1;
            let contribution = weight * rrf_contribution(rank, k);
            if !scores.contains_key(chunk_id) {
                first_seen.push(*chunk_id);
            }
            *scores.entry(*chunk_id).or_insert(0.0) += contribution;
            contributions
                .entry(*chunk_id)
                .or_default()
                .insert(method_name.clone(), contribution);
        }
    }

    let mut ids = first_seen;
    ids.sort_by(|a, b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ids.into_iter()
        .enumerate()
        .map(|(idx, chunk_id)| FusedResult {
            chunk_id,
            rrf_score: scores[&chunk_id],
            rank: idx + 1,
            contribution: contributions.remove(&chunk_id).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn rrf_contribution_matches_formula() {
        assert!((rrf_contribution(1, 60) - 1.0 / 61.0).abs() < 1e-12);
    }

    #[test]
    fn document_in_both_lists_outranks_single_list_hit() {
        let a = uuid(1);
        let b = uuid(2);
        let lexical = vec![a, b];
        let vector = vec![a];
        let fused = fuse(&[lexical, vector], DEFAULT_K);
        assert_eq!(fused[0].chunk_id, a);
        assert_eq!(fused[0].rank, 1);
    }

    #[test]
    fn unweighted_fuse_gives_each_list_equal_weight() {
        let a = uuid(1);
        let fused = fuse(&[vec![a]], DEFAULT_K);
        assert!((fused[0].rrf_score - 1.0 / 61.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_fuse_scales_contribution() {
        let a = uuid(1);
        let fused = fuse_weighted(&[(vec![a], "lexical_trgm".to_string(), 0.6)], DEFAULT_K);
        assert!((fused[0].rrf_score - 0.6 / 61.0).abs() < 1e-9);
        assert_eq!(fused[0].contribution["lexical_trgm"], fused[0].rrf_score);
    }

    #[test]
    fn empty_lists_fuse_to_empty_result() {
        let fused: Vec<FusedResult> = fuse(&[], DEFAULT_K);
        assert!(fused.is_empty());
    }
}
