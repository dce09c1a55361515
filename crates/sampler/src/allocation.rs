//! Per-document quotas for one sampling budget.

use indexmap::IndexMap;
use tracing::debug;

use quarry_core::{CoverageMode, DocChunkCount, DocumentId};

use crate::error::SamplerError;

/// Maximum contribution per document, in shape order.
pub type QuotaMap = IndexMap<DocumentId, usize>;

/// Compute quotas for `shape` under `mode`.
///
/// `EqualPerDocument` gives every document `ceil(limit / n)` clamped to
/// `1..=limit`, so the total may exceed `limit`. `ProportionalToSize` sums to
/// exactly `min(limit, total chunk count)`. `Focused` is rejected.
pub fn allocate(
    shape: &[DocChunkCount],
    limit: usize,
    mode: CoverageMode,
) -> Result<QuotaMap, SamplerError> {
    let quotas = match mode {
        CoverageMode::EqualPerDocument => equal_per_document(shape, limit),
        CoverageMode::ProportionalToSize => proportional_to_size(shape, limit),
        CoverageMode::Focused => return Err(SamplerError::UnsupportedMode(mode)),
    };
    debug!(
        %mode,
        limit,
        documents = quotas.len(),
        quota_sum = quotas.values().sum::<usize>(),
        "quotas allocated"
    );
    Ok(quotas)
}

/// Largest single quota; the per-document fetch bound.
pub fn max_quota(quotas: &QuotaMap) -> usize {
    quotas.values().copied().max().unwrap_or(0)
}

fn equal_per_document(shape: &[DocChunkCount], limit: usize) -> QuotaMap {
    if shape.is_empty() || limit == 0 {
        return QuotaMap::new();
    }
    let quota = limit.div_ceil(shape.len()).clamp(1, limit);
    shape.iter().map(|c| (c.document_id, quota)).collect()
}

fn proportional_to_size(shape: &[DocChunkCount], limit: usize) -> QuotaMap {
    let total: usize = shape.iter().map(|c| c.chunk_count).sum();
    if total == 0 || limit == 0 {
        return QuotaMap::new();
    }
    if limit >= total {
        return shape.iter().map(|c| (c.document_id, c.chunk_count)).collect();
    }

    let mut quotas: QuotaMap = shape
        .iter()
        .map(|c| {
            let share = (limit as f64 * c.chunk_count as f64 / total as f64).round();
            (c.document_id, share.max(0.0) as usize)
        })
        .collect();

    let sum: usize = quotas.values().sum();
    if sum < limit {
        fill_deficit(&mut quotas, shape, limit - sum);
    } else if sum > limit {
        trim_excess(&mut quotas, sum - limit);
    }
    quotas
}

/// Add one at a time to the largest documents that still have room.
fn fill_deficit(quotas: &mut QuotaMap, shape: &[DocChunkCount], mut deficit: usize) {
    let mut by_size: Vec<&DocChunkCount> = shape.iter().collect();
    by_size.sort_by(|a, b| b.chunk_count.cmp(&a.chunk_count));

    while deficit > 0 {
        let mut progressed = false;
        for doc in &by_size {
            if deficit == 0 {
                break;
            }
            if let Some(q) = quotas.get_mut(&doc.document_id) {
                if *q < doc.chunk_count {
                    *q += 1;
                    deficit -= 1;
                    progressed = true;
                }
            }
        }
        if !progressed {
            break;
        }
    }
}

/// Take one at a time from the largest current quota; ties go to the
/// earliest document.
fn trim_excess(quotas: &mut QuotaMap, mut excess: usize) {
    while excess > 0 {
        let mut largest: Option<(usize, usize)> = None;
        for (idx, &q) in quotas.values().enumerate() {
            let larger = match largest {
                Some((_, best)) => q > best,
                None => q > 0,
            };
            if larger {
                largest = Some((idx, q));
            }
        }
        let Some((idx, _)) = largest else { break };
        quotas[idx] -= 1;
        excess -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn shape(counts: &[usize]) -> Vec<DocChunkCount> {
        counts
            .iter()
            .map(|&n| DocChunkCount::new(Uuid::new_v4(), n))
            .collect()
    }

    fn quotas_in_order(shape: &[DocChunkCount], quotas: &QuotaMap) -> Vec<usize> {
        shape.iter().map(|c| quotas[&c.document_id]).collect()
    }

    #[test]
    fn proportional_large_and_small() {
        let s = shape(&[100, 10]);
        let q = allocate(&s, 20, CoverageMode::ProportionalToSize).unwrap();
        assert_eq!(quotas_in_order(&s, &q), vec![18, 2]);
        assert_eq!(q.values().sum::<usize>(), 20);
    }

    #[test]
    fn equal_three_documents() {
        let s = shape(&[5, 5, 5]);
        let q = allocate(&s, 10, CoverageMode::EqualPerDocument).unwrap();
        assert_eq!(quotas_in_order(&s, &q), vec![4, 4, 4]);
        assert_eq!(q.values().sum::<usize>(), 12);
    }

    #[test]
    fn equal_quota_is_at_least_one() {
        let s = shape(&[3, 3, 3, 3, 3]);
        let q = allocate(&s, 2, CoverageMode::EqualPerDocument).unwrap();
        assert!(q.values().all(|&v| v == 1));
    }

    #[test]
    fn equal_quota_never_exceeds_limit() {
        let s = shape(&[50]);
        let q = allocate(&s, 7, CoverageMode::EqualPerDocument).unwrap();
        assert_eq!(q.values().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn proportional_fills_rounding_deficit_largest_first() {
        // 10 * 1/3 rounds to 3 for each document: sum 9.
        let s = shape(&[4, 4, 4]);
        let q = allocate(&s, 10, CoverageMode::ProportionalToSize).unwrap();
        assert_eq!(q.values().sum::<usize>(), 10);
        assert_eq!(quotas_in_order(&s, &q), vec![4, 3, 3]);
    }

    #[test]
    fn proportional_trims_rounding_excess() {
        // Each of 1.5 rounds up to 2: sum 4 for a limit of 3.
        let s = shape(&[2, 2]);
        let q = allocate(&s, 3, CoverageMode::ProportionalToSize).unwrap();
        assert_eq!(q.values().sum::<usize>(), 3);
        assert_eq!(quotas_in_order(&s, &q), vec![1, 2]);
    }

    #[test]
    fn proportional_takes_everything_when_limit_exceeds_corpus() {
        let s = shape(&[3, 1]);
        let q = allocate(&s, 50, CoverageMode::ProportionalToSize).unwrap();
        assert_eq!(quotas_in_order(&s, &q), vec![3, 1]);
    }

    #[test]
    fn proportional_sum_matches_min_of_limit_and_total() {
        let sizes = [[1, 2, 3, 97], [10, 10, 10, 1], [7, 0, 13, 2], [1, 1, 1, 1]];
        for counts in sizes {
            let s = shape(&counts);
            let total: usize = counts.iter().sum();
            for limit in 1..=(total + 5) {
                let q = allocate(&s, limit, CoverageMode::ProportionalToSize).unwrap();
                assert_eq!(
                    q.values().sum::<usize>(),
                    limit.min(total),
                    "counts {counts:?} limit {limit}"
                );
                for c in &s {
                    assert!(q[&c.document_id] <= c.chunk_count);
                }
            }
        }
    }

    #[test]
    fn focused_is_unsupported() {
        let err = allocate(&shape(&[1]), 5, CoverageMode::Focused).unwrap_err();
        assert!(matches!(err, SamplerError::UnsupportedMode(CoverageMode::Focused)));
    }

    #[test]
    fn max_quota_of_empty_map_is_zero() {
        assert_eq!(max_quota(&QuotaMap::new()), 0);
    }
}
