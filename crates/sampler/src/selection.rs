use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use quarry_core::{ChunkEmbedding, DocumentId};

use crate::allocation::QuotaMap;

/// Shuffle `candidates`, then accept rows in order while their document has
/// quota left and their checksum has not been accepted yet. Stops at `limit`.
///
/// The output is unranked. No two rows share a checksum and no document
/// exceeds its quota.
pub fn select<R: Rng + ?Sized>(
    mut candidates: Vec<ChunkEmbedding>,
    quotas: &QuotaMap,
    limit: usize,
    rng: &mut R,
) -> Vec<ChunkEmbedding> {
    candidates.shuffle(rng);

    let mut used: HashMap<DocumentId, usize> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut selected = Vec::with_capacity(limit.min(candidates.len()));
    let (mut over_quota, mut duplicates) = (0usize, 0usize);

    for candidate in candidates {
        if selected.len() >= limit {
            break;
        }
        let quota = quotas.get(&candidate.document_id).copied().unwrap_or(0);
        let count = used.entry(candidate.document_id).or_default();
        if *count >= quota {
            over_quota += 1;
            continue;
        }
        if seen.contains(&candidate.chunk_checksum) {
            duplicates += 1;
            continue;
        }
        *count += 1;
        seen.insert(candidate.chunk_checksum.clone());
        selected.push(candidate);
    }

    debug!(selected = selected.len(), limit, over_quota, duplicates, "final selection");
    selected
}
