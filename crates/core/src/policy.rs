use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Parameters for one segmentation call. Sizes are in `char`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingPolicy {
    /// Upper bound on a within-page segment (default: 1000).
    pub max_chunk_size_chars: usize,
    /// Overlap between consecutive segments of a page, and the number of
    /// characters carried over from the next page onto a page's last chunk
    /// (default: 200).
    pub overlap_size_chars: usize,
    /// Trim page text and segments before locating offsets (default: true).
    pub trim_whitespace: bool,
    /// Record start/end page on each chunk (default: true).
    pub include_page_metadata: bool,
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self {
            max_chunk_size_chars: 1000,
            overlap_size_chars: 200,
            trim_whitespace: true,
            include_page_metadata: true,
        }
    }
}

impl ChunkingPolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_chunk_size_chars == 0 {
            return Err(CoreError::InvalidPolicy(
                "max_chunk_size_chars must be greater than 0".into(),
            ));
        }
        if self.overlap_size_chars >= self.max_chunk_size_chars {
            return Err(CoreError::InvalidPolicy(format!(
                "overlap_size_chars ({}) must be smaller than max_chunk_size_chars ({})",
                self.overlap_size_chars, self.max_chunk_size_chars
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(ChunkingPolicy::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_size_and_oversized_overlap() {
        let zero = ChunkingPolicy {
            max_chunk_size_chars: 0,
            overlap_size_chars: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let overlap = ChunkingPolicy {
            max_chunk_size_chars: 100,
            overlap_size_chars: 100,
            ..Default::default()
        };
        assert!(matches!(overlap.validate(), Err(CoreError::InvalidPolicy(_))));
    }
}
