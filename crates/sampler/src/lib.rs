//! Balanced corpus sampling.
//!
//! One call to [`Sampler::retrieve_top`] runs shape → allocate → fetch →
//! select against a read snapshot of the corpus and returns a bounded,
//! checksum-deduplicated set of embedding rows.

pub mod allocation;
pub mod error;
pub mod fetch;
pub mod sampler;
pub mod selection;
pub mod shape;

pub use allocation::{allocate, max_quota, QuotaMap};
pub use error::SamplerError;
pub use fetch::CandidateFetcher;
pub use sampler::{Sampler, SamplingRequest};
pub use selection::select;
pub use shape::CorpusShapeAnalyzer;
