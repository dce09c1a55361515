//! Persistence collaborator for chunk and embedding rows.
//!
//! Sampling only needs [`CorpusReader`]; ingestion needs [`CorpusWriter`].
//! Both are implemented by the in-memory snapshot store and by the PostgreSQL
//! (pgvector) store.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryCorpusStore;
pub use postgres::{init_pg_pool, PgCorpusStore};
pub use traits::{CorpusReader, CorpusWriter, DocumentVersionKey};
