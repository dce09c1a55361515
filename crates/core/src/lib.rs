pub mod chunk;
pub mod config;
pub mod error;
pub mod ids;
pub mod policy;
pub mod sampling;

pub use chunk::*;
pub use config::Config;
pub use error::*;
pub use ids::*;
pub use policy::ChunkingPolicy;
pub use sampling::*;
