pub mod config;
pub mod error;
pub mod types;

pub use config::{EngineConfig, ScoreWeights, SemanticBackend};
pub use error::EvoGraphError;
pub use types::*;
