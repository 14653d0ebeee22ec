//! Event evolution scoring engine.
//!
//! Links historical financial events with a directed "evolves-to" relation.
//! Six independent signals score each time-ordered candidate pair; a weighted
//! composite above the significance threshold becomes an `EvolutionLink`.
//! Batches fan out over a thread pool and produce the same link set for any
//! worker count.

pub mod composer;
pub mod pairgen;
pub mod scheduler;
pub mod signals;
pub mod sink;
pub mod taxonomy;

pub use composer::{PairScorer, ScoringContext};
pub use scheduler::{BatchStats, CancelToken, EvolutionEngine, RunPhase};
pub use signals::Signal;
pub use sink::{LinkSink, MemorySink};
pub use taxonomy::{Taxonomy, TopicGroup};
