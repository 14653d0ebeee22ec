use serde::{Deserialize, Serialize};

use crate::error::EvoGraphError;

/// Named weights for the six evolution signals. Non-negative, conventionally
/// summing to 1.0. Supplied as configuration and never mutated during a run;
/// for fixed inputs they fully determine the composite scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub temporal: f64,
    pub entity_overlap: f64,
    pub semantic: f64,
    pub topic: f64,
    pub causality: f64,
    pub emotional: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            temporal: 0.20,
            entity_overlap: 0.20,
            semantic: 0.15,
            topic: 0.15,
            causality: 0.20,
            emotional: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.temporal
            + self.entity_overlap
            + self.semantic
            + self.topic
            + self.causality
            + self.emotional
    }
}

/// Which implementation backs the semantic similarity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticBackend {
    /// Keyword Jaccard over descriptions plus event-type match.
    #[default]
    Keyword,
    /// Cosine similarity over caller-supplied per-event embeddings; falls
    /// back to the keyword rule for events without an embedding.
    Embedding,
}

/// Full configuration surface of the scoring core. Passed by value; the core
/// reads no environment variables, files, or network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum composite score for a pair to produce a link.
    pub threshold: f64,
    pub weights: ScoreWeights,
    /// Maximum whole-day gap between two events for the pair to be generated.
    pub max_time_window_days: i64,
    /// Worker pool size for batch scoring.
    pub worker_count: usize,
    /// Temporal decay scale factor (K in `K * e^(-alpha * dt)`).
    pub temporal_k: f64,
    /// Temporal decay rate per day.
    pub temporal_alpha: f64,
    /// Significance floor applied inside the temporal signal, before
    /// weighting: raw decay below this is treated as zero. 0.0 disables it.
    pub temporal_floor: f64,
    pub semantic_backend: SemanticBackend,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            weights: ScoreWeights::default(),
            max_time_window_days: 365,
            worker_count: default_worker_count(),
            temporal_k: 1.0,
            temporal_alpha: 0.1,
            temporal_floor: 0.1,
            semantic_backend: SemanticBackend::Keyword,
        }
    }
}

impl EngineConfig {
    /// Check the configuration preconditions the core assumes. The core never
    /// clamps or repairs invalid configuration; callers that construct
    /// configs from untrusted input should validate before running.
    pub fn validate(&self) -> Result<(), EvoGraphError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(EvoGraphError::Validation(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        let w = &self.weights;
        for (name, value) in [
            ("temporal", w.temporal),
            ("entity_overlap", w.entity_overlap),
            ("semantic", w.semantic),
            ("topic", w.topic),
            ("causality", w.causality),
            ("emotional", w.emotional),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(EvoGraphError::Validation(format!(
                    "weight {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if w.sum() <= 0.0 {
            return Err(EvoGraphError::Validation(
                "weights must not all be zero".to_string(),
            ));
        }
        if self.max_time_window_days < 1 {
            return Err(EvoGraphError::Validation(format!(
                "max_time_window_days must be positive, got {}",
                self.max_time_window_days
            )));
        }
        if self.worker_count < 1 {
            return Err(EvoGraphError::Validation(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.temporal_k <= 0.0 {
            return Err(EvoGraphError::Validation(format!(
                "temporal_k must be positive, got {}",
                self.temporal_k
            )));
        }
        if self.temporal_alpha < 0.0 {
            return Err(EvoGraphError::Validation(format!(
                "temporal_alpha must be non-negative, got {}",
                self.temporal_alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.temporal_floor) {
            return Err(EvoGraphError::Validation(format!(
                "temporal_floor must be in [0, 1], got {}",
                self.temporal_floor
            )));
        }
        Ok(())
    }
}

/// Default worker count: one per available core, capped at 8.
fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8)
}
