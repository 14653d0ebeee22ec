use std::collections::HashMap;
use std::sync::Arc;

use evograph_common::{
    ComponentScores, EngineConfig, EventRecord, EvolutionLink, ScoreWeights, SemanticBackend,
};

use crate::signals::{
    CausalitySignal, EmbeddingSemanticSignal, EmotionalSignal, EntityOverlapSignal,
    KeywordSemanticSignal, Signal, TemporalSignal, TopicSignal,
};
use crate::taxonomy::Taxonomy;

/// Shared read-only scoring inputs for one run: configuration, taxonomy, and
/// the optional embedding table. Wrapped in an `Arc` by the scheduler so
/// every worker sees the same immutable data.
pub struct ScoringContext {
    pub config: EngineConfig,
    pub taxonomy: Arc<Taxonomy>,
    pub embeddings: Option<Arc<HashMap<String, Vec<f64>>>>,
}

impl ScoringContext {
    pub fn new(config: EngineConfig, taxonomy: Taxonomy) -> Self {
        Self {
            config,
            taxonomy: Arc::new(taxonomy),
            embeddings: None,
        }
    }

    /// Attach per-event embeddings for the `Embedding` semantic backend.
    pub fn with_embeddings(mut self, table: HashMap<String, Vec<f64>>) -> Self {
        self.embeddings = Some(Arc::new(table));
        self
    }
}

/// Composes the six signals into a composite score and applies the
/// significance threshold. Constructed independently per worker from the
/// shared context; no state crosses worker boundaries.
pub struct PairScorer {
    temporal: Box<dyn Signal>,
    entity_overlap: Box<dyn Signal>,
    semantic: Box<dyn Signal>,
    topic: Box<dyn Signal>,
    causality: Box<dyn Signal>,
    emotional: Box<dyn Signal>,
    weights: ScoreWeights,
    threshold: f64,
}

impl PairScorer {
    pub fn new(ctx: &ScoringContext) -> Self {
        let taxonomy = Arc::clone(&ctx.taxonomy);
        let semantic: Box<dyn Signal> = match (ctx.config.semantic_backend, &ctx.embeddings) {
            (SemanticBackend::Embedding, Some(table)) => {
                Box::new(EmbeddingSemanticSignal::new(Arc::clone(table)))
            }
            // Embedding backend without a table degrades to the keyword rule.
            _ => Box::new(KeywordSemanticSignal),
        };

        Self {
            temporal: Box::new(TemporalSignal::from_config(&ctx.config)),
            entity_overlap: Box::new(EntityOverlapSignal),
            semantic,
            topic: Box::new(TopicSignal::new(Arc::clone(&taxonomy))),
            causality: Box::new(CausalitySignal::new(Arc::clone(&taxonomy))),
            emotional: Box::new(EmotionalSignal::new(taxonomy)),
            weights: ctx.config.weights,
            threshold: ctx.config.threshold,
        }
    }

    /// The six component scores for an ordered pair, each rounded to 4
    /// decimal places for bit-stable reproducibility across platforms.
    pub fn component_scores(&self, a: &EventRecord, b: &EventRecord) -> ComponentScores {
        ComponentScores {
            temporal: round4(self.temporal.score(a, b)),
            entity_overlap: round4(self.entity_overlap.score(a, b)),
            semantic: round4(self.semantic.score(a, b)),
            topic: round4(self.topic.score(a, b)),
            causality: round4(self.causality.score(a, b)),
            emotional: round4(self.emotional.score(a, b)),
        }
    }

    /// Score an ordered pair. Returns a link iff the composite clears the
    /// threshold; below-threshold pairs are dropped, not emitted at zero.
    pub fn score_pair(&self, a: &EventRecord, b: &EventRecord) -> Option<EvolutionLink> {
        let components = self.component_scores(a, b);
        let composite = round4(self.composite(&components));
        if composite < self.threshold {
            return None;
        }
        Some(EvolutionLink {
            source_id: a.id.clone(),
            target_id: b.id.clone(),
            composite,
            components,
        })
    }

    fn composite(&self, c: &ComponentScores) -> f64 {
        let w = &self.weights;
        w.temporal * c.temporal
            + w.entity_overlap * c.entity_overlap
            + w.semantic * c.semantic
            + w.topic * c.topic
            + w.causality * c.causality
            + w.emotional * c.emotional
    }
}

/// Round to 4 decimal places.
pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
