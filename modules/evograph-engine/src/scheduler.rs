use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use evograph_common::{
    EngineConfig, EntityRecord, EventRecord, EvoGraphError, EvolutionLink,
};

use crate::composer::{PairScorer, ScoringContext};
use crate::pairgen::{generate_pairs, sort_events};
use crate::sink::LinkSink;
use crate::taxonomy::Taxonomy;

/// Chunks per worker. Oversplitting the pair list lets the pool rebalance
/// when some chunks carry more above-threshold work than others.
const CHUNKS_PER_WORKER: usize = 4;

/// Scheduler lifecycle. `Degraded` is entered from `Dispatched` when the
/// worker pool fails to start or a worker dies; the batch is then re-run
/// serially in full, never emitted partially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Partitioning,
    Dispatched,
    Collecting,
    Done,
    Degraded,
}

/// Counters for one completed batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    pub events: usize,
    pub entities: usize,
    pub pairs_generated: usize,
    pub links_emitted: usize,
    pub chunks: usize,
    pub workers: usize,
    /// True when the batch completed on the serial fallback path.
    pub degraded: bool,
}

/// Cooperative cancellation flag, checked once per chunk. A cancelled run
/// fails with `EvoGraphError::Cancelled` and emits nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Batch scheduler for evolution scoring: partitions the candidate pairs
/// into chunks, fans them out over a thread pool of stateless scorers, and
/// merges the results in deterministic order. The emitted link set is
/// independent of worker count, chunk size, and completion order.
pub struct EvolutionEngine {
    ctx: Arc<ScoringContext>,
    /// Events in canonical order; read-only for the duration of a run.
    events: Arc<Vec<EventRecord>>,
    entities: Arc<BTreeMap<String, EntityRecord>>,
}

impl EvolutionEngine {
    pub fn new(
        config: EngineConfig,
        taxonomy: Taxonomy,
        mut events: Vec<EventRecord>,
        entities: Vec<EntityRecord>,
    ) -> Self {
        sort_events(&mut events);
        let entities: BTreeMap<String, EntityRecord> =
            entities.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self {
            ctx: Arc::new(ScoringContext::new(config, taxonomy)),
            events: Arc::new(events),
            entities: Arc::new(entities),
        }
    }

    /// Attach per-event embeddings for the `Embedding` semantic backend.
    pub fn with_embeddings(
        mut self,
        table: std::collections::HashMap<String, Vec<f64>>,
    ) -> Self {
        let ctx = ScoringContext {
            config: self.ctx.config.clone(),
            taxonomy: Arc::clone(&self.ctx.taxonomy),
            embeddings: None,
        }
        .with_embeddings(table);
        self.ctx = Arc::new(ctx);
        self
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Run the full batch, pushing every accepted link into the sink.
    pub fn run(&self, sink: &mut dyn LinkSink) -> Result<BatchStats, EvoGraphError> {
        self.run_with_cancel(sink, &CancelToken::new())
    }

    /// Run the full batch with cooperative cancellation. The token is checked
    /// once per chunk; a cancelled run emits no links at all.
    pub fn run_with_cancel(
        &self,
        sink: &mut dyn LinkSink,
        cancel: &CancelToken,
    ) -> Result<BatchStats, EvoGraphError> {
        let mut phase = RunPhase::Idle;
        let workers = self.ctx.config.worker_count.max(1);
        let mut stats = BatchStats {
            events: self.events.len(),
            entities: self.entities.len(),
            workers,
            ..BatchStats::default()
        };

        self.warn_unresolved_entities();

        advance(&mut phase, RunPhase::Partitioning);
        let pairs = generate_pairs(&self.events, self.ctx.config.max_time_window_days);
        stats.pairs_generated = pairs.len();

        let chunk_size = (pairs.len() / (workers * CHUNKS_PER_WORKER)).max(1);
        let chunks: Vec<&[(usize, usize)]> = pairs.chunks(chunk_size).collect();
        stats.chunks = chunks.len();

        let collected: Vec<Vec<EvolutionLink>> = if chunks.is_empty() {
            Vec::new()
        } else {
            advance(&mut phase, RunPhase::Dispatched);
            match self.dispatch_parallel(&chunks, workers, cancel) {
                Ok(outcome) => outcome?,
                Err(reason) => {
                    warn!(%reason, "Worker pool failed; retrying batch serially");
                    advance(&mut phase, RunPhase::Degraded);
                    stats.degraded = true;
                    chunks
                        .iter()
                        .map(|chunk| self.score_chunk(chunk, cancel))
                        .collect::<Result<Vec<_>, EvoGraphError>>()?
                }
            }
        };

        advance(&mut phase, RunPhase::Collecting);
        for link in collected.into_iter().flatten() {
            sink.accept(link).map_err(EvoGraphError::from)?;
            stats.links_emitted += 1;
        }

        advance(&mut phase, RunPhase::Done);
        info!(
            events = stats.events,
            pairs = stats.pairs_generated,
            links = stats.links_emitted,
            chunks = stats.chunks,
            workers = stats.workers,
            degraded = stats.degraded,
            "Evolution batch complete"
        );
        Ok(stats)
    }

    /// Fan the chunks out over a dedicated thread pool. Chunk results are
    /// collected in chunk order, so concatenation preserves pair order no
    /// matter which worker finished first.
    ///
    /// Outer `Err` means the parallel path itself failed (pool start-up or a
    /// worker panic) and the caller should degrade; inner `Err` carries a
    /// deliberate abort such as cancellation, which must not be retried.
    fn dispatch_parallel(
        &self,
        chunks: &[&[(usize, usize)]],
        workers: usize,
        cancel: &CancelToken,
    ) -> Result<Result<Vec<Vec<EvolutionLink>>, EvoGraphError>, String> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| e.to_string())?;

        debug!(
            chunks = chunks.len(),
            workers, "Dispatching chunks to worker pool"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| {
                chunks
                    .par_iter()
                    .map(|chunk| self.score_chunk(chunk, cancel))
                    .collect::<Result<Vec<_>, EvoGraphError>>()
            })
        }));

        outcome.map_err(|_| "worker panicked".to_string())
    }

    /// Score one chunk with an independently constructed composer. Stateless
    /// apart from the shared read-only context.
    fn score_chunk(
        &self,
        chunk: &[(usize, usize)],
        cancel: &CancelToken,
    ) -> Result<Vec<EvolutionLink>, EvoGraphError> {
        if cancel.is_cancelled() {
            return Err(EvoGraphError::Cancelled);
        }
        let scorer = PairScorer::new(&self.ctx);
        let mut links = Vec::new();
        for &(i, j) in chunk {
            if let Some(link) = scorer.score_pair(&self.events[i], &self.events[j]) {
                links.push(link);
            }
        }
        Ok(links)
    }

    /// Entity references on events are expected to resolve against the entity
    /// table when one is supplied. Unresolved references do not change any
    /// score; they usually mean ingestion skipped rows.
    fn warn_unresolved_entities(&self) {
        if self.entities.is_empty() {
            return;
        }
        let unresolved = self
            .events
            .iter()
            .flat_map(|e| e.entities.iter())
            .filter(|id| !self.entities.contains_key(*id))
            .count();
        if unresolved > 0 {
            warn!(
                unresolved,
                "Event entity references missing from the entity table"
            );
        }
    }
}

fn advance(phase: &mut RunPhase, next: RunPhase) {
    debug!(from = ?phase, to = ?next, "Scheduler phase");
    *phase = next;
}
