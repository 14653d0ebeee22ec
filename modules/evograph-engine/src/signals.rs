use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use evograph_common::{EngineConfig, EventRecord};

use crate::taxonomy::Taxonomy;

/// Boost added to entity overlap when both events name the same actor.
const ACTOR_MATCH_BOOST: f64 = 0.2;

/// Split of the semantic signal between keyword overlap and type match.
const KEYWORD_WEIGHT: f64 = 0.7;
const TYPE_MATCH_WEIGHT: f64 = 0.3;

/// Score for a direct edge in the causal-pattern table.
const DIRECT_CAUSE_SCORE: f64 = 0.9;
/// Score for a 2-hop transitive path through one intermediate type.
const TRANSITIVE_CAUSE_SCORE: f64 = 0.6;

/// Topic score when the two events map to neither a shared nor a related
/// group (including when neither maps to any group at all).
const SAME_DOMAIN_DEFAULT: f64 = 0.3;
/// Topic score when the two events' groups are related but not shared.
const RELATED_TOPIC_SCORE: f64 = 0.7;

/// Minimum token length counted as a keyword.
const MIN_KEYWORD_LEN: usize = 4;

/// Tokens ignored by the keyword extractor (length >= 4 only; shorter tokens
/// are already dropped by the length filter).
const STOP_WORDS: &[&str] = &[
    "that", "this", "with", "from", "have", "will", "been", "were", "their", "which", "after",
    "into", "over", "than", "they", "them", "about", "would", "could", "also", "amid",
];

/// A single evolution signal: a pure function of an ordered event pair to a
/// score in [0, 1]. Implementations hold only immutable data, so identical
/// input yields identical output regardless of call order or thread.
pub trait Signal: Send + Sync {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64;
}

// --- Temporal correlation (TCDI) ---

/// Exponential decay over the whole-day gap between two events:
/// `K * e^(-alpha * dt)`. Zero when the gap is negative, unknown (missing
/// date), beyond the window, or when the raw decay falls below the
/// significance floor.
#[derive(Debug, Clone, Copy)]
pub struct TemporalSignal {
    pub k: f64,
    pub alpha: f64,
    pub max_window_days: i64,
    pub floor: f64,
}

impl TemporalSignal {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            k: config.temporal_k,
            alpha: config.temporal_alpha,
            max_window_days: config.max_time_window_days,
            floor: config.temporal_floor,
        }
    }
}

impl Signal for TemporalSignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        let dt = match (a.date, b.date) {
            (Some(da), Some(db)) => (db - da).num_days(),
            _ => return 0.0,
        };
        if dt < 0 || dt > self.max_window_days {
            return 0.0;
        }
        let decay = self.k * (-self.alpha * dt as f64).exp();
        if decay < self.floor {
            return 0.0;
        }
        decay.min(1.0)
    }
}

// --- Entity overlap ---

/// Jaccard similarity of the two events' entity sets (zero if either set is
/// empty), plus a fixed boost when both events name the same actor. Capped
/// at 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityOverlapSignal;

impl Signal for EntityOverlapSignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        let base = jaccard(&a.entities, &b.entities);
        let boost = match (&a.actor, &b.actor) {
            (Some(x), Some(y)) if x == y => ACTOR_MATCH_BOOST,
            _ => 0.0,
        };
        (base + boost).min(1.0)
    }
}

// --- Semantic similarity ---

/// Rule-based semantic signal: keyword Jaccard over the descriptions plus an
/// event-type match term.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSemanticSignal;

impl Signal for KeywordSemanticSignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        let kw = jaccard(&keywords(&a.description), &keywords(&b.description));
        let type_match = if a.event_type == b.event_type { 1.0 } else { 0.0 };
        KEYWORD_WEIGHT * kw + TYPE_MATCH_WEIGHT * type_match
    }
}

/// Embedding-backed semantic signal: cosine similarity over caller-supplied
/// per-event embeddings, clamped to [0, 1]. Events without an embedding fall
/// back to the keyword rule, so the signal stays total.
pub struct EmbeddingSemanticSignal {
    table: Arc<HashMap<String, Vec<f64>>>,
    fallback: KeywordSemanticSignal,
}

impl EmbeddingSemanticSignal {
    pub fn new(table: Arc<HashMap<String, Vec<f64>>>) -> Self {
        Self {
            table,
            fallback: KeywordSemanticSignal,
        }
    }
}

impl Signal for EmbeddingSemanticSignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        match (self.table.get(&a.id), self.table.get(&b.id)) {
            (Some(ea), Some(eb)) => cosine_similarity(ea, eb).clamp(0.0, 1.0),
            _ => self.fallback.score(a, b),
        }
    }
}

// --- Topic relevance ---

/// Shared topic group scores 1.0, related groups 0.7, everything else the
/// same-domain default.
pub struct TopicSignal {
    taxonomy: Arc<Taxonomy>,
}

impl TopicSignal {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }
}

impl Signal for TopicSignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        let ta = self.taxonomy.topics(a.event_type);
        let tb = self.taxonomy.topics(b.event_type);
        if ta.iter().any(|t| tb.contains(t)) {
            return 1.0;
        }
        if ta
            .iter()
            .any(|x| tb.iter().any(|y| self.taxonomy.topics_related(*x, *y)))
        {
            return RELATED_TOPIC_SCORE;
        }
        SAME_DOMAIN_DEFAULT
    }
}

// --- Event-type causality ---

/// Directed causal-pattern lookup: a direct cause → effect edge scores 0.9,
/// a 2-hop transitive path 0.6, no path 0.0.
pub struct CausalitySignal {
    taxonomy: Arc<Taxonomy>,
}

impl CausalitySignal {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }
}

impl Signal for CausalitySignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        if self.taxonomy.is_direct_effect(a.event_type, b.event_type) {
            DIRECT_CAUSE_SCORE
        } else if self.taxonomy.has_two_hop_path(a.event_type, b.event_type) {
            TRANSITIVE_CAUSE_SCORE
        } else {
            0.0
        }
    }
}

// --- Emotional consistency ---

/// `max(0, 1 - EVI)` where EVI is the absolute difference between the two
/// event types' mapped sentiment values.
pub struct EmotionalSignal {
    taxonomy: Arc<Taxonomy>,
}

impl EmotionalSignal {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }
}

impl Signal for EmotionalSignal {
    fn score(&self, a: &EventRecord, b: &EventRecord) -> f64 {
        let evi =
            (self.taxonomy.sentiment(a.event_type) - self.taxonomy.sentiment(b.event_type)).abs();
        (1.0 - evi).max(0.0)
    }
}

// --- Shared helpers ---

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`; zero if either set is empty.
pub(crate) fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Lower-cased alphanumeric tokens of length >= 4, stop-words removed.
pub(crate) fn keywords(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_KEYWORD_LEN)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

pub(crate) fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evograph_common::EventType;

    fn event(id: &str, event_type: EventType, date: Option<&str>) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            date: date.map(|d| d.parse().unwrap()),
            event_type,
            actor: None,
            target: None,
            entities: BTreeSet::new(),
            description: String::new(),
        }
    }

    fn temporal() -> TemporalSignal {
        TemporalSignal::from_config(&EngineConfig::default())
    }

    // --- temporal ---

    #[test]
    fn zero_day_gap_scores_k() {
        let a = event("a", EventType::StockCrash, Some("2008-09-15"));
        let b = event("b", EventType::StockCrash, Some("2008-09-15"));
        assert_eq!(temporal().score(&a, &b), 1.0);
    }

    #[test]
    fn four_day_gap_decays_exponentially() {
        let a = event("a", EventType::CreditDowngrade, Some("2008-09-10"));
        let b = event("b", EventType::DebtDefault, Some("2008-09-14"));
        let score = temporal().score(&a, &b);
        assert!((score - (-0.4_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn gap_beyond_window_scores_zero() {
        let signal = TemporalSignal {
            max_window_days: 30,
            ..temporal()
        };
        let a = event("a", EventType::StockCrash, Some("2008-01-01"));
        let b = event("b", EventType::StockCrash, Some("2008-02-15"));
        assert_eq!(signal.score(&a, &b), 0.0);
    }

    #[test]
    fn significance_floor_zeroes_weak_decay() {
        // alpha 0.1: decay crosses 0.1 between 23 and 24 days.
        let a = event("a", EventType::StockCrash, Some("2008-01-01"));
        let b23 = event("b", EventType::StockCrash, Some("2008-01-24"));
        let b24 = event("b", EventType::StockCrash, Some("2008-01-25"));
        assert!(temporal().score(&a, &b23) > 0.1);
        assert_eq!(temporal().score(&a, &b24), 0.0);
    }

    #[test]
    fn floor_can_be_disabled() {
        let signal = TemporalSignal {
            floor: 0.0,
            ..temporal()
        };
        let a = event("a", EventType::StockCrash, Some("2008-01-01"));
        let b = event("b", EventType::StockCrash, Some("2008-01-25"));
        assert!(signal.score(&a, &b) > 0.0);
    }

    #[test]
    fn missing_date_scores_zero() {
        let a = event("a", EventType::StockCrash, None);
        let b = event("b", EventType::StockCrash, Some("2008-09-15"));
        assert_eq!(temporal().score(&a, &b), 0.0);
        assert_eq!(temporal().score(&b, &a), 0.0);
    }

    #[test]
    fn reversed_dates_score_zero() {
        let a = event("a", EventType::StockCrash, Some("2008-09-20"));
        let b = event("b", EventType::StockCrash, Some("2008-09-15"));
        assert_eq!(temporal().score(&a, &b), 0.0);
    }

    #[test]
    fn oversized_k_is_clamped_to_one() {
        let signal = TemporalSignal { k: 2.0, ..temporal() };
        let a = event("a", EventType::StockCrash, Some("2008-09-15"));
        let b = event("b", EventType::StockCrash, Some("2008-09-15"));
        assert_eq!(signal.score(&a, &b), 1.0);
    }

    // --- entity overlap ---

    #[test]
    fn empty_entity_set_scores_zero() {
        let a = event("a", EventType::StockCrash, None);
        let mut b = event("b", EventType::StockCrash, None);
        b.entities.insert("ent_lehman".to_string());
        assert_eq!(EntityOverlapSignal.score(&a, &b), 0.0);
    }

    #[test]
    fn identical_sets_score_one() {
        let mut a = event("a", EventType::StockCrash, None);
        let mut b = event("b", EventType::StockCrash, None);
        for e in ["ent_lehman", "ent_moodys"] {
            a.entities.insert(e.to_string());
            b.entities.insert(e.to_string());
        }
        assert_eq!(EntityOverlapSignal.score(&a, &b), 1.0);
    }

    #[test]
    fn shared_actor_boost_applies_and_caps() {
        let mut a = event("a", EventType::StockCrash, None);
        let mut b = event("b", EventType::StockCrash, None);
        a.actor = Some("ent_lehman".to_string());
        b.actor = Some("ent_lehman".to_string());
        // Empty sets: boost alone.
        assert_eq!(EntityOverlapSignal.score(&a, &b), 0.2);

        // Identical sets: 1.0 + boost caps at 1.0.
        a.entities.insert("ent_lehman".to_string());
        b.entities.insert("ent_lehman".to_string());
        assert_eq!(EntityOverlapSignal.score(&a, &b), 1.0);
    }

    #[test]
    fn different_actors_get_no_boost() {
        let mut a = event("a", EventType::StockCrash, None);
        let mut b = event("b", EventType::StockCrash, None);
        a.actor = Some("ent_lehman".to_string());
        b.actor = Some("ent_aig".to_string());
        assert_eq!(EntityOverlapSignal.score(&a, &b), 0.0);
    }

    // --- semantic ---

    #[test]
    fn identical_description_and_type_scores_one() {
        let mut a = event("a", EventType::BankRun, None);
        let mut b = event("b", EventType::BankRun, None);
        a.description = "Depositors withdraw savings from Northern Rock".to_string();
        b.description = a.description.clone();
        assert!((KeywordSemanticSignal.score(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn short_tokens_and_stop_words_are_ignored() {
        let kw = keywords("The big bank run that they saw");
        assert!(kw.contains("bank"));
        assert!(!kw.contains("big"), "3-letter token should be dropped");
        assert!(!kw.contains("that"), "stop word should be dropped");
        assert!(!kw.contains("run"), "3-letter token should be dropped");
    }

    #[test]
    fn disjoint_descriptions_same_type_score_type_term_only() {
        let mut a = event("a", EventType::BankRun, None);
        let mut b = event("b", EventType::BankRun, None);
        a.description = "withdrawal queues overnight".to_string();
        b.description = "deposit flight elsewhere".to_string();
        assert!((KeywordSemanticSignal.score(&a, &b) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn embedding_backend_uses_cosine_and_falls_back() {
        let mut table = HashMap::new();
        table.insert("a".to_string(), vec![1.0, 0.0]);
        table.insert("b".to_string(), vec![1.0, 0.0]);
        table.insert("c".to_string(), vec![0.0, 1.0]);
        let signal = EmbeddingSemanticSignal::new(Arc::new(table));

        let a = event("a", EventType::StockCrash, None);
        let b = event("b", EventType::StockCrash, None);
        let c = event("c", EventType::StockCrash, None);
        assert!((signal.score(&a, &b) - 1.0).abs() < 1e-12);
        assert_eq!(signal.score(&a, &c), 0.0);

        // No embedding for "d": keyword fallback (same type, empty text).
        let d = event("d", EventType::StockCrash, None);
        assert!((signal.score(&a, &d) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn negative_cosine_clamps_to_zero() {
        let mut table = HashMap::new();
        table.insert("a".to_string(), vec![1.0, 0.0]);
        table.insert("b".to_string(), vec![-1.0, 0.0]);
        let signal = EmbeddingSemanticSignal::new(Arc::new(table));
        let a = event("a", EventType::StockCrash, None);
        let b = event("b", EventType::StockCrash, None);
        assert_eq!(signal.score(&a, &b), 0.0);
    }

    // --- topic / causality / emotional ---

    #[test]
    fn shared_topic_group_scores_one() {
        let tax = Arc::new(Taxonomy::financial());
        let a = event("a", EventType::CreditDowngrade, None);
        let b = event("b", EventType::DebtDefault, None);
        assert_eq!(TopicSignal::new(tax).score(&a, &b), 1.0);
    }

    #[test]
    fn related_topic_groups_score_related() {
        let tax = Arc::new(Taxonomy::financial());
        // stock_crash → Market, credit_downgrade → Credit: related pair.
        let a = event("a", EventType::StockCrash, None);
        let b = event("b", EventType::CreditDowngrade, None);
        assert_eq!(TopicSignal::new(tax).score(&a, &b), 0.7);
    }

    #[test]
    fn unmapped_types_score_same_domain_default() {
        let tax = Arc::new(Taxonomy::financial());
        let a = event("a", EventType::Unknown, None);
        let b = event("b", EventType::Unknown, None);
        assert_eq!(TopicSignal::new(tax).score(&a, &b), 0.3);
    }

    #[test]
    fn direct_causal_pattern_scores_direct() {
        let tax = Arc::new(Taxonomy::financial());
        let a = event("a", EventType::CreditDowngrade, None);
        let b = event("b", EventType::DebtDefault, None);
        assert_eq!(CausalitySignal::new(tax).score(&a, &b), 0.9);
    }

    #[test]
    fn transitive_causal_path_scores_transitive() {
        let tax = Arc::new(Taxonomy::financial());
        let a = event("a", EventType::EarningsWarning, None);
        let b = event("b", EventType::Contagion, None);
        assert_eq!(CausalitySignal::new(tax).score(&a, &b), 0.6);
    }

    #[test]
    fn no_causal_path_scores_zero() {
        let tax = Arc::new(Taxonomy::financial());
        let a = event("a", EventType::MergerAcquisition, None);
        let b = event("b", EventType::BankRun, None);
        assert_eq!(CausalitySignal::new(tax).score(&a, &b), 0.0);
    }

    #[test]
    fn same_type_is_emotionally_consistent() {
        let tax = Arc::new(Taxonomy::financial());
        let a = event("a", EventType::DebtDefault, None);
        let b = event("b", EventType::DebtDefault, None);
        assert_eq!(EmotionalSignal::new(tax).score(&a, &b), 1.0);
    }

    #[test]
    fn sentiment_gap_reduces_consistency() {
        let tax = Arc::new(Taxonomy::financial());
        // merger_acquisition 0.4 vs debt_default -0.9: EVI 1.3 → clamped 0.
        let a = event("a", EventType::MergerAcquisition, None);
        let b = event("b", EventType::DebtDefault, None);
        assert_eq!(EmotionalSignal::new(tax).score(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_boundaries() {
        let empty = BTreeSet::new();
        let set: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        assert_eq!(jaccard(&empty, &set), 0.0);
        assert_eq!(jaccard(&set, &set), 1.0);
    }
}
