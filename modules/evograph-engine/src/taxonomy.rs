use std::collections::{BTreeMap, BTreeSet};

use evograph_common::EventType;

/// Topic groups the event taxonomy maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TopicGroup {
    Credit,
    Market,
    Regulatory,
    Corporate,
    Systemic,
}

/// Immutable domain lookup tables backing the rule-based signals: topic
/// groups per event type, the related-topic pairs, the causal-pattern
/// adjacency, and the sentiment map. Injected at construction as a value;
/// workers share it read-only, never through a mutable singleton.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    topic_groups: BTreeMap<EventType, Vec<TopicGroup>>,
    related_topics: BTreeSet<(TopicGroup, TopicGroup)>,
    causal_effects: BTreeMap<EventType, Vec<EventType>>,
    sentiment: BTreeMap<EventType, f64>,
    default_sentiment: f64,
}

impl Taxonomy {
    /// The built-in financial-crisis taxonomy.
    pub fn financial() -> Self {
        use EventType::*;
        use TopicGroup::*;

        let mut topic_groups: BTreeMap<EventType, Vec<TopicGroup>> = BTreeMap::new();
        topic_groups.insert(CreditDowngrade, vec![Credit]);
        topic_groups.insert(DebtDefault, vec![Credit]);
        topic_groups.insert(Bankruptcy, vec![Credit, Corporate]);
        topic_groups.insert(BankRun, vec![Credit, Systemic]);
        topic_groups.insert(StockCrash, vec![Market]);
        topic_groups.insert(MarketVolatility, vec![Market]);
        topic_groups.insert(LiquidityCrisis, vec![Credit, Systemic]);
        topic_groups.insert(Contagion, vec![Systemic]);
        topic_groups.insert(Bailout, vec![Regulatory, Systemic]);
        topic_groups.insert(RateChange, vec![Market, Regulatory]);
        topic_groups.insert(RegulatoryAction, vec![Regulatory]);
        topic_groups.insert(AccountingFraud, vec![Corporate, Regulatory]);
        topic_groups.insert(MergerAcquisition, vec![Corporate]);
        topic_groups.insert(EarningsWarning, vec![Corporate, Market]);
        topic_groups.insert(SovereignDebtCrisis, vec![Credit, Systemic]);
        topic_groups.insert(CurrencyCrisis, vec![Market, Systemic]);
        // Unknown intentionally unmapped.

        let related_topics: BTreeSet<(TopicGroup, TopicGroup)> = [
            (Credit, Market),
            (Credit, Systemic),
            (Credit, Corporate),
            (Market, Systemic),
            (Regulatory, Corporate),
            (Regulatory, Systemic),
        ]
        .into_iter()
        .collect();

        let mut causal_effects: BTreeMap<EventType, Vec<EventType>> = BTreeMap::new();
        causal_effects.insert(CreditDowngrade, vec![DebtDefault, StockCrash, Contagion, LiquidityCrisis]);
        causal_effects.insert(DebtDefault, vec![Bankruptcy, BankRun, Contagion]);
        causal_effects.insert(Bankruptcy, vec![StockCrash, MarketVolatility, Contagion]);
        causal_effects.insert(BankRun, vec![LiquidityCrisis, Contagion, Bailout]);
        causal_effects.insert(StockCrash, vec![MarketVolatility, Contagion]);
        causal_effects.insert(MarketVolatility, vec![StockCrash, CurrencyCrisis]);
        causal_effects.insert(LiquidityCrisis, vec![BankRun, DebtDefault, Bailout]);
        causal_effects.insert(Contagion, vec![BankRun, StockCrash, CurrencyCrisis, SovereignDebtCrisis]);
        causal_effects.insert(AccountingFraud, vec![CreditDowngrade, StockCrash, Bankruptcy, RegulatoryAction]);
        causal_effects.insert(EarningsWarning, vec![CreditDowngrade, StockCrash]);
        causal_effects.insert(SovereignDebtCrisis, vec![CurrencyCrisis, DebtDefault, Contagion]);
        causal_effects.insert(CurrencyCrisis, vec![SovereignDebtCrisis, MarketVolatility]);
        causal_effects.insert(RateChange, vec![MarketVolatility, CurrencyCrisis, LiquidityCrisis]);
        causal_effects.insert(RegulatoryAction, vec![MergerAcquisition, Bailout]);
        causal_effects.insert(Bailout, vec![RegulatoryAction, MergerAcquisition]);

        let mut sentiment: BTreeMap<EventType, f64> = BTreeMap::new();
        sentiment.insert(CreditDowngrade, -0.6);
        sentiment.insert(DebtDefault, -0.9);
        sentiment.insert(Bankruptcy, -0.9);
        sentiment.insert(BankRun, -0.8);
        sentiment.insert(StockCrash, -0.8);
        sentiment.insert(MarketVolatility, -0.5);
        sentiment.insert(LiquidityCrisis, -0.7);
        sentiment.insert(Contagion, -0.85);
        sentiment.insert(Bailout, 0.3);
        sentiment.insert(RateChange, -0.1);
        sentiment.insert(RegulatoryAction, -0.2);
        sentiment.insert(AccountingFraud, -0.75);
        sentiment.insert(MergerAcquisition, 0.4);
        sentiment.insert(EarningsWarning, -0.4);
        sentiment.insert(SovereignDebtCrisis, -0.85);
        sentiment.insert(CurrencyCrisis, -0.8);

        Self {
            topic_groups,
            related_topics,
            causal_effects,
            sentiment,
            default_sentiment: -0.5,
        }
    }

    /// Topic groups for an event type; empty when unmapped.
    pub fn topics(&self, event_type: EventType) -> &[TopicGroup] {
        self.topic_groups
            .get(&event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether two distinct topic groups are in the related-pairs table
    /// (order-insensitive).
    pub fn topics_related(&self, a: TopicGroup, b: TopicGroup) -> bool {
        self.related_topics.contains(&(a, b)) || self.related_topics.contains(&(b, a))
    }

    /// Plausible direct effects of a cause event type; empty when unmapped.
    pub fn direct_effects(&self, cause: EventType) -> &[EventType] {
        self.causal_effects
            .get(&cause)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_direct_effect(&self, cause: EventType, effect: EventType) -> bool {
        self.direct_effects(cause).contains(&effect)
    }

    /// Whether a 2-hop causal path cause → mid → effect exists through one
    /// intermediate type.
    pub fn has_two_hop_path(&self, cause: EventType, effect: EventType) -> bool {
        self.direct_effects(cause)
            .iter()
            .any(|mid| *mid != cause && *mid != effect && self.is_direct_effect(*mid, effect))
    }

    /// Sentiment in [-1, 1] for an event type; unmapped types get the default.
    pub fn sentiment(&self, event_type: EventType) -> f64 {
        self.sentiment
            .get(&event_type)
            .copied()
            .unwrap_or(self.default_sentiment)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::financial()
    }
}
