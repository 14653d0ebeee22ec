use std::collections::BTreeSet;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// --- Event taxonomy ---

/// Closed taxonomy of financial event types. Source rows with a type outside
/// the taxonomy deserialize to `Unknown` rather than failing ingestion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CreditDowngrade,
    DebtDefault,
    Bankruptcy,
    BankRun,
    StockCrash,
    MarketVolatility,
    LiquidityCrisis,
    Contagion,
    Bailout,
    RateChange,
    RegulatoryAction,
    AccountingFraud,
    MergerAcquisition,
    EarningsWarning,
    SovereignDebtCrisis,
    CurrencyCrisis,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::CreditDowngrade => write!(f, "credit_downgrade"),
            EventType::DebtDefault => write!(f, "debt_default"),
            EventType::Bankruptcy => write!(f, "bankruptcy"),
            EventType::BankRun => write!(f, "bank_run"),
            EventType::StockCrash => write!(f, "stock_crash"),
            EventType::MarketVolatility => write!(f, "market_volatility"),
            EventType::LiquidityCrisis => write!(f, "liquidity_crisis"),
            EventType::Contagion => write!(f, "contagion"),
            EventType::Bailout => write!(f, "bailout"),
            EventType::RateChange => write!(f, "rate_change"),
            EventType::RegulatoryAction => write!(f, "regulatory_action"),
            EventType::AccountingFraud => write!(f, "accounting_fraud"),
            EventType::MergerAcquisition => write!(f, "merger_acquisition"),
            EventType::EarningsWarning => write!(f, "earnings_warning"),
            EventType::SovereignDebtCrisis => write!(f, "sovereign_debt_crisis"),
            EventType::CurrencyCrisis => write!(f, "currency_crisis"),
            EventType::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    FinancialInstitution,
    Regulator,
    Sovereign,
    Corporate,
    Fund,
    Other,
}

// --- Records ---

/// A historical financial event, already entity-resolved by ingestion.
/// Immutable once constructed; the scoring core never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    /// Stable, unique identifier assigned by ingestion.
    pub id: String,
    /// Calendar date (no time-of-day). `None` when the source row carried no
    /// parseable date; such events still participate in scoring, with the
    /// temporal signal contributing zero.
    pub date: Option<NaiveDate>,
    pub event_type: EventType,
    /// Canonical identifier of the acting entity, when extracted.
    pub actor: Option<String>,
    /// Canonical identifier of the affected entity, when extracted.
    pub target: Option<String>,
    /// Canonical identifiers of all entities associated with the event.
    pub entities: BTreeSet<String>,
    pub description: String,
}

/// A resolved entity. Consumed for signal enrichment only; entity lifecycle
/// belongs to the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub category: EntityCategory,
}

// --- Evolution links ---

/// The six per-pair signal scores, each rounded to 4 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentScores {
    pub temporal: f64,
    pub entity_overlap: f64,
    pub semantic: f64,
    pub topic: f64,
    pub causality: f64,
    pub emotional: f64,
}

/// A directed "evolves-to" edge between two events, always forward in time.
/// Created exactly once per accepted pair and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvolutionLink {
    pub source_id: String,
    pub target_id: String,
    /// Weighted composite of the six component scores, in [0, 1].
    pub composite: f64,
    pub components: ComponentScores,
}

impl EvolutionLink {
    /// Flatten the link into graph-edge properties: two node identifiers, a
    /// weight, and the component scores as auxiliary properties.
    pub fn edge_properties(&self) -> serde_json::Value {
        serde_json::json!({
            "source": self.source_id,
            "target": self.target_id,
            "weight": self.composite,
            "temporal": self.components.temporal,
            "entity_overlap": self.components.entity_overlap,
            "semantic": self.components.semantic,
            "topic": self.components.topic,
            "causality": self.components.causality,
            "emotional": self.components.emotional,
        })
    }
}
