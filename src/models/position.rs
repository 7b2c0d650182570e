use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Net holdings of one ticker before any price is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetPosition {
    pub ticker: String,
    pub net_quantity: f64,
    pub net_cost: f64,
}

/// Where the price used for a valuation row came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum PriceState {
    Quote(f64),
    Manual(f64),
    Unresolved,
}

impl PriceState {
    pub fn value(&self) -> Option<f64> {
        match self {
            PriceState::Quote(p) | PriceState::Manual(p) => Some(*p),
            PriceState::Unresolved => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, PriceState::Unresolved)
    }
}

/// Result of a single quote lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceLookup {
    Resolved(f64),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub ticker: String,
    pub net_quantity: f64,
    pub net_cost: f64,
    pub price: PriceState,
    pub market_value: f64,
    pub profit_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub total_cost: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
    // None when the cost basis is zero
    pub return_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioValuation {
    pub positions: Vec<PositionSummary>,
    pub totals: PortfolioTotals,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub ledger_available: bool,
    #[serde(flatten)]
    pub valuation: PortfolioValuation,
}

/// Manual prices supplied by the client for tickers without a quote.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub overrides: HashMap<String, f64>,
}
