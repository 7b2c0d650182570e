//! Position aggregation and valuation.
//!
//! Everything here is a pure function of its inputs: no I/O, no clock, no
//! errors. Store and quote failures are absorbed by the callers before and
//! after these functions run.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    NetPosition, PortfolioTotals, PortfolioValuation, PositionSummary, PriceLookup, PriceState,
    TransactionRecord,
};
use crate::services::transaction_service::normalize_ticker;

/// Positions whose net quantity is at or below this are treated as closed.
pub const POSITION_EPSILON: f64 = 0.0001;

/// A cost basis smaller than this in magnitude counts as zero. Half of the
/// smallest amount a valid entry can carry (0.0001 shares at 0.01).
pub const COST_EPSILON: f64 = 0.000_000_5;

/// Folds transactions into net holdings per ticker.
///
/// Buys add and sells subtract both quantity and amount. Only tickers still
/// held (`net_quantity > POSITION_EPSILON`) appear in the result; closed and
/// oversold positions are dropped rather than reported as zero rows.
pub fn aggregate(records: &[TransactionRecord]) -> BTreeMap<String, NetPosition> {
    let mut totals: BTreeMap<String, NetPosition> = BTreeMap::new();

    for record in records {
        let ticker = normalize_ticker(&record.ticker);
        let entry = totals.entry(ticker.clone()).or_insert_with(|| NetPosition {
            ticker,
            net_quantity: 0.0,
            net_cost: 0.0,
        });
        entry.net_quantity += record.signed_quantity();
        entry.net_cost += record.signed_amount();
    }

    totals.retain(|_, p| p.net_quantity > POSITION_EPSILON);
    totals
}

/// Attaches a price to every held position.
///
/// A resolved quote wins. When the quote is missing, a manual override for
/// the ticker is used; otherwise the row stays `Unresolved` with a market
/// value of zero.
pub fn valuate(
    summary: &BTreeMap<String, NetPosition>,
    prices: &HashMap<String, PriceLookup>,
    overrides: &HashMap<String, f64>,
) -> Vec<PositionSummary> {
    summary
        .values()
        .map(|position| {
            let price = match prices.get(&position.ticker) {
                Some(PriceLookup::Resolved(p)) => PriceState::Quote(*p),
                _ => match overrides.get(&position.ticker) {
                    Some(p) => PriceState::Manual(*p),
                    None => PriceState::Unresolved,
                },
            };
            let market_value = price.value().map_or(0.0, |p| position.net_quantity * p);

            PositionSummary {
                ticker: position.ticker.clone(),
                net_quantity: position.net_quantity,
                net_cost: position.net_cost,
                price,
                market_value,
                profit_loss: market_value - position.net_cost,
            }
        })
        .collect()
}

pub fn summarize_totals(rows: &[PositionSummary]) -> PortfolioTotals {
    let total_cost: f64 = rows.iter().map(|r| r.net_cost).sum();
    let total_value: f64 = rows.iter().map(|r| r.market_value).sum();
    let total_profit_loss = total_value - total_cost;

    let return_pct = if total_cost.abs() < COST_EPSILON {
        None
    } else {
        Some(total_profit_loss / total_cost * 100.0).filter(|pct| pct.is_finite())
    };

    PortfolioTotals {
        total_cost,
        total_value,
        total_profit_loss,
        return_pct,
    }
}

/// Prices held positions and rolls them up, listing tickers still awaiting a price.
pub fn price_positions(
    summary: &BTreeMap<String, NetPosition>,
    prices: &HashMap<String, PriceLookup>,
    overrides: &HashMap<String, f64>,
) -> PortfolioValuation {
    let positions = valuate(summary, prices, overrides);
    let totals = summarize_totals(&positions);
    let unresolved = positions
        .iter()
        .filter(|p| p.price.is_unresolved())
        .map(|p| p.ticker.clone())
        .collect();

    PortfolioValuation {
        positions,
        totals,
        unresolved,
    }
}

pub fn build_valuation(
    records: &[TransactionRecord],
    prices: &HashMap<String, PriceLookup>,
    overrides: &HashMap<String, f64>,
) -> PortfolioValuation {
    price_positions(&aggregate(records), prices, overrides)
}
