use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }

    /// +1 for purchases, -1 for sales.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("Unknown transaction side: {}", other)),
        }
    }
}

// One buy or sell event. Quantity, price and amount are always stored as
// unsigned magnitudes; direction lives in `side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub portfolio: String,
    pub side: Side,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

impl TransactionRecord {
    pub fn new(id: Uuid, input: NewTransaction) -> Self {
        Self {
            id,
            date: input.date,
            portfolio: input.portfolio,
            side: input.side,
            ticker: input.ticker,
            quantity: input.quantity,
            price: input.price,
            amount: input.quantity * input.price,
        }
    }

    pub fn signed_quantity(&self) -> f64 {
        self.side.sign() * self.quantity
    }

    pub fn signed_amount(&self) -> f64 {
        self.side.sign() * self.amount
    }
}

/// Raw request body for creating or editing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub portfolio: String,
    pub side: Side,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
}

/// A validated, normalized transaction ready to be written to a ledger store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub portfolio: String,
    pub side: Side,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
}

impl NewTransaction {
    pub fn amount(&self) -> f64 {
        self.quantity * self.price
    }
}

// Row shape of the `transactions` table; `side` is kept as text in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub trade_date: NaiveDate,
    pub portfolio: String,
    pub side: String,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = String;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            date: row.trade_date,
            portfolio: row.portfolio,
            side: row.side.parse()?,
            ticker: row.ticker,
            quantity: row.quantity,
            price: row.price,
            amount: row.amount,
        })
    }
}

/// All transactions for one ticker, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct TickerLedger {
    pub ticker: String,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub ticker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub ledger_available: bool,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize)]
pub struct TickerLedgerList {
    pub ledger_available: bool,
    pub tickers: Vec<TickerLedger>,
}

#[derive(Debug, Serialize)]
pub struct CreatedTransaction {
    pub id: Uuid,
}
