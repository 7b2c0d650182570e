mod position;
mod session;
mod transaction;

pub use position::{
    NetPosition, PortfolioTotals, PortfolioValuation, PositionSummary, PriceLookup, PriceState,
    SummaryRequest, SummaryResponse,
};
pub use session::{LoginRequest, LoginResponse, Session, SessionClaims};
pub use transaction::{
    CreatedTransaction, NewTransaction, Side, TickerLedger, TickerLedgerList, TransactionInput,
    TransactionList, TransactionQuery, TransactionRecord, TransactionRow,
};
