pub mod alphavantage;
pub mod multi_provider;
pub mod price_provider;
pub mod yahoofinance;
