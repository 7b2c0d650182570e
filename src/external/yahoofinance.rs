use crate::external::price_provider::{ensure_positive, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use serde::Deserialize;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API. No API key required.
///
/// Tickers are stored without an exchange suffix, so the configured suffix
/// (e.g. `.IS` for Borsa Istanbul) is appended before the lookup unless the
/// ticker already carries one.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    symbol_suffix: String,
}

impl YahooFinanceProvider {
    pub fn new(symbol_suffix: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; FolioLedger/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            symbol_suffix: symbol_suffix.into(),
        }
    }

    pub fn symbol_for(&self, ticker: &str) -> String {
        if self.symbol_suffix.is_empty() || ticker.contains('.') {
            ticker.to_string()
        } else {
            format!("{}{}", ticker, self.symbol_suffix)
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    close: Vec<Option<f64>>,
}

fn last_close(body: YahooChartResponse) -> Result<f64, PriceProviderError> {
    if let Some(error) = body.chart.error {
        if error.description.contains("No data found") {
            return Err(PriceProviderError::NotFound);
        }
        return Err(PriceProviderError::BadResponse(error.description));
    }

    let result = body.chart.result
        .and_then(|mut r| r.pop())
        .ok_or(PriceProviderError::NotFound)?;

    let quote = result.indicators.quote
        .into_iter()
        .next()
        .ok_or_else(|| PriceProviderError::BadResponse("No quote data in response".into()))?;

    // Closes are null on non-trading intervals; take the most recent real one.
    let close = quote.close
        .into_iter()
        .rev()
        .flatten()
        .next()
        .ok_or(PriceProviderError::NotFound)?;

    ensure_positive(close)
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    async fn fetch_latest(&self, ticker: &str) -> Result<f64, PriceProviderError> {
        let url = format!("{}/{}", CHART_URL, self.symbol_for(ticker));

        let resp = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        match resp.status() {
            s if s == reqwest::StatusCode::NOT_FOUND => return Err(PriceProviderError::NotFound),
            s if s == reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            s if !s.is_success() => {
                return Err(PriceProviderError::BadResponse(format!("HTTP {}", s)));
            }
            _ => {}
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        last_close(body)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> YahooChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_symbol_suffix_applied_once() {
        let provider = YahooFinanceProvider::new(".IS");
        assert_eq!(provider.symbol_for("TOASO"), "TOASO.IS");
        assert_eq!(provider.symbol_for("AAPL.US"), "AAPL.US");

        let bare = YahooFinanceProvider::new("");
        assert_eq!(bare.symbol_for("AAPL"), "AAPL");
    }

    #[test]
    fn test_last_close_skips_trailing_nulls() {
        let body = parse(r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[101.5,102.25,null]}]}}],"error":null}}"#);
        assert_eq!(last_close(body).unwrap(), 102.25);
    }

    #[test]
    fn test_no_data_error_maps_to_not_found() {
        let body = parse(r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#);
        assert!(matches!(last_close(body), Err(PriceProviderError::NotFound)));
    }

    #[test]
    fn test_all_null_closes_are_not_a_price() {
        let body = parse(r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[null,null]}]}}],"error":null}}"#);
        assert!(matches!(last_close(body), Err(PriceProviderError::NotFound)));
    }

    #[test]
    fn test_zero_close_rejected() {
        let body = parse(r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[0.0]}]}}],"error":null}}"#);
        assert!(matches!(last_close(body), Err(PriceProviderError::BadResponse(_))));
    }
}
