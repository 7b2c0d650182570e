use crate::external::price_provider::{ensure_positive, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use serde::Deserialize;

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<AvGlobalQuote>,

    // When rate-limited Alpha Vantage returns:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // Newer throttle responses use "Information" instead of "Note"
    #[serde(rename = "Information")]
    information: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

fn quote_price(body: AvQuoteResponse) -> Result<f64, PriceProviderError> {
    if body.note.is_some() || body.information.is_some() {
        return Err(PriceProviderError::RateLimited);
    }

    if let Some(msg) = body.error_message {
        return Err(PriceProviderError::BadResponse(msg));
    }

    // Unknown symbols come back as an empty "Global Quote" object.
    let raw = body
        .global_quote
        .and_then(|q| q.price)
        .ok_or(PriceProviderError::NotFound)?;

    let price = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

    ensure_positive(price)
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_latest(&self, ticker: &str) -> Result<f64, PriceProviderError> {
        let url = "https://www.alphavantage.co/query";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", ticker),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }

        let body = resp
            .json::<AvQuoteResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        quote_price(body)
    }

    fn name(&self) -> &'static str {
        "alphavantage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AvQuoteResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_price_extracted_from_global_quote() {
        let body = parse(r#"{"Global Quote":{"01. symbol":"IBM","05. price":"182.5200"}}"#);
        assert_eq!(quote_price(body).unwrap(), 182.52);
    }

    #[test]
    fn test_empty_global_quote_is_not_found() {
        let body = parse(r#"{"Global Quote":{}}"#);
        assert!(matches!(quote_price(body), Err(PriceProviderError::NotFound)));
    }

    #[test]
    fn test_throttle_note_is_rate_limited() {
        let body = parse(r#"{"Note":"Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#);
        assert!(matches!(quote_price(body), Err(PriceProviderError::RateLimited)));
    }
}
