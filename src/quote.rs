//! Price feed client
//!
//! `GET {price_api_url}?fsym=MUSIC&tsyms=BTC,USD` answers with
//! `{"BTC": 1.2e-7, "USD": 0.0011}`. Unknown symbols come back as a 200 with
//! `{"Response": "Error", "Message": ...}`, which we treat as malformed.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::PriceQuote;

const RESOURCE: &str = "price";

#[derive(Debug, Clone)]
pub struct QuoteClient {
    endpoint: String,
    http: reqwest::Client,
}

impl QuoteClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            endpoint: config.price_api_url.trim().to_string(),
            http,
        }
    }

    pub fn quote_url(&self, base_symbol: &str, target_symbols: &[String]) -> String {
        let targets = target_symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "{}?fsym={}&tsyms={}",
            self.endpoint,
            urlencoding::encode(base_symbol.trim()),
            targets
        )
    }

    /// Single attempt; retrying is the scheduler's business
    pub async fn fetch_quote(
        &self,
        base_symbol: &str,
        target_symbols: &[String],
    ) -> Result<PriceQuote, FetchError> {
        let url = self.quote_url(base_symbol, target_symbols);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::network(RESOURCE, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(RESOURCE, e))?;

        decode_quote(base_symbol, target_symbols, status, &body)
    }
}

/// Decode a price service response. Every requested symbol must map to a
/// finite number.
pub fn decode_quote(
    base_symbol: &str,
    target_symbols: &[String],
    status: StatusCode,
    body: &[u8],
) -> Result<PriceQuote, FetchError> {
    if !status.is_success() {
        return Err(FetchError::network(
            RESOURCE,
            format!("price service returned {}", status),
        ));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::malformed(RESOURCE, e.to_string()))?;

    if value.get("Response").and_then(Value::as_str) == Some("Error") {
        let message = value
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or("price service error");
        return Err(FetchError::malformed(RESOURCE, message));
    }

    let mut rates = BTreeMap::new();
    for symbol in target_symbols.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let rate = value
            .get(symbol)
            .and_then(Value::as_f64)
            .filter(|r| r.is_finite())
            .ok_or_else(|| {
                FetchError::malformed(RESOURCE, format!("missing rate for {}", symbol))
            })?;
        rates.insert(symbol.to_string(), rate);
    }

    Ok(PriceQuote {
        base: base_symbol.trim().to_string(),
        rates,
    })
}
