//! Pool API client
//!
//! One GET per resource under `{api_url}/api/`. Responses come back as the
//! lenient payload types from [`crate::models`]; interpreting them is the
//! aggregator's job.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{Account, BlocksResponse, MinersResponse, PaymentsResponse, PoolStats};

/// Resource names used in errors and log lines
pub mod resources {
    pub const STATS: &str = "stats";
    pub const ACCOUNT: &str = "account";
    pub const BLOCKS: &str = "blocks";
    pub const PAYMENTS: &str = "payments";
    pub const MINERS: &str = "miners";
}

#[derive(Debug, Clone)]
pub struct PoolClient {
    base_url: String,
    http: reqwest::Client,
}

impl PoolClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Result<Self, FetchError> {
        Ok(Self {
            base_url: normalize_base_url(&config.api_url)?,
            http,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn account_path(login: &str) -> String {
        format!("accounts/{}", urlencoding::encode(login.trim()))
    }

    pub async fn fetch_stats(&self) -> Result<PoolStats, FetchError> {
        self.get_json(resources::STATS, "stats").await
    }

    /// Fetch one miner's account. A 404 here means the login is unknown to
    /// the pool and surfaces as [`FetchError::NotFound`].
    pub async fn fetch_account(&self, login: &str) -> Result<Account, FetchError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(FetchError::NotFound {
                login: String::new(),
            });
        }

        let response = self
            .send_get(resources::ACCOUNT, &Self::account_path(login))
            .await?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(resources::ACCOUNT, e))?;

        decode_account(login, status, &body)
    }

    pub async fn fetch_blocks(&self) -> Result<BlocksResponse, FetchError> {
        self.get_json(resources::BLOCKS, "blocks").await
    }

    pub async fn fetch_payments(&self) -> Result<PaymentsResponse, FetchError> {
        self.get_json(resources::PAYMENTS, "payments").await
    }

    pub async fn fetch_miners(&self) -> Result<MinersResponse, FetchError> {
        self.get_json(resources::MINERS, "miners").await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        path: &str,
    ) -> Result<T, FetchError> {
        let response = self.send_get(resource, path).await?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(resource, e))?;

        decode_body(resource, status, &body)
    }

    async fn send_get(&self, resource: &str, path: &str) -> Result<reqwest::Response, FetchError> {
        let url = self.endpoint(path);
        tracing::debug!("GET {}", url);

        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::network(resource, e))
    }
}

/// Decode a pool response body: non-2xx becomes `HttpStatus`, a body that
/// is not the expected JSON becomes `Malformed`.
pub fn decode_body<T: DeserializeOwned>(
    resource: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<T, FetchError> {
    if !status.is_success() {
        return Err(FetchError::http_status(resource, status, body));
    }

    serde_json::from_slice(body).map_err(|e| FetchError::malformed(resource, e.to_string()))
}

pub fn decode_account(login: &str, status: StatusCode, body: &[u8]) -> Result<Account, FetchError> {
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound {
            login: login.to_string(),
        });
    }

    decode_body(resources::ACCOUNT, status, body)
}

fn normalize_base_url(base_url: &str) -> Result<String, FetchError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(FetchError::malformed("config", "api_url is empty"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
