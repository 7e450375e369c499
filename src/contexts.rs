//! The five view contexts: what each refresh cycle fetches and how it is
//! turned into a view.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;

use crate::aggregate;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{
    AccountView, BlocksView, DashboardView, MinersView, PaymentsView, PriceQuote,
};
use crate::pool_api::PoolClient;
use crate::quote::QuoteClient;
use crate::scheduler::RefreshContext;

/// Capture instant for time-windowed aggregates, taken once per cycle
fn capture_time_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Pool and price clients sharing one HTTP connection pool
#[derive(Debug, Clone)]
pub struct Clients {
    pub config: Arc<Config>,
    pub pool: PoolClient,
    pub quotes: QuoteClient,
}

impl Clients {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pooldash/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let pool = PoolClient::new(&config, http.clone()).context("Invalid pool API URL")?;
        let quotes = QuoteClient::new(&config, http);

        Ok(Self {
            config,
            pool,
            quotes,
        })
    }

    async fn fetch_quote(&self) -> Result<PriceQuote, FetchError> {
        self.quotes
            .fetch_quote(&self.config.coin_name, &self.config.quote_currencies)
            .await
    }
}

pub struct DashboardContext(pub Clients);

#[async_trait]
impl RefreshContext for DashboardContext {
    type View = DashboardView;

    fn name(&self) -> &str {
        "dashboard"
    }

    /// Pool stats drive the cycle. A price failure only drops the price
    /// section for this cycle.
    async fn refresh(&mut self) -> Result<DashboardView, FetchError> {
        let clients = &self.0;
        let (stats, quote) = tokio::join!(clients.pool.fetch_stats(), clients.fetch_quote());
        let stats = stats?;

        let price = match quote {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!(context = self.name(), "price unavailable: {}", e);
                None
            }
        };

        Ok(aggregate::dashboard_view(stats, &clients.config, price))
    }
}

pub struct AccountContext {
    clients: Clients,
    login: String,
}

impl AccountContext {
    pub fn new(clients: Clients, login: &str) -> Self {
        Self {
            clients,
            login: login.trim().to_string(),
        }
    }
}

#[async_trait]
impl RefreshContext for AccountContext {
    type View = AccountView;

    fn name(&self) -> &str {
        "account"
    }

    /// Account, pool stats and price are fetched together. The account
    /// result is checked first so an unknown login always ends the cycle as
    /// `NotFound`, whatever else failed alongside it.
    async fn refresh(&mut self) -> Result<AccountView, FetchError> {
        let clients = &self.clients;
        let (account, stats, quote) = tokio::join!(
            clients.pool.fetch_account(&self.login),
            clients.pool.fetch_stats(),
            clients.fetch_quote(),
        );
        let account = account?;

        Ok(aggregate::compute_account_view(
            &self.login,
            account,
            &stats?,
            quote?,
            capture_time_millis(),
        ))
    }
}

pub struct BlocksContext(pub Clients);

#[async_trait]
impl RefreshContext for BlocksContext {
    type View = BlocksView;

    fn name(&self) -> &str {
        "blocks"
    }

    async fn refresh(&mut self) -> Result<BlocksView, FetchError> {
        let raw = self.0.pool.fetch_blocks().await?;
        Ok(aggregate::classify_blocks(raw, capture_time_millis()))
    }
}

pub struct PaymentsContext(pub Clients);

#[async_trait]
impl RefreshContext for PaymentsContext {
    type View = PaymentsView;

    fn name(&self) -> &str {
        "payments"
    }

    async fn refresh(&mut self) -> Result<PaymentsView, FetchError> {
        let raw = self.0.pool.fetch_payments().await?;
        Ok(aggregate::payments_view(raw))
    }
}

pub struct MinersContext(pub Clients);

#[async_trait]
impl RefreshContext for MinersContext {
    type View = MinersView;

    fn name(&self) -> &str {
        "miners"
    }

    async fn refresh(&mut self) -> Result<MinersView, FetchError> {
        let raw = self.0.pool.fetch_miners().await?;
        Ok(aggregate::miners_view(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{self, Disposition};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    const UNLISTED_COIN: &str = "There is no data for the symbol MUSIC .";

    fn clients_for(api_url: &str, price_api_url: &str) -> Clients {
        let mut config = Config::new();
        config.api_url = api_url.to_string();
        config.price_api_url = price_api_url.to_string();
        config.request_timeout_secs = 2;
        Clients::new(Arc::new(config)).unwrap()
    }

    fn unreachable_clients() -> Clients {
        // Port 9 (discard) on loopback: connection refused, no real traffic
        clients_for("http://127.0.0.1:9", "http://127.0.0.1:9/data/price")
    }

    /// Pool and price service on one local port. Account lookups answer 404
    /// after a delay, so the price reply always arrives first.
    async fn spawn_stub(price: Value) -> Clients {
        let app = Router::new()
            .route(
                "/api/accounts/:login",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
                }),
            )
            .route(
                "/api/stats",
                get(|| async { Json(json!({ "hashrate": 1500.0, "minersTotal": 3 })) }),
            )
            .route(
                "/data/price",
                get(move || {
                    let price = price.clone();
                    async move { Json(price) }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base = format!("http://{addr}");
        clients_for(&base, &format!("{base}/data/price"))
    }

    fn price_error() -> Value {
        json!({ "Response": "Error", "Message": UNLISTED_COIN })
    }

    #[tokio::test]
    async fn test_network_failure_is_not_terminal() {
        let mut context = AccountContext::new(unreachable_clients(), " 0xabc ");
        assert_eq!(context.login, "0xabc");

        let err = context.refresh().await.unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(policy::classify(&err), Disposition::Retry);
    }

    #[tokio::test]
    async fn test_unknown_account_wins_over_faster_price_error() {
        let clients = spawn_stub(price_error()).await;
        let mut context = AccountContext::new(clients, "0xabc");

        for _ in 0..3 {
            let err = context.refresh().await.unwrap_err();
            assert!(matches!(err, FetchError::NotFound { ref login } if login == "0xabc"));
            assert_eq!(policy::classify(&err), Disposition::Terminal);
        }
    }

    #[tokio::test]
    async fn test_dashboard_survives_price_outage() {
        let clients = spawn_stub(price_error()).await;
        let view = DashboardContext(clients).refresh().await.unwrap();

        assert!(view.price.is_none());
        assert_eq!(view.stats.hashrate, Some(1500.0));
        assert_eq!(view.stats.miners_total, Some(3));
    }

    #[tokio::test]
    async fn test_dashboard_includes_price() {
        let clients = spawn_stub(json!({ "BTC": 0.000001, "USD": 0.05 })).await;
        let view = DashboardContext(clients).refresh().await.unwrap();

        let price = view.price.unwrap();
        assert_eq!(price.base, "MUSIC");
        assert_eq!(price.rate("USD"), 0.05);
        assert_eq!(view.stats.hashrate, Some(1500.0));
    }

    #[test]
    fn test_context_names() {
        let clients = unreachable_clients();
        assert_eq!(DashboardContext(clients.clone()).name(), "dashboard");
        assert_eq!(BlocksContext(clients.clone()).name(), "blocks");
        assert_eq!(PaymentsContext(clients.clone()).name(), "payments");
        assert_eq!(MinersContext(clients).name(), "miners");
    }
}
