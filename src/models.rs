//! Data models for pool API payloads and derived dashboard views
//!
//! Pool payloads are loosely typed: fields go missing, come back `null`, or
//! switch between numbers and numeric strings depending on the backend
//! version. Everything here deserializes leniently so one odd field never
//! costs us a whole poll.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// UNIT CONSTANTS
// ============================================================================

/// Round shares are reported in raw hash units; the dashboard shows them in
/// billions.
pub const SHARES_SCALE: f64 = 1_000_000_000.0;

/// Smallest units per whole coin (wei-style, 10^18)
pub const UNITS_PER_COIN: f64 = 1_000_000_000_000_000_000.0;

/// Length of the "today" window in milliseconds
pub const DAY_MILLIS: i64 = 86_400_000;

/// Quote currency codes the account view converts into
pub const BTC: &str = "BTC";
pub const USD: &str = "USD";

/// Convert a block reward in smallest units to whole coins
pub fn to_coins(reward: u128) -> f64 {
    reward as f64 / UNITS_PER_COIN
}

/// Divide two optional operands, yielding 0 for anything that is not a finite
/// non-zero result.
pub fn ratio_or_zero(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match (numerator, denominator) {
        (Some(n), Some(d)) => finite_or_zero(n / d),
        _ => 0.0,
    }
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// ============================================================================
// POOL PAYLOADS
// ============================================================================

/// `GET /api/stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub now: Option<i64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub stats: RoundStats,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub hashrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub miners_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub candidates_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub immature_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub matured_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStats {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub round_shares: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub last_block_found: Option<i64>,
}

/// Upstream node as seen by the pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub height: Option<u64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub difficulty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub last_beat: Option<i64>,
}

/// `GET /api/accounts/{login}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub round_shares: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub stats: AccountStats,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub payments: Vec<Payment>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub payments_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub hashrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub current_hashrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub workers: BTreeMap<String, Worker>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub workers_online: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub workers_offline: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub workers_total: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub balance: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub immature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub pending: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub paid: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub blocks_found: Option<u64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub last_share: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub hr2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub last_beat: Option<i64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub offline: bool,
}

/// Disbursement record. `address` is only present on the pool-wide list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub tx: Option<String>,
}

/// `GET /api/blocks`
///
/// Each list stays `None` when the pool omits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksResponse {
    #[serde(default)]
    pub candidates: Option<Vec<BlockRecord>>,
    #[serde(default)]
    pub immature: Option<Vec<BlockRecord>>,
    #[serde(default)]
    pub matured: Option<Vec<BlockRecord>>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub candidates_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub immature_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub matured_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub luck: BTreeMap<String, LuckWindow>,
}

/// Block as delivered by the pool, before classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub height: Option<u64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::u128")]
    pub reward: Option<u128>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub difficulty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub shares: Option<f64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub uncle: bool,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub uncle_height: Option<u64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub orphan: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LuckWindow {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub luck: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub uncle_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub orphan_rate: Option<f64>,
}

/// `GET /api/payments`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsResponse {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub payments: Vec<Payment>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub payments_total: Option<u64>,
}

/// `GET /api/miners`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinersResponse {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub now: Option<i64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub hashrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub miners_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub miners: BTreeMap<String, MinerStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerStats {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub last_beat: Option<i64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub offline: bool,
}

/// Exchange rates for one coin, captured at fetch time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

impl PriceQuote {
    /// Rate into `code`, or 0 when the quote does not carry it
    pub fn rate(&self, code: &str) -> f64 {
        self.rates.get(code).copied().map(finite_or_zero).unwrap_or(0.0)
    }
}

// ============================================================================
// DERIVED VIEWS
// ============================================================================

/// Block lifecycle state, taken from the list the pool returned it in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Maturity {
    /// Submitted, not yet confirmed
    Candidate,
    /// Confirmed, not yet eligible for payout
    Immature,
    /// Confirmed and eligible; reward is final
    Matured,
}

impl std::fmt::Display for Maturity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Maturity::Candidate => write!(f, "candidate"),
            Maturity::Immature => write!(f, "immature"),
            Maturity::Matured => write!(f, "matured"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub maturity: Maturity,
    #[serde(flatten)]
    pub record: BlockRecord,
}

impl Block {
    /// Reward in whole coins, 0 when the pool did not report one
    pub fn reward_coins(&self) -> f64 {
        self.record.reward.map(to_coins).unwrap_or(0.0)
    }

    /// Shares spent finding this block relative to its difficulty
    pub fn variance(&self) -> f64 {
        ratio_or_zero(self.record.shares, self.record.difficulty)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksView {
    pub candidates: Vec<Block>,
    pub immature: Vec<Block>,
    pub matured: Vec<Block>,
    pub candidates_total: u64,
    pub immature_total: u64,
    pub matured_total: u64,
    pub luck: BTreeMap<String, LuckWindow>,
    pub today_found_blocks_count: u64,
    pub today_coins_count: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Miner {
    pub login: String,
    pub hashrate: f64,
    pub last_beat: Option<i64>,
    pub offline: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinersView {
    pub miners: Vec<Miner>,
    pub miners_total: u64,
    pub hashrate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsView {
    pub payments: Vec<Payment>,
    pub payments_total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub login: String,
    pub round_percent: f64,
    pub round_shares: f64,
    pub all_shares: f64,
    pub total_paid_btc: f64,
    pub total_paid_usd: f64,
    pub paid_today_btc: f64,
    pub paid_today_usd: f64,
    pub account: Account,
    pub price: PriceQuote,
}

/// Pool stats passthrough plus the deployment's naming and coin price
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub application_name: String,
    pub coin_name: String,
    pub stats: PoolStats,
    /// Absent when the price service failed this cycle
    pub price: Option<PriceQuote>,
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

/// Field deserializers that accept numbers or numeric strings and map
/// anything unusable to `None`/default instead of failing the payload.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(number))
    }

    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| number(v).map(|f| f as i64)),
            _ => None,
        }))
    }

    pub fn u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(|v| match v {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }))
    }

    /// Block rewards overflow u64 on some chains and usually arrive as strings
    pub fn u128<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u128>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(|v| match v {
            Value::Number(n) => n
                .as_u64()
                .map(u128::from)
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u128)),
            Value::String(s) => s
                .trim()
                .parse::<u128>()
                .ok()
                .or_else(|| number(v).filter(|f| *f >= 0.0).map(|f| f as u128)),
            _ => None,
        }))
    }

    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::Bool(b)) => b,
            Some(ref v @ Value::Number(_)) => number(v).map(|n| n != 0.0).unwrap_or(false),
            _ => false,
        })
    }

    /// `null` becomes the default; a value of the wrong shape also does
    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + serde::de::DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(Some(1.0), Some(4.0)), 0.25);
        assert_eq!(ratio_or_zero(Some(1.0), Some(0.0)), 0.0);
        assert_eq!(ratio_or_zero(Some(0.0), Some(0.0)), 0.0);
        assert_eq!(ratio_or_zero(None, Some(2.0)), 0.0);
        assert_eq!(ratio_or_zero(Some(2.0), None), 0.0);
    }

    #[test]
    fn test_block_reward_from_string_or_number() {
        let as_string: BlockRecord =
            serde_json::from_value(serde_json::json!({ "reward": "5000000000000000000" })).unwrap();
        let as_number: BlockRecord =
            serde_json::from_value(serde_json::json!({ "reward": 5_000_000_000_000_000_000u64 }))
                .unwrap();
        let garbage: BlockRecord =
            serde_json::from_value(serde_json::json!({ "reward": "n/a" })).unwrap();

        assert_eq!(as_string.reward, Some(5_000_000_000_000_000_000));
        assert_eq!(as_number.reward, Some(5_000_000_000_000_000_000));
        assert_eq!(garbage.reward, None);
        assert_eq!(to_coins(5_000_000_000_000_000_000), 5.0);
    }

    #[test]
    fn test_account_tolerates_nulls_and_missing_fields() {
        let account: Account = serde_json::from_value(serde_json::json!({
            "stats": null,
            "payments": null,
            "roundShares": "1200",
            "workers": { "rig1": { "hr": 1000, "offline": null } }
        }))
        .unwrap();

        assert_eq!(account.round_shares, Some(1200.0));
        assert!(account.payments.is_empty());
        assert_eq!(account.stats.paid, None);
        assert_eq!(account.workers["rig1"].hr, Some(1000.0));
        assert!(!account.workers["rig1"].offline);
    }

    #[test]
    fn test_pool_stats_nodes_with_string_numbers() {
        let stats: PoolStats = serde_json::from_value(serde_json::json!({
            "stats": { "roundShares": 42, "lastBlockFound": 1704067200 },
            "nodes": [{
                "name": "main",
                "height": "1203",
                "difficulty": "95000000",
                "lastBeat": "1704067210"
            }]
        }))
        .unwrap();

        assert_eq!(stats.stats.round_shares, Some(42.0));
        assert_eq!(stats.nodes[0].height, Some(1203));
        assert_eq!(stats.nodes[0].difficulty, Some(95_000_000.0));
        assert_eq!(stats.nodes[0].last_beat, Some(1_704_067_210));
    }

    #[test]
    fn test_price_quote_missing_rate_is_zero() {
        let quote = PriceQuote {
            base: "MUSIC".to_string(),
            rates: BTreeMap::from([(BTC.to_string(), 0.000001)]),
        };
        assert_eq!(quote.rate(BTC), 0.000001);
        assert_eq!(quote.rate(USD), 0.0);
    }

    #[test]
    fn test_block_variance() {
        let block = Block {
            maturity: Maturity::Matured,
            record: BlockRecord {
                shares: Some(150.0),
                difficulty: Some(100.0),
                ..Default::default()
            },
        };
        assert_eq!(block.variance(), 1.5);
        assert_eq!(block.reward_coins(), 0.0);
    }
}
