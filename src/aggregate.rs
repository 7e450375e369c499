//! Derived dashboard views
//!
//! Everything in here is pure and total: partial pool data is normal (a
//! brand-new account has no payments, a quiet pool has no matured blocks), so
//! missing inputs turn into zeros and empty lists rather than errors.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::models::{
    finite_or_zero, ratio_or_zero, Account, AccountView, Block, BlockRecord, BlocksResponse,
    BlocksView, DashboardView, Maturity, Miner, MinerStats, MinersResponse, MinersView, Payment,
    PaymentsResponse, PaymentsView, PoolStats, PriceQuote, BTC, DAY_MILLIS, SHARES_SCALE, USD,
};

/// Start of the trailing 24h window ending at `capture_time_millis`
fn day_window_start(capture_time_millis: i64) -> i64 {
    capture_time_millis - DAY_MILLIS
}

/// Strictly inside the window; a timestamp exactly 24h old is out
fn within_day(timestamp_secs: Option<i64>, capture_time_millis: i64) -> bool {
    timestamp_secs
        .map(|ts| ts.saturating_mul(1000) > day_window_start(capture_time_millis))
        .unwrap_or(false)
}

/// Sum of payment amounts made in the trailing 24h
pub fn paid_within_day(payments: &[Payment], capture_time_millis: i64) -> f64 {
    payments
        .iter()
        .filter(|p| within_day(p.timestamp, capture_time_millis))
        .filter_map(|p| p.amount)
        .sum()
}

pub fn compute_account_view(
    login: &str,
    account: Account,
    stats: &PoolStats,
    quote: PriceQuote,
    capture_time_millis: i64,
) -> AccountView {
    let pool_round_shares = stats.stats.round_shares;
    let paid = account.stats.paid.unwrap_or(0.0);
    let paid_today = paid_within_day(&account.payments, capture_time_millis);

    let btc = quote.rate(BTC);
    let usd = quote.rate(USD);

    AccountView {
        login: login.to_string(),
        round_percent: ratio_or_zero(account.round_shares, pool_round_shares),
        round_shares: ratio_or_zero(account.round_shares, Some(SHARES_SCALE)),
        all_shares: ratio_or_zero(pool_round_shares, Some(SHARES_SCALE)),
        total_paid_btc: finite_or_zero(paid * btc),
        total_paid_usd: finite_or_zero(paid * usd),
        paid_today_btc: finite_or_zero(paid_today * btc),
        paid_today_usd: finite_or_zero(paid_today * usd),
        account,
        price: quote,
    }
}

fn classify(records: Option<Vec<BlockRecord>>, maturity: Maturity) -> Vec<Block> {
    records
        .unwrap_or_default()
        .into_iter()
        .map(|record| Block { maturity, record })
        .collect()
}

/// Sort the pool's block lists into maturity classes and count what matured
/// in the trailing 24h.
pub fn classify_blocks(raw: BlocksResponse, capture_time_millis: i64) -> BlocksView {
    let candidates = classify(raw.candidates, Maturity::Candidate);
    let immature = classify(raw.immature, Maturity::Immature);
    let matured = classify(raw.matured, Maturity::Matured);

    let mut today_found_blocks_count = 0;
    let mut today_coins_count = 0.0;
    for block in matured
        .iter()
        .filter(|b| within_day(b.record.timestamp, capture_time_millis))
    {
        today_found_blocks_count += 1;
        today_coins_count += block.reward_coins();
    }

    BlocksView {
        candidates_total: raw.candidates_total.unwrap_or(candidates.len() as u64),
        immature_total: raw.immature_total.unwrap_or(immature.len() as u64),
        matured_total: raw.matured_total.unwrap_or(matured.len() as u64),
        candidates,
        immature,
        matured,
        luck: raw.luck,
        today_found_blocks_count,
        today_coins_count: finite_or_zero(today_coins_count),
    }
}

/// Flatten the `login -> stats` map and order by hashrate, highest first.
/// The sort is stable, so equal hashrates keep the map's login order.
pub fn rank_miners(raw: BTreeMap<String, MinerStats>) -> Vec<Miner> {
    let mut miners: Vec<Miner> = raw
        .into_iter()
        .map(|(login, stats)| Miner {
            login,
            hashrate: stats.hr.map(finite_or_zero).unwrap_or(0.0),
            last_beat: stats.last_beat,
            offline: stats.offline,
        })
        .collect();

    miners.sort_by(|a, b| b.hashrate.total_cmp(&a.hashrate));
    miners
}

pub fn miners_view(raw: MinersResponse) -> MinersView {
    let miners = rank_miners(raw.miners);
    MinersView {
        miners_total: raw.miners_total.unwrap_or(miners.len() as u64),
        hashrate: raw.hashrate.unwrap_or(0.0),
        miners,
    }
}

pub fn payments_view(raw: PaymentsResponse) -> PaymentsView {
    PaymentsView {
        payments_total: raw.payments_total.unwrap_or(raw.payments.len() as u64),
        payments: raw.payments,
    }
}

pub fn dashboard_view(
    stats: PoolStats,
    config: &Config,
    price: Option<PriceQuote>,
) -> DashboardView {
    DashboardView {
        application_name: config.application_name.clone(),
        coin_name: config.coin_name.clone(),
        stats,
        price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountStats, RoundStats};

    const HOUR_MILLIS: i64 = 3_600_000;
    // 2024-01-02 12:00:00 UTC
    const NOW: i64 = 1_704_196_800_000;

    fn quote(btc: f64, usd: f64) -> PriceQuote {
        PriceQuote {
            base: "MUSIC".to_string(),
            rates: BTreeMap::from([(BTC.to_string(), btc), (USD.to_string(), usd)]),
        }
    }

    fn pool_stats(round_shares: Option<f64>) -> PoolStats {
        PoolStats {
            stats: RoundStats {
                round_shares,
                last_block_found: None,
            },
            ..Default::default()
        }
    }

    fn account(round_shares: Option<f64>) -> Account {
        Account {
            round_shares,
            ..Default::default()
        }
    }

    fn payment(amount: f64, timestamp_millis: i64) -> Payment {
        Payment {
            amount: Some(amount),
            timestamp: Some(timestamp_millis / 1000),
            ..Default::default()
        }
    }

    fn block(timestamp_millis: i64, reward: u128) -> BlockRecord {
        BlockRecord {
            timestamp: Some(timestamp_millis / 1000),
            reward: Some(reward),
            ..Default::default()
        }
    }

    fn miners(entries: &[(&str, f64)]) -> BTreeMap<String, MinerStats> {
        entries
            .iter()
            .map(|(login, hr)| {
                (
                    login.to_string(),
                    MinerStats {
                        hr: Some(*hr),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_round_percent_degrades_to_zero() {
        let cases = [
            (Some(0.0), Some(0.0)),
            (Some(10.0), Some(0.0)),
            (None, Some(100.0)),
            (Some(10.0), None),
            (None, None),
            (Some(0.0), Some(100.0)),
        ];

        for (own, pool) in cases {
            let view = compute_account_view(
                "0xabc",
                account(own),
                &pool_stats(pool),
                quote(1.0, 1.0),
                NOW,
            );
            assert_eq!(view.round_percent, 0.0, "own={own:?} pool={pool:?}");
            assert!(view.round_shares.is_finite());
            assert!(view.all_shares.is_finite());
        }
    }

    #[test]
    fn test_share_scaling() {
        let view = compute_account_view(
            "0xabc",
            account(Some(250_000_000.0)),
            &pool_stats(Some(1_000_000_000.0)),
            quote(1.0, 1.0),
            NOW,
        );

        assert_eq!(view.round_percent, 0.25);
        assert_eq!(view.round_shares, 0.25);
        assert_eq!(view.all_shares, 1.0);
    }

    #[test]
    fn test_total_paid_conversion() {
        let mut acct = account(None);
        acct.stats = AccountStats {
            paid: Some(200.0),
            ..Default::default()
        };

        let view = compute_account_view("0xabc", acct, &pool_stats(None), quote(0.5, 4.0), NOW);
        assert_eq!(view.total_paid_btc, 100.0);
        assert_eq!(view.total_paid_usd, 800.0);
    }

    #[test]
    fn test_paid_today_window_is_strict() {
        let mut acct = account(None);
        acct.payments = vec![
            payment(3.0, NOW - HOUR_MILLIS),
            payment(5.0, NOW - 23 * HOUR_MILLIS),
            payment(7.0, NOW - DAY_MILLIS),
            payment(11.0, NOW - 30 * HOUR_MILLIS),
        ];

        let view = compute_account_view("0xabc", acct, &pool_stats(None), quote(2.0, 10.0), NOW);
        assert_eq!(view.paid_today_btc, 16.0);
        assert_eq!(view.paid_today_usd, 80.0);
    }

    #[test]
    fn test_new_account_without_payments() {
        let view = compute_account_view(
            "0xnew",
            Account::default(),
            &PoolStats::default(),
            quote(1.0, 1.0),
            NOW,
        );
        assert_eq!(view.total_paid_btc, 0.0);
        assert_eq!(view.paid_today_usd, 0.0);
        assert_eq!(view.login, "0xnew");
    }

    #[test]
    fn test_today_block_counts() {
        let raw = BlocksResponse {
            matured: Some(vec![
                block(NOW - HOUR_MILLIS, 2_000_000_000_000_000_000),
                block(NOW - 30 * HOUR_MILLIS, 3_000_000_000_000_000_000),
            ]),
            ..Default::default()
        };

        let view = classify_blocks(raw, NOW);
        assert_eq!(view.today_found_blocks_count, 1);
        assert!((view.today_coins_count - 2.0).abs() < 1e-9);
        assert_eq!(view.matured.len(), 2);
    }

    #[test]
    fn test_only_matured_blocks_count_toward_today() {
        let raw = BlocksResponse {
            candidates: Some(vec![block(NOW - HOUR_MILLIS, 5_000_000_000_000_000_000)]),
            immature: Some(vec![block(NOW - HOUR_MILLIS, 5_000_000_000_000_000_000)]),
            matured: Some(vec![block(NOW - DAY_MILLIS, 5_000_000_000_000_000_000)]),
            ..Default::default()
        };

        let view = classify_blocks(raw, NOW);
        assert_eq!(view.today_found_blocks_count, 0);
        assert_eq!(view.today_coins_count, 0.0);
    }

    #[test]
    fn test_classification_is_a_partition() {
        let tagged = |height: u64| BlockRecord {
            height: Some(height),
            ..Default::default()
        };
        let raw = BlocksResponse {
            candidates: Some(vec![tagged(1), tagged(2)]),
            immature: Some(vec![tagged(3)]),
            matured: Some(vec![tagged(4), tagged(5), tagged(6)]),
            ..Default::default()
        };

        let view = classify_blocks(raw, NOW);
        let all: Vec<&Block> = view
            .candidates
            .iter()
            .chain(&view.immature)
            .chain(&view.matured)
            .collect();

        assert_eq!(all.len(), 6);
        let mut heights: Vec<u64> = all.iter().filter_map(|b| b.record.height).collect();
        heights.sort_unstable();
        assert_eq!(heights, vec![1, 2, 3, 4, 5, 6]);

        assert!(view.candidates.iter().all(|b| b.maturity == Maturity::Candidate));
        assert!(view.immature.iter().all(|b| b.maturity == Maturity::Immature));
        assert!(view.matured.iter().all(|b| b.maturity == Maturity::Matured));
        assert_eq!(view.candidates_total, 2);
        assert_eq!(view.matured_total, 3);
    }

    #[test]
    fn test_absent_block_lists_are_empty() {
        let view = classify_blocks(BlocksResponse::default(), NOW);
        assert!(view.candidates.is_empty());
        assert!(view.immature.is_empty());
        assert!(view.matured.is_empty());
        assert_eq!(view.today_found_blocks_count, 0);
    }

    #[test]
    fn test_block_without_reward_counts_zero_coins() {
        let raw = BlocksResponse {
            matured: Some(vec![BlockRecord {
                timestamp: Some((NOW - HOUR_MILLIS) / 1000),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let view = classify_blocks(raw, NOW);
        assert_eq!(view.today_found_blocks_count, 1);
        assert_eq!(view.today_coins_count, 0.0);
    }

    #[test]
    fn test_rank_miners_by_hashrate() {
        let ranked = rank_miners(miners(&[("a", 10.0), ("b", 30.0), ("c", 20.0)]));
        let logins: Vec<&str> = ranked.iter().map(|m| m.login.as_str()).collect();
        assert_eq!(logins, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_miners_edge_cases() {
        assert!(rank_miners(BTreeMap::new()).is_empty());

        let single = rank_miners(miners(&[("solo", 5.0)]));
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].login, "solo");

        let mut raw = miners(&[("x", 7.0), ("y", 7.0), ("z", 9.0)]);
        raw.insert("w".to_string(), MinerStats::default());
        let ranked = rank_miners(raw);
        assert!(ranked.windows(2).all(|w| w[0].hashrate >= w[1].hashrate));
        let logins: Vec<&str> = ranked.iter().map(|m| m.login.as_str()).collect();
        assert_eq!(logins, vec!["z", "x", "y", "w"]);
    }

    #[test]
    fn test_passthrough_views() {
        let payments = payments_view(PaymentsResponse {
            payments: vec![payment(1.0, NOW), payment(2.0, NOW)],
            payments_total: None,
        });
        assert_eq!(payments.payments_total, 2);

        let miners = miners_view(MinersResponse {
            miners: miners(&[("a", 1.0)]),
            miners_total: Some(40),
            ..Default::default()
        });
        assert_eq!(miners.miners_total, 40);
        assert_eq!(miners.hashrate, 0.0);

        let config = Config::new();
        let dashboard =
            dashboard_view(pool_stats(Some(1.0)), &config, Some(quote(1.0, 2.0)));
        assert_eq!(dashboard.coin_name, "MUSIC");
        assert_eq!(dashboard.application_name, config.application_name);
        assert_eq!(dashboard.price.map(|p| p.rate(USD)), Some(2.0));

        let without_price = dashboard_view(pool_stats(Some(1.0)), &config, None);
        assert!(without_price.price.is_none());
        assert_eq!(without_price.stats.stats.round_shares, Some(1.0));
    }
}
