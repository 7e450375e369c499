//! Account command - one miner's shares, earnings and workers

use anyhow::Result;
use colored::Colorize;

use super::{
    format_age, format_hashrate, format_timestamp, run_view, section, truncate_middle, ViewOptions,
};
use crate::config::Config;
use crate::contexts::{AccountContext, Clients};
use crate::models::AccountView;
use crate::scheduler::Scheduler;

/// Recent payments shown under the account summary
const RECENT_PAYMENTS: usize = 10;

pub async fn execute(
    clients: Clients,
    scheduler: &Scheduler,
    login: String,
    options: ViewOptions,
) -> Result<()> {
    let login = login.trim().to_string();
    if login.is_empty() {
        anyhow::bail!("Login required");
    }

    let config = clients.config.clone();
    run_view(
        scheduler,
        AccountContext::new(clients, &login),
        options,
        |view| render(view, &config),
    )
    .await
}

fn render(view: &AccountView, config: &Config) {
    let account = &view.account;
    let now = chrono::Utc::now().timestamp();

    println!("{}", "Account".cyan().bold());
    println!();
    println!("  {}", view.login.green());
    println!("  {}", config.address_url(&view.login).bright_black());
    println!();

    section("Hashrate");
    println!(
        "    {} {}",
        "Current:".bright_black(),
        format_hashrate(account.current_hashrate.unwrap_or(0.0)).green()
    );
    println!(
        "    {} {}",
        "Average:".bright_black(),
        format_hashrate(account.hashrate.unwrap_or(0.0))
    );
    println!(
        "    {} {}",
        "Last Share:".bright_black(),
        format_age(account.stats.last_share, now)
    );
    println!();

    section("Round");
    println!(
        "    {} {}",
        "Your Shares:".bright_black(),
        format!("{:.3}", view.round_shares)
    );
    println!(
        "    {} {}",
        "Pool Shares:".bright_black(),
        format!("{:.3}", view.all_shares)
    );
    println!(
        "    {} {}",
        "Round Share:".bright_black(),
        format!("{:.2}%", view.round_percent * 100.0).green()
    );
    println!(
        "    {} {}",
        "Blocks Found:".bright_black(),
        account.stats.blocks_found.unwrap_or(0)
    );
    println!();

    section("Earnings");
    println!(
        "    {} {}",
        "Balance:".bright_black(),
        account.stats.balance.unwrap_or(0.0)
    );
    println!(
        "    {} {}",
        "Immature:".bright_black(),
        account.stats.immature.unwrap_or(0.0)
    );
    println!(
        "    {} {}",
        "Pending:".bright_black(),
        account.stats.pending.unwrap_or(0.0)
    );
    println!(
        "    {} {}  {}  {}",
        "Total Paid:".bright_black(),
        account.stats.paid.unwrap_or(0.0).to_string().green(),
        format!("{:.8} BTC", view.total_paid_btc).yellow(),
        format!("${:.2}", view.total_paid_usd).green()
    );
    println!(
        "    {} {}  {}",
        "Paid (24h):".bright_black(),
        format!("{:.8} BTC", view.paid_today_btc).yellow(),
        format!("${:.2}", view.paid_today_usd).green()
    );
    println!();

    if !account.workers.is_empty() {
        section(&format!(
            "Workers ({} online / {} offline)",
            account.workers_online.unwrap_or(0),
            account.workers_offline.unwrap_or(0)
        ));

        let mut workers: Vec<_> = account.workers.iter().collect();
        workers.sort_by(|a, b| b.1.hr.unwrap_or(0.0).total_cmp(&a.1.hr.unwrap_or(0.0)));

        for (name, worker) in workers {
            let status_icon = if worker.offline { "🔴" } else { "🟢" };
            println!(
                "    {} {:<16} {:>14} {}",
                status_icon,
                truncate_middle(name, 16),
                format_hashrate(worker.hr.unwrap_or(0.0)),
                format_age(worker.last_beat, now).bright_black()
            );
        }
        println!();
    }

    if !account.payments.is_empty() {
        section(&format!(
            "Payments ({} total)",
            account.payments_total.unwrap_or(account.payments.len() as u64)
        ));
        for payment in account.payments.iter().take(RECENT_PAYMENTS) {
            println!(
                "    {} {:>14} {}",
                format_timestamp(payment.timestamp).bright_black(),
                payment.amount.unwrap_or(0.0).to_string().green(),
                payment
                    .tx
                    .as_deref()
                    .map(|tx| config.tx_url(tx))
                    .unwrap_or_default()
                    .bright_black()
            );
        }
    }
}
