//! Stats command - pool-wide dashboard

use anyhow::Result;
use colored::Colorize;

use super::{format_age, format_hashrate, run_view, section, ViewOptions};
use crate::config::Config;
use crate::contexts::{Clients, DashboardContext};
use crate::models::{ratio_or_zero, DashboardView, SHARES_SCALE};
use crate::scheduler::Scheduler;

pub async fn execute(clients: Clients, scheduler: &Scheduler, options: ViewOptions) -> Result<()> {
    let config = clients.config.clone();
    run_view(scheduler, DashboardContext(clients), options, |view| {
        render(view, &config)
    })
    .await
}

/// Network hashrate estimated from difficulty and target block time
fn network_hashrate(difficulty: Option<f64>, block_time: f64) -> f64 {
    match difficulty {
        Some(d) if block_time > 0.0 => d / block_time,
        _ => 0.0,
    }
}

fn render(view: &DashboardView, config: &Config) {
    let now = view
        .stats
        .now
        .map(|ms| ms / 1000)
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    println!("{}", view.application_name.cyan().bold());
    println!();

    if let Some(price) = &view.price {
        section("Price");
        for (code, rate) in &price.rates {
            println!(
                "    {} {}",
                format!("{}/{}:", view.coin_name, code).bright_black(),
                format!("{:.8}", rate).green()
            );
        }
        println!();
    }

    section("Pool");
    println!(
        "    {} {}",
        "Hashrate:".bright_black(),
        format_hashrate(view.stats.hashrate.unwrap_or(0.0)).green()
    );
    println!(
        "    {} {}",
        "Miners Online:".bright_black(),
        view.stats.miners_total.unwrap_or(0)
    );
    println!(
        "    {} {}",
        "Round Shares:".bright_black(),
        format!(
            "{:.3}",
            ratio_or_zero(view.stats.stats.round_shares, Some(SHARES_SCALE))
        )
    );
    println!(
        "    {} {}",
        "Last Block:".bright_black(),
        format_age(view.stats.stats.last_block_found, now)
    );
    println!(
        "    {} {} / {} / {}",
        "Blocks (cand/imm/mat):".bright_black(),
        view.stats.candidates_total.unwrap_or(0),
        view.stats.immature_total.unwrap_or(0),
        view.stats.matured_total.unwrap_or(0).to_string().green()
    );
    println!();

    if !view.stats.nodes.is_empty() {
        section("Network");
        for node in &view.stats.nodes {
            println!(
                "    {} {} {} {} {}",
                node.name.as_deref().unwrap_or("node").cyan(),
                "height".bright_black(),
                node.height.unwrap_or(0),
                "hashrate".bright_black(),
                format_hashrate(network_hashrate(node.difficulty, config.network.block_time))
            );
        }
        println!();
    }

    section("Connect");
    println!(
        "    {} {}:{}",
        "Stratum:".bright_black(),
        config.network.stratum_host,
        config.network.stratum_port
    );
    println!(
        "    {} {}:{}",
        "HTTP:".bright_black(),
        config.network.http_host,
        config.network.http_port
    );
    println!(
        "    {} {}  {} {}",
        "Fee:".bright_black(),
        config.network.pool_fee,
        "Payout threshold:".bright_black(),
        config.network.payout_threshold
    );
}
