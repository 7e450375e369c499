//! Miners command - connected miners ranked by hashrate

use anyhow::Result;
use colored::Colorize;

use super::{format_age, format_hashrate, run_view, section, truncate_middle, ViewOptions};
use crate::contexts::{Clients, MinersContext};
use crate::models::MinersView;
use crate::scheduler::Scheduler;

pub async fn execute(
    clients: Clients,
    scheduler: &Scheduler,
    limit: usize,
    options: ViewOptions,
) -> Result<()> {
    run_view(scheduler, MinersContext(clients), options, |view| {
        render(view, limit)
    })
    .await
}

fn render(view: &MinersView, limit: usize) {
    let now = chrono::Utc::now().timestamp();

    println!("{}", "Miners".cyan().bold());
    println!();
    println!(
        "  {} {}   {} {}",
        "Total:".bright_black(),
        view.miners_total.to_string().green(),
        "Pool Hashrate:".bright_black(),
        format_hashrate(view.hashrate).green()
    );
    println!();

    section("Top Miners");
    if view.miners.is_empty() {
        println!("    {}", "No miners connected".bright_black());
        return;
    }

    for (i, miner) in view.miners.iter().take(limit).enumerate() {
        let status_icon = if miner.offline { "🔴" } else { "🟢" };
        println!(
            "    {:>3}. {} {:<21} {:>14} {}",
            i + 1,
            status_icon,
            truncate_middle(&miner.login, 21),
            format_hashrate(miner.hashrate).green(),
            format_age(miner.last_beat, now).bright_black()
        );
    }

    if view.miners.len() > limit {
        println!(
            "    {}",
            format!("... and {} more", view.miners.len() - limit).bright_black()
        );
    }
}
