//! Blocks command - candidates, immature and matured blocks

use anyhow::Result;
use colored::Colorize;

use super::{format_age, run_view, section, truncate_middle, ViewOptions};
use crate::config::Config;
use crate::contexts::{BlocksContext, Clients};
use crate::models::{Block, BlocksView, Maturity};
use crate::scheduler::Scheduler;

pub async fn execute(
    clients: Clients,
    scheduler: &Scheduler,
    limit: usize,
    options: ViewOptions,
) -> Result<()> {
    let config = clients.config.clone();
    run_view(scheduler, BlocksContext(clients), options, |view| {
        render(view, &config, limit)
    })
    .await
}

fn render(view: &BlocksView, config: &Config, limit: usize) {
    let now = chrono::Utc::now().timestamp();

    println!("{}", "Blocks".cyan().bold());
    println!();

    section("Last 24h");
    println!(
        "    {} {}",
        "Blocks Found:".bright_black(),
        view.today_found_blocks_count.to_string().green()
    );
    println!(
        "    {} {}",
        "Coins Mined:".bright_black(),
        format!("{:.4} {}", view.today_coins_count, config.coin_name).green()
    );
    println!();

    if !view.luck.is_empty() {
        section("Luck");
        let mut windows: Vec<_> = view.luck.iter().collect();
        windows.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
        for (window, luck) in windows {
            println!(
                "    {:>6} {} {:>8}  {} {:>6}  {} {:>6}",
                window,
                "blocks".bright_black(),
                format!("{:.2}%", luck.luck.unwrap_or(0.0) * 100.0),
                "uncles".bright_black(),
                format!("{:.1}%", luck.uncle_rate.unwrap_or(0.0) * 100.0),
                "orphans".bright_black(),
                format!("{:.1}%", luck.orphan_rate.unwrap_or(0.0) * 100.0)
            );
        }
        println!();
    }

    let lists = [
        ("Matured", &view.matured, view.matured_total),
        ("Immature", &view.immature, view.immature_total),
        ("Candidates", &view.candidates, view.candidates_total),
    ];

    for (title, blocks, total) in lists {
        section(&format!("{} ({})", title, total));
        if blocks.is_empty() {
            println!("    {}", "None".bright_black());
        }
        for block in blocks.iter().take(limit) {
            print_block(block, config, now);
        }
        println!();
    }
}

fn print_block(block: &Block, config: &Config, now: i64) {
    let record = &block.record;
    let label = if record.orphan {
        "orphan".red().to_string()
    } else if record.uncle {
        format!("uncle@{}", record.uncle_height.unwrap_or(0)).yellow().to_string()
    } else {
        String::new()
    };

    let reward = match block.maturity {
        Maturity::Candidate => "-".to_string(),
        _ => format!("{:.4}", block.reward_coins()),
    };

    println!(
        "    {:<10} {:<21} {:>10} {:>8} {} {}",
        record.height.unwrap_or(0).to_string().cyan(),
        truncate_middle(record.hash.as_deref().unwrap_or("-"), 21),
        reward,
        format!("{:.0}%", block.variance() * 100.0),
        format_age(record.timestamp, now).bright_black(),
        label
    );

    if let Some(height) = record.height {
        println!("    {}", config.block_url(height).bright_black());
    }
}
