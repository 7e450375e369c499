//! Payments command - pool-wide payout history

use anyhow::Result;
use colored::Colorize;

use super::{format_timestamp, run_view, section, truncate_middle, ViewOptions};
use crate::config::Config;
use crate::contexts::{Clients, PaymentsContext};
use crate::models::PaymentsView;
use crate::scheduler::Scheduler;

pub async fn execute(
    clients: Clients,
    scheduler: &Scheduler,
    limit: usize,
    options: ViewOptions,
) -> Result<()> {
    let config = clients.config.clone();
    run_view(scheduler, PaymentsContext(clients), options, |view| {
        render(view, &config, limit)
    })
    .await
}

fn render(view: &PaymentsView, config: &Config, limit: usize) {
    println!("{}", "Payments".cyan().bold());
    println!();

    section(&format!("Recent ({} total)", view.payments_total));
    if view.payments.is_empty() {
        println!("    {}", "No payments yet".bright_black());
        return;
    }

    for payment in view.payments.iter().take(limit) {
        println!(
            "    {} {:<21} {:>14}",
            format_timestamp(payment.timestamp).bright_black(),
            truncate_middle(payment.address.as_deref().unwrap_or("-"), 21),
            payment.amount.unwrap_or(0.0).to_string().green()
        );
        if let Some(tx) = payment.tx.as_deref() {
            println!("      {}", config.tx_url(tx).bright_black());
        }
    }
}
