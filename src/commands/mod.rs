//! CLI command implementations
//!
//! Every view command works the same way:
//! - one-shot: run a single refresh cycle behind a spinner, print, exit
//! - `--watch`: hand the context to the scheduler and redraw on each update
//!   until Ctrl+C; failed cycles are logged and the last view stays up
//! - an unknown account ends either mode with an error

pub mod account;
pub mod blocks;
pub mod miners;
pub mod payments;
pub mod stats;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tokio::signal;

use crate::policy::{self, Disposition};
use crate::scheduler::{RefreshContext, RefreshEvent, Scheduler};

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOptions {
    pub watch: bool,
    pub json: bool,
}

/// Drive `context` once or under the scheduler, printing with `render`
pub async fn run_view<C, F>(
    scheduler: &Scheduler,
    mut context: C,
    options: ViewOptions,
    render: F,
) -> Result<()>
where
    C: RefreshContext,
    C::View: Serialize,
    F: Fn(&C::View),
{
    if !options.watch {
        let name = context.name().to_string();
        let view = with_spinner(&format!("Fetching {}...", name), context.refresh())
            .await
            .map_err(|e| match policy::classify(&e) {
                Disposition::Terminal => anyhow::anyhow!("{}", e),
                Disposition::Retry => {
                    anyhow::Error::new(e).context(format!("Failed to refresh {}", name))
                }
            })?;
        return print_view(&view, options.json, &render);
    }

    let (handle, mut events) = scheduler.spawn(context);
    let mut not_found: Option<String> = None;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!();
                println!("{}", "Stopping...".yellow());
                break;
            }

            event = events.recv() => match event {
                Some(RefreshEvent::Updated(view)) => {
                    if !options.json {
                        let _ = console::Term::stdout().clear_screen();
                        println!(
                            "  {} {}",
                            "Updated".bright_black(),
                            chrono::Local::now().format("%H:%M:%S").to_string().bright_black()
                        );
                        println!();
                    }
                    print_view(&view, options.json, &render)?;
                }
                Some(RefreshEvent::NotFound { message, .. }) => {
                    not_found = Some(message);
                    break;
                }
                None => break,
            }
        }
    }

    handle.stop().await;

    match not_found {
        Some(message) => anyhow::bail!("{}", message),
        None => Ok(()),
    }
}

fn print_view<V: Serialize>(view: &V, json: bool, render: impl Fn(&V)) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(view).context("Failed to serialize view")?
        );
    } else {
        render(view);
    }
    Ok(())
}

async fn with_spinner<T>(message: &str, fut: impl std::future::Future<Output = T>) -> T {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let out = fut.await;
    pb.finish_and_clear();
    out
}

// ============================================================================
// FORMATTING
// ============================================================================

pub fn section(title: &str) {
    println!("  {}", title.bright_black());
    println!("  {}", "━".repeat(40).bright_black());
}

/// Hashes per second with a decimal SI suffix, e.g. `12.35 MH/s`
pub fn format_hashrate(hashrate: f64) -> String {
    const UNITS: [&str; 7] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s", "EH/s"];

    if !hashrate.is_finite() || hashrate <= 0.0 {
        return "0 H/s".to_string();
    }

    let mut value = hashrate;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// `2024-01-02 11:00 UTC` for a unix timestamp in seconds
pub fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Coarse age like `5m ago`, relative to `now_secs`
pub fn format_age(timestamp: Option<i64>, now_secs: i64) -> String {
    let Some(ts) = timestamp else {
        return "never".to_string();
    };

    let age = (now_secs - ts).max(0);
    match age {
        0..=59 => format!("{}s ago", age),
        60..=3599 => format!("{}m ago", age / 60),
        3600..=86_399 => format!("{}h {}m ago", age / 3600, (age % 3600) / 60),
        _ => format!("{}d ago", age / 86_400),
    }
}

pub fn truncate_middle(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len || max_len < 8 {
        s.to_string()
    } else {
        let keep = (max_len - 3) / 2;
        let head: String = s.chars().take(keep).collect();
        let tail: String = s
            .chars()
            .rev()
            .take(keep)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{}...{}", head, tail)
    }
}
