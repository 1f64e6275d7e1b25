mod config;
mod diff;
mod extract;
mod model;
mod notify;
mod store;

use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use config::Config;
use notify::Notifier;

#[derive(Parser)]
#[command(name = "jobwatch", about = "NHS job search watcher with Telegram alerts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the search page, notify about new postings, persist the merged set (default)
    Run,
    /// Print the persisted postings
    List {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse().command.unwrap_or(Commands::Run) {
        Commands::Run => {
            // Credentials are checked before any browser work; missing ones
            // get a distinct exit code.
            let cfg = match Config::from_env() {
                Ok(cfg) => cfg,
                Err(e) => {
                    error!("configuration error: {e:#}");
                    std::process::exit(2);
                }
            };
            run(cfg).await
        }
        Commands::List { limit } => {
            list(limit);
            Ok(())
        }
    }
}

/// One end-to-end run: extract, diff, notify, persist. Any failure after
/// startup is reported to the operator once, best-effort, then propagated so
/// the process exits non-zero.
async fn run(cfg: Config) -> Result<()> {
    let t0 = Instant::now();
    let notifier = Notifier::new(&cfg);

    let result = run_pipeline(&cfg, &notifier, t0).await;
    if let Err(e) = &result {
        notifier.send_failure(e).await;
    }
    result
}

async fn run_pipeline(cfg: &Config, notifier: &Notifier, t0: Instant) -> Result<()> {
    // The browser driver is blocking; keep it off the async runtime.
    let scrape_cfg = cfg.clone();
    let current =
        tokio::task::spawn_blocking(move || extract::scrape_listings(&scrape_cfg)).await??;
    let total = current.len();

    let previous = store::load(&cfg.store_path);
    let outcome = diff::diff(current, previous);
    info!(
        "{} new out of {} scraped ({} known in total)",
        outcome.new_records.len(),
        total,
        outcome.merged.len()
    );

    notifier.notify_new(&outcome.new_records).await;
    notifier.send_summary(outcome.new_records.len(), total, t0.elapsed()).await;

    // Persist last, and only for a run that got this far.
    store::save(&cfg.store_path, &outcome.merged)?;

    println!(
        "{} new out of {} scraped in {}",
        outcome.new_records.len(),
        total,
        format_duration(t0.elapsed())
    );
    Ok(())
}

fn list(limit: usize) {
    let store = store::load(&config::store_path_from_env());
    if store.is_empty() {
        println!("No postings stored yet. Run 'jobwatch run' first.");
        return;
    }

    println!(
        "{:<44} | {:<30} | {:<20} | {}",
        "Title", "Employer", "Location", "Scraped"
    );
    println!("{}", "-".repeat(112));
    for record in store.records().take(limit) {
        println!(
            "{:<44} | {:<30} | {:<20} | {}",
            truncate(&record.title, 44),
            truncate(&record.employer, 30),
            truncate(&record.location, 20),
            record.scraped_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} postings stored", store.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
