//! `dnac-purge run`: delete every device listed in the spreadsheet.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use crate::client::DnacClient;
use crate::config::Config;
use crate::domain::lifecycle::{DeviceLifecycle, DeviceOutcome, LifecycleSettings, Verification};
use crate::domain::ports::TokioPause;
use crate::inventory;

pub fn run(cfg: Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(cfg))
}

async fn run_async(cfg: Config) -> Result<()> {
    println!("{} Connecting to DNAC at {}...", "::".blue().bold(), cfg.dnac.host);
    let client = DnacClient::connect(&cfg.dnac)
        .await
        .context("connecting to DNAC")?;
    println!("{} Authenticated against {}", "ok".green().bold(), client.base_url());

    let hostnames = inventory::load(&cfg.inventory)
        .with_context(|| format!("reading hostnames from {}", cfg.inventory.path.display()))?;
    println!(
        "{} Loaded {} hostnames from {}",
        "::".blue().bold(),
        hostnames.len(),
        cfg.inventory.path.display()
    );

    info!(
        check_provisioning = cfg.lifecycle.check_provisioning,
        verify_deletion = cfg.lifecycle.verify_deletion,
        max_attempts = cfg.lifecycle.poll.max_attempts,
        interval_secs = cfg.lifecycle.poll.interval_secs,
        completion = %cfg.lifecycle.poll.completion,
        "starting deletion run"
    );
    let lifecycle = DeviceLifecycle::new(
        &client,
        &TokioPause,
        LifecycleSettings::from(&cfg.lifecycle),
    );
    let outcomes = lifecycle.run(&hostnames, print_outcome).await;

    let tally = Tally::from_outcomes(&outcomes);
    println!();
    println!(
        "{} {} deleted, {} failed, {} not found",
        "::".blue().bold(),
        tally.deleted,
        tally.failed,
        tally.not_found
    );
    Ok(())
}

fn print_outcome(hostname: &str, outcome: &DeviceOutcome) {
    let icon = match outcome {
        DeviceOutcome::Deleted {
            verification: Verification::StillPresent | Verification::Unverified(_),
            ..
        } => "!!".yellow().bold(),
        DeviceOutcome::Deleted { .. } => "ok".green().bold(),
        DeviceOutcome::NotFound => "--".dimmed(),
        _ => "!!".red().bold(),
    };
    println!("  {} {}: {}", icon, hostname.bold(), outcome);
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    deleted: usize,
    failed: usize,
    not_found: usize,
}

impl Tally {
    fn from_outcomes(outcomes: &[DeviceOutcome]) -> Self {
        outcomes.iter().fold(Tally::default(), |mut t, o| {
            if o.is_deleted() {
                t.deleted += 1;
            } else if *o == DeviceOutcome::NotFound {
                t.not_found += 1;
            } else {
                t.failed += 1;
            }
            t
        })
    }
}
