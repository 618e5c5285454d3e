//! `dnac-purge plan`: show what `run` would touch without changing anything.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::client::DnacClient;
use crate::config::Config;
use crate::domain::lifecycle::resolve_device;
use crate::domain::ports::DnacApi;
use crate::domain::types::DeviceSummary;
use crate::inventory;

pub fn run(cfg: Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(cfg))
}

async fn run_async(cfg: Config) -> Result<()> {
    let client = DnacClient::connect(&cfg.dnac)
        .await
        .context("connecting to DNAC")?;
    let hostnames = inventory::load(&cfg.inventory)
        .with_context(|| format!("reading hostnames from {}", cfg.inventory.path.display()))?;

    println!("{}", "Deletion plan".bold());
    println!();

    for hostname in &hostnames {
        let entry = plan_device(&client, hostname, cfg.lifecycle.check_provisioning).await;
        print_entry(hostname, &entry);
    }

    println!();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum PlanEntry {
    NotFound,
    Delete {
        device: DeviceSummary,
        provisioned: Option<bool>,
    },
    Failed(String),
}

/// Read-only half of the lifecycle: resolve and, if enabled, check provisioning.
async fn plan_device<A: DnacApi>(api: &A, hostname: &str, check_provisioning: bool) -> PlanEntry {
    let device = match resolve_device(api, hostname).await {
        Ok(Some(device)) => device,
        Ok(None) => return PlanEntry::NotFound,
        Err(e) => return PlanEntry::Failed(e.to_string()),
    };

    if !check_provisioning {
        return PlanEntry::Delete {
            device,
            provisioned: None,
        };
    }

    match api.device(&device.id).await {
        Ok(detail) => PlanEntry::Delete {
            provisioned: Some(detail.is_provisioned()),
            device,
        },
        Err(e) => PlanEntry::Failed(e.to_string()),
    }
}

fn print_entry(hostname: &str, entry: &PlanEntry) {
    match entry {
        PlanEntry::NotFound => {
            println!("  {} {}: not found", "--".dimmed(), hostname.bold());
        }
        PlanEntry::Delete {
            device,
            provisioned,
        } => {
            let action = match provisioned {
                Some(true) => "unprovision + delete".yellow(),
                Some(false) => "delete".green(),
                None => "delete (provisioning unchecked)".normal(),
            };
            println!(
                "  {} {} [{}] {} {}: {}",
                ">>".blue().bold(),
                device.hostname.as_deref().unwrap_or(hostname).bold(),
                device.id,
                device
                    .management_ip_address
                    .as_deref()
                    .unwrap_or("no mgmt ip")
                    .dimmed(),
                device.platform_id.as_deref().unwrap_or("").dimmed(),
                action
            );
        }
        PlanEntry::Failed(reason) => {
            println!("  {} {}: {}", "!!".red().bold(), hostname.bold(), reason);
        }
    }
}
