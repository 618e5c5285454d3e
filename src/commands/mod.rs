pub mod plan;
pub mod run;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::domain::types::CompletionSignal;

/// Flags shared by `run` and `plan`. Each one overrides the layered config.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// DNAC base URL or hostname
    #[arg(long)]
    pub host: Option<String>,

    /// DNAC username
    #[arg(long)]
    pub username: Option<String>,

    /// DNAC password (prefer DNAC_PURGE_DNAC__PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// Verify the controller's TLS certificate
    #[arg(long)]
    pub verify_tls: bool,

    /// Spreadsheet holding the hostnames
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Header of the hostname column
    #[arg(long)]
    pub column: Option<String>,

    /// Sheet to read (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Task poll budget
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Seconds between task polls
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Task completion signal (end-time-or-progress, end-time, progress)
    #[arg(long)]
    pub completion: Option<String>,

    /// Delete without checking or undoing provisioning
    #[arg(long)]
    pub skip_provision_check: bool,

    /// Skip the post-delete inventory lookup
    #[arg(long)]
    pub skip_verify: bool,

    /// Do not ask the controller to clean device configuration
    #[arg(long)]
    pub no_clean_config: bool,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut Config) -> Result<()> {
        if let Some(host) = &self.host {
            cfg.dnac.host = host.clone();
        }
        if let Some(username) = &self.username {
            cfg.dnac.username = username.clone();
        }
        if let Some(password) = &self.password {
            cfg.dnac.password = password.clone();
        }
        if self.verify_tls {
            cfg.dnac.verify_tls = true;
        }
        if let Some(file) = &self.file {
            cfg.inventory.path = file.clone();
        }
        if let Some(column) = &self.column {
            cfg.inventory.column = column.clone();
        }
        if let Some(sheet) = &self.sheet {
            cfg.inventory.sheet = Some(sheet.clone());
        }
        if let Some(max_attempts) = self.max_attempts {
            cfg.lifecycle.poll.max_attempts = max_attempts;
        }
        if let Some(interval) = self.poll_interval {
            cfg.lifecycle.poll.interval_secs = interval;
        }
        if let Some(completion) = &self.completion {
            cfg.lifecycle.poll.completion = completion.parse::<CompletionSignal>()?;
        }
        if self.skip_provision_check {
            cfg.lifecycle.check_provisioning = false;
        }
        if self.skip_verify {
            cfg.lifecycle.verify_deletion = false;
        }
        if self.no_clean_config {
            cfg.lifecycle.clean_config = false;
        }
        Ok(())
    }
}

/// Defaults → environment → CLI flags.
pub fn resolve_config(overrides: &Overrides) -> Result<Config> {
    let mut cfg = config::load()?;
    overrides.apply(&mut cfg)?;
    cfg.validate()?;
    Ok(cfg)
}
