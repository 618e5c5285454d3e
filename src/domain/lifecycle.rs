//! Per-device deletion workflow.
//!
//! For every hostname: resolve → provisioning check → unprovision → delete →
//! poll → verify → throttle. Each hostname is processed in isolation; any
//! failure becomes a [`DeviceOutcome`] and the batch moves on.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::LifecycleConfig;
use crate::error::DnacError;

use super::poll::{await_task, PollPolicy, TaskOutcome};
use super::ports::{DnacApi, Pause};
use super::types::{CompletionSignal, DeviceDetail, DeviceSummary};

/// Resolved lifecycle parameters.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub check_provisioning: bool,
    pub verify_deletion: bool,
    pub clean_config: bool,
    pub unprovision_settle: Duration,
    pub throttle: Duration,
    pub poll: PollPolicy,
    pub completion: CompletionSignal,
}

impl From<&LifecycleConfig> for LifecycleSettings {
    fn from(cfg: &LifecycleConfig) -> Self {
        Self {
            check_provisioning: cfg.check_provisioning,
            verify_deletion: cfg.verify_deletion,
            clean_config: cfg.clean_config,
            unprovision_settle: cfg.unprovision_settle(),
            throttle: cfg.throttle(),
            poll: PollPolicy {
                interval: cfg.poll.interval(),
                max_attempts: cfg.poll.max_attempts,
            },
            completion: cfg.poll.completion,
        }
    }
}

/// Post-delete lookup by hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Gone,
    StillPresent,
    Unverified(String),
    Skipped,
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Gone => write!(f, "verified: no longer in inventory"),
            Verification::StillPresent => write!(f, "warning: still present in inventory"),
            Verification::Unverified(reason) => write!(f, "could not verify: {}", reason),
            Verification::Skipped => write!(f, "verification skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOutcome {
    NotFound,
    ProvisioningUnknown {
        device_id: String,
        reason: String,
    },
    UnprovisionFailed {
        device_id: String,
        reason: String,
    },
    Deleted {
        device_id: String,
        verification: Verification,
    },
    DeleteFailed {
        device_id: String,
        task: TaskOutcome,
        verification: Verification,
    },
    Errored(String),
}

impl DeviceOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeviceOutcome::Deleted { .. })
    }
}

impl fmt::Display for DeviceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceOutcome::NotFound => write!(f, "not found in DNAC"),
            DeviceOutcome::ProvisioningUnknown { device_id, reason } => write!(
                f,
                "could not determine provisioning status of {}: {}. Skipping deletion.",
                device_id, reason
            ),
            DeviceOutcome::UnprovisionFailed { device_id, reason } => write!(
                f,
                "failed to unprovision {}: {}. Skipping deletion.",
                device_id, reason
            ),
            DeviceOutcome::Deleted {
                verification: Verification::Skipped,
                ..
            } => write!(f, "{}", TaskOutcome::Completed),
            DeviceOutcome::Deleted { verification, .. } => {
                write!(f, "{} ({})", TaskOutcome::Completed, verification)
            }
            DeviceOutcome::DeleteFailed {
                task,
                verification: Verification::Skipped,
                ..
            } => write!(f, "{}", task),
            DeviceOutcome::DeleteFailed {
                task, verification, ..
            } => write!(f, "{} ({})", task, verification),
            DeviceOutcome::Errored(reason) => write!(f, "error processing device: {}", reason),
        }
    }
}

pub struct DeviceLifecycle<'a, A, P> {
    api: &'a A,
    pause: &'a P,
    settings: LifecycleSettings,
}

impl<'a, A: DnacApi, P: Pause> DeviceLifecycle<'a, A, P> {
    pub fn new(api: &'a A, pause: &'a P, settings: LifecycleSettings) -> Self {
        Self {
            api,
            pause,
            settings,
        }
    }

    /// Process hostnames strictly in order, calling `on_outcome` after each.
    pub async fn run<F>(&self, hostnames: &[String], mut on_outcome: F) -> Vec<DeviceOutcome>
    where
        F: FnMut(&str, &DeviceOutcome),
    {
        let mut outcomes = Vec::with_capacity(hostnames.len());
        for hostname in hostnames {
            let outcome = self.process(hostname).await;
            on_outcome(hostname.as_str(), &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Run the full sequence for one hostname. Never fails; remote errors
    /// are folded into the outcome.
    pub async fn process(&self, hostname: &str) -> DeviceOutcome {
        match self.try_process(hostname).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(hostname, error = %e, "error processing device");
                DeviceOutcome::Errored(e.to_string())
            }
        }
    }

    async fn try_process(&self, hostname: &str) -> Result<DeviceOutcome, DnacError> {
        let Some(device) = resolve_device(self.api, hostname).await? else {
            info!(hostname, "device not found");
            return Ok(DeviceOutcome::NotFound);
        };
        let device_id = device.id;
        info!(hostname, device_id = %device_id, "found device");

        if self.settings.check_provisioning {
            let detail = match self.api.device(&device_id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(hostname, device_id = %device_id, error = %e, "provisioning status lookup failed");
                    return Ok(DeviceOutcome::ProvisioningUnknown {
                        device_id,
                        reason: e.to_string(),
                    });
                }
            };

            if detail.is_provisioned() {
                if let Err(reason) = self.unprovision(hostname, &detail).await {
                    return Ok(DeviceOutcome::UnprovisionFailed { device_id, reason });
                }
            }
        }

        let handle = self
            .api
            .delete_device(&device_id, self.settings.clean_config)
            .await?;
        info!(
            hostname,
            task_id = %handle.task_id,
            task_url = handle.url.as_deref().unwrap_or(""),
            "deletion initiated"
        );

        let task = await_task(
            self.api,
            self.pause,
            &handle.task_id,
            self.settings.poll,
            self.settings.completion,
        )
        .await;
        if task.is_success() {
            info!(hostname, "{}", task);
        } else {
            warn!(hostname, task_id = %handle.task_id, "{}", task);
        }

        let verification = self.verify(hostname).await;

        self.pause.pause(self.settings.throttle).await;

        Ok(if task.is_success() {
            DeviceOutcome::Deleted {
                device_id,
                verification,
            }
        } else {
            DeviceOutcome::DeleteFailed {
                device_id,
                task,
                verification,
            }
        })
    }

    async fn unprovision(&self, hostname: &str, detail: &DeviceDetail) -> Result<(), String> {
        warn!(
            hostname,
            management_status = detail.management_status.as_deref().unwrap_or(""),
            site_id = detail.site_id.as_deref().unwrap_or(""),
            "device is provisioned, unprovisioning first"
        );

        match self.api.unprovision(std::slice::from_ref(&detail.id)).await {
            Ok(handle) => {
                info!(
                    hostname,
                    task_id = %handle.task_id,
                    settle_secs = self.settings.unprovision_settle.as_secs(),
                    "unprovisioning initiated, waiting for stability"
                );
                self.pause.pause(self.settings.unprovision_settle).await;
                Ok(())
            }
            Err(e) => {
                warn!(hostname, error = %e, "failed to unprovision, skipping deletion");
                Err(e.to_string())
            }
        }
    }

    async fn verify(&self, hostname: &str) -> Verification {
        if !self.settings.verify_deletion {
            return Verification::Skipped;
        }

        match self.api.devices_by_hostname(hostname).await {
            Ok(devices) if exact_matches(devices.clone(), hostname).is_empty() => {
                info!(hostname, "verified: device no longer exists");
                Verification::Gone
            }
            Ok(_) => {
                warn!(hostname, "device still exists after deletion");
                Verification::StillPresent
            }
            Err(e) => {
                warn!(hostname, error = %e, "could not verify deletion");
                Verification::Unverified(e.to_string())
            }
        }
    }
}

/// Look a hostname up and keep only devices whose hostname is exactly the
/// requested one. The controller's filter also matches patterns, so its
/// result is not trusted as-is. First match wins; duplicates are logged.
pub async fn resolve_device<A: DnacApi>(
    api: &A,
    hostname: &str,
) -> Result<Option<DeviceSummary>, DnacError> {
    let listed = api.devices_by_hostname(hostname).await?;
    let returned = listed.len();
    let devices = exact_matches(listed, hostname);
    if devices.len() < returned {
        debug!(
            hostname,
            ignored = returned - devices.len(),
            "ignoring devices whose hostname differs"
        );
    }
    if devices.len() > 1 {
        warn!(
            hostname,
            matches = devices.len(),
            "multiple devices match hostname, using the first"
        );
    }
    Ok(devices.into_iter().next())
}

fn exact_matches(devices: Vec<DeviceSummary>, hostname: &str) -> Vec<DeviceSummary> {
    devices
        .into_iter()
        .filter(|d| d.hostname.as_deref() == Some(hostname))
        .collect()
}
