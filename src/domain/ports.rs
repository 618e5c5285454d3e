//! Seams between the deletion workflow and the outside world.
//!
//! The lifecycle controller only talks to the controller API and the clock
//! through these traits, so tests can drive it with recording fakes.

use std::time::Duration;

use crate::error::DnacError;

use super::types::{DeviceDetail, DeviceSummary, TaskHandle, TaskStatus};

/// Device-management operations exposed by the controller.
#[allow(async_fn_in_trait)]
pub trait DnacApi {
    /// List devices whose hostname matches the filter.
    async fn devices_by_hostname(&self, hostname: &str) -> Result<Vec<DeviceSummary>, DnacError>;
    /// Fetch a single device by identifier.
    async fn device(&self, id: &str) -> Result<DeviceDetail, DnacError>;
    /// Submit an unprovision request for the given devices.
    async fn unprovision(&self, ids: &[String]) -> Result<TaskHandle, DnacError>;
    /// Submit a delete request for one device.
    async fn delete_device(&self, id: &str, clean_config: bool) -> Result<TaskHandle, DnacError>;
    /// Fetch the current status of an asynchronous task.
    async fn task(&self, task_id: &str) -> Result<TaskStatus, DnacError>;
}

/// Blocking wait on the calling task.
#[allow(async_fn_in_trait)]
pub trait Pause {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
