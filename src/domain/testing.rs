//! Recording fakes for the domain ports.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::DnacError;

use super::ports::{DnacApi, Pause};
use super::types::{DeviceDetail, DeviceSummary, TaskHandle, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Device(String),
    Unprovision(Vec<String>),
    Delete(String, bool),
    Task(String),
}

fn remote_error(method: &'static str, what: &str, message: &str) -> DnacError {
    DnacError::Status {
        method,
        url: format!("https://dnac.test/{what}"),
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: message.to_string(),
    }
}

/// In-memory controller. Deleted devices disappear from later listings
/// unless the device was registered as sticky.
#[derive(Default)]
pub struct FakeDnac {
    devices: HashMap<String, Vec<DeviceSummary>>,
    details: HashMap<String, DeviceDetail>,
    sticky: HashSet<String>,
    failing_lists: HashSet<String>,
    failing_details: HashSet<String>,
    unprovision_error: Option<String>,
    task_error: Option<String>,
    tasks: Mutex<VecDeque<TaskStatus>>,
    deleted: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeDnac {
    pub fn with_device(self, hostname: &str, id: &str, management_status: &str) -> Self {
        self.with_listing(hostname, hostname, id, management_status)
    }

    /// Register a device that a lookup for `query` returns, even when its
    /// own hostname is something else.
    pub fn with_listing(
        mut self,
        query: &str,
        hostname: &str,
        id: &str,
        management_status: &str,
    ) -> Self {
        self.devices
            .entry(query.to_string())
            .or_default()
            .push(DeviceSummary {
                id: id.to_string(),
                hostname: Some(hostname.to_string()),
                management_ip_address: None,
                platform_id: None,
            });
        self.details.insert(
            id.to_string(),
            DeviceDetail {
                id: id.to_string(),
                management_status: Some(management_status.to_string()),
                site_id: None,
            },
        );
        self
    }

    pub fn with_sticky_device(mut self, id: &str) -> Self {
        self.sticky.insert(id.to_string());
        self
    }

    pub fn with_failing_list(mut self, hostname: &str) -> Self {
        self.failing_lists.insert(hostname.to_string());
        self
    }

    pub fn with_failing_detail(mut self, id: &str) -> Self {
        self.failing_details.insert(id.to_string());
        self
    }

    pub fn with_failing_unprovision(mut self, message: &str) -> Self {
        self.unprovision_error = Some(message.to_string());
        self
    }

    pub fn with_failing_task_lookup(mut self, message: &str) -> Self {
        self.task_error = Some(message.to_string());
        self
    }

    /// Statuses handed out one per poll. The last one repeats forever.
    pub fn with_task_script(self, script: Vec<TaskStatus>) -> Self {
        *self.tasks.lock().expect("tasks lock") = script.into();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn task_polls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Task(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl DnacApi for FakeDnac {
    async fn devices_by_hostname(&self, hostname: &str) -> Result<Vec<DeviceSummary>, DnacError> {
        self.record(Call::List(hostname.to_string()));
        if self.failing_lists.contains(hostname) {
            return Err(remote_error("GET", "network-device", "upstream timeout"));
        }
        let deleted = self.deleted.lock().expect("deleted lock");
        Ok(self
            .devices
            .get(hostname)
            .map(|list| {
                list.iter()
                    .filter(|d| !deleted.contains(&d.id) || self.sticky.contains(&d.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn device(&self, id: &str) -> Result<DeviceDetail, DnacError> {
        self.record(Call::Device(id.to_string()));
        if self.failing_details.contains(id) {
            return Err(remote_error("GET", "network-device", "detail lookup failed"));
        }
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| remote_error("GET", "network-device", "no such device"))
    }

    async fn unprovision(&self, ids: &[String]) -> Result<TaskHandle, DnacError> {
        self.record(Call::Unprovision(ids.to_vec()));
        if let Some(message) = &self.unprovision_error {
            return Err(remote_error("POST", "networkDevices/unprovision", message));
        }
        Ok(TaskHandle {
            task_id: "T-unprovision".into(),
            url: None,
        })
    }

    async fn delete_device(&self, id: &str, clean_config: bool) -> Result<TaskHandle, DnacError> {
        self.record(Call::Delete(id.to_string(), clean_config));
        self.deleted.lock().expect("deleted lock").insert(id.to_string());
        Ok(TaskHandle {
            task_id: format!("T-{id}"),
            url: None,
        })
    }

    async fn task(&self, task_id: &str) -> Result<TaskStatus, DnacError> {
        self.record(Call::Task(task_id.to_string()));
        if let Some(message) = &self.task_error {
            return Err(remote_error("GET", "task", message));
        }
        let mut tasks = self.tasks.lock().expect("tasks lock");
        let status = if tasks.len() > 1 {
            tasks.pop_front()
        } else {
            tasks.front().cloned()
        };
        Ok(status.unwrap_or_else(|| TaskStatus {
            progress: Some("completed".into()),
            ..TaskStatus::default()
        }))
    }
}

#[derive(Default)]
pub struct RecordingPause {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().expect("pause lock").clone()
    }
}

impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.calls.lock().expect("pause lock").push(duration);
    }
}
