use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Every DNAC intent API response wraps its payload in `{"response": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

/// One entry of the network-device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub management_ip_address: Option<String>,
    #[serde(default)]
    pub platform_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    pub id: String,
    #[serde(default)]
    pub management_status: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
}

const PROVISIONED_STATUSES: [&str; 2] = ["MANAGED", "PROVISIONED"];

impl DeviceDetail {
    /// Managed/provisioned status or any site assignment counts as provisioned.
    pub fn is_provisioned(&self) -> bool {
        let status_provisioned = self
            .management_status
            .as_deref()
            .is_some_and(|s| PROVISIONED_STATUSES.contains(&s));
        let has_site = self.site_id.as_deref().is_some_and(|s| !s.is_empty());
        status_provisioned || has_site
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub task_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub end_time: Option<serde_json::Value>,
}

/// Where a task stands after a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Completed,
    Errored(String),
}

impl TaskStatus {
    pub fn classify(&self, signal: CompletionSignal) -> TaskState {
        if self.is_error {
            let reason = self
                .failure_reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .unwrap_or("Unknown error");
            return TaskState::Errored(reason.to_string());
        }

        if signal.is_complete(self) {
            TaskState::Completed
        } else {
            TaskState::Pending
        }
    }

    fn has_end_time(&self) -> bool {
        match &self.end_time {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    fn progress_says_completed(&self) -> bool {
        self.progress
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains("completed"))
    }
}

/// Which task fields count as "done".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionSignal {
    #[default]
    EndTimeOrProgress,
    EndTime,
    Progress,
}

impl CompletionSignal {
    fn is_complete(self, task: &TaskStatus) -> bool {
        match self {
            CompletionSignal::EndTimeOrProgress => {
                task.has_end_time() || task.progress_says_completed()
            }
            CompletionSignal::EndTime => task.has_end_time(),
            CompletionSignal::Progress => task.progress_says_completed(),
        }
    }
}

impl FromStr for CompletionSignal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "end-time-or-progress" => Ok(CompletionSignal::EndTimeOrProgress),
            "end-time" => Ok(CompletionSignal::EndTime),
            "progress" => Ok(CompletionSignal::Progress),
            other => bail!(
                "unknown completion signal '{}' (expected 'end-time-or-progress', 'end-time' or 'progress')",
                other
            ),
        }
    }
}

impl fmt::Display for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionSignal::EndTimeOrProgress => write!(f, "end-time-or-progress"),
            CompletionSignal::EndTime => write!(f, "end-time"),
            CompletionSignal::Progress => write!(f, "progress"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(value: serde_json::Value) -> TaskStatus {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn error_flag_wins_over_completion() {
        let t = task(json!({
            "isError": true,
            "failureReason": "config locked",
            "progress": "Device deletion completed",
            "endTime": 1717000000000u64
        }));
        assert_eq!(
            t.classify(CompletionSignal::EndTimeOrProgress),
            TaskState::Errored("config locked".into())
        );
    }

    #[test]
    fn error_without_reason_is_unknown() {
        let t = task(json!({ "isError": true }));
        assert_eq!(
            t.classify(CompletionSignal::default()),
            TaskState::Errored("Unknown error".into())
        );
    }

    #[test]
    fn end_time_signals_completion() {
        let t = task(json!({ "isError": false, "progress": "in flight", "endTime": 1717000000000u64 }));
        assert_eq!(t.classify(CompletionSignal::EndTimeOrProgress), TaskState::Completed);
        assert_eq!(t.classify(CompletionSignal::EndTime), TaskState::Completed);
        assert_eq!(t.classify(CompletionSignal::Progress), TaskState::Pending);
    }

    #[test]
    fn progress_match_is_case_insensitive() {
        let t = task(json!({ "isError": false, "progress": "Network device deletion COMPLETED" }));
        assert_eq!(t.classify(CompletionSignal::EndTimeOrProgress), TaskState::Completed);
        assert_eq!(t.classify(CompletionSignal::Progress), TaskState::Completed);
        assert_eq!(t.classify(CompletionSignal::EndTime), TaskState::Pending);
    }

    #[test]
    fn pending_task_stays_pending() {
        let t = task(json!({ "isError": false, "progress": "Deleting device", "endTime": null }));
        assert_eq!(t.classify(CompletionSignal::default()), TaskState::Pending);
    }

    #[test]
    fn provisioned_by_status_or_site() {
        let managed = DeviceDetail {
            id: "D1".into(),
            management_status: Some("MANAGED".into()),
            site_id: None,
        };
        let sited = DeviceDetail {
            id: "D2".into(),
            management_status: Some("UNKNOWN".into()),
            site_id: Some("site-42".into()),
        };
        let bare = DeviceDetail {
            id: "D3".into(),
            management_status: Some("UNKNOWN".into()),
            site_id: Some(String::new()),
        };
        assert!(managed.is_provisioned());
        assert!(sited.is_provisioned());
        assert!(!bare.is_provisioned());
    }

    #[test]
    fn completion_signal_parses_from_cli_text() {
        assert_eq!("end-time".parse::<CompletionSignal>().unwrap(), CompletionSignal::EndTime);
        assert!("whenever".parse::<CompletionSignal>().is_err());
    }

    #[test]
    fn decodes_device_list_envelope() {
        let env: Envelope<Vec<DeviceSummary>> = serde_json::from_value(json!({
            "response": [{
                "id": "D1",
                "hostname": "sw1.example.net",
                "managementIpAddress": "10.0.0.1",
                "platformId": "C9300-48P",
                "reachabilityStatus": "Reachable",
                "family": "Switches and Hubs"
            }],
            "version": "1.0"
        }))
        .unwrap();
        assert_eq!(env.response.len(), 1);
        assert_eq!(env.response[0].id, "D1");
        assert_eq!(env.response[0].management_ip_address.as_deref(), Some("10.0.0.1"));
    }
}
