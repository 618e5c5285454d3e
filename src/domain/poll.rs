//! Fixed-interval polling with a hard attempt cap.
//!
//! `poll_until` drives any probe until it reports a terminal value or the
//! attempt budget runs out. `await_task` specialises it for controller tasks.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::DnacError;

use super::ports::{DnacApi, Pause};
use super::types::{CompletionSignal, TaskState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Ready(T),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    /// The budget ran out while the probe was still pending.
    Exhausted { attempts: u32 },
    /// The probe itself failed. Polling stops immediately.
    Probe(E),
}

/// Probe up to `policy.max_attempts` times, pausing `policy.interval` between
/// attempts. No pause follows a terminal result or the final attempt.
pub async fn poll_until<T, E, P, F, Fut>(
    policy: PollPolicy,
    pause: &P,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    P: Pause,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        match probe(attempt).await.map_err(PollError::Probe)? {
            Probe::Ready(value) => return Ok(value),
            Probe::Pending if attempt < policy.max_attempts => {
                pause.pause(policy.interval).await;
            }
            Probe::Pending => {}
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}

/// Terminal state of a controller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Errored(String),
    TimedOut { attempts: u32, waited: Duration },
    PollFailed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Completed => write!(f, "Device deleted successfully"),
            TaskOutcome::Errored(reason) => write!(f, "Task failed: {}", reason),
            TaskOutcome::TimedOut { attempts, waited } => write!(
                f,
                "Task did not complete after {} polls ({} seconds)",
                attempts,
                waited.as_secs()
            ),
            TaskOutcome::PollFailed(err) => write!(f, "Error checking task status: {}", err),
        }
    }
}

/// Poll a controller task until it completes, errors, or the budget runs out.
pub async fn await_task<A: DnacApi, P: Pause>(
    api: &A,
    pause: &P,
    task_id: &str,
    policy: PollPolicy,
    signal: CompletionSignal,
) -> TaskOutcome {
    let result = poll_until(policy, pause, |attempt| async move {
        let status = api.task(task_id).await?;
        debug!(
            task_id,
            attempt,
            max_attempts = policy.max_attempts,
            progress = status.progress.as_deref().unwrap_or(""),
            is_error = status.is_error,
            "polled task"
        );
        Ok::<_, DnacError>(match status.classify(signal) {
            TaskState::Pending => Probe::Pending,
            TaskState::Completed => Probe::Ready(TaskOutcome::Completed),
            TaskState::Errored(reason) => Probe::Ready(TaskOutcome::Errored(reason)),
        })
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(PollError::Exhausted { attempts }) => TaskOutcome::TimedOut {
            attempts,
            waited: policy.interval.saturating_mul(attempts),
        },
        Err(PollError::Probe(e)) => TaskOutcome::PollFailed(e.to_string()),
    }
}
