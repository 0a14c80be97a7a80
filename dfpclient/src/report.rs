//! Waiting for report jobs

use crate::error::{DfpError, Result};
use crate::services::DfpService;
use dfpsoap::{WireStruct, WireValue};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Pause between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Checks before giving up (one hour at the default interval)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// Status of a report job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportJobStatus {
    InProgress,
    Completed,
    Failed,
}

impl ReportJobStatus {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "IN_PROGRESS" | "PENDING" => Some(ReportJobStatus::InProgress),
            "COMPLETED" => Some(ReportJobStatus::Completed),
            "FAILED" => Some(ReportJobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_done(self) -> bool {
        self != ReportJobStatus::InProgress
    }
}

/// Polls a report job until it completes or fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPoller {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReportPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReportPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Calls `fetch` until it reports a final status, sleeping `interval`
    /// between calls.
    pub fn wait<F>(&self, job_id: &str, mut fetch: F) -> Result<ReportJobStatus>
    where
        F: FnMut() -> Result<ReportJobStatus>,
    {
        for attempt in 1..=self.max_attempts {
            let status = fetch()?;
            debug!(job_id, attempt, ?status, "Report job status");
            if status.is_done() {
                info!(job_id, ?status, "Report job finished");
                return Ok(status);
            }
            if attempt < self.max_attempts {
                thread::sleep(self.interval);
            }
        }

        Err(DfpError::ReportTimeout {
            job_id: job_id.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Polls `getReportJob` through a `ReportService` facade.
    pub fn wait_for_job(&self, service: &DfpService<'_>, job_id: &str) -> Result<ReportJobStatus> {
        self.wait(job_id, || {
            let args = WireStruct::new().with("reportJobId", job_id);
            let (job,) = service.call("getReportJob", args)?;
            job_status(&job)
        })
    }
}

/// Status of a `ReportJob` value.
pub fn job_status(job: &WireValue) -> Result<ReportJobStatus> {
    let text = job
        .get("reportJobStatus")
        .and_then(WireValue::as_str)
        .ok_or_else(|| DfpError::UnexpectedResponse("report job without status".into()))?;
    ReportJobStatus::parse(text)
        .ok_or_else(|| DfpError::UnexpectedResponse(format!("unknown report status {text}")))
}
