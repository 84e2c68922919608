use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Defines when and how often a job should run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Run exactly once at the given UTC instant.
    Once { at: DateTime<Utc> },

    /// Run repeatedly with a fixed interval in seconds.
    Interval { every_secs: u64 },

    /// Run every day at the given hour and minute, local time.
    Daily { hour: u8, minute: u8 },
}

/// Lifecycle state of a job execution slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its next_run time.
    Pending,
    /// Finished (Once jobs after their single run).
    Completed,
    /// The scheduled window was skipped (e.g. the process was down).
    Missed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Missed => "missed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "completed" => Ok(JobStatus::Completed),
            "missed" => Ok(JobStatus::Missed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A persisted job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// UUID v4 string — primary key.
    pub id: String,
    /// Human-readable label; also what the worker dispatches on.
    pub name: String,
    pub schedule: Schedule,
    /// Opaque payload forwarded to the job handler.
    pub action: String,
    pub status: JobStatus,
    /// ISO-8601 timestamp of the most recent execution start, if any.
    pub last_run: Option<String>,
    /// ISO-8601 timestamp of the next planned execution, if any.
    pub next_run: Option<String>,
    pub run_count: u32,
    pub created_at: String,
    pub updated_at: String,
}
