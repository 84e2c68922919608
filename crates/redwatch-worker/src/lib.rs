//! `redwatch-worker` — background worker wiring.
//!
//! Drives the poll → match → alert pipeline on a schedule: an interval
//! job for the pipeline (plus one immediate run at startup) and a daily
//! retention sweep at 03:00 local time. Each scheduled run opens its
//! own store handle and releases it on every exit path; failures inside
//! a run are logged and swallowed so one bad tick never stops the
//! scheduler.

pub mod jobs;
pub mod pipeline;

pub use jobs::{dispatch_job, run_pipeline_job, run_retention_job, PIPELINE_JOB, RETENTION_JOB};
pub use pipeline::{run_pipeline, PipelineSummary};
