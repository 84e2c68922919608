//! `redwatch-scheduler` — Tokio-based job scheduler with SQLite persistence.
//!
//! # Overview
//!
//! Jobs are persisted to a SQLite `jobs` table. The
//! [`engine::SchedulerEngine`] polls the database every second and fires
//! any job whose `next_run` has arrived, forwarding it over an mpsc
//! channel to whoever executes the work, then computing the next
//! scheduled time. A fired job's handler runs outside the tick loop, so
//! a slow pipeline run never delays bookkeeping; on shutdown the loop
//! stops firing but in-flight handlers finish on their own.
//!
//! # Schedule variants
//!
//! | Variant    | Behaviour                                   |
//! |------------|---------------------------------------------|
//! | `Once`     | Single fire at an absolute UTC instant      |
//! | `Interval` | Repeat every N seconds                      |
//! | `Daily`    | Fire at HH:MM local time every day          |

pub mod db;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod types;

pub use engine::SchedulerEngine;
pub use error::{Result, SchedulerError};
pub use schedule::compute_next_run;
pub use types::{Job, JobStatus, Schedule};
