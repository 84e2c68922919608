//! `redwatch-core` — configuration, shared errors, and input validation.
//!
//! Everything here is consumed by the pipeline crates: the figment-based
//! config (TOML file + `REDWATCH_*` env overrides), the top-level error
//! type, and the validators that guard what the management surface is
//! allowed to hand the core (community names, webhook URLs, keyword
//! phrases and exclusions).

pub mod config;
pub mod error;
pub mod validate;

pub use config::RedwatchConfig;
pub use error::{CoreError, Result};
