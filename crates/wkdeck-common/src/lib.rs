//! wkdeck common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared pieces used by every wkdeck workspace member:
//!
//! - **Error Handling**: [`WkError`] and the [`Result`] alias
//! - **Environment**: typed readers for configuration variables
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//!
//! # Example
//!
//! ```no_run
//! use wkdeck_common::env::{env_flag, env_parse};
//!
//! fn settings() -> wkdeck_common::Result<(bool, u32)> {
//!     Ok((env_flag("WKDECK_FORCE_REFRESH", false)?, env_parse("WKDECK_MAX_CACHE_AGE_DAYS", 7)?))
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

pub use error::{Result, WkError};
