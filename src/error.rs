//! crate error types

use snafu::prelude::*;

use super::api::Error as APIError;
use super::config::ConfigError;

/// crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// crate error type
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    /// Create http polling client failed
    #[snafu(display("create polling client failed: {source}"))]
    CreatePollerFailed {
        /// source error
        source: APIError,
    },

    /// Load configuration failed
    #[snafu(display("load config failed: {source}"))]
    LoadConfigFailed {
        /// source error
        source: ConfigError,
    },
}
