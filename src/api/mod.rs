//! Realtime HTTP side: the long polling endpoint and its worker loop

mod client;
mod error;
pub mod types;
pub(crate) mod worker;

pub use client::{Client, Poller};
pub use error::Error;

/// Result type for api module
pub type Result<T> = std::result::Result<T, Error>;
