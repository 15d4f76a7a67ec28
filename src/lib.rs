//! # chat-realtime
//!
//! Realtime event connection manager of the chat client.
//!
//! A [Session] keeps a live event stream from the chat server. It prefers a persistent
//! socket (`<ws-base>/ws?token=...`), reconnects it with exponential backoff, and after
//! repeated failure switches to long polling `<api-base>/realtime/poll` for the rest of
//! the session. Every received event is handed to the subscribed [Listener]s.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chat_realtime::{Config, RealtimeEvent, Session};
//!
//! # async fn run() -> chat_realtime::Result<()> {
//! let session = Session::new(Config::default())?;
//!
//! let subscription = session.subscribe(Arc::new(|event: &RealtimeEvent| {
//!     println!("{}: {}", event.r#type, event.payload);
//! }));
//!
//! session.connect("token");
//! // ...
//! subscription.unsubscribe();
//! session.disconnect();
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod backoff;
pub mod config;
pub mod filter;
pub mod session;
pub mod ws;

mod dispatcher;
mod error;
mod subscriber;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use dispatcher::{Dispatcher, Subscription};
pub use error::{Error, Result};
pub use session::{ConnectionStatus, Session, Status, TransportKind};
pub use subscriber::Listener;
pub use ws::{EventType, RealtimeEvent};
