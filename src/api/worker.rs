use std::{sync::Arc, time::Duration};

use super::{types::PollResponse, Poller};
use crate::{
    session::{EventSender, Status, TransportKind},
    Config,
};

/// Long polling loop of one session generation.
///
/// Re-polls immediately after a success, after `retry_delay` on a failure, and tears the
/// session down when the credential is rejected.
#[derive(Debug)]
pub(crate) struct PollWorker<P> {
    sender: EventSender,
    poller: Arc<P>,
    token: String,
    retry_delay: Duration,
    timeout: Duration,
}

impl<P: Poller> PollWorker<P> {
    pub fn new(sender: EventSender, poller: Arc<P>, token: String, config: &Config) -> Self {
        Self {
            sender,
            poller,
            token,
            retry_delay: config.poll_retry_delay,
            timeout: config.request_timeout,
        }
    }

    pub async fn run(self) {
        log::debug!("Poll worker start");

        if !self
            .sender
            .set_status(TransportKind::Polling, Status::Connecting)
        {
            return;
        }

        loop {
            let cursor = match self.sender.cursor() {
                Some(cursor) => cursor,
                None => break,
            };

            log::trace!("Poll with cursor {:?}", cursor);

            let result =
                tokio::time::timeout(self.timeout, self.poller.poll(&self.token, cursor.as_deref()))
                    .await;

            match result {
                Ok(Ok(resp)) => {
                    if !self.deliver(resp) {
                        break;
                    }
                    // next poll right away, the server holds the request
                    tokio::task::yield_now().await;
                    continue;
                }
                Ok(Err(err)) if err.is_auth_failure() => {
                    log::error!("Authentication failed, stop polling: {}", err);
                    self.sender.auth_failed();
                    break;
                }
                Ok(Err(err)) => {
                    log::warn!("Poll failed: {}", err);
                }
                Err(_) => {
                    log::warn!("Poll timeout after {:?}", self.timeout);
                }
            }

            if !self
                .sender
                .set_status(TransportKind::Polling, Status::Error)
            {
                break;
            }

            log::debug!("Re-poll in {:?}", self.retry_delay);
            tokio::time::sleep(self.retry_delay).await;
        }

        log::debug!("Poll worker stop");
    }

    fn deliver(&self, resp: PollResponse) -> bool {
        if !self
            .sender
            .set_status(TransportKind::Polling, Status::Connected)
        {
            return false;
        }

        log::trace!(
            "Poll returned {} events, server time {:?}",
            resp.events.len(),
            resp.timestamp
        );

        for event in resp.events {
            let cursor = event.cursor();

            if !self.sender.send_event(event) {
                return false;
            }

            if let Some(cursor) = cursor {
                if !self.sender.update_cursor(cursor) {
                    return false;
                }
            }
        }

        true
    }
}
