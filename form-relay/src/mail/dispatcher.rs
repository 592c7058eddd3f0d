//! Mail dispatch with a sent / disabled / failed outcome.

use std::{sync::Arc, time::Duration};

use lettre::{
    message::{header::ContentType, Mailbox},
    Message,
};
use tracing::{error, info};

use super::transport::{MailError, MailTransport};
use crate::config::{ConfigError, FormConfig};

/// Reason reported to clients for any failed send.
pub const SEND_FAILURE_REASON: &str = "Message could not be sent";

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Sent,
    /// Sending is switched off for this process
    Disabled,
    /// Delivery failed; the reason is safe to show to clients
    Failed(String),
}

/// Whether the dispatcher talks to the SMTP relay at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Live,
    Disabled,
}

/// Sends form bodies to the configured recipient.
///
/// Envelope and subject are fixed at construction. Each call to
/// [`MailDispatcher::send`] makes exactly one attempt, bounded by `timeout`.
pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
    mode: DeliveryMode,
    timeout: Duration,
}

impl MailDispatcher {
    pub fn new(
        config: &FormConfig,
        transport: Arc<dyn MailTransport>,
        mode: DeliveryMode,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            from: config.sender()?,
            to: config.recipient()?,
            subject: config.subject.clone(),
            mode,
            timeout,
        })
    }

    /// Build the plaintext message for `body`.
    pub fn build_message(&self, body: &str) -> Result<Message, MailError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())?)
    }

    /// Send `body` and report the outcome.
    ///
    /// Failure detail is logged here and replaced by [`SEND_FAILURE_REASON`].
    pub async fn send(&self, body: &str) -> DispatchResult {
        if self.mode == DeliveryMode::Disabled {
            info!(body_length = body.len(), "mail_disabled_skipped");
            return DispatchResult::Disabled;
        }

        match self.try_send(body).await {
            Ok(()) => {
                info!(to = %self.to, body_length = body.len(), "mail_sent");
                DispatchResult::Sent
            }
            Err(e) => {
                error!(error = %e, to = %self.to, "mail_send_failed");
                DispatchResult::Failed(SEND_FAILURE_REASON.to_string())
            }
        }
    }

    async fn try_send(&self, body: &str) -> Result<(), MailError> {
        let message = self.build_message(body)?;

        match tokio::time::timeout(self.timeout, self.transport.deliver(message)).await {
            Ok(result) => result,
            Err(_) => Err(MailError::Timeout(self.timeout)),
        }
    }
}
