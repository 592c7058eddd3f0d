//! SMTP transport construction and the transport seam.

use std::time::Duration;

use futures::future::BoxFuture;
use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use thiserror::Error;

use crate::config::{FormConfig, SmtpSecurity};

/// Errors from building or delivering a message.
///
/// These carry protocol detail and stay in the logs; clients only ever see a
/// generic reason.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("SMTP send timed out after {0:?}")]
    Timeout(Duration),

    /// Failure reported by a [`MailTransport`] not backed by lettre
    #[error("transport error: {0}")]
    Transport(String),
}

/// Something that can deliver a fully built message.
pub trait MailTransport: Send + Sync {
    fn deliver(&self, message: Message) -> BoxFuture<'_, Result<(), MailError>>;
}

impl MailTransport for AsyncSmtpTransport<Tokio1Executor> {
    fn deliver(&self, message: Message) -> BoxFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            self.send(message).await?;
            Ok(())
        })
    }
}

/// Build the async SMTP transport described by the form configuration.
///
/// No connection is opened here; lettre connects lazily on the first send.
/// `timeout` bounds each SMTP command on the socket.
pub fn smtp_transport(
    config: &FormConfig,
    timeout: Duration,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
    let builder = match config.smtp_secure {
        SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
        SmtpSecurity::Ssl => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
        SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
    };

    let mut builder = builder.port(config.port).timeout(Some(timeout));

    if config.smtp_auth {
        builder = builder.credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ));
    }

    Ok(builder.build())
}
