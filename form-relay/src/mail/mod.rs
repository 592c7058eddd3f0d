//! Outbound mail.
//!
//! This module provides:
//! - The [`MailTransport`] seam over the SMTP client
//! - A lettre-backed async SMTP transport built from the form configuration
//! - The [`MailDispatcher`] that turns a body into one delivery attempt
//!
//! ## Flow
//!
//! ```text
//! body → MailDispatcher → Message → MailTransport → SMTP relay
//! ```

pub mod dispatcher;
pub mod transport;

#[cfg(test)]
pub(crate) mod stub;

pub use dispatcher::{DeliveryMode, DispatchResult, MailDispatcher, SEND_FAILURE_REASON};
pub use transport::{smtp_transport, MailError, MailTransport};
