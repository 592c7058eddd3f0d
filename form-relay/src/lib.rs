//! Form Relay - contact form submissions forwarded as email.
//!
//! This library provides the modules behind the `form-relay` binary:
//! - `config`: server settings from the environment, form schema and SMTP settings from JSON
//! - `form`: exact field-set validation and email body assembly
//! - `mail`: SMTP transport and the sent / disabled / failed dispatcher
//! - `web`: axum handlers, CORS middleware and the router
//!
//! ## Architecture
//!
//! ```text
//! Browser → CORS layer → POST / → validate → compose body → MailDispatcher → SMTP relay
//! ```

pub mod config;
pub mod form;
pub mod mail;
pub mod web;

// Re-export commonly used types
pub use config::{ConfigError, FormConfig, ServerConfig, SmtpSecurity};
pub use form::{ExpectedFields, Submission};
pub use mail::{DeliveryMode, DispatchResult, MailDispatcher, MailError, MailTransport};
pub use web::{build_router, AppState};
