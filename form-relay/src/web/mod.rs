//! Web server module for the contact form endpoint.
//!
//! This module provides a single-endpoint web server that:
//! - Accepts JSON form submissions on `POST /`
//! - Checks them against the configured field schema
//! - Hands the assembled body to the mail dispatcher
//! - Adds permissive CORS headers to every response

pub mod cors;
pub mod handlers;
pub mod router;

pub use cors::{apply_cors_headers, cors_layer};
pub use handlers::{
    handle_submission, health, is_json_content_type, method_not_allowed, not_found, root, submit,
    AppState,
    FormResponse, HealthResponse,
};
pub use router::build_router;
