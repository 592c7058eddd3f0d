//! Form schema handling.
//!
//! This module provides:
//! - Exact field-set validation of decoded JSON against the configured schema
//! - Projection of a validated object onto string values
//! - Assembly of the plaintext email body

pub mod fields;
pub mod submission;

pub use fields::{validate, ExpectedFields};
pub use submission::Submission;
