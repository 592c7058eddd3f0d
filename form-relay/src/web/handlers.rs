//! Endpoint handlers.
//!
//! The submission pipeline short-circuits on the first failure:
//! 1. Content type must be JSON (415)
//! 2. Body must parse as JSON (400)
//! 3. Keys must match the configured fields exactly (406)
//! 4. The body is assembled and handed to the dispatcher (200 or 500)

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::FormConfig;
use crate::form::{validate, Submission};
use crate::mail::{DispatchResult, MailDispatcher};

pub const UNSUPPORTED_MEDIA_TYPE: &str = "Unsupported media type";
pub const FIELD_MISMATCH: &str = "Unexpected or missing data field(s)";
pub const NOT_FOUND: &str = "Not found";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub form: Arc<FormConfig>,
    pub dispatcher: Arc<MailDispatcher>,
}

impl AppState {
    pub fn new(form: FormConfig, dispatcher: MailDispatcher) -> Self {
        Self {
            form: Arc::new(form),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// JSON body for every form endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormResponse {
    pub fn status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            error: Some(message.into()),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some("error".to_string()),
            error: Some(reason.into()),
        }
    }
}

// =============================================================================
// Debug / Health
// =============================================================================

/// Plain-text liveness answer for `GET /`.
pub async fn root() -> &'static str {
    "Hello World"
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Catch-all for paths no route matches.
pub async fn not_found() -> (StatusCode, Json<FormResponse>) {
    (StatusCode::NOT_FOUND, Json(FormResponse::error(NOT_FOUND)))
}

/// Answer for a known path hit with a method it does not serve.
pub async fn method_not_allowed() -> (StatusCode, Json<FormResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(FormResponse::error(METHOD_NOT_ALLOWED)),
    )
}

// =============================================================================
// Form Submission
// =============================================================================

/// `POST /` endpoint.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<FormResponse>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let (status, response) =
        handle_submission(content_type, &body, &state.form, &state.dispatcher).await;

    (status, Json(response))
}

/// Run one submission through validation and dispatch.
pub async fn handle_submission(
    content_type: Option<&str>,
    raw_body: &[u8],
    form: &FormConfig,
    dispatcher: &MailDispatcher,
) -> (StatusCode, FormResponse) {
    if !is_json_content_type(content_type) {
        warn!(content_type = ?content_type, "submission_unsupported_media_type");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FormResponse::error(UNSUPPORTED_MEDIA_TYPE),
        );
    }

    let decoded: Value = match serde_json::from_slice(raw_body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, body_length = raw_body.len(), "submission_malformed_json");
            return (StatusCode::BAD_REQUEST, FormResponse::error(e.to_string()));
        }
    };

    if !validate(&decoded, &form.expected_fields) {
        warn!(
            received_fields = decoded.as_object().map(|o| o.len()).unwrap_or(0),
            expected_fields = form.expected_fields.len(),
            "submission_field_mismatch"
        );
        return (StatusCode::NOT_ACCEPTABLE, FormResponse::error(FIELD_MISMATCH));
    }

    let Some(submission) = Submission::project(&decoded) else {
        warn!("submission_non_string_value");
        return (StatusCode::NOT_ACCEPTABLE, FormResponse::error(FIELD_MISMATCH));
    };

    info!(fields = submission.len(), "submission_accepted");

    let body = submission.compose_body(&form.expected_fields);

    match dispatcher.send(&body).await {
        DispatchResult::Sent => (StatusCode::OK, FormResponse::status("success")),
        DispatchResult::Disabled => (StatusCode::OK, FormResponse::status("disabled")),
        DispatchResult::Failed(reason) => {
            (StatusCode::INTERNAL_SERVER_ERROR, FormResponse::failed(reason))
        }
    }
}

/// Accepts `application/json` and `application/*+json`, with any parameters.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(mime) = content_type.and_then(|v| v.parse::<mime::Mime>().ok()) else {
        return false;
    };

    mime.type_() == mime::APPLICATION
        && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON))
}
