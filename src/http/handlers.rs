//! Route handlers.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::http::error::AppError;
use crate::http::response::Greeting;
use crate::http::server::AppState;

/// Subsegment covering payload construction.
pub const PREPARE_RESPONSE: &str = "prepare-response";
/// Annotation holding the serialized body length in bytes.
pub const RESPONSE_SIZE: &str = "response_size";

/// `GET /`: greeting built from startup configuration.
///
/// Runs inside the request segment opened by middleware.
pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = {
        let mut subsegment = state.recorder.begin_subsegment(PREPARE_RESPONSE);
        let greeting = Greeting::from_settings(&state.settings);
        let body = serde_json::to_vec(&greeting)?;
        subsegment.put_annotation(RESPONSE_SIZE, body.len());
        body
    };

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
