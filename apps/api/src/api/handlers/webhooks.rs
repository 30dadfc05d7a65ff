use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::infrastructure::repositories::{PostgresCallRepository, PostgresLeadRepository};
use crate::services::{CallEventProcessor, EventOutcome, VoiceEvent};

pub const SECRET_HEADER: &str = "x-vapi-secret";

/// Rejects the request unless it carries the configured webhook secret
fn check_secret(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid webhook secret"))
    }
}

/// Voice provider call events
///
/// POST /api/webhooks/voice
///
/// Payloads this service does not understand are acknowledged so the
/// provider does not keep retrying them.
pub async fn voice_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    check_secret(state.config.voice.webhook_secret.as_deref(), &headers)?;

    let event: VoiceEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unrecognized webhook payload");
            return Ok(Json(json!({ "received": true, "applied": false })));
        }
    };

    let processor = CallEventProcessor::new(
        Arc::new(PostgresCallRepository::new(state.pool.clone())),
        Arc::new(PostgresLeadRepository::new(state.pool.clone())),
    );
    let outcome = processor.handle(event).await?;

    Ok(Json(json!({
        "received": true,
        "applied": outcome == EventOutcome::Applied,
    })))
}
