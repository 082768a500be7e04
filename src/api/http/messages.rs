// src/api/http/messages.rs
// POST /v1/messages — the one HTTP surface over `processMessage` (spec §6),
// grounded in the teacher's `api::http::auth` router-factory + typed
// request/response DTO shape.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::super::AppState;
use crate::orchestrator::types::{ProcessMessageRequest, ProcessMessageResponse};
use crate::session::Session;
use crate::utils::buttons::Button;

pub fn create_messages_router() -> Router<AppState> {
    Router::new().route("/v1/messages", post(post_message))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequestBody {
    participant_id: String,
    message: String,
    module: Option<String>,
    image_url: Option<String>,
    test_session: Option<Session>,
    user_preference_context: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponseBody {
    response: String,
    buttons: Vec<Button>,
    execution_time: u64,
    metadata: serde_json::Value,
}

impl From<ProcessMessageResponse> for MessageResponseBody {
    fn from(resp: ProcessMessageResponse) -> Self {
        Self { response: resp.response, buttons: resp.buttons, execution_time: resp.execution_time_ms, metadata: resp.metadata }
    }
}

async fn post_message(State(state): State<AppState>, Json(body): Json<MessageRequestBody>) -> Result<Json<MessageResponseBody>, MessageError> {
    if body.participant_id.trim().is_empty() {
        return Err(MessageError::Validation("participantId must not be empty".to_string()));
    }
    if body.message.is_empty() {
        return Err(MessageError::Validation("message must not be empty".to_string()));
    }

    let mut req = ProcessMessageRequest::new(body.participant_id, body.message);
    req.module = body.module;
    req.image_url = body.image_url;
    req.test_session = body.test_session;
    req.user_preference_context = body.user_preference_context;

    let resp = state.orchestrator.process_message(req).await;
    Ok(Json(resp.into()))
}

#[derive(Debug)]
enum MessageError {
    Validation(String),
}

impl IntoResponse for MessageError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            MessageError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        error!(%message, "rejected /v1/messages request");
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_accepts_camel_case_wire_shape() {
        let body: MessageRequestBody = serde_json::from_value(serde_json::json!({
            "participantId": "whatsapp-919876543210",
            "message": "hi",
            "module": "food",
        }))
        .unwrap();

        assert_eq!(body.participant_id, "whatsapp-919876543210");
        assert_eq!(body.module.as_deref(), Some("food"));
        assert!(body.test_session.is_none());
    }

    #[test]
    fn response_body_serializes_in_camel_case() {
        let resp = ProcessMessageResponse::text("hello", 12).with_metadata(serde_json::json!({"intent": "greeting"}));
        let body: MessageResponseBody = resp.into();
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["executionTime"], 12);
        assert_eq!(value["metadata"]["intent"], "greeting");
    }
}
