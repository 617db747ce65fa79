//! Annotation analysis endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::super::AppState;
use crate::annotations::{accept_candidates, AnnotationResponse};

fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Analyze a buffer and return annotations with fresh ids.
///
/// Body: `{"code": string, "context"?: string}`.
pub async fn create_annotations(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": rejection.body_text() }),
            );
        }
    };

    let Some(code) = body
        .get("code")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "Code is required and must be a string" }),
        );
    };
    let context = body.get("context").and_then(Value::as_str);

    if code.trim().chars().count() < state.annotations.min_analyzable_chars {
        return Json(AnnotationResponse::default()).into_response();
    }

    match state.analyzer.analyze(code, context).await {
        Ok(candidates) => {
            let annotations =
                accept_candidates(code, candidates, state.annotations.max_annotations);
            Json(AnnotationResponse { annotations }).into_response()
        }
        Err(e) => {
            tracing::error!("Annotation analysis failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "Failed to generate annotations",
                    "details": e.to_string(),
                }),
            )
        }
    }
}
