//! HTTP surface for order intake.
//!
//! - `POST /api/orders` - submit an order (`x-api-key` header)
//! - `GET  /api/health` - liveness plus database readiness
//!
//! Anything else answers 404 with the standard JSON envelope.

use std::any::Any;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use intake_core::domain::lifecycle::SubmissionStage;
use intake_core::domain::order::OrderReceipt;
use intake_core::errors::IntakeError;
use intake_db::DbPool;
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::health;
use crate::intake::{submit_order, IntakeContext, SubmissionOutcome};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct FieldErrorBody {
    pub field: &'static str,
    pub message: String,
}

/// Response envelope shared by every outcome.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldErrorBody>>,
}

impl ApiResponse<OrderReceipt> {
    fn accepted(outcome: &SubmissionOutcome) -> Self {
        Self {
            success: true,
            message: "Order submitted successfully!",
            data: Some(outcome.order.receipt()),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: &'static str) -> Self {
        Self { success: false, message, data: None, errors: None }
    }
}

pub struct ApiError(pub IntakeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IntakeError::Shape(_) | IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::Auth(_) => StatusCode::UNAUTHORIZED,
            IntakeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = ApiResponse::failure(self.0.user_message());
        if let IntakeError::Validation(violations) = &self.0 {
            body.errors = Some(
                violations
                    .iter()
                    .map(|violation| FieldErrorBody {
                        field: violation.field,
                        message: violation.message(),
                    })
                    .collect(),
            );
        }

        (status, Json(body)).into_response()
    }
}

pub fn router(context: IntakeContext, db_pool: DbPool) -> Router {
    Router::new()
        .route("/api/orders", post(create_order))
        .with_state(context)
        .merge(health::router(db_pool))
        .method_not_allowed_fallback(not_found)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

async fn create_order(
    State(context): State<IntakeContext>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<ApiResponse<OrderReceipt>>), ApiError> {
    let correlation_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let credential = headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok());

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            context
                .authenticator
                .verify(credential)
                .map_err(|auth_error| ApiError(auth_error.into()))?;
            warn!(
                event_name = "intake.submission.rejected",
                correlation_id = %correlation_id,
                stage = %SubmissionStage::RejectedValidation,
                error = %rejection.body_text(),
                "order submission body could not be read"
            );
            return Err(ApiError(IntakeError::Shape(rejection.body_text())));
        }
    };

    let outcome =
        submit_order(&context, credential, &body, &correlation_id).await.map_err(ApiError)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::accepted(&outcome))))
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::failure("Not Found")))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(
        event_name = "intake.http.panic",
        correlation_id = "unknown",
        detail,
        "request handler panicked"
    );

    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::failure("Internal server error")))
        .into_response()
}
