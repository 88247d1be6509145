//! HTTP routes for the review service
//!
//! Handlers only translate between the wire and [`ReviewService`]; every
//! decision about ids, defaults and visibility is made by the service.
//! The capability named on each route is the one a gateway is expected to
//! enforce in front of this service.
//!
//! [`ReviewService`]: crate::application::reviews::ReviewService

use crate::domain::error::ReviewError;
use crate::domain::model::{FieldError, NewReview, Review};
use crate::domain::patch::PatchOperation;
use crate::infrastructure::config::ServerConfig;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tower_http::trace::TraceLayer;

/// Create the service router
pub fn create_router(state: AppState) -> Router {
    let base = reviews_path(&state.config.server);

    Router::new()
        .route(&base, get(list_reviews))
        .route(&format!("{}/Visible/:id", base), get(list_visible_reviews))
        .route(&format!("{}/Create", base), post(create_review))
        .route(&format!("{}/Visibility/:id", base), patch(update_visibility))
        .route(&format!("{}/:id", base), get(get_review))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `/ProductReviews` under the configured base path.
pub fn reviews_path(server: &ServerConfig) -> String {
    let base = server.base_path.trim().trim_end_matches('/');
    if base.is_empty() {
        "/ProductReviews".to_string()
    } else if base.starts_with('/') {
        format!("{}/ProductReviews", base)
    } else {
        format!("/{}/ProductReviews", base)
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    "OK"
}

/// GET /ProductReviews (ReadReviews)
async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>, ReviewError> {
    Ok(Json(state.reviews.list_all().await?))
}

/// GET /ProductReviews/Visible/{id} (ReadVisibleReviews)
async fn list_visible_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<Review>>, ReviewError> {
    Ok(Json(
        state.reviews.list_visible_for_product(product_id).await?,
    ))
}

/// GET /ProductReviews/{id} (ReadReview)
async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Review>, ReviewError> {
    Ok(Json(state.reviews.get_by_id(id).await?))
}

/// POST /ProductReviews/Create (CreateReview)
///
/// Answers 201 with the stored review and a `Location` pointing at it.
async fn create_review(
    State(state): State<AppState>,
    input: Result<Json<Option<NewReview>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = input?;
    let review = state.reviews.create(input).await?;
    let location = format!("{}/{}", reviews_path(&state.config.server), review.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(review),
    )
        .into_response())
}

/// PATCH /ProductReviews/Visibility/{id} (UpdateReview)
async fn update_visibility(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ops: Result<Json<Option<Vec<PatchOperation>>>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(ops) = ops?;
    state.reviews.update_patch(id, ops).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ValidationProblem {
    title: &'static str,
    status: u16,
    errors: BTreeMap<String, Vec<String>>,
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ReviewError::InvalidArgument { .. } => (StatusCode::BAD_REQUEST, "invalid_argument"),
            ReviewError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ReviewError::ValidationFailed(field_errors) => {
                let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for e in field_errors {
                    errors
                        .entry(e.field.clone())
                        .or_default()
                        .push(e.message.clone());
                }
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let body = ValidationProblem {
                    title: "One or more validation errors occurred.",
                    status: status.as_u16(),
                    errors,
                };
                return (status, Json(body)).into_response();
            }
            other => {
                // Details stay in the log; the client gets a generic message
                tracing::error!(error = %other, "request failed");
                let body = ErrorBody {
                    error: "internal_error",
                    message: "An unexpected error occurred.".to_string(),
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ErrorBody {
            error,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failure of a handler that reads a JSON body.
///
/// A body that parses but does not fit the target type is reported like
/// any other validation failure; other rejections keep axum's response.
enum ApiError {
    Review(ReviewError),
    Body(JsonRejection),
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        ApiError::Review(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let message = err.body_text();
                let field = FieldError::new(rejected_field(&message), message.clone());
                ApiError::Review(ReviewError::ValidationFailed(vec![field]))
            }
            other => ApiError::Body(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Review(err) => err.into_response(),
            ApiError::Body(rejection) => rejection.into_response(),
        }
    }
}

/// Field a deserialization message points at, or `body` when it names none.
fn rejected_field(message: &str) -> &str {
    if let Some((_, rest)) = message.split_once("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return field;
        }
    }

    // Nested failures are prefixed with their path, e.g. `productId: invalid type`
    message
        .rsplit_once("target type: ")
        .and_then(|(_, detail)| detail.split_once(": "))
        .map(|(path, _)| path)
        .filter(|path| !path.is_empty() && !path.contains(' '))
        .unwrap_or("body")
}

