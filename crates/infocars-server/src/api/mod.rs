mod cascade;
mod page;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use infocars_cascade::CascadeController;
use infocars_core::Stage;
use infocars_fipe::CatalogSource;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

/// The page drives one shared cascade; every visitor sees the same selection.
pub type SharedController = Arc<CascadeController<Box<dyn CatalogSource>>>;

/// How long a selection request waits for the cascade to settle before
/// answering with whatever is loaded so far.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub controller: SharedController,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Resolves a route's `{stage}` segment to one of the selectable stages.
pub(super) fn parse_selectable_stage(request_id: &str, raw: &str) -> Result<Stage, ApiError> {
    Stage::parse(raw)
        .filter(|s| Stage::SELECTABLE.contains(s))
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "bad_request",
                format!("unknown stage '{raw}' (expected brand, model or year)"),
            )
        })
}

/// Waits for the cascade to stop loading, bounded by [`SETTLE_TIMEOUT`].
pub(super) async fn settle(controller: &SharedController) {
    if tokio::time::timeout(SETTLE_TIMEOUT, controller.settle())
        .await
        .is_err()
    {
        tracing::warn!("cascade still loading after {SETTLE_TIMEOUT:?}; responding with partial state");
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/select/{stage}", post(page::select))
        .route("/api/v1/cascade", get(cascade::get_cascade))
        .route("/api/v1/cascade/{stage}", post(cascade::select_stage))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}
