//! JSON view of the shared cascade.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use infocars_cascade::CascadeSnapshot;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{parse_selectable_stage, settle, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SelectBody {
    pub code: String,
}

/// `GET /api/v1/cascade`: the cascade as it is right now, loading states included.
pub(super) async fn get_cascade(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<CascadeSnapshot>> {
    Json(ApiResponse {
        data: state.controller.snapshot(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// `POST /api/v1/cascade/{stage}`: applies a choice and answers once the
/// cascade has settled (or the settle timeout passed).
pub(super) async fn select_stage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(stage): Path<String>,
    Json(body): Json<SelectBody>,
) -> Result<Json<ApiResponse<CascadeSnapshot>>, ApiError> {
    let stage = parse_selectable_stage(&req_id.0, &stage)?;
    tracing::info!(%stage, code = %body.code, "selection requested");

    state.controller.select(stage, &body.code);
    settle(&state.controller).await;

    Ok(Json(ApiResponse {
        data: state.controller.snapshot(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
