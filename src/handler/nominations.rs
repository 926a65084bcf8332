// handler/nominations.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        ApiResponse, ListResponse, NominateDto, NominationDecisionDto, NominationQueryDto,
        NominationView,
    },
    error::HttpError,
    AppState,
};

pub fn nominations_handler() -> Router {
    Router::new()
        .route("/", post(nominate).get(get_nominations))
        .route("/:nomination_id/decision", put(decide_nomination))
}

pub async fn nominate(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<NominateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let nomination = app_state
        .nomination_service
        .nominate(body.nominator_id, body.employee_id, body.points, body.reason)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Nomination submitted",
            NominationView::from_nomination(nomination),
        )),
    ))
}

pub async fn get_nominations(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<NominationQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let nominations = app_state
        .nomination_service
        .list_nominations(params.nominator_id, params.status)
        .await?;

    Ok(Json(ListResponse::new(NominationView::from_nominations(
        nominations,
    ))))
}

pub async fn decide_nomination(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(nomination_id): Path<Uuid>,
    Json(body): Json<NominationDecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let nomination = app_state
        .nomination_service
        .decide(body.admin_id, nomination_id, body.approve)
        .await?;

    let message = if body.approve {
        "Nomination approved"
    } else {
        "Nomination rejected"
    };

    Ok(Json(ApiResponse::success(
        message,
        NominationView::from_nomination(nomination),
    )))
}
