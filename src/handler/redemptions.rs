// handler/redemptions.rs
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
        ApiResponse, ListResponse, RedeemRewardDto, RedemptionQueryDto, RedemptionView,
        UpdateRedemptionStatusDto,
    },
    error::HttpError,
    service::reward_service::RedemptionRequest,
    AppState,
};

pub fn redemptions_handler() -> Router {
    Router::new()
        .route("/", post(redeem_reward).get(get_redemptions))
        .route("/:redemption_id/status", put(update_redemption_status))
}

pub async fn redeem_reward(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RedeemRewardDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let redemption = app_state
        .reward_service
        .redeem(RedemptionRequest {
            user_id: body.user_id,
            reward_id: body.reward_id,
            delivery_address: body.delivery_address,
            notes: body.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Redemption submitted",
            RedemptionView::from_redemption(redemption),
        )),
    ))
}

pub async fn get_redemptions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<RedemptionQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let redemptions = app_state
        .reward_service
        .list_redemptions(params.user_id, params.status)
        .await?;

    Ok(Json(ListResponse::new(RedemptionView::from_redemptions(
        redemptions,
    ))))
}

pub async fn update_redemption_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(redemption_id): Path<Uuid>,
    Json(body): Json<UpdateRedemptionStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let redemption = app_state
        .reward_service
        .update_status(
            body.admin_id,
            redemption_id,
            body.status,
            body.tracking_number,
            body.notes,
        )
        .await?;

    Ok(Json(ApiResponse::success(
        "Redemption updated",
        RedemptionView::from_redemption(redemption),
    )))
}
