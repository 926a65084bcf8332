// handler/referrals.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        AccrualPreviewDto, ApiResponse, ListResponse, RecordTenureDto, ReferralDetailDto,
        ReferralQueryDto, ReferralView, SubmitReferralDto, UpdateReferralStatusDto,
    },
    error::HttpError,
    service::{accrual::calculate_accrual_from_raw, reference::referral_link},
    AppState,
};

pub fn referrals_handler() -> Router {
    Router::new()
        .route("/", post(submit_referral).get(get_referrals))
        .route("/accrue", post(accrue_all_referrals))
        .route("/stats/:referrer_id", get(get_referral_stats))
        .route("/fair-use/:referrer_id", post(apply_fair_use_penalty))
        .route("/:referral_id", get(get_referral))
        .route("/:referral_id/status", put(update_referral_status))
        .route("/:referral_id/tenure", put(record_tenure))
        .route("/:referral_id/accrue", post(accrue_referral))
}

pub fn accrual_handler() -> Router {
    Router::new().route("/preview", post(preview_accrual))
}

pub async fn submit_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SubmitReferralDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let referral = app_state.referral_service.submit_referral(body.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Referral submitted",
            ReferralView::from_referral(referral),
        )),
    ))
}

pub async fn get_referrals(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<ReferralQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let referrals = app_state
        .referral_service
        .list_referrals(params.referrer_id, params.status)
        .await?;

    Ok(Json(ListResponse::new(ReferralView::from_referrals(referrals))))
}

pub async fn get_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referral_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let referral = app_state.referral_service.get_referral(referral_id).await?;
    let accrual = app_state.referral_service.preview(&referral)?;

    let detail = ReferralDetailDto {
        link: referral_link(&app_state.env.app_url, &referral.id),
        referral: ReferralView::from_referral(referral),
        accrual,
    };

    Ok(Json(ApiResponse::success("Referral retrieved", detail)))
}

pub async fn update_referral_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referral_id): Path<Uuid>,
    Json(body): Json<UpdateReferralStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let referral = app_state
        .referral_service
        .update_status(referral_id, body.status)
        .await?;

    Ok(Json(ApiResponse::success(
        "Referral status updated",
        ReferralView::from_referral(referral),
    )))
}

pub async fn record_tenure(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referral_id): Path<Uuid>,
    Json(body): Json<RecordTenureDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let referral = app_state
        .referral_service
        .record_tenure(referral_id, body.months_completed)
        .await?;

    Ok(Json(ApiResponse::success(
        "Tenure recorded",
        ReferralView::from_referral(referral),
    )))
}

pub async fn accrue_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referral_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let receipt = app_state.referral_service.accrue(referral_id).await?;

    let message = if receipt.credited > 0 {
        "Referral points credited"
    } else {
        "No referral points owed"
    };

    Ok(Json(ApiResponse::success(message, receipt)))
}

pub async fn accrue_all_referrals(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let summary = app_state.referral_service.accrue_all().await?;

    Ok(Json(ApiResponse::success("Accrual run complete", summary)))
}

pub async fn get_referral_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referrer_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.referral_service.referrer_stats(referrer_id).await?;

    Ok(Json(ApiResponse::success("Referral stats retrieved", stats)))
}

pub async fn apply_fair_use_penalty(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referrer_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let receipt = app_state
        .referral_service
        .apply_fair_use_penalty(referrer_id)
        .await?;

    Ok(Json(ApiResponse::success("Fair-use check complete", receipt)))
}

pub async fn preview_accrual(
    Json(body): Json<AccrualPreviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome =
        calculate_accrual_from_raw(&body.status, body.months_completed, body.points_earned)
            .map_err(|e| HttpError::bad_request(e.to_string()))?;

    Ok(Json(ApiResponse::success("Accrual calculated", outcome)))
}
