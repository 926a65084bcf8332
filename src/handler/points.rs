// handler/points.rs
use std::sync::Arc;

use axum::{
    extract::Path, http::StatusCode, response::IntoResponse, routing::post, Extension, Json,
    Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{ApiResponse, AwardPointsDto, DeductPointsDto, ReverseTransactionDto, TransactionView},
    error::HttpError,
    AppState,
};

pub fn points_handler() -> Router {
    Router::new()
        .route("/award", post(award_points))
        .route("/deduct", post(deduct_points))
        .route("/transactions/:transaction_id/reverse", post(reverse_transaction))
}

pub async fn award_points(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AwardPointsDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let transaction = app_state
        .points_service
        .award(body.admin_id, body.user_id, body.kind, body.amount, body.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Points awarded",
            TransactionView::from_transaction(transaction),
        )),
    ))
}

pub async fn deduct_points(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<DeductPointsDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let transaction = app_state
        .points_service
        .deduct(body.admin_id, body.user_id, body.amount, body.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Points deducted",
            TransactionView::from_transaction(transaction),
        )),
    ))
}

pub async fn reverse_transaction(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(transaction_id): Path<Uuid>,
    Json(body): Json<ReverseTransactionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let transaction = app_state
        .points_service
        .reverse(body.admin_id, transaction_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Transaction reversed",
        TransactionView::from_transaction(transaction),
    )))
}
