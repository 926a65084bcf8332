// handler/users.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{ApiResponse, ListResponse, TransactionQueryDto, TransactionView},
    error::HttpError,
    service::points_service::TransactionFilter,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/", get(get_users))
        .route("/:user_id/dashboard", get(get_dashboard))
        .route("/:user_id/points", get(get_points))
        .route("/:user_id/transactions", get(get_transactions))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.dashboard_service.user_summaries().await?;

    Ok(Json(ListResponse::new(users)))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.dashboard_service.user_dashboard(user_id).await?;

    Ok(Json(ApiResponse::success("Dashboard retrieved", dashboard)))
}

pub async fn get_points(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let balances = app_state.points_service.balances(user_id).await?;

    Ok(Json(ApiResponse::success("Point balances retrieved", balances)))
}

pub async fn get_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<TransactionQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let filter = TransactionFilter {
        kind: params.kind,
        status: params.status,
        search: params.search,
    };

    let transactions = app_state
        .points_service
        .transactions(user_id, filter)
        .await?;

    Ok(Json(ListResponse::new(TransactionView::from_transactions(
        transactions,
    ))))
}
