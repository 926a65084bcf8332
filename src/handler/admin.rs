// handler/admin.rs
use std::sync::Arc;

use axum::{extract::Query, response::IntoResponse, routing::get, Extension, Json, Router};
use chrono::Utc;

use crate::{
    dtos::{ApiResponse, AuditQueryDto, ListResponse},
    error::HttpError,
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/audit", get(get_audit_log))
}

pub async fn get_overview(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let overview = app_state.dashboard_service.admin_overview().await?;

    Ok(Json(ApiResponse::success("Overview retrieved", overview)))
}

pub async fn get_audit_log(
    Query(params): Query<AuditQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let entries = app_state
        .audit_service
        .audit_log(&params.into(), Utc::now())
        .await?;

    Ok(Json(ListResponse::new(entries)))
}
