// handler/rewards.rs
use std::sync::Arc;

use axum::{extract::Query, response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    dtos::{CatalogueQueryDto, ListResponse},
    error::HttpError,
    AppState,
};

pub fn rewards_handler() -> Router {
    Router::new()
        .route("/", get(get_rewards))
        .route("/categories", get(get_categories))
}

pub async fn get_rewards(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<CatalogueQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let rewards = app_state
        .reward_service
        .catalogue(&params.filter(), params.user_id)
        .await?;

    Ok(Json(ListResponse::new(rewards)))
}

pub async fn get_categories(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state.reward_service.categories().await?;

    Ok(Json(ListResponse::new(categories)))
}
