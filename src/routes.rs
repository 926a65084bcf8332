// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler,
        nominations::nominations_handler,
        points::points_handler,
        redemptions::redemptions_handler,
        referrals::{accrual_handler, referrals_handler},
        rewards::rewards_handler,
        users::users_handler,
    },
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/users", users_handler())
        .nest("/points", points_handler())
        .nest("/referrals", referrals_handler())
        .nest("/accrual", accrual_handler())
        .nest("/rewards", rewards_handler())
        .nest("/redemptions", redemptions_handler())
        .nest("/nominations", nominations_handler())
        .nest("/admin", admin_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::Config,
        db::{seed, MemoryDb},
    };

    async fn test_router() -> Router {
        let db = Arc::new(MemoryDb::new());
        seed::seed_demo_data(db.as_ref()).await.unwrap();
        let app_state = AppState::new(db, Config::default());
        create_router(Arc::new(app_state))
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_user_points() {
        let router = test_router().await;
        let uri = format!("/api/users/{}/points", seed::JOHN_ID);
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["total_points"], 35);
        assert_eq!(body["data"]["referral_points"], 25);
    }

    #[tokio::test]
    async fn test_users_list_with_balances() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/api/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], 5);

        let john = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["name"] == "John Doe")
            .unwrap();
        assert_eq!(john["balances"]["total_points"], 35);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let router = test_router().await;
        let uri = format!("/api/users/{}/dashboard", Uuid::new_v4());
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_accrual_preview() {
        let router = test_router().await;
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/accrual/preview",
            Some(json!({ "status": "Hired", "months_completed": 12, "points_earned": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payable_delta"], 2);
        assert_eq!(body["data"]["next_milestone"]["threshold_months"], 18);

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/accrual/preview",
            Some(json!({ "status": "Hired", "months_completed": -1, "points_earned": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_referral_flow_over_http() {
        let router = test_router().await;
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/referrals",
            Some(json!({
                "referrer_id": seed::ALICE_ID,
                "candidate_name": "Kiran Rao",
                "candidate_email": "kiran.rao@email.com",
                "candidate_phone": "+91-9876500009",
                "position": "Designer",
                "relationship": "Friend",
                "years_known": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "Applied");
        assert_eq!(body["data"]["badge"]["color"], "yellow");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &router,
            Method::PUT,
            &format!("/api/referrals/{}/status", id),
            Some(json!({ "status": "Hired" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for next in ["Interview", "Hired"] {
            let (status, _) = send(
                &router,
                Method::PUT,
                &format!("/api/referrals/{}/status", id),
                Some(json!({ "status": next })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = send(
            &router,
            Method::PUT,
            &format!("/api/referrals/{}/tenure", id),
            Some(json!({ "months_completed": 6 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, Method::POST, &format!("/api/referrals/{}/accrue", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["credited"], 5);

        let (_, body) = send(&router, Method::GET, &format!("/api/referrals/{}", id), None).await;
        assert_eq!(body["data"]["accrual"]["payable_delta"], 0);
        assert!(body["data"]["link"].as_str().unwrap().ends_with(&id));
    }

    #[tokio::test]
    async fn test_invalid_referral_body() {
        let router = test_router().await;
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/referrals",
            Some(json!({
                "referrer_id": seed::ALICE_ID,
                "candidate_name": "Kiran Rao",
                "candidate_email": "not-an-email",
                "candidate_phone": "+91-9876500009",
                "position": "Designer",
                "relationship": "Friend"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_rewards_and_redemption_errors() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/api/rewards?range=medium", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], 3);

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/redemptions",
            Some(json!({
                "user_id": seed::JOHN_ID,
                "reward_id": Uuid::from_u128(0x101),
                "delivery_address": "123 Main St, Mumbai"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_award_requires_admin() {
        let router = test_router().await;
        let award = |admin_id: Uuid| {
            json!({
                "admin_id": admin_id,
                "user_id": seed::BOB_ID,
                "type": "performance",
                "amount": 5,
                "description": "Quarter close"
            })
        };

        let (status, _) = send(&router, Method::POST, "/api/points/award", Some(award(seed::JOHN_ID))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&router, Method::POST, "/api/points/award", Some(award(seed::ADMIN_ID))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["type"], "performance");
        assert_eq!(body["data"]["badge"]["icon"], "check-circle");
    }

    #[tokio::test]
    async fn test_admin_overview() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/api/admin/overview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_users"], 5);
        assert_eq!(body["data"]["pending_redemptions"], 2);
        assert_eq!(body["data"]["recent_transactions"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"]["departments"][0]["department"], "Administration");
        assert_eq!(body["data"]["departments"][0]["points"], 120);
    }

    #[tokio::test]
    async fn test_admin_audit_filters() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/api/admin/audit", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], 21);
        assert!(body["data"][0]["modified_by"].is_string());
        assert!(body["data"][0]["can_reverse"].is_boolean());

        let (_, body) = send(&router, Method::GET, "/api/admin/audit?type=redemption", None).await;
        assert_eq!(body["results"], 3);

        let (_, body) = send(&router, Method::GET, "/api/admin/audit?search=doe", None).await;
        assert_eq!(body["results"], 7);

        let (_, body) = send(&router, Method::GET, "/api/admin/audit?period=today", None).await;
        assert_eq!(body["results"], 0);

        let (status, _) = send(&router, Method::GET, "/api/admin/audit?period=decade", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
