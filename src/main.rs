mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{DBClient, MemoryDb, PortalStore};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use service::{
    audit_service::AuditService,
    background_jobs::start_accrual_job,
    dashboard::DashboardService,
    nomination_service::NominationService,
    points_service::PointsService,
    referral_service::ReferralService,
    reward_service::RewardService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn PortalStore>,
    // Services
    pub referral_service: Arc<ReferralService>,
    pub points_service: Arc<PointsService>,
    pub reward_service: Arc<RewardService>,
    pub nomination_service: Arc<NominationService>,
    pub dashboard_service: Arc<DashboardService>,
    pub audit_service: Arc<AuditService>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn PortalStore>, config: Config) -> Self {
        let referral_service = Arc::new(ReferralService::new(
            db_client.clone(),
            config.fair_use_policy(),
        ));
        let points_service = Arc::new(PointsService::new(db_client.clone()));
        let reward_service = Arc::new(RewardService::new(db_client.clone()));
        let nomination_service = Arc::new(NominationService::new(db_client.clone()));
        let dashboard_service = Arc::new(DashboardService::new(db_client.clone()));
        let audit_service = Arc::new(AuditService::new(db_client.clone()));

        Self {
            env: config,
            db_client,
            referral_service,
            points_service,
            reward_service,
            nomination_service,
            dashboard_service,
            audit_service,
        }
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn PortalStore>> {
    match config.database_url {
        Some(ref database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("failed to connect to the database")?;
            println!("✅ Connection to the database is successful!");

            let db_client = DBClient::new(pool);
            db_client
                .run_migrations()
                .await
                .context("failed to run migrations")?;
            println!("📦 Migrations are up to date");

            Ok(Arc::new(db_client))
        }
        None => {
            println!("ℹ️  DATABASE_URL not set - using the in-memory store");
            let memory = MemoryDb::new();
            if config.seed_demo_data {
                db::seed::seed_demo_data(&memory)
                    .await
                    .context("failed to seed demo data")?;
            }
            Ok(Arc::new(memory))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client = match connect_store(&config).await {
        Ok(store) => store,
        Err(err) => {
            println!("🔥 Failed to initialise storage: {:?}", err);
            std::process::exit(1);
        }
    };

    let allowed_origins = [
        config.app_url.as_str(),
        "http://localhost:5173",
        "http://localhost:8000",
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    println!(
        "🚀 Server is running on http://localhost:{}",
        config.port
    );

    // Start background jobs
    tokio::spawn(start_accrual_job(app_state.clone()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .context("failed to bind listener")?;

    axum::serve(listener, app).await?;

    Ok(())
}
